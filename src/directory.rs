//! Lookups against the ministry's official website.
//!
//! Each lookup walks an ordered list of candidate pages from `[site]` and
//! stops at the first usable one. A page that fails to load is logged and
//! skipped. Location and contact lookups end in the configured fallback
//! record when nothing usable was found, so network trouble never reaches
//! the caller.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::SiteConfig;
use crate::extract::{ContactInfo, LocationInfo, PageExtractor};
use crate::fetch::{FetchedPage, PageFetcher};

pub struct OfficialSite {
    site: SiteConfig,
    fetcher: Arc<dyn PageFetcher>,
    extractor: Arc<dyn PageExtractor>,
}

impl OfficialSite {
    pub fn new(
        site: SiteConfig,
        fetcher: Arc<dyn PageFetcher>,
        extractor: Arc<dyn PageExtractor>,
    ) -> Self {
        Self {
            site,
            fetcher,
            extractor,
        }
    }

    pub fn config(&self) -> &SiteConfig {
        &self.site
    }

    async fn try_fetch(&self, url: &str) -> Option<FetchedPage> {
        match self.fetcher.fetch(url).await {
            Ok(page) => Some(page),
            Err(e) => {
                warn!(url, error = %e, "page fetch failed");
                None
            }
        }
    }

    /// Address and opening details, from the first candidate page that
    /// yields an address, else the configured fallback. `None` only when
    /// the fallback address is blank.
    pub async fn fetch_location(&self) -> Option<LocationInfo> {
        for url in &self.site.location_urls {
            let Some(page) = self.try_fetch(url).await else {
                continue;
            };
            if let Some(info) = self.extractor.extract_location(&page) {
                debug!(url = %url, "location extracted");
                return Some(info);
            }
        }

        let fallback = &self.site.fallback;
        if fallback.address.trim().is_empty() {
            return None;
        }
        debug!("using fallback location");
        Some(LocationInfo {
            address: fallback.address.clone(),
            hours: fallback.hours.clone(),
            phone: fallback.phone.clone(),
            email: fallback.email.clone(),
            last_checked: chrono::Local::now().date_naive(),
        })
    }

    /// Contact entries from the first contact page that lists any, else the
    /// configured fallback contacts.
    pub async fn fetch_contacts(&self) -> Vec<ContactInfo> {
        for url in &self.site.contact_urls {
            let Some(page) = self.try_fetch(url).await else {
                continue;
            };
            let contacts = self.extractor.extract_contacts(&page);
            if !contacts.is_empty() {
                debug!(url = %url, count = contacts.len(), "contacts extracted");
                return contacts;
            }
        }

        self.site
            .fallback_contacts
            .iter()
            .map(|c| ContactInfo {
                department: c.department.clone(),
                phone: c.phone.clone(),
                email: c.email.clone(),
                hours: c.hours.clone(),
            })
            .collect()
    }

    /// First service page whose text mentions the query's first word.
    pub async fn find_service_page(&self, query: &str) -> Option<FetchedPage> {
        let first_word = query.split_whitespace().next()?.to_lowercase();
        for url in &self.site.service_urls {
            let Some(page) = self.try_fetch(url).await else {
                continue;
            };
            if page.text.to_lowercase().contains(&first_word) {
                return Some(page);
            }
        }
        None
    }
}

/// Google Maps search link for an address.
pub fn maps_link(address: &str) -> String {
    format!(
        "https://www.google.com/maps/search/?api=1&query={}",
        urlencoding::encode(address)
    )
}
