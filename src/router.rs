//! Query routing.
//!
//! [`QueryRouter::handle`] is the single entry point used by the CLI and the
//! HTTP server. It classifies the query, dispatches to the handler for that
//! intent and races the handler against a fixed ceiling. Whatever happens,
//! the caller gets a well-formed [`AssistantResponse`]:
//!
//! | Intent   | Handler                                             |
//! |----------|-----------------------------------------------------|
//! | location | official address from the site, else fallback       |
//! | contact  | contact entries from the site, else fallback        |
//! | service  | official service pages, then document search        |
//! | document | document search + synthesis                         |
//!
//! A timeout or handler error becomes `guardrail_status = error` carrying
//! the classifier's intent and confidence. Dropping the timed-out future
//! cancels any fetch or query still in flight.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::{error, info};

use crate::catalog::Catalog;
use crate::config::Config;
use crate::db;
use crate::directory::{maps_link, OfficialSite};
use crate::extract::RegexExtractor;
use crate::fetch::HttpFetcher;
use crate::intent::classify;
use crate::models::{
    AssistantResponse, GuardrailStatus, Intent, IntentClassification, OptionAction,
    ResponseOption, SourceRef,
};
use crate::respond::Synthesizer;
use crate::search::{search, SearchSettings};
use crate::store::{ContentStore, SqliteStore};

pub const ERROR_SUMMARY: &str = "I apologize, but I encountered an error while processing your request. Please try again or contact our support team.";

const LOCATION_CONFIDENCE: f64 = 0.95;
const LOCATION_NOT_FOUND_CONFIDENCE: f64 = 0.8;
const CONTACT_CONFIDENCE: f64 = 0.9;
const CONTACT_NOT_FOUND_CONFIDENCE: f64 = 0.8;
const SERVICE_PAGE_CONFIDENCE: f64 = 0.85;
const SERVICE_SEARCH_CONFIDENCE: f64 = 0.7;
const SERVICE_NOT_FOUND_CONFIDENCE: f64 = 0.6;
const DOCUMENT_CONFIDENCE: f64 = 0.8;
const DOCUMENT_NOT_FOUND_CONFIDENCE: f64 = 0.5;

/// Characters of service-page text quoted in a service answer.
const SERVICE_PREVIEW_CHARS: usize = 500;

pub struct QueryRouter {
    store: Arc<dyn ContentStore>,
    site: OfficialSite,
    synthesizer: Synthesizer,
    settings: SearchSettings,
    document_limit: usize,
    service_limit: usize,
    timeout: Duration,
}

impl QueryRouter {
    pub fn new(
        config: &Config,
        store: Arc<dyn ContentStore>,
        site: OfficialSite,
        catalog: Arc<Catalog>,
    ) -> Self {
        Self {
            store,
            site,
            synthesizer: Synthesizer::new(config.site.domain.clone(), catalog),
            settings: SearchSettings::from(config),
            document_limit: config.retrieval.document_limit,
            service_limit: config.retrieval.service_limit,
            timeout: Duration::from_millis(config.router.timeout_ms),
        }
    }

    /// Production wiring: SQLite store, HTTP fetcher, regex extractor and
    /// the catalog named in the config.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let pool = db::connect(config).await?;
        let store: Arc<dyn ContentStore> = Arc::new(SqliteStore::new(pool));
        let site = OfficialSite::new(
            config.site.clone(),
            Arc::new(HttpFetcher::new(&config.fetcher)?),
            Arc::new(RegexExtractor::new()),
        );
        let catalog = Arc::new(Catalog::from_config(config)?);
        Ok(Self::new(config, store, site, catalog))
    }

    pub async fn handle(&self, query: &str) -> AssistantResponse {
        let started = Instant::now();
        let classification = classify(query);
        info!(
            intent = %classification.intent,
            confidence = classification.confidence,
            keywords = ?classification.keywords,
            "query classified"
        );

        let outcome = tokio::time::timeout(self.timeout, self.dispatch(query, &classification)).await;

        let response = match outcome {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                error!(error = %e, intent = %classification.intent, "handler failed");
                error_response(&classification)
            }
            Err(_) => {
                error!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    intent = %classification.intent,
                    "handler timed out"
                );
                error_response(&classification)
            }
        };

        info!(
            status = ?response.guardrail_status,
            sources = response.sources.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "query handled"
        );
        response
    }

    async fn dispatch(
        &self,
        query: &str,
        classification: &IntentClassification,
    ) -> Result<AssistantResponse> {
        match classification.intent {
            Intent::Location => self.handle_location().await,
            Intent::Contact => self.handle_contact().await,
            Intent::Service => self.handle_service(query).await,
            Intent::Document => self.handle_document(query).await,
        }
    }

    fn official_source(&self, title: &str, url: &str) -> Vec<SourceRef> {
        vec![SourceRef::new(title, url, Some("Official Website"))]
    }

    async fn handle_location(&self) -> Result<AssistantResponse> {
        let site = self.site.config();
        let Some(location) = self.site.fetch_location().await else {
            return Ok(AssistantResponse::new(
                format!(
                    "I'm unable to access the current location information from the official website at the moment. Please visit {} for the most up-to-date address and contact details.",
                    site.contact_url
                ),
                self.official_source(&format!("{} Contact Page", site.name), &site.contact_url),
                GuardrailStatus::NotFound,
            )
            .attributed(Intent::Location, LOCATION_NOT_FOUND_CONFIDENCE));
        };

        let mut summary = format!(
            "Here's the official physical address for the {} headquarters.\n\nAddress: {}\n",
            site.name, location.address
        );
        if let Some(hours) = &location.hours {
            summary.push_str(&format!("Hours: {}\n", hours));
        }
        let mut contact = Vec::new();
        if let Some(phone) = &location.phone {
            contact.push(format!("Phone: {}", phone));
        }
        if let Some(email) = &location.email {
            contact.push(format!("Email: {}", email));
        }
        if !contact.is_empty() {
            summary.push_str(&format!("Contact: {}\n", contact.join(" ")));
        }
        summary.push_str(&format!("Last checked: {}", location.last_checked.format("%Y-%m-%d")));

        Ok(AssistantResponse::new(
            summary,
            vec![SourceRef::new(
                format!("{} Official Website", site.name),
                &site.home_url,
                Some("Official Source"),
            )],
            GuardrailStatus::Ok,
        )
        .with_options(vec![
            ResponseOption::link("Get Directions", maps_link(&location.address)),
            ResponseOption::follow_up(
                "Contact Information",
                OptionAction::Contact,
                "contact phone email",
            ),
        ])
        .attributed(Intent::Location, LOCATION_CONFIDENCE))
    }

    async fn handle_contact(&self) -> Result<AssistantResponse> {
        let site = self.site.config();
        let contacts = self.site.fetch_contacts().await;
        if contacts.is_empty() {
            return Ok(AssistantResponse::new(
                format!(
                    "I'm unable to access the current contact information from the official website at the moment. Please visit {} for the most up-to-date contact details.",
                    site.contact_url
                ),
                self.official_source(&format!("{} Contact Page", site.name), &site.contact_url),
                GuardrailStatus::NotFound,
            )
            .attributed(Intent::Contact, CONTACT_NOT_FOUND_CONFIDENCE));
        }

        let blocks: Vec<String> = contacts
            .iter()
            .map(|c| {
                let mut lines = Vec::new();
                if let Some(dept) = &c.department {
                    lines.push(dept.clone());
                }
                if let Some(phone) = &c.phone {
                    lines.push(format!("Phone: {}", phone));
                }
                if let Some(email) = &c.email {
                    lines.push(format!("Email: {}", email));
                }
                if let Some(hours) = &c.hours {
                    lines.push(format!("Hours: {}", hours));
                }
                lines.join("\n")
            })
            .collect();

        let summary = format!(
            "Here are the official contact details for the {}:\n\n{}",
            site.name,
            blocks.join("\n\n")
        );

        Ok(AssistantResponse::new(
            summary,
            vec![SourceRef::new(
                format!("{} Contact Information", site.name),
                &site.contact_url,
                Some("Official Source"),
            )],
            GuardrailStatus::Ok,
        )
        .with_options(vec![
            ResponseOption::link("Visit Contact Page", &site.contact_url),
            ResponseOption::follow_up(
                "Office Location",
                OptionAction::Location,
                "where is ministry of finance located",
            ),
        ])
        .attributed(Intent::Contact, CONTACT_CONFIDENCE))
    }

    async fn handle_service(&self, query: &str) -> Result<AssistantResponse> {
        let site = self.site.config();
        let support = ResponseOption::follow_up(
            "Contact Support",
            OptionAction::Contact,
            "service support contact",
        );

        if let Some(page) = self.site.find_service_page(query).await {
            let preview: String = page.text.chars().take(SERVICE_PREVIEW_CHARS).collect();
            let summary = format!(
                "I found relevant service information on the official website. Here's what I found:\n\n{}...\n\nFor complete details, please visit the official service page.",
                preview
            );
            return Ok(AssistantResponse::new(
                summary,
                vec![SourceRef::new(
                    &page.title,
                    &page.url,
                    Some("Official Service Page"),
                )],
                GuardrailStatus::Ok,
            )
            .with_options(vec![
                ResponseOption::link("View Full Service Page", &page.url),
                support,
            ])
            .attributed(Intent::Service, SERVICE_PAGE_CONFIDENCE));
        }

        let results = search(self.store.as_ref(), query, self.service_limit, self.settings).await;
        if !results.is_empty() {
            return Ok(self
                .synthesizer
                .generate(query, &results)
                .attributed(Intent::Service, SERVICE_SEARCH_CONFIDENCE));
        }

        Ok(AssistantResponse::new(
            format!(
                "I couldn't find specific information about this service on the official website. Please visit {} or contact our support team for assistance.",
                site.services_url
            ),
            self.official_source(&format!("{} Services", site.name), &site.services_url),
            GuardrailStatus::NotFound,
        )
        .with_options(vec![
            ResponseOption::link("Browse Services", &site.services_url),
            support,
        ])
        .attributed(Intent::Service, SERVICE_NOT_FOUND_CONFIDENCE))
    }

    async fn handle_document(&self, query: &str) -> Result<AssistantResponse> {
        let site = self.site.config();
        let results = search(self.store.as_ref(), query, self.document_limit, self.settings).await;
        if results.is_empty() {
            return Ok(AssistantResponse::new(
                format!(
                    "I couldn't find the specific document you're looking for in our database. Please check the official website at {} for the most current documents and policies.",
                    site.home_url
                ),
                self.official_source(&format!("{} Official Website", site.name), &site.home_url),
                GuardrailStatus::NotFound,
            )
            .attributed(Intent::Document, DOCUMENT_NOT_FOUND_CONFIDENCE));
        }

        Ok(self
            .synthesizer
            .generate(query, &results)
            .attributed(Intent::Document, DOCUMENT_CONFIDENCE))
    }
}

/// The generic apology, stamped with the classifier's verdict.
pub fn error_response(classification: &IntentClassification) -> AssistantResponse {
    AssistantResponse::new(ERROR_SUMMARY, Vec::new(), GuardrailStatus::Error)
        .attributed(classification.intent, classification.confidence)
}

/// `massist ask`: answer one query and print the response as JSON.
pub async fn run_ask(config: &Config, query: &str) -> Result<()> {
    let router = QueryRouter::from_config(config).await?;
    let response = router.handle(query).await;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
