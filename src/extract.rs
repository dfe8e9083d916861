//! Location and contact extraction from fetched page text.
//!
//! Extraction sits behind [`PageExtractor`] so the directory lookups do not
//! depend on the pattern set. [`RegexExtractor`] is the only implementation:
//! ordered address patterns tuned for Kampala postal addresses, plus phone,
//! email and office-hours patterns.

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

use crate::fetch::FetchedPage;

/// Where the ministry is and when it is open.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationInfo {
    pub address: String,
    pub hours: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub last_checked: NaiveDate,
}

/// One contact entry. Extracted entries carry a single phone or email;
/// configured fallbacks may carry several fields.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ContactInfo {
    pub department: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub hours: Option<String>,
}

pub trait PageExtractor: Send + Sync {
    /// `None` unless the page yields an address.
    fn extract_location(&self, page: &FetchedPage) -> Option<LocationInfo>;

    /// Every distinct phone number, then every distinct email, in page order.
    fn extract_contacts(&self, page: &FetchedPage) -> Vec<ContactInfo>;
}

/// Tried in order; the first match is the address.
static ADDRESS_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)plot\s+\d+[-\s]\d*\s+[^,]+,\s*[^,]+,\s*kampala",
        r"(?i)apollo\s+kaggwa\s+road",
        r"(?i)ministry\s+of\s+finance[^,]*,\s*[^,]+,\s*kampala",
        r"(?i)p\.?o\.?\s*box\s+\d+[^,]*,\s*kampala",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\+256\s*\d{3}\s*\d{3}\s*\d{3}|\d{3}\s*\d{3}\s*\d{3}").unwrap()
});

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").unwrap()
});

static HOURS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:monday|tuesday|wednesday|thursday|friday)[^.]*(?:am|pm)[^.]*(?:am|pm)")
        .unwrap()
});

static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

#[derive(Debug, Default, Clone, Copy)]
pub struct RegexExtractor;

impl RegexExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn address(&self, text: &str) -> Option<String> {
        ADDRESS_PATTERNS
            .iter()
            .find_map(|re| re.find(text))
            .map(|m| m.as_str().trim().to_string())
    }

    pub fn phones(&self, text: &str) -> Vec<String> {
        dedup(PHONE_RE.find_iter(text).map(|m| normalize_phone(m.as_str())))
    }

    pub fn emails(&self, text: &str) -> Vec<String> {
        dedup(EMAIL_RE.find_iter(text).map(|m| m.as_str().to_string()))
    }

    pub fn hours(&self, text: &str) -> Option<String> {
        HOURS_RE.find(text).map(|m| m.as_str().trim().to_string())
    }
}

impl PageExtractor for RegexExtractor {
    fn extract_location(&self, page: &FetchedPage) -> Option<LocationInfo> {
        let address = self.address(&page.text)?;
        Some(LocationInfo {
            address,
            hours: self.hours(&page.text),
            phone: self.phones(&page.text).into_iter().next(),
            email: self.emails(&page.text).into_iter().next(),
            last_checked: page.last_checked,
        })
    }

    fn extract_contacts(&self, page: &FetchedPage) -> Vec<ContactInfo> {
        let phones = self.phones(&page.text).into_iter().map(|phone| ContactInfo {
            phone: Some(phone),
            ..Default::default()
        });
        let emails = self.emails(&page.text).into_iter().map(|email| ContactInfo {
            email: Some(email),
            ..Default::default()
        });
        phones.chain(emails).collect()
    }
}

fn normalize_phone(raw: &str) -> String {
    WS_RE.replace_all(raw.trim(), " ").into_owned()
}

fn dedup(items: impl Iterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(text: &str) -> FetchedPage {
        FetchedPage {
            url: "https://www.finance.go.ug/contact-us".to_string(),
            title: "Contact Us".to_string(),
            text: text.to_string(),
            last_checked: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        }
    }

    #[test]
    fn test_plot_address_with_details() {
        let text = "Find us at Plot 2-12 Apollo Kaggwa Road, P.O. Box 8147, Kampala Uganda. \
                    Tel: +256 414  230 000 or 0414 707 000. Email: info@finance.go.ug. \
                    Open Monday to Friday 8:00 am - 5:00 pm.";
        let loc = RegexExtractor::new().extract_location(&page(text)).unwrap();
        assert_eq!(loc.address, "Plot 2-12 Apollo Kaggwa Road, P.O. Box 8147, Kampala");
        assert_eq!(loc.phone.as_deref(), Some("+256 414 230 000"));
        assert_eq!(loc.email.as_deref(), Some("info@finance.go.ug"));
        assert_eq!(loc.hours.as_deref(), Some("Monday to Friday 8:00 am - 5:00 pm"));
        assert_eq!(loc.last_checked, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
    }

    #[test]
    fn test_pattern_order() {
        // The street name alone is enough when no full plot address is present.
        let ex = RegexExtractor::new();
        assert_eq!(
            ex.address("We are on Apollo  Kaggwa Road near the city centre").as_deref(),
            Some("Apollo  Kaggwa Road")
        );
        assert_eq!(
            ex.address("Write to PO Box 8147, Kampala").as_deref(),
            Some("PO Box 8147, Kampala")
        );
    }

    #[test]
    fn test_no_address_means_no_location() {
        let text = "Call +256 414 230 000 or email info@finance.go.ug";
        assert!(RegexExtractor::new().extract_location(&page(text)).is_none());
    }

    #[test]
    fn test_contacts_phones_then_emails_deduplicated() {
        let text = "Reception +256 414 230 000, ICT 414 230 001, reception again +256 414 230 000. \
                    info@finance.go.ug ict@finance.go.ug info@finance.go.ug";
        let contacts = RegexExtractor::new().extract_contacts(&page(text));
        let phones: Vec<_> = contacts.iter().filter_map(|c| c.phone.as_deref()).collect();
        let emails: Vec<_> = contacts.iter().filter_map(|c| c.email.as_deref()).collect();
        assert_eq!(phones, vec!["+256 414 230 000", "414 230 001"]);
        assert_eq!(emails, vec!["info@finance.go.ug", "ict@finance.go.ug"]);
        assert_eq!(contacts.len(), 4);
        assert!(contacts[0].phone.is_some());
        assert!(contacts[3].email.is_some());
    }

    #[test]
    fn test_empty_page_has_no_contacts() {
        assert!(RegexExtractor::new().extract_contacts(&page("")).is_empty());
    }
}
