//! Core data models used throughout the assistant.
//!
//! [`Document`] and [`Excerpt`] are what the content store holds.
//! [`DocumentResult`] is the per-query projection produced by search, and
//! [`AssistantResponse`] is the single value returned for every query.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A discoverable resource on the ministry's site.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub title: String,
    /// Natural key; unique across the store.
    pub url: String,
    pub description: Option<String>,
    /// Budget, Policies, Reports, News, External Systems, Contact Information, Other.
    pub category: Option<String>,
    pub content_type: String,
    /// Hostname the document was published on.
    pub source: String,
    pub publish_date: Option<NaiveDate>,
    /// Inactive documents are excluded from every search.
    pub is_active: bool,
    pub content_hash: String,
}

/// A short curated passage belonging to one [`Document`].
#[derive(Debug, Clone, PartialEq)]
pub struct Excerpt {
    pub id: String,
    pub document_id: String,
    pub text: String,
    /// Lowercase tokens.
    pub keywords: Vec<String>,
    pub embedding: Option<Vec<f32>>,
    /// Author-assigned static prior, not a computed score.
    pub relevance: f64,
}

/// Default prior for excerpts that do not specify one.
pub const DEFAULT_EXCERPT_RELEVANCE: f64 = 1.0;

/// One search hit, merging document display fields with the excerpt that
/// matched (if any).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentResult {
    pub document_id: String,
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub content_type: String,
    pub publish_date: Option<NaiveDate>,
    pub relevance: f64,
    pub matched_excerpt: Option<String>,
}

impl DocumentResult {
    pub fn from_document(doc: &Document, relevance: f64, matched_excerpt: Option<String>) -> Self {
        Self {
            document_id: doc.id.clone(),
            title: doc.title.clone(),
            url: doc.url.clone(),
            description: doc.description.clone(),
            category: doc.category.clone(),
            content_type: doc.content_type.clone(),
            publish_date: doc.publish_date,
            relevance,
            matched_excerpt,
        }
    }
}

/// Coarse category of user need, used to pick a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Location,
    Document,
    Contact,
    Service,
}

impl Intent {
    /// Enumeration order; also the tie-break order for scored classification.
    pub const ALL: [Intent; 4] = [
        Intent::Location,
        Intent::Document,
        Intent::Contact,
        Intent::Service,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Location => "location",
            Intent::Document => "document",
            Intent::Contact => "contact",
            Intent::Service => "service",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntentClassification {
    pub intent: Intent,
    pub confidence: f64,
    pub keywords: Vec<String>,
}

/// Whether a response is grounded in retrieved data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardrailStatus {
    Ok,
    NotFound,
    Error,
}

/// A cited source shown under the summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    pub title: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl SourceRef {
    pub fn new(title: impl Into<String>, url: impl Into<String>, category: Option<&str>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            category: category.map(str::to_string),
        }
    }
}

impl From<&DocumentResult> for SourceRef {
    fn from(result: &DocumentResult) -> Self {
        Self {
            title: result.title.clone(),
            url: result.url.clone(),
            category: result.category.clone(),
        }
    }
}

/// What a follow-up option does when chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionAction {
    External,
    Contact,
    Location,
    Info,
    Document,
}

/// Either a link to open or a canned query to resubmit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionPayload {
    Url(String),
    Query(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseOption {
    pub label: String,
    pub action: OptionAction,
    pub payload: OptionPayload,
}

impl ResponseOption {
    pub fn link(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: OptionAction::External,
            payload: OptionPayload::Url(url.into()),
        }
    }

    pub fn follow_up(label: impl Into<String>, action: OptionAction, query: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action,
            payload: OptionPayload::Query(query.into()),
        }
    }
}

/// The answer to one query.
///
/// `options`, `intent` and `confidence` are only present on some paths;
/// they serialize as absent rather than `null`/empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantResponse {
    pub summary: String,
    pub sources: Vec<SourceRef>,
    pub guardrail_status: GuardrailStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<ResponseOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<Intent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl AssistantResponse {
    pub fn new(summary: impl Into<String>, sources: Vec<SourceRef>, status: GuardrailStatus) -> Self {
        Self {
            summary: summary.into(),
            sources,
            guardrail_status: status,
            options: Vec::new(),
            intent: None,
            confidence: None,
        }
    }

    pub fn with_options(mut self, options: Vec<ResponseOption>) -> Self {
        self.options = options;
        self
    }

    /// Stamps the handling intent and the handler's confidence.
    pub fn attributed(mut self, intent: Intent, confidence: f64) -> Self {
        self.intent = Some(intent);
        self.confidence = Some(confidence);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_fields_absent_when_empty() {
        let resp = AssistantResponse::new("nothing", Vec::new(), GuardrailStatus::NotFound);
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["guardrail_status"], "not_found");
        assert!(json.get("options").is_none());
        assert!(json.get("intent").is_none());
        assert!(json.get("confidence").is_none());
    }

    #[test]
    fn test_option_payload_shape() {
        let opt = ResponseOption::link("Visit portal", "https://egpuganda.go.ug/");
        let json = serde_json::to_value(&opt).unwrap();
        assert_eq!(json["action"], "external");
        assert_eq!(json["payload"]["url"], "https://egpuganda.go.ug/");

        let opt = ResponseOption::follow_up("Contact", OptionAction::Contact, "EGP contact");
        let json = serde_json::to_value(&opt).unwrap();
        assert_eq!(json["payload"]["query"], "EGP contact");
    }

    #[test]
    fn test_attributed_response_serializes_intent() {
        let resp = AssistantResponse::new("s", Vec::new(), GuardrailStatus::Ok)
            .attributed(Intent::Location, 0.95);
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["intent"], "location");
        assert!((json["confidence"].as_f64().unwrap() - 0.95).abs() < 1e-9);
    }
}
