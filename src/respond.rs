//! Response synthesis.
//!
//! Turns ranked [`DocumentResult`]s into an [`AssistantResponse`]. Output is
//! deterministic and built only from the results passed in, except for the
//! external-system cards, whose facts come from the injected [`Catalog`].
//!
//! Decision order:
//!
//! 1. no results: `not_found` with a suggestion to browse categories
//! 2. a known external system plus a contact word: that system's contact card
//! 3. a known external system otherwise: an informational card with options
//! 4. anything else: a generic summary citing every result
//!
//! Systems are named by whole words in the query. A system marked
//! `requires_result` only gets a card when one of the results names it too;
//! otherwise the generic summary is used.

use std::sync::Arc;

use crate::catalog::{Catalog, ExternalSystem};
use crate::models::{AssistantResponse, DocumentResult, GuardrailStatus, SourceRef};

/// Words that turn an external-system query into a contact request.
const CONTACT_WORDS: &[&str] = &["contact", "phone", "email", "number", "support"];

/// Number of results named individually in a generic summary.
const SUMMARY_HIGHLIGHTS: usize = 3;

/// Maximum description length quoted per highlighted result.
const DESCRIPTION_PREVIEW_CHARS: usize = 100;

pub struct Synthesizer {
    domain: String,
    catalog: Arc<Catalog>,
}

impl Synthesizer {
    pub fn new(domain: impl Into<String>, catalog: Arc<Catalog>) -> Self {
        Self {
            domain: domain.into(),
            catalog,
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn generate(&self, query: &str, results: &[DocumentResult]) -> AssistantResponse {
        if results.is_empty() {
            return self.not_found();
        }

        if let Some(system) = self.catalog.detect(query) {
            let lower = query.to_lowercase();
            let wants_contact = CONTACT_WORDS.iter().any(|w| lower.contains(w));
            if let Some(source) = card_source(system, results) {
                if wants_contact {
                    if let Some(card) = contact_card(system, source) {
                        return card;
                    }
                } else {
                    return info_card(system, source);
                }
            }
        }

        self.summarize(results)
    }

    fn not_found(&self) -> AssistantResponse {
        AssistantResponse::new(
            format!(
                "I couldn't find any relevant documents on {} for your query. Try searching for different terms or browse our document categories.",
                self.domain
            ),
            Vec::new(),
            GuardrailStatus::NotFound,
        )
    }

    fn summarize(&self, results: &[DocumentResult]) -> AssistantResponse {
        let plural = if results.len() == 1 { "" } else { "s" };
        let mut summary = format!(
            "I found {} relevant document{} on {}:",
            results.len(),
            plural,
            self.domain
        );

        let categories = distinct_categories(results);
        if categories.len() == 1 {
            summary.push_str(&format!(
                "\n\nAll documents are in the \"{}\" category.",
                categories[0]
            ));
        } else {
            summary.push_str(&format!(
                "\n\nDocuments are categorized as: {}.",
                categories.join(", ")
            ));
        }

        summary.push_str("\n\nKey documents include:");
        for result in results.iter().take(SUMMARY_HIGHLIGHTS) {
            summary.push_str("\n• ");
            summary.push_str(&result.title);
            if let Some(desc) = result.description.as_deref().filter(|d| !d.is_empty()) {
                summary.push_str(" - ");
                summary.push_str(&preview(desc, DESCRIPTION_PREVIEW_CHARS));
            }
        }

        summary.push_str("\n\nClick on the links below to view the full documents.");

        let sources = results.iter().map(SourceRef::from).collect();
        AssistantResponse::new(summary, sources, GuardrailStatus::Ok)
    }
}

/// Categories in first-seen order; a missing category counts as `Other`.
fn distinct_categories(results: &[DocumentResult]) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::new();
    for result in results {
        let cat = result
            .category
            .as_deref()
            .filter(|c| !c.is_empty())
            .unwrap_or("Other");
        if !seen.contains(&cat) {
            seen.push(cat);
        }
    }
    seen
}

/// Cut to at most `max` chars on a char boundary, marking the cut with `...`.
fn preview(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// The result to cite for a card: one whose title names the system, else
/// the catalog's own entry. `None` when the system needs a result and none
/// names it.
fn card_source(system: &ExternalSystem, results: &[DocumentResult]) -> Option<SourceRef> {
    match results.iter().find(|r| system.is_mentioned(&r.title)) {
        Some(result) => Some(SourceRef::from(result)),
        None if system.requires_result => None,
        None => Some(SourceRef::new(
            &system.name,
            &system.url,
            Some(system.category.as_str()),
        )),
    }
}

fn contact_card(system: &ExternalSystem, source: SourceRef) -> Option<AssistantResponse> {
    let contact = system.contact.as_ref()?;

    let mut summary = format!(
        "Here's the {} information:\n\n**{}**",
        contact.label, contact.label
    );
    if let Some(phone) = &contact.phone {
        summary.push_str(&format!("\nPhone: {}", phone));
    }
    if let Some(email) = &contact.email {
        summary.push_str(&format!("\nEmail: {}", email));
    }
    if let Some(note) = &contact.note {
        summary.push_str("\n\n");
        summary.push_str(note);
    }

    Some(AssistantResponse::new(
        summary,
        vec![source],
        GuardrailStatus::Ok,
    ))
}

fn info_card(system: &ExternalSystem, source: SourceRef) -> AssistantResponse {
    let mut summary = format!(
        "I found information about the **{}**. What would you like to know?",
        system.name
    );
    if !system.highlights.is_empty() {
        summary.push('\n');
    }
    for line in &system.highlights {
        summary.push_str("\n• ");
        summary.push_str(&bold_label(line));
    }

    let options = system
        .options
        .iter()
        .map(|o| o.to_response_option())
        .collect();

    AssistantResponse::new(summary, vec![source], GuardrailStatus::Ok).with_options(options)
}

/// `Label: text` becomes `**Label**: text`.
fn bold_label(line: &str) -> String {
    match line.split_once(':') {
        Some((label, rest)) => format!("**{}**:{}", label, rest),
        None => line.to_string(),
    }
}
