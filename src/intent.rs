//! Rule-plus-score intent classification.
//!
//! A query is lowercased and split on whitespace. Five phrase overrides are
//! checked in a fixed order; if none fires, each intent is scored by how many
//! tokens match its keyword set and the best score wins.
//!
//! Token/keyword matching is bidirectional substring containment: a token
//! matches a keyword when either contains the other. Short tokens therefore
//! over-match (`"a"` matches `"map"`), and downstream routing relies on that.

use crate::models::{Intent, IntentClassification};

const LOCATION_KEYWORDS: &[&str] = &[
    "where",
    "address",
    "location",
    "directions",
    "map",
    "office",
    "premises",
    "plot",
    "headquarters",
    "visit",
    "physical",
    "building",
    "street",
    "road",
    "how do i get there",
    "located",
    "situated",
    "find",
    "place",
];

const DOCUMENT_KEYWORDS: &[&str] = &[
    "show",
    "download",
    "form",
    "circular",
    "policy",
    "document",
    "paper",
    "budget framework",
    "nbfp",
    "pfma",
    "section",
    "regulation",
    "guideline",
    "manual",
    "procedure",
    "template",
    "application form",
    "report",
];

const CONTACT_KEYWORDS: &[&str] = &[
    "phone",
    "number",
    "email",
    "contact",
    "help desk",
    "support",
    "hotline",
    "call",
    "reach",
    "speak to",
    "talk to",
    "assistance",
    "help",
    "inquiry",
];

const SERVICE_KEYWORDS: &[&str] = &[
    "how to",
    "apply",
    "requirements",
    "process",
    "procedure",
    "steps",
    "application",
    "registration",
    "submit",
    "apply for",
    "get",
    "obtain",
    "processing time",
    "duration",
    "timeline",
    "deadline",
    "when",
    "schedule",
];

/// Keyword set for an intent.
pub fn keywords_for(intent: Intent) -> &'static [&'static str] {
    match intent {
        Intent::Location => LOCATION_KEYWORDS,
        Intent::Document => DOCUMENT_KEYWORDS,
        Intent::Contact => CONTACT_KEYWORDS,
        Intent::Service => SERVICE_KEYWORDS,
    }
}

fn token_matches(token: &str, keywords: &[&str]) -> bool {
    keywords
        .iter()
        .any(|k| token.contains(k) || k.contains(token))
}

fn matching_tokens(tokens: &[&str], keywords: &[&str]) -> Vec<String> {
    tokens
        .iter()
        .filter(|t| token_matches(t, keywords))
        .map(|t| t.to_string())
        .collect()
}

fn score(tokens: &[&str], intent: Intent) -> usize {
    tokens
        .iter()
        .filter(|t| token_matches(t, keywords_for(intent)))
        .count()
}

/// Phrase overrides in priority order. The first whose predicate holds wins.
fn override_for(lower: &str) -> Option<(Intent, f64)> {
    let has = |needle: &str| lower.contains(needle);

    if has("where is") || (has("address") && !has("email")) {
        return Some((Intent::Location, 0.95));
    }
    if has("phone") || has("email") || has("contact") {
        return Some((Intent::Contact, 0.9));
    }
    if has("find") && (has("document") || has("policy") || has("form")) {
        return Some((Intent::Document, 0.9));
    }
    if has("how to") || has("apply for") || has("requirements") {
        return Some((Intent::Service, 0.85));
    }
    if has("download") || has("form") || has("circular") {
        return Some((Intent::Document, 0.9));
    }
    None
}

/// Classify a query. Never fails; ambiguous input defaults to
/// [`Intent::Document`] at confidence 0.3.
pub fn classify(query: &str) -> IntentClassification {
    let lower = query.to_lowercase();
    let tokens: Vec<&str> = lower.split_whitespace().collect();

    if let Some((intent, confidence)) = override_for(&lower) {
        return IntentClassification {
            intent,
            confidence,
            keywords: matching_tokens(&tokens, keywords_for(intent)),
        };
    }

    // Strictly-greater comparison keeps the earliest intent on ties.
    let mut best = Intent::ALL[0];
    let mut best_score = 0usize;
    for intent in Intent::ALL {
        let s = score(&tokens, intent);
        if s > best_score {
            best = intent;
            best_score = s;
        }
    }

    if best_score == 0 {
        return IntentClassification {
            intent: Intent::Document,
            confidence: 0.3,
            keywords: Vec::new(),
        };
    }

    let union: Vec<&str> = Intent::ALL
        .iter()
        .flat_map(|i| keywords_for(*i).iter().copied())
        .collect();

    IntentClassification {
        intent: best,
        confidence: (0.3 + 0.2 * best_score as f64).min(0.9),
        keywords: matching_tokens(&tokens, &union),
    }
}
