//! Hybrid document search: curated excerpts plus field keyword matching.
//!
//! Two independent store queries run concurrently:
//!
//! - **Excerpt path**: excerpts whose text contains the raw query, or whose
//!   keyword set contains it. Each hit carries its excerpt's static
//!   relevance and text.
//! - **Keyword path**: active documents whose title, description or
//!   category contains any query word longer than two characters (or the
//!   raw query when there are fewer than two such words). Each hit gets
//!   the fixed keyword relevance (0.5 by default) and no excerpt.
//!
//! Results are merged by document id, excerpt hits first, so a document
//! found both ways appears once with its excerpt relevance. Excerpt-backed
//! results always rank ahead of keyword-only results; within each tier the
//! order is relevance descending.

use anyhow::Result;
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::config::Config;
use crate::db;
use crate::models::DocumentResult;
use crate::store::{ContentStore, SqliteStore};

/// Words must be longer than this to count as separate search terms.
const MIN_TERM_CHARS: usize = 2;

/// Search tuning taken from `[retrieval]`.
#[derive(Debug, Clone, Copy)]
pub struct SearchSettings {
    pub keyword_relevance: f64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            keyword_relevance: 0.5,
        }
    }
}

impl From<&Config> for SearchSettings {
    fn from(config: &Config) -> Self {
        Self {
            keyword_relevance: config.retrieval.keyword_relevance,
        }
    }
}

/// Terms used for the keyword path.
///
/// Two or more long words are matched individually; otherwise the trimmed
/// raw query is used as the single term.
pub fn keyword_terms(query: &str) -> Vec<String> {
    let lower = query.trim().to_lowercase();
    let words: Vec<String> = lower
        .split_whitespace()
        .filter(|w| w.chars().count() > MIN_TERM_CHARS)
        .map(str::to_string)
        .collect();

    if words.len() >= 2 {
        words
    } else if lower.is_empty() {
        Vec::new()
    } else {
        vec![lower]
    }
}

/// Run a hybrid search. Never fails: store errors are logged and yield
/// fewer (or no) results.
pub async fn search(
    store: &dyn ContentStore,
    query: &str,
    limit: usize,
    settings: SearchSettings,
) -> Vec<DocumentResult> {
    let raw = query.trim();
    if raw.is_empty() || limit == 0 {
        return Vec::new();
    }

    let terms = keyword_terms(raw);
    let (keyword_hits, excerpt_hits) = tokio::join!(
        store.find_documents(&terms, limit),
        store.find_excerpts(raw, limit)
    );

    let keyword_hits = match keyword_hits {
        Ok(docs) => docs,
        Err(e) => {
            warn!(error = %e, query = raw, "keyword search failed");
            return Vec::new();
        }
    };
    let excerpt_hits = excerpt_hits.unwrap_or_else(|e| {
        warn!(error = %e, query = raw, "excerpt search failed");
        Vec::new()
    });

    debug!(
        keyword = keyword_hits.len(),
        excerpt = excerpt_hits.len(),
        "search candidates"
    );

    let mut seen: HashSet<String> = HashSet::new();
    let mut excerpt_tier: Vec<DocumentResult> = Vec::new();
    for hit in &excerpt_hits {
        // Hits arrive highest-relevance first; keep each document's best.
        if seen.insert(hit.document.id.clone()) {
            excerpt_tier.push(DocumentResult::from_document(
                &hit.document,
                hit.excerpt.relevance,
                Some(hit.excerpt.text.clone()),
            ));
        }
    }

    let mut keyword_tier: Vec<DocumentResult> = Vec::new();
    for doc in &keyword_hits {
        if seen.insert(doc.id.clone()) {
            keyword_tier.push(DocumentResult::from_document(
                doc,
                settings.keyword_relevance,
                None,
            ));
        }
    }

    rank(excerpt_tier, keyword_tier, limit)
}

fn by_relevance_desc(a: &DocumentResult, b: &DocumentResult) -> std::cmp::Ordering {
    b.relevance
        .partial_cmp(&a.relevance)
        .unwrap_or(std::cmp::Ordering::Equal)
}

/// Sort each tier by relevance (stable, so store order breaks ties),
/// concatenate excerpt tier first, and truncate.
fn rank(
    mut excerpt_tier: Vec<DocumentResult>,
    mut keyword_tier: Vec<DocumentResult>,
    limit: usize,
) -> Vec<DocumentResult> {
    excerpt_tier.sort_by(by_relevance_desc);
    keyword_tier.sort_by(by_relevance_desc);
    excerpt_tier.extend(keyword_tier);
    excerpt_tier.truncate(limit);
    excerpt_tier
}

/// `massist search`: print ranked results for a query.
pub async fn run_search(config: &Config, query: &str, limit: Option<usize>) -> Result<()> {
    if query.trim().is_empty() {
        println!("No results.");
        return Ok(());
    }

    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool);
    let limit = limit.unwrap_or(config.retrieval.document_limit);

    let results = search(&store, query, limit, SearchSettings::from(config)).await;

    if results.is_empty() {
        println!("No results.");
        store.pool().close().await;
        return Ok(());
    }

    for (i, result) in results.iter().enumerate() {
        println!(
            "{}. [{:.2}] {} / {}",
            i + 1,
            result.relevance,
            result.category.as_deref().unwrap_or("Other"),
            result.title
        );
        if let Some(date) = result.publish_date {
            println!("    published: {}", date.format("%Y-%m-%d"));
        }
        println!("    url: {}", result.url);
        if let Some(ref excerpt) = result.matched_excerpt {
            println!("    excerpt: \"{}\"", excerpt.replace('\n', " ").trim());
        }
        println!("    id: {}", result.document_id);
        println!();
    }

    store.pool().close().await;
    Ok(())
}
