//! Seed-file import.
//!
//! Loads documents and their curated excerpts from a JSON file into the
//! content store:
//!
//! ```json
//! {
//!   "documents": [
//!     {
//!       "title": "Budget Framework Paper FY2025/26",
//!       "url": "https://www.finance.go.ug/publication/budget-framework-paper",
//!       "description": "Medium-term budget priorities",
//!       "category": "Budget",
//!       "content_type": "pdf",
//!       "publish_date": "2024-12-15",
//!       "excerpts": [
//!         { "text": "The BFP sets out ...", "keywords": ["budget", "bfp"], "relevance": 0.9 }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! Documents are upserted by URL and their excerpts replaced, so importing
//! the same file twice leaves the store unchanged.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::info;
use uuid::Uuid;

use crate::config::Config;
use crate::db;
use crate::models::{Document, Excerpt, DEFAULT_EXCERPT_RELEVANCE};
use crate::store::{ContentStore, SqliteStore};

#[derive(Debug, Deserialize)]
pub struct SeedFile {
    pub documents: Vec<SeedDocument>,
}

#[derive(Debug, Deserialize)]
pub struct SeedDocument {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default = "default_content_type")]
    pub content_type: String,
    #[serde(default)]
    pub publish_date: Option<NaiveDate>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Defaults to the URL's host.
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub excerpts: Vec<SeedExcerpt>,
}

#[derive(Debug, Deserialize)]
pub struct SeedExcerpt {
    pub text: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default = "default_relevance")]
    pub relevance: f64,
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
}

fn default_content_type() -> String {
    "html".to_string()
}
fn default_active() -> bool {
    true
}
fn default_relevance() -> f64 {
    DEFAULT_EXCERPT_RELEVANCE
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportStats {
    pub documents: usize,
    pub excerpts: usize,
}

pub fn load_seed(path: &Path) -> Result<SeedFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read seed file: {}", path.display()))?;
    let seed: SeedFile =
        serde_json::from_str(&content).with_context(|| "Failed to parse seed file")?;
    Ok(seed)
}

/// Validate every entry first, then write. A bad entry aborts the import
/// before anything is stored.
pub async fn import_seed(store: &dyn ContentStore, seed: &SeedFile) -> Result<ImportStats> {
    let mut prepared = Vec::with_capacity(seed.documents.len());
    for (i, entry) in seed.documents.iter().enumerate() {
        let prepared_doc = prepare(entry).with_context(|| format!("document #{}", i + 1))?;
        prepared.push(prepared_doc);
    }

    let mut stats = ImportStats::default();
    for (doc, excerpts) in prepared {
        let id = store.upsert_document(&doc).await?;
        let excerpts: Vec<Excerpt> = excerpts
            .into_iter()
            .map(|mut e| {
                e.document_id = id.clone();
                e
            })
            .collect();
        store.replace_excerpts(&id, &excerpts).await?;
        stats.documents += 1;
        stats.excerpts += excerpts.len();
    }
    Ok(stats)
}

fn prepare(entry: &SeedDocument) -> Result<(Document, Vec<Excerpt>)> {
    let title = entry.title.trim();
    if title.is_empty() {
        bail!("title is empty");
    }
    let parsed = reqwest::Url::parse(entry.url.trim())
        .with_context(|| format!("invalid url '{}'", entry.url))?;
    let host = match parsed.host_str() {
        Some(h) => h.to_string(),
        None => bail!("url '{}' has no host", entry.url),
    };
    let url = entry.url.trim().to_string();

    let doc = Document {
        id: Uuid::new_v4().to_string(),
        title: title.to_string(),
        content_hash: content_hash(
            title,
            &url,
            entry.description.as_deref(),
            entry.category.as_deref(),
            entry.publish_date,
        ),
        url,
        description: entry.description.clone(),
        category: entry.category.clone(),
        content_type: entry.content_type.clone(),
        source: entry.source.clone().unwrap_or(host),
        publish_date: entry.publish_date,
        is_active: entry.is_active,
    };

    let mut excerpts = Vec::with_capacity(entry.excerpts.len());
    for seed in &entry.excerpts {
        if seed.text.trim().is_empty() {
            bail!("excerpt text is empty");
        }
        if !(0.0..=1.0).contains(&seed.relevance) {
            bail!("excerpt relevance {} outside [0, 1]", seed.relevance);
        }
        excerpts.push(Excerpt {
            id: Uuid::new_v4().to_string(),
            document_id: doc.id.clone(),
            text: seed.text.trim().to_string(),
            keywords: normalize_keywords(&seed.keywords),
            embedding: seed.embedding.clone(),
            relevance: seed.relevance,
        });
    }

    Ok((doc, excerpts))
}

/// Lowercase, trim, drop empties and duplicates; first occurrence wins.
pub fn normalize_keywords(raw: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for k in raw {
        let k = k.trim().to_lowercase();
        if !k.is_empty() && !out.contains(&k) {
            out.push(k);
        }
    }
    out
}

fn content_hash(
    title: &str,
    url: &str,
    description: Option<&str>,
    category: Option<&str>,
    publish_date: Option<NaiveDate>,
) -> String {
    let mut hasher = Sha256::new();
    for part in [
        title,
        url,
        description.unwrap_or(""),
        category.unwrap_or(""),
    ] {
        hasher.update(part.as_bytes());
        hasher.update(b"\n");
    }
    if let Some(date) = publish_date {
        hasher.update(date.format("%Y-%m-%d").to_string().as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// `massist import`: load a seed file into the configured database.
pub async fn run_import(config: &Config, path: &Path) -> Result<()> {
    let seed = load_seed(path)?;
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool);

    let stats = import_seed(&store, &seed).await?;
    info!(
        documents = stats.documents,
        excerpts = stats.excerpts,
        "seed imported"
    );

    println!("import {}", path.display());
    println!("  documents: {}", stats.documents);
    println!("  excerpts: {}", stats.excerpts);
    println!("ok");

    store.pool().close().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    fn seed(json: &str) -> SeedFile {
        serde_json::from_str(json).unwrap()
    }

    const SAMPLE: &str = r#"{
        "documents": [
            {
                "title": "Budget Framework Paper FY2025/26",
                "url": "https://www.finance.go.ug/publication/bfp-2025-26",
                "description": "Medium-term budget priorities",
                "category": "Budget",
                "content_type": "pdf",
                "publish_date": "2024-12-15",
                "excerpts": [
                    { "text": "The BFP sets the resource envelope", "keywords": ["Budget", "BFP", "budget", " "], "relevance": 0.9 },
                    { "text": "Priorities for FY2025/26" }
                ]
            },
            {
                "title": "Old circular",
                "url": "https://www.finance.go.ug/circular/old",
                "is_active": false,
                "source": "archive.finance.go.ug"
            }
        ]
    }"#;

    #[tokio::test]
    async fn test_import_defaults_and_normalization() {
        let store = InMemoryStore::new();
        let stats = import_seed(&store, &seed(SAMPLE)).await.unwrap();
        assert_eq!(stats, ImportStats { documents: 2, excerpts: 2 });

        let hits = store.find_excerpts("bfp", 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].excerpt.keywords, vec!["budget", "bfp"]);
        assert_eq!(hits[0].document.source, "www.finance.go.ug");
        assert_eq!(hits[0].document.content_hash.len(), 64);

        let hits = store.find_excerpts("priorities", 10).await.unwrap();
        assert!((hits[0].excerpt.relevance - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_reimport_is_idempotent() {
        let store = InMemoryStore::new();
        import_seed(&store, &seed(SAMPLE)).await.unwrap();
        let first = store.find_excerpts("bfp", 10).await.unwrap();
        import_seed(&store, &seed(SAMPLE)).await.unwrap();
        let second = store.find_excerpts("bfp", 10).await.unwrap();

        assert_eq!(store.document_count(), 2);
        assert_eq!(second.len(), 1);
        assert_eq!(first[0].document.id, second[0].document.id);
        assert_eq!(first[0].document.content_hash, second[0].document.content_hash);
    }

    #[tokio::test]
    async fn test_bad_relevance_aborts_before_writing() {
        let store = InMemoryStore::new();
        let bad = seed(
            r#"{"documents": [
                {"title": "Good", "url": "https://www.finance.go.ug/good"},
                {"title": "Bad", "url": "https://www.finance.go.ug/bad",
                 "excerpts": [{"text": "x", "relevance": 1.5}]}
            ]}"#,
        );
        let err = import_seed(&store, &bad).await.unwrap_err();
        assert!(format!("{:#}", err).contains("document #2"));
        assert_eq!(store.document_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_url_rejected() {
        let store = InMemoryStore::new();
        let bad = seed(r#"{"documents": [{"title": "T", "url": "not a url"}]}"#);
        assert!(import_seed(&store, &bad).await.is_err());
    }

    #[test]
    fn test_hash_changes_with_fields() {
        let a = content_hash("T", "https://x", None, Some("Budget"), None);
        let b = content_hash("T", "https://x", None, Some("Policies"), None);
        assert_ne!(a, b);
        assert_eq!(a, content_hash("T", "https://x", None, Some("Budget"), None));
    }

    #[test]
    fn test_load_seed_from_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("seed.json");
        std::fs::write(&path, SAMPLE).unwrap();
        let seed = load_seed(&path).unwrap();
        assert_eq!(seed.documents.len(), 2);
        assert!(load_seed(&tmp.path().join("missing.json")).is_err());
    }
}
