//! In-memory [`ContentStore`] for tests and embedding.
//!
//! Documents and excerpts live behind `std::sync::RwLock`. Matching follows
//! the same rules as the SQLite store.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Document, Excerpt};

use super::{ContentStore, ExcerptMatch};

pub struct InMemoryStore {
    docs: RwLock<HashMap<String, Document>>,
    /// Insertion order, used as a stable tie-break.
    order: RwLock<Vec<String>>,
    excerpts: RwLock<Vec<Excerpt>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            docs: RwLock::new(HashMap::new()),
            order: RwLock::new(Vec::new()),
            excerpts: RwLock::new(Vec::new()),
        }
    }

    pub fn document_count(&self) -> usize {
        self.docs.read().unwrap().len()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn field_contains(field: Option<&str>, term: &str) -> bool {
    field
        .map(|f| f.to_lowercase().contains(term))
        .unwrap_or(false)
}

#[async_trait]
impl ContentStore for InMemoryStore {
    async fn upsert_document(&self, doc: &Document) -> Result<String> {
        let mut docs = self.docs.write().unwrap();
        let existing_id = docs
            .values()
            .find(|d| d.url == doc.url)
            .map(|d| d.id.clone());

        let id = existing_id.unwrap_or_else(|| doc.id.clone());
        let mut stored = doc.clone();
        stored.id = id.clone();
        if docs.insert(id.clone(), stored).is_none() {
            self.order.write().unwrap().push(id.clone());
        }
        Ok(id)
    }

    async fn replace_excerpts(&self, document_id: &str, excerpts: &[Excerpt]) -> Result<()> {
        let mut stored = self.excerpts.write().unwrap();
        stored.retain(|e| e.document_id != document_id);
        for e in excerpts {
            let mut e = e.clone();
            e.document_id = document_id.to_string();
            stored.push(e);
        }
        Ok(())
    }

    async fn get_document(&self, id: &str) -> Result<Option<Document>> {
        Ok(self.docs.read().unwrap().get(id).cloned())
    }

    async fn find_documents(&self, terms: &[String], limit: usize) -> Result<Vec<Document>> {
        let terms: Vec<String> = terms
            .iter()
            .map(|t| t.to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let docs = self.docs.read().unwrap();
        let order = self.order.read().unwrap();
        let mut found: Vec<Document> = order
            .iter()
            .filter_map(|id| docs.get(id))
            .filter(|d| d.is_active)
            .filter(|d| {
                terms.iter().any(|t| {
                    d.title.to_lowercase().contains(t.as_str())
                        || field_contains(d.description.as_deref(), t)
                        || field_contains(d.category.as_deref(), t)
                })
            })
            .cloned()
            .collect();

        // Newest first, undated last; sort is stable so insertion order breaks ties.
        found.sort_by(|a, b| match (a.publish_date, b.publish_date) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
        found.truncate(limit);
        Ok(found)
    }

    async fn find_excerpts(&self, query: &str, limit: usize) -> Result<Vec<ExcerptMatch>> {
        let needle = query.to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let docs = self.docs.read().unwrap();
        let excerpts = self.excerpts.read().unwrap();
        let mut found: Vec<ExcerptMatch> = excerpts
            .iter()
            .filter(|e| e.text.to_lowercase().contains(&needle) || e.keywords.contains(&needle))
            .filter_map(|e| {
                docs.get(&e.document_id)
                    .filter(|d| d.is_active)
                    .map(|d| ExcerptMatch {
                        excerpt: e.clone(),
                        document: d.clone(),
                    })
            })
            .collect();

        found.sort_by(|a, b| {
            b.excerpt
                .relevance
                .partial_cmp(&a.excerpt.relevance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        found.truncate(limit);
        Ok(found)
    }
}
