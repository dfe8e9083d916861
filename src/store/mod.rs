//! Content store abstraction.
//!
//! The [`ContentStore`] trait covers everything the retrieval pipeline and
//! the importer need from a backing store, so SQLite and in-memory
//! backends are interchangeable.
//!
//! Implementations must be `Send + Sync`; many queries read concurrently.

pub mod memory;
pub mod sqlite;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Document, Excerpt};

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

/// An excerpt together with its owning (active) document.
#[derive(Debug, Clone)]
pub struct ExcerptMatch {
    pub excerpt: Excerpt,
    pub document: Document,
}

/// Abstract storage backend.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`upsert_document`](ContentStore::upsert_document) | Insert or update a document by URL |
/// | [`replace_excerpts`](ContentStore::replace_excerpts) | Replace all excerpts of a document |
/// | [`get_document`](ContentStore::get_document) | Fetch a document by id |
/// | [`find_documents`](ContentStore::find_documents) | Field-contains search over active documents |
/// | [`find_excerpts`](ContentStore::find_excerpts) | Text/keyword search over excerpts of active documents |
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Insert or update a document, keyed on its URL.
    ///
    /// Returns the stored id, which is the existing one when the URL was
    /// already present.
    async fn upsert_document(&self, doc: &Document) -> Result<String>;

    /// Replace all excerpts for a document.
    async fn replace_excerpts(&self, document_id: &str, excerpts: &[Excerpt]) -> Result<()>;

    /// Fetch a document by id, active or not.
    async fn get_document(&self, id: &str) -> Result<Option<Document>>;

    /// Active documents whose title, description or category contains any
    /// of `terms`, case-insensitively. Newest `publish_date` first, undated
    /// last; at most `limit` rows.
    async fn find_documents(&self, terms: &[String], limit: usize) -> Result<Vec<Document>>;

    /// Excerpts of active documents whose text contains `query`
    /// case-insensitively, or whose keyword set contains the lowercased
    /// `query` as an element. Highest relevance first; at most `limit` rows.
    async fn find_excerpts(&self, query: &str, limit: usize) -> Result<Vec<ExcerptMatch>>;
}

/// Encode an embedding as little-endian `f32` bytes.
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    vec.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Decode a little-endian `f32` blob written by [`vec_to_blob`].
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}
