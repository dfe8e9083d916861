//! SQLite-backed [`ContentStore`].
//!
//! Case-insensitive "contains" is `LOWER(col) LIKE '%term%'` with `%`, `_`
//! and `\` escaped in the term. Excerpt keywords are a JSON array searched
//! with `json_each`.

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::models::{Document, Excerpt};

use super::{blob_to_vec, vec_to_blob, ContentStore, ExcerptMatch};

const DOCUMENT_COLUMNS: &str = "d.id AS id, d.title AS title, d.url AS url, \
     d.description AS description, d.category AS category, \
     d.content_type AS content_type, d.source AS source, \
     d.publish_date AS publish_date, d.is_active AS is_active, \
     d.content_hash AS content_hash";

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn parse_date(raw: Option<String>) -> Option<NaiveDate> {
    raw.and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok())
}

fn row_to_document(row: &SqliteRow) -> Document {
    Document {
        id: row.get("id"),
        title: row.get("title"),
        url: row.get("url"),
        description: row.get("description"),
        category: row.get("category"),
        content_type: row.get("content_type"),
        source: row.get("source"),
        publish_date: parse_date(row.get("publish_date")),
        is_active: row.get("is_active"),
        content_hash: row.get("content_hash"),
    }
}

#[async_trait]
impl ContentStore for SqliteStore {
    async fn upsert_document(&self, doc: &Document) -> Result<String> {
        let now = chrono::Utc::now().timestamp();
        let id: String = sqlx::query_scalar(
            r#"
            INSERT INTO documents (id, title, url, description, category, content_type,
                                   source, publish_date, is_active, content_hash,
                                   created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(url) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                category = excluded.category,
                content_type = excluded.content_type,
                source = excluded.source,
                publish_date = excluded.publish_date,
                is_active = excluded.is_active,
                content_hash = excluded.content_hash,
                updated_at = excluded.updated_at
            RETURNING id
            "#,
        )
        .bind(&doc.id)
        .bind(&doc.title)
        .bind(&doc.url)
        .bind(&doc.description)
        .bind(&doc.category)
        .bind(&doc.content_type)
        .bind(&doc.source)
        .bind(doc.publish_date.map(|d| d.format("%Y-%m-%d").to_string()))
        .bind(doc.is_active)
        .bind(&doc.content_hash)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn replace_excerpts(&self, document_id: &str, excerpts: &[Excerpt]) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM excerpts WHERE document_id = ?")
            .bind(document_id)
            .execute(&mut *tx)
            .await?;

        for excerpt in excerpts {
            let keywords_json = serde_json::to_string(&excerpt.keywords)?;
            let blob = excerpt.embedding.as_deref().map(vec_to_blob);
            sqlx::query(
                r#"
                INSERT INTO excerpts (id, document_id, text, keywords_json, embedding, relevance, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&excerpt.id)
            .bind(document_id)
            .bind(&excerpt.text)
            .bind(&keywords_json)
            .bind(blob)
            .bind(excerpt.relevance)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_document(&self, id: &str) -> Result<Option<Document>> {
        let sql = format!("SELECT {} FROM documents d WHERE d.id = ?", DOCUMENT_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_document))
    }

    async fn find_documents(&self, terms: &[String], limit: usize) -> Result<Vec<Document>> {
        let patterns: Vec<String> = terms
            .iter()
            .filter(|t| !t.is_empty())
            .map(|t| like_pattern(t))
            .collect();
        if patterns.is_empty() {
            return Ok(Vec::new());
        }

        let clause = r#"(LOWER(d.title) LIKE ? ESCAPE '\'
              OR LOWER(COALESCE(d.description, '')) LIKE ? ESCAPE '\'
              OR LOWER(COALESCE(d.category, '')) LIKE ? ESCAPE '\')"#;
        let any_term = vec![clause; patterns.len()].join(" OR ");
        let sql = format!(
            "SELECT {} FROM documents d WHERE d.is_active = 1 AND ({}) \
             ORDER BY d.publish_date IS NULL, d.publish_date DESC, d.rowid ASC LIMIT ?",
            DOCUMENT_COLUMNS, any_term
        );

        let mut query = sqlx::query(&sql);
        for p in &patterns {
            query = query.bind(p).bind(p).bind(p);
        }
        let rows = query.bind(limit as i64).fetch_all(&self.pool).await?;

        Ok(rows.iter().map(row_to_document).collect())
    }

    async fn find_excerpts(&self, query: &str, limit: usize) -> Result<Vec<ExcerptMatch>> {
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            r#"
            SELECT {},
                   e.id AS excerpt_id, e.text AS excerpt_text, e.keywords_json AS keywords_json,
                   e.embedding AS embedding, e.relevance AS relevance
            FROM excerpts e
            JOIN documents d ON d.id = e.document_id
            WHERE d.is_active = 1
              AND (LOWER(e.text) LIKE ? ESCAPE '\'
                   OR EXISTS (SELECT 1 FROM json_each(e.keywords_json) WHERE json_each.value = ?))
            ORDER BY e.relevance DESC, e.rowid ASC
            LIMIT ?
            "#,
            DOCUMENT_COLUMNS
        );

        let rows = sqlx::query(&sql)
            .bind(like_pattern(query))
            .bind(query.to_lowercase())
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        let mut matches = Vec::with_capacity(rows.len());
        for row in &rows {
            let document = row_to_document(row);
            let keywords_json: String = row.get("keywords_json");
            let embedding: Option<Vec<u8>> = row.get("embedding");
            matches.push(ExcerptMatch {
                excerpt: Excerpt {
                    id: row.get("excerpt_id"),
                    document_id: document.id.clone(),
                    text: row.get("excerpt_text"),
                    keywords: serde_json::from_str(&keywords_json).unwrap_or_default(),
                    embedding: embedding.as_deref().map(blob_to_vec),
                    relevance: row.get("relevance"),
                },
                document,
            });
        }
        Ok(matches)
    }
}
