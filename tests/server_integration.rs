//! Drives the axum app over real HTTP with in-process store and fetcher
//! doubles.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;

use ministry_assistant::catalog::Catalog;
use ministry_assistant::config::Config;
use ministry_assistant::directory::OfficialSite;
use ministry_assistant::extract::RegexExtractor;
use ministry_assistant::fetch::{FetchError, FetchedPage, PageFetcher};
use ministry_assistant::models::{Document, Excerpt};
use ministry_assistant::router::QueryRouter;
use ministry_assistant::server::build_app;
use ministry_assistant::store::{ContentStore, InMemoryStore};

/// Every page is unreachable, so lookups fall back to configured data.
struct OfflineFetcher;

#[async_trait]
impl PageFetcher for OfflineFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        Err(FetchError::Status {
            url: url.to_string(),
            status: 503,
        })
    }
}

fn config() -> Config {
    toml::from_str(
        r#"
[db]
path = "unused.sqlite"

[router]
timeout_ms = 2000

[server]
allowed_origins = ["https://www.finance.go.ug"]
allowed_origin_prefixes = ["http://localhost:"]
"#,
    )
    .unwrap()
}

async fn store() -> Arc<InMemoryStore> {
    let store = InMemoryStore::new();
    let doc = Document {
        id: "bfp".to_string(),
        title: "Budget Framework Paper FY2025/26".to_string(),
        url: "https://www.finance.go.ug/publication/bfp".to_string(),
        description: Some("Medium-term budget priorities".to_string()),
        category: Some("Budget".to_string()),
        content_type: "pdf".to_string(),
        source: "www.finance.go.ug".to_string(),
        publish_date: NaiveDate::from_ymd_opt(2024, 12, 15),
        is_active: true,
        content_hash: String::new(),
    };
    store.upsert_document(&doc).await.unwrap();
    store
        .replace_excerpts(
            "bfp",
            &[Excerpt {
                id: "e1".to_string(),
                document_id: "bfp".to_string(),
                text: "The budget framework paper sets the resource envelope".to_string(),
                keywords: vec!["budget".to_string()],
                embedding: None,
                relevance: 0.9,
            }],
        )
        .await
        .unwrap();
    Arc::new(store)
}

/// Start the app on a free port and return its base URL.
async fn start_server() -> String {
    let config = config();
    let site = OfficialSite::new(
        config.site.clone(),
        Arc::new(OfflineFetcher),
        Arc::new(RegexExtractor::new()),
    );
    let router = QueryRouter::new(&config, store().await, site, Arc::new(Catalog::builtin()));
    let app = build_app(&config.server, Arc::new(router));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let base = format!("http://{}", addr);
    wait_for_server(&base).await;
    base
}

async fn wait_for_server(base: &str) {
    let client = reqwest::Client::new();
    for _ in 0..50 {
        if client.get(format!("{}/health", base)).send().await.is_ok() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("server at {} did not come up", base);
}

#[tokio::test]
async fn test_health() {
    let base = start_server().await;
    let resp = reqwest::get(format!("{}/health", base)).await.unwrap();
    assert_eq!(resp.status(), 200);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_ask_document_query() {
    let base = start_server().await;
    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{}/api/ask", base))
        .json(&serde_json::json!({ "query": "download budget framework paper" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["guardrail_status"], "ok");
    assert_eq!(json["intent"], "document");
    assert_eq!(json["sources"][0]["title"], "Budget Framework Paper FY2025/26");
    assert!(json["timings"]["total_ms"].is_u64());
}

#[tokio::test]
async fn test_ask_location_with_unreachable_site() {
    let base = start_server().await;
    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{}/api/ask", base))
        .json(&serde_json::json!({ "query": "where is the ministry located" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["intent"], "location");
    assert_eq!(json["guardrail_status"], "ok");
    assert!(json["summary"].as_str().unwrap().contains("Kampala"));
}

#[tokio::test]
async fn test_blank_query_is_bad_request() {
    let base = start_server().await;
    let client = reqwest::Client::new();

    for body in [
        serde_json::json!({ "query": "   " }),
        serde_json::json!({ "query": 42 }),
        serde_json::json!({}),
    ] {
        let resp = client
            .post(format!("{}/api/ask", base))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400, "body {}", body);
        let json: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(json["error"], "Query is required");
    }
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let base = start_server().await;
    let resp = reqwest::Client::new()
        .post(format!("{}/api/ask", base))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_cors_allow_list() {
    let base = start_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{}/health", base))
        .header("origin", "http://localhost:5173")
        .send()
        .await
        .unwrap();
    assert_eq!(
        resp.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("http://localhost:5173")
    );

    let resp = client
        .get(format!("{}/health", base))
        .header("origin", "https://evil.example")
        .send()
        .await
        .unwrap();
    assert!(resp.headers().get("access-control-allow-origin").is_none());
}
