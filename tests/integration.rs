use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn massist_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("massist");
    path
}

const SEED: &str = r#"{
  "documents": [
    {
      "title": "Budget Framework Paper FY2025/26",
      "url": "https://www.finance.go.ug/publication/budget-framework-paper-fy2025-26",
      "description": "Medium-term fiscal framework and budget priorities",
      "category": "Budget",
      "content_type": "pdf",
      "publish_date": "2024-12-15",
      "excerpts": [
        {
          "text": "The Budget Framework Paper sets out the resource envelope for FY2025/26.",
          "keywords": ["budget", "framework", "bfp"],
          "relevance": 0.9
        }
      ]
    },
    {
      "title": "Budget Speech FY2024/25",
      "url": "https://www.finance.go.ug/publication/budget-speech-fy2024-25",
      "description": "Minister's budget speech to Parliament",
      "category": "Budget",
      "content_type": "pdf",
      "publish_date": "2024-06-13"
    },
    {
      "title": "Public Finance Management Act Guidelines",
      "url": "https://www.finance.go.ug/publication/pfma-guidelines",
      "description": "Guidelines on the PFMA",
      "category": "Policies",
      "content_type": "pdf",
      "publish_date": "2023-02-01"
    },
    {
      "title": "Withdrawn Budget Circular",
      "url": "https://www.finance.go.ug/publication/withdrawn-circular",
      "description": "Superseded guidance",
      "category": "Budget",
      "is_active": false
    }
  ]
}"#;

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();
    fs::create_dir_all(root.join("data")).unwrap();

    fs::write(root.join("seed.json"), SEED).unwrap();

    // No candidate pages, so every lookup uses the configured fallbacks and
    // the tests never touch the network.
    let config_content = format!(
        r#"[db]
path = "{}/data/assistant.sqlite"

[router]
timeout_ms = 5000

[site]
location_urls = []
contact_urls = []
service_urls = []

[server]
bind = "127.0.0.1:7341"
"#,
        root.display()
    );

    let config_path = config_dir.join("assistant.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_massist(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = massist_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run massist binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

fn seeded_env() -> (TempDir, PathBuf) {
    let (tmp, config_path) = setup_test_env();
    let (_, stderr, success) = run_massist(&config_path, &["init"]);
    assert!(success, "init failed: {}", stderr);
    let seed = tmp.path().join("seed.json");
    let (_, stderr, success) = run_massist(&config_path, &["import", seed.to_str().unwrap()]);
    assert!(success, "import failed: {}", stderr);
    (tmp, config_path)
}

fn ask(config_path: &Path, query: &str) -> serde_json::Value {
    let (stdout, stderr, success) = run_massist(config_path, &["ask", query]);
    assert!(success, "ask failed: {}", stderr);
    serde_json::from_str(&stdout).unwrap_or_else(|e| panic!("bad JSON ({}): {}", e, stdout))
}

#[test]
fn test_init_creates_database() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_massist(&config_path, &["init"]);
    assert!(success, "init failed: {}", stderr);
    assert!(stdout.contains("initialized"));
    assert!(tmp.path().join("data/assistant.sqlite").exists());
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (_, _, success) = run_massist(&config_path, &["init"]);
    assert!(success);
    let (_, stderr, success) = run_massist(&config_path, &["init"]);
    assert!(success, "second init failed: {}", stderr);
}

#[test]
fn test_import_counts() {
    let (tmp, config_path) = setup_test_env();
    run_massist(&config_path, &["init"]);

    let seed = tmp.path().join("seed.json");
    let (stdout, stderr, success) = run_massist(&config_path, &["import", seed.to_str().unwrap()]);
    assert!(success, "import failed: {}", stderr);
    assert!(stdout.contains("documents: 4"));
    assert!(stdout.contains("excerpts: 1"));
    assert!(stdout.contains("ok"));
}

#[test]
fn test_reimport_no_duplicates() {
    let (tmp, config_path) = seeded_env();
    let seed = tmp.path().join("seed.json");
    let (_, _, success) = run_massist(&config_path, &["import", seed.to_str().unwrap()]);
    assert!(success);

    let (stdout, _, _) = run_massist(&config_path, &["search", "budget speech"]);
    let hits = stdout.matches("Budget Speech FY2024/25").count();
    assert_eq!(hits, 1, "duplicate results after re-import:\n{}", stdout);
}

#[test]
fn test_import_missing_file_fails() {
    let (tmp, config_path) = setup_test_env();
    run_massist(&config_path, &["init"]);
    let missing = tmp.path().join("nope.json");
    let (_, stderr, success) = run_massist(&config_path, &["import", missing.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("seed file"));
}

#[test]
fn test_search_excerpt_match_first() {
    let (_tmp, config_path) = seeded_env();

    let (stdout, stderr, success) = run_massist(&config_path, &["search", "budget"]);
    assert!(success, "search failed: {}", stderr);
    let first = stdout.lines().next().unwrap_or_default();
    assert!(first.contains("[0.90]"), "unexpected first line: {}", first);
    assert!(first.contains("Budget Framework Paper FY2025/26"));
    assert!(stdout.contains("excerpt: \"The Budget Framework Paper sets out"));
}

#[test]
fn test_search_excludes_inactive() {
    let (_tmp, config_path) = seeded_env();

    let (stdout, _, success) = run_massist(&config_path, &["search", "circular"]);
    assert!(success);
    assert!(!stdout.contains("Withdrawn Budget Circular"));
    assert!(stdout.contains("No results."));
}

#[test]
fn test_search_limit() {
    let (_tmp, config_path) = seeded_env();

    let (stdout, _, success) = run_massist(&config_path, &["search", "budget", "--limit", "1"]);
    assert!(success);
    assert!(stdout.contains("1. "));
    assert!(!stdout.contains("2. "));
}

#[test]
fn test_search_empty_query() {
    let (_tmp, config_path) = seeded_env();

    let (stdout, _, success) = run_massist(&config_path, &["search", ""]);
    assert!(success);
    assert!(stdout.contains("No results."));
}

#[test]
fn test_verbose_enables_debug_logs() {
    let (_tmp, config_path) = seeded_env();

    let (_, stderr, success) = run_massist(&config_path, &["search", "budget"]);
    assert!(success);
    assert!(!stderr.contains("DEBUG"), "unexpected debug output: {}", stderr);

    let (stdout, stderr, success) = run_massist(&config_path, &["-v", "search", "budget"]);
    assert!(success);
    assert!(stderr.contains("DEBUG"), "no debug output: {}", stderr);
    assert!(!stdout.contains("DEBUG"));
}

#[test]
fn test_classify_needs_no_config() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("missing.toml");

    let (stdout, stderr, success) = run_massist(&missing, &["classify", "where is the ministry"]);
    assert!(success, "classify failed: {}", stderr);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["intent"], "location");
    assert_eq!(json["confidence"], 0.95);
}

#[test]
fn test_ask_document_query() {
    let (_tmp, config_path) = seeded_env();

    let json = ask(&config_path, "download budget framework paper");
    assert_eq!(json["intent"], "document");
    assert_eq!(json["guardrail_status"], "ok");
    assert_eq!(json["sources"][0]["title"], "Budget Framework Paper FY2025/26");
}

#[test]
fn test_ask_common_words_do_not_trigger_external_systems() {
    let (_tmp, config_path) = seeded_env();

    let json = ask(&config_path, "download the budget speech about the estimates");
    assert_eq!(json["intent"], "document");
    assert!(json["summary"].as_str().unwrap().starts_with("I found"));
    let urls: Vec<&str> = json["sources"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["url"].as_str().unwrap())
        .collect();
    assert!(urls.contains(&"https://www.finance.go.ug/publication/budget-speech-fy2024-25"));
    assert!(urls.iter().all(|u| u.starts_with("https://www.finance.go.ug/")));
}

#[test]
fn test_ask_location_uses_fallback() {
    let (_tmp, config_path) = seeded_env();

    let json = ask(&config_path, "where is the ministry located");
    assert_eq!(json["intent"], "location");
    assert_eq!(json["guardrail_status"], "ok");
    assert!(json["summary"].as_str().unwrap().contains("Apollo Kaggwa Road"));
    assert!(!json["sources"].as_array().unwrap().is_empty());
    assert_eq!(json["options"][0]["label"], "Get Directions");
}

#[test]
fn test_ask_contact_uses_fallback() {
    let (_tmp, config_path) = seeded_env();

    let json = ask(&config_path, "what is your email");
    assert_eq!(json["intent"], "contact");
    assert!(json["summary"].as_str().unwrap().contains("General Inquiries"));
}

#[test]
fn test_ask_nothing_found() {
    let (_tmp, config_path) = seeded_env();

    let json = ask(&config_path, "zzzz qqqq");
    assert_eq!(json["guardrail_status"], "not_found");
    assert!(json.get("options").is_none());
}

#[test]
fn test_missing_config_errors() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("missing.toml");
    let (_, stderr, success) = run_massist(&missing, &["init"]);
    assert!(!success);
    assert!(stderr.contains("config file"));
}
