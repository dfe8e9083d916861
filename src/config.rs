//! TOML configuration.
//!
//! Every section except `[db]` has defaults, so a minimal file only needs a
//! database path. See `config/assistant.example.toml` for the full layout.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub router: RouterConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    /// Result limit used by the document handler.
    #[serde(default = "default_document_limit")]
    pub document_limit: usize,
    /// Result limit used by the service handler's search fallback.
    #[serde(default = "default_service_limit")]
    pub service_limit: usize,
    /// Relevance assigned to documents matched only by title/description/category.
    #[serde(default = "default_keyword_relevance")]
    pub keyword_relevance: f64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            document_limit: default_document_limit(),
            service_limit: default_service_limit(),
            keyword_relevance: default_keyword_relevance(),
        }
    }
}

fn default_document_limit() -> usize {
    5
}
fn default_service_limit() -> usize {
    3
}
fn default_keyword_relevance() -> f64 {
    0.5
}

#[derive(Debug, Deserialize, Clone)]
pub struct RouterConfig {
    /// Ceiling on total handling time for a single query.
    #[serde(default = "default_router_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_router_timeout_ms(),
        }
    }
}

fn default_router_timeout_ms() -> u64 {
    15_000
}

#[derive(Debug, Deserialize, Clone)]
pub struct FetcherConfig {
    #[serde(default = "default_fetch_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_fetch_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_fetch_timeout_secs() -> u64 {
    10
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (compatible; MoFPED-Help-Assistant/1.0)".to_string()
}

/// The official website the assistant answers for, and the fallback facts
/// used when none of its pages can be read.
#[derive(Debug, Deserialize, Clone)]
pub struct SiteConfig {
    #[serde(default = "default_site_name")]
    pub name: String,
    /// Short label used in summaries (e.g. `finance.go.ug`).
    #[serde(default = "default_site_domain")]
    pub domain: String,
    #[serde(default = "default_home_url")]
    pub home_url: String,
    #[serde(default = "default_contact_url")]
    pub contact_url: String,
    #[serde(default = "default_services_url")]
    pub services_url: String,
    #[serde(default = "default_location_urls")]
    pub location_urls: Vec<String>,
    #[serde(default = "default_contact_urls")]
    pub contact_urls: Vec<String>,
    #[serde(default = "default_service_urls")]
    pub service_urls: Vec<String>,
    #[serde(default)]
    pub fallback: FallbackLocation,
    #[serde(default = "default_fallback_contacts")]
    pub fallback_contacts: Vec<FallbackContact>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: default_site_name(),
            domain: default_site_domain(),
            home_url: default_home_url(),
            contact_url: default_contact_url(),
            services_url: default_services_url(),
            location_urls: default_location_urls(),
            contact_urls: default_contact_urls(),
            service_urls: default_service_urls(),
            fallback: FallbackLocation::default(),
            fallback_contacts: default_fallback_contacts(),
        }
    }
}

fn default_site_name() -> String {
    "Ministry of Finance".to_string()
}
fn default_site_domain() -> String {
    "finance.go.ug".to_string()
}
fn default_home_url() -> String {
    "https://www.finance.go.ug".to_string()
}
fn default_contact_url() -> String {
    "https://www.finance.go.ug/contact-us".to_string()
}
fn default_services_url() -> String {
    "https://www.finance.go.ug/services".to_string()
}
fn default_location_urls() -> Vec<String> {
    vec![
        "https://www.finance.go.ug/contact-us".to_string(),
        "https://www.finance.go.ug/about-us".to_string(),
        "https://www.finance.go.ug/contact".to_string(),
        "https://www.finance.go.ug".to_string(),
    ]
}
fn default_contact_urls() -> Vec<String> {
    vec!["https://www.finance.go.ug/contact-us".to_string()]
}
fn default_service_urls() -> Vec<String> {
    vec![
        "https://www.finance.go.ug/services".to_string(),
        "https://www.finance.go.ug/how-to-apply".to_string(),
        "https://www.gov.ug/services".to_string(),
    ]
}

#[derive(Debug, Deserialize, Clone)]
pub struct FallbackLocation {
    #[serde(default = "default_fallback_address")]
    pub address: String,
    #[serde(default = "default_fallback_hours")]
    pub hours: Option<String>,
    #[serde(default = "default_fallback_phone")]
    pub phone: Option<String>,
    #[serde(default = "default_fallback_email")]
    pub email: Option<String>,
}

impl Default for FallbackLocation {
    fn default() -> Self {
        Self {
            address: default_fallback_address(),
            hours: default_fallback_hours(),
            phone: default_fallback_phone(),
            email: default_fallback_email(),
        }
    }
}

fn default_fallback_address() -> String {
    "Ministry of Finance, Planning and Economic Development, Plot 2-12 Apollo Kaggwa Road, P.O. Box 8147, Kampala, Uganda".to_string()
}
fn default_fallback_hours() -> Option<String> {
    Some("Monday - Friday: 8:00 AM - 5:00 PM".to_string())
}
fn default_fallback_phone() -> Option<String> {
    Some("+256 414 230 000".to_string())
}
fn default_fallback_email() -> Option<String> {
    Some("info@finance.go.ug".to_string())
}

#[derive(Debug, Deserialize, Clone)]
pub struct FallbackContact {
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub hours: Option<String>,
}

fn default_fallback_contacts() -> Vec<FallbackContact> {
    vec![
        FallbackContact {
            department: Some("General Inquiries".to_string()),
            phone: Some("+256 414 230 000".to_string()),
            email: Some("info@finance.go.ug".to_string()),
            hours: None,
        },
        FallbackContact {
            department: Some("ICT Support".to_string()),
            phone: Some("+256 414 230 001".to_string()),
            email: Some("ict@finance.go.ug".to_string()),
            hours: None,
        },
    ]
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CatalogConfig {
    /// Optional TOML file replacing the built-in external-system table.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Exact origins allowed by CORS. Empty together with
    /// `allowed_origin_prefixes` means any origin.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
    #[serde(default)]
    pub allowed_origin_prefixes: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            allowed_origins: Vec::new(),
            allowed_origin_prefixes: Vec::new(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    if config.retrieval.document_limit == 0 {
        anyhow::bail!("retrieval.document_limit must be >= 1");
    }
    if config.retrieval.service_limit == 0 {
        anyhow::bail!("retrieval.service_limit must be >= 1");
    }
    if !(0.0..=1.0).contains(&config.retrieval.keyword_relevance) {
        anyhow::bail!("retrieval.keyword_relevance must be in [0.0, 1.0]");
    }
    if config.router.timeout_ms == 0 {
        anyhow::bail!("router.timeout_ms must be > 0");
    }
    if config.fetcher.timeout_secs == 0 {
        anyhow::bail!("fetcher.timeout_secs must be > 0");
    }
    Ok(())
}
