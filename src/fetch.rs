//! Web page fetching.
//!
//! [`PageFetcher`] is the seam between the directory lookups and the
//! network. [`HttpFetcher`] is the production implementation: a single
//! `GET` with a browser-like header set and a hard timeout, followed by
//! [`distill_html`], which reduces the markup to a title and one line of
//! visible text.

use async_trait::async_trait;
use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;

use crate::config::FetcherConfig;

const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.5";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{url} returned {status}")]
    Status { url: String, status: u16 },
}

/// Title and visible text of one page.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedPage {
    pub url: String,
    pub title: String,
    pub text: String,
    pub last_checked: NaiveDate,
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError>;
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &FetcherConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, ACCEPT)
            .header(reqwest::header::ACCEPT_LANGUAGE, ACCEPT_LANGUAGE)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let html = response.text().await?;
        let (title, text) = distill_html(&html);
        Ok(FetchedPage {
            url: url.to_string(),
            title,
            text,
            last_checked: chrono::Local::now().date_naive(),
        })
    }
}

static COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").unwrap());
static STYLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>").unwrap());
static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title\b[^>]*>(.*?)</title\s*>").unwrap());
static H1_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<h1\b[^>]*>(.*?)</h1\s*>").unwrap());
static BODY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<body\b[^>]*>(.*?)(?:</body\s*>|\z)").unwrap());
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());
static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Reduce an HTML document to `(title, text)`.
///
/// Scripts, styles and comments are dropped. The title comes from `<title>`,
/// or the first `<h1>` when that is empty. Text is the body's visible text
/// with entities decoded and whitespace collapsed to single spaces.
pub fn distill_html(html: &str) -> (String, String) {
    let cleaned = COMMENT_RE.replace_all(html, " ");
    let cleaned = SCRIPT_RE.replace_all(&cleaned, " ");
    let cleaned = STYLE_RE.replace_all(&cleaned, " ");

    let title = [&*TITLE_RE, &*H1_RE]
        .iter()
        .filter_map(|re| re.captures(&cleaned))
        .map(|caps| inline_text(&caps[1]))
        .find(|t| !t.is_empty())
        .unwrap_or_default();

    let body = BODY_RE
        .captures(&cleaned)
        .map(|caps| caps[1].to_string())
        .unwrap_or_else(|| cleaned.to_string());

    (title, inline_text(&body))
}

fn inline_text(fragment: &str) -> String {
    let stripped = TAG_RE.replace_all(fragment, " ");
    let decoded = decode_entities(&stripped);
    WS_RE.replace_all(&decoded, " ").trim().to_string()
}

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        match tail.find(';').filter(|&end| end <= 10) {
            Some(end) => match decode_entity(&tail[1..end]) {
                Some(ch) => {
                    out.push(ch);
                    rest = &tail[end + 1..];
                }
                None => {
                    out.push('&');
                    rest = &tail[1..];
                }
            },
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse().ok()?,
        };
        return char::from_u32(code);
    }
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        "ndash" => Some('–'),
        "mdash" => Some('—'),
        "copy" => Some('©'),
        _ => None,
    }
}
