//! External-system lookup table.
//!
//! Stable facts about the government systems people ask about (IFMS, EGP,
//! URA, BOU, PBS, CFP): portal links, support contacts and follow-up
//! options. This is the only content the synthesizer may state without it
//! having been retrieved, so it is kept as versioned data rather than
//! literals in branch logic.
//!
//! The built-in table can be replaced by a TOML file named in
//! `[catalog].path`:
//!
//! ```toml
//! version = 1
//!
//! [[systems]]
//! key = "egp"
//! name = "Electronic Government Procurement (EGP) Portal"
//! triggers = ["egp", "procurement"]
//! requires_result = true
//! url = "https://egpuganda.go.ug/"
//! highlights = ["Website: Access the EGP portal for procurement processes"]
//!
//! [systems.contact]
//! label = "EGP Support Contact"
//! phone = "+256 414 230 000"
//! email = "egp-support@egp.go.ug"
//! note = "For procurement-related queries."
//!
//! [[systems.options]]
//! label = "Visit EGP portal"
//! action = "external"
//! url = "https://egpuganda.go.ug/"
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::config::Config;
use crate::models::{OptionAction, ResponseOption};

/// Schema version this build understands.
pub const CATALOG_VERSION: u32 = 1;

#[derive(Debug, Clone, Deserialize)]
pub struct Catalog {
    pub version: u32,
    #[serde(default)]
    pub systems: Vec<ExternalSystem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExternalSystem {
    pub key: String,
    pub name: String,
    /// Lowercase words or phrases that identify the system. A trigger
    /// matches whole words only, so `ura` does not fire on "duration".
    pub triggers: Vec<String>,
    /// Only answer with a card when one of the results names the system.
    #[serde(default)]
    pub requires_result: bool,
    pub url: String,
    #[serde(default = "default_category")]
    pub category: String,
    /// Bullet lines for the informational card.
    #[serde(default)]
    pub highlights: Vec<String>,
    #[serde(default)]
    pub contact: Option<SystemContact>,
    #[serde(default)]
    pub options: Vec<CatalogOption>,
}

fn default_category() -> String {
    "External Systems".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct SystemContact {
    pub label: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

/// A follow-up option as written in the table: exactly one of `url` or
/// `query`.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogOption {
    pub label: String,
    pub action: OptionAction,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub query: Option<String>,
}

impl CatalogOption {
    pub fn to_response_option(&self) -> ResponseOption {
        match (&self.url, &self.query) {
            (Some(url), _) => ResponseOption {
                label: self.label.clone(),
                action: self.action,
                payload: crate::models::OptionPayload::Url(url.clone()),
            },
            (None, Some(q)) => ResponseOption::follow_up(self.label.clone(), self.action, q.clone()),
            (None, None) => ResponseOption::follow_up(self.label.clone(), self.action, self.label.clone()),
        }
    }
}

impl ExternalSystem {
    /// True when any trigger appears in `text` as a whole word or phrase.
    pub fn is_mentioned(&self, text: &str) -> bool {
        let haystack = word_padded(text);
        self.triggers
            .iter()
            .any(|t| haystack.contains(word_padded(t).as_str()))
    }
}

/// Lowercase alphanumeric words joined and wrapped by single spaces, so a
/// plain `contains` only matches on word boundaries.
fn word_padded(text: &str) -> String {
    let mut out = String::from(" ");
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        out.push_str(&word.to_lowercase());
        out.push(' ');
    }
    out
}

impl Catalog {
    /// First system (in table order) mentioned by the query.
    pub fn detect(&self, query: &str) -> Option<&ExternalSystem> {
        self.systems.iter().find(|s| s.is_mentioned(query))
    }

    /// Load from `[catalog].path` if set, otherwise the built-in table.
    pub fn from_config(config: &Config) -> Result<Self> {
        match &config.catalog.path {
            Some(path) => Self::load(path),
            None => Ok(Self::builtin()),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog file: {}", path.display()))?;
        let catalog: Catalog =
            toml::from_str(&content).with_context(|| "Failed to parse catalog file")?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn validate(&self) -> Result<()> {
        if self.version != CATALOG_VERSION {
            bail!(
                "unsupported catalog version {} (expected {})",
                self.version,
                CATALOG_VERSION
            );
        }
        for system in &self.systems {
            if system.triggers.is_empty() {
                bail!("catalog system '{}' has no triggers", system.key);
            }
            if system
                .triggers
                .iter()
                .any(|t| word_padded(t) == " " || *t != t.to_lowercase())
            {
                bail!(
                    "catalog system '{}' triggers must be lowercase and contain a word",
                    system.key
                );
            }
            for opt in &system.options {
                if opt.url.is_some() == opt.query.is_some() {
                    bail!(
                        "catalog option '{}' of '{}' needs exactly one of url or query",
                        opt.label,
                        system.key
                    );
                }
            }
        }
        Ok(())
    }

    /// The table shipped with the binary.
    pub fn builtin() -> Self {
        fn triggers(list: &[&str]) -> Vec<String> {
            list.iter().map(|s| s.to_string()).collect()
        }
        fn link(label: &str, url: &str) -> CatalogOption {
            CatalogOption {
                label: label.to_string(),
                action: OptionAction::External,
                url: Some(url.to_string()),
                query: None,
            }
        }
        fn ask(label: &str, action: OptionAction, query: &str) -> CatalogOption {
            CatalogOption {
                label: label.to_string(),
                action,
                url: None,
                query: Some(query.to_string()),
            }
        }

        let systems = vec![
            ExternalSystem {
                key: "ifms".to_string(),
                name: "Integrated Financial Management System (IFMS)".to_string(),
                triggers: triggers(&["ifms"]),
                url: "https://ereg.ifms.go.ug/menu.php?page=menu".to_string(),
                category: default_category(),
                highlights: vec![
                    "Contact Support: Get technical support and access assistance".to_string(),
                    "System Information: Learn about IFMS features and capabilities".to_string(),
                ],
                requires_result: true,
                contact: Some(SystemContact {
                    label: "IFMS Contact Center".to_string(),
                    phone: Some("+256 414 230 000".to_string()),
                    email: Some("support@ifms.go.ug".to_string()),
                    note: Some(
                        "For technical support, system access, and user assistance with the Integrated Financial Management System."
                            .to_string(),
                    ),
                }),
                options: vec![
                    ask("Contact IFMS support", OptionAction::Contact, "IFMS contact"),
                    ask("Learn about IFMS", OptionAction::Info, "IFMS system"),
                    link(
                        "IFMS Registration/Access e-registration services",
                        "https://ereg.ifms.go.ug/menu.php?page=menu",
                    ),
                ],
            },
            ExternalSystem {
                key: "egp".to_string(),
                name: "Electronic Government Procurement (EGP) Portal".to_string(),
                triggers: triggers(&["egp", "procurement"]),
                url: "https://egpuganda.go.ug/".to_string(),
                category: default_category(),
                highlights: vec![
                    "Website: Access the EGP portal for procurement processes".to_string(),
                    "Contact: Get support contact information".to_string(),
                    "Policy: View procurement guidelines and policies".to_string(),
                ],
                requires_result: true,
                contact: Some(SystemContact {
                    label: "EGP Support Contact".to_string(),
                    phone: Some("+256 414 230 000".to_string()),
                    email: Some("egp-support@egp.go.ug".to_string()),
                    note: Some(
                        "For procurement-related queries and technical assistance with the Electronic Government Procurement portal."
                            .to_string(),
                    ),
                }),
                options: vec![
                    ask("Talk to someone", OptionAction::Contact, "EGP contact"),
                    ask("View procurement policy", OptionAction::Document, "procurement policy"),
                    link("Visit EGP portal", "https://egpuganda.go.ug/"),
                ],
            },
            ExternalSystem {
                key: "ura".to_string(),
                name: "Uganda Revenue Authority (URA)".to_string(),
                triggers: triggers(&["ura", "revenue", "tax"]),
                url: "https://www.ura.go.ug".to_string(),
                category: default_category(),
                highlights: vec![
                    "URA Website: Tax information, customs, and revenue collection".to_string(),
                    "Tax Services: Filing, payments, and compliance".to_string(),
                ],
                requires_result: true,
                contact: None,
                options: vec![
                    link("Visit URA website", "https://www.ura.go.ug"),
                    ask("Tax information", OptionAction::Info, "tax services"),
                ],
            },
            ExternalSystem {
                key: "bou".to_string(),
                name: "Bank of Uganda (BOU)".to_string(),
                triggers: triggers(&["bou", "bank of uganda", "central bank"]),
                url: "https://www.bou.or.ug".to_string(),
                category: default_category(),
                highlights: vec![
                    "BOU Website: Monetary policy, exchange rates, and financial stability"
                        .to_string(),
                ],
                requires_result: true,
                contact: None,
                options: vec![
                    link("Visit BOU website", "https://www.bou.or.ug"),
                    ask("Learn about BOU", OptionAction::Info, "bank of uganda"),
                ],
            },
            ExternalSystem {
                key: "pbs".to_string(),
                name: "Programme Based System (PBS)".to_string(),
                triggers: triggers(&["pbs", "programme based system", "programme based"]),
                url: "https://pbsmof.finance.go.ug/auth/login".to_string(),
                category: default_category(),
                highlights: vec![
                    "PBS Portal: Programme-based budgeting and financial management".to_string(),
                    "System Access: Login to PBS portal for authorized users".to_string(),
                ],
                requires_result: false,
                contact: None,
                options: vec![
                    link("Access PBS Portal", "https://pbsmof.finance.go.ug/auth/login"),
                    ask("Learn about PBS", OptionAction::Info, "programme based system"),
                ],
            },
            ExternalSystem {
                key: "cfp".to_string(),
                name: "Climate Finance Platform (CFP)".to_string(),
                triggers: triggers(&["cfp", "climate finance", "climate"]),
                url: "https://climate.finance.go.ug/user/login".to_string(),
                category: default_category(),
                highlights: vec![
                    "CFP Portal: Climate finance tracking and management".to_string(),
                    "User Access: Login to CFP portal for authorized users".to_string(),
                ],
                requires_result: false,
                contact: None,
                options: vec![
                    link("Access CFP Portal", "https://climate.finance.go.ug/user/login"),
                    ask("Learn about CFP", OptionAction::Info, "climate finance platform"),
                ],
            },
        ];

        Self {
            version: CATALOG_VERSION,
            systems,
        }
    }
}
