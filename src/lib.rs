//! # Ministry assistant
//!
//! Answers natural-language questions about a government ministry's public
//! content. A query is classified by intent, routed to a handler, and
//! answered from documents in the content store or from the ministry's
//! official website. Answers never state facts that were not retrieved,
//! apart from the static external-system cards in [`catalog`].
//!
//! ## Architecture
//!
//! ```text
//!                    ┌────────────┐
//!   query ──────────▶│   router   │──── timeout / error ──▶ apology
//!                    └─────┬──────┘
//!                          │ intent
//!          ┌───────────────┼────────────────┐
//!          ▼               ▼                ▼
//!   ┌─────────────┐  ┌───────────┐   ┌────────────┐
//!   │  directory  │  │  search   │──▶│  respond   │
//!   │ fetch+regex │  │ store     │   │ + catalog  │
//!   └─────────────┘  └───────────┘   └────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`intent`] | Intent classification |
//! | [`store`] | Content store trait, SQLite and in-memory stores |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema bootstrap |
//! | [`import`] | Seed-file import |
//! | [`search`] | Hybrid document search and ranking |
//! | [`catalog`] | External-system lookup table |
//! | [`respond`] | Response synthesis |
//! | [`fetch`] | Web page fetching and HTML distillation |
//! | [`extract`] | Location and contact extraction |
//! | [`directory`] | Official-site lookups |
//! | [`router`] | Query routing |
//! | [`server`] | HTTP server |

pub mod catalog;
pub mod config;
pub mod db;
pub mod directory;
pub mod extract;
pub mod fetch;
pub mod import;
pub mod intent;
pub mod migrate;
pub mod models;
pub mod respond;
pub mod router;
pub mod search;
pub mod server;
pub mod store;
