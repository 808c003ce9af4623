//! # Job Index
//!
//! Offline search index builder for job-listing corpora.
//!
//! Reads raw postings plus a skill taxonomy, derives one cleaned document
//! per posting, fits a TF-IDF model over those documents, and writes the
//! normalized posting table, the model and the document matrix for a
//! query-time application to load.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌─────────┐   ┌─────────┐   ┌──────────┐   ┌────────┐   ┌───────────┐
//! │ postings │──▶│ filters │──▶│ skills  │──▶│ combine  │──▶│ tfidf  │──▶│ artifacts │
//! │   CSV    │   │         │   │ (join)  │   │ + clean  │   │fit+tx  │   │   JSON    │
//! └──────────┘   └─────────┘   └────▲────┘   └──────────┘   └────────┘   └───────────┘
//!                                   │
//!                      skills.csv + job_skills.csv
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! jobidx build                  # build all artifacts
//! jobidx stats                  # summarize the last build
//! jobidx lookup python rust     # vocabulary lookup
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Table and cell types |
//! | [`loader`] | CSV loading and header normalization |
//! | [`filters`] | Filter column normalization |
//! | [`skills`] | Skill enrichment join |
//! | [`clean`] | Text cleaner capability |
//! | [`combine`] | Document text assembly |
//! | [`tfidf`] | TF-IDF vectorizer |
//! | [`matrix`] | Sparse document matrix |
//! | [`artifacts`] | Artifact persistence |
//! | [`pipeline`] | Build orchestration |
//! | [`stats`] | Artifact summary |

pub mod artifacts;
pub mod clean;
pub mod combine;
pub mod config;
pub mod error;
pub mod filters;
pub mod loader;
pub mod matrix;
pub mod models;
pub mod pipeline;
pub mod skills;
pub mod stats;
pub mod stopwords;
pub mod tfidf;
