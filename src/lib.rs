//! Gazetteer: historical settlement names consolidated into a localized dataset
//!
//! This crate turns a hand-maintained hierarchy of settlements (country, subject,
//! settlement, dated name history in several source languages) into a single
//! dataset rendered in katakana, and serves phonetic search over it:
//!
//! 1. **Loading** -- Read the settlement hierarchy, the transliteration dictionary
//!    and the per-country population tables in parallel, then validate them
//! 2. **Consolidation** -- Walk the hierarchy in document order, transliterate every
//!    name, expand multi-range periods and attach population facts
//! 3. **Output** -- Write the dataset JSON, plus an optional CSV of the flattened
//!    name index and a YAML report of machine-generated renderings
//! 4. **Search** -- Latinize every indexed name once and rank fuzzy matches of a
//!    latinized query, filtered by country and subject
//!
//! # Key Modules
//!
//! - [`validate`] -- Structural checks turning YAML documents into typed inputs
//! - [`dictionary`] -- Curated renderings with a generated fallback for Russian
//! - [`population`] -- Population tables with redirect-aware lookup
//! - [`pipeline`] -- Ordered consolidation into [`models::Dataset`]
//! - [`period`] -- Period descriptor parsing and sort keys
//! - [`romaji`] -- Katakana latinization for search keys
//! - [`katakana`] -- Best-effort Cyrillic to katakana generation
//! - [`matcher`] -- Approximate substring scoring
//! - [`search`] -- Filterable ranked lookup over a dataset
//! - [`cache`] -- Search key persistence
//! - [`output`] -- Dataset, CSV and report writers
//! - [`stats`] -- Atomic build counters
//! - [`config`] -- Constants and default paths
//!
//! # Example Usage
//!
//! ```bash
//! # Build the dataset and export the name index
//! gazetteer build --cities cities.yml --names-csv data/names.csv
//!
//! # Search by kana or latin spelling within a country
//! gazetteer search --country ロシア mosukuwa
//! ```

pub mod cache;
pub mod config;
pub mod dictionary;
pub mod inputs;
pub mod katakana;
pub mod languages;
pub mod matcher;
pub mod models;
pub mod output;
pub mod period;
pub mod pipeline;
pub mod population;
pub mod romaji;
pub mod search;
pub mod stats;
pub mod validate;
