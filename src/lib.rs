//! Meso Drop Fetcher Library
//!
//! Traces monsters in `drop_data` that carry item drops but no meso entry and
//! proposes the missing rows as an SQL script:
//! - Level/boss based meso range formulas
//! - Missing-entry detection against the drop store
//! - Deterministic SQL script rendering with atomic file output
//! - Repository traits for the stat catalog (LMDB) and drop store (MySQL)

pub mod config;  // Layered configuration (defaults, JSON file, env)
pub mod detector;  // Monsters with items but no meso drop
pub mod fetcher;  // Pipeline orchestration and run outcomes
pub mod logging;  // tracing subscriber setup + timing spans
pub mod meso;  // Meso range formulas
pub mod script;  // SQL script rendering
pub mod storage;  // Stat catalog + drop store adapters

// Re-export commonly used types
pub use config::{ExcludedZone, FetcherConfig};
pub use fetcher::{FetchError, MesoFetcher, RunOutcome, RunReport, RunStage};
pub use meso::{compute_range, MesoRange, MesoRangeTable, MonsterId, MonsterStats};
pub use script::{ScriptSummary, ScriptWriter};
