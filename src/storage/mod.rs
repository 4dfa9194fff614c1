//! Storage Layer - data access for the meso fetcher
//!
//! Two read-only collaborators behind repository traits:
//! - **LMDB**: Monster stat catalog (level, boss flag)
//! - **MySQL**: `drop_data` loot table
//!
//! ## Architecture
//! ```text
//! [MesoFetcher]
//!       ↓
//! [Repository Traits]
//!       ↓
//! ┌─────────────────┬────────────────┐
//! │ LmdbStatStore   │ MySqlDropStore │
//! │ (stat catalog)  │ (drop_data)    │
//! └─────────────────┴────────────────┘
//! ```

pub mod lmdb_stats;
pub mod mysql;
pub mod repository;

use tracing::info;

use self::lmdb_stats::{LmdbStatStore, StatStoreError};
use crate::config::FetcherConfig;

/// Open the stat catalog. With a seed file configured the catalog is created
/// if needed and seeded; otherwise it must already exist.
pub fn open_stat_catalog(config: &FetcherConfig) -> Result<LmdbStatStore, StatStoreError> {
    let store = match &config.stats_seed_file {
        Some(seed) => {
            let store = LmdbStatStore::create(&config.stats_path, config.lmdb_max_size)?;
            let seeded = store.seed_from_json_file(seed)?;
            info!("Stat catalog seeded with {} monsters", seeded);
            store
        }
        None => LmdbStatStore::open(&config.stats_path, config.lmdb_max_size)?,
    };

    info!("Stat catalog ready at: {}", config.stats_path.display());
    Ok(store)
}
