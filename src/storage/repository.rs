//! Repository traits - abstraction layer for data access
//!
//! The fetcher only talks to its collaborators through these traits, so the
//! stat catalog and drop store backends can be swapped (or faked in tests).

use async_trait::async_trait;
use std::collections::HashMap;
use std::error::Error;

use crate::meso::{MonsterId, MonsterStats};

/// Generic result type for repository operations
pub type RepoResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

/// Read-only catalog of monster stats (level, boss flag)
#[async_trait]
pub trait MonsterStatsRepo: Send + Sync {
    async fn get_all(&self) -> RepoResult<HashMap<MonsterId, MonsterStats>>;
    async fn count(&self) -> RepoResult<usize>;
}

/// Read-only view of the `drop_data` table
#[async_trait]
pub trait DropDataRepo: Send + Sync {
    /// Droppers with at least `min_items` rows and no row for `item_id`,
    /// in the order the store returns them
    async fn find_droppers_missing_item(
        &self,
        min_items: u32,
        item_id: i32,
    ) -> RepoResult<Vec<MonsterId>>;

    /// Release the underlying connection(s)
    async fn close(&self) {}
}
