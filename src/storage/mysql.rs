//! MySQL Storage - read-only access to `drop_data`
//!
//! The drop tables live in the game server's MySQL schema. Uses `sqlx` with
//! a single-connection pool: the fetcher issues exactly one query per run.

use async_trait::async_trait;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use tracing::{debug, info};

use super::repository::{DropDataRepo, RepoResult};
use crate::meso::MonsterId;

/// Droppers with enough rows but none for the given item
const MISSING_ITEM_QUERY: &str = "SELECT dropperid FROM drop_data \
     WHERE dropperid NOT IN (SELECT DISTINCT dropperid FROM drop_data WHERE itemid = ?) \
     GROUP BY dropperid HAVING COUNT(*) >= ?";

/// Bind values in placeholder order: item id, then the row-count threshold
fn missing_item_args(min_items: u32, item_id: i32) -> (i32, i64) {
    (item_id, i64::from(min_items))
}

/// MySQL connection pool wrapper
#[derive(Clone)]
pub struct MySqlDropStore {
    pool: MySqlPool,
}

/// Error type for MySQL operations
#[derive(Debug, thiserror::Error)]
pub enum MySqlStoreError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

impl MySqlDropStore {
    /// Set up a lazy pool: the connection is opened by the first query, so an
    /// unreachable server surfaces as a query failure
    pub fn new(database_url: &str) -> Result<Self, MySqlStoreError> {
        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .connect_lazy(database_url)?;

        info!("MySQL pool configured (max_connections=1)");
        Ok(Self { pool })
    }

    /// Droppers lacking `item_id` that have at least `min_items` rows
    pub async fn droppers_missing_item(
        &self,
        min_items: u32,
        item_id: i32,
    ) -> Result<Vec<MonsterId>, MySqlStoreError> {
        let (item_arg, count_arg) = missing_item_args(min_items, item_id);
        let ids: Vec<MonsterId> = sqlx::query_scalar(MISSING_ITEM_QUERY)
            .bind(item_arg)
            .bind(count_arg)
            .fetch_all(&self.pool)
            .await?;

        debug!("drop_data query returned {} droppers", ids.len());
        Ok(ids)
    }
}

#[async_trait]
impl DropDataRepo for MySqlDropStore {
    async fn find_droppers_missing_item(
        &self,
        min_items: u32,
        item_id: i32,
    ) -> RepoResult<Vec<MonsterId>> {
        Ok(self.droppers_missing_item(min_items, item_id).await?)
    }

    async fn close(&self) {
        self.pool.close().await;
        debug!("MySQL pool closed");
    }
}
