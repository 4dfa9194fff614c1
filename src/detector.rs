//! Missing meso entry detection
//!
//! A monster is a candidate when the drop store has at least `min_items`
//! rows for it, none of them for the meso item, and the stat catalog knows
//! it (otherwise there is no range to propose).

use tracing::{debug, warn};

use crate::meso::{MesoRangeTable, MonsterId};
use crate::storage::repository::{DropDataRepo, RepoResult};

/// Result of one detection pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Detection {
    /// Droppers to write rows for, in store order
    pub candidates: Vec<MonsterId>,
    /// Droppers the store reported but the stat catalog does not know
    pub unknown: Vec<MonsterId>,
}

impl Detection {
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MissingEntryDetector {
    pub min_items: u32,
    pub currency_item_id: i32,
}

impl MissingEntryDetector {
    pub fn new(min_items: u32, currency_item_id: i32) -> Self {
        Self { min_items, currency_item_id }
    }

    /// Query the store and keep droppers that have a computed range
    pub async fn detect(
        &self,
        store: &dyn DropDataRepo,
        ranges: &MesoRangeTable,
    ) -> RepoResult<Detection> {
        let droppers = store
            .find_droppers_missing_item(self.min_items, self.currency_item_id)
            .await?;

        debug!(
            "{} droppers with >= {} items lack item {}",
            droppers.len(),
            self.min_items,
            self.currency_item_id
        );

        Ok(partition_known(droppers, ranges))
    }
}

/// Split store results into catalog-known candidates and unknown ids
pub fn partition_known(droppers: Vec<MonsterId>, ranges: &MesoRangeTable) -> Detection {
    let (candidates, unknown): (Vec<_>, Vec<_>) =
        droppers.into_iter().partition(|id| ranges.contains_key(id));

    if !unknown.is_empty() {
        warn!(
            "Skipping {} droppers missing from the stat catalog",
            unknown.len()
        );
        debug!("Unknown droppers: {:?}", unknown);
    }

    Detection { candidates, unknown }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meso::compute_range;

    fn table(ids: &[MonsterId]) -> MesoRangeTable {
        ids.iter().map(|id| (*id, compute_range(10, false))).collect()
    }

    #[test]
    fn test_partition_keeps_store_order() {
        let ranges = table(&[300, 100, 200]);
        let detection = partition_known(vec![200, 999, 100, 300], &ranges);
        assert_eq!(detection.candidates, vec![200, 100, 300]);
        assert_eq!(detection.unknown, vec![999]);
    }

    #[test]
    fn test_partition_all_unknown_is_empty() {
        let ranges = table(&[1]);
        let detection = partition_known(vec![2, 3], &ranges);
        assert!(detection.is_empty());
        assert_eq!(detection.unknown, vec![2, 3]);
    }

    #[test]
    fn test_partition_empty_store_result() {
        let detection = partition_known(Vec::new(), &table(&[1, 2]));
        assert_eq!(detection, Detection::default());
    }
}
