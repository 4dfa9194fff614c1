//! LMDB Stat Store - Monster stat catalog
//!
//! Stores the level/boss stats of every monster in LMDB, keyed by monster id.
//! The catalog is written once from a stat export and read on every run.
//!
//! ## Layout
//! - One database, `monster_stats`
//! - Key: decimal monster id (`"100100"`)
//! - Value: bincode-encoded [`MonsterStats`]

use async_trait::async_trait;
use heed::types::{Bytes, Str};
use heed::{Database, Env, EnvOpenOptions};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::repository::{MonsterStatsRepo, RepoResult};
use crate::meso::{MonsterId, MonsterStats};

/// LMDB-backed monster stat catalog
pub struct LmdbStatStore {
    env: Env,
    stats: Database<Str, Bytes>,
}

/// Error type for stat catalog operations
#[derive(Debug, thiserror::Error)]
pub enum StatStoreError {
    #[error("LMDB error: {0}")]
    Heed(#[from] heed::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),
    #[error("Seed file error: {0}")]
    SeedFormat(#[from] serde_json::Error),
    #[error("Stat catalog not found at {0}")]
    Missing(PathBuf),
    #[error("Corrupt key in monster_stats: {0}")]
    CorruptKey(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LmdbStatStore {
    /// Open an existing stat catalog; a missing directory is an error
    ///
    /// # Arguments
    /// * `path` - Directory for LMDB data files
    /// * `max_size` - Maximum database size in bytes (must be page aligned)
    pub fn open<P: AsRef<Path>>(path: P, max_size: usize) -> Result<Self, StatStoreError> {
        let path = path.as_ref();
        if !path.is_dir() {
            return Err(StatStoreError::Missing(path.to_path_buf()));
        }
        Self::open_env(path, max_size)
    }

    /// Open the stat catalog, creating its directory first (used when seeding)
    pub fn create<P: AsRef<Path>>(path: P, max_size: usize) -> Result<Self, StatStoreError> {
        std::fs::create_dir_all(&path)?;
        Self::open_env(path.as_ref(), max_size)
    }

    fn open_env(path: &Path, max_size: usize) -> Result<Self, StatStoreError> {
        let env = unsafe { EnvOpenOptions::new().map_size(max_size).max_dbs(1).open(path)? };

        let mut wtxn = env.write_txn()?;
        let stats = env.create_database::<Str, Bytes>(&mut wtxn, Some("monster_stats"))?;
        wtxn.commit()?;

        info!("LMDB stat catalog opened ({}MB)", max_size / (1024 * 1024));

        Ok(Self { env, stats })
    }

    /// Store stats for one monster
    pub fn put_stats(&self, mob: &MonsterStats) -> Result<(), StatStoreError> {
        let bytes = bincode::serialize(mob)?;
        let mut wtxn = self.env.write_txn()?;
        self.stats.put(&mut wtxn, &mob.monster_id.to_string(), &bytes)?;
        wtxn.commit()?;
        debug!("Stored stats for monster {}", mob.monster_id);
        Ok(())
    }

    /// Get stats for one monster
    pub fn get_stats(&self, id: MonsterId) -> Result<Option<MonsterStats>, StatStoreError> {
        let rtxn = self.env.read_txn()?;
        match self.stats.get(&rtxn, &id.to_string())? {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes)?)),
            None => Ok(None),
        }
    }

    /// Bulk insert stats (single transaction)
    pub fn bulk_put(&self, mobs: &[MonsterStats]) -> Result<usize, StatStoreError> {
        let mut wtxn = self.env.write_txn()?;
        for mob in mobs {
            let bytes = bincode::serialize(mob)?;
            self.stats.put(&mut wtxn, &mob.monster_id.to_string(), &bytes)?;
        }
        wtxn.commit()?;
        info!("Bulk inserted {} monster stats", mobs.len());
        Ok(mobs.len())
    }

    /// Load a JSON array of monster stats into the catalog
    pub fn seed_from_json_file<P: AsRef<Path>>(&self, path: P) -> Result<usize, StatStoreError> {
        let raw = std::fs::read_to_string(&path)?;
        let mobs: Vec<MonsterStats> = serde_json::from_str(&raw)?;
        info!("Seeding stat catalog from {}", path.as_ref().display());
        self.bulk_put(&mobs)
    }

    /// Every monster in the catalog, keyed by id
    pub fn load_all(&self) -> Result<HashMap<MonsterId, MonsterStats>, StatStoreError> {
        let rtxn = self.env.read_txn()?;
        let mut all = HashMap::new();
        for entry in self.stats.iter(&rtxn)? {
            let (key, bytes) = entry?;
            let id: MonsterId = key
                .parse()
                .map_err(|_| StatStoreError::CorruptKey(key.to_string()))?;
            let mob: MonsterStats = bincode::deserialize(bytes)?;
            all.insert(id, mob);
        }
        Ok(all)
    }

    /// Number of monsters in the catalog
    pub fn len(&self) -> Result<usize, StatStoreError> {
        let rtxn = self.env.read_txn()?;
        Ok(self.stats.len(&rtxn)? as usize)
    }

    pub fn is_empty(&self) -> Result<bool, StatStoreError> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl MonsterStatsRepo for LmdbStatStore {
    async fn get_all(&self) -> RepoResult<HashMap<MonsterId, MonsterStats>> {
        Ok(self.load_all()?)
    }

    async fn count(&self) -> RepoResult<usize> {
        Ok(self.len()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_store(dir: &tempfile::TempDir) -> LmdbStatStore {
        LmdbStatStore::create(dir.path().join("stats"), 10 * 1024 * 1024).unwrap()
    }

    #[test]
    fn test_open_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("typo_path");

        let err = LmdbStatStore::open(&path, 10 * 1024 * 1024).err().unwrap();
        assert!(matches!(err, StatStoreError::Missing(p) if p == path));
        assert!(!path.exists());
    }

    #[test]
    fn test_open_reads_created_catalog() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = open_store(&dir);
            store
                .put_stats(&MonsterStats { monster_id: 100100, level: 1, is_boss: false })
                .unwrap();
        }

        let reopened = LmdbStatStore::open(dir.path().join("stats"), 10 * 1024 * 1024).unwrap();
        assert_eq!(reopened.len().unwrap(), 1);
    }

    #[test]
    fn test_store_creation() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);
        assert!(store.is_empty().unwrap());
        assert!(store.load_all().unwrap().is_empty());
    }

    #[test]
    fn test_stats_crud() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);

        let snail = MonsterStats { monster_id: 100100, level: 1, is_boss: false };
        store.put_stats(&snail).unwrap();

        assert_eq!(store.get_stats(100100).unwrap(), Some(snail));
        assert_eq!(store.get_stats(100101).unwrap(), None);
        assert_eq!(store.len().unwrap(), 1);

        // Overwrite keeps a single entry
        let boss_snail = MonsterStats { is_boss: true, ..snail };
        store.put_stats(&boss_snail).unwrap();
        assert_eq!(store.len().unwrap(), 1);
        assert!(store.get_stats(100100).unwrap().unwrap().is_boss);
    }

    #[test]
    fn test_bulk_put_and_load_all() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);

        let mobs: Vec<MonsterStats> = (0..50)
            .map(|i| MonsterStats {
                monster_id: 9300000 + i,
                level: i as u32 * 3,
                is_boss: i % 10 == 0,
            })
            .collect();
        assert_eq!(store.bulk_put(&mobs).unwrap(), 50);

        let all = store.load_all().unwrap();
        assert_eq!(all.len(), 50);
        assert_eq!(all[&9300020].level, 60);
        assert!(all[&9300020].is_boss);
        assert!(!all[&9300021].is_boss);
    }

    #[test]
    fn test_seed_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);

        let seed = dir.path().join("mob_stats.json");
        std::fs::write(
            &seed,
            r#"[
                {"monster_id": 100100, "level": 1},
                {"monster_id": 8800000, "level": 110, "is_boss": true}
            ]"#,
        )
        .unwrap();

        assert_eq!(store.seed_from_json_file(&seed).unwrap(), 2);
        let zakum = store.get_stats(8800000).unwrap().unwrap();
        assert_eq!(zakum.level, 110);
        assert!(zakum.is_boss);
        assert!(!store.get_stats(100100).unwrap().unwrap().is_boss);
    }

    #[test]
    fn test_seed_rejects_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);

        let seed = dir.path().join("broken.json");
        std::fs::write(&seed, "{ not json").unwrap();

        let err = store.seed_from_json_file(&seed).unwrap_err();
        assert!(matches!(err, StatStoreError::SeedFormat(_)));
        assert!(store.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_repo_trait_reads_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);
        store
            .put_stats(&MonsterStats { monster_id: 2230100, level: 23, is_boss: false })
            .unwrap();

        let repo: &dyn MonsterStatsRepo = &store;
        assert_eq!(repo.count().await.unwrap(), 1);
        assert!(repo.get_all().await.unwrap().contains_key(&2230100));
    }
}
