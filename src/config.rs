//! Fetcher configuration
//!
//! Layered: built-in defaults, then an optional JSON file named by
//! `MESO_FETCHER_CONFIG`, then individual environment variables.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// LMDB requires the map size to be a multiple of the OS page size
const PAGE_SIZE: usize = 4096;

/// Monster id range where meso drops are disallowed (inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludedZone {
    pub low: i32,
    pub high: i32,
}

impl Default for ExcludedZone {
    /// Mu Lung Dojo bosses
    fn default() -> Self {
        Self { low: 9300184, high: 9300215 }
    }
}

impl ExcludedZone {
    pub fn contains(&self, id: i32) -> bool {
        (self.low..=self.high).contains(&id)
    }

    /// Accepts `low..high` or `low-high`
    fn parse(raw: &str) -> Option<Self> {
        let (low, high) = raw.split_once("..").or_else(|| raw.split_once('-'))?;
        Some(Self {
            low: low.trim().parse().ok()?,
            high: high.trim().parse().ok()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    pub database_url: String,
    pub stats_path: PathBuf,
    pub stats_seed_file: Option<PathBuf>,
    pub lmdb_max_size: usize,
    pub output_path: PathBuf,
    pub permit_currency_on_excluded_bosses: bool,
    pub currency_item_id: i32,
    pub minimum_item_count: u32,
    pub drop_chance: u32,
    pub excluded_zone: ExcludedZone,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            database_url: "mysql://root@localhost:3306/cosmic".into(),
            stats_path: PathBuf::from("data/monster_stats"),
            stats_seed_file: None,
            lmdb_max_size: 64 * 1024 * 1024,
            output_path: PathBuf::from("output/meso_drop_data.sql"),
            permit_currency_on_excluded_bosses: false,
            currency_item_id: 0,
            minimum_item_count: 4,
            drop_chance: 400_000,
            excluded_zone: ExcludedZone::default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
    #[error("Invalid config: {0}")]
    Invalid(String),
}

impl FetcherConfig {
    /// Load from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup (env in production, a map in tests)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup("MESO_FETCHER_CONFIG") {
            Some(path) => Self::from_json_file(path)?,
            None => Self::default(),
        };

        if let Some(url) = lookup("DATABASE_URL") {
            config.database_url = url;
        }
        if let Some(path) = lookup("STATS_LMDB_PATH") {
            config.stats_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("STATS_SEED_FILE") {
            config.stats_seed_file = Some(PathBuf::from(path));
        }
        if let Some(raw) = lookup("LMDB_MAX_SIZE") {
            config.lmdb_max_size = parse_value("LMDB_MAX_SIZE", &raw)?;
        }
        if let Some(path) = lookup("OUTPUT_FILE") {
            config.output_path = PathBuf::from(path);
        }
        if let Some(raw) = lookup("PERMIT_MESOS_ON_EXCLUDED_BOSSES") {
            config.permit_currency_on_excluded_bosses =
                parse_flag("PERMIT_MESOS_ON_EXCLUDED_BOSSES", &raw)?;
        }
        if let Some(raw) = lookup("MESO_ITEM_ID") {
            config.currency_item_id = parse_value("MESO_ITEM_ID", &raw)?;
        }
        if let Some(raw) = lookup("MIN_ITEMS") {
            config.minimum_item_count = parse_value("MIN_ITEMS", &raw)?;
        }
        if let Some(raw) = lookup("DROP_CHANCE") {
            config.drop_chance = parse_value("DROP_CHANCE", &raw)?;
        }
        if let Some(raw) = lookup("EXCLUDED_ZONE") {
            config.excluded_zone = ExcludedZone::parse(&raw).ok_or(ConfigError::InvalidValue {
                key: "EXCLUDED_ZONE",
                value: raw.clone(),
            })?;
        }

        config.lmdb_max_size = config.lmdb_max_size.div_ceil(PAGE_SIZE) * PAGE_SIZE;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON config file; missing fields keep their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.minimum_item_count == 0 {
            return Err(ConfigError::Invalid("minimum_item_count must be at least 1".into()));
        }
        if self.drop_chance == 0 {
            return Err(ConfigError::Invalid("drop_chance must be positive".into()));
        }
        if self.excluded_zone.low > self.excluded_zone.high {
            return Err(ConfigError::Invalid(format!(
                "excluded_zone is inverted ({} > {})",
                self.excluded_zone.low, self.excluded_zone.high
            )));
        }
        if self.lmdb_max_size == 0 {
            return Err(ConfigError::Invalid("lmdb_max_size must be positive".into()));
        }
        Ok(())
    }
}

fn parse_value<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
    })
}

fn parse_flag(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<FetcherConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        FetcherConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config, FetcherConfig::default());
        assert!(!config.permit_currency_on_excluded_bosses);
        assert_eq!(config.currency_item_id, 0);
        assert_eq!(config.minimum_item_count, 4);
        assert_eq!(config.drop_chance, 400_000);
        assert_eq!(config.excluded_zone, ExcludedZone { low: 9300184, high: 9300215 });
    }

    #[test]
    fn test_env_overrides() {
        let config = load(&[
            ("MIN_ITEMS", "6"),
            ("DROP_CHANCE", "350000"),
            ("PERMIT_MESOS_ON_EXCLUDED_BOSSES", "true"),
            ("EXCLUDED_ZONE", "9300000..9300010"),
            ("OUTPUT_FILE", "/tmp/mesos.sql"),
        ])
        .unwrap();
        assert_eq!(config.minimum_item_count, 6);
        assert_eq!(config.drop_chance, 350_000);
        assert!(config.permit_currency_on_excluded_bosses);
        assert_eq!(config.excluded_zone, ExcludedZone { low: 9300000, high: 9300010 });
        assert_eq!(config.output_path, PathBuf::from("/tmp/mesos.sql"));
    }

    #[test]
    fn test_zone_dash_syntax() {
        let config = load(&[("EXCLUDED_ZONE", "100 - 200")]).unwrap();
        assert_eq!(config.excluded_zone, ExcludedZone { low: 100, high: 200 });
        assert!(config.excluded_zone.contains(100));
        assert!(config.excluded_zone.contains(200));
        assert!(!config.excluded_zone.contains(201));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            load(&[("MIN_ITEMS", "four")]),
            Err(ConfigError::InvalidValue { key: "MIN_ITEMS", .. })
        ));
        assert!(matches!(
            load(&[("PERMIT_MESOS_ON_EXCLUDED_BOSSES", "maybe")]),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(load(&[("MIN_ITEMS", "0")]), Err(ConfigError::Invalid(_))));
        assert!(matches!(
            load(&[("EXCLUDED_ZONE", "9300215..9300184")]),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_lmdb_size_rounded_to_page() {
        let config = load(&[("LMDB_MAX_SIZE", "10000")]).unwrap();
        assert_eq!(config.lmdb_max_size, 12288);
    }

    #[test]
    fn test_json_file_then_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fetcher.json");
        std::fs::write(
            &path,
            r#"{ "minimum_item_count": 8, "currency_item_id": 0, "excluded_zone": { "low": 1, "high": 2 } }"#,
        )
        .unwrap();

        let config = load(&[
            ("MESO_FETCHER_CONFIG", path.to_str().unwrap()),
            ("MIN_ITEMS", "5"),
        ])
        .unwrap();
        // env wins over file, file wins over defaults
        assert_eq!(config.minimum_item_count, 5);
        assert_eq!(config.excluded_zone, ExcludedZone { low: 1, high: 2 });
        assert_eq!(config.drop_chance, 400_000);
    }

    #[test]
    fn test_missing_config_file() {
        let err = load(&[("MESO_FETCHER_CONFIG", "/nonexistent/fetcher.json")]).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
