use std::path::PathBuf;
use std::str::FromStr;

/// Server settings, read from `INNKEEP_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub bind: String,
    pub data_dir: PathBuf,
    pub max_connections: usize,
    /// WAL appends after which the background compactor rewrites the log.
    pub compact_threshold: u64,
    pub metrics_port: Option<u16>,
    /// Seed the sample room inventory into an empty store.
    pub seed: bool,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key}: cannot parse {value:?}")]
    Invalid { key: &'static str, value: String },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5433,
            bind: "0.0.0.0".into(),
            data_dir: PathBuf::from("./data"),
            max_connections: 256,
            compact_threshold: 1000,
            metrics_port: None,
            seed: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unset keys take their defaults; set but
    /// unparsable keys are errors.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Config::default();
        Ok(Self {
            port: parsed(&lookup, "INNKEEP_PORT")?.unwrap_or(defaults.port),
            bind: lookup("INNKEEP_BIND").unwrap_or(defaults.bind),
            data_dir: lookup("INNKEEP_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            max_connections: parsed(&lookup, "INNKEEP_MAX_CONNECTIONS")?
                .unwrap_or(defaults.max_connections),
            compact_threshold: parsed(&lookup, "INNKEEP_COMPACT_THRESHOLD")?
                .unwrap_or(defaults.compact_threshold),
            metrics_port: parsed(&lookup, "INNKEEP_METRICS_PORT")?,
            seed: match lookup("INNKEEP_SEED") {
                None => defaults.seed,
                Some(v) => parse_flag(&v).ok_or(ConfigError::Invalid {
                    key: "INNKEEP_SEED",
                    value: v,
                })?,
            },
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    pub fn wal_path(&self) -> PathBuf {
        self.data_dir.join("innkeep.wal")
    }
}

fn parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(key) {
        None => Ok(None),
        Some(v) => v
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value: v }),
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = from_pairs(&[]).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.listen_addr(), "0.0.0.0:5433");
        assert_eq!(config.wal_path(), PathBuf::from("./data/innkeep.wal"));
    }

    #[test]
    fn reads_every_key() {
        let config = from_pairs(&[
            ("INNKEEP_PORT", "6000"),
            ("INNKEEP_BIND", "127.0.0.1"),
            ("INNKEEP_DATA_DIR", "/var/lib/innkeep"),
            ("INNKEEP_MAX_CONNECTIONS", "8"),
            ("INNKEEP_COMPACT_THRESHOLD", " 50 "),
            ("INNKEEP_METRICS_PORT", "9100"),
            ("INNKEEP_SEED", "true"),
        ])
        .unwrap();
        assert_eq!(config.port, 6000);
        assert_eq!(config.bind, "127.0.0.1");
        assert_eq!(config.wal_path(), PathBuf::from("/var/lib/innkeep/innkeep.wal"));
        assert_eq!(config.max_connections, 8);
        assert_eq!(config.compact_threshold, 50);
        assert_eq!(config.metrics_port, Some(9100));
        assert!(config.seed);
    }

    #[test]
    fn unparsable_values_are_errors() {
        assert_eq!(
            from_pairs(&[("INNKEEP_PORT", "http")]),
            Err(ConfigError::Invalid {
                key: "INNKEEP_PORT",
                value: "http".into()
            })
        );
        assert!(from_pairs(&[("INNKEEP_MAX_CONNECTIONS", "-1")]).is_err());
        assert!(from_pairs(&[("INNKEEP_SEED", "maybe")]).is_err());
    }

    #[test]
    fn seed_flag_spellings() {
        assert!(from_pairs(&[("INNKEEP_SEED", "1")]).unwrap().seed);
        assert!(!from_pairs(&[("INNKEEP_SEED", "0")]).unwrap().seed);
        assert!(!from_pairs(&[("INNKEEP_SEED", "False")]).unwrap().seed);
    }
}
