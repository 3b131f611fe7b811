//! Store configuration.
//!
//! All fields are required when loading from TOML. No defaults.

use complaint_core::{ConfigError, LabelPolicy};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration for a cache-backed file store.
///
/// ```toml
/// base_dir = "/var/lib/complaints"
/// cache_max_size = 1000
/// warm_up_on_start = true
/// legacy_fallback = false
///
/// [label_policy]
/// charset = "free_text"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    pub base_dir: PathBuf,
    pub cache_max_size: usize,
    pub warm_up_on_start: bool,
    pub legacy_fallback: bool,
    pub label_policy: LabelPolicy,
}

impl StoreConfig {
    /// Build a config in code. Warm-up and legacy fallback start disabled.
    pub fn new(base_dir: impl Into<PathBuf>, cache_max_size: usize) -> Self {
        Self {
            base_dir: base_dir.into(),
            cache_max_size,
            warm_up_on_start: false,
            legacy_fallback: false,
            label_policy: LabelPolicy::default(),
        }
    }

    pub fn with_warm_up(mut self, enabled: bool) -> Self {
        self.warm_up_on_start = enabled;
        self
    }

    pub fn with_legacy_fallback(mut self, enabled: bool) -> Self {
        self.legacy_fallback = enabled;
        self
    }

    pub fn with_label_policy(mut self, policy: LabelPolicy) -> Self {
        self.label_policy = policy;
        self
    }

    /// Read, parse and validate a TOML config file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: StoreConfig = toml::from_str(contents).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "base_dir",
                reason: "must not be empty".to_string(),
            });
        }
        if self.cache_max_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "cache_max_size",
                reason: "must be > 0".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use complaint_core::LabelCharset;
    use tempfile::TempDir;

    const VALID: &str = r#"
        base_dir = "/tmp/complaints"
        cache_max_size = 500
        warm_up_on_start = true
        legacy_fallback = false

        [label_policy]
        charset = "restricted"
    "#;

    #[test]
    fn test_parse_valid_config() {
        let config = StoreConfig::from_toml_str(VALID).unwrap();
        assert_eq!(config.base_dir, PathBuf::from("/tmp/complaints"));
        assert_eq!(config.cache_max_size, 500);
        assert!(config.warm_up_on_start);
        assert!(!config.legacy_fallback);
        assert_eq!(config.label_policy.charset, LabelCharset::Restricted);
    }

    #[test]
    fn test_missing_field_rejected() {
        let text = VALID.replace("legacy_fallback = false", "");
        assert!(matches!(
            StoreConfig::from_toml_str(&text),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let text = format!("{VALID}\nextra = 1\n");
        assert!(matches!(
            StoreConfig::from_toml_str(&text),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_zero_cache_size_rejected() {
        let text = VALID.replace("cache_max_size = 500", "cache_max_size = 0");
        assert_eq!(
            StoreConfig::from_toml_str(&text),
            Err(ConfigError::InvalidValue {
                field: "cache_max_size",
                reason: "must be > 0".to_string(),
            })
        );
    }

    #[test]
    fn test_empty_base_dir_rejected() {
        let config = StoreConfig::new("", 10);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "base_dir", .. })
        ));
    }

    #[test]
    fn test_from_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.toml");
        std::fs::write(&path, VALID).unwrap();
        assert_eq!(StoreConfig::from_path(&path).unwrap().cache_max_size, 500);

        let missing = StoreConfig::from_path(&dir.path().join("absent.toml"));
        assert!(matches!(missing, Err(ConfigError::Read { .. })));
    }
}
