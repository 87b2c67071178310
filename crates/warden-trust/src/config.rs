//! Trust store configuration.
//!
//! Configuration is layered: defaults, then a TOML file, then environment
//! variables of the form `WARDEN_<FIELD_NAME>`.

use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use snafu::ResultExt;
use snafu::Snafu;

use crate::constants::DEFAULT_AUTHORITIES_PREFIX;
use crate::constants::DEFAULT_DEACTIVATED_SEGMENT;
use crate::types::CertAuthType;
use crate::verified::EquivalenceConfig;

/// Settings for [`crate::DefaultTrustStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustStoreConfig {
    /// First key component of every CA record.
    #[serde(default = "default_authorities_prefix")]
    pub authorities_prefix: String,

    /// Component nesting the inactive slot under the prefix.
    #[serde(default = "default_deactivated_segment")]
    pub deactivated_segment: String,

    /// Cap on items returned by a listing. `None` reads the whole type range.
    #[serde(default)]
    pub range_limit: Option<u32>,

    #[serde(default)]
    pub equivalence: EquivalenceConfig,
}

impl Default for TrustStoreConfig {
    fn default() -> Self {
        Self {
            authorities_prefix: default_authorities_prefix(),
            deactivated_segment: default_deactivated_segment(),
            range_limit: None,
            equivalence: EquivalenceConfig::default(),
        }
    }
}

impl TrustStoreConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).context(ReadFileSnafu { path })?;
        toml::from_str(&content).context(ParseTomlSnafu { path })
    }

    /// Load configuration from environment variables on top of the defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// Replace fields whose environment variable is set and parses.
    pub fn apply_env_overrides(&mut self) {
        if let Some(prefix) = parse_env("WARDEN_AUTHORITIES_PREFIX") {
            self.authorities_prefix = prefix;
        }
        if let Some(segment) = parse_env("WARDEN_DEACTIVATED_SEGMENT") {
            self.deactivated_segment = segment;
        }
        if let Some(limit) = parse_env("WARDEN_RANGE_LIMIT") {
            self.range_limit = Some(limit);
        }
        if let Some(ignore) = parse_env("WARDEN_EQUIVALENCE_IGNORE_EXPIRES") {
            self.equivalence.ignore_expires = ignore;
        }
        if let Some(ignore) = parse_env("WARDEN_EQUIVALENCE_IGNORE_ROTATION") {
            self.equivalence.ignore_rotation = ignore;
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_segment("authorities_prefix", &self.authorities_prefix)?;
        check_segment("deactivated_segment", &self.deactivated_segment)?;

        if self.authorities_prefix == self.deactivated_segment {
            return Err(ConfigError::Validation {
                message: "authorities_prefix and deactivated_segment must differ".into(),
            });
        }

        // An inactive segment named like a type would sit inside that type's active range.
        if CertAuthType::all().iter().any(|t| t.as_str() == self.deactivated_segment) {
            return Err(ConfigError::Validation {
                message: format!(
                    "deactivated_segment {:?} collides with a cert authority type",
                    self.deactivated_segment
                ),
            });
        }

        if self.range_limit == Some(0) {
            return Err(ConfigError::Validation {
                message: "range_limit must be non-zero".into(),
            });
        }

        Ok(())
    }
}

fn check_segment(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation {
            message: format!("{field} must not be empty"),
        });
    }
    if value.contains('/') {
        return Err(ConfigError::Validation {
            message: format!("{field} must not contain '/'"),
        });
    }
    Ok(())
}

fn default_authorities_prefix() -> String {
    DEFAULT_AUTHORITIES_PREFIX.into()
}

fn default_deactivated_segment() -> String {
    DEFAULT_DEACTIVATED_SEGMENT.into()
}

// Helper for parsing environment variables
fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok()?.parse().ok()
}

#[derive(Debug, Snafu)]
pub enum ConfigError {
    #[snafu(display("failed to read config file {}: {source}", path.display()))]
    ReadFile { path: PathBuf, source: std::io::Error },

    #[snafu(display("failed to parse TOML config file {}: {source}", path.display()))]
    ParseToml { path: PathBuf, source: toml::de::Error },

    #[snafu(display("configuration validation failed: {message}"))]
    Validation { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TrustStoreConfig::default();
        assert_eq!(config.authorities_prefix, "authorities");
        assert_eq!(config.deactivated_segment, "deactivated");
        assert_eq!(config.range_limit, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: TrustStoreConfig = toml::from_str("range_limit = 500\n").unwrap();
        assert_eq!(config.range_limit, Some(500));
        assert_eq!(config.authorities_prefix, "authorities");
        assert!(!config.equivalence.ignore_expires);
    }

    #[test]
    fn test_nested_equivalence_table() {
        let config: TrustStoreConfig = toml::from_str("[equivalence]\nignore_rotation = true\n").unwrap();
        assert!(config.equivalence.ignore_rotation);
        assert!(!config.equivalence.ignore_expires);
    }

    #[test]
    fn test_validate_rejects_separator() {
        let config = TrustStoreConfig {
            authorities_prefix: "a/b".into(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_validate_rejects_equal_segments() {
        let config = TrustStoreConfig {
            authorities_prefix: "cas".into(),
            deactivated_segment: "cas".into(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_type_named_segment() {
        let config = TrustStoreConfig {
            deactivated_segment: "host".into(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_limit() {
        let config = TrustStoreConfig {
            range_limit: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = TrustStoreConfig::from_toml_file(std::path::Path::new("/nonexistent/warden.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }
}
