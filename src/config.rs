//! Configuration types for corpno-dl
//!
//! The configuration file is YAML with one section per profile:
//!
//! ```yaml
//! default:
//!   api_url: https://api.houjin-bangou.nta.go.jp/4/
//!   api_key: your-application-id
//!   output_dir: ./output
//!   partition_delay: 5
//! ```
//!
//! API, output and pagination fields are flattened so a profile is a single
//! flat mapping.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Profile used when none is named
pub const DEFAULT_PROFILE: &str = "default";

/// Environment variable overriding the API base URL
pub const ENV_API_URL: &str = "CORPNO_API_URL";

/// Environment variable overriding the API key
pub const ENV_API_KEY: &str = "CORPNO_API_KEY";

/// Connection settings for the Web-API
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL, endpoints are resolved relative to it
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Application ID issued for the API (sent as `id`)
    #[serde(default)]
    pub api_key: String,

    /// Request timeout (default: 30 seconds)
    #[serde(default = "default_timeout", with = "duration_serde")]
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: String::new(),
            timeout: default_timeout(),
        }
    }
}

/// Where output files go
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output directory (default: "./output")
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

/// Paging behavior
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Pause between partition requests (default: 5 seconds)
    #[serde(default = "default_partition_delay", with = "duration_serde")]
    pub partition_delay: Duration,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            partition_delay: default_partition_delay(),
        }
    }
}

/// Main configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// API connection settings
    #[serde(flatten)]
    pub api: ApiConfig,

    /// Output settings
    #[serde(flatten)]
    pub output: OutputConfig,

    /// Paging settings
    #[serde(flatten)]
    pub pagination: PaginationConfig,
}

impl Config {
    /// Load a profile from a YAML configuration file
    pub fn from_yaml_file(path: &Path, profile: &str) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("cannot read {}: {}", path.display(), e),
            key: None,
        })?;
        Self::from_yaml_str(&text, profile).map_err(|e| match e {
            Error::ConfigParse { source, .. } => Error::ConfigParse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    /// Load a profile from YAML text
    pub fn from_yaml_str(text: &str, profile: &str) -> Result<Self> {
        let mut profiles: HashMap<String, Config> =
            serde_yaml::from_str(text).map_err(|source| Error::ConfigParse {
                path: PathBuf::new(),
                source,
            })?;
        profiles
            .remove(profile)
            .ok_or_else(|| Error::config(format!("profile {profile:?} not found"), profile))
    }

    /// Apply `CORPNO_API_URL` / `CORPNO_API_KEY` from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.is_empty()) {
            self.api.api_url = url;
        }
        if let Some(key) = lookup(ENV_API_KEY).filter(|v| !v.is_empty()) {
            self.api.api_key = key;
        }
    }

    /// Check that the configuration can be used to make requests
    pub fn validate(&self) -> Result<()> {
        if self.api.api_key.trim().is_empty() {
            return Err(Error::config("api key is empty", "api_key"));
        }
        Url::parse(&self.api.api_url).map_err(|e| {
            Error::config(
                format!("invalid api url {:?}: {}", self.api.api_url, e),
                "api_url",
            )
        })?;
        Ok(())
    }
}

fn default_api_url() -> String {
    "https://api.houjin-bangou.nta.go.jp/4/".to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./output")
}

fn default_partition_delay() -> Duration {
    Duration::from_secs(5)
}

// Duration serialization helper (seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
default:
  api_url: https://example.test/4/
  api_key: abc123
staging:
  api_url: https://staging.example.test/4/
  api_key: staging-key
  output_dir: /tmp/corpno
  partition_delay: 1
  timeout: 10
"#;

    #[test]
    fn loads_default_profile_with_defaults_filled_in() {
        let config = Config::from_yaml_str(SAMPLE, DEFAULT_PROFILE).unwrap();

        assert_eq!(config.api.api_url, "https://example.test/4/");
        assert_eq!(config.api.api_key, "abc123");
        assert_eq!(config.api.timeout, Duration::from_secs(30));
        assert_eq!(config.output.output_dir, PathBuf::from("./output"));
        assert_eq!(config.pagination.partition_delay, Duration::from_secs(5));
    }

    #[test]
    fn loads_named_profile() {
        let config = Config::from_yaml_str(SAMPLE, "staging").unwrap();

        assert_eq!(config.api.api_key, "staging-key");
        assert_eq!(config.output.output_dir, PathBuf::from("/tmp/corpno"));
        assert_eq!(config.pagination.partition_delay, Duration::from_secs(1));
        assert_eq!(config.api.timeout, Duration::from_secs(10));
    }

    #[test]
    fn missing_profile_is_a_config_error() {
        let err = Config::from_yaml_str(SAMPLE, "production").unwrap_err();
        assert!(matches!(err, Error::Config { .. }), "got {err:?}");
        assert!(err.is_validation());
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let err = Config::from_yaml_str("default: [unclosed", DEFAULT_PROFILE).unwrap_err();
        assert!(matches!(err, Error::ConfigParse { .. }), "got {err:?}");
    }

    #[test]
    fn file_loading_reports_the_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"default: [unclosed").unwrap();

        let err = Config::from_yaml_file(file.path(), DEFAULT_PROFILE).unwrap_err();
        match err {
            Error::ConfigParse { path, .. } => assert_eq!(path, file.path()),
            other => panic!("expected ConfigParse, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = Config::from_yaml_file(Path::new("/nonexistent/config.yml"), DEFAULT_PROFILE)
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn env_overrides_replace_url_and_key() {
        let mut config = Config::from_yaml_str(SAMPLE, DEFAULT_PROFILE).unwrap();
        config.apply_overrides_from(|key| match key {
            ENV_API_KEY => Some("from-env".to_string()),
            ENV_API_URL => Some(String::new()),
            _ => None,
        });

        assert_eq!(config.api.api_key, "from-env");
        // empty values are ignored
        assert_eq!(config.api.api_url, "https://example.test/4/");
    }

    #[test]
    fn validate_requires_key_and_parsable_url() {
        let mut config = Config::default();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::Config { key: Some(ref k), .. } if k == "api_key"));

        config.api.api_key = "abc".to_string();
        assert!(config.validate().is_ok());

        config.api.api_url = "not a url".to_string();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::Config { key: Some(ref k), .. } if k == "api_url"));
    }
}
