//! TOML configuration for the `docsign` binary
//!
//! Every section and key is optional; a missing file section falls back to the
//! library defaults.

use anyhow::Context;
use docsign_core::ResolverOptions;
use pdfjoin_core::EngineOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Actor resolution settings
    #[serde(default)]
    pub resolver: ResolverOptions,
    /// Merge engine settings
    #[serde(default)]
    pub merge: EngineOptions,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the TOML is malformed
    ///
    /// # Example
    ///
    /// ```no_run
    /// use docsign_cli::config::Config;
    ///
    /// # fn example() -> anyhow::Result<()> {
    /// let config = Config::from_file("docsign.toml")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_str(s: &str) -> anyhow::Result<Self> {
        toml::from_str(s).context("Failed to parse TOML configuration")
    }
}

/// Log output settings; `RUST_LOG` overrides `filter` when set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directives (default: "info")
    #[serde(default = "default_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_filter() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdfjoin_core::BusyPolicy;
    use pretty_assertions::assert_eq;
    use shared_types::EmailPrecedence;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.merge.max_sources, 50);
        assert_eq!(config.merge.busy_policy, BusyPolicy::Reject);
        assert_eq!(config.resolver.b2c_precedence, EmailPrecedence::PrimaryFirst);
        assert_eq!(config.logging.filter, "info");
    }

    #[test]
    fn test_full_config() {
        let config = Config::from_str(
            r#"
            [resolver]
            b2c_precedence = "secondary-first"

            [merge]
            busy_policy = "queue"
            max_sources = 8

            [logging]
            filter = "docsign_core=debug,info"
            json = true
            "#,
        )
        .unwrap();

        assert_eq!(
            config.resolver.b2c_precedence,
            EmailPrecedence::SecondaryFirst
        );
        assert_eq!(config.merge.busy_policy, BusyPolicy::Queue);
        assert_eq!(config.merge.max_sources, 8);
        assert_eq!(config.logging.filter, "docsign_core=debug,info");
        assert!(config.logging.json);
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config = Config::from_str("[merge]\nbusy_policy = \"queue\"\n").unwrap();
        assert_eq!(config.merge.max_sources, 50);
        assert!(!config.logging.json);
    }

    #[test]
    fn test_unknown_policy_is_an_error() {
        let err = Config::from_str("[merge]\nbusy_policy = \"maybe\"\n").unwrap_err();
        assert!(err.to_string().contains("Failed to parse TOML configuration"));
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = Config::from_file("/nonexistent/docsign.toml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/docsign.toml"));
    }
}
