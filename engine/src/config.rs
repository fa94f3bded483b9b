//! Engine configuration with TOML file support.

use serde::{Deserialize, Serialize};
use sonic_types::VotingMethod;
use std::path::Path;
use std::time::Duration;

use crate::logging::LogFormat;
use crate::EngineError;

/// What to do when the vote receipt cannot be written to the content store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptPolicy {
    /// Commit the vote without a receipt reference and report the failure.
    #[default]
    BestEffort,
    /// Abort the submission; nothing reaches the ledger.
    Required,
}

/// Configuration for the voting engine.
///
/// Can be loaded from a TOML file via [`EngineConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Bound on each ledger call made while submitting a vote.
    #[serde(default = "default_ledger_timeout_ms")]
    pub ledger_timeout_ms: u64,

    /// Bound on each content store call.
    #[serde(default = "default_content_store_timeout_ms")]
    pub content_store_timeout_ms: u64,

    #[serde(default)]
    pub receipt_policy: ReceiptPolicy,

    /// Budget given to quadratic elections created without one.
    #[serde(default = "default_quadratic_credits")]
    pub default_quadratic_credits: u32,

    /// Budget given to cumulative elections created without one.
    #[serde(default = "default_cumulative_credits")]
    pub default_cumulative_credits: u32,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_ledger_timeout_ms() -> u64 {
    30_000
}

fn default_content_store_timeout_ms() -> u64 {
    15_000
}

fn default_quadratic_credits() -> u32 {
    100
}

fn default_cumulative_credits() -> u32 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, EngineError> {
        let config: Self = toml::from_str(s).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, EngineError> {
        toml::to_string_pretty(self).map_err(|e| EngineError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.ledger_timeout_ms == 0 || self.content_store_timeout_ms == 0 {
            return Err(EngineError::Config("timeouts must be positive".into()));
        }
        if self.default_quadratic_credits == 0 || self.default_cumulative_credits == 0 {
            return Err(EngineError::Config("default credit budgets must be positive".into()));
        }
        Ok(())
    }

    pub fn ledger_timeout(&self) -> Duration {
        Duration::from_millis(self.ledger_timeout_ms)
    }

    pub fn content_store_timeout(&self) -> Duration {
        Duration::from_millis(self.content_store_timeout_ms)
    }

    /// Budget applied to a new election of `method` that does not set one.
    pub fn default_credits(&self, method: VotingMethod) -> Option<u32> {
        match method {
            VotingMethod::Quadratic => Some(self.default_quadratic_credits),
            VotingMethod::Cumulative => Some(self.default_cumulative_credits),
            VotingMethod::SimpleMajority | VotingMethod::RankedChoice => None,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ledger_timeout_ms: default_ledger_timeout_ms(),
            content_store_timeout_ms: default_content_store_timeout_ms(),
            receipt_policy: ReceiptPolicy::default(),
            default_quadratic_credits: default_quadratic_credits(),
            default_cumulative_credits: default_cumulative_credits(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = EngineConfig::default();
        let toml_str = config.to_toml_string().unwrap();
        let parsed = EngineConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = EngineConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.ledger_timeout_ms, 30_000);
        assert_eq!(config.content_store_timeout_ms, 15_000);
        assert_eq!(config.receipt_policy, ReceiptPolicy::BestEffort);
        assert_eq!(config.log_format, LogFormat::Human);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            receipt_policy = "required"
            default_quadratic_credits = 49
            log_format = "json"
        "#;
        let config = EngineConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.receipt_policy, ReceiptPolicy::Required);
        assert_eq!(config.default_credits(VotingMethod::Quadratic), Some(49));
        assert_eq!(config.default_credits(VotingMethod::Cumulative), Some(10));
        assert_eq!(config.default_credits(VotingMethod::RankedChoice), None);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn zero_timeouts_are_rejected() {
        assert!(matches!(
            EngineConfig::from_toml_str("ledger_timeout_ms = 0"),
            Err(EngineError::Config(_))
        ));
    }

    #[test]
    fn unknown_policy_is_rejected() {
        assert!(EngineConfig::from_toml_str(r#"receipt_policy = "sometimes""#).is_err());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "content_store_timeout_ms = 2500").unwrap();
        let config = EngineConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.content_store_timeout(), Duration::from_millis(2500));
        assert_eq!(config.ledger_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            EngineConfig::from_toml_file(dir.path().join("absent.toml")),
            Err(EngineError::Io(_))
        ));
    }
}
