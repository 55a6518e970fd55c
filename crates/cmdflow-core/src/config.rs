//! Engine configuration loaded from TOML
//!
//! Every section is optional; a missing key takes its default.
//!
//! ```toml
//! [logging]
//! profile = "production"
//!
//! [runner]
//! forward_to_host_log = true
//! host_log_prefix = false
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::errors::{CmdFlowError, Result};
use crate::logging_facility::Profile;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub logging: LoggingConfig,
    pub runner: RunnerConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub profile: Profile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunnerConfig {
    /// Mirror every run log line into `WorkspaceOps::add_log`
    pub forward_to_host_log: bool,
    /// Prefix forwarded lines with `[Auto:<automation id>] `
    pub host_log_prefix: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            forward_to_host_log: true,
            host_log_prefix: true,
        }
    }
}

impl EngineConfig {
    /// # Errors
    ///
    /// `Config` if the text is not valid TOML or has unknown keys.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// # Errors
    ///
    /// `Config` if the file cannot be read or fails to parse.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| CmdFlowError::Config {
            message: format!("cannot read {}: {e}", path.display()),
        })?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert!(config.runner.forward_to_host_log);
        assert!(config.runner.host_log_prefix);
        assert_eq!(config.logging.profile, Profile::Development);
    }

    #[test]
    fn test_partial_sections() {
        let config = EngineConfig::from_toml_str(
            "[logging]\nprofile = \"test\"\n[runner]\nhost_log_prefix = false\n",
        )
        .unwrap();
        assert_eq!(config.logging.profile, Profile::Test);
        assert!(config.runner.forward_to_host_log);
        assert!(!config.runner.host_log_prefix);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = EngineConfig::from_toml_str("[runner\n").unwrap_err();
        assert!(matches!(err, CmdFlowError::Config { .. }));
        let err = EngineConfig::from_toml_str("[runner]\nbogus = 1\n").unwrap_err();
        assert!(matches!(err, CmdFlowError::Config { .. }));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = EngineConfig::from_file("/definitely/not/here.toml").unwrap_err();
        match err {
            CmdFlowError::Config { message } => assert!(message.contains("cannot read")),
            other => panic!("Expected Config, got: {other:?}"),
        }
    }
}
