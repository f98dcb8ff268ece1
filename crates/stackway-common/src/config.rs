//! ---
//! sw_section: "01-core-primitives"
//! sw_subsection: "module"
//! sw_type: "source"
//! sw_scope: "code"
//! sw_description: "Configuration loading for deployment tooling."
//! sw_version: "v0.1.0"
//! sw_owner: "tbd"
//! ---
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::logging::LogFormat;

/// Top-level configuration for Stackway tooling.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Logging behaviour.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Deployment defaults.
    #[serde(default)]
    pub deploy: DeployDefaults,
}

/// Logging configuration shared by every Stackway entrypoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Directory receiving rolling log files.
    #[serde(default = "LoggingConfig::default_directory")]
    pub directory: PathBuf,
    /// Optional log file prefix, defaulting to the service name.
    #[serde(default)]
    pub file_prefix: Option<String>,
    /// Stdout log format.
    #[serde(default)]
    pub format: LogFormat,
}

impl LoggingConfig {
    fn default_directory() -> PathBuf {
        PathBuf::from("logs")
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: Self::default_directory(),
            file_prefix: None,
            format: LogFormat::default(),
        }
    }
}

/// Deployment defaults applied when a caller does not override them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeployDefaults {
    /// Resource name of the artifact bucket receiving uploaded templates.
    #[serde(default)]
    pub artifact_bucket: Option<String>,
    /// Execution role assumed by the remote backend, if any.
    #[serde(default)]
    pub execution_role: Option<String>,
}

impl AppConfig {
    /// Environment variable overriding the configuration path.
    pub const ENV_CONFIG_PATH: &'static str = "STACKWAY_CONFIG";

    /// Load configuration from disk, respecting the `STACKWAY_CONFIG`
    /// override before falling back to the supplied candidate paths. The
    /// first existing candidate wins; when none exist the defaults apply.
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<Self> {
        if let Ok(env_path) = std::env::var(Self::ENV_CONFIG_PATH) {
            if !env_path.trim().is_empty() {
                return Self::from_path(PathBuf::from(env_path));
            }
        }
        for candidate in candidates {
            let path = candidate.as_ref();
            if path.exists() {
                return Self::from_path(path.to_path_buf());
            }
        }
        Ok(Self::default())
    }

    fn from_path(path: PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("unable to read configuration at {}", path.display()))?;
        content.parse()
    }
}

impl std::str::FromStr for AppConfig {
    type Err = anyhow::Error;

    fn from_str(content: &str) -> std::result::Result<Self, Self::Err> {
        let config: AppConfig =
            toml::from_str(content).with_context(|| "failed to parse configuration")?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_document() {
        let config: AppConfig = r#"
            [logging]
            directory = "/var/log/stackway"
            format = "pretty"

            [deploy]
            artifact_bucket = "arn:aws:s3:::stackway-artifacts"
        "#
        .parse()
        .expect("parse config");
        assert_eq!(config.logging.directory, PathBuf::from("/var/log/stackway"));
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(
            config.deploy.artifact_bucket.as_deref(),
            Some("arn:aws:s3:::stackway-artifacts")
        );
        assert!(config.deploy.execution_role.is_none());
    }

    #[test]
    fn empty_document_yields_defaults() {
        let config: AppConfig = "".parse().expect("parse empty config");
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn missing_candidates_fall_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config =
            AppConfig::load(&[dir.path().join("stackway.toml")]).expect("load with no file");
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn first_existing_candidate_wins() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("stackway.toml");
        std::fs::write(&path, "[deploy]\nexecution_role = \"arn:aws:iam::1:role/x\"\n")
            .expect("write config");
        let config = AppConfig::load(&[dir.path().join("missing.toml"), path]).expect("load");
        assert_eq!(
            config.deploy.execution_role.as_deref(),
            Some("arn:aws:iam::1:role/x")
        );
    }
}
