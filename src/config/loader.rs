use std::env;
use std::path::Path;

use tokio::fs;
use tracing::{info, warn};

use crate::types::ShellError;

use super::{paths, Config};

pub const BACKEND_URL_ENV: &str = "FILEASSIST_BACKEND_URL";

impl Config {
    /// Load configuration from config.json in the app directory
    /// Falls back to defaults if the file doesn't exist or can't be parsed
    pub async fn load() -> Self {
        let mut config = match paths::get_config_path() {
            Ok(path) => Self::load_from(&path).await,
            Err(err) => {
                warn!(error = ?err, "Failed to locate config.json, using defaults");
                Self::default()
            }
        };
        config.apply_env_overrides();
        info!(
            backend = %config.backend_url,
            poll_secs = config.poll_interval_secs,
            "Loaded configuration"
        );
        config
    }

    /// Load configuration from an explicit path, falling back to defaults.
    pub async fn load_from(path: &Path) -> Self {
        match Self::try_load_from(path).await {
            Ok(config) => config,
            Err(err) => {
                warn!(path = %path.display(), error = ?err, "Failed to load config.json, using defaults");
                Self::default()
            }
        }
    }

    async fn try_load_from(path: &Path) -> Result<Self, ShellError> {
        if !path.exists() {
            warn!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .await
            .map_err(|err| ShellError::Config(format!("Failed to read config file: {err}")))?;

        let config: Config = serde_json::from_str(&contents)
            .map_err(|err| ShellError::Config(format!("Failed to parse config.json: {err}")))?;

        if config.backend_url.trim().is_empty() {
            return Err(ShellError::Config("backend_url must not be empty".to_string()));
        }

        Ok(config)
    }

    /// Persist configuration to config.json in the app directory
    pub async fn save(&self) -> Result<(), ShellError> {
        let path = paths::get_config_path()?;
        self.save_to(&path).await
    }

    pub async fn save_to(&self, path: &Path) -> Result<(), ShellError> {
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents).await?;
        info!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(custom) = env::var(BACKEND_URL_ENV) {
            let trimmed = custom.trim();
            if !trimmed.is_empty() {
                self.backend_url = trimmed.to_string();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).await;
        assert_eq!(config, Config::default());
    }

    #[tokio::test]
    async fn partial_file_keeps_defaults_for_absent_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"backend_url":"http://10.0.0.2:9000"}"#).unwrap();

        let config = Config::load_from(&path).await;
        assert_eq!(config.backend_url, "http://10.0.0.2:9000");
        assert_eq!(config.poll_interval_secs, 30);
        assert!(config.minimize_to_tray);
    }

    #[tokio::test]
    async fn empty_backend_url_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"backend_url":"  "}"#).unwrap();

        let config = Config::load_from(&path).await;
        assert_eq!(config.backend_url, Config::default().backend_url);
    }

    #[tokio::test]
    async fn save_then_load_preserves_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = Config {
            backend_url: "http://example.test".to_string(),
            poll_interval_secs: 5,
            ..Config::default()
        };
        config.save_to(&path).await.unwrap();

        assert_eq!(Config::load_from(&path).await, config);
    }
}
