use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::{BackendEndpoint, Config};
use crate::connection::{ConnectionMonitor, ConnectionState};
use crate::gateway::{Envelope, Gateway, SystemStatus};
use crate::types::ShellError;

const URL_REQUIRED: &str = "backend url is required";

/// Settings page actions. The only writer of [`BackendEndpoint`].
pub struct Settings {
    config: Mutex<Config>,
    config_path: Option<PathBuf>,
    endpoint: BackendEndpoint,
    gateway: Gateway,
    connection: Arc<ConnectionMonitor>,
}

impl Settings {
    /// `config_path` of `None` keeps changes in memory only.
    pub fn new(
        config: Config,
        config_path: Option<PathBuf>,
        gateway: Gateway,
        connection: Arc<ConnectionMonitor>,
    ) -> Self {
        Self {
            config: Mutex::new(config),
            config_path,
            endpoint: gateway.endpoint().clone(),
            gateway,
            connection,
        }
    }

    pub async fn config(&self) -> Config {
        self.config.lock().await.clone()
    }

    /// Store a new backend URL, persist it and re-probe the connection.
    pub async fn save_endpoint(&self, url: &str) -> Result<ConnectionState, ShellError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(ShellError::Validation(URL_REQUIRED.to_string()));
        }

        {
            let mut config = self.config.lock().await;
            let previous = config.backend_url.clone();
            config.backend_url = url.to_string();
            if let Some(path) = &self.config_path {
                if let Err(err) = config.save_to(path).await {
                    warn!(path = %path.display(), error = %err, "Failed to persist settings");
                    config.backend_url = previous;
                    return Err(err);
                }
            }
            self.endpoint.set(url)?;
        }
        info!(backend = %url, "Backend endpoint updated");

        Ok(self.connection.refresh().await)
    }

    /// Probe a candidate URL without changing the configured endpoint.
    pub async fn test_connection(&self, url: &str) -> Envelope<SystemStatus> {
        let url = url.trim();
        if url.is_empty() {
            return Envelope::failure(URL_REQUIRED);
        }
        let envelope = self.gateway.probe_status(url).await;
        info!(backend = %url, success = envelope.success, "Tested backend connection");
        envelope
    }
}
