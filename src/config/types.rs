use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the file assistant shell
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_bridge_timeout")]
    pub bridge_timeout_secs: u64,

    #[serde(default = "default_minimize_to_tray")]
    pub minimize_to_tray: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            request_timeout_secs: default_request_timeout(),
            poll_interval_secs: default_poll_interval(),
            bridge_timeout_secs: default_bridge_timeout(),
            minimize_to_tray: default_minimize_to_tray(),
        }
    }
}

impl Config {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn bridge_timeout(&self) -> Duration {
        Duration::from_secs(self.bridge_timeout_secs.max(1))
    }
}

fn default_backend_url() -> String {
    "http://localhost:8080/assistant".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

fn default_poll_interval() -> u64 {
    30
}

fn default_bridge_timeout() -> u64 {
    30
}

fn default_minimize_to_tray() -> bool {
    true
}
