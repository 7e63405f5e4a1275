use std::sync::{Arc, RwLock};

use crate::types::ShellError;

/// Base URL of the indexing backend, shared by every gateway call.
///
/// Clones share the same value. Only the settings-save action writes it.
#[derive(Debug, Clone)]
pub struct BackendEndpoint {
    inner: Arc<RwLock<String>>,
}

impl BackendEndpoint {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(url.into())),
        }
    }

    pub fn get(&self) -> String {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub(crate) fn set(&self, url: &str) -> Result<(), ShellError> {
        let trimmed = url.trim();
        if trimmed.is_empty() {
            return Err(ShellError::Config("backend url is required".to_string()));
        }
        let mut guard = match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = trimmed.to_string();
        Ok(())
    }

    /// Join the base URL with an API path.
    pub fn join(&self, path: &str) -> String {
        join_url(&self.get(), path)
    }
}

pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
