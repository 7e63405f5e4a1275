use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::gateway::{Backend, WatchFolder};
use crate::types::ShellError;

/// Client-side mirror of the backend's watched folders.
///
/// The cache is only ever replaced wholesale by a successful `list()`.
/// `add` and `remove` never touch it directly; they re-list on success.
pub struct FolderRegistry {
    backend: Arc<dyn Backend>,
    cache: watch::Sender<Vec<WatchFolder>>,
}

impl FolderRegistry {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        let (cache, _) = watch::channel(Vec::new());
        Self { backend, cache }
    }

    pub fn folders(&self) -> Vec<WatchFolder> {
        self.cache.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<Vec<WatchFolder>> {
        self.cache.subscribe()
    }

    pub fn find_by_path(&self, path: &str) -> Option<WatchFolder> {
        self.cache
            .borrow()
            .iter()
            .find(|folder| folder.path == path)
            .cloned()
    }

    pub async fn list(&self) -> Result<Vec<WatchFolder>, ShellError> {
        let folders = self
            .backend
            .list_folders()
            .await
            .into_result()
            .inspect_err(|err| warn!(error = %err, "Failed to list watch folders"))?
            .map(|list| list.folders)
            .unwrap_or_default();

        self.cache.send_replace(folders.clone());
        Ok(folders)
    }

    pub async fn add(&self, path: &str, recursive: bool) -> Result<Vec<WatchFolder>, ShellError> {
        let path = path.trim();
        if path.is_empty() {
            return Err(ShellError::Validation("folder path is required".to_string()));
        }

        self.backend
            .add_folder(path, recursive)
            .await
            .into_result()
            .inspect_err(|err| warn!(path, error = %err, "Failed to add watch folder"))?;
        info!(path, recursive, "Added watch folder");

        self.list().await
    }

    pub async fn remove(&self, id: i64) -> Result<Vec<WatchFolder>, ShellError> {
        self.backend
            .remove_folder(id)
            .await
            .into_result()
            .inspect_err(|err| warn!(id, error = %err, "Failed to remove watch folder"))?;
        info!(id, "Removed watch folder");

        self.list().await
    }

    /// Ask the backend to re-index every folder, then refresh the mirror.
    pub async fn reindex(&self) -> Result<Vec<WatchFolder>, ShellError> {
        self.backend
            .reindex()
            .await
            .into_result()
            .inspect_err(|err| warn!(error = %err, "Failed to trigger re-index"))?;
        info!("Re-index requested");

        self.list().await
    }
}
