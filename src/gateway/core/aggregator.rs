use serde::Serialize;
use tracing::warn;

use super::super::backend::Backend;
use super::super::models::{SystemStatus, WatchFolder};

/// Overview shown on the dashboard landing page.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct DashboardOverview {
    pub status: Option<SystemStatus>,
    pub folders: Vec<WatchFolder>,
    pub error: Option<String>,
}

impl DashboardOverview {
    pub fn folder_count(&self) -> usize {
        self.folders.len()
    }

    pub fn indexed_files(&self) -> Option<u64> {
        self.status.as_ref().and_then(|status| status.files)
    }
}

/// Aggregates the status and folder endpoints into one dashboard payload.
pub struct DashboardAggregator<'a> {
    backend: &'a dyn Backend,
}

impl<'a> DashboardAggregator<'a> {
    pub fn new(backend: &'a dyn Backend) -> Self {
        Self { backend }
    }

    /// Fetches status and folders concurrently. A status failure becomes the
    /// overview error; a folder failure only logs and leaves the list empty.
    pub async fn compose_overview(&self) -> DashboardOverview {
        let (status, folders) =
            tokio::join!(self.backend.status(), self.backend.list_folders());

        let mut overview = DashboardOverview::default();

        if status.success {
            overview.status = status.data;
        } else {
            overview.error = Some(status.message_or("failed to load system status").to_string());
        }

        if folders.success {
            overview.folders = folders.data.map(|list| list.folders).unwrap_or_default();
        } else {
            warn!(message = ?folders.message, "Failed to load folders for overview");
        }

        overview
    }
}
