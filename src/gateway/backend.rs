use async_trait::async_trait;
use serde_json::Value;

use super::api::Envelope;
use super::models::{DashboardPayload, FolderList, SearchHit, SystemStatus};

/// One operation per backend capability.
///
/// Implementations never fail across this boundary: transport and decoding
/// problems come back as `success: false` envelopes.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn list_folders(&self) -> Envelope<FolderList>;

    async fn add_folder(&self, path: &str, recursive: bool) -> Envelope<Value>;

    async fn remove_folder(&self, id: i64) -> Envelope<Value>;

    async fn reindex(&self) -> Envelope<Value>;

    async fn search(&self, query: &str, semantic: bool) -> Envelope<Vec<SearchHit>>;

    async fn status(&self) -> Envelope<SystemStatus>;

    async fn monitoring_dashboard(&self) -> Envelope<DashboardPayload>;
}
