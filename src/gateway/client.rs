use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{join_url, BackendEndpoint};
use crate::types::ShellError;

use super::api::{
    folder_path, AddFolderRequest, Envelope, SearchRequest, DASHBOARD_PATH, FOLDERS_PATH,
    INVALID_RESPONSE, REINDEX_PATH, SEARCH_PATH, STATUS_PATH,
};
use super::backend::Backend;
use super::models::{DashboardPayload, FolderList, SearchHit, SystemStatus};

/// HTTP implementation of [`Backend`] against the configured endpoint.
#[derive(Clone)]
pub struct Gateway {
    http: Client,
    endpoint: BackendEndpoint,
}

impl Gateway {
    pub fn new(endpoint: BackendEndpoint, timeout: Duration) -> Result<Self, ShellError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ShellError::Http)?;

        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &BackendEndpoint {
        &self.endpoint
    }

    /// Probe `GET {base_url}/api/status` without touching the configured endpoint.
    pub async fn probe_status(&self, base_url: &str) -> Envelope<SystemStatus> {
        let url = join_url(base_url, STATUS_PATH);
        self.send(self.http.get(url), STATUS_PATH).await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, self.endpoint.join(path))
    }

    async fn send<T>(&self, request: RequestBuilder, path: &str) -> Envelope<T>
    where
        T: DeserializeOwned,
    {
        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(path, error = %err, "Backend request failed");
                return Envelope::network_failure();
            }
        };

        let status = response.status();
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(err) => {
                warn!(path, error = %err, "Failed to read backend response");
                return Envelope::network_failure();
            }
        };

        let envelope = decode_envelope(&body, status);
        if !envelope.success {
            debug!(path, %status, message = ?envelope.message, "Backend reported failure");
        }
        envelope
    }
}

/// Decode a response body into an envelope.
///
/// A well-formed envelope is returned as-is whatever the HTTP status; anything
/// else becomes a failure envelope.
pub(crate) fn decode_envelope<T>(body: &[u8], status: StatusCode) -> Envelope<T>
where
    T: DeserializeOwned,
{
    match serde_json::from_slice::<Envelope<Value>>(body) {
        Ok(raw) => raw.decode(),
        Err(_) if !status.is_success() => Envelope::failure(format!("backend returned {status}")),
        Err(_) => Envelope::failure(INVALID_RESPONSE),
    }
}

#[async_trait]
impl Backend for Gateway {
    async fn list_folders(&self) -> Envelope<FolderList> {
        self.send(self.request(Method::GET, FOLDERS_PATH), FOLDERS_PATH)
            .await
    }

    async fn add_folder(&self, path: &str, recursive: bool) -> Envelope<Value> {
        let body = AddFolderRequest { path, recursive };
        self.send(
            self.request(Method::POST, FOLDERS_PATH).json(&body),
            FOLDERS_PATH,
        )
        .await
    }

    async fn remove_folder(&self, id: i64) -> Envelope<Value> {
        let path = folder_path(id);
        self.send(self.request(Method::DELETE, &path), &path).await
    }

    async fn reindex(&self) -> Envelope<Value> {
        self.send(self.request(Method::POST, REINDEX_PATH), REINDEX_PATH)
            .await
    }

    async fn search(&self, query: &str, semantic: bool) -> Envelope<Vec<SearchHit>> {
        let body = SearchRequest { query, semantic };
        self.send(
            self.request(Method::POST, SEARCH_PATH).json(&body),
            SEARCH_PATH,
        )
        .await
    }

    async fn status(&self) -> Envelope<SystemStatus> {
        self.send(self.request(Method::GET, STATUS_PATH), STATUS_PATH)
            .await
    }

    async fn monitoring_dashboard(&self) -> Envelope<DashboardPayload> {
        self.send(self.request(Method::GET, DASHBOARD_PATH), DASHBOARD_PATH)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_json_error_status_reports_status() {
        let env: Envelope<Value> = decode_envelope(b"<html>502</html>", StatusCode::BAD_GATEWAY);
        assert!(!env.success);
        assert_eq!(env.message.as_deref(), Some("backend returned 502 Bad Gateway"));
    }

    #[test]
    fn non_json_ok_status_is_invalid_response() {
        let env: Envelope<Value> = decode_envelope(b"hello", StatusCode::OK);
        assert_eq!(env.message.as_deref(), Some(INVALID_RESPONSE));
    }

    #[test]
    fn error_status_with_envelope_is_returned_unchanged() {
        let body = br#"{"success":false,"message":"folder not found"}"#;
        let env: Envelope<Value> = decode_envelope(body, StatusCode::NOT_FOUND);
        assert!(!env.success);
        assert_eq!(env.message.as_deref(), Some("folder not found"));
    }
}
