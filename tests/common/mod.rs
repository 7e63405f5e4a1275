//! Shared fixtures for integration tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::oneshot;

use fileassist_shell::gateway::{
    Backend, DashboardPayload, Envelope, FolderList, SearchHit, SystemStatus, WatchFolder,
};

type SearchReply = Envelope<Vec<SearchHit>>;
type DashboardReply = Envelope<DashboardPayload>;

/// In-memory backend with switchable failures and gated search responses.
#[derive(Default)]
pub struct FakeBackend {
    folders: Mutex<Vec<WatchFolder>>,
    next_id: AtomicI64,
    pub fail_mutations: AtomicBool,
    pub fail_list: AtomicBool,
    pub offline: AtomicBool,
    dashboard: Mutex<Option<Envelope<DashboardPayload>>>,
    pub dashboard_calls: AtomicUsize,
    pub reindex_calls: AtomicUsize,
    search_gates: Mutex<HashMap<String, oneshot::Receiver<SearchReply>>>,
    status_gate: Mutex<Option<oneshot::Receiver<()>>>,
    dashboard_gate: Mutex<Option<oneshot::Receiver<DashboardReply>>>,
}

#[allow(dead_code)]
impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_folder(self, path: &str) -> Self {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.folders.lock().unwrap().push(folder(id, path, false));
        self
    }

    /// Hold back the response to `query` until the returned sender fires.
    pub fn gate_search(&self, query: &str) -> oneshot::Sender<SearchReply> {
        let (tx, rx) = oneshot::channel();
        self.search_gates
            .lock()
            .unwrap()
            .insert(query.to_string(), rx);
        tx
    }

    /// Hold the next status probe until the returned sender fires.
    pub fn gate_status(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.status_gate.lock().unwrap() = Some(rx);
        tx
    }

    /// Whether a gated status probe has not started yet.
    pub fn status_gated(&self) -> bool {
        self.status_gate.lock().unwrap().is_some()
    }

    /// Hold the next dashboard fetch until the returned sender fires.
    pub fn gate_dashboard(&self) -> oneshot::Sender<DashboardReply> {
        let (tx, rx) = oneshot::channel();
        *self.dashboard_gate.lock().unwrap() = Some(rx);
        tx
    }

    pub fn set_dashboard(&self, envelope: DashboardReply) {
        *self.dashboard.lock().unwrap() = Some(envelope);
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn dashboard_calls(&self) -> usize {
        self.dashboard_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn list_folders(&self) -> Envelope<FolderList> {
        if self.offline.load(Ordering::SeqCst) || self.fail_list.load(Ordering::SeqCst) {
            return Envelope::network_failure();
        }
        Envelope::ok(FolderList {
            folders: self.folders.lock().unwrap().clone(),
        })
    }

    async fn add_folder(&self, path: &str, recursive: bool) -> Envelope<Value> {
        if self.offline.load(Ordering::SeqCst) {
            return Envelope::network_failure();
        }
        if self.fail_mutations.load(Ordering::SeqCst) {
            return Envelope::failure("folder already watched");
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let added = folder(id, path, recursive);
        self.folders.lock().unwrap().push(added.clone());
        Envelope::ok(serde_json::to_value(added).unwrap())
    }

    async fn remove_folder(&self, id: i64) -> Envelope<Value> {
        if self.offline.load(Ordering::SeqCst) {
            return Envelope::network_failure();
        }
        if self.fail_mutations.load(Ordering::SeqCst) {
            return Envelope::failure("folder is locked");
        }
        let mut folders = self.folders.lock().unwrap();
        let before = folders.len();
        folders.retain(|folder| folder.id != id);
        if folders.len() == before {
            return Envelope::failure("folder not found");
        }
        Envelope::ok(Value::Null)
    }

    async fn reindex(&self) -> Envelope<Value> {
        self.reindex_calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Envelope::network_failure();
        }
        Envelope::ok(json!({ "queued": true }))
    }

    async fn search(&self, query: &str, _semantic: bool) -> SearchReply {
        let gate = self.search_gates.lock().unwrap().remove(query);
        if let Some(gate) = gate {
            return gate
                .await
                .unwrap_or_else(|_| Envelope::failure("gate dropped"));
        }
        if self.offline.load(Ordering::SeqCst) {
            return Envelope::network_failure();
        }
        Envelope::ok(vec![hit(query)])
    }

    async fn status(&self) -> Envelope<SystemStatus> {
        let gate = self.status_gate.lock().unwrap().take();
        let online = !self.offline.load(Ordering::SeqCst);
        if let Some(gate) = gate {
            let _ = gate.await;
            if online {
                return Envelope::ok(SystemStatus::default());
            }
        }
        if self.offline.load(Ordering::SeqCst) {
            return Envelope::network_failure();
        }
        Envelope::ok(SystemStatus {
            folders: Some(self.folders.lock().unwrap().len() as u64),
            files: Some(42),
            ..SystemStatus::default()
        })
    }

    async fn monitoring_dashboard(&self) -> Envelope<DashboardPayload> {
        self.dashboard_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.dashboard_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            return gate
                .await
                .unwrap_or_else(|_| Envelope::failure("gate dropped"));
        }
        if self.offline.load(Ordering::SeqCst) {
            return Envelope::network_failure();
        }
        self.dashboard
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Envelope::ok(dashboard(1)))
    }
}

#[allow(dead_code)]
pub fn folder(id: i64, path: &str, recursive: bool) -> WatchFolder {
    WatchFolder {
        id,
        path: path.to_string(),
        recursive,
        enabled: true,
        created_time: Some("2024-03-01 10:00:00".to_string()),
        updated_time: None,
    }
}

/// A hit whose file name records the query it answers.
#[allow(dead_code)]
pub fn hit(query: &str) -> SearchHit {
    SearchHit {
        file_name: format!("{query}.txt"),
        file_path: format!("/docs/{query}.txt"),
        file_type: "txt".to_string(),
        file_size: 1024,
        last_modified: "2024-03-01 10:00:00".to_string(),
        relevance_score: Some(0.9),
        content: None,
    }
}

/// A dashboard whose thread count identifies it.
#[allow(dead_code)]
pub fn dashboard(threads: u64) -> DashboardPayload {
    serde_json::from_value(json!({
        "systemMetrics": {
            "heapUsed": 512 * 1024 * 1024_u64,
            "heapMax": 1024 * 1024 * 1024_u64,
            "threadCount": threads,
            "diskUsagePercent": 45.5
        },
        "performanceStats": { "totalSearches": "12", "avgSearchTimeMs": 8.5 },
        "activeAlerts": [
            { "level": "WARNING", "title": "Heap", "message": "heap above 50%", "timestamp": 1_709_287_200_000_i64 }
        ]
    }))
    .unwrap()
}
