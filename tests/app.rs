mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use common::FakeBackend;
use fileassist_shell::bridge::{
    self, BridgeError, EventChannel, HostEvent, HostHandler, MessageBoxOptions, MessageBoxResult,
    OpenDialogOptions, OpenDialogResult,
};
use fileassist_shell::connection::ConnectionState;
use fileassist_shell::{App, Config};

struct VersionHost;

#[async_trait]
impl HostHandler for VersionHost {
    async fn app_version(&self) -> Result<String, BridgeError> {
        Ok("0.9.0".to_string())
    }

    async fn show_message_box(
        &self,
        _options: MessageBoxOptions,
    ) -> Result<MessageBoxResult, BridgeError> {
        Ok(MessageBoxResult::default())
    }

    async fn show_open_dialog(
        &self,
        _options: OpenDialogOptions,
    ) -> Result<OpenDialogResult, BridgeError> {
        Ok(OpenDialogResult::canceled())
    }
}

async fn eventually(mut check: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[tokio::test]
async fn start_loads_everything_and_host_events_drive_the_registry() {
    let backend = Arc::new(FakeBackend::new().with_folder("/srv/a"));
    let (ui, host_bridge) = bridge::pair(Duration::from_secs(5));
    let events = host_bridge.emitter();
    tokio::spawn(host_bridge.serve(Arc::new(VersionHost)));

    let app = Arc::new(App::with_backend(Config::default(), backend.clone(), ui).unwrap());
    assert_eq!(app.start().await, ConnectionState::Connected);
    assert_eq!(app.app_version().as_deref(), Some("0.9.0"));
    assert_eq!(app.folders().folders().len(), 1);
    assert!(app.monitoring().is_active());

    let event_loop = tokio::spawn({
        let app = Arc::clone(&app);
        async move { app.run_event_loop().await }
    });
    eventually(|| app.bridge().subscriber_count(EventChannel::AddFolder) == 1).await;

    events
        .emit(HostEvent::AddFolder("/home/docs".to_string()))
        .await
        .unwrap();
    eventually(|| app.folders().find_by_path("/home/docs").is_some()).await;
    assert!(app.folders().find_by_path("/home/docs").unwrap().recursive);

    events.emit(HostEvent::ReindexFiles).await.unwrap();
    eventually(|| backend.reindex_calls.load(Ordering::SeqCst) == 1).await;

    event_loop.abort();
    let _ = event_loop.await;
    assert_eq!(app.bridge().subscriber_count(EventChannel::AddFolder), 0);
    assert_eq!(app.bridge().subscriber_count(EventChannel::ReindexFiles), 0);

    app.shutdown();
    assert!(!app.monitoring().is_active());
}

#[tokio::test]
async fn overview_combines_status_and_folders() {
    let backend = Arc::new(FakeBackend::new().with_folder("/srv/a").with_folder("/srv/b"));
    let (ui, _host_bridge) = bridge::pair(Duration::from_secs(5));
    let app = App::with_backend(Config::default(), backend.clone(), ui).unwrap();

    let overview = app.overview().await;
    assert_eq!(overview.folder_count(), 2);
    assert_eq!(overview.indexed_files(), Some(42));
    assert_eq!(overview.error, None);

    backend.set_offline(true);
    let overview = app.overview().await;
    assert_eq!(overview.folder_count(), 0);
    assert_eq!(overview.error.as_deref(), Some("network failure"));
}
