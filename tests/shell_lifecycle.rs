use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use fileassist_shell::bridge::{
    self, BridgeError, EventChannel, HostEvent, HostHandler, MessageBoxOptions, MessageBoxResult,
    OpenDialogOptions, OpenDialogResult,
};
use fileassist_shell::shell::{
    CloseDecision, Platform, ShellController, TrayAction, WindowHost, WindowState,
};

#[derive(Default)]
struct RecordingWindow {
    calls: Mutex<Vec<&'static str>>,
    minimized: bool,
}

impl RecordingWindow {
    fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }
}

impl WindowHost for RecordingWindow {
    fn show(&self) {
        self.record("show");
    }
    fn hide(&self) {
        self.record("hide");
    }
    fn focus(&self) {
        self.record("focus");
    }
    fn restore(&self) {
        self.record("restore");
    }
    fn is_minimized(&self) -> bool {
        self.minimized
    }
    fn exit(&self) {
        self.record("exit");
    }
}

struct DialogHost {
    answer: Option<&'static str>,
    about: Mutex<Option<MessageBoxOptions>>,
}

#[async_trait]
impl HostHandler for DialogHost {
    async fn app_version(&self) -> Result<String, BridgeError> {
        Ok("2.0.1".to_string())
    }

    async fn show_message_box(
        &self,
        options: MessageBoxOptions,
    ) -> Result<MessageBoxResult, BridgeError> {
        *self.about.lock().unwrap() = Some(options);
        Ok(MessageBoxResult::default())
    }

    async fn show_open_dialog(
        &self,
        options: OpenDialogOptions,
    ) -> Result<OpenDialogResult, BridgeError> {
        assert!(options.wants_directory());
        Ok(match self.answer {
            Some(path) => OpenDialogResult::selected(path),
            None => OpenDialogResult::canceled(),
        })
    }
}

struct Fixture {
    window: Arc<RecordingWindow>,
    host: Arc<DialogHost>,
    controller: ShellController,
    ui: bridge::UiBridge,
}

fn fixture(platform: Platform, window: RecordingWindow, answer: Option<&'static str>) -> Fixture {
    let (ui, host_bridge) = bridge::pair(Duration::from_secs(5));
    let window = Arc::new(window);
    let host = Arc::new(DialogHost {
        answer,
        about: Mutex::new(None),
    });
    let controller = ShellController::new(
        window.clone(),
        host.clone(),
        host_bridge.emitter(),
        platform,
        true,
    );
    tokio::spawn(host_bridge.serve(host.clone()));
    Fixture {
        window,
        host,
        controller,
        ui,
    }
}

#[tokio::test]
async fn close_hides_until_quit_is_requested() {
    let f = fixture(Platform::Windows, RecordingWindow::default(), None);
    f.controller.on_ready();
    assert_eq!(f.controller.state(), WindowState::Visible);

    assert_eq!(f.controller.on_close_requested(), CloseDecision::Hide);
    assert_eq!(f.controller.state(), WindowState::Hidden);
    assert!(!f.controller.is_quitting());

    f.controller.tray(TrayAction::DoubleClick).await.unwrap();
    assert_eq!(f.controller.state(), WindowState::Visible);

    assert!(f.controller.on_minimize());
    assert_eq!(f.controller.state(), WindowState::Hidden);

    f.controller.tray(TrayAction::Quit).await.unwrap();
    assert!(f.controller.is_quitting());
    assert_eq!(f.controller.state(), WindowState::Terminated);
    assert_eq!(f.controller.on_close_requested(), CloseDecision::Close);
    assert_eq!(f.window.calls().last(), Some(&"exit"));

    f.controller.on_second_instance();
    assert_eq!(f.controller.state(), WindowState::Terminated);
}

#[tokio::test]
async fn last_window_close_follows_platform_convention() {
    let mac = fixture(Platform::MacOs, RecordingWindow::default(), None);
    assert!(!mac.controller.on_all_windows_closed());
    assert_ne!(mac.controller.state(), WindowState::Terminated);
    mac.controller.on_activate();
    assert_eq!(mac.controller.state(), WindowState::Visible);

    let linux = fixture(Platform::Linux, RecordingWindow::default(), None);
    assert!(linux.controller.on_all_windows_closed());
    assert_eq!(linux.controller.state(), WindowState::Terminated);

    tokio::time::timeout(Duration::from_secs(1), linux.controller.wait_terminated())
        .await
        .unwrap();
}

#[tokio::test]
async fn second_instance_restores_and_focuses() {
    let window = RecordingWindow {
        minimized: true,
        ..RecordingWindow::default()
    };
    let f = fixture(Platform::Windows, window, None);

    f.controller.on_second_instance();

    assert_eq!(f.window.calls(), vec!["restore", "show", "focus"]);
    assert_eq!(f.controller.state(), WindowState::Visible);
}

#[tokio::test]
async fn tray_reindex_pushes_event_to_the_ui() {
    let f = fixture(Platform::Linux, RecordingWindow::default(), None);
    let mut reindex = f.ui.subscribe(EventChannel::ReindexFiles);

    f.controller.tray(TrayAction::Reindex).await.unwrap();

    assert_eq!(reindex.recv().await, Some(HostEvent::ReindexFiles));
}

#[tokio::test]
async fn picked_folder_is_forwarded_as_add_folder() {
    let f = fixture(Platform::Linux, RecordingWindow::default(), Some("/home/docs"));
    let mut added = f.ui.subscribe(EventChannel::AddFolder);

    let picked = f.controller.pick_folder().await.unwrap();

    assert_eq!(picked.as_deref(), Some("/home/docs"));
    assert_eq!(
        added.recv().await,
        Some(HostEvent::AddFolder("/home/docs".to_string()))
    );
}

#[tokio::test]
async fn cancelled_pick_sends_nothing() {
    let f = fixture(Platform::Linux, RecordingWindow::default(), None);
    let _added = f.ui.subscribe(EventChannel::AddFolder);

    assert_eq!(f.controller.pick_folder().await.unwrap(), None);
}

#[tokio::test]
async fn about_dialog_reports_host_version() {
    let f = fixture(Platform::Linux, RecordingWindow::default(), None);

    f.controller.show_about().await.unwrap();

    let shown = f.host.about.lock().unwrap().clone().unwrap();
    assert!(shown.message.contains("2.0.1"));
}
