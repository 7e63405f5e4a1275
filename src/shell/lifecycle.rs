use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info};

use crate::bridge::{
    EventEmitter, HostEvent, HostHandler, MessageBoxKind, MessageBoxOptions, OpenDialogOptions,
};
use crate::types::ShellError;

const PICK_FOLDER_TITLE: &str = "Select a folder to watch";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    Visible,
    Hidden,
    Terminated,
}

impl fmt::Display for WindowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WindowState::Visible => "visible",
            WindowState::Hidden => "hidden",
            WindowState::Terminated => "terminated",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    MacOs,
    Windows,
    Linux,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Platform::MacOs
        } else if cfg!(target_os = "windows") {
            Platform::Windows
        } else {
            Platform::Linux
        }
    }

    /// Whether the process should exit once its last window has closed.
    pub fn exits_on_last_window_close(self) -> bool {
        self != Platform::MacOs
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayAction {
    ShowWindow,
    Reindex,
    Quit,
    DoubleClick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseDecision {
    /// The close was intercepted and the window hidden.
    Hide,
    /// Let the window close.
    Close,
}

/// Native window operations the controller drives.
pub trait WindowHost: Send + Sync {
    fn show(&self);
    fn hide(&self);
    fn focus(&self);
    fn restore(&self);
    fn is_minimized(&self) -> bool;
    /// Exit the host process.
    fn exit(&self);
}

/// Privileged-side window and tray state machine.
///
/// `visible <-> hidden` on minimize, close and tray actions; `terminated`
/// only after [`quit`](Self::quit) or when the platform exits on last window
/// close. Closing without quit intent hides the window.
pub struct ShellController {
    window: Arc<dyn WindowHost>,
    host: Arc<dyn HostHandler>,
    events: EventEmitter,
    platform: Platform,
    minimize_to_tray: bool,
    quit_intent: AtomicBool,
    state: watch::Sender<WindowState>,
}

impl ShellController {
    pub fn new(
        window: Arc<dyn WindowHost>,
        host: Arc<dyn HostHandler>,
        events: EventEmitter,
        platform: Platform,
        minimize_to_tray: bool,
    ) -> Self {
        let (state, _) = watch::channel(WindowState::Hidden);
        Self {
            window,
            host,
            events,
            platform,
            minimize_to_tray,
            quit_intent: AtomicBool::new(false),
            state,
        }
    }

    pub fn state(&self) -> WindowState {
        *self.state.borrow()
    }

    pub fn watch(&self) -> watch::Receiver<WindowState> {
        self.state.subscribe()
    }

    pub fn is_quitting(&self) -> bool {
        self.quit_intent.load(Ordering::SeqCst)
    }

    /// The window finished loading.
    pub fn on_ready(&self) {
        self.show_and_focus();
    }

    /// Returns whether the minimize was turned into a hide.
    pub fn on_minimize(&self) -> bool {
        if !self.minimize_to_tray || self.is_terminated() {
            return false;
        }
        self.window.hide();
        self.set_state(WindowState::Hidden);
        true
    }

    pub fn on_close_requested(&self) -> CloseDecision {
        if self.is_quitting() {
            return CloseDecision::Close;
        }
        self.window.hide();
        self.set_state(WindowState::Hidden);
        CloseDecision::Hide
    }

    /// Returns whether the process is terminating.
    pub fn on_all_windows_closed(&self) -> bool {
        if self.is_quitting() || self.platform.exits_on_last_window_close() {
            self.terminate();
            return true;
        }
        debug!(platform = ?self.platform, "Last window closed; staying resident");
        false
    }

    pub async fn tray(&self, action: TrayAction) -> Result<(), ShellError> {
        debug!(?action, "Tray action");
        match action {
            TrayAction::ShowWindow | TrayAction::DoubleClick => self.show_and_focus(),
            TrayAction::Reindex => self.events.emit(HostEvent::ReindexFiles).await?,
            TrayAction::Quit => self.quit(),
        }
        Ok(())
    }

    /// Another launch was attempted; bring this instance forward instead.
    pub fn on_second_instance(&self) {
        if self.is_terminated() {
            return;
        }
        if self.window.is_minimized() {
            self.window.restore();
        }
        info!("Second instance launched; focusing existing window");
        self.show_and_focus();
    }

    /// Dock/app activation while resident without a visible window.
    pub fn on_activate(&self) {
        if self.state() == WindowState::Hidden {
            self.show_and_focus();
        }
    }

    /// Set quit intent and terminate. The only writer of the flag.
    pub fn quit(&self) {
        self.quit_intent.store(true, Ordering::SeqCst);
        info!("Quit requested");
        if self.on_close_requested() == CloseDecision::Close {
            self.on_all_windows_closed();
        }
    }

    /// Ask for a directory and forward it to the UI as `add-folder`.
    pub async fn pick_folder(&self) -> Result<Option<String>, ShellError> {
        let result = self
            .host
            .show_open_dialog(OpenDialogOptions::directory(PICK_FOLDER_TITLE))
            .await?;
        let Some(path) = result.first_path().map(str::to_string) else {
            debug!("Folder selection cancelled");
            return Ok(None);
        };
        self.events.emit(HostEvent::AddFolder(path.clone())).await?;
        info!(path = %path, "Folder selected for watching");
        Ok(Some(path))
    }

    pub async fn show_about(&self) -> Result<(), ShellError> {
        let version = self.host.app_version().await?;
        self.host
            .show_message_box(MessageBoxOptions {
                kind: MessageBoxKind::Info,
                title: "About File Assistant".to_string(),
                message: format!("File Assistant v{version}"),
                detail: Some("Desktop shell for the file search backend".to_string()),
                buttons: Vec::new(),
            })
            .await?;
        Ok(())
    }

    pub async fn wait_terminated(&self) {
        let mut rx = self.state.subscribe();
        let _ = rx.wait_for(|state| *state == WindowState::Terminated).await;
    }

    fn show_and_focus(&self) {
        if self.is_terminated() {
            return;
        }
        self.window.show();
        self.window.focus();
        self.set_state(WindowState::Visible);
    }

    fn terminate(&self) {
        if self.is_terminated() {
            return;
        }
        self.set_state(WindowState::Terminated);
        info!("Shell terminating");
        self.window.exit();
    }

    fn is_terminated(&self) -> bool {
        self.state() == WindowState::Terminated
    }

    fn set_state(&self, next: WindowState) {
        let changed = self.state.send_if_modified(|state| {
            if *state == next {
                return false;
            }
            *state = next;
            true
        });
        if changed {
            debug!(state = %next, "Window state changed");
        }
    }
}
