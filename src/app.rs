use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::bridge::{EventChannel, HostEvent, UiBridge};
use crate::config::{BackendEndpoint, Config};
use crate::connection::{ConnectionMonitor, ConnectionState};
use crate::folders::FolderRegistry;
use crate::gateway::{Backend, DashboardAggregator, DashboardOverview, Gateway};
use crate::monitoring::MonitoringPoller;
use crate::search::SearchSession;
use crate::settings::Settings;
use crate::types::ShellError;

/// UI-side composition root. Owns every state container and hands out
/// references; nothing here is global.
pub struct App {
    backend: Arc<dyn Backend>,
    connection: Arc<ConnectionMonitor>,
    folders: FolderRegistry,
    search: SearchSession,
    monitoring: MonitoringPoller,
    settings: Settings,
    bridge: UiBridge,
    app_version: Mutex<Option<String>>,
}

impl App {
    /// Wire every component against the HTTP gateway.
    pub fn new(
        config: Config,
        config_path: Option<PathBuf>,
        bridge: UiBridge,
    ) -> Result<Self, ShellError> {
        let endpoint = BackendEndpoint::new(config.backend_url.clone());
        let gateway = Gateway::new(endpoint, config.request_timeout())?;
        let backend: Arc<dyn Backend> = Arc::new(gateway.clone());
        Ok(Self::assemble(config, config_path, gateway, backend, bridge))
    }

    /// Wire components against an arbitrary backend. Settings still probe
    /// candidate URLs over HTTP.
    pub fn with_backend(
        config: Config,
        backend: Arc<dyn Backend>,
        bridge: UiBridge,
    ) -> Result<Self, ShellError> {
        let endpoint = BackendEndpoint::new(config.backend_url.clone());
        let gateway = Gateway::new(endpoint, config.request_timeout())?;
        Ok(Self::assemble(config, None, gateway, backend, bridge))
    }

    fn assemble(
        config: Config,
        config_path: Option<PathBuf>,
        gateway: Gateway,
        backend: Arc<dyn Backend>,
        bridge: UiBridge,
    ) -> Self {
        let connection = Arc::new(ConnectionMonitor::new(Arc::clone(&backend)));
        let monitoring = MonitoringPoller::new(Arc::clone(&backend), config.poll_interval());
        let settings = Settings::new(config, config_path, gateway, Arc::clone(&connection));

        Self {
            folders: FolderRegistry::new(Arc::clone(&backend)),
            search: SearchSession::new(Arc::clone(&backend)),
            backend,
            connection,
            monitoring,
            settings,
            bridge,
            app_version: Mutex::new(None),
        }
    }

    pub fn connection(&self) -> &ConnectionMonitor {
        &self.connection
    }

    pub fn folders(&self) -> &FolderRegistry {
        &self.folders
    }

    pub fn search(&self) -> &SearchSession {
        &self.search
    }

    pub fn monitoring(&self) -> &MonitoringPoller {
        &self.monitoring
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn bridge(&self) -> &UiBridge {
        &self.bridge
    }

    pub fn app_version(&self) -> Option<String> {
        match self.app_version.lock() {
            Ok(version) => version.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Initial load: probe the backend, fetch folders and the host version,
    /// and start monitoring. Failures are logged and left to the UI state.
    pub async fn start(&self) -> ConnectionState {
        let (state, folders, version) = tokio::join!(
            self.connection.refresh(),
            self.folders.list(),
            self.load_app_version()
        );
        if let Err(err) = folders {
            debug!(error = %err, "Initial folder load failed");
        }
        self.monitoring.activate();
        info!(state = %state, version = ?version, "App started");
        state
    }

    pub async fn load_app_version(&self) -> Option<String> {
        match self.bridge.get_app_version().await {
            Ok(version) => {
                if let Ok(mut slot) = self.app_version.lock() {
                    *slot = Some(version.clone());
                }
                Some(version)
            }
            Err(err) => {
                warn!(error = %err, "Failed to read host app version");
                None
            }
        }
    }

    pub async fn handle_host_event(&self, event: HostEvent) -> Result<(), ShellError> {
        match event {
            HostEvent::AddFolder(path) => {
                info!(path = %path, "Host selected a folder to watch");
                self.folders.add(&path, true).await?;
            }
            HostEvent::ReindexFiles => {
                info!("Host requested a re-index");
                self.folders.reindex().await?;
            }
        }
        Ok(())
    }

    /// Handle host-pushed events until the bridge shuts down. The
    /// subscriptions are released when this returns or is cancelled.
    pub async fn run_event_loop(&self) {
        let mut reindex = self.bridge.subscribe(EventChannel::ReindexFiles);
        let mut add_folder = self.bridge.subscribe(EventChannel::AddFolder);

        loop {
            let event = tokio::select! {
                Some(event) = reindex.recv() => event,
                Some(event) = add_folder.recv() => event,
                else => break,
            };
            if let Err(err) = self.handle_host_event(event).await {
                warn!(error = %err, "Failed to handle host event");
            }
        }
        debug!("Host event loop finished");
    }

    pub async fn overview(&self) -> DashboardOverview {
        DashboardAggregator::new(self.backend.as_ref())
            .compose_overview()
            .await
    }

    /// Stop background work.
    pub fn shutdown(&self) {
        self.monitoring.deactivate();
    }
}
