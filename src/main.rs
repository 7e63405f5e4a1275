use std::sync::Arc;

use chrono::Utc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use fileassist_shell::bridge;
use fileassist_shell::gateway::{format_bytes, format_relative_time, MonitoringSnapshot, WatchFolder};
use fileassist_shell::search::{IssueOutcome, SearchView};
use fileassist_shell::shell::{
    CloseDecision, Command, InstanceGuard, InstanceRole, Platform, ShellController,
    TerminalHost, TrayAction, HELP,
};
use fileassist_shell::{logging, App, Config, ShellError};

#[tokio::main]
async fn main() -> Result<(), ShellError> {
    logging::init();
    let config = Config::load().await;

    let guard = match InstanceGuard::acquire(&Config::instance_lock_path()?).await? {
        InstanceRole::Primary(guard) => guard,
        InstanceRole::Secondary { notified } => {
            info!(notified, "Shell already running; exiting");
            return Ok(());
        }
    };

    let (ui, host_bridge) = bridge::pair(config.bridge_timeout());
    let host = Arc::new(TerminalHost::new(env!("CARGO_PKG_VERSION")));
    let controller = Arc::new(ShellController::new(
        host.clone(),
        host.clone(),
        host_bridge.emitter(),
        Platform::current(),
        config.minimize_to_tray,
    ));
    tokio::spawn(host_bridge.serve(host.clone()));

    if let Some(mut focus) = guard.focus_requests() {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move {
            while focus.recv().await.is_some() {
                controller.on_second_instance();
            }
        });
    }

    let app = Arc::new(App::new(config, Config::config_path().ok(), ui)?);
    let events = tokio::spawn({
        let app = Arc::clone(&app);
        async move { app.run_event_loop().await }
    });

    let poll_errors = tokio::spawn({
        let mut errors = app.monitoring().watch_errors();
        async move {
            while errors.changed().await.is_ok() {
                let error = errors.borrow_and_update().clone();
                if let Some(message) = error {
                    println!("monitoring: {message}");
                }
            }
        }
    });

    controller.on_ready();
    let state = app.start().await;
    println!("backend {state}; type `help` for commands");

    tokio::select! {
        _ = controller.wait_terminated() => {}
        _ = command_loop(&app, &controller, &host) => controller.quit(),
    }

    events.abort();
    poll_errors.abort();
    app.shutdown();
    drop(guard);
    Ok(())
}

/// Read stdin until it closes. Lines go to an open dialog first.
async fn command_loop(app: &Arc<App>, controller: &Arc<ShellController>, host: &TerminalHost) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                warn!(error = %err, "Failed to read terminal input");
                break;
            }
        };
        let Some(line) = host.offer_line(line) else {
            continue;
        };
        match line.parse::<Command>() {
            Ok(command) => run_command(app, controller, command).await,
            Err(err) => println!("{err}"),
        }
    }
}

async fn run_command(app: &Arc<App>, controller: &Arc<ShellController>, command: Command) {
    match command {
        Command::Show => report(controller.tray(TrayAction::ShowWindow).await),
        Command::Hide => {
            if !controller.on_minimize() {
                println!("window minimized");
            }
        }
        Command::Close => {
            if controller.on_close_requested() == CloseDecision::Close {
                controller.on_all_windows_closed();
            }
        }
        Command::Reindex => report(controller.tray(TrayAction::Reindex).await),
        Command::Quit => report(controller.tray(TrayAction::Quit).await),
        Command::Add => {
            // The dialog reads its answer from this loop, so it cannot be awaited here.
            let controller = Arc::clone(controller);
            tokio::spawn(async move { report(controller.pick_folder().await.map(|_| ())) });
        }
        Command::About => {
            let controller = Arc::clone(controller);
            tokio::spawn(async move { report(controller.show_about().await) });
        }
        Command::Search { query, semantic } => {
            let app = Arc::clone(app);
            tokio::spawn(async move {
                match app.search().issue(&query, semantic).await {
                    IssueOutcome::Applied(_) => print_search(&app.search().view()),
                    IssueOutcome::Superseded(token) => println!("search #{token} superseded"),
                    IssueOutcome::Ignored => println!("enter a search query"),
                }
            });
        }
        Command::Folders => match app.folders().list().await {
            Ok(folders) => print_folders(&folders),
            Err(err) => println!("failed: {}", err.user_message()),
        },
        Command::Remove(id) => match app.folders().remove(id).await {
            Ok(folders) => print_folders(&folders),
            Err(err) => println!("failed: {}", err.user_message()),
        },
        Command::Refresh => println!("backend {}", app.connection().refresh().await),
        Command::Status => {
            let overview = app.overview().await;
            println!(
                "backend {} | folders {} | files {}",
                app.connection().current(),
                overview.folder_count(),
                overview
                    .indexed_files()
                    .map_or_else(|| "-".to_string(), |files| files.to_string())
            );
            if let Some(error) = overview.error {
                println!("failed: {error}");
            }
        }
        Command::Monitor => {
            if let Err(err) = app.monitoring().refresh().await {
                println!("failed: {}", err.user_message());
            }
            match app.monitoring().snapshot() {
                Some(snapshot) => print_snapshot(&snapshot),
                None => println!("no monitoring data yet"),
            }
            if let Some(error) = app.monitoring().last_error() {
                println!("last refresh failed: {error}");
            }
        }
        Command::SetUrl(url) => match app.settings().save_endpoint(&url).await {
            Ok(state) => println!("saved; backend {state}"),
            Err(err) => println!("failed: {}", err.user_message()),
        },
        Command::TestUrl(url) => {
            let probe = app.settings().test_connection(&url).await;
            if probe.success {
                println!("connection ok");
            } else {
                println!("failed: {}", probe.message_or("connection failed"));
            }
        }
        Command::Help => println!("{HELP}"),
    }
}

fn report(result: Result<(), ShellError>) {
    if let Err(err) = result {
        println!("failed: {}", err.user_message());
    }
}

fn print_search(view: &SearchView) {
    if let Some(error) = view.error() {
        println!("search failed: {error}");
        return;
    }
    let mode = if view.semantic { "semantic" } else { "keyword" };
    println!("{} {mode} results for {:?}", view.results().len(), view.query);
    for hit in view.results() {
        println!(
            "  {} ({}, {}){}",
            hit.file_path,
            hit.file_type,
            format_bytes(hit.file_size),
            hit.relevance_label()
                .map(|label| format!(" {label}"))
                .unwrap_or_default()
        );
    }
}

fn print_folders(folders: &[WatchFolder]) {
    if folders.is_empty() {
        println!("no watch folders");
    }
    for folder in folders {
        println!(
            "  #{} {}{}{}",
            folder.id,
            folder.path,
            if folder.recursive { " (recursive)" } else { "" },
            if folder.enabled { "" } else { " [disabled]" }
        );
    }
}

fn print_snapshot(snapshot: &MonitoringSnapshot) {
    let now = Utc::now();
    let metrics = &snapshot.system_metrics;
    let bytes = |value: Option<u64>| value.map_or_else(|| "-".to_string(), format_bytes);
    let count = |value: Option<u64>| value.map_or_else(|| "-".to_string(), |n| n.to_string());

    println!(
        "fetched {} | heap {} / {} | threads {}{}{}",
        format_relative_time(snapshot.fetched_at, now),
        bytes(metrics.heap_used),
        bytes(metrics.heap_max),
        count(metrics.thread_count),
        if metrics.heap_pressure() { " | heap pressure" } else { "" },
        if metrics.disk_pressure() { " | disk pressure" } else { "" },
    );
    let stats = &snapshot.performance_stats;
    println!(
        "searches {} | errors {} | avg search {}",
        count(stats.total_searches),
        count(stats.total_errors),
        stats
            .avg_search_time_ms
            .map_or_else(|| "-".to_string(), |ms| format!("{ms:.0} ms"))
    );
    println!(
        "alerts {} ({} critical, {} error, {} warning)",
        snapshot.alert_stats.total,
        snapshot.alert_stats.critical,
        snapshot.alert_stats.error,
        snapshot.alert_stats.warning
    );
    for alert in &snapshot.active_alerts {
        let when = alert
            .raised_at()
            .map(|at| format_relative_time(at, now))
            .unwrap_or_default();
        println!("  [{}] {}: {} {when}", alert.level.as_str(), alert.title, alert.message);
    }
}
