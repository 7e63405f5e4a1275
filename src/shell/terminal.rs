use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::oneshot;
use tracing::info;

use crate::bridge::{
    BridgeError, HostHandler, MessageBoxOptions, MessageBoxResult, OpenDialogOptions,
    OpenDialogResult,
};

use super::lifecycle::WindowHost;

/// Host for running the shell in a terminal: the "window" is the console,
/// and native dialogs become stdin prompts.
///
/// Stdin is read by a single command loop, which hands each line to
/// [`offer_line`](Self::offer_line) first so an open dialog gets its answer.
pub struct TerminalHost {
    version: String,
    prompt: Mutex<Option<oneshot::Sender<String>>>,
    visible: AtomicBool,
}

impl TerminalHost {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            prompt: Mutex::new(None),
            visible: AtomicBool::new(false),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }

    /// Returns the line back when no dialog is waiting for it.
    pub fn offer_line(&self, line: String) -> Option<String> {
        match lock(&self.prompt).take() {
            Some(waiting) => match waiting.send(line) {
                Ok(()) => None,
                Err(line) => Some(line),
            },
            None => Some(line),
        }
    }

    async fn ask(&self, question: &str) -> Result<String, BridgeError> {
        let (tx, rx) = oneshot::channel();
        {
            let mut slot = lock(&self.prompt);
            if slot.as_ref().is_some_and(|waiting| !waiting.is_closed()) {
                return Err(BridgeError::Rejected("another dialog is already open".to_string()));
            }
            *slot = Some(tx);
        }
        println!("{question}");
        rx.await
            .map(|answer| answer.trim().to_string())
            .map_err(|_| BridgeError::Transport("terminal input closed".to_string()))
    }
}

#[async_trait]
impl HostHandler for TerminalHost {
    async fn app_version(&self) -> Result<String, BridgeError> {
        Ok(self.version.clone())
    }

    async fn show_message_box(
        &self,
        options: MessageBoxOptions,
    ) -> Result<MessageBoxResult, BridgeError> {
        println!("[{:?}] {}", options.kind, options.title);
        println!("{}", options.message);
        if let Some(detail) = &options.detail {
            println!("{detail}");
        }
        if options.buttons.is_empty() {
            return Ok(MessageBoxResult::default());
        }

        let choices = options
            .buttons
            .iter()
            .enumerate()
            .map(|(index, label)| format!("{index}) {label}"))
            .collect::<Vec<_>>()
            .join("  ");
        let answer = self.ask(&format!("{choices}\nchoose a button:")).await?;
        let response = answer
            .parse::<usize>()
            .ok()
            .filter(|index| *index < options.buttons.len())
            .unwrap_or(0);
        Ok(MessageBoxResult {
            response,
            checkbox_checked: false,
        })
    }

    async fn show_open_dialog(
        &self,
        options: OpenDialogOptions,
    ) -> Result<OpenDialogResult, BridgeError> {
        let title = options.title.as_deref().unwrap_or("Open");
        let kind = if options.wants_directory() {
            "directory"
        } else {
            "file"
        };
        let answer = self
            .ask(&format!("{title}\nenter a {kind} path (empty to cancel):"))
            .await?;
        if answer.is_empty() {
            return Ok(OpenDialogResult::canceled());
        }
        Ok(OpenDialogResult::selected(answer))
    }
}

impl WindowHost for TerminalHost {
    fn show(&self) {
        if !self.visible.swap(true, Ordering::SeqCst) {
            info!("Window shown");
        }
    }

    fn hide(&self) {
        if self.visible.swap(false, Ordering::SeqCst) {
            info!("Window hidden to tray");
        }
    }

    fn focus(&self) {}

    fn restore(&self) {}

    fn is_minimized(&self) -> bool {
        false
    }

    fn exit(&self) {
        self.visible.store(false, Ordering::SeqCst);
        info!("Host exiting");
    }
}

/// A line typed at the terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Show,
    Hide,
    Close,
    Reindex,
    Add,
    About,
    Quit,
    Search { query: String, semantic: bool },
    Folders,
    Remove(i64),
    Refresh,
    Status,
    Monitor,
    SetUrl(String),
    TestUrl(String),
    Help,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word {
            "show" => Command::Show,
            "hide" | "minimize" => Command::Hide,
            "close" => Command::Close,
            "reindex" => Command::Reindex,
            "add" => Command::Add,
            "about" => Command::About,
            "quit" | "exit" => Command::Quit,
            "search" | "semantic" => Command::Search {
                query: rest.to_string(),
                semantic: word == "semantic",
            },
            "folders" => Command::Folders,
            "remove" => Command::Remove(
                rest.parse()
                    .map_err(|_| format!("remove expects a folder id, got {rest:?}"))?,
            ),
            "refresh" => Command::Refresh,
            "status" => Command::Status,
            "monitor" => Command::Monitor,
            "url" => Command::SetUrl(rest.to_string()),
            "test" => Command::TestUrl(rest.to_string()),
            "help" | "" => Command::Help,
            other => return Err(format!("unknown command: {other}")),
        };
        Ok(command)
    }
}

pub const HELP: &str = "\
commands:
  show | hide | close        window actions
  reindex | add | about      tray and menu actions
  quit                       exit the shell
  search <q> | semantic <q>  search indexed files
  folders | remove <id>      list or remove watch folders
  refresh | status           re-probe the backend, show overview
  monitor                    refresh and show monitoring data
  url <u> | test <u>         save or test the backend url";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn parses_commands() {
        assert_eq!("show".parse::<Command>().unwrap(), Command::Show);
        assert_eq!(
            "semantic  quarterly report ".parse::<Command>().unwrap(),
            Command::Search {
                query: "quarterly report".to_string(),
                semantic: true
            }
        );
        assert_eq!("remove 12".parse::<Command>().unwrap(), Command::Remove(12));
        assert!("remove twelve".parse::<Command>().is_err());
        assert!("launch".parse::<Command>().is_err());
    }

    #[test]
    fn lines_pass_through_without_a_dialog() {
        let host = TerminalHost::new("1.0.0");
        assert_eq!(host.offer_line("show".to_string()).as_deref(), Some("show"));
    }

    #[tokio::test]
    async fn open_dialog_takes_the_next_line() {
        let host = Arc::new(TerminalHost::new("1.0.0"));
        let dialog = tokio::spawn({
            let host = Arc::clone(&host);
            async move {
                host.show_open_dialog(OpenDialogOptions::directory("Pick"))
                    .await
            }
        });

        loop {
            tokio::task::yield_now().await;
            if host.offer_line(" /home/docs ".to_string()).is_none() {
                break;
            }
        }

        let result = dialog.await.unwrap().unwrap();
        assert_eq!(result.first_path(), Some("/home/docs"));
    }

    #[tokio::test]
    async fn empty_answer_cancels() {
        let host = Arc::new(TerminalHost::new("1.0.0"));
        let dialog = tokio::spawn({
            let host = Arc::clone(&host);
            async move { host.show_open_dialog(OpenDialogOptions::default()).await }
        });

        loop {
            tokio::task::yield_now().await;
            if host.offer_line(String::new()).is_none() {
                break;
            }
        }

        assert!(dialog.await.unwrap().unwrap().canceled);
    }
}
