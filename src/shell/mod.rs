//! Privileged-process side: window and tray lifecycle, the single-instance
//! guard, and a terminal host implementation.

mod instance;
mod lifecycle;
mod terminal;

pub use instance::{InstanceGuard, InstanceRole};
pub use lifecycle::{CloseDecision, Platform, ShellController, TrayAction, WindowHost, WindowState};
pub use terminal::{Command, TerminalHost, HELP};
