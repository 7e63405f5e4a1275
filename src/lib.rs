pub mod app;
pub mod bridge;
pub mod config;
pub mod connection;
pub mod folders;
pub mod gateway;
pub mod logging;
pub mod monitoring;
pub mod search;
pub mod settings;
pub mod shell;
pub mod types;

pub use app::App;
pub use config::Config;
pub use types::ShellError;
