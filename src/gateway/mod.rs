mod api;
mod backend;
mod client;
mod core;
mod helpers;
mod models;

pub use api::{Envelope, INVALID_RESPONSE, NETWORK_FAILURE};
pub use backend::Backend;
pub use client::Gateway;
pub use self::core::{DashboardAggregator, DashboardOverview};
pub use helpers::{format_bytes, format_relative_time};
pub use models::{
    Alert, AlertLevel, AlertStats, DashboardPayload, FolderList, MonitoringSnapshot,
    PerformanceStats, SearchHit, SystemMetrics, SystemStatus, WatchFolder,
};
