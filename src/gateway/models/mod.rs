mod folder;
mod monitoring;
mod search;
mod status;

use serde::{Deserialize, Deserializer};

pub use folder::{FolderList, WatchFolder};
pub use monitoring::{
    Alert, AlertLevel, AlertStats, DashboardPayload, MonitoringSnapshot, PerformanceStats,
    SystemMetrics,
};
pub use search::SearchHit;
pub use status::SystemStatus;

/// Reads an explicit `null` the same as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
