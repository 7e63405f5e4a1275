use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const HEAP_PRESSURE_PERCENT: f64 = 80.0;
const DISK_PRESSURE_PERCENT: f64 = 90.0;

/// Raw `data` member of `GET /api/monitoring/dashboard`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardPayload {
    #[serde(default)]
    pub system_metrics: Value,
    #[serde(default)]
    pub performance_stats: Value,
    #[serde(default)]
    pub active_alerts: Vec<Alert>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_stats: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertLevel {
    Info,
    Warning,
    Error,
    Critical,
}

impl AlertLevel {
    pub fn is_severe(self) -> bool {
        matches!(self, AlertLevel::Error | AlertLevel::Critical)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AlertLevel::Info => "INFO",
            AlertLevel::Warning => "WARNING",
            AlertLevel::Error => "ERROR",
            AlertLevel::Critical => "CRITICAL",
        }
    }
}

/// An alert raised by the backend. Never created or edited client-side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Alert {
    pub level: AlertLevel,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl Alert {
    pub fn raised_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct SystemMetrics {
    pub heap_used: Option<u64>,
    pub heap_max: Option<u64>,
    pub heap_usage_percent: Option<f64>,
    pub non_heap_used: Option<u64>,
    pub non_heap_max: Option<u64>,
    pub thread_count: Option<u64>,
    pub disk_usage_percent: Option<f64>,
    pub system_load_average: Option<f64>,
}

impl SystemMetrics {
    pub fn from_value(value: &Value) -> Self {
        let heap_used = uint(value, "heapUsed");
        let heap_max = uint(value, "heapMax");
        let heap_usage_percent =
            number(value, "heapUsagePercent").or_else(|| usage_percent(heap_used, heap_max));

        Self {
            heap_used,
            heap_max,
            heap_usage_percent,
            non_heap_used: uint(value, "nonHeapUsed"),
            non_heap_max: uint(value, "nonHeapMax"),
            thread_count: uint(value, "threadCount"),
            disk_usage_percent: number(value, "diskUsagePercent"),
            system_load_average: number(value, "systemLoadAverage"),
        }
    }

    pub fn heap_pressure(&self) -> bool {
        self.heap_usage_percent
            .map(|percent| percent > HEAP_PRESSURE_PERCENT)
            .unwrap_or(false)
    }

    pub fn disk_pressure(&self) -> bool {
        self.disk_usage_percent
            .map(|percent| percent > DISK_PRESSURE_PERCENT)
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct PerformanceStats {
    pub total_searches: Option<u64>,
    pub total_errors: Option<u64>,
    pub avg_search_time_ms: Option<f64>,
    pub avg_index_time_ms: Option<f64>,
}

impl PerformanceStats {
    pub fn from_value(value: &Value) -> Self {
        Self {
            total_searches: uint(value, "totalSearches"),
            total_errors: uint(value, "totalErrors"),
            avg_search_time_ms: number(value, "avgSearchTimeMs"),
            avg_index_time_ms: number(value, "avgIndexTimeMs"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct AlertStats {
    pub total: u64,
    pub warning: u64,
    pub error: u64,
    pub critical: u64,
}

impl AlertStats {
    pub fn from_alerts(alerts: &[Alert]) -> Self {
        let count = |level: AlertLevel| alerts.iter().filter(|a| a.level == level).count() as u64;
        Self {
            total: alerts.len() as u64,
            warning: count(AlertLevel::Warning),
            error: count(AlertLevel::Error),
            critical: count(AlertLevel::Critical),
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        Some(Self {
            total: uint(value, "totalAlerts")?,
            warning: uint(value, "warningAlerts").unwrap_or(0),
            error: uint(value, "errorAlerts").unwrap_or(0),
            critical: uint(value, "criticalAlerts").unwrap_or(0),
        })
    }
}

/// The monitoring data currently shown on the dashboard.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MonitoringSnapshot {
    pub system_metrics: SystemMetrics,
    pub performance_stats: PerformanceStats,
    pub active_alerts: Vec<Alert>,
    pub alert_stats: AlertStats,
    pub fetched_at: DateTime<Utc>,
}

impl MonitoringSnapshot {
    /// Normalise a dashboard payload. Alert order is kept as sent by the backend;
    /// alert stats are derived from the alerts when the backend omits them.
    pub fn from_payload(payload: &DashboardPayload, fetched_at: DateTime<Utc>) -> Self {
        let alert_stats = payload
            .alert_stats
            .as_ref()
            .and_then(AlertStats::from_value)
            .unwrap_or_else(|| AlertStats::from_alerts(&payload.active_alerts));

        Self {
            system_metrics: SystemMetrics::from_value(&payload.system_metrics),
            performance_stats: PerformanceStats::from_value(&payload.performance_stats),
            active_alerts: payload.active_alerts.clone(),
            alert_stats,
            fetched_at,
        }
    }

    pub fn severe_alerts(&self) -> impl Iterator<Item = &Alert> {
        self.active_alerts.iter().filter(|alert| alert.level.is_severe())
    }
}

/// Reads a number that may have been serialised as a string (`"12.50"`).
fn number(value: &Value, key: &str) -> Option<f64> {
    match value.get(key)? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn uint(value: &Value, key: &str) -> Option<u64> {
    match value.get(key)? {
        Value::Number(number) => number
            .as_u64()
            .or_else(|| number.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn usage_percent(used: Option<u64>, max: Option<u64>) -> Option<f64> {
    match (used, max) {
        (Some(used), Some(max)) if max > 0 => {
            let percent = (used as f64 / max as f64) * 100.0;
            Some((percent * 100.0).round() / 100.0)
        }
        _ => None,
    }
}
