mod aggregator;

pub use aggregator::{DashboardAggregator, DashboardOverview};
