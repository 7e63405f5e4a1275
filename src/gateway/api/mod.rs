mod envelope;
mod requests;

pub use envelope::{Envelope, INVALID_RESPONSE, NETWORK_FAILURE};
pub use requests::{AddFolderRequest, SearchRequest};

pub const FOLDERS_PATH: &str = "/api/folders";
pub const REINDEX_PATH: &str = "/api/folders/reindex";
pub const SEARCH_PATH: &str = "/api/search";
pub const STATUS_PATH: &str = "/api/status";
pub const DASHBOARD_PATH: &str = "/api/monitoring/dashboard";

pub fn folder_path(id: i64) -> String {
    format!("{FOLDERS_PATH}/{id}")
}
