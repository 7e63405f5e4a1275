mod endpoint;
mod loader;
mod paths;
mod types;

pub use endpoint::{join_url, BackendEndpoint};
pub use loader::BACKEND_URL_ENV;
pub use types::Config;
