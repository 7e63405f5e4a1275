use serde::Serialize;

/// Body of `POST /api/folders`.
#[derive(Debug, Serialize)]
pub struct AddFolderRequest<'a> {
    pub path: &'a str,
    pub recursive: bool,
}

/// Body of `POST /api/search`.
#[derive(Debug, Serialize)]
pub struct SearchRequest<'a> {
    pub query: &'a str,
    pub semantic: bool,
}
