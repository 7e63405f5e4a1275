use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::gateway::{Backend, SearchHit};

const SEARCH_FAILED: &str = "search failed";

#[derive(Debug, Clone, Default, PartialEq)]
pub enum SearchOutcome {
    #[default]
    Idle,
    Results(Vec<SearchHit>),
    Failed(String),
}

/// What the search page currently shows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchView {
    /// Token of the applied response; 0 before any response.
    pub token: u64,
    pub query: String,
    pub semantic: bool,
    pub outcome: SearchOutcome,
    /// A query newer than `token` is still in flight.
    pub loading: bool,
}

impl SearchView {
    pub fn results(&self) -> &[SearchHit] {
        match &self.outcome {
            SearchOutcome::Results(hits) => hits,
            _ => &[],
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            SearchOutcome::Failed(message) => Some(message),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueOutcome {
    /// Blank query; nothing was sent and the view is unchanged.
    Ignored,
    Applied(u64),
    /// A newer query was issued before this one resolved.
    Superseded(u64),
}

/// One logical search at a time: only the latest query's response is shown.
pub struct SearchSession {
    backend: Arc<dyn Backend>,
    latest: AtomicU64,
    view: watch::Sender<SearchView>,
}

impl SearchSession {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        let (view, _) = watch::channel(SearchView::default());
        Self {
            backend,
            latest: AtomicU64::new(0),
            view,
        }
    }

    pub fn view(&self) -> SearchView {
        self.view.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<SearchView> {
        self.view.subscribe()
    }

    pub fn latest_token(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    pub async fn issue(&self, query: &str, semantic: bool) -> IssueOutcome {
        if query.trim().is_empty() {
            return IssueOutcome::Ignored;
        }

        let token = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        self.view.send_modify(|view| view.loading = true);
        debug!(token, query, semantic, "Issuing search");

        let envelope = self.backend.search(query, semantic).await;
        let outcome = if envelope.success {
            SearchOutcome::Results(envelope.data.unwrap_or_default())
        } else {
            let message = envelope.message_or(SEARCH_FAILED).to_string();
            warn!(token, query, message = %message, "Search failed");
            SearchOutcome::Failed(message)
        };

        let applied = self.view.send_if_modified(|view| {
            if token < self.latest.load(Ordering::SeqCst) || token <= view.token {
                return false;
            }
            view.token = token;
            view.query = query.to_string();
            view.semantic = semantic;
            view.outcome = outcome;
            view.loading = false;
            true
        });

        if applied {
            IssueOutcome::Applied(token)
        } else {
            debug!(token, "Discarding superseded search response");
            IssueOutcome::Superseded(token)
        }
    }
}
