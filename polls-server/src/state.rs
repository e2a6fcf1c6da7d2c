//! Shared application state for the poll server.

use std::sync::Arc;
use std::time::Duration;

use polls::service::PollService;
use tokio::sync::broadcast;

use crate::error::ApiError;

/// Events broadcast to SSE clients after a mutation has been saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    PollCreated { poll_id: String },
    PollDeleted { poll_id: String },
    ResponsesCleared { poll_id: String },
    ResponseSubmitted { poll_id: String },
    PollsSeeded { poll_ids: Vec<String> },
}

impl ChangeEvent {
    /// True if results for `poll_id` may have changed.
    pub fn affects(&self, poll_id: &str) -> bool {
        match self {
            ChangeEvent::PollCreated { poll_id: id }
            | ChangeEvent::PollDeleted { poll_id: id }
            | ChangeEvent::ResponsesCleared { poll_id: id }
            | ChangeEvent::ResponseSubmitted { poll_id: id } => id == poll_id,
            ChangeEvent::PollsSeeded { poll_ids } => poll_ids.iter().any(|id| id == poll_id),
        }
    }
}

/// Shared state accessible from all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PollService>,
    /// Broadcast sender for change events.
    pub event_tx: Arc<broadcast::Sender<ChangeEvent>>,
    /// Base of share links.
    pub base_url: String,
    pub keep_alive: Duration,
}

impl AppState {
    pub fn new(service: PollService, base_url: String, keep_alive: Duration) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            service: Arc::new(service),
            event_tx: Arc::new(event_tx),
            base_url,
            keep_alive,
        }
    }

    /// Run a service operation on the blocking pool.
    ///
    /// Mutations write the snapshot file while holding the state lock, so
    /// they must stay off the async worker threads.
    pub async fn run<T, F>(&self, op: F) -> Result<T, ApiError>
    where
        F: FnOnce(&PollService) -> polls::error::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let service = Arc::clone(&self.service);
        let value = tokio::task::spawn_blocking(move || op(&service))
            .await
            .map_err(|err| ApiError::Internal(format!("service task failed: {err}")))??;
        Ok(value)
    }

    /// Broadcast a change. Having no subscribers is not an error.
    pub fn notify(&self, event: ChangeEvent) {
        let _ = self.event_tx.send(event);
    }
}
