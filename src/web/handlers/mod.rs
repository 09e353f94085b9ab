//! API handlers for the file manager UI.

pub mod action;
pub mod download;
pub mod tree;

pub use action::post_action;
pub use download::{download, media};
pub use tree::get_tree;

use std::sync::Arc;

use tokio::task;

use crate::action::ActionEngine;
use crate::web::dto::TreeResponse;
use crate::web::error::ApiError;

/// Application state shared across handlers.
pub struct AppState {
    /// Engine over the managed root.
    pub engine: Arc<ActionEngine>,
    /// Whether usage is shown in the UI.
    pub show_space: bool,
}

impl AppState {
    /// Create a new application state.
    pub fn new(engine: ActionEngine) -> Self {
        Self {
            engine: Arc::new(engine),
            show_space: true,
        }
    }

    /// Set whether usage is shown in the UI.
    pub fn with_show_space(mut self, show_space: bool) -> Self {
        self.show_space = show_space;
        self
    }

    /// Snapshot and usage for `current_path`. Blocking; call off the runtime.
    pub(crate) fn tree_response(&self, current_path: &str) -> TreeResponse {
        let engine = &self.engine;
        let usage = engine.policy().check_space.then(|| engine.usage());
        TreeResponse::new(
            engine.snapshot(current_path),
            usage,
            engine.policy(),
            self.show_space,
        )
    }
}

/// Run filesystem work on the blocking pool.
pub(crate) async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    task::spawn_blocking(work).await.map_err(|e| {
        tracing::error!("Blocking task failed: {}", e);
        ApiError::internal("An internal error occurred")
    })
}
