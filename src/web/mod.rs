//! Web API module for fileman.
//!
//! A thin JSON/multipart layer over the action engine: every request parses
//! its inputs, hands filesystem work to the blocking pool and wraps the
//! outcome in the `{data: ...}` or `{error: ...}` envelope.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use router::{create_health_router, create_router};
pub use server::WebServer;
