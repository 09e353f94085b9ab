//! Web server for fileman.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;

use crate::action::ActionEngine;
use crate::config::ServerConfig;
use crate::{FilemanError, Result};

use super::handlers::AppState;
use super::router::{create_health_router, create_router};

/// Web server for the API.
pub struct WebServer {
    /// Server address.
    addr: SocketAddr,
    /// Application state.
    app_state: Arc<AppState>,
    /// Body limit of action requests in bytes.
    max_request_bytes: usize,
}

impl WebServer {
    /// Create a new web server.
    pub fn new(config: &ServerConfig, engine: ActionEngine, show_space: bool) -> Result<Self> {
        let addr = format!("{}:{}", config.host, config.port)
            .parse()
            .map_err(|e| {
                FilemanError::Config(format!(
                    "invalid server address {}:{}: {e}",
                    config.host, config.port
                ))
            })?;
        let max_request_bytes = usize::try_from(config.max_request_mb.saturating_mul(1024 * 1024))
            .unwrap_or(usize::MAX);

        Ok(Self {
            addr,
            app_state: Arc::new(AppState::new(engine).with_show_space(show_space)),
            max_request_bytes,
        })
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    fn router(self) -> Router {
        create_router(self.app_state, self.max_request_bytes)
            .merge(create_health_router())
            .layer(CompressionLayer::new())
    }

    /// Run the web server.
    pub async fn run(self) -> std::result::Result<(), std::io::Error> {
        let listener = TcpListener::bind(self.addr).await?;
        tracing::info!("Web server listening on http://{}", listener.local_addr()?);

        axum::serve(listener, self.router()).await
    }

    /// Run the server in the background and return the actual bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> std::result::Result<SocketAddr, std::io::Error> {
        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!("Web server listening on http://{}", local_addr);

        let router = self.router();
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}
