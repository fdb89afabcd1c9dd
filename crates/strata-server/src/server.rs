use std::net::SocketAddr;
use std::sync::Arc;

use strata_sync::Repository;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::AppState;
use crate::router::build_router;

/// Hosts one repository over HTTP.
pub struct StrataServer {
    config: ServerConfig,
    state: AppState,
}

impl StrataServer {
    /// Serve a fresh in-memory repository, shallow if the configuration
    /// says so.
    pub fn new(config: ServerConfig) -> Self {
        let repo = Repository::in_memory();
        repo.set_shallow_depth(config.shallow_depth);
        Self::with_repository(config, Arc::new(repo))
    }

    pub fn with_repository(config: ServerConfig, repo: Arc<Repository>) -> Self {
        Self {
            config,
            state: AppState::new(repo),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn repository(&self) -> &Arc<Repository> {
        &self.state.repo
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone(), self.config.max_object_size)
    }

    /// Bind the configured address and serve until the task is dropped.
    pub async fn serve(self) -> ServerResult<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve_with_listener(listener).await
    }

    /// Serve on an already-bound listener.
    pub async fn serve_with_listener(self, listener: TcpListener) -> ServerResult<()> {
        let addr: SocketAddr = listener.local_addr()?;
        tracing::info!(%addr, shallow = ?self.config.shallow_depth, "strata server listening");
        axum::serve(listener, self.router())
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}
