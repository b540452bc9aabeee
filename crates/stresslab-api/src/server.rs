//! API server implementation

use std::time::Duration;

use axum::Router;
use stresslab_automation::Automation;
use stresslab_core::ServerConfig;
use tokio::net::TcpListener;

use crate::routes::router;
use crate::state::AppState;
use crate::{Error, Result};

/// How long shutdown waits for an in-flight simulation to finish.
const RUN_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Stresslab HTTP server.
#[derive(Debug, Clone)]
pub struct Server {
    config: ServerConfig,
    state: AppState,
}

impl Server {
    /// Create a server for `automation` listening per `config`.
    pub fn new(config: ServerConfig, automation: Automation) -> Self {
        Self {
            config,
            state: AppState::new(automation, "stresslab"),
        }
    }

    /// Address the server binds to.
    pub fn bind_addr(&self) -> String {
        self.config.bind_addr()
    }

    /// The application router.
    pub fn router(&self) -> Router {
        router(self.state.clone())
    }

    /// Bind and serve until Ctrl-C.
    pub async fn serve(self) -> Result<()> {
        let addr = self.bind_addr();
        let listener = TcpListener::bind(&addr).await.map_err(|source| Error::Io {
            addr: addr.clone(),
            source,
        })?;
        self.serve_on(listener, shutdown_signal()).await
    }

    /// Serve on an already-bound listener until `shutdown` resolves.
    pub async fn serve_on(
        self,
        listener: TcpListener,
        shutdown: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<()> {
        let addr = listener
            .local_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| self.bind_addr());
        tracing::info!(
            addr = %addr,
            results = %self.state.results_path().display(),
            engine = self.state.automation().engine_name(),
            "Stresslab server listening"
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|source| Error::Io {
                addr: addr.clone(),
                source,
            })?;

        self.drain_run(RUN_DRAIN_TIMEOUT).await;
        tracing::info!(addr = %addr, "Stresslab server stopped");
        Ok(())
    }

    /// Give a simulation started by `POST /simulate` a chance to write its
    /// results before the runtime goes away.
    async fn drain_run(&self, timeout: Duration) {
        let tracker = self.state.automation().tracker();
        if !tracker.state().is_running() {
            return;
        }
        tracing::info!(timeout_secs = timeout.as_secs(), "Waiting for running simulation");
        match tracker.wait_finished(timeout).await {
            Ok(state) => tracing::info!(%state, "Simulation finished before shutdown"),
            Err(reason) => tracing::warn!(%reason, "Shutting down with simulation still running"),
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
