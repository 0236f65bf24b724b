use crate::{create_router, AppState};
use agentmatrix_core::{MatrixError, Result, Settings};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};

pub struct Server {
    state: AppState,
    addr: SocketAddr,
}

impl Server {
    pub async fn new(settings: Arc<Settings>) -> Result<Self> {
        let addr = resolve_bind_addr(&settings).await?;
        let state = AppState::new(settings).await?;
        Ok(Self { state, addr })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub async fn run(self) -> Result<()> {
        let router = create_router(self.state);
        let listener = tokio::net::TcpListener::bind(self.addr).await?;

        info!("AgentMatrix API listening on http://{}", self.addr);
        info!("  GET /health");
        info!("  GET /api/compare?agents=&features=&categories=&levels=&q=");
        info!("  GET /api/compare/stats");
        info!("  GET /api/agent, /api/agent/{{slug}}");
        info!("  GET /api/feature, /api/feature/{{slug}}");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

/// Resolves `server.host:server.port`, accepting hostnames as well as IP literals.
pub async fn resolve_bind_addr(settings: &Settings) -> Result<SocketAddr> {
    let bind = settings.bind_addr();
    let addr = tokio::net::lookup_host(bind.as_str())
        .await
        .map_err(|e| MatrixError::Config(format!("invalid bind address {}: {}", bind, e)))?
        .next()
        .ok_or_else(|| MatrixError::Config(format!("bind address {} resolved to nothing", bind)));
    addr
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully");
        },
    }
}

/// Installs the global subscriber. `RUST_LOG` wins over `default_level`.
pub fn init_tracing(default_level: &str) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "agentmatrix_core={lvl},agentmatrix_api={lvl},agentmatrix={lvl},tower_http={lvl}",
            lvl = default_level
        )
        .into()
    });
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
