use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::info;

use nodeflow_core::config::AppConfig;
use nodeflow_ops::OpLibrary;

use crate::routes;
use crate::state::AppState;

/// HTTP gateway built on axum: schema listing, synchronous execute and
/// the SSE streaming execute.
pub struct GatewayServer {
    state: Arc<AppState>,
}

impl GatewayServer {
    pub fn new(config: AppConfig, library: OpLibrary) -> Self {
        Self {
            state: Arc::new(AppState::new(config, library)),
        }
    }

    /// Run the gateway until the cancellation token is triggered.
    pub async fn run(&self, shutdown: CancellationToken) -> anyhow::Result<()> {
        let app = Router::new()
            .route("/", get(routes::root))
            .route("/get_schema", get(routes::get_schema))
            .route("/execute", post(routes::execute))
            .route("/execute/stream", post(routes::execute_stream))
            .layer(CorsLayer::permissive())
            .with_state(self.state.clone());

        let bind = self.state.config.server.bind();
        let listener = TcpListener::bind(&bind).await?;
        info!(bind = %bind, "Gateway listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await?;

        info!("Gateway shut down");
        Ok(())
    }
}
