//! Router construction and the HTTP serve loop.

use crate::client_ip::ClientIpPolicy;
use crate::handlers;

use axum::routing::{get, post};
use axum::Router;
use gatelink_core::{AuditSink, ReputationCheck, VerificationEngine};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared state injected into every handler.
pub struct AppState<R, A> {
    pub engine: Arc<VerificationEngine<R, A>>,
    /// Public base URL used to build verification links.
    pub public_url: String,
    pub ip_policy: ClientIpPolicy,
}

// Manual impl: `R`/`A` live behind an `Arc`, no bounds needed.
impl<R, A> Clone for AppState<R, A> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            public_url: self.public_url.clone(),
            ip_policy: self.ip_policy.clone(),
        }
    }
}

/// Build the application router.
pub fn router<R, A>(state: AppState<R, A>) -> Router
where
    R: ReputationCheck,
    A: AuditSink,
{
    Router::new()
        .route("/verify/:token", get(handlers::show_challenge::<R, A>))
        .route("/verify", post(handlers::submit::<R, A>))
        .route("/api/issue", post(handlers::issue::<R, A>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve `app` on `listener` until the shutdown flag is raised.
pub async fn serve(
    listener: tokio::net::TcpListener,
    app: Router,
    mut shutdown_rx: watch::Receiver<bool>,
) -> std::io::Result<()> {
    info!("HTTP server listening on {}", listener.local_addr()?);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        // Also resolves if the flag's owner goes away.
        let _ = shutdown_rx.wait_for(|stop| *stop).await;
    })
    .await
}
