//! The assembled GateLink service.

use crate::config::ServiceConfig;
use crate::error::ServiceError;
use crate::shutdown::ShutdownController;

use gatelink_core::{Timestamp, TokenStore, VerificationEngine};
use gatelink_http::{router, serve, AppState};
use gatelink_notify::{AuditWebhook, GrantWorker, HttpGrantClient, NullGrantSink};
use gatelink_reputation::IpApiChecker;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// A running GateLink instance: HTTP server, grant worker, and expiry sweep,
/// all wired to one [`ShutdownController`].
pub struct GateService {
    shutdown: Arc<ShutdownController>,
    local_addr: SocketAddr,
    task_handles: Vec<JoinHandle<()>>,
}

impl GateService {
    /// Bind the listener, wire every component, and spawn the background
    /// tasks. Returns once the service is accepting requests.
    pub async fn start(config: ServiceConfig) -> Result<Self, ServiceError> {
        let shutdown = Arc::new(ShutdownController::new());

        let store = Arc::new(TokenStore::new(config.token_ttl_secs));
        let checker = IpApiChecker::with_endpoint(
            &config.reputation_endpoint,
            Duration::from_secs(config.reputation_timeout_secs),
        );
        let audit = AuditWebhook::new(config.audit_webhook_url.clone());

        let (grant_tx, grant_rx) = mpsc::channel(config.grant_queue_capacity);
        let grant_handle = match &config.grant_endpoint {
            Some(endpoint) => GrantWorker::spawn(
                grant_rx,
                HttpGrantClient::new(endpoint),
                shutdown.subscribe(),
            ),
            None => GrantWorker::spawn(grant_rx, NullGrantSink, shutdown.subscribe()),
        };

        let engine = Arc::new(VerificationEngine::new(
            store.clone(),
            checker,
            audit,
            grant_tx,
        ));

        let sweep_handle = spawn_sweep_task(
            store,
            config.sweep_interval_secs,
            shutdown.subscribe(),
        );

        let listener =
            tokio::net::TcpListener::bind((config.bind_addr.as_str(), config.http_port)).await?;
        let local_addr = listener.local_addr()?;

        let app = router(AppState {
            engine,
            public_url: config.public_url.clone(),
            ip_policy: config.ip_policy(),
        });
        let http_shutdown_rx = shutdown.subscribe();
        let http_handle = tokio::spawn(async move {
            if let Err(e) = serve(listener, app, http_shutdown_rx).await {
                error!(error = %e, "HTTP server exited with error");
            }
        });

        info!(
            %local_addr,
            public_url = %config.public_url,
            "GateLink service started"
        );

        Ok(Self {
            shutdown,
            local_addr,
            task_handles: vec![grant_handle, sweep_handle, http_handle],
        })
    }

    /// The address the HTTP server actually bound (port 0 resolves here).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Block until SIGINT or SIGTERM arrives, then raise the shutdown flag.
    pub async fn wait_for_signal(&self) {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        let terminate = async {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(e) => {
                    error!(error = %e, "failed to install SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };
        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => info!("received SIGINT, shutting down"),
            _ = terminate => info!("received SIGTERM, shutting down"),
        }
        self.shutdown.shutdown();
    }

    /// Trigger shutdown and join all background tasks.
    pub async fn stop(self) {
        self.shutdown.shutdown();
        for handle in self.task_handles {
            let _ = handle.await;
        }
        info!("GateLink service stopped");
    }
}

/// Periodically evicts expired verification records.
fn spawn_sweep_task(
    store: Arc<TokenStore>,
    interval_secs: u64,
    mut shutdown_rx: tokio::sync::watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
        // The first tick fires immediately; skip it.
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = shutdown_rx.wait_for(|stop| *stop) => break,
                _ = ticker.tick() => {
                    let evicted = store.evict_expired(Timestamp::now());
                    if evicted > 0 {
                        debug!(evicted, "swept expired verification tokens");
                    }
                }
            }
        }
    })
}
