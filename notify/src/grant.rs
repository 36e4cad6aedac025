//! Grant-dispatch worker.
//!
//! Verified subjects are decoupled from the authorization backend by a
//! bounded channel: the engine enqueues a [`GrantRequest`] and returns, and
//! this worker drains the queue, calling the grant endpoint at its own pace.
//! The worker tolerates and logs failures without crashing; a dead backend
//! costs grants, never availability.

use crate::error::NotifyError;
use gatelink_core::GrantRequest;

use std::future::Future;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Timeout for a single grant call.
const GRANT_TIMEOUT: Duration = Duration::from_secs(10);

/// The downstream authorization mechanism.
pub trait GrantSink: Send + Sync + 'static {
    fn grant(&self, request: &GrantRequest) -> impl Future<Output = Result<(), NotifyError>> + Send;
}

/// Grant client that POSTs to a role-assignment HTTP endpoint.
///
/// `POST {endpoint}` with body `{"subject_id": "..."}`; any 2xx status
/// counts as granted.
pub struct HttpGrantClient {
    http_client: reqwest::Client,
    endpoint: String,
}

impl HttpGrantClient {
    pub fn new(endpoint: &str) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(GRANT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            http_client,
            endpoint: endpoint.to_string(),
        }
    }
}

impl GrantSink for HttpGrantClient {
    async fn grant(&self, request: &GrantRequest) -> Result<(), NotifyError> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    NotifyError::Unreachable(e.to_string())
                } else {
                    NotifyError::RequestFailed(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(NotifyError::RequestFailed(format!(
                "HTTP status {}",
                response.status()
            )));
        }
        Ok(())
    }
}

/// Sink used when no grant endpoint is configured: logs and accepts.
pub struct NullGrantSink;

impl GrantSink for NullGrantSink {
    async fn grant(&self, request: &GrantRequest) -> Result<(), NotifyError> {
        info!(subject = %request.subject_id, "no grant endpoint configured, dropping request");
        Ok(())
    }
}

/// Dedicated task draining the grant channel.
pub struct GrantWorker;

impl GrantWorker {
    /// Spawn the worker. It exits when the channel closes; when the shutdown
    /// flag is raised it first delivers every request already queued, then
    /// exits.
    pub fn spawn<S: GrantSink>(
        mut rx: mpsc::Receiver<GrantRequest>,
        sink: S,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                if *shutdown_rx.borrow_and_update() {
                    // Refuse new requests, then drain what is already queued
                    // so verified subjects are not silently dropped.
                    rx.close();
                    while let Some(request) = rx.recv().await {
                        dispatch(&sink, &request).await;
                    }
                    info!("grant worker shutting down");
                    break;
                }
                tokio::select! {
                    changed = shutdown_rx.changed() => {
                        // Controller gone: nothing will raise the flag now.
                        if changed.is_err() {
                            break;
                        }
                    }
                    request = rx.recv() => {
                        let Some(request) = request else { break };
                        dispatch(&sink, &request).await;
                    }
                }
            }
        })
    }
}

async fn dispatch<S: GrantSink>(sink: &S, request: &GrantRequest) {
    match sink.grant(request).await {
        Ok(()) => {
            info!(subject = %request.subject_id, "access granted");
        }
        Err(e) => {
            // Best-effort: the verification already stands.
            warn!(subject = %request.subject_id, error = %e, "grant failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct RecordingSink {
        granted: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    impl GrantSink for RecordingSink {
        async fn grant(&self, request: &GrantRequest) -> Result<(), NotifyError> {
            if self.fail {
                return Err(NotifyError::RequestFailed("backend down".into()));
            }
            self.granted.lock().unwrap().push(request.subject_id.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn worker_drains_requests_in_order() {
        let (tx, rx) = mpsc::channel(8);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let sink = RecordingSink::default();
        let granted = sink.granted.clone();

        let handle = GrantWorker::spawn(rx, sink, shutdown_rx);
        for id in ["U1", "U2", "U3"] {
            tx.send(GrantRequest {
                subject_id: id.into(),
            })
            .await
            .unwrap();
        }
        drop(tx);
        handle.await.unwrap();

        assert_eq!(*granted.lock().unwrap(), vec!["U1", "U2", "U3"]);
    }

    #[tokio::test]
    async fn worker_survives_sink_failures() {
        let (tx, rx) = mpsc::channel(8);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let sink = RecordingSink {
            fail: true,
            ..Default::default()
        };

        let handle = GrantWorker::spawn(rx, sink, shutdown_rx);
        tx.send(GrantRequest {
            subject_id: "U1".into(),
        })
        .await
        .unwrap();
        drop(tx);

        // A failing sink must not kill the worker task.
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn worker_stops_on_shutdown_signal() {
        let (_tx, rx) = mpsc::channel::<GrantRequest>(8);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = GrantWorker::spawn(rx, RecordingSink::default(), shutdown_rx);
        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn shutdown_delivers_every_queued_request() {
        let (tx, rx) = mpsc::channel(64);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        for i in 0..64 {
            tx.send(GrantRequest {
                subject_id: format!("U{i}"),
            })
            .await
            .unwrap();
        }
        // Flag already raised when the worker starts: it must still drain
        // the full backlog before exiting.
        shutdown_tx.send(true).unwrap();

        let sink = RecordingSink::default();
        let granted = sink.granted.clone();
        let handle = GrantWorker::spawn(rx, sink, shutdown_rx);
        handle.await.unwrap();

        assert_eq!(granted.lock().unwrap().len(), 64);
    }
}
