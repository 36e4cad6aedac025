//! HTTP client for the address classification endpoint.

use crate::error::ReputationError;
use gatelink_core::ReputationCheck;

use serde::Deserialize;
use std::net::IpAddr;
use std::time::Duration;
use tracing::{debug, warn};

/// Default endpoint, compatible with ip-api.com's JSON API.
pub const DEFAULT_ENDPOINT: &str = "http://ip-api.com";

/// Default per-request timeout. Bounds the fail-open window: a hung endpoint
/// delays a verification by at most this long before the permissive verdict
/// is returned.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Raw JSON response from the classification endpoint.
///
/// The API contract: `GET /json/{ip}?fields=proxy,hosting` returns
/// `{"proxy": bool, "hosting": bool}`. Missing fields read as `false`.
#[derive(Debug, Deserialize)]
struct ClassifyResponse {
    #[serde(default)]
    proxy: bool,
    #[serde(default)]
    hosting: bool,
}

/// Checker backed by an ip-api.com-compatible endpoint.
///
/// Each call is an independent lookup; there is no caching and no retry. The
/// display and submission paths both consult it, and the two verdicts may
/// legitimately differ.
pub struct IpApiChecker {
    http_client: reqwest::Client,
    endpoint: String,
}

impl IpApiChecker {
    /// Create a checker with the default endpoint and timeouts.
    pub fn new() -> Self {
        Self::with_endpoint(DEFAULT_ENDPOINT, DEFAULT_TIMEOUT)
    }

    /// Create a checker against a specific endpoint with a custom timeout.
    pub fn with_endpoint(endpoint: &str, timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT.min(timeout))
            .build()
            .unwrap_or_default();
        Self {
            http_client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch the raw verdict, surfacing failures.
    async fn classify(&self, addr: IpAddr) -> Result<bool, ReputationError> {
        let url = format!("{}/json/{}?fields=proxy,hosting", self.endpoint, addr);

        let response = self.http_client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                ReputationError::Unreachable(format!("request timed out: {e}"))
            } else if e.is_connect() {
                ReputationError::Unreachable(format!("connection failed: {e}"))
            } else {
                ReputationError::RequestFailed(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            return Err(ReputationError::RequestFailed(format!(
                "HTTP status {}",
                response.status()
            )));
        }

        let verdict: ClassifyResponse = response.json().await.map_err(|e| {
            ReputationError::InvalidResponse(format!("failed to parse classification: {e}"))
        })?;

        Ok(verdict.proxy || verdict.hosting)
    }
}

impl ReputationCheck for IpApiChecker {
    /// Fail-open lookup: any error yields `false`.
    async fn is_suspicious(&self, addr: IpAddr) -> bool {
        match self.classify(addr).await {
            Ok(suspicious) => {
                debug!(%addr, suspicious, "reputation verdict");
                suspicious
            }
            Err(e) => {
                warn!(%addr, error = %e, "reputation check failed, treating as clean");
                false
            }
        }
    }
}

impl Default for IpApiChecker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_response_deserialization() {
        let json = r#"{"proxy": true, "hosting": false}"#;
        let resp: ClassifyResponse = serde_json::from_str(json).unwrap();
        assert!(resp.proxy);
        assert!(!resp.hosting);
    }

    #[test]
    fn missing_fields_read_as_clean() {
        let resp: ClassifyResponse = serde_json::from_str("{}").unwrap();
        assert!(!resp.proxy);
        assert!(!resp.hosting);
    }

    #[test]
    fn endpoint_trailing_slash_is_stripped() {
        let checker = IpApiChecker::with_endpoint("http://example.test/", DEFAULT_TIMEOUT);
        assert_eq!(checker.endpoint, "http://example.test");
    }

    #[tokio::test]
    async fn unreachable_endpoint_fails_open() {
        // Nothing listens on the discard port; the connection is refused
        // immediately and the checker must fall back to "not suspicious".
        let checker =
            IpApiChecker::with_endpoint("http://127.0.0.1:9", Duration::from_secs(2));
        let addr: IpAddr = "203.0.113.7".parse().unwrap();
        assert!(!checker.is_suspicious(addr).await);
    }

    #[tokio::test]
    async fn unreachable_endpoint_surfaces_error_internally() {
        let checker =
            IpApiChecker::with_endpoint("http://127.0.0.1:9", Duration::from_secs(2));
        let addr: IpAddr = "203.0.113.7".parse().unwrap();
        assert!(matches!(
            checker.classify(addr).await,
            Err(ReputationError::Unreachable(_)) | Err(ReputationError::RequestFailed(_))
        ));
    }
}
