//! Service configuration with TOML file support.

use crate::error::ServiceError;
use gatelink_http::ClientIpPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for a GateLink service instance.
///
/// Can be loaded from a TOML file via [`ServiceConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). Every field has a serde default,
/// so a partial file is fine.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Address to bind the HTTP server on.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// HTTP port. Zero picks an ephemeral port (useful in tests).
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// Public base URL used when building verification links.
    #[serde(default = "default_public_url")]
    pub public_url: String,

    /// Base URL of the address classification endpoint.
    #[serde(default = "default_reputation_endpoint")]
    pub reputation_endpoint: String,

    /// Per-request timeout for reputation lookups, in seconds. Bounds the
    /// fail-open window when the endpoint hangs.
    #[serde(default = "default_reputation_timeout_secs")]
    pub reputation_timeout_secs: u64,

    /// Webhook URL for verification audit events. `None` disables delivery.
    #[serde(default)]
    pub audit_webhook_url: Option<String>,

    /// Endpoint of the downstream grant mechanism. `None` logs grants
    /// instead of delivering them.
    #[serde(default)]
    pub grant_endpoint: Option<String>,

    /// How long an issued token stays valid, in seconds.
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,

    /// How often the expiry sweep runs, in seconds.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Capacity of the bounded grant-dispatch queue.
    #[serde(default = "default_grant_queue_capacity")]
    pub grant_queue_capacity: usize,

    /// CDN-supplied client address header to trust, if any.
    #[serde(default = "default_cdn_ip_header")]
    pub cdn_ip_header: Option<String>,

    /// Whether to trust the first `X-Forwarded-For` entry.
    #[serde(default = "default_true")]
    pub trust_forwarded_for: bool,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ServiceConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, ServiceError> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| ServiceError::Config(format!("{}: {e}", path.display())))
    }

    /// Client-IP trust policy derived from the header settings.
    pub fn ip_policy(&self) -> ClientIpPolicy {
        ClientIpPolicy {
            cdn_header: self.cdn_ip_header.clone(),
            trust_forwarded_for: self.trust_forwarded_for,
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        // Round-trips through serde so the defaults live in one place.
        toml::from_str("").expect("empty config must deserialize")
    }
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    8080
}

fn default_public_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_reputation_endpoint() -> String {
    gatelink_reputation::checker::DEFAULT_ENDPOINT.to_string()
}

fn default_reputation_timeout_secs() -> u64 {
    5
}

fn default_token_ttl_secs() -> u64 {
    gatelink_core::store::DEFAULT_TOKEN_TTL_SECS
}

fn default_sweep_interval_secs() -> u64 {
    60
}

fn default_grant_queue_capacity() -> usize {
    256
}

fn default_cdn_ip_header() -> Option<String> {
    Some("CF-Connecting-IP".to_string())
}

fn default_true() -> bool {
    true
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}
