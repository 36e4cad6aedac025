//! Resolving the real client address behind reverse proxies.

use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};

/// Which upstream-supplied address headers to believe, in order:
/// CDN header first, then `X-Forwarded-For`, then the socket peer address.
///
/// Only enable a source when the corresponding proxy actually fronts this
/// service — a spoofed header from a direct connection would otherwise let a
/// visitor pick the address the reputation checker sees.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientIpPolicy {
    /// Name of a CDN-supplied client address header, e.g. `CF-Connecting-IP`.
    pub cdn_header: Option<String>,
    /// Whether to trust the first entry of `X-Forwarded-For`.
    pub trust_forwarded_for: bool,
}

impl Default for ClientIpPolicy {
    fn default() -> Self {
        Self {
            cdn_header: Some("CF-Connecting-IP".to_string()),
            trust_forwarded_for: true,
        }
    }
}

impl ClientIpPolicy {
    /// Trust nothing but the socket peer address.
    pub fn direct_only() -> Self {
        Self {
            cdn_header: None,
            trust_forwarded_for: false,
        }
    }

    /// Resolve the client address for a request.
    ///
    /// Unparsable header values fall through to the next source rather than
    /// failing the request.
    pub fn resolve(&self, headers: &HeaderMap, peer: SocketAddr) -> IpAddr {
        if let Some(name) = &self.cdn_header {
            if let Some(addr) = header_ip(headers, name) {
                return addr;
            }
        }

        if self.trust_forwarded_for {
            if let Some(value) = headers.get("X-Forwarded-For").and_then(|v| v.to_str().ok()) {
                // First entry is the originating client; later hops append.
                if let Some(first) = value.split(',').next() {
                    if let Ok(addr) = first.trim().parse() {
                        return addr;
                    }
                }
            }
        }

        peer.ip()
    }
}

fn header_ip(headers: &HeaderMap, name: &str) -> Option<IpAddr> {
    headers
        .get(name)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}
