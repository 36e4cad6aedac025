//! Webhook delivery of verification audit events.

use crate::error::NotifyError;
use gatelink_core::{AuditEvent, AuditSink};

use std::time::Duration;
use tracing::{debug, warn};

/// Timeout for webhook delivery.
const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Posts a Discord-compatible embed to a webhook URL for every successful
/// verification.
///
/// A `None` URL disables delivery entirely. Failures are logged and dropped:
/// one attempt, no retry, nothing surfaced to the caller.
pub struct AuditWebhook {
    http_client: reqwest::Client,
    url: Option<String>,
}

impl AuditWebhook {
    pub fn new(url: Option<String>) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(DELIVERY_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { http_client, url }
    }

    /// Disabled sink (no webhook configured).
    pub fn disabled() -> Self {
        Self::new(None)
    }

    fn payload(event: &AuditEvent) -> serde_json::Value {
        serde_json::json!({
            "embeds": [{
                "title": "✅ User Verified",
                "description": format!(
                    "**Username:** {}\n**ID:** {}\n**IP:** `{}`\n**At:** <t:{}>",
                    event.display_name,
                    event.subject_id,
                    event.network_address,
                    event.timestamp.as_secs(),
                ),
                "color": 10181046,
                "thumbnail": { "url": event.avatar_url },
            }]
        })
    }

    async fn deliver(&self, event: &AuditEvent) -> Result<(), NotifyError> {
        let url = match &self.url {
            Some(url) => url,
            None => return Ok(()),
        };

        let response = self
            .http_client
            .post(url)
            .json(&Self::payload(event))
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

impl AuditSink for AuditWebhook {
    async fn verified(&self, event: AuditEvent) {
        match self.deliver(&event).await {
            Ok(()) => debug!(subject = %event.subject_id, "audit event delivered"),
            Err(e) => warn!(subject = %event.subject_id, error = %e, "audit delivery failed"),
        }
    }
}
