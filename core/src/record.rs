//! Verification records and the events derived from them.

use crate::time::Timestamp;
use crate::token::Token;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// One pending verification, keyed by its token.
///
/// Presentation fields are denormalized at issuance time and never updated;
/// the record is immutable from creation until it is consumed or expires.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRecord {
    /// The token identifying this attempt.
    pub token: Token,
    /// Identifier of the subject awaiting verification.
    pub subject_id: String,
    /// Display name shown on the challenge page.
    pub display_name: String,
    /// Avatar image URL shown on the challenge page.
    pub avatar_url: String,
    /// When this record was created.
    pub created_at: Timestamp,
}

impl VerificationRecord {
    /// Whether this record has outlived `ttl_secs` as of `now`.
    pub fn is_expired(&self, ttl_secs: u64, now: Timestamp) -> bool {
        self.created_at.has_expired(ttl_secs, now)
    }
}

/// Structured event emitted to the audit sink on a successful verification.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditEvent {
    pub subject_id: String,
    pub display_name: String,
    pub avatar_url: String,
    pub network_address: IpAddr,
    pub timestamp: Timestamp,
}

/// Request for the downstream authorization mechanism, sent over the grant
/// channel to the dispatch worker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantRequest {
    pub subject_id: String,
}
