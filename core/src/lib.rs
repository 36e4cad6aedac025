//! GateLink verification core.
//!
//! The pieces that make one-time verification links safe to hand out:
//! - [`Token`] — opaque, unguessable link identifier.
//! - [`TokenStore`] — in-memory registry of pending verifications with
//!   atomic consume-once semantics and TTL expiry.
//! - [`VerificationEngine`] — the PENDING → VERIFIED decision protocol,
//!   gated on an external reputation verdict.
//!
//! This crate is deliberately free of HTTP concerns. The web layer, the
//! reputation client, and the webhook/grant delivery live in sibling crates
//! and plug in through [`ReputationCheck`], [`AuditSink`], and the grant
//! channel.

pub mod engine;
pub mod error;
pub mod record;
pub mod store;
pub mod time;
pub mod token;

pub use engine::{AuditSink, Challenge, Outcome, ReputationCheck, VerificationEngine};
pub use error::VerifyError;
pub use record::{AuditEvent, GrantRequest, VerificationRecord};
pub use store::{Consumed, TokenStore};
pub use time::Timestamp;
pub use token::Token;
