//! Outbound delivery for GateLink: the audit webhook and the grant worker.
//!
//! Both paths are best-effort by design. A successful verification already
//! happened by the time anything in this crate runs; delivery failures are
//! logged and dropped, never rolled back or surfaced to the visitor.

pub mod error;
pub mod grant;
pub mod webhook;

pub use error::NotifyError;
pub use grant::{GrantSink, GrantWorker, HttpGrantClient, NullGrantSink};
pub use webhook::AuditWebhook;
