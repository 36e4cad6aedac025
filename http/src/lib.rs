//! Web-facing layer for GateLink.
//!
//! Three surfaces:
//! - `GET /verify/{token}` — the challenge page a subject opens from their
//!   one-time link.
//! - `POST /verify` — challenge submission.
//! - `POST /api/issue` — issuance API for the chat-platform command handler.
//!
//! The layer owns client-IP resolution (proxy-header trust policy) and the
//! mapping from engine outcomes to HTTP responses; everything else is
//! delegated to [`gatelink_core::VerificationEngine`].

pub mod client_ip;
pub mod error;
pub mod handlers;
pub mod pages;
pub mod server;

pub use client_ip::ClientIpPolicy;
pub use error::HttpError;
pub use server::{router, serve, AppState};
