//! Network-origin reputation checking.
//!
//! Classifies an address as suspicious (proxy/VPN/hosting infrastructure) by
//! querying an ip-api.com-compatible endpoint. The policy is fail-open:
//! verification must not be blocked by a third-party outage, so any failure
//! to obtain a verdict counts as "not suspicious".

pub mod checker;
pub mod error;

pub use checker::IpApiChecker;
pub use error::ReputationError;
