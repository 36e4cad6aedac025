use thiserror::Error;

/// Failures while consulting the classification endpoint.
///
/// These never reach the verification engine — the checker maps every one of
/// them to a non-suspicious verdict. They exist so the fallible lookup is an
/// explicit, testable step rather than an implicit catch-all.
#[derive(Debug, Error)]
pub enum ReputationError {
    #[error("classification endpoint unreachable: {0}")]
    Unreachable(String),

    #[error("classification request failed: {0}")]
    RequestFailed(String),

    #[error("invalid classification response: {0}")]
    InvalidResponse(String),
}
