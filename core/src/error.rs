use thiserror::Error;

#[derive(Debug, Error)]
pub enum VerifyError {
    /// The token is absent, already consumed, or never existed — the three
    /// cases are indistinguishable on purpose.
    #[error("unknown or expired verification token")]
    UnknownToken,

    /// The origin address was classified as proxy/hosting infrastructure.
    /// The token is preserved; the subject may retry from another address.
    #[error("origin address classified as suspicious")]
    SuspiciousOrigin,

    #[error("entropy source failure: {0}")]
    Entropy(String),
}
