use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("config error: {0}")]
    Config(String),

    #[error("verification error: {0}")]
    Verify(#[from] gatelink_core::VerifyError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
