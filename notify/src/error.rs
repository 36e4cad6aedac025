use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("endpoint unreachable: {0}")]
    Unreachable(String),

    #[error("request failed: {0}")]
    RequestFailed(String),
}
