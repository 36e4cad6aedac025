//! HTTP-level error responses.

use crate::pages;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    /// Token absent, consumed, or expired — rendered as a generic 404 so the
    /// three cases stay indistinguishable to the visitor.
    #[error("unknown or expired token")]
    NotFound,

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        match self {
            HttpError::NotFound => {
                (StatusCode::NOT_FOUND, Html(pages::not_found())).into_response()
            }
            HttpError::Internal(reason) => {
                tracing::error!(%reason, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html(pages::internal_error()),
                )
                    .into_response()
            }
        }
    }
}
