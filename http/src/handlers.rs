//! Request handlers for the verification flow.

use crate::error::HttpError;
use crate::pages;
use crate::server::AppState;

use axum::extract::{ConnectInfo, Path, State};
use axum::http::HeaderMap;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::{Form, Json};
use gatelink_core::{AuditSink, Outcome, ReputationCheck, Timestamp, Token, VerifyError};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

#[derive(Deserialize)]
pub struct SubmitForm {
    pub token: String,
}

#[derive(Deserialize)]
pub struct IssueRequest {
    pub subject_id: String,
    pub display_name: String,
    #[serde(default)]
    pub avatar_url: String,
}

#[derive(Serialize, Deserialize)]
pub struct IssueResponse {
    pub token: String,
    pub url: String,
}

/// `GET /verify/{token}` — the challenge page.
///
/// Looks the record up without consuming it and shows the current reputation
/// verdict as an advisory notice. Unknown tokens get the generic 404 page.
pub async fn show_challenge<R, A>(
    State(state): State<AppState<R, A>>,
    Path(token): Path<String>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<Html<String>, HttpError>
where
    R: ReputationCheck,
    A: AuditSink,
{
    let addr = state.ip_policy.resolve(&headers, peer);
    let token = Token::from(token);

    match state
        .engine
        .challenge(&token, addr, Timestamp::now())
        .await
    {
        Ok(challenge) => Ok(Html(pages::challenge(
            &challenge.record,
            challenge.suspicious,
        ))),
        Err(VerifyError::UnknownToken) => Err(HttpError::NotFound),
        Err(e) => Err(HttpError::Internal(e.to_string())),
    }
}

/// `POST /verify` — challenge submission.
///
/// A suspicious verdict redirects back to the challenge page (which renders
/// the retry notice); the token stays valid. Losing the completion race maps
/// to the already-verified page, not an error.
pub async fn submit<R, A>(
    State(state): State<AppState<R, A>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Form(form): Form<SubmitForm>,
) -> Result<Response, HttpError>
where
    R: ReputationCheck,
    A: AuditSink,
{
    let addr = state.ip_policy.resolve(&headers, peer);
    let token = Token::from(form.token.as_str());

    match state.engine.submit(&token, addr, Timestamp::now()).await {
        Ok(Outcome::Verified(_)) => Ok(Html(pages::verified()).into_response()),
        Ok(Outcome::AlreadyVerified) => Ok(Html(pages::already_verified()).into_response()),
        Err(VerifyError::SuspiciousOrigin) => {
            Ok(Redirect::to(&format!("/verify/{}", form.token)).into_response())
        }
        Err(VerifyError::UnknownToken) => Err(HttpError::NotFound),
        Err(e) => Err(HttpError::Internal(e.to_string())),
    }
}

/// `POST /api/issue` — issuance trigger for the chat-platform handler.
///
/// Returns the fresh token together with the public URL to present to the
/// subject.
pub async fn issue<R, A>(
    State(state): State<AppState<R, A>>,
    Json(request): Json<IssueRequest>,
) -> Result<Json<IssueResponse>, HttpError>
where
    R: ReputationCheck,
    A: AuditSink,
{
    let token = state
        .engine
        .issue(
            &request.subject_id,
            &request.display_name,
            &request.avatar_url,
            Timestamp::now(),
        )
        .map_err(|e| HttpError::Internal(e.to_string()))?;

    let url = format!(
        "{}/verify/{}",
        state.public_url.trim_end_matches('/'),
        token
    );
    Ok(Json(IssueResponse {
        token: token.as_str().to_string(),
        url,
    }))
}
