use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::{error::AppError, state::SharedState};

const API_KEY_HEADER: &str = "x-api-key";

/// Reject `/api` requests that do not carry the configured API key.
///
/// Without a configured key every request passes.
pub async fn require_api_key(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let Some(expected) = state.config().api_key() else {
        return Ok(next.run(req).await);
    };

    let provided = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("missing API key header `x-api-key`".into()))?;

    if provided != expected {
        return Err(AppError::Forbidden("invalid API key".into()));
    }

    Ok(next.run(req).await)
}
