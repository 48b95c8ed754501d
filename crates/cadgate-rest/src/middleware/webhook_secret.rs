//! Shared-secret check for webhook routes.

use crate::{responses::AppError, state::AppState};
use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use cadgate_core::CadgateError;
use tracing::warn;

/// Header webhook callers put the shared secret in.
pub const WEBHOOK_SECRET_HEADER: &str = "x-webhook-secret";

/// Rejects webhook calls without the configured secret.
///
/// Passes everything through when no secret is configured.
pub async fn webhook_secret_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(expected) = state.webhook_secret.as_deref() else {
        return next.run(request).await;
    };

    let presented = request
        .headers()
        .get(WEBHOOK_SECRET_HEADER)
        .and_then(|h| h.to_str().ok());

    match presented {
        Some(presented) if secrets_match(presented, expected) => next.run(request).await,
        _ => {
            warn!(path = %request.uri().path(), "Rejected webhook with missing or invalid secret");
            AppError(CadgateError::unauthorized("Invalid webhook secret")).into_response()
        }
    }
}

/// Compares without short-circuiting on the first differing byte.
fn secrets_match(presented: &str, expected: &str) -> bool {
    presented.len() == expected.len()
        && presented
            .bytes()
            .zip(expected.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secrets_match() {
        assert!(secrets_match("s3cret", "s3cret"));
        assert!(!secrets_match("s3cret", "s3creT"));
        assert!(!secrets_match("s3cret", "s3cret-longer"));
        assert!(!secrets_match("", "s3cret"));
    }
}
