//! Admin authentication.
//!
//! Back-office routes require the configured admin token, passed as
//! `Authorization: Bearer <token>` or `X-API-Key: <token>`. When no token is
//! configured the routes are open, which is only intended for local use.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

use super::error::ApiError;
use crate::AppState;

/// Extract the token from request headers
fn extract_token(headers: &HeaderMap) -> Option<&str> {
    if let Some(auth_header) = headers.get("Authorization").and_then(|h| h.to_str().ok()) {
        return Some(auth_header.strip_prefix("Bearer ").unwrap_or(auth_header).trim());
    }

    headers
        .get("X-API-Key")
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
}

fn token_matches(expected: &str, provided: &str) -> bool {
    let expected = expected.as_bytes();
    let provided = provided.as_bytes();
    expected.len() == provided.len() && expected.ct_eq(provided).into()
}

pub async fn admin_middleware(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(expected) = state
        .config
        .auth
        .admin_token
        .as_deref()
        .filter(|t| !t.is_empty())
    else {
        return next.run(request).await;
    };

    let rejection = match extract_token(request.headers()) {
        Some(token) if token_matches(expected, token) => None,
        Some(_) => {
            tracing::warn!(path = %request.uri().path(), "Rejected request with invalid admin token");
            Some("Invalid admin token")
        }
        None => Some("Admin token required"),
    };

    match rejection {
        None => next.run(request).await,
        Some(message) => ApiError::unauthorized(message).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_token(&headers), None);

        headers.insert("X-API-Key", HeaderValue::from_static("key-123"));
        assert_eq!(extract_token(&headers), Some("key-123"));

        headers.insert("Authorization", HeaderValue::from_static("Bearer secret"));
        assert_eq!(extract_token(&headers), Some("secret"));
    }

    #[test]
    fn test_token_matches() {
        assert!(token_matches("secret", "secret"));
        assert!(!token_matches("secret", "secreT"));
        assert!(!token_matches("secret", "secret-longer"));
        assert!(!token_matches("secret", ""));
    }
}
