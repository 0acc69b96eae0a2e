//! API key middleware

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use std::sync::Arc;
use tracing::debug;

use crate::server::api::AppState;
use crate::server::error::ApiError;

/// Require `Authorization: Bearer <key>` or `?token=<key>` when a key is configured
pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let expected = state.config.api_key.as_str();

    if !expected.is_empty() {
        let header_key = headers
            .get("Authorization")
            .and_then(|header| header.to_str().ok())
            .and_then(|auth| auth.strip_prefix("Bearer "));

        let query_key = request.uri().query().and_then(query_token);

        if header_key != Some(expected) && query_key != Some(expected) {
            debug!("Invalid API key");
            return Err(ApiError::Unauthorized);
        }
    }

    Ok(next.run(request).await)
}

fn query_token(query: &str) -> Option<&str> {
    query.split('&').find_map(|pair| {
        let mut parts = pair.splitn(2, '=');
        match (parts.next(), parts.next()) {
            (Some("token"), Some(value)) => Some(value),
            _ => None,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_token() {
        assert_eq!(query_token("token=abc"), Some("abc"));
        assert_eq!(query_token("x=1&token=abc"), Some("abc"));
        assert_eq!(query_token("tokens=abc"), None);
        assert_eq!(query_token(""), None);
    }
}
