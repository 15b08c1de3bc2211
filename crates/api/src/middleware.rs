use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use tracing::debug;

use eventhub_auth::{AuthError, JwtValidator, RequestIdentity};

use crate::app::errors::ApiError;

#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<dyn JwtValidator>,
}

/// Bind a [`RequestIdentity`] to every request.
///
/// No `Authorization` header means anonymous. A header that is present but
/// not a valid bearer token is rejected with 401, whatever the route.
pub async fn identity_middleware(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Response {
    let identity = match extract_bearer(req.headers()) {
        Ok(None) => RequestIdentity::Anonymous,
        Ok(Some(token)) => match state.jwt.validate(token, Utc::now()) {
            Ok(claims) => RequestIdentity::Authenticated(claims.into()),
            Err(e) => {
                debug!(error = %e, "rejected bearer token");
                return ApiError::from(AuthError::Unauthenticated).into_response();
            }
        },
        Err(e) => return ApiError::from(e).into_response(),
    };

    req.extensions_mut().insert(identity);
    next.run(req).await
}

fn extract_bearer(headers: &HeaderMap) -> Result<Option<&str>, AuthError> {
    let Some(header) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Ok(None);
    };

    let header = header.to_str().map_err(|_| AuthError::Unauthenticated)?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::Unauthenticated)?
        .trim();
    if token.is_empty() {
        return Err(AuthError::Unauthenticated);
    }

    Ok(Some(token))
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_str(value).unwrap(),
        );
        headers
    }

    #[test]
    fn missing_header_is_anonymous() {
        assert_eq!(extract_bearer(&HeaderMap::new()), Ok(None));
    }

    #[test]
    fn bearer_token_is_extracted() {
        assert_eq!(extract_bearer(&headers("Bearer abc.def ")), Ok(Some("abc.def")));
    }

    #[test]
    fn other_schemes_and_empty_tokens_are_rejected() {
        assert_eq!(
            extract_bearer(&headers("Basic dXNlcjp1c2Vy")),
            Err(AuthError::Unauthenticated)
        );
        assert_eq!(extract_bearer(&headers("Bearer   ")), Err(AuthError::Unauthenticated));
    }
}
