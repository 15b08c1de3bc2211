use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

use eventhub_auth::RequestIdentity;

/// Identity of the caller, as bound by [`crate::middleware::identity_middleware`].
///
/// Requests that never went through the middleware are anonymous.
#[derive(Debug, Clone, Default)]
pub struct Identity(pub RequestIdentity);

#[axum::async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identity = parts
            .extensions
            .get::<RequestIdentity>()
            .cloned()
            .unwrap_or_default();
        Ok(Self(identity))
    }
}
