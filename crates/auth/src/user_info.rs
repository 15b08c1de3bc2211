use serde::{Deserialize, Serialize};

use crate::{AuthError, RequestIdentity};

/// Information about the current user, for client-side session bootstrap.
///
/// Snapshot taken per request; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    name: String,
    authorities: Vec<String>,
}

impl UserInfo {
    pub fn new(name: impl Into<String>, authorities: Vec<String>) -> Self {
        Self {
            name: name.into(),
            authorities,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn authorities(&self) -> &[String] {
        &self.authorities
    }
}

/// Describe the principal bound to the request.
///
/// Fails with [`AuthError::Unauthenticated`] for anonymous requests; never
/// returns a placeholder user. Authorities are copied verbatim.
pub fn current_user(identity: &RequestIdentity) -> Result<UserInfo, AuthError> {
    let principal = identity.principal().ok_or(AuthError::Unauthenticated)?;

    let authorities = principal
        .authorities
        .iter()
        .map(|a| a.as_str().to_string())
        .collect();

    Ok(UserInfo::new(principal.name.clone(), authorities))
}
