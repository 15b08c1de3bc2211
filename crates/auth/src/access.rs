//! Operation access classes and their enforcement.
//!
//! Every exposed operation declares an [`AccessLevel`]. The transport layer
//! calls [`require`] before any domain logic runs.

use thiserror::Error;

use crate::{Principal, RequestIdentity};

/// Authorization class of an exposed operation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AccessLevel {
    /// Any caller, including anonymous ones.
    Open,
    /// Any logged-in principal.
    Authenticated,
    /// Nobody. Operations that were never explicitly opened.
    Denied,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No principal is bound to the request.
    #[error("authentication required")]
    Unauthenticated,

    /// The caller lacks the access class the operation requires.
    #[error("forbidden: {0}")]
    Forbidden(String),
}

/// Check `identity` against an operation's access class.
///
/// Returns the principal for authenticated callers (`None` for anonymous
/// callers of open operations).
pub fn require<'a>(
    level: AccessLevel,
    operation: &str,
    identity: &'a RequestIdentity,
) -> Result<Option<&'a Principal>, AuthError> {
    match (level, identity.principal()) {
        (AccessLevel::Open, principal) => Ok(principal),
        (AccessLevel::Authenticated, Some(principal)) => Ok(Some(principal)),
        (AccessLevel::Authenticated, None) => Err(AuthError::Unauthenticated),
        (AccessLevel::Denied, _) => Err(AuthError::Forbidden(format!(
            "operation '{operation}' is not exposed"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Authority;

    fn user() -> RequestIdentity {
        RequestIdentity::Authenticated(Principal::new("user", vec![Authority::new("ROLE_USER")]))
    }

    #[test]
    fn open_operations_admit_everyone() {
        assert_eq!(require(AccessLevel::Open, "op", &RequestIdentity::Anonymous), Ok(None));
        assert!(require(AccessLevel::Open, "op", &user()).unwrap().is_some());
    }

    #[test]
    fn authenticated_operations_reject_anonymous_callers() {
        assert_eq!(
            require(AccessLevel::Authenticated, "op", &RequestIdentity::Anonymous),
            Err(AuthError::Unauthenticated)
        );
        assert_eq!(
            require(AccessLevel::Authenticated, "op", &user()).unwrap().map(|p| p.name.as_str()),
            Some("user")
        );
    }

    #[test]
    fn denied_operations_reject_everyone() {
        assert!(matches!(
            require(AccessLevel::Denied, "op", &user()),
            Err(AuthError::Forbidden(_))
        ));
        assert!(matches!(
            require(AccessLevel::Denied, "op", &RequestIdentity::Anonymous),
            Err(AuthError::Forbidden(_))
        ));
    }
}
