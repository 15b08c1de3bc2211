use serde::{Deserialize, Serialize};

use crate::{Authority, JwtClaims};

/// An authenticated principal: name + granted authorities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub name: String,
    pub authorities: Vec<Authority>,
}

impl Principal {
    pub fn new(name: impl Into<String>, authorities: Vec<Authority>) -> Self {
        Self {
            name: name.into(),
            authorities,
        }
    }
}

impl From<JwtClaims> for Principal {
    fn from(claims: JwtClaims) -> Self {
        Self {
            name: claims.sub,
            authorities: claims.authorities,
        }
    }
}

/// Identity bound to a single request by the transport boundary.
///
/// Passed explicitly to whatever needs it; there is no ambient lookup.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RequestIdentity {
    #[default]
    Anonymous,
    Authenticated(Principal),
}

impl RequestIdentity {
    pub fn principal(&self) -> Option<&Principal> {
        match self {
            RequestIdentity::Anonymous => None,
            RequestIdentity::Authenticated(p) => Some(p),
        }
    }
}
