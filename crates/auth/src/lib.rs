//! `eventhub-auth`: authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: it knows how to
//! validate and mint tokens, who the configured users are, what the current
//! request's identity is, and which access class an operation requires.

pub mod access;
pub mod claims;
pub mod directory;
pub mod principal;
pub mod roles;
pub mod token;
pub mod user_info;

pub use access::{AccessLevel, AuthError, require};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use directory::{LoginError, UserAccount, UserDirectory, UserEntryError};
pub use principal::{Principal, RequestIdentity};
pub use roles::{Authority, Role};
pub use token::{Hs256JwtValidator, Hs256TokenIssuer, IssuedToken, JwtValidator, TokenIssueError};
pub use user_info::{UserInfo, current_user};
