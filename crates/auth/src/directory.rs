//! In-memory user directory used by the login endpoint.
//!
//! Accounts are configured as `name:password:ROLE[,ROLE...]` entries separated
//! by `;`. Passwords are held in clear text; the directory is meant for local
//! and demo deployments only.

use core::str::FromStr;

use thiserror::Error;

use crate::{Principal, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoginError {
    #[error("invalid username or password")]
    InvalidCredentials,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid user entry '{entry}': {reason}")]
pub struct UserEntryError {
    pub entry: String,
    pub reason: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    pub username: String,
    password: String,
    pub roles: Vec<Role>,
}

impl UserAccount {
    pub fn new(username: impl Into<String>, password: impl Into<String>, roles: Vec<Role>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            roles,
        }
    }

    fn principal(&self) -> Principal {
        Principal::new(
            self.username.clone(),
            self.roles.iter().map(Role::authority).collect(),
        )
    }
}

impl FromStr for UserAccount {
    type Err = UserEntryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = |reason| UserEntryError {
            entry: s.to_string(),
            reason,
        };

        let mut parts = s.trim().splitn(3, ':');
        let username = parts.next().unwrap_or_default().trim();
        let password = parts.next().ok_or_else(|| err("missing password"))?;
        let roles = parts.next().ok_or_else(|| err("missing roles"))?;

        if username.is_empty() {
            return Err(err("empty username"));
        }

        let roles: Vec<Role> = roles
            .split(',')
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(|r| Role::new(r.to_string()))
            .collect();

        Ok(Self::new(username, password, roles))
    }
}

#[derive(Debug, Clone, Default)]
pub struct UserDirectory {
    accounts: Vec<UserAccount>,
}

impl UserDirectory {
    pub fn new(accounts: Vec<UserAccount>) -> Self {
        Self { accounts }
    }

    /// Parse a `;`-separated list of account entries.
    pub fn parse(entries: &str) -> Result<Self, UserEntryError> {
        let accounts = entries
            .split(';')
            .filter(|entry| !entry.trim().is_empty())
            .map(UserAccount::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(accounts))
    }

    /// Check credentials and return the principal they identify.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Principal, LoginError> {
        let account = self
            .accounts
            .iter()
            .find(|a| a.username == username && a.password == password)
            .ok_or(LoginError::InvalidCredentials)?;

        tracing::debug!(username = %account.username, "credentials accepted");
        Ok(account.principal())
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}
