//! Database administration seam
//!
//! The provisioner only talks to the database through [`DatabaseAdmin`].

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Role every provisioned user receives, scoped to its own database.
pub const READ_WRITE_ROLE: &str = "readWrite";

/// A role bound to a database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleGrant {
    pub role: String,
    pub db: String,
}

impl RoleGrant {
    pub fn read_write(db: &str) -> Self {
        Self {
            role: READ_WRITE_ROLE.to_string(),
            db: db.to_string(),
        }
    }
}

/// A resolved password. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Failures reported by a [`DatabaseAdmin`].
#[derive(Debug, Error)]
pub enum AdminError {
    /// The user is already defined in the target database.
    #[error("user {username} already exists in {database}")]
    AlreadyExists { database: String, username: String },

    #[error("{operation} timed out after {timeout:?}")]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },

    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl AdminError {
    /// Wrap any other failure.
    pub fn other(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Other(err.into())
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }
}

/// User administration against a database server.
///
/// Calls are issued one at a time; implementations bound each call with
/// their own client timeout.
#[async_trait]
pub trait DatabaseAdmin: Send + Sync {
    /// Create `username` in `database` with `password` and exactly `roles`.
    ///
    /// Must return [`AdminError::AlreadyExists`] when the user is already
    /// defined, so the caller can fall back to [`DatabaseAdmin::update_user`].
    async fn create_user(
        &self,
        database: &str,
        username: &str,
        password: &Credential,
        roles: &[RoleGrant],
    ) -> Result<(), AdminError>;

    /// Reset the password of an existing user.
    async fn update_user(
        &self,
        database: &str,
        username: &str,
        password: &Credential,
    ) -> Result<(), AdminError>;
}
