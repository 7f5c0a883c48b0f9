//! Idempotent user provisioning
//!
//! For each entry, in order: resolve the password from the environment,
//! create the user with a `readWrite` grant on its database, and if the user
//! already exists reset its password instead. Entries without a password are
//! skipped. Any other failure stops the run.

use crate::admin::{Credential, DatabaseAdmin, RoleGrant};
use crate::entry::ProvisionEntry;
use common::EnvSource;
use std::fmt;
use tracing::{error, info, warn};

/// Why an entry was left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingCredential,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingCredential => f.write_str("missing credential"),
        }
    }
}

/// Result of provisioning one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Created,
    PasswordUpdated,
    Skipped { reason: SkipReason },
    Fatal { error: String },
}

impl Outcome {
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal { .. })
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => f.write_str("created"),
            Self::PasswordUpdated => f.write_str("password updated"),
            Self::Skipped { reason } => write!(f, "skipped ({})", reason),
            Self::Fatal { error } => write!(f, "fatal: {}", error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionRecord {
    pub entry: ProvisionEntry,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Every entry was processed
    Completed,
    /// A fatal outcome stopped the run early
    Aborted,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutcomeCounts {
    pub created: usize,
    pub password_updated: usize,
    pub skipped: usize,
    pub fatal: usize,
}

/// Ordered outcomes of one provisioning run.
///
/// Holds a record for every entry processed, including the fatal one when
/// the run aborted. Entries after it have no record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionReport {
    pub records: Vec<ProvisionRecord>,
    pub status: RunStatus,
}

impl ProvisionReport {
    /// True unless the run aborted. Skipped entries still count as success.
    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Completed
    }

    pub fn outcomes(&self) -> Vec<&Outcome> {
        self.records.iter().map(|r| &r.outcome).collect()
    }

    /// The record that aborted the run, if any.
    pub fn fatal(&self) -> Option<&ProvisionRecord> {
        self.records.iter().find(|r| r.outcome.is_fatal())
    }

    pub fn counts(&self) -> OutcomeCounts {
        let mut counts = OutcomeCounts::default();
        for record in &self.records {
            match record.outcome {
                Outcome::Created => counts.created += 1,
                Outcome::PasswordUpdated => counts.password_updated += 1,
                Outcome::Skipped { .. } => counts.skipped += 1,
                Outcome::Fatal { .. } => counts.fatal += 1,
            }
        }
        counts
    }
}

/// Ensures application users exist with their configured passwords.
pub struct Provisioner<'a, D: ?Sized> {
    admin: &'a D,
    allow_empty_credentials: bool,
}

impl<'a, D: DatabaseAdmin + ?Sized> Provisioner<'a, D> {
    pub fn new(admin: &'a D) -> Self {
        Self {
            admin,
            allow_empty_credentials: false,
        }
    }

    /// Accept an empty string as a password. Off by default, so an empty
    /// variable is treated the same as an unset one.
    pub fn allow_empty_credentials(mut self, allow: bool) -> Self {
        self.allow_empty_credentials = allow;
        self
    }

    /// Look up the password for `entry`.
    pub fn resolve_credential<E: EnvSource + ?Sized>(
        &self,
        env: &E,
        entry: &ProvisionEntry,
    ) -> Option<Credential> {
        env.var(entry.credential_source_key())
            .filter(|value| self.allow_empty_credentials || !value.is_empty())
            .map(Credential::new)
    }

    /// Provision `entries` one at a time, stopping at the first fatal outcome.
    pub async fn run<E: EnvSource + ?Sized>(
        &self,
        entries: &[ProvisionEntry],
        env: &E,
    ) -> ProvisionReport {
        let mut records = Vec::with_capacity(entries.len());

        for entry in entries {
            let outcome = self.provision(entry, env).await;
            log_outcome(entry, &outcome);

            let fatal = outcome.is_fatal();
            records.push(ProvisionRecord {
                entry: entry.clone(),
                outcome,
            });

            if fatal {
                return ProvisionReport {
                    records,
                    status: RunStatus::Aborted,
                };
            }
        }

        ProvisionReport {
            records,
            status: RunStatus::Completed,
        }
    }

    async fn provision<E: EnvSource + ?Sized>(&self, entry: &ProvisionEntry, env: &E) -> Outcome {
        let Some(credential) = self.resolve_credential(env, entry) else {
            return Outcome::Skipped {
                reason: SkipReason::MissingCredential,
            };
        };

        let database = entry.database_name();
        let username = entry.username();
        let roles = [RoleGrant::read_write(database)];

        match self.admin.create_user(database, username, &credential, &roles).await {
            Ok(()) => Outcome::Created,
            Err(e) if e.is_already_exists() => {
                match self.admin.update_user(database, username, &credential).await {
                    Ok(()) => Outcome::PasswordUpdated,
                    Err(e) => Outcome::Fatal {
                        error: format!("password update failed: {}", e),
                    },
                }
            }
            Err(e) => Outcome::Fatal {
                error: e.to_string(),
            },
        }
    }
}

fn log_outcome(entry: &ProvisionEntry, outcome: &Outcome) {
    let database = entry.database_name();
    let user = entry.username();

    match outcome {
        Outcome::Created => info!(database, user, "Created user {} for {}", user, database),
        Outcome::PasswordUpdated => info!(
            database,
            user,
            "User {} already exists in {}, updated password", user, database
        ),
        Outcome::Skipped { reason } => warn!(
            database,
            user,
            reason = %reason,
            "Environment variable {} missing, skipping provisioning for {}",
            entry.credential_source_key(),
            database
        ),
        Outcome::Fatal { error } => error!(
            database,
            user,
            error = %error,
            "Failed to provision {} for {}, aborting", user, database
        ),
    }
}
