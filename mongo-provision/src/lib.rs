//! MongoDB application-user provisioning
//!
//! Ensures each application database has its user with a `readWrite` grant
//! and the password found in the environment. Safe to re-run: existing users
//! get their password reset instead of failing the run.

pub mod admin;
pub mod config;
pub mod entry;
pub mod mongo;
pub mod provisioner;

pub use admin::{AdminError, Credential, DatabaseAdmin, RoleGrant};
pub use config::Config;
pub use entry::{default_entries, load_entries, parse_entries, ProvisionEntry};
pub use mongo::{MongoAdmin, MongoSettings};
pub use provisioner::{Outcome, ProvisionReport, Provisioner, RunStatus};
