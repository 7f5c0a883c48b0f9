//! Provisioner configuration from environment variables

use crate::admin::Credential;
use crate::entry::{default_entries, load_entries, ProvisionEntry};
use crate::mongo::MongoSettings;
use anyhow::{bail, Result};
use common::{EnvSource, EnvSourceExt};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_MONGO_URI: &str = "mongodb://localhost:27017";
pub const APP_NAME: &str = "provision-app-users";

/// Where the entry list comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntrySource {
    BuiltIn,
    File(PathBuf),
}

/// Configuration for a provisioning run
#[derive(Debug, Clone)]
pub struct Config {
    pub mongo: MongoSettings,
    pub entries: EntrySource,
    pub allow_empty_credentials: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env<E: EnvSource + ?Sized>(env: &E) -> Result<Self> {
        let root_user = env.var_non_empty("MONGO_INITDB_ROOT_USERNAME");
        let root_pass = env.var_non_empty("MONGO_INITDB_ROOT_PASSWORD");
        let root_credential = match (root_user, root_pass) {
            (Some(user), Some(pass)) => Some((user, Credential::new(pass))),
            (None, None) => None,
            _ => bail!(
                "MONGO_INITDB_ROOT_USERNAME and MONGO_INITDB_ROOT_PASSWORD must be set together"
            ),
        };

        let entries = match env.var_non_empty("PROVISION_ENTRIES_FILE") {
            Some(path) => EntrySource::File(PathBuf::from(path)),
            None => EntrySource::BuiltIn,
        };

        Ok(Self {
            mongo: MongoSettings {
                uri: env.var_or("MONGO_URI", DEFAULT_MONGO_URI),
                app_name: APP_NAME.to_string(),
                root_credential,
                connect_timeout: secs(env, "MONGO_CONNECT_TIMEOUT_SECS", 10),
                server_selection_timeout: secs(env, "MONGO_SERVER_SELECTION_TIMEOUT_SECS", 10),
                command_timeout: secs(env, "MONGO_COMMAND_TIMEOUT_SECS", 30),
            },
            entries,
            allow_empty_credentials: env.var_flag("PROVISION_ALLOW_EMPTY_PASSWORD", false),
        })
    }

    /// Resolve the entry list to provision
    pub fn load_entries(&self) -> Result<Vec<ProvisionEntry>> {
        match &self.entries {
            EntrySource::BuiltIn => Ok(default_entries()),
            EntrySource::File(path) => load_entries(path),
        }
    }
}

fn secs<E: EnvSource + ?Sized>(env: &E, key: &str, default: u64) -> Duration {
    Duration::from_secs(env.var_parse(key, default))
}
