//! Provisioning entries
//!
//! An entry names a target database, the user to ensure in it, and the
//! environment variable holding that user's password.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

/// One user to provision. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProvisionEntry {
    #[serde(alias = "dbName")]
    database_name: String,
    #[serde(alias = "user")]
    username: String,
    #[serde(alias = "passEnv")]
    credential_source_key: String,
}

impl ProvisionEntry {
    pub fn new(
        database_name: impl Into<String>,
        username: impl Into<String>,
        credential_source_key: impl Into<String>,
    ) -> Self {
        Self {
            database_name: database_name.into(),
            username: username.into(),
            credential_source_key: credential_source_key.into(),
        }
    }

    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Environment variable the password is read from.
    pub fn credential_source_key(&self) -> &str {
        &self.credential_source_key
    }
}

impl fmt::Display for ProvisionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.username, self.database_name)
    }
}

/// The built-in application databases, in provisioning order.
pub fn default_entries() -> Vec<ProvisionEntry> {
    [
        ("db_auth", "auth_user", "AUTH_DB_PASS"),
        ("db_sms", "sms_user", "SMS_DB_PASS"),
        ("db_shop", "shop_user", "SHOP_DB_PASS"),
        ("db_laydi", "laydi_user", "LAYDI_DB_PASS"),
        ("db_core", "core_user", "CORE_DB_PASS"),
        ("db_image", "image_user", "IMAGE_DB_PASS"),
        ("db_gnh", "gnh_user", "GNH_DB_PASS"),
        ("db_sheet_sync", "sheet_sync_user", "SHEET_SYNC_DB_PASS"),
    ]
    .into_iter()
    .map(|(db, user, key)| ProvisionEntry::new(db, user, key))
    .collect()
}

/// Parse an ordered entry list from YAML (JSON is accepted as well).
pub fn parse_entries(text: &str) -> Result<Vec<ProvisionEntry>> {
    let entries: Vec<ProvisionEntry> =
        serde_yaml::from_str(text).context("Failed to parse provisioning entries")?;
    validate(&entries)?;
    Ok(entries)
}

/// Read and parse an entry list file.
pub fn load_entries(path: &Path) -> Result<Vec<ProvisionEntry>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read entries file {}", path.display()))?;
    parse_entries(&content).with_context(|| format!("Invalid entries file {}", path.display()))
}

/// Reject blank fields and repeated database/user pairs.
pub fn validate(entries: &[ProvisionEntry]) -> Result<()> {
    let mut seen = HashSet::new();

    for (index, entry) in entries.iter().enumerate() {
        let fields = [
            ("databaseName", entry.database_name()),
            ("username", entry.username()),
            ("credentialSourceKey", entry.credential_source_key()),
        ];
        for (name, value) in fields {
            if value.trim().is_empty() {
                bail!("Entry {} has an empty {}", index + 1, name);
            }
        }

        if !seen.insert((entry.database_name(), entry.username())) {
            bail!("Entry {} duplicates {}", index + 1, entry);
        }
    }

    Ok(())
}
