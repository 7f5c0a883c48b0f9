//! MongoDB implementation of [`DatabaseAdmin`]
//!
//! Users are managed with the `createUser` / `updateUser` database commands,
//! run against the database the user belongs to.

use crate::admin::{AdminError, Credential, DatabaseAdmin, RoleGrant};
use anyhow::{Context, Result};
use async_trait::async_trait;
use mongodb::bson::{doc, Document};
use mongodb::error::ErrorKind;
use mongodb::options::ClientOptions;
use mongodb::Client;
use std::future::IntoFuture;
use std::time::Duration;
use tracing::{debug, instrument};

/// "User already exists" on current servers
const USER_ALREADY_EXISTS: i32 = 51003;
/// Older servers report a duplicate user as a duplicate key
const DUPLICATE_KEY: i32 = 11000;

/// Connection settings for [`MongoAdmin`].
#[derive(Debug, Clone)]
pub struct MongoSettings {
    pub uri: String,
    pub app_name: String,
    /// Root user and password, authenticated against `admin`
    pub root_credential: Option<(String, Credential)>,
    pub connect_timeout: Duration,
    pub server_selection_timeout: Duration,
    pub command_timeout: Duration,
}

/// User administration over a MongoDB client.
pub struct MongoAdmin {
    client: Client,
    command_timeout: Duration,
}

impl MongoAdmin {
    /// Build a client from `settings`.
    ///
    /// The driver connects lazily; the first command surfaces any
    /// connectivity problem.
    pub async fn connect(settings: &MongoSettings) -> Result<Self> {
        let mut options = ClientOptions::parse(&settings.uri)
            .await
            .context("Failed to parse MongoDB connection string")?;

        options.app_name = Some(settings.app_name.clone());
        options.connect_timeout = Some(settings.connect_timeout);
        options.server_selection_timeout = Some(settings.server_selection_timeout);

        if let Some((username, password)) = &settings.root_credential {
            let mut credential = mongodb::options::Credential::default();
            credential.username = Some(username.clone());
            credential.password = Some(password.expose().to_string());
            credential.source = Some("admin".to_string());
            options.credential = Some(credential);
        }

        let client = Client::with_options(options).context("Failed to create MongoDB client")?;

        Ok(Self {
            client,
            command_timeout: settings.command_timeout,
        })
    }

    async fn run_command(
        &self,
        operation: &'static str,
        database: &str,
        command: Document,
    ) -> Result<Document, AdminError> {
        let db = self.client.database(database);

        let reply = db.run_command(command).into_future();

        match tokio::time::timeout(self.command_timeout, reply).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(e)) => Err(AdminError::other(e)),
            Err(_) => Err(AdminError::Timeout {
                operation,
                timeout: self.command_timeout,
            }),
        }
    }
}

/// Check if a MongoDB error means the user is already defined
fn is_user_exists_error(error: &AdminError) -> bool {
    let AdminError::Other(source) = error else {
        return false;
    };
    let Some(error) = source.downcast_ref::<mongodb::error::Error>() else {
        return false;
    };

    match error.kind.as_ref() {
        ErrorKind::Command(command_error) => {
            is_user_exists_code(command_error.code, &command_error.code_name)
        }
        _ => false,
    }
}

fn is_user_exists_code(code: i32, code_name: &str) -> bool {
    code == USER_ALREADY_EXISTS || code == DUPLICATE_KEY || code_name == "DuplicateKey"
}

fn create_user_command(username: &str, password: &Credential, roles: &[RoleGrant]) -> Document {
    let roles: Vec<Document> = roles
        .iter()
        .map(|grant| doc! { "role": grant.role.as_str(), "db": grant.db.as_str() })
        .collect();

    doc! {
        "createUser": username,
        "pwd": password.expose(),
        "roles": roles,
    }
}

fn update_user_command(username: &str, password: &Credential) -> Document {
    doc! {
        "updateUser": username,
        "pwd": password.expose(),
    }
}

#[async_trait]
impl DatabaseAdmin for MongoAdmin {
    #[instrument(skip_all, fields(database = %database, user = %username))]
    async fn create_user(
        &self,
        database: &str,
        username: &str,
        password: &Credential,
        roles: &[RoleGrant],
    ) -> Result<(), AdminError> {
        debug!(roles = ?roles, "Running createUser");

        let command = create_user_command(username, password, roles);
        match self.run_command("createUser", database, command).await {
            Ok(_) => Ok(()),
            Err(e) if is_user_exists_error(&e) => Err(AdminError::AlreadyExists {
                database: database.to_string(),
                username: username.to_string(),
            }),
            Err(e) => Err(e),
        }
    }

    #[instrument(skip_all, fields(database = %database, user = %username))]
    async fn update_user(
        &self,
        database: &str,
        username: &str,
        password: &Credential,
    ) -> Result<(), AdminError> {
        debug!("Running updateUser");

        let command = update_user_command(username, password);
        self.run_command("updateUser", database, command).await?;
        Ok(())
    }
}
