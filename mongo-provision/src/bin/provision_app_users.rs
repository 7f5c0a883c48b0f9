//! Application user provisioning
//!
//! Ensures every application database has its user with `readWrite` access
//! and the password from the matching environment variable. Entries whose
//! variable is unset are skipped. Re-running resets passwords of existing
//! users. Exits non-zero if any entry fails for another reason.

use common::{init_logging, ProcessEnv};
use mongo_provision::{Config, MongoAdmin, Provisioner};
use std::time::Instant;
use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let _guard = init_logging("provision-app-users");

    let start = Instant::now();
    info!("Provisioning application users...");

    let config = match Config::from_env(&ProcessEnv) {
        Ok(c) => c,
        Err(e) => {
            error!(error = %format!("{:#}", e), "Invalid configuration");
            std::process::exit(1);
        }
    };

    let entries = match config.load_entries() {
        Ok(entries) => entries,
        Err(e) => {
            error!(error = %format!("{:#}", e), "Failed to load provisioning entries");
            std::process::exit(1);
        }
    };

    let admin = match MongoAdmin::connect(&config.mongo).await {
        Ok(admin) => admin,
        Err(e) => {
            error!(error = %format!("{:#}", e), "Failed to set up MongoDB client");
            std::process::exit(1);
        }
    };

    info!(entries = entries.len(), "Provisioning users");

    let report = Provisioner::new(&admin)
        .allow_empty_credentials(config.allow_empty_credentials)
        .run(&entries, &ProcessEnv)
        .await;

    let counts = report.counts();
    let duration_ms = start.elapsed().as_millis() as u64;

    if !report.is_success() {
        error!(
            created = counts.created,
            password_updated = counts.password_updated,
            skipped = counts.skipped,
            not_processed = entries.len() - report.records.len(),
            duration_ms,
            "Provisioning aborted"
        );
        std::process::exit(1);
    }

    info!(
        created = counts.created,
        password_updated = counts.password_updated,
        skipped = counts.skipped,
        duration_ms,
        "Provisioning completed"
    );
}
