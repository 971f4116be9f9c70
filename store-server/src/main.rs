//! Maintenance entrypoint for the workflow core
//!
//! The storefront and back office drive this crate as a library; this
//! binary covers the operational chores: opening (and thereby creating)
//! the database, sweeping stale verification codes, and reporting what is
//! in flight.

use anyhow::Result;
use std::path::Path;
use store_server::{
    ApplicationService, Config, CoreStorage, VerificationCodeService, WorkflowState,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    std::fs::create_dir_all(&config.work_dir)?;
    let db_path = Path::new(&config.work_dir).join("core.redb");
    tracing::info!(path = %db_path.display(), environment = %config.environment, "Opening workflow core storage");
    let storage = CoreStorage::open(&db_path)?;

    let verification = VerificationCodeService::with_limits(
        storage.clone(),
        config.otp_ttl_minutes,
        config.otp_max_attempts,
    );
    let swept = verification.sweep_expired()?;
    tracing::info!(swept, "Verification code sweep finished");

    let applications = ApplicationService::new(storage);
    let pending = applications
        .list()?
        .iter()
        .filter(|r| !r.status.is_terminal())
        .count();
    tracing::info!(pending_applications = pending, "Workflow core healthy");

    Ok(())
}
