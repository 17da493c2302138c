//! Schema bootstrap: embedded migrations under a Postgres advisory lock.
//!
//! Several instances may start concurrently; the advisory lock serialises
//! them so exactly one runs the pending migrations while the others wait.
//! The lock is session-scoped and released explicitly before the bootstrap
//! connection is dropped.

use diesel::pg::PgConnection;
use diesel::{Connection, RunQueryDsl};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tracing::info;

/// Migrations compiled into the binary from `migrations/`.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Application-wide advisory lock key for schema bootstrap.
const BOOTSTRAP_LOCK_KEY: i64 = 0x7469_705f_626f_6f74; // "tip_boot"

/// Errors raised while bootstrapping the schema.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// The bootstrap connection could not be established.
    #[error("failed to connect for schema bootstrap: {0}")]
    Connect(#[from] diesel::ConnectionError),
    /// Taking or releasing the advisory lock failed.
    #[error("advisory lock operation failed: {0}")]
    Lock(diesel::result::Error),
    /// Running the pending migrations failed.
    #[error("running migrations failed: {0}")]
    Migration(String),
}

/// Run all pending migrations, serialised across instances.
///
/// Blocking; call from startup before the async pool is built (or wrap in
/// `spawn_blocking` when already inside the runtime).
pub fn run_schema_bootstrap(database_url: &str) -> Result<(), BootstrapError> {
    let mut conn = PgConnection::establish(database_url)?;

    diesel::sql_query(format!("SELECT pg_advisory_lock({BOOTSTRAP_LOCK_KEY})"))
        .execute(&mut conn)
        .map_err(BootstrapError::Lock)?;

    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map(|versions| versions.iter().map(|v| v.as_owned()).collect::<Vec<_>>())
        .map_err(|err| BootstrapError::Migration(err.to_string()));

    // Release even when migrations failed; the session may be reused.
    let unlock = diesel::sql_query(format!("SELECT pg_advisory_unlock({BOOTSTRAP_LOCK_KEY})"))
        .execute(&mut conn)
        .map_err(BootstrapError::Lock);

    let versions = applied?;
    unlock?;
    info!(applied = versions.len(), "schema bootstrap complete");
    Ok(())
}
