use std::sync::Arc;
use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

use crate::config::PlanTable;
use crate::dict::DictIndex;
use crate::error::Result;
use crate::metrics::Metrics;

pub mod from_row;
pub mod queries;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Shared per-process state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub plans: PlanTable,
    /// Immutable content index snapshot, built once at startup.
    pub dict: Arc<DictIndex>,
    pub metrics: Arc<Metrics>,
    pub admin_token_hash: Option<String>,
    pub generate_code_limit: i64,
    pub request_timeout: Duration,
}

/// Open a pooled connection set to the file at `path`.
///
/// Every connection gets WAL journaling, foreign keys, and a busy timeout
/// long enough to ride out concurrent write transactions.
pub fn new_pool(path: &str, max_size: u32) -> Result<DbPool> {
    let manager = SqliteConnectionManager::file(path).with_init(|conn| {
        conn.busy_timeout(Duration::from_secs(10))?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.query_row("PRAGMA journal_mode=WAL", [], |_row| Ok(()))?;
        Ok(())
    });
    Pool::builder()
        .max_size(max_size)
        .build(manager)
        .map_err(Into::into)
}

/// Create the schema. Idempotent; run once at startup.
///
/// Uniqueness of `code` and `device_id` is enforced here by primary keys,
/// not by application-level locking: concurrent redemption races resolve
/// via constraint rejection.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS codes (
            code        TEXT PRIMARY KEY,
            plan        TEXT NOT NULL,
            redeemed_by TEXT,
            created_at  TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_codes_redeemed_by ON codes(redeemed_by);

        CREATE TABLE IF NOT EXISTS devices (
            device_id       TEXT PRIMARY KEY,
            activation_code TEXT NOT NULL,
            plan            TEXT NOT NULL,
            activated_at    TEXT NOT NULL,
            expires_at      TEXT NOT NULL,
            FOREIGN KEY (activation_code) REFERENCES codes (code)
        );

        CREATE TABLE IF NOT EXISTS dictionary (
            glyph TEXT PRIMARY KEY,
            data  TEXT NOT NULL
        );",
    )?;
    Ok(())
}
