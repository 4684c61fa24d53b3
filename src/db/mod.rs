pub mod models;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use std::path::Path;

use crate::state::DbPool;

pub const MIGRATIONS: &[(&str, &str)] = &[
    (
        "001_initial",
        include_str!("../../migrations/001_initial.sql"),
    ),
    (
        "002_unique_likes",
        include_str!("../../migrations/002_unique_likes.sql"),
    ),
];

/// Tables in reverse dependency order, for `drop_all`.
const TABLES: &[&str] = &[
    "sessions",
    "likes",
    "follows",
    "messages",
    "users",
    "schema_version",
];

/// Errors from the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("SQL error: {0}")]
    Sql(rusqlite::Error),

    /// A UNIQUE, FOREIGN KEY or CHECK constraint rejected the write.
    #[error("Integrity error: {0}")]
    Integrity(String),

    #[error("Not found")]
    NotFound,
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(code, msg) = &err {
            if code.code == rusqlite::ErrorCode::ConstraintViolation {
                return StoreError::Integrity(msg.clone().unwrap_or_else(|| code.to_string()));
            }
        }
        match err {
            rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
            other => StoreError::Sql(other),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

fn manager_init(conn: &mut rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "
        PRAGMA foreign_keys = ON;
        PRAGMA busy_timeout = 5000;
        ",
    )
}

pub fn create_pool(db_path: &Path) -> anyhow::Result<DbPool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let manager = SqliteConnectionManager::file(db_path).with_init(manager_init);
    let pool = Pool::builder().max_size(8).build(manager)?;

    let conn = pool.get()?;
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        ",
    )?;

    Ok(pool)
}

/// Single-connection in-memory pool. Every pooled connection to `:memory:`
/// is its own database, so the pool is capped at one.
pub fn memory_pool() -> anyhow::Result<DbPool> {
    let manager = SqliteConnectionManager::memory().with_init(manager_init);
    let pool = Pool::builder().max_size(1).build(manager)?;
    Ok(pool)
}

/// Apply pending migrations. This is the schema's `create_all`.
pub fn run_migrations(pool: &DbPool) -> anyhow::Result<()> {
    let conn = pool.get()?;

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    for (name, sql) in MIGRATIONS {
        let already_applied: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM schema_version WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;

        if !already_applied {
            tracing::info!("Applying migration: {}", name);
            conn.execute_batch(sql)?;
            conn.execute(
                "INSERT INTO schema_version (name) VALUES (?1)",
                params![name],
            )?;
        }
    }

    tracing::info!("Database migrations complete");
    Ok(())
}

/// Drop every table, migration history included. Pair with
/// `run_migrations` to start from an empty schema.
pub fn drop_all(pool: &DbPool) -> anyhow::Result<()> {
    let conn = pool.get()?;
    for table in TABLES {
        conn.execute_batch(&format!("DROP TABLE IF EXISTS {table};"))?;
    }
    tracing::info!("Dropped all tables");
    Ok(())
}
