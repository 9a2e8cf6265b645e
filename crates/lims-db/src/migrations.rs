//! Versioned migration registry and runner.
//!
//! SQL files are embedded at compile time. Applied versions are recorded in
//! `schema_migrations`; each pending migration runs in its own transaction.
//! A database stamped with a newer version than this binary knows is rejected.

use chrono::Utc;

use crate::LimsDb;
use crate::error::DatabaseError;
use crate::helpers::to_db_time;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "001_initial",
        sql: include_str!("../migrations/001_initial.sql"),
    },
    Migration {
        version: 2,
        name: "002_seed_lookups",
        sql: include_str!("../migrations/002_seed_lookups.sql"),
    },
];

const CREATE_SCHEMA_MIGRATIONS: &str = "CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL
)";

/// The latest migration version known by this binary.
#[must_use]
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

impl LimsDb {
    /// Apply all pending migrations in order.
    pub(crate) async fn run_migrations(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute(CREATE_SCHEMA_MIGRATIONS, ())
            .await
            .map_err(|e| DatabaseError::Migration(format!("schema_migrations: {e}")))?;

        let current = self.schema_version().await?;
        let latest = latest_version();
        if current > latest {
            return Err(DatabaseError::Migration(format!(
                "database schema version {current} is newer than supported version {latest}"
            )));
        }

        for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
            self.begin().await?;
            let applied = self.apply(migration).await;
            self.finish(applied).await?;
            tracing::debug!(version = migration.version, name = migration.name, "applied migration");
        }
        Ok(())
    }

    async fn apply(&self, migration: &Migration) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(migration.sql)
            .await
            .map_err(|e| DatabaseError::Migration(format!("{}: {e}", migration.name)))?;
        self.conn
            .execute(
                "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
                libsql::params![i64::from(migration.version), migration.name, to_db_time(Utc::now())],
            )
            .await
            .map_err(|e| DatabaseError::Migration(format!("{}: {e}", migration.name)))?;
        Ok(())
    }

    /// Highest applied migration version, or 0 for a fresh database.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the version table cannot be read.
    pub async fn schema_version(&self) -> Result<u32, DatabaseError> {
        let mut rows = self
            .conn
            .query("SELECT COALESCE(MAX(version), 0) FROM schema_migrations", ())
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        crate::helpers::get_u32(&row, 0)
    }
}
