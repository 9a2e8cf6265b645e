//! # lims-db
//!
//! libSQL storage for the LIMS: inventory, transfers, workflow runs, projects,
//! CRM mirror, equipment, pricing, accounts, and the audit trail.
//!
//! `LimsDb` owns the connection and schema; `LimsService` carries every domain
//! operation as `impl LimsService` blocks under [`repos`]. The deadline job and
//! the notification seam live here too, so the CLI and the scheduler share one
//! code path.

pub mod error;
pub mod helpers;
pub mod migrations;
pub mod notify;
pub mod repos;
pub mod service;
pub mod updates;

#[cfg(test)]
mod test_support;

use error::DatabaseError;
use libsql::Builder;

/// Central database handle.
///
/// Wraps a libSQL database and connection. Provides ID generation and
/// explicit transaction control for multi-row mutations.
pub struct LimsDb {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
}

impl LimsDb {
    /// Open a local database at the given path (`":memory:"` for tests).
    ///
    /// Runs pending migrations on open.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or
    /// migrations fail.
    pub async fn open_local(path: &str) -> Result<Self, DatabaseError> {
        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;

        // Enable foreign keys (must be per-connection in SQLite)
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| DatabaseError::Migration(format!("PRAGMA foreign_keys: {e}")))?;

        let lims_db = Self { db, conn };
        lims_db.run_migrations().await?;
        Ok(lims_db)
    }

    /// Access the underlying libSQL connection for direct queries.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }

    /// Generate a prefixed ID via libSQL. Returns e.g. `"itm-a3f8b2c1"`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or returns no rows.
    pub async fn generate_id(&self, prefix: &str) -> Result<String, DatabaseError> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT '{prefix}-' || lower(hex(randomblob(4)))"),
                (),
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(row.get::<String>(0)?)
    }

    /// Open a write transaction on the shared connection.
    ///
    /// Everything executed through [`Self::conn`] until [`Self::finish`] is
    /// part of the transaction.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if a transaction is already open or the lock
    /// cannot be taken.
    pub async fn begin(&self) -> Result<(), DatabaseError> {
        self.conn.execute("BEGIN IMMEDIATE", ()).await?;
        Ok(())
    }

    /// Commit when `result` is `Ok`, roll back otherwise, and pass it through.
    ///
    /// # Errors
    ///
    /// Returns the original error, or the commit error if committing fails.
    pub async fn finish<T>(&self, result: Result<T, DatabaseError>) -> Result<T, DatabaseError> {
        match result {
            Ok(value) => {
                self.conn.execute("COMMIT", ()).await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback) = self.conn.execute("ROLLBACK", ()).await {
                    tracing::warn!(error = %rollback, "rollback failed");
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    async fn test_db() -> LimsDb {
        LimsDb::open_local(":memory:").await.unwrap()
    }

    async fn table_exists(db: &LimsDb, table: &str) -> bool {
        let mut rows = db
            .conn()
            .query(
                "SELECT name FROM sqlite_master WHERE type='table' AND name=?1",
                [table],
            )
            .await
            .unwrap();
        rows.next().await.unwrap().is_some()
    }

    #[tokio::test]
    async fn open_local_creates_schema() {
        let db = test_db().await;
        let tables = [
            "users",
            "groups",
            "group_permissions",
            "user_groups",
            "amount_measures",
            "item_types",
            "locations",
            "inventory_sets",
            "items",
            "set_items",
            "item_transfers",
            "equipment",
            "equipment_reservations",
            "task_templates",
            "task_input_fields",
            "task_template_equipment",
            "workflows",
            "workflow_tasks",
            "product_statuses",
            "projects",
            "products",
            "project_links",
            "product_attachments",
            "crm_accounts",
            "crm_projects",
            "crm_quotes",
            "runs",
            "run_tasks",
            "run_products",
            "data_entries",
            "data_files",
            "prices",
            "audit_trail",
            "schema_migrations",
        ];
        for table in tables {
            assert!(table_exists(&db, table).await, "table '{table}' should exist");
        }
    }

    #[tokio::test]
    async fn migrations_are_recorded_once() {
        let db = test_db().await;
        assert_eq!(db.schema_version().await.unwrap(), migrations::latest_version());

        db.run_migrations().await.unwrap();
        let mut rows = db
            .conn()
            .query("SELECT COUNT(*) FROM schema_migrations", ())
            .await
            .unwrap();
        let count: i64 = rows.next().await.unwrap().unwrap().get(0).unwrap();
        assert_eq!(count, i64::from(migrations::latest_version()));
    }

    #[tokio::test]
    async fn reopening_file_database_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lims.db");
        let path = path.to_str().unwrap();

        {
            let db = LimsDb::open_local(path).await.unwrap();
            db.conn()
                .execute(
                    "INSERT INTO item_types (id, name, created_at) VALUES ('ityp-1', 'Reagent', '2026-01-01T00:00:00Z')",
                    (),
                )
                .await
                .unwrap();
        }

        let db = LimsDb::open_local(path).await.unwrap();
        let mut rows = db
            .conn()
            .query("SELECT COUNT(*) FROM product_statuses", ())
            .await
            .unwrap();
        let statuses: i64 = rows.next().await.unwrap().unwrap().get(0).unwrap();
        assert_eq!(statuses, 4);

        let mut rows = db.conn().query("SELECT COUNT(*) FROM item_types", ()).await.unwrap();
        let types: i64 = rows.next().await.unwrap().unwrap().get(0).unwrap();
        assert_eq!(types, 1);
    }

    #[tokio::test]
    async fn newer_schema_is_rejected() {
        let db = test_db().await;
        db.conn()
            .execute(
                "INSERT INTO schema_migrations (version, name, applied_at) VALUES (999, 'future', '2030-01-01T00:00:00Z')",
                (),
            )
            .await
            .unwrap();
        let err = db.run_migrations().await.unwrap_err();
        assert!(matches!(err, DatabaseError::Migration(_)));
    }

    #[tokio::test]
    async fn generate_id_correct_format() {
        let db = test_db().await;
        let id = db.generate_id("itm").await.unwrap();
        assert!(id.starts_with("itm-"));
        let hex_part = &id[4..];
        assert_eq!(hex_part.len(), 8);
        assert!(hex_part.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn generate_id_all_prefixes() {
        let db = test_db().await;
        for prefix in lims_core::ids::ALL_PREFIXES {
            let id = db.generate_id(prefix).await.unwrap();
            assert!(id.starts_with(&format!("{prefix}-")));
        }
    }

    #[tokio::test]
    async fn generate_id_uniqueness() {
        let db = test_db().await;
        let mut ids = HashSet::new();
        for _ in 0..200 {
            assert!(ids.insert(db.generate_id("tst").await.unwrap()));
        }
    }

    #[tokio::test]
    async fn failed_transaction_rolls_back() {
        let db = test_db().await;
        db.begin().await.unwrap();
        let result: Result<(), DatabaseError> = async {
            db.conn()
                .execute(
                    "INSERT INTO item_types (id, name, created_at) VALUES ('ityp-1', 'Reagent', '2026-01-01T00:00:00Z')",
                    (),
                )
                .await?;
            Err(DatabaseError::Validation("abort".into()))
        }
        .await;
        assert!(db.finish(result).await.is_err());

        let mut rows = db.conn().query("SELECT COUNT(*) FROM item_types", ()).await.unwrap();
        let count: i64 = rows.next().await.unwrap().unwrap().get(0).unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn transfer_complete_requires_taken_at_schema_level() {
        let db = test_db().await;
        db.conn()
            .execute(
                "INSERT INTO item_types (id, name, created_at) VALUES ('ityp-1', 'Reagent', '2026-01-01T00:00:00Z')",
                (),
            )
            .await
            .unwrap();
        db.conn()
            .execute(
                "INSERT INTO items (id, name, identifier, item_type_id, amount_available, created_at, updated_at)
                 VALUES ('itm-1', 'Tris', 'TRIS-1', 'ityp-1', 5, '2026-01-01T00:00:00Z', '2026-01-01T00:00:00Z')",
                (),
            )
            .await
            .unwrap();
        let result = db
            .conn()
            .execute(
                "INSERT INTO item_transfers (id, item_id, amount_to_take, amount_available, has_taken, transfer_complete, created_at, updated_at)
                 VALUES ('xfr-1', 'itm-1', 1, 5, 0, 1, '2026-01-01T00:00:00Z', '2026-01-01T00:00:00Z')",
                (),
            )
            .await;
        assert!(result.is_err());
    }
}
