//! Service layer orchestrating database mutations with the audit trail.
//!
//! `LimsService` wraps `LimsDb` and the actor name recorded on audit entries.
//! All domain operations are implemented as `impl LimsService` blocks in
//! [`crate::repos`].

use crate::LimsDb;
use crate::error::DatabaseError;

/// Actor used when none is configured.
pub const DEFAULT_ACTOR: &str = "lims";

/// Orchestrates database mutations with audit trail.
///
/// Every mutation method follows this protocol:
/// 1. Validate input and current state
/// 2. Execute SQL (inside a transaction when more than one row changes)
/// 3. Append an audit entry attributed to [`Self::actor`]
pub struct LimsService {
    db: LimsDb,
    actor: String,
}

impl LimsService {
    /// Open a local database and wrap it.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or migrated.
    pub async fn new_local(db_path: &str, actor: impl Into<String>) -> Result<Self, DatabaseError> {
        let db = LimsDb::open_local(db_path).await?;
        Ok(Self::from_db(db, actor))
    }

    #[must_use]
    pub fn from_db(db: LimsDb, actor: impl Into<String>) -> Self {
        Self {
            db,
            actor: actor.into(),
        }
    }

    /// Access the underlying database handle.
    #[must_use]
    pub const fn db(&self) -> &LimsDb {
        &self.db
    }

    /// Name recorded on audit entries written by this service.
    #[must_use]
    pub fn actor(&self) -> &str {
        &self.actor
    }

    /// Return a service that attributes audit entries to `actor`.
    #[must_use]
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = actor.into();
        self
    }
}
