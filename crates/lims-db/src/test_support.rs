//! Shared test utilities for lims-db unit tests.

pub(crate) mod helpers {
    use crate::LimsDb;
    use crate::service::LimsService;

    /// Create an in-memory service attributed to actor `test`.
    pub async fn test_service() -> LimsService {
        let db = LimsDb::open_local(":memory:").await.unwrap();
        LimsService::from_db(db, "test")
    }
}
