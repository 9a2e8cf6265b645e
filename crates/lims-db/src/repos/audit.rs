//! Audit trail repository.
//!
//! Append-only audit entries recording every mutation, with dynamic filtering.

use lims_core::entities::AuditEntry;
use lims_core::enums::{AuditAction, EntityType};
use lims_core::ids::PREFIX_AUDIT;

use crate::error::DatabaseError;
use crate::helpers::{db_now, get_datetime, get_opt_string, parse_enum, parse_optional_json, to_db_time};
use crate::service::LimsService;

const SELECT_COLS: &str = "id, actor, entity_type, entity_id, action, detail, created_at";

/// Filter criteria for audit queries.
#[derive(Debug, Default)]
pub struct AuditFilter {
    pub entity_type: Option<EntityType>,
    pub entity_id: Option<String>,
    pub action: Option<AuditAction>,
    pub actor: Option<String>,
    pub limit: Option<u32>,
}

fn row_to_audit(row: &libsql::Row) -> Result<AuditEntry, DatabaseError> {
    Ok(AuditEntry {
        id: row.get::<String>(0)?,
        actor: get_opt_string(row, 1)?,
        entity_type: parse_enum(&row.get::<String>(2)?)?,
        entity_id: row.get::<String>(3)?,
        action: parse_enum(&row.get::<String>(4)?)?,
        detail: parse_optional_json(get_opt_string(row, 5)?.as_deref())?,
        created_at: get_datetime(row, 6)?,
    })
}

impl LimsService {
    /// Append an audit entry.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the INSERT fails.
    pub async fn append_audit(&self, entry: &AuditEntry) -> Result<(), DatabaseError> {
        self.db()
            .conn()
            .execute(
                &format!("INSERT INTO audit_trail ({SELECT_COLS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"),
                libsql::params![
                    entry.id.as_str(),
                    entry.actor.as_deref(),
                    entry.entity_type.as_str(),
                    entry.entity_id.as_str(),
                    entry.action.as_str(),
                    entry.detail.as_ref().map(std::string::ToString::to_string),
                    to_db_time(entry.created_at)
                ],
            )
            .await?;
        Ok(())
    }

    /// Record a mutation by this service's actor. Called by every mutation method.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if ID generation or the INSERT fails.
    pub async fn record(
        &self,
        entity_type: EntityType,
        entity_id: &str,
        action: AuditAction,
        detail: Option<serde_json::Value>,
    ) -> Result<(), DatabaseError> {
        let id = self.db().generate_id(PREFIX_AUDIT).await?;
        self.append_audit(&AuditEntry {
            id,
            actor: Some(self.actor().to_string()),
            entity_type,
            entity_id: entity_id.to_string(),
            action,
            detail,
            created_at: db_now(),
        })
        .await
    }

    /// Query audit entries with optional filters, newest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn query_audit(&self, filter: &AuditFilter) -> Result<Vec<AuditEntry>, DatabaseError> {
        let mut conditions = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();

        if let Some(et) = filter.entity_type {
            params.push(libsql::Value::Text(et.as_str().to_string()));
            conditions.push(format!("entity_type = ?{}", params.len()));
        }
        if let Some(ref eid) = filter.entity_id {
            params.push(libsql::Value::Text(eid.clone()));
            conditions.push(format!("entity_id = ?{}", params.len()));
        }
        if let Some(action) = filter.action {
            params.push(libsql::Value::Text(action.as_str().to_string()));
            conditions.push(format!("action = ?{}", params.len()));
        }
        if let Some(ref actor) = filter.actor {
            params.push(libsql::Value::Text(actor.clone()));
            conditions.push(format!("actor = ?{}", params.len()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let limit = filter.limit.unwrap_or(100);
        let sql = format!(
            "SELECT {SELECT_COLS} FROM audit_trail {where_clause}
             ORDER BY created_at DESC, rowid DESC LIMIT {limit}"
        );

        let mut rows = self
            .db()
            .conn()
            .query(&sql, libsql::params_from_iter(params))
            .await?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            entries.push(row_to_audit(&row)?);
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::test_service;

    #[tokio::test]
    async fn record_and_filter() {
        let svc = test_service().await;
        svc.record(EntityType::Item, "itm-1", AuditAction::Created, None)
            .await
            .unwrap();
        svc.record(
            EntityType::Item,
            "itm-1",
            AuditAction::Updated,
            Some(serde_json::json!({"name": "Tris"})),
        )
        .await
        .unwrap();
        svc.record(EntityType::Run, "run-1", AuditAction::Started, None)
            .await
            .unwrap();

        let all = svc.query_audit(&AuditFilter::default()).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].entity_type, EntityType::Run);
        assert_eq!(all[0].actor.as_deref(), Some("test"));

        let item_updates = svc
            .query_audit(&AuditFilter {
                entity_type: Some(EntityType::Item),
                action: Some(AuditAction::Updated),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(item_updates.len(), 1);
        assert_eq!(
            item_updates[0].detail,
            Some(serde_json::json!({"name": "Tris"}))
        );
    }

    #[tokio::test]
    async fn filter_by_actor_and_limit() {
        let svc = test_service().await;
        for i in 0..5 {
            svc.record(EntityType::Item, &format!("itm-{i}"), AuditAction::Created, None)
                .await
                .unwrap();
        }
        let svc = svc.with_actor("deadline-job");
        svc.record(EntityType::Project, "prj-1", AuditAction::StatusChanged, None)
            .await
            .unwrap();

        let by_job = svc
            .query_audit(&AuditFilter {
                actor: Some("deadline-job".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_job.len(), 1);

        let limited = svc
            .query_audit(&AuditFilter {
                limit: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(limited.len(), 2);
    }
}
