//! CRM mirror: local copies of external accounts, projects, and quotes.
//!
//! Rows are keyed by the external `crm_id`; an upsert inserts a new mirror
//! row or overwrites the existing one. Nothing here talks to a CRM; records
//! arrive through a [`CrmSource`].

use std::future::Future;

use lims_core::audit_detail::SyncedDetail;
use lims_core::entities::{CrmAccount, CrmAccountRecord, CrmProject, CrmQuote};
use lims_core::enums::{AuditAction, EntityType};
use lims_core::errors::require_non_blank;
use lims_core::ids::{PREFIX_CRM_ACCOUNT, PREFIX_CRM_PROJECT, PREFIX_CRM_QUOTE};

use crate::error::DatabaseError;
use crate::helpers::{collect_rows, db_now, get_datetime, get_opt_string, to_db_time, to_detail};
use crate::service::LimsService;

const ACCOUNT_COLS: &str = "id, crm_id, name, email, institution, user_id, synced_at";

const PROJECT_COLS: &str = "id, crm_id, name, description, account_id, status, project_id, synced_at";

const QUOTE_COLS: &str = "id, crm_id, quote_number, subtotal, total, crm_project_id, synced_at";

fn row_to_account(row: &libsql::Row) -> Result<CrmAccount, DatabaseError> {
    Ok(CrmAccount {
        id: row.get(0)?,
        crm_id: row.get(1)?,
        name: row.get(2)?,
        email: get_opt_string(row, 3)?,
        institution: get_opt_string(row, 4)?,
        user_id: get_opt_string(row, 5)?,
        synced_at: get_datetime(row, 6)?,
    })
}

fn row_to_crm_project(row: &libsql::Row) -> Result<CrmProject, DatabaseError> {
    Ok(CrmProject {
        id: row.get(0)?,
        crm_id: row.get(1)?,
        name: row.get(2)?,
        description: get_opt_string(row, 3)?,
        account_id: get_opt_string(row, 4)?,
        status: get_opt_string(row, 5)?,
        project_id: get_opt_string(row, 6)?,
        synced_at: get_datetime(row, 7)?,
    })
}

fn row_to_quote(row: &libsql::Row) -> Result<CrmQuote, DatabaseError> {
    Ok(CrmQuote {
        id: row.get(0)?,
        crm_id: row.get(1)?,
        quote_number: row.get(2)?,
        subtotal: row.get(3)?,
        total: row.get(4)?,
        crm_project_id: get_opt_string(row, 5)?,
        synced_at: get_datetime(row, 6)?,
    })
}

/// Read access to an external CRM.
pub trait CrmSource {
    /// Fetch one account by its external id. `Ok(None)` when the CRM has no such account.
    fn fetch_account(
        &self,
        external_id: &str,
    ) -> impl Future<Output = anyhow::Result<Option<CrmAccountRecord>>> + Send;
}

/// A CRM project record as delivered by a source.
#[derive(Debug, Clone, Default)]
pub struct CrmProjectRecord {
    pub crm_id: String,
    pub name: String,
    pub description: Option<String>,
    pub account_crm_id: Option<String>,
    pub status: Option<String>,
}

/// A CRM quote record as delivered by a source.
#[derive(Debug, Clone, Default)]
pub struct CrmQuoteRecord {
    pub crm_id: String,
    pub quote_number: String,
    pub subtotal: f64,
    pub total: f64,
    pub project_crm_id: Option<String>,
}

impl LimsService {
    /// Look up the local mirror row id for an external id, if any.
    async fn mirror_id(&self, table: &str, crm_id: &str) -> Result<Option<String>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(&format!("SELECT id FROM {table} WHERE crm_id = ?1"), [crm_id])
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row.get::<String>(0)?)),
            None => Ok(None),
        }
    }

    async fn record_sync(
        &self,
        entity_type: EntityType,
        id: &str,
        crm_id: &str,
        inserted: bool,
    ) -> Result<(), DatabaseError> {
        let detail = SyncedDetail {
            crm_id: crm_id.to_string(),
            inserted,
        };
        self.record(entity_type, id, AuditAction::Synced, to_detail(&detail)?)
            .await
    }

    // -- accounts ------------------------------------------------------------

    pub async fn upsert_crm_account(&self, record: &CrmAccountRecord) -> Result<CrmAccount, DatabaseError> {
        require_non_blank("crm_id", &record.crm_id)?;
        require_non_blank("name", &record.name)?;
        let now = to_db_time(db_now());

        let (id, inserted) = match self.mirror_id("crm_accounts", &record.crm_id).await? {
            Some(id) => {
                self.db()
                    .conn()
                    .execute(
                        "UPDATE crm_accounts SET name = ?1, email = ?2, institution = ?3, synced_at = ?4
                         WHERE id = ?5",
                        libsql::params![
                            record.name.as_str(),
                            record.email.as_deref(),
                            record.institution.as_deref(),
                            now.as_str(),
                            id.as_str()
                        ],
                    )
                    .await?;
                (id, false)
            }
            None => {
                let id = self.db().generate_id(PREFIX_CRM_ACCOUNT).await?;
                self.db()
                    .conn()
                    .execute(
                        &format!(
                            "INSERT INTO crm_accounts ({ACCOUNT_COLS}) VALUES (?1, ?2, ?3, ?4, ?5, NULL, ?6)"
                        ),
                        libsql::params![
                            id.as_str(),
                            record.crm_id.as_str(),
                            record.name.as_str(),
                            record.email.as_deref(),
                            record.institution.as_deref(),
                            now.as_str()
                        ],
                    )
                    .await?;
                (id, true)
            }
        };

        self.record_sync(EntityType::CrmAccount, &id, &record.crm_id, inserted)
            .await?;
        self.get_crm_account(&id).await
    }

    pub async fn get_crm_account(&self, id: &str) -> Result<CrmAccount, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(&format!("SELECT {ACCOUNT_COLS} FROM crm_accounts WHERE id = ?1"), [id])
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("crm_account", id))?;
        row_to_account(&row)
    }

    /// Read one mirrored account by its external id.
    pub async fn get_crm_account_by_external_id(
        &self,
        crm_id: &str,
    ) -> Result<Option<CrmAccount>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(&format!("SELECT {ACCOUNT_COLS} FROM crm_accounts WHERE crm_id = ?1"), [crm_id])
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_account(&row)?)),
            None => Ok(None),
        }
    }

    /// Attach a mirrored account to a local user.
    pub async fn link_crm_account_user(
        &self,
        account_id: &str,
        user_id: Option<&str>,
    ) -> Result<CrmAccount, DatabaseError> {
        self.get_crm_account(account_id).await?;
        self.db()
            .conn()
            .execute(
                "UPDATE crm_accounts SET user_id = ?1 WHERE id = ?2",
                libsql::params![user_id, account_id],
            )
            .await?;
        self.record(
            EntityType::CrmAccount,
            account_id,
            AuditAction::Linked,
            Some(serde_json::json!({ "user_id": user_id })),
        )
        .await?;
        self.get_crm_account(account_id).await
    }

    /// Fetch one account from `source` and mirror it.
    ///
    /// Returns `Ok(None)` when the source does not know the id.
    pub async fn sync_account<S: CrmSource>(
        &self,
        source: &S,
        external_id: &str,
    ) -> Result<Option<CrmAccount>, DatabaseError> {
        let Some(record) = source.fetch_account(external_id).await? else {
            tracing::debug!(crm_id = external_id, "account not found in CRM");
            return Ok(None);
        };
        if record.crm_id != external_id {
            return Err(DatabaseError::Validation(format!(
                "CRM returned account {} for {external_id}",
                record.crm_id
            )));
        }
        Ok(Some(self.upsert_crm_account(&record).await?))
    }

    // -- projects ------------------------------------------------------------

    pub async fn upsert_crm_project(&self, record: &CrmProjectRecord) -> Result<CrmProject, DatabaseError> {
        require_non_blank("crm_id", &record.crm_id)?;
        require_non_blank("name", &record.name)?;
        let account_id = match record.account_crm_id {
            Some(ref crm_id) => Some(
                self.mirror_id("crm_accounts", crm_id)
                    .await?
                    .ok_or_else(|| DatabaseError::not_found("crm_account", crm_id.as_str()))?,
            ),
            None => None,
        };
        let now = to_db_time(db_now());

        let (id, inserted) = match self.mirror_id("crm_projects", &record.crm_id).await? {
            Some(id) => {
                self.db()
                    .conn()
                    .execute(
                        "UPDATE crm_projects SET name = ?1, description = ?2, account_id = ?3,
                                status = ?4, synced_at = ?5
                         WHERE id = ?6",
                        libsql::params![
                            record.name.as_str(),
                            record.description.as_deref(),
                            account_id.as_deref(),
                            record.status.as_deref(),
                            now.as_str(),
                            id.as_str()
                        ],
                    )
                    .await?;
                (id, false)
            }
            None => {
                let id = self.db().generate_id(PREFIX_CRM_PROJECT).await?;
                self.db()
                    .conn()
                    .execute(
                        &format!(
                            "INSERT INTO crm_projects ({PROJECT_COLS})
                             VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL, ?7)"
                        ),
                        libsql::params![
                            id.as_str(),
                            record.crm_id.as_str(),
                            record.name.as_str(),
                            record.description.as_deref(),
                            account_id.as_deref(),
                            record.status.as_deref(),
                            now.as_str()
                        ],
                    )
                    .await?;
                (id, true)
            }
        };

        self.record_sync(EntityType::CrmProject, &id, &record.crm_id, inserted)
            .await?;
        self.get_crm_project(&id).await
    }

    pub async fn get_crm_project(&self, id: &str) -> Result<CrmProject, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(&format!("SELECT {PROJECT_COLS} FROM crm_projects WHERE id = ?1"), [id])
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("crm_project", id))?;
        row_to_crm_project(&row)
    }

    pub async fn list_crm_projects_for_account(
        &self,
        account_id: &str,
    ) -> Result<Vec<CrmProject>, DatabaseError> {
        let rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {PROJECT_COLS} FROM crm_projects WHERE account_id = ?1 ORDER BY name"),
                [account_id],
            )
            .await?;
        collect_rows(rows, row_to_crm_project).await
    }

    /// Point a mirrored CRM project and a local project at each other.
    pub async fn link_crm_project(
        &self,
        crm_project_id: &str,
        project_id: &str,
    ) -> Result<CrmProject, DatabaseError> {
        self.get_crm_project(crm_project_id).await?;
        self.get_project(project_id).await?;

        self.db().begin().await?;
        let result = async {
            self.db()
                .conn()
                .execute(
                    "UPDATE crm_projects SET project_id = ?1 WHERE id = ?2",
                    [project_id, crm_project_id],
                )
                .await?;
            self.db()
                .conn()
                .execute(
                    "UPDATE projects SET crm_project_id = ?1, updated_at = ?2 WHERE id = ?3",
                    libsql::params![crm_project_id, to_db_time(db_now()), project_id],
                )
                .await?;
            self.record(
                EntityType::CrmProject,
                crm_project_id,
                AuditAction::Linked,
                Some(serde_json::json!({ "project_id": project_id })),
            )
            .await
        }
        .await;
        self.db().finish(result).await?;
        self.get_crm_project(crm_project_id).await
    }

    // -- quotes --------------------------------------------------------------

    pub async fn upsert_crm_quote(&self, record: &CrmQuoteRecord) -> Result<CrmQuote, DatabaseError> {
        require_non_blank("crm_id", &record.crm_id)?;
        require_non_blank("quote_number", &record.quote_number)?;
        let crm_project_id = match record.project_crm_id {
            Some(ref crm_id) => Some(
                self.mirror_id("crm_projects", crm_id)
                    .await?
                    .ok_or_else(|| DatabaseError::not_found("crm_project", crm_id.as_str()))?,
            ),
            None => None,
        };
        let now = to_db_time(db_now());

        let (id, inserted) = match self.mirror_id("crm_quotes", &record.crm_id).await? {
            Some(id) => {
                self.db()
                    .conn()
                    .execute(
                        "UPDATE crm_quotes SET quote_number = ?1, subtotal = ?2, total = ?3,
                                crm_project_id = ?4, synced_at = ?5
                         WHERE id = ?6",
                        libsql::params![
                            record.quote_number.as_str(),
                            record.subtotal,
                            record.total,
                            crm_project_id.as_deref(),
                            now.as_str(),
                            id.as_str()
                        ],
                    )
                    .await?;
                (id, false)
            }
            None => {
                let id = self.db().generate_id(PREFIX_CRM_QUOTE).await?;
                self.db()
                    .conn()
                    .execute(
                        &format!("INSERT INTO crm_quotes ({QUOTE_COLS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"),
                        libsql::params![
                            id.as_str(),
                            record.crm_id.as_str(),
                            record.quote_number.as_str(),
                            record.subtotal,
                            record.total,
                            crm_project_id.as_deref(),
                            now.as_str()
                        ],
                    )
                    .await?;
                (id, true)
            }
        };

        self.record_sync(EntityType::CrmQuote, &id, &record.crm_id, inserted)
            .await?;

        let mut rows = self
            .db()
            .conn()
            .query(&format!("SELECT {QUOTE_COLS} FROM crm_quotes WHERE id = ?1"), [id.as_str()])
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        row_to_quote(&row)
    }

    pub async fn list_crm_quotes_for_project(
        &self,
        crm_project_id: &str,
    ) -> Result<Vec<CrmQuote>, DatabaseError> {
        let rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {QUOTE_COLS} FROM crm_quotes WHERE crm_project_id = ?1 ORDER BY quote_number"),
                [crm_project_id],
            )
            .await?;
        collect_rows(rows, row_to_quote).await
    }
}
