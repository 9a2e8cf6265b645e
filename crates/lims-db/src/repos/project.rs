//! Projects, products, product statuses, item links, and attachments.

use chrono::{DateTime, Duration, Utc};
use lims_core::audit_detail::{LinkedDetail, StatusChangedDetail};
use lims_core::entities::{Item, Product, ProductAttachment, ProductStatus, Project, ProjectLink};
use lims_core::enums::{AuditAction, DeadlineStatus, EntityType};
use lims_core::errors::require_non_blank;
use lims_core::ids::{PREFIX_ATTACHMENT, PREFIX_PRODUCT, PREFIX_PRODUCT_STATUS, PREFIX_PROJECT, PREFIX_PROJECT_LINK};

use crate::error::DatabaseError;
use crate::helpers::{collect_rows, db_now, get_bool, get_datetime, get_opt_datetime, get_opt_string, parse_enum, to_db_time, to_detail};
use crate::repos::inventory::row_to_item;
use crate::service::LimsService;
use crate::updates::SetClauses;
use crate::updates::product::ProductUpdate;
use crate::updates::project::ProjectUpdate;

pub(crate) const PROJECT_COLS: &str = "id, name, identifier, description, primary_lab_contact, crm_project_id, \
     deadline, deadline_warn, deadline_status, archived, created_at, updated_at";

const PRODUCT_COLS: &str = "id, name, identifier, project_id, product_type_id, status_id, \
     created_by, created_at, updated_at";

const STATUS_COLS: &str = "id, name, description";

pub(crate) fn row_to_project(row: &libsql::Row) -> Result<Project, DatabaseError> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        identifier: row.get(2)?,
        description: get_opt_string(row, 3)?,
        primary_lab_contact: get_opt_string(row, 4)?,
        crm_project_id: get_opt_string(row, 5)?,
        deadline: get_opt_datetime(row, 6)?,
        deadline_warn: get_opt_datetime(row, 7)?,
        deadline_status: parse_enum(&row.get::<String>(8)?)?,
        archived: get_bool(row, 9)?,
        created_at: get_datetime(row, 10)?,
        updated_at: get_datetime(row, 11)?,
    })
}

fn row_to_product(row: &libsql::Row) -> Result<Product, DatabaseError> {
    Ok(Product {
        id: row.get(0)?,
        name: row.get(1)?,
        identifier: row.get(2)?,
        project_id: row.get(3)?,
        product_type_id: get_opt_string(row, 4)?,
        status_id: row.get(5)?,
        created_by: get_opt_string(row, 6)?,
        created_at: get_datetime(row, 7)?,
        updated_at: get_datetime(row, 8)?,
    })
}

fn row_to_status(row: &libsql::Row) -> Result<ProductStatus, DatabaseError> {
    Ok(ProductStatus {
        id: row.get(0)?,
        name: row.get(1)?,
        description: get_opt_string(row, 2)?,
    })
}

/// Warning date `days` before a deadline.
#[must_use]
pub fn warn_before(deadline: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    deadline - Duration::days(i64::from(days))
}

/// Status a project starts with (or is reset to when its deadline moves).
const fn initial_deadline_status(deadline: Option<DateTime<Utc>>) -> DeadlineStatus {
    if deadline.is_some() {
        DeadlineStatus::OnSchedule
    } else {
        DeadlineStatus::None
    }
}

/// Fields for a new project.
#[derive(Debug, Clone, Default)]
pub struct NewProject {
    pub name: String,
    pub identifier: String,
    pub description: Option<String>,
    pub primary_lab_contact: Option<String>,
    pub crm_project_id: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub deadline_warn: Option<DateTime<Utc>>,
}

impl NewProject {
    #[must_use]
    pub fn new(name: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identifier: identifier.into(),
            ..Self::default()
        }
    }

    /// Set a deadline; without an explicit warning date, warn `warn_days` before it.
    #[must_use]
    pub fn deadline(
        mut self,
        deadline: DateTime<Utc>,
        warn: Option<DateTime<Utc>>,
        warn_days: u32,
    ) -> Self {
        self.deadline = Some(deadline);
        self.deadline_warn = Some(warn.unwrap_or_else(|| warn_before(deadline, warn_days)));
        self
    }

    #[must_use]
    pub fn lab_contact(mut self, user_id: impl Into<String>) -> Self {
        self.primary_lab_contact = Some(user_id.into());
        self
    }
}

impl LimsService {
    // -- product statuses ----------------------------------------------------

    /// Insert any of the fixed product statuses that are missing.
    ///
    /// Returns the names that were inserted.
    pub async fn ensure_product_statuses(&self) -> Result<Vec<String>, DatabaseError> {
        let mut inserted = Vec::new();
        for name in ProductStatus::DEFAULTS {
            let id = self.db().generate_id(PREFIX_PRODUCT_STATUS).await?;
            let changed = self
                .db()
                .conn()
                .execute(
                    "INSERT OR IGNORE INTO product_statuses (id, name) VALUES (?1, ?2)",
                    [id.as_str(), name],
                )
                .await?;
            if changed > 0 {
                tracing::info!(status = name, "product status created");
                inserted.push(name.to_string());
            }
        }
        Ok(inserted)
    }

    pub async fn list_product_statuses(&self) -> Result<Vec<ProductStatus>, DatabaseError> {
        let rows = self
            .db()
            .conn()
            .query(&format!("SELECT {STATUS_COLS} FROM product_statuses ORDER BY rowid"), ())
            .await?;
        collect_rows(rows, row_to_status).await
    }

    /// Look up a status by name. `None` when the lookup row is missing.
    pub async fn find_product_status(&self, name: &str) -> Result<Option<ProductStatus>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {STATUS_COLS} FROM product_statuses WHERE name = ?1"),
                [name],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_status(&row)?)),
            None => Ok(None),
        }
    }

    async fn product_status_named(&self, name: &str) -> Result<ProductStatus, DatabaseError> {
        self.find_product_status(name)
            .await?
            .ok_or_else(|| DatabaseError::not_found("product_status", name))
    }

    // -- projects ------------------------------------------------------------

    pub async fn create_project(&self, new: NewProject) -> Result<Project, DatabaseError> {
        require_non_blank("name", &new.name)?;
        require_non_blank("identifier", &new.identifier)?;
        if let (Some(deadline), Some(warn)) = (new.deadline, new.deadline_warn) {
            if warn > deadline {
                return Err(DatabaseError::Validation(
                    "deadline_warn must not be after deadline".into(),
                ));
            }
        }

        let now = db_now();
        let status = initial_deadline_status(new.deadline);
        let id = self.db().generate_id(PREFIX_PROJECT).await?;
        self.db()
            .conn()
            .execute(
                &format!(
                    "INSERT INTO projects ({PROJECT_COLS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 0, ?10, ?11)"
                ),
                libsql::params![
                    id.as_str(),
                    new.name.as_str(),
                    new.identifier.as_str(),
                    new.description.as_deref(),
                    new.primary_lab_contact.as_deref(),
                    new.crm_project_id.as_deref(),
                    new.deadline.map(to_db_time),
                    new.deadline_warn.map(to_db_time),
                    status.as_str(),
                    to_db_time(now),
                    to_db_time(now)
                ],
            )
            .await
            .map_err(|e| DatabaseError::from_write(e, &format!("project '{}'", new.identifier)))?;

        self.record(EntityType::Project, &id, AuditAction::Created, None)
            .await?;

        Ok(Project {
            id,
            name: new.name,
            identifier: new.identifier,
            description: new.description,
            primary_lab_contact: new.primary_lab_contact,
            crm_project_id: new.crm_project_id,
            deadline: new.deadline,
            deadline_warn: new.deadline_warn,
            deadline_status: status,
            archived: false,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_project_where(&self, column: &str, value: &str) -> Result<Project, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(&format!("SELECT {PROJECT_COLS} FROM projects WHERE {column} = ?1"), [value])
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("project", value))?;
        row_to_project(&row)
    }

    pub async fn get_project(&self, id: &str) -> Result<Project, DatabaseError> {
        self.get_project_where("id", id).await
    }

    pub async fn get_project_by_identifier(&self, identifier: &str) -> Result<Project, DatabaseError> {
        self.get_project_where("identifier", identifier).await
    }

    pub async fn list_projects(
        &self,
        include_archived: bool,
        limit: u32,
    ) -> Result<Vec<Project>, DatabaseError> {
        let filter = if include_archived { "" } else { "WHERE archived = 0" };
        let rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {PROJECT_COLS} FROM projects {filter}
                     ORDER BY created_at DESC, rowid DESC LIMIT {limit}"
                ),
                (),
            )
            .await?;
        collect_rows(rows, row_to_project).await
    }

    /// Apply a partial update. A changed deadline resets the deadline status.
    pub async fn update_project(&self, id: &str, update: ProjectUpdate) -> Result<Project, DatabaseError> {
        let current = self.get_project(id).await?;
        let mut clauses = SetClauses::default();

        if let Some(ref name) = update.name {
            require_non_blank("name", name)?;
            clauses.push("name", name.clone());
        }
        if let Some(ref description) = update.description {
            clauses.push_opt("description", description.clone());
        }
        if let Some(ref contact) = update.primary_lab_contact {
            clauses.push_opt("primary_lab_contact", contact.clone());
        }
        if let Some(ref crm_project_id) = update.crm_project_id {
            clauses.push_opt("crm_project_id", crm_project_id.clone());
        }

        let deadline = update.deadline.unwrap_or(current.deadline);
        let deadline_warn = update.deadline_warn.unwrap_or(current.deadline_warn);
        if let (Some(deadline), Some(warn)) = (deadline, deadline_warn) {
            if warn > deadline {
                return Err(DatabaseError::Validation(
                    "deadline_warn must not be after deadline".into(),
                ));
            }
        }
        if update.deadline.is_some() || update.deadline_warn.is_some() {
            clauses.push_opt("deadline", deadline.map(to_db_time));
            clauses.push_opt("deadline_warn", deadline_warn.map(to_db_time));
            clauses.push("deadline_status", initial_deadline_status(deadline).as_str());
        }

        if clauses.is_empty() {
            return Ok(current);
        }

        clauses.push("updated_at", to_db_time(db_now()));
        let (sql, params) = clauses.into_update("projects", id);
        self.db()
            .conn()
            .execute(&sql, libsql::params_from_iter(params))
            .await
            .map_err(|e| DatabaseError::from_write(e, "project"))?;

        self.record(EntityType::Project, id, AuditAction::Updated, to_detail(&update)?)
            .await?;
        self.get_project(id).await
    }

    /// Archive a project; archived projects are skipped by the deadline job.
    pub async fn archive_project(&self, id: &str) -> Result<Project, DatabaseError> {
        let project = self.get_project(id).await?;
        if project.archived {
            return Ok(project);
        }
        let now = db_now();
        self.db()
            .conn()
            .execute(
                "UPDATE projects SET archived = 1, updated_at = ?1 WHERE id = ?2",
                libsql::params![to_db_time(now), id],
            )
            .await?;
        self.record(EntityType::Project, id, AuditAction::Updated, Some(serde_json::json!({ "archived": true })))
            .await?;
        Ok(Project {
            archived: true,
            updated_at: now,
            ..project
        })
    }

    // -- products ------------------------------------------------------------

    /// Create a product on a project with status `Added`.
    pub async fn create_product(
        &self,
        project_id: &str,
        name: &str,
        identifier: &str,
        product_type_id: Option<&str>,
        created_by: Option<&str>,
    ) -> Result<Product, DatabaseError> {
        require_non_blank("name", name)?;
        require_non_blank("identifier", identifier)?;
        self.get_project(project_id).await?;
        if let Some(type_id) = product_type_id {
            self.get_item_type(type_id).await?;
        }
        let status = self.product_status_named(ProductStatus::ADDED).await?;

        let now = db_now();
        let id = self.db().generate_id(PREFIX_PRODUCT).await?;
        self.db()
            .conn()
            .execute(
                &format!("INSERT INTO products ({PRODUCT_COLS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"),
                libsql::params![
                    id.as_str(),
                    name,
                    identifier,
                    project_id,
                    product_type_id,
                    status.id.as_str(),
                    created_by,
                    to_db_time(now),
                    to_db_time(now)
                ],
            )
            .await
            .map_err(|e| DatabaseError::from_write(e, &format!("product '{identifier}'")))?;

        self.record(EntityType::Product, &id, AuditAction::Created, None)
            .await?;

        Ok(Product {
            id,
            name: name.to_string(),
            identifier: identifier.to_string(),
            project_id: project_id.to_string(),
            product_type_id: product_type_id.map(String::from),
            status_id: status.id,
            created_by: created_by.map(String::from),
            created_at: now,
            updated_at: now,
        })
    }

    pub async fn get_product(&self, id: &str) -> Result<Product, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(&format!("SELECT {PRODUCT_COLS} FROM products WHERE id = ?1"), [id])
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("product", id))?;
        row_to_product(&row)
    }

    pub async fn list_products(&self, project_id: &str) -> Result<Vec<Product>, DatabaseError> {
        let rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {PRODUCT_COLS} FROM products WHERE project_id = ?1 ORDER BY identifier"),
                [project_id],
            )
            .await?;
        collect_rows(rows, row_to_product).await
    }

    pub async fn update_product(&self, id: &str, update: ProductUpdate) -> Result<Product, DatabaseError> {
        let mut clauses = SetClauses::default();
        if let Some(ref name) = update.name {
            require_non_blank("name", name)?;
            clauses.push("name", name.clone());
        }
        if let Some(ref type_id) = update.product_type_id {
            if let Some(type_id) = type_id {
                self.get_item_type(type_id).await?;
            }
            clauses.push_opt("product_type_id", type_id.clone());
        }
        if clauses.is_empty() {
            return self.get_product(id).await;
        }

        clauses.push("updated_at", to_db_time(db_now()));
        let (sql, params) = clauses.into_update("products", id);
        let changed = self
            .db()
            .conn()
            .execute(&sql, libsql::params_from_iter(params))
            .await?;
        if changed == 0 {
            return Err(DatabaseError::not_found("product", id));
        }
        self.record(EntityType::Product, id, AuditAction::Updated, to_detail(&update)?)
            .await?;
        self.get_product(id).await
    }

    /// Move a product to the status with the given name.
    pub async fn set_product_status(&self, id: &str, status_name: &str) -> Result<Product, DatabaseError> {
        let product = self.get_product(id).await?;
        let status = self.product_status_named(status_name).await?;
        if product.status_id == status.id {
            return Ok(product);
        }
        self.write_product_status(&product, &status).await
    }

    pub(crate) async fn write_product_status(
        &self,
        product: &Product,
        status: &ProductStatus,
    ) -> Result<Product, DatabaseError> {
        let now = db_now();
        self.db()
            .conn()
            .execute(
                "UPDATE products SET status_id = ?1, updated_at = ?2 WHERE id = ?3",
                libsql::params![status.id.as_str(), to_db_time(now), product.id.as_str()],
            )
            .await?;

        let detail = StatusChangedDetail {
            from: product.status_id.clone(),
            to: status.id.clone(),
            reason: Some(status.name.clone()),
        };
        self.record(EntityType::Product, &product.id, AuditAction::StatusChanged, to_detail(&detail)?)
            .await?;

        Ok(Product {
            status_id: status.id.clone(),
            updated_at: now,
            ..product.clone()
        })
    }

    // -- item links ----------------------------------------------------------

    pub async fn link_item_to_product(
        &self,
        product_id: &str,
        item_id: &str,
    ) -> Result<ProjectLink, DatabaseError> {
        self.get_product(product_id).await?;
        self.get_item(item_id).await?;

        let now = db_now();
        let id = self.db().generate_id(PREFIX_PROJECT_LINK).await?;
        self.db()
            .conn()
            .execute(
                "INSERT INTO project_links (id, product_id, item_id, created_at) VALUES (?1, ?2, ?3, ?4)",
                libsql::params![id.as_str(), product_id, item_id, to_db_time(now)],
            )
            .await
            .map_err(|e| DatabaseError::from_write(e, &format!("link {product_id} -> {item_id}")))?;

        let detail = LinkedDetail {
            source_type: EntityType::Product.as_str().to_string(),
            source_id: product_id.to_string(),
            target_type: EntityType::Item.as_str().to_string(),
            target_id: item_id.to_string(),
        };
        self.record(EntityType::ProjectLink, &id, AuditAction::Linked, to_detail(&detail)?)
            .await?;

        Ok(ProjectLink {
            id,
            product_id: product_id.to_string(),
            item_id: item_id.to_string(),
            created_at: now,
        })
    }

    /// Remove a product ↔ item link. Returns `false` when no link existed.
    pub async fn unlink_item_from_product(
        &self,
        product_id: &str,
        item_id: &str,
    ) -> Result<bool, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT id FROM project_links WHERE product_id = ?1 AND item_id = ?2",
                [product_id, item_id],
            )
            .await?;
        let Some(row) = rows.next().await? else {
            return Ok(false);
        };
        let link_id = row.get::<String>(0)?;
        self.db()
            .conn()
            .execute("DELETE FROM project_links WHERE id = ?1", [link_id.as_str()])
            .await?;

        let detail = LinkedDetail {
            source_type: EntityType::Product.as_str().to_string(),
            source_id: product_id.to_string(),
            target_type: EntityType::Item.as_str().to_string(),
            target_id: item_id.to_string(),
        };
        self.record(EntityType::ProjectLink, &link_id, AuditAction::Unlinked, to_detail(&detail)?)
            .await?;
        Ok(true)
    }

    /// Items linked to a product, oldest link first.
    pub async fn list_product_items(&self, product_id: &str) -> Result<Vec<Item>, DatabaseError> {
        let rows = self
            .db()
            .conn()
            .query(
                "SELECT i.id, i.name, i.identifier, i.barcode, i.item_type_id, i.location_id,
                        i.amount_available, i.amount_measure_id, i.in_inventory, i.added_by,
                        i.created_at, i.updated_at
                 FROM project_links l JOIN items i ON i.id = l.item_id
                 WHERE l.product_id = ?1
                 ORDER BY l.created_at, l.rowid",
                [product_id],
            )
            .await?;
        collect_rows(rows, row_to_item).await
    }

    // -- attachments ---------------------------------------------------------

    pub async fn add_product_attachment(
        &self,
        product_id: &str,
        file_name: &str,
        path: &str,
    ) -> Result<ProductAttachment, DatabaseError> {
        require_non_blank("file_name", file_name)?;
        require_non_blank("path", path)?;
        self.get_product(product_id).await?;

        let now = db_now();
        let id = self.db().generate_id(PREFIX_ATTACHMENT).await?;
        self.db()
            .conn()
            .execute(
                "INSERT INTO product_attachments (id, product_id, file_name, path, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                libsql::params![id.as_str(), product_id, file_name, path, to_db_time(now)],
            )
            .await?;
        self.record(EntityType::ProductAttachment, &id, AuditAction::Created, None)
            .await?;

        Ok(ProductAttachment {
            id,
            product_id: product_id.to_string(),
            file_name: file_name.to_string(),
            path: path.to_string(),
            created_at: now,
        })
    }

    pub async fn list_product_attachments(
        &self,
        product_id: &str,
    ) -> Result<Vec<ProductAttachment>, DatabaseError> {
        let rows = self
            .db()
            .conn()
            .query(
                "SELECT id, product_id, file_name, path, created_at FROM product_attachments
                 WHERE product_id = ?1 ORDER BY created_at, rowid",
                [product_id],
            )
            .await?;
        collect_rows(rows, |row| {
            Ok(ProductAttachment {
                id: row.get(0)?,
                product_id: row.get(1)?,
                file_name: row.get(2)?,
                path: row.get(3)?,
                created_at: get_datetime(row, 4)?,
            })
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::inventory::NewItem;
    use crate::test_support::helpers::test_service;
    use crate::updates::project::ProjectUpdateBuilder;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn deadline() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 30, 17, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn seeded_statuses_are_present_and_ensure_is_idempotent() {
        let svc = test_service().await;
        let names: Vec<String> = svc
            .list_product_statuses()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, ProductStatus::DEFAULTS.map(String::from).to_vec());
        assert!(svc.ensure_product_statuses().await.unwrap().is_empty());

        svc.db()
            .conn()
            .execute("DELETE FROM product_statuses WHERE name = 'Received'", ())
            .await
            .unwrap();
        assert_eq!(svc.ensure_product_statuses().await.unwrap(), vec!["Received".to_string()]);
    }

    #[tokio::test]
    async fn deadline_warn_defaults_from_days() {
        let svc = test_service().await;
        let project = svc
            .create_project(NewProject::new("Genome", "PRJ-1").deadline(deadline(), None, 7))
            .await
            .unwrap();
        assert_eq!(project.deadline_warn, Some(deadline() - Duration::days(7)));
        assert_eq!(project.deadline_status, DeadlineStatus::OnSchedule);

        let plain = svc.create_project(NewProject::new("Plain", "PRJ-2")).await.unwrap();
        assert_eq!(plain.deadline_status, DeadlineStatus::None);
        assert_eq!(svc.get_project_by_identifier("PRJ-2").await.unwrap(), plain);
    }

    #[tokio::test]
    async fn warn_after_deadline_rejected() {
        let svc = test_service().await;
        let late_warn = deadline() + Duration::days(1);
        assert!(matches!(
            svc.create_project(NewProject::new("Bad", "PRJ-X").deadline(deadline(), Some(late_warn), 7))
                .await,
            Err(DatabaseError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn moving_deadline_resets_status() {
        let svc = test_service().await;
        let project = svc.create_project(NewProject::new("Genome", "PRJ-1")).await.unwrap();
        let update = ProjectUpdateBuilder::new()
            .deadline(Some(deadline()))
            .deadline_warn(Some(deadline() - Duration::days(3)))
            .build();
        let updated = svc.update_project(&project.id, update).await.unwrap();
        assert_eq!(updated.deadline, Some(deadline()));
        assert_eq!(updated.deadline_status, DeadlineStatus::OnSchedule);

        let cleared = svc
            .update_project(&project.id, ProjectUpdateBuilder::new().deadline(None).build())
            .await
            .unwrap();
        assert_eq!(cleared.deadline, None);
        assert_eq!(cleared.deadline_status, DeadlineStatus::None);
    }

    #[tokio::test]
    async fn archived_projects_are_hidden_by_default() {
        let svc = test_service().await;
        let a = svc.create_project(NewProject::new("A", "PRJ-A")).await.unwrap();
        svc.create_project(NewProject::new("B", "PRJ-B")).await.unwrap();
        assert!(svc.archive_project(&a.id).await.unwrap().archived);

        assert_eq!(svc.list_projects(false, 20).await.unwrap().len(), 1);
        assert_eq!(svc.list_projects(true, 20).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn products_start_added_and_change_status_by_name() {
        let svc = test_service().await;
        let project = svc.create_project(NewProject::new("Genome", "PRJ-1")).await.unwrap();
        let product = svc
            .create_product(&project.id, "Sample 1", "S-1", None, None)
            .await
            .unwrap();
        let added = svc.find_product_status(ProductStatus::ADDED).await.unwrap().unwrap();
        assert_eq!(product.status_id, added.id);

        let moved = svc
            .set_product_status(&product.id, ProductStatus::RECEIVED)
            .await
            .unwrap();
        let received = svc.find_product_status(ProductStatus::RECEIVED).await.unwrap().unwrap();
        assert_eq!(moved.status_id, received.id);

        assert!(matches!(
            svc.set_product_status(&product.id, "Shipped").await,
            Err(DatabaseError::NotFound { .. })
        ));
        assert_eq!(svc.list_products(&project.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn item_links_are_unique_and_removable() {
        let svc = test_service().await;
        let project = svc.create_project(NewProject::new("Genome", "PRJ-1")).await.unwrap();
        let product = svc.create_product(&project.id, "Sample 1", "S-1", None, None).await.unwrap();
        let kind = svc.create_item_type("Tube", None).await.unwrap();
        let tube = svc.create_item(NewItem::new("Tube 1", "T-1", &kind.id)).await.unwrap();

        svc.link_item_to_product(&product.id, &tube.id).await.unwrap();
        assert!(matches!(
            svc.link_item_to_product(&product.id, &tube.id).await,
            Err(DatabaseError::Conflict(_))
        ));
        assert_eq!(svc.list_product_items(&product.id).await.unwrap(), vec![tube.clone()]);

        assert!(svc.unlink_item_from_product(&product.id, &tube.id).await.unwrap());
        assert!(!svc.unlink_item_from_product(&product.id, &tube.id).await.unwrap());
        assert!(svc.list_product_items(&product.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn attachments_listed_in_order() {
        let svc = test_service().await;
        let project = svc.create_project(NewProject::new("Genome", "PRJ-1")).await.unwrap();
        let product = svc.create_product(&project.id, "Sample 1", "S-1", None, None).await.unwrap();
        svc.add_product_attachment(&product.id, "qc.pdf", "/data/qc.pdf").await.unwrap();
        svc.add_product_attachment(&product.id, "gel.png", "/data/gel.png").await.unwrap();

        let names: Vec<String> = svc
            .list_product_attachments(&product.id)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.file_name)
            .collect();
        assert_eq!(names, vec!["qc.pdf".to_string(), "gel.png".to_string()]);
    }
}
