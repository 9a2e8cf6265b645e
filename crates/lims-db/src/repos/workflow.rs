//! Task templates, their input fields and capable equipment, and workflows.

use lims_core::entities::{TaskInputField, TaskTemplate, Workflow};
use lims_core::enums::{AuditAction, EntityType};
use lims_core::errors::{require_non_blank, require_positive};
use lims_core::ids::{PREFIX_INPUT_FIELD, PREFIX_TASK_TEMPLATE, PREFIX_WORKFLOW};

use crate::error::DatabaseError;
use crate::helpers::{collect_rows, db_now, get_datetime, get_opt_string, get_u32, to_db_time};
use crate::service::LimsService;

const TEMPLATE_COLS: &str = "id, name, description, product_input_type_id, created_by, created_at";

const INPUT_COLS: &str =
    "id, task_template_id, label, item_type_id, amount, amount_measure_id, position";

fn row_to_template(row: &libsql::Row) -> Result<TaskTemplate, DatabaseError> {
    Ok(TaskTemplate {
        id: row.get(0)?,
        name: row.get(1)?,
        description: get_opt_string(row, 2)?,
        product_input_type_id: get_opt_string(row, 3)?,
        created_by: get_opt_string(row, 4)?,
        created_at: get_datetime(row, 5)?,
    })
}

fn row_to_input(row: &libsql::Row) -> Result<TaskInputField, DatabaseError> {
    Ok(TaskInputField {
        id: row.get(0)?,
        task_template_id: row.get(1)?,
        label: row.get(2)?,
        item_type_id: row.get(3)?,
        amount: row.get(4)?,
        amount_measure_id: get_opt_string(row, 5)?,
        position: get_u32(row, 6)?,
    })
}

/// Fields for a new input field on a task template.
#[derive(Debug, Clone)]
pub struct NewInputField {
    pub label: String,
    pub item_type_id: String,
    pub amount: f64,
    pub amount_measure_id: Option<String>,
}

impl LimsService {
    // -- task templates ------------------------------------------------------

    pub async fn create_task_template(
        &self,
        name: &str,
        description: Option<&str>,
        product_input_type_id: Option<&str>,
        created_by: Option<&str>,
    ) -> Result<TaskTemplate, DatabaseError> {
        require_non_blank("name", name)?;
        if let Some(type_id) = product_input_type_id {
            self.get_item_type(type_id).await?;
        }

        let now = db_now();
        let id = self.db().generate_id(PREFIX_TASK_TEMPLATE).await?;
        self.db()
            .conn()
            .execute(
                &format!("INSERT INTO task_templates ({TEMPLATE_COLS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"),
                libsql::params![
                    id.as_str(),
                    name,
                    description,
                    product_input_type_id,
                    created_by,
                    to_db_time(now)
                ],
            )
            .await
            .map_err(|e| DatabaseError::from_write(e, &format!("task template '{name}'")))?;

        self.record(EntityType::TaskTemplate, &id, AuditAction::Created, None)
            .await?;

        Ok(TaskTemplate {
            id,
            name: name.to_string(),
            description: description.map(String::from),
            product_input_type_id: product_input_type_id.map(String::from),
            created_by: created_by.map(String::from),
            created_at: now,
        })
    }

    async fn get_template_where(&self, column: &str, value: &str) -> Result<TaskTemplate, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {TEMPLATE_COLS} FROM task_templates WHERE {column} = ?1"),
                [value],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("task_template", value))?;
        row_to_template(&row)
    }

    pub async fn get_task_template(&self, id: &str) -> Result<TaskTemplate, DatabaseError> {
        self.get_template_where("id", id).await
    }

    pub async fn get_task_template_by_name(&self, name: &str) -> Result<TaskTemplate, DatabaseError> {
        self.get_template_where("name", name).await
    }

    pub async fn list_task_templates(&self) -> Result<Vec<TaskTemplate>, DatabaseError> {
        let rows = self
            .db()
            .conn()
            .query(&format!("SELECT {TEMPLATE_COLS} FROM task_templates ORDER BY name"), ())
            .await?;
        collect_rows(rows, row_to_template).await
    }

    /// Append an input field at the next free position of a template.
    pub async fn add_input_field(
        &self,
        template_id: &str,
        field: NewInputField,
    ) -> Result<TaskInputField, DatabaseError> {
        require_non_blank("label", &field.label)?;
        require_positive("amount", field.amount)?;
        self.get_task_template(template_id).await?;
        self.get_item_type(&field.item_type_id).await?;

        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT COALESCE(MAX(position) + 1, 0) FROM task_input_fields WHERE task_template_id = ?1",
                [template_id],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        let position = get_u32(&row, 0)?;

        let id = self.db().generate_id(PREFIX_INPUT_FIELD).await?;
        self.db()
            .conn()
            .execute(
                &format!("INSERT INTO task_input_fields ({INPUT_COLS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"),
                libsql::params![
                    id.as_str(),
                    template_id,
                    field.label.as_str(),
                    field.item_type_id.as_str(),
                    field.amount,
                    field.amount_measure_id.as_deref(),
                    i64::from(position)
                ],
            )
            .await
            .map_err(|e| DatabaseError::from_write(e, "input field"))?;

        self.record(
            EntityType::TaskTemplate,
            template_id,
            AuditAction::Updated,
            Some(serde_json::json!({ "input_field": id, "label": field.label })),
        )
        .await?;

        Ok(TaskInputField {
            id,
            task_template_id: template_id.to_string(),
            label: field.label,
            item_type_id: field.item_type_id,
            amount: field.amount,
            amount_measure_id: field.amount_measure_id,
            position,
        })
    }

    pub async fn list_input_fields(&self, template_id: &str) -> Result<Vec<TaskInputField>, DatabaseError> {
        let rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {INPUT_COLS} FROM task_input_fields WHERE task_template_id = ?1 ORDER BY position"
                ),
                [template_id],
            )
            .await?;
        collect_rows(rows, row_to_input).await
    }

    /// Mark a piece of equipment as capable of running a template.
    pub async fn add_template_equipment(
        &self,
        template_id: &str,
        equipment_id: &str,
    ) -> Result<(), DatabaseError> {
        self.get_task_template(template_id).await?;
        self.get_equipment(equipment_id).await?;
        let inserted = self
            .db()
            .conn()
            .execute(
                "INSERT OR IGNORE INTO task_template_equipment (task_template_id, equipment_id)
                 VALUES (?1, ?2)",
                [template_id, equipment_id],
            )
            .await?;
        if inserted > 0 {
            self.record(
                EntityType::TaskTemplate,
                template_id,
                AuditAction::Linked,
                Some(serde_json::json!({ "equipment_id": equipment_id })),
            )
            .await?;
        }
        Ok(())
    }

    /// IDs of the equipment able to run a template.
    pub async fn list_template_equipment(&self, template_id: &str) -> Result<Vec<String>, DatabaseError> {
        let rows = self
            .db()
            .conn()
            .query(
                "SELECT equipment_id FROM task_template_equipment WHERE task_template_id = ?1
                 ORDER BY equipment_id",
                [template_id],
            )
            .await?;
        collect_rows(rows, |row| Ok(row.get::<String>(0)?)).await
    }

    // -- workflows -----------------------------------------------------------

    /// Create a workflow from an ordered list of task templates.
    pub async fn create_workflow(
        &self,
        name: &str,
        task_template_ids: &[String],
    ) -> Result<Workflow, DatabaseError> {
        require_non_blank("name", name)?;
        if task_template_ids.is_empty() {
            return Err(DatabaseError::Validation(
                "a workflow needs at least one task".into(),
            ));
        }
        for template_id in task_template_ids {
            self.get_task_template(template_id).await?;
        }

        let now = db_now();
        let id = self.db().generate_id(PREFIX_WORKFLOW).await?;

        self.db().begin().await?;
        let result = async {
            self.db()
                .conn()
                .execute(
                    "INSERT INTO workflows (id, name, created_at) VALUES (?1, ?2, ?3)",
                    libsql::params![id.as_str(), name, to_db_time(now)],
                )
                .await
                .map_err(|e| DatabaseError::from_write(e, &format!("workflow '{name}'")))?;
            for (position, template_id) in (0_i64..).zip(task_template_ids) {
                self.db()
                    .conn()
                    .execute(
                        "INSERT INTO workflow_tasks (workflow_id, task_template_id, position)
                         VALUES (?1, ?2, ?3)",
                        libsql::params![id.as_str(), template_id.as_str(), position],
                    )
                    .await?;
            }
            self.record(EntityType::Workflow, &id, AuditAction::Created, None)
                .await
        }
        .await;
        self.db().finish(result).await?;

        Ok(Workflow {
            id,
            name: name.to_string(),
            task_template_ids: task_template_ids.to_vec(),
            created_at: now,
        })
    }

    pub async fn get_workflow(&self, id: &str) -> Result<Workflow, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query("SELECT id, name, created_at FROM workflows WHERE id = ?1", [id])
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("workflow", id))?;
        let (id, name, created_at) = (row.get::<String>(0)?, row.get::<String>(1)?, get_datetime(&row, 2)?);
        let task_template_ids = self.workflow_task_ids(&id).await?;
        Ok(Workflow {
            id,
            name,
            task_template_ids,
            created_at,
        })
    }

    pub async fn list_workflows(&self) -> Result<Vec<Workflow>, DatabaseError> {
        let rows = self
            .db()
            .conn()
            .query("SELECT id FROM workflows ORDER BY name", ())
            .await?;
        let ids = collect_rows(rows, |row| Ok(row.get::<String>(0)?)).await?;
        let mut workflows = Vec::with_capacity(ids.len());
        for id in ids {
            workflows.push(self.get_workflow(&id).await?);
        }
        Ok(workflows)
    }

    async fn workflow_task_ids(&self, workflow_id: &str) -> Result<Vec<String>, DatabaseError> {
        let rows = self
            .db()
            .conn()
            .query(
                "SELECT task_template_id FROM workflow_tasks WHERE workflow_id = ?1 ORDER BY position",
                [workflow_id],
            )
            .await?;
        collect_rows(rows, |row| Ok(row.get::<String>(0)?)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::test_service;
    use pretty_assertions::assert_eq;

    fn field(label: &str, item_type_id: &str, amount: f64) -> NewInputField {
        NewInputField {
            label: label.to_string(),
            item_type_id: item_type_id.to_string(),
            amount,
            amount_measure_id: None,
        }
    }

    #[tokio::test]
    async fn input_fields_get_sequential_positions() {
        let svc = test_service().await;
        let buffer = svc.create_item_type("Buffer", None).await.unwrap();
        let tpl = svc
            .create_task_template("Extraction", Some("DNA extraction"), None, None)
            .await
            .unwrap();

        let a = svc.add_input_field(&tpl.id, field("Lysis", &buffer.id, 2.0)).await.unwrap();
        let b = svc.add_input_field(&tpl.id, field("Wash", &buffer.id, 1.5)).await.unwrap();
        assert_eq!((a.position, b.position), (0, 1));

        let labels: Vec<String> = svc
            .list_input_fields(&tpl.id)
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.label)
            .collect();
        assert_eq!(labels, vec!["Lysis".to_string(), "Wash".to_string()]);
    }

    #[tokio::test]
    async fn input_field_rejects_non_positive_amount() {
        let svc = test_service().await;
        let buffer = svc.create_item_type("Buffer", None).await.unwrap();
        let tpl = svc.create_task_template("Extraction", None, None, None).await.unwrap();
        assert!(matches!(
            svc.add_input_field(&tpl.id, field("Lysis", &buffer.id, 0.0)).await,
            Err(DatabaseError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn duplicate_template_name_conflicts() {
        let svc = test_service().await;
        svc.create_task_template("QC", None, None, None).await.unwrap();
        assert!(matches!(
            svc.create_task_template("QC", None, None, None).await,
            Err(DatabaseError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn workflow_keeps_task_order() {
        let svc = test_service().await;
        let a = svc.create_task_template("Extract", None, None, None).await.unwrap();
        let b = svc.create_task_template("Quantify", None, None, None).await.unwrap();
        let ids = vec![b.id.clone(), a.id.clone()];

        let wf = svc.create_workflow("Sequencing prep", &ids).await.unwrap();
        let fetched = svc.get_workflow(&wf.id).await.unwrap();
        assert_eq!(fetched.task_template_ids, ids);
        assert_eq!(svc.list_workflows().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn workflow_requires_known_tasks() {
        let svc = test_service().await;
        assert!(matches!(
            svc.create_workflow("Empty", &[]).await,
            Err(DatabaseError::Validation(_))
        ));
        assert!(matches!(
            svc.create_workflow("Ghost", &["tpl-00000000".to_string()]).await,
            Err(DatabaseError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn template_equipment_link_is_idempotent() {
        let svc = test_service().await;
        let tpl = svc.create_task_template("Sequence", None, None, None).await.unwrap();
        let eqp = svc.create_equipment("MiSeq", true, None).await.unwrap();

        svc.add_template_equipment(&tpl.id, &eqp.id).await.unwrap();
        svc.add_template_equipment(&tpl.id, &eqp.id).await.unwrap();
        assert_eq!(svc.list_template_equipment(&tpl.id).await.unwrap(), vec![eqp.id]);
    }
}
