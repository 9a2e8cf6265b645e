//! Run engine: runs, task execution, and data entries.
//!
//! A run walks its ordered task list. Starting a task mints a task run
//! identifier, opens one `active` data entry per product, and records one
//! removal transfer per product and input field. Finishing takes and
//! completes those transfers and settles the entries; stopping undoes them.
//! Each step runs in one transaction.

use std::collections::HashSet;

use lims_core::audit_detail::TaskRunDetail;
use lims_core::entities::{DataEntry, ItemTransfer, ProductStatus, Run, Workflow};
use lims_core::enums::{AuditAction, DataEntryState, EntityType, RunPhase};
use lims_core::errors::{CoreError, require_non_blank};
use lims_core::ids::{PREFIX_DATA_ENTRY, PREFIX_RUN, PREFIX_TASK_RUN};
use lims_core::responses::{TaskFinishResponse, TaskStartResponse};

use crate::error::DatabaseError;
use crate::helpers::{
    collect_rows, db_now, get_bool, get_datetime, get_opt_datetime, get_opt_string, get_u32,
    parse_enum, to_db_time, to_detail,
};
use crate::service::LimsService;

const RUN_COLS: &str = "id, name, identifier, current_task, has_started, task_in_progress, \
     is_active, task_run_identifier, started_by, created_at, started_at, finished_at";

const ENTRY_COLS: &str = "id, run_id, task_template_id, product_id, item_id, task_run_identifier, \
     state, data, created_by, created_at, updated_at";

fn row_to_run(row: &libsql::Row) -> Result<Run, DatabaseError> {
    Ok(Run {
        id: row.get(0)?,
        name: row.get(1)?,
        identifier: row.get(2)?,
        current_task: get_u32(row, 3)?,
        has_started: get_bool(row, 4)?,
        task_in_progress: get_bool(row, 5)?,
        is_active: get_bool(row, 6)?,
        task_run_identifier: get_opt_string(row, 7)?,
        started_by: get_opt_string(row, 8)?,
        created_at: get_datetime(row, 9)?,
        started_at: get_opt_datetime(row, 10)?,
        finished_at: get_opt_datetime(row, 11)?,
    })
}

fn row_to_entry(row: &libsql::Row) -> Result<DataEntry, DatabaseError> {
    Ok(DataEntry {
        id: row.get(0)?,
        run_id: row.get(1)?,
        task_template_id: row.get(2)?,
        product_id: row.get(3)?,
        item_id: get_opt_string(row, 4)?,
        task_run_identifier: row.get(5)?,
        state: parse_enum(&row.get::<String>(6)?)?,
        data: serde_json::from_str(&row.get::<String>(7)?)?,
        created_by: get_opt_string(row, 8)?,
        created_at: get_datetime(row, 9)?,
        updated_at: get_datetime(row, 10)?,
    })
}

fn invalid_phase(run: &Run, to: RunPhase) -> DatabaseError {
    CoreError::InvalidTransition {
        entity_type: EntityType::Run.as_str().to_string(),
        id: run.id.clone(),
        from: run.phase().as_str().to_string(),
        to: to.as_str().to_string(),
    }
    .into()
}

impl LimsService {
    // -- runs ----------------------------------------------------------------

    /// Create a pending run over an ordered task list and a set of products.
    pub async fn create_run(
        &self,
        name: &str,
        identifier: &str,
        task_template_ids: &[String],
        product_ids: &[String],
    ) -> Result<Run, DatabaseError> {
        require_non_blank("name", name)?;
        require_non_blank("identifier", identifier)?;
        for template_id in task_template_ids {
            self.get_task_template(template_id).await?;
        }
        for product_id in product_ids {
            self.get_product(product_id).await?;
        }

        let now = db_now();
        let id = self.db().generate_id(PREFIX_RUN).await?;

        self.db().begin().await?;
        let result = async {
            self.db()
                .conn()
                .execute(
                    &format!(
                        "INSERT INTO runs ({RUN_COLS})
                         VALUES (?1, ?2, ?3, 0, 0, 0, 0, NULL, NULL, ?4, NULL, NULL)"
                    ),
                    libsql::params![id.as_str(), name, identifier, to_db_time(now)],
                )
                .await
                .map_err(|e| DatabaseError::from_write(e, &format!("run '{identifier}'")))?;
            for (position, template_id) in (0_i64..).zip(task_template_ids) {
                self.db()
                    .conn()
                    .execute(
                        "INSERT INTO run_tasks (run_id, task_template_id, position) VALUES (?1, ?2, ?3)",
                        libsql::params![id.as_str(), template_id.as_str(), position],
                    )
                    .await?;
            }
            let mut seen = HashSet::new();
            for product_id in product_ids.iter().filter(|p| seen.insert(p.as_str())) {
                self.db()
                    .conn()
                    .execute(
                        "INSERT INTO run_products (run_id, product_id) VALUES (?1, ?2)",
                        [id.as_str(), product_id.as_str()],
                    )
                    .await?;
            }
            self.record(EntityType::Run, &id, AuditAction::Created, None)
                .await
        }
        .await;
        self.db().finish(result).await?;

        Ok(Run {
            id,
            name: name.to_string(),
            identifier: identifier.to_string(),
            current_task: 0,
            has_started: false,
            task_in_progress: false,
            is_active: false,
            task_run_identifier: None,
            started_by: None,
            created_at: now,
            started_at: None,
            finished_at: None,
        })
    }

    /// Create a pending run that follows a workflow's task list.
    pub async fn create_run_from_workflow(
        &self,
        workflow_id: &str,
        name: &str,
        identifier: &str,
        product_ids: &[String],
    ) -> Result<Run, DatabaseError> {
        let Workflow {
            task_template_ids, ..
        } = self.get_workflow(workflow_id).await?;
        self.create_run(name, identifier, &task_template_ids, product_ids)
            .await
    }

    async fn get_run_where(&self, column: &str, value: &str) -> Result<Run, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(&format!("SELECT {RUN_COLS} FROM runs WHERE {column} = ?1"), [value])
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("run", value))?;
        row_to_run(&row)
    }

    pub async fn get_run(&self, id: &str) -> Result<Run, DatabaseError> {
        self.get_run_where("id", id).await
    }

    pub async fn get_run_by_identifier(&self, identifier: &str) -> Result<Run, DatabaseError> {
        self.get_run_where("identifier", identifier).await
    }

    /// Runs, newest first. `active_only` keeps runs that have started and not finished.
    pub async fn list_runs(&self, active_only: bool, limit: u32) -> Result<Vec<Run>, DatabaseError> {
        let filter = if active_only { "WHERE is_active = 1" } else { "" };
        let rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {RUN_COLS} FROM runs {filter} ORDER BY created_at DESC, rowid DESC LIMIT {limit}"
                ),
                (),
            )
            .await?;
        collect_rows(rows, row_to_run).await
    }

    /// Ordered task template ids of a run.
    pub async fn run_task_ids(&self, run_id: &str) -> Result<Vec<String>, DatabaseError> {
        let rows = self
            .db()
            .conn()
            .query(
                "SELECT task_template_id FROM run_tasks WHERE run_id = ?1 ORDER BY position",
                [run_id],
            )
            .await?;
        collect_rows(rows, |row| Ok(row.get::<String>(0)?)).await
    }

    /// Product ids of a run, in the order they were added.
    pub async fn run_product_ids(&self, run_id: &str) -> Result<Vec<String>, DatabaseError> {
        let rows = self
            .db()
            .conn()
            .query(
                "SELECT product_id FROM run_products WHERE run_id = ?1 ORDER BY rowid",
                [run_id],
            )
            .await?;
        collect_rows(rows, |row| Ok(row.get::<String>(0)?)).await
    }

    /// Add a product to a run that has not started yet.
    pub async fn add_product_to_run(&self, run_id: &str, product_id: &str) -> Result<(), DatabaseError> {
        let run = self.get_run(run_id).await?;
        if run.has_started {
            return Err(DatabaseError::InvalidState(format!(
                "Run {} has started; its products are fixed",
                run.identifier
            )));
        }
        self.get_product(product_id).await?;
        let inserted = self
            .db()
            .conn()
            .execute(
                "INSERT OR IGNORE INTO run_products (run_id, product_id) VALUES (?1, ?2)",
                [run_id, product_id],
            )
            .await?;
        if inserted > 0 {
            self.record(
                EntityType::Run,
                run_id,
                AuditAction::Linked,
                Some(serde_json::json!({ "product_id": product_id })),
            )
            .await?;
        }
        Ok(())
    }

    /// Start a pending run. Its products move to `In Progress` when that status exists.
    pub async fn start_run(&self, run_id: &str, started_by: Option<&str>) -> Result<Run, DatabaseError> {
        let run = self.get_run(run_id).await?;
        if run.phase() != RunPhase::Pending {
            return Err(invalid_phase(&run, RunPhase::Idle));
        }
        if self.run_task_ids(run_id).await?.is_empty() {
            return Err(DatabaseError::Validation(format!(
                "Run {} has no tasks",
                run.identifier
            )));
        }
        let product_ids = self.run_product_ids(run_id).await?;
        if product_ids.is_empty() {
            return Err(DatabaseError::Validation(format!(
                "Run {} has no products",
                run.identifier
            )));
        }

        let now = db_now();
        self.db().begin().await?;
        let result = async {
            self.db()
                .conn()
                .execute(
                    "UPDATE runs SET has_started = 1, is_active = 1, started_at = ?1, started_by = ?2
                     WHERE id = ?3",
                    libsql::params![to_db_time(now), started_by, run_id],
                )
                .await?;
            self.mark_products_in_progress(&product_ids).await?;
            self.record(EntityType::Run, run_id, AuditAction::Started, None)
                .await
        }
        .await;
        self.db().finish(result).await?;

        Ok(Run {
            has_started: true,
            is_active: true,
            started_at: Some(now),
            started_by: started_by.map(String::from),
            ..run
        })
    }

    async fn mark_products_in_progress(&self, product_ids: &[String]) -> Result<(), DatabaseError> {
        let Some(status) = self.find_product_status(ProductStatus::IN_PROGRESS).await? else {
            tracing::warn!(
                status = ProductStatus::IN_PROGRESS,
                "product status missing; leaving run products unchanged"
            );
            return Ok(());
        };
        for product_id in product_ids {
            let product = self.get_product(product_id).await?;
            if product.status_id != status.id {
                self.write_product_status(&product, &status).await?;
            }
        }
        Ok(())
    }

    // -- task execution ------------------------------------------------------

    /// Start the run's current task.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless the run is active with no task in progress;
    /// `Validation` when a product has no linked item for an input field.
    pub async fn start_task(&self, run_id: &str) -> Result<TaskStartResponse, DatabaseError> {
        self.db().begin().await?;
        let result = self.start_task_in_tx(run_id).await;
        self.db().finish(result).await
    }

    async fn start_task_in_tx(&self, run_id: &str) -> Result<TaskStartResponse, DatabaseError> {
        let run = self.get_run(run_id).await?;
        if run.phase() != RunPhase::Idle {
            return Err(invalid_phase(&run, RunPhase::InProgress));
        }
        let tasks = self.run_task_ids(run_id).await?;
        let position = run.current_task;
        let template_id = usize::try_from(position)
            .ok()
            .and_then(|i| tasks.get(i))
            .cloned()
            .ok_or_else(|| {
                DatabaseError::InvalidState(format!("Run {} has no task left to start", run.identifier))
            })?;
        let template = self.get_task_template(&template_id).await?;
        let fields = self.list_input_fields(&template_id).await?;
        let product_ids = self.run_product_ids(run_id).await?;

        let task_run_identifier = self.db().generate_id(PREFIX_TASK_RUN).await?;
        let now = db_now();
        let mut entries = Vec::with_capacity(product_ids.len());
        let mut transfers = Vec::new();

        for product_id in &product_ids {
            let item_id = match template.product_input_type_id {
                Some(ref type_id) => self.linked_item_of_type(product_id, type_id).await?,
                None => None,
            };
            let entry_id = self.db().generate_id(PREFIX_DATA_ENTRY).await?;
            self.db()
                .conn()
                .execute(
                    &format!(
                        "INSERT INTO data_entries ({ENTRY_COLS})
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, '{{}}', ?8, ?9, ?10)"
                    ),
                    libsql::params![
                        entry_id.as_str(),
                        run_id,
                        template_id.as_str(),
                        product_id.as_str(),
                        item_id.as_deref(),
                        task_run_identifier.as_str(),
                        DataEntryState::Active.as_str(),
                        run.started_by.as_deref(),
                        to_db_time(now),
                        to_db_time(now)
                    ],
                )
                .await?;
            entries.push(DataEntry {
                id: entry_id,
                run_id: run_id.to_string(),
                task_template_id: template_id.clone(),
                product_id: product_id.clone(),
                item_id,
                task_run_identifier: task_run_identifier.clone(),
                state: DataEntryState::Active,
                data: serde_json::json!({}),
                created_by: run.started_by.clone(),
                created_at: now,
                updated_at: now,
            });

            for field in &fields {
                let source = self
                    .linked_item_of_type(product_id, &field.item_type_id)
                    .await?
                    .ok_or_else(|| {
                        DatabaseError::Validation(format!(
                            "Product {product_id} has no linked item for input '{}'",
                            field.label
                        ))
                    })?;
                transfers.push(
                    self.create_transfer(&source, field.amount, Some(&task_run_identifier), false)
                        .await?,
                );
            }
        }

        self.db()
            .conn()
            .execute(
                "UPDATE runs SET task_in_progress = 1, task_run_identifier = ?1 WHERE id = ?2",
                [task_run_identifier.as_str(), run_id],
            )
            .await?;

        let detail = TaskRunDetail {
            task_run_identifier: task_run_identifier.clone(),
            task_template_id: template_id,
            position,
            repeat: false,
        };
        self.record(EntityType::Run, run_id, AuditAction::Started, to_detail(&detail)?)
            .await?;

        Ok(TaskStartResponse {
            run: Run {
                task_in_progress: true,
                task_run_identifier: Some(task_run_identifier.clone()),
                ..run
            },
            task_run_identifier,
            entries,
            transfers,
        })
    }

    /// First item linked to a product with the given type, oldest link first.
    async fn linked_item_of_type(
        &self,
        product_id: &str,
        item_type_id: &str,
    ) -> Result<Option<String>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT i.id FROM project_links l JOIN items i ON i.id = l.item_id
                 WHERE l.product_id = ?1 AND i.item_type_id = ?2
                 ORDER BY l.created_at, l.rowid LIMIT 1",
                [product_id, item_type_id],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row.get::<String>(0)?)),
            None => Ok(None),
        }
    }

    /// Finish the task in progress.
    ///
    /// Products listed in `failed_products` are recorded as failed, all others
    /// as succeeded. With `repeat`, entries take the repeat outcomes and the
    /// run stays on the same task.
    pub async fn finish_task(
        &self,
        run_id: &str,
        failed_products: &[String],
        repeat: bool,
    ) -> Result<TaskFinishResponse, DatabaseError> {
        self.db().begin().await?;
        let result = self.finish_task_in_tx(run_id, failed_products, repeat).await;
        self.db().finish(result).await
    }

    async fn finish_task_in_tx(
        &self,
        run_id: &str,
        failed_products: &[String],
        repeat: bool,
    ) -> Result<TaskFinishResponse, DatabaseError> {
        let run = self.get_run(run_id).await?;
        let task_run_identifier = match (run.phase(), run.task_run_identifier.clone()) {
            (RunPhase::InProgress, Some(trn)) => trn,
            _ => return Err(invalid_phase(&run, RunPhase::Idle)),
        };

        let mut transfers = Vec::new();
        for transfer in self.list_transfers_for_run(&task_run_identifier).await? {
            let transfer = if transfer.has_taken {
                transfer
            } else {
                self.take_transfer_in_tx(&transfer.id).await?.transfer
            };
            transfers.push(self.complete_transfer(&transfer.id).await?);
        }

        let failed: HashSet<&str> = failed_products.iter().map(String::as_str).collect();
        let now = db_now();
        let mut entries = Vec::new();
        for entry in self.list_entries(run_id, Some(&task_run_identifier)).await? {
            if entry.state != DataEntryState::Active {
                entries.push(entry);
                continue;
            }
            let next = DataEntryState::outcome(!failed.contains(entry.product_id.as_str()), repeat);
            entries.push(self.write_entry_state(entry, next, now).await?);
        }

        let tasks = self.run_task_ids(run_id).await?;
        let current_task = if repeat { run.current_task } else { run.current_task + 1 };
        let finished = usize::try_from(current_task).is_ok_and(|c| c >= tasks.len());
        let finished_at = finished.then_some(now);
        self.db()
            .conn()
            .execute(
                "UPDATE runs SET current_task = ?1, task_in_progress = 0, task_run_identifier = NULL,
                        is_active = ?2, finished_at = ?3
                 WHERE id = ?4",
                libsql::params![
                    i64::from(current_task),
                    i64::from(!finished),
                    finished_at.map(to_db_time),
                    run_id
                ],
            )
            .await?;

        let position = run.current_task;
        let template_id = usize::try_from(position)
            .ok()
            .and_then(|i| tasks.get(i))
            .cloned()
            .unwrap_or_default();
        let detail = TaskRunDetail {
            task_run_identifier,
            task_template_id: template_id,
            position,
            repeat,
        };
        self.record(EntityType::Run, run_id, AuditAction::Finished, to_detail(&detail)?)
            .await?;
        if finished {
            tracing::info!(run = %run.identifier, "run finished");
        }

        Ok(TaskFinishResponse {
            run: Run {
                current_task,
                task_in_progress: false,
                task_run_identifier: None,
                is_active: !finished,
                finished_at,
                ..run
            },
            entries,
            transfers,
        })
    }

    /// Abandon the task in progress: reverse taken transfers, drop untaken
    /// ones and the task's active entries.
    pub async fn stop_task(&self, run_id: &str) -> Result<Run, DatabaseError> {
        self.db().begin().await?;
        let result = self.stop_task_in_tx(run_id).await;
        self.db().finish(result).await
    }

    async fn stop_task_in_tx(&self, run_id: &str) -> Result<Run, DatabaseError> {
        let run = self.get_run(run_id).await?;
        let task_run_identifier = match (run.phase(), run.task_run_identifier.clone()) {
            (RunPhase::InProgress, Some(trn)) => trn,
            _ => return Err(invalid_phase(&run, RunPhase::Idle)),
        };

        for transfer in self.list_transfers_for_run(&task_run_identifier).await? {
            if transfer.transfer_complete {
                tracing::warn!(transfer = %transfer.id, "completed transfer kept on stopped task");
            } else if transfer.has_taken {
                self.reverse_transfer_in_tx(&transfer.id).await?;
            } else {
                self.delete_transfer(&transfer.id).await?;
            }
        }

        self.db()
            .conn()
            .execute(
                "DELETE FROM data_entries WHERE run_id = ?1 AND task_run_identifier = ?2 AND state = ?3",
                [run_id, task_run_identifier.as_str(), DataEntryState::Active.as_str()],
            )
            .await?;
        self.db()
            .conn()
            .execute(
                "UPDATE runs SET task_in_progress = 0, task_run_identifier = NULL WHERE id = ?1",
                [run_id],
            )
            .await?;

        self.record(
            EntityType::Run,
            run_id,
            AuditAction::Stopped,
            Some(serde_json::json!({ "task_run_identifier": task_run_identifier })),
        )
        .await?;

        Ok(Run {
            task_in_progress: false,
            task_run_identifier: None,
            ..run
        })
    }

    // -- data entries --------------------------------------------------------

    pub async fn get_entry(&self, id: &str) -> Result<DataEntry, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(&format!("SELECT {ENTRY_COLS} FROM data_entries WHERE id = ?1"), [id])
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("data_entry", id))?;
        row_to_entry(&row)
    }

    /// Entries of a run, optionally limited to one task run.
    pub async fn list_entries(
        &self,
        run_id: &str,
        task_run_identifier: Option<&str>,
    ) -> Result<Vec<DataEntry>, DatabaseError> {
        let rows = match task_run_identifier {
            Some(trn) => {
                self.db()
                    .conn()
                    .query(
                        &format!(
                            "SELECT {ENTRY_COLS} FROM data_entries
                             WHERE run_id = ?1 AND task_run_identifier = ?2
                             ORDER BY created_at, rowid"
                        ),
                        [run_id, trn],
                    )
                    .await?
            }
            None => {
                self.db()
                    .conn()
                    .query(
                        &format!(
                            "SELECT {ENTRY_COLS} FROM data_entries WHERE run_id = ?1
                             ORDER BY created_at, rowid"
                        ),
                        [run_id],
                    )
                    .await?
            }
        };
        collect_rows(rows, row_to_entry).await
    }

    /// Replace the JSON payload of an active entry.
    pub async fn update_entry_data(
        &self,
        entry_id: &str,
        data: serde_json::Value,
    ) -> Result<DataEntry, DatabaseError> {
        let entry = self.get_entry(entry_id).await?;
        if entry.state.is_terminal() {
            return Err(DatabaseError::InvalidState(format!(
                "Data entry {entry_id} is {} and can no longer change",
                entry.state
            )));
        }
        let now = db_now();
        self.db()
            .conn()
            .execute(
                "UPDATE data_entries SET data = ?1, updated_at = ?2 WHERE id = ?3",
                libsql::params![data.to_string(), to_db_time(now), entry_id],
            )
            .await?;
        self.record(EntityType::DataEntry, entry_id, AuditAction::Updated, None)
            .await?;
        Ok(DataEntry {
            data,
            updated_at: now,
            ..entry
        })
    }

    async fn write_entry_state(
        &self,
        entry: DataEntry,
        next: DataEntryState,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<DataEntry, DatabaseError> {
        if !entry.state.can_transition_to(next) {
            return Err(CoreError::InvalidTransition {
                entity_type: EntityType::DataEntry.as_str().to_string(),
                id: entry.id,
                from: entry.state.as_str().to_string(),
                to: next.as_str().to_string(),
            }
            .into());
        }
        self.db()
            .conn()
            .execute(
                "UPDATE data_entries SET state = ?1, updated_at = ?2 WHERE id = ?3",
                libsql::params![next.as_str(), to_db_time(now), entry.id.as_str()],
            )
            .await?;
        let detail = lims_core::audit_detail::StatusChangedDetail {
            from: entry.state.as_str().to_string(),
            to: next.as_str().to_string(),
            reason: None,
        };
        self.record(EntityType::DataEntry, &entry.id, AuditAction::StatusChanged, to_detail(&detail)?)
            .await?;
        Ok(DataEntry {
            state: next,
            updated_at: now,
            ..entry
        })
    }

    /// Transfers recorded for a run's current or past task runs.
    pub async fn list_run_transfers(&self, run_id: &str) -> Result<Vec<ItemTransfer>, DatabaseError> {
        let rows = self
            .db()
            .conn()
            .query(
                "SELECT DISTINCT task_run_identifier FROM data_entries WHERE run_id = ?1",
                [run_id],
            )
            .await?;
        let task_runs = collect_rows(rows, |row| Ok(row.get::<String>(0)?)).await?;
        let mut transfers = Vec::new();
        for trn in task_runs {
            transfers.extend(self.list_transfers_for_run(&trn).await?);
        }
        Ok(transfers)
    }
}
