//! Item transfer repository.
//!
//! A transfer is recorded first, then *taken* (stock moves), then *completed*.
//! Taking and reversing change two rows and run inside one transaction; a
//! removal never drives an item's stock below zero.

use lims_core::audit_detail::{LinkedDetail, StockMovedDetail};
use lims_core::entities::{Item, ItemTransfer};
use lims_core::enums::{AuditAction, EntityType};
use lims_core::errors::require_positive;
use lims_core::ids::PREFIX_TRANSFER;
use lims_core::responses::TransferTakeResponse;

use crate::error::DatabaseError;
use crate::helpers::{collect_rows, db_now, get_bool, get_datetime, get_opt_string, to_db_time, to_detail};
use crate::service::LimsService;

/// Rounding slack allowed when a removal drains an item to exactly zero.
pub const STOCK_TOLERANCE: f64 = 1e-9;

const SELECT_COLS: &str = "id, item_id, amount_to_take, amount_available, amount_measure_id, \
     is_addition, run_identifier, linked_transfer_id, has_taken, transfer_complete, \
     created_at, updated_at";

fn row_to_transfer(row: &libsql::Row) -> Result<ItemTransfer, DatabaseError> {
    Ok(ItemTransfer {
        id: row.get(0)?,
        item_id: row.get(1)?,
        amount_to_take: row.get(2)?,
        amount_available: row.get(3)?,
        amount_measure_id: get_opt_string(row, 4)?,
        is_addition: get_bool(row, 5)?,
        run_identifier: get_opt_string(row, 6)?,
        linked_transfer_id: get_opt_string(row, 7)?,
        has_taken: get_bool(row, 8)?,
        transfer_complete: get_bool(row, 9)?,
        created_at: get_datetime(row, 10)?,
        updated_at: get_datetime(row, 11)?,
    })
}

impl LimsService {
    pub async fn create_transfer(
        &self,
        item_id: &str,
        amount: f64,
        run_identifier: Option<&str>,
        is_addition: bool,
    ) -> Result<ItemTransfer, DatabaseError> {
        require_positive("amount_to_take", amount)?;
        let item = self.get_item(item_id).await?;

        let now = db_now();
        let id = self.db().generate_id(PREFIX_TRANSFER).await?;
        self.db()
            .conn()
            .execute(
                &format!(
                    "INSERT INTO item_transfers ({SELECT_COLS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, NULL, 0, 0, ?8, ?9)"
                ),
                libsql::params![
                    id.as_str(),
                    item_id,
                    amount,
                    item.amount_available,
                    item.amount_measure_id.as_deref(),
                    i64::from(is_addition),
                    run_identifier,
                    to_db_time(now),
                    to_db_time(now)
                ],
            )
            .await?;

        self.record(
            EntityType::ItemTransfer,
            &id,
            AuditAction::Created,
            Some(serde_json::json!({ "item_id": item_id, "amount": amount, "is_addition": is_addition })),
        )
        .await?;

        Ok(ItemTransfer {
            id,
            item_id: item_id.to_string(),
            amount_to_take: amount,
            amount_available: item.amount_available,
            amount_measure_id: item.amount_measure_id,
            is_addition,
            run_identifier: run_identifier.map(String::from),
            linked_transfer_id: None,
            has_taken: false,
            transfer_complete: false,
            created_at: now,
            updated_at: now,
        })
    }

    pub async fn get_transfer(&self, id: &str) -> Result<ItemTransfer, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(&format!("SELECT {SELECT_COLS} FROM item_transfers WHERE id = ?1"), [id])
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("transfer", id))?;
        row_to_transfer(&row)
    }

    /// Move the stock of a transfer and mark it taken.
    ///
    /// # Errors
    ///
    /// `InsufficientStock` when a removal exceeds the item's stock;
    /// `InvalidState` when the transfer was already taken.
    pub async fn take_transfer(&self, id: &str) -> Result<TransferTakeResponse, DatabaseError> {
        self.db().begin().await?;
        let result = self.take_transfer_in_tx(id).await;
        self.db().finish(result).await
    }

    pub(crate) async fn take_transfer_in_tx(
        &self,
        id: &str,
    ) -> Result<TransferTakeResponse, DatabaseError> {
        let transfer = self.get_transfer(id).await?;
        if transfer.has_taken {
            return Err(DatabaseError::InvalidState(format!(
                "Transfer {id} has already been taken"
            )));
        }

        let item = self.apply_stock_delta(&transfer.item_id, transfer.delta()).await?;
        let now = db_now();
        self.db()
            .conn()
            .execute(
                "UPDATE item_transfers SET has_taken = 1, amount_available = ?1, updated_at = ?2
                 WHERE id = ?3",
                libsql::params![item.amount_available, to_db_time(now), id],
            )
            .await?;

        let detail = StockMovedDetail {
            item_id: item.id.clone(),
            amount: transfer.amount_to_take,
            is_addition: transfer.is_addition,
            amount_available: item.amount_available,
        };
        self.record(EntityType::ItemTransfer, id, AuditAction::Taken, to_detail(&detail)?)
            .await?;

        Ok(TransferTakeResponse {
            transfer: ItemTransfer {
                has_taken: true,
                amount_available: item.amount_available,
                updated_at: now,
                ..transfer
            },
            item,
        })
    }

    /// Apply a signed stock change, refusing to go below zero.
    ///
    /// Draws within [`STOCK_TOLERANCE`] of the remaining stock succeed and
    /// leave exactly zero.
    async fn apply_stock_delta(&self, item_id: &str, delta: f64) -> Result<Item, DatabaseError> {
        let changed = self
            .db()
            .conn()
            .execute(
                "UPDATE items SET amount_available = MAX(0.0, amount_available + ?1), updated_at = ?2
                 WHERE id = ?3 AND amount_available + ?1 >= ?4",
                libsql::params![delta, to_db_time(db_now()), item_id, -STOCK_TOLERANCE],
            )
            .await?;
        if changed == 0 {
            let item = self.get_item(item_id).await?;
            return Err(DatabaseError::InsufficientStock {
                item: item.identifier,
                available: item.amount_available,
                requested: delta.abs(),
            });
        }
        self.get_item(item_id).await
    }

    /// Mark a taken transfer complete.
    pub async fn complete_transfer(&self, id: &str) -> Result<ItemTransfer, DatabaseError> {
        let transfer = self.get_transfer(id).await?;
        if !transfer.has_taken {
            return Err(DatabaseError::InvalidState(format!(
                "Transfer {id} must be taken before it can be completed"
            )));
        }
        if transfer.transfer_complete {
            return Ok(transfer);
        }

        let now = db_now();
        self.db()
            .conn()
            .execute(
                "UPDATE item_transfers SET transfer_complete = 1, updated_at = ?1 WHERE id = ?2",
                libsql::params![to_db_time(now), id],
            )
            .await?;
        self.record(EntityType::ItemTransfer, id, AuditAction::Completed, None)
            .await?;

        Ok(ItemTransfer {
            transfer_complete: true,
            updated_at: now,
            ..transfer
        })
    }

    /// Undo a taken, incomplete transfer: restore stock and clear `has_taken`.
    pub async fn reverse_transfer(&self, id: &str) -> Result<TransferTakeResponse, DatabaseError> {
        self.db().begin().await?;
        let result = self.reverse_transfer_in_tx(id).await;
        self.db().finish(result).await
    }

    pub(crate) async fn reverse_transfer_in_tx(
        &self,
        id: &str,
    ) -> Result<TransferTakeResponse, DatabaseError> {
        let transfer = self.get_transfer(id).await?;
        if !transfer.has_taken {
            return Err(DatabaseError::InvalidState(format!(
                "Transfer {id} has not been taken"
            )));
        }
        if transfer.transfer_complete {
            return Err(DatabaseError::InvalidState(format!(
                "Transfer {id} is complete and cannot be reversed"
            )));
        }

        let item = self.apply_stock_delta(&transfer.item_id, -transfer.delta()).await?;
        let now = db_now();
        self.db()
            .conn()
            .execute(
                "UPDATE item_transfers SET has_taken = 0, amount_available = ?1, updated_at = ?2
                 WHERE id = ?3",
                libsql::params![item.amount_available, to_db_time(now), id],
            )
            .await?;

        let detail = StockMovedDetail {
            item_id: item.id.clone(),
            amount: transfer.amount_to_take,
            is_addition: !transfer.is_addition,
            amount_available: item.amount_available,
        };
        self.record(EntityType::ItemTransfer, id, AuditAction::Reversed, to_detail(&detail)?)
            .await?;

        Ok(TransferTakeResponse {
            transfer: ItemTransfer {
                has_taken: false,
                amount_available: item.amount_available,
                updated_at: now,
                ..transfer
            },
            item,
        })
    }

    /// Delete a transfer that never moved stock.
    pub async fn delete_transfer(&self, id: &str) -> Result<(), DatabaseError> {
        let transfer = self.get_transfer(id).await?;
        if transfer.has_taken {
            return Err(DatabaseError::InvalidState(format!(
                "Transfer {id} has been taken; reverse it instead"
            )));
        }
        self.db()
            .conn()
            .execute("DELETE FROM item_transfers WHERE id = ?1", [id])
            .await?;
        self.record(EntityType::ItemTransfer, id, AuditAction::Deleted, None)
            .await
    }

    /// Pair two transfers symmetrically.
    pub async fn link_transfers(
        &self,
        a_id: &str,
        b_id: &str,
    ) -> Result<(ItemTransfer, ItemTransfer), DatabaseError> {
        if a_id == b_id {
            return Err(DatabaseError::Validation(format!(
                "Transfer {a_id} cannot be linked to itself"
            )));
        }
        let a = self.get_transfer(a_id).await?;
        let b = self.get_transfer(b_id).await?;
        for (this, other) in [(&a, b_id), (&b, a_id)] {
            if let Some(ref linked) = this.linked_transfer_id {
                if linked != other {
                    return Err(DatabaseError::Conflict(format!(
                        "Transfer {} is already linked to {linked}",
                        this.id
                    )));
                }
            }
        }

        self.db().begin().await?;
        let result = async {
            let now = to_db_time(db_now());
            for (this, other) in [(a_id, b_id), (b_id, a_id)] {
                self.db()
                    .conn()
                    .execute(
                        "UPDATE item_transfers SET linked_transfer_id = ?1, updated_at = ?2 WHERE id = ?3",
                        libsql::params![other, now.as_str(), this],
                    )
                    .await?;
            }
            let detail = LinkedDetail {
                source_type: EntityType::ItemTransfer.as_str().to_string(),
                source_id: a_id.to_string(),
                target_type: EntityType::ItemTransfer.as_str().to_string(),
                target_id: b_id.to_string(),
            };
            self.record(EntityType::ItemTransfer, a_id, AuditAction::Linked, to_detail(&detail)?)
                .await
        }
        .await;
        self.db().finish(result).await?;

        Ok((self.get_transfer(a_id).await?, self.get_transfer(b_id).await?))
    }

    pub async fn list_transfers_for_run(
        &self,
        run_identifier: &str,
    ) -> Result<Vec<ItemTransfer>, DatabaseError> {
        let rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM item_transfers WHERE run_identifier = ?1
                     ORDER BY created_at, rowid"
                ),
                [run_identifier],
            )
            .await?;
        collect_rows(rows, row_to_transfer).await
    }

    pub async fn list_transfers_for_item(
        &self,
        item_id: &str,
    ) -> Result<Vec<ItemTransfer>, DatabaseError> {
        let rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM item_transfers WHERE item_id = ?1
                     ORDER BY created_at, rowid"
                ),
                [item_id],
            )
            .await?;
        collect_rows(rows, row_to_transfer).await
    }
}
