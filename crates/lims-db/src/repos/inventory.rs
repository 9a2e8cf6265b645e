//! Inventory repository: amount measures, item types, sets, and items.

use lims_core::entities::{AmountMeasure, InventorySet, Item, ItemType};
use lims_core::enums::{AuditAction, EntityType};
use lims_core::errors::{require_non_blank, require_non_negative};
use lims_core::ids::{PREFIX_ITEM, PREFIX_ITEM_TYPE, PREFIX_SET};

use crate::error::DatabaseError;
use crate::helpers::{collect_rows, db_now, get_bool, get_datetime, get_opt_string, to_db_time, to_detail};
use crate::service::LimsService;
use crate::updates::SetClauses;
use crate::updates::item::ItemUpdate;

const ITEM_COLS: &str = "id, name, identifier, barcode, item_type_id, location_id, \
     amount_available, amount_measure_id, in_inventory, added_by, created_at, updated_at";

const ITEM_TYPE_COLS: &str = "id, name, parent_id, created_at";

pub(crate) fn row_to_item(row: &libsql::Row) -> Result<Item, DatabaseError> {
    Ok(Item {
        id: row.get(0)?,
        name: row.get(1)?,
        identifier: row.get(2)?,
        barcode: get_opt_string(row, 3)?,
        item_type_id: row.get(4)?,
        location_id: get_opt_string(row, 5)?,
        amount_available: row.get(6)?,
        amount_measure_id: get_opt_string(row, 7)?,
        in_inventory: get_bool(row, 8)?,
        added_by: get_opt_string(row, 9)?,
        created_at: get_datetime(row, 10)?,
        updated_at: get_datetime(row, 11)?,
    })
}

fn row_to_item_type(row: &libsql::Row) -> Result<ItemType, DatabaseError> {
    Ok(ItemType {
        id: row.get(0)?,
        name: row.get(1)?,
        parent_id: get_opt_string(row, 2)?,
        created_at: get_datetime(row, 3)?,
    })
}

fn row_to_measure(row: &libsql::Row) -> Result<AmountMeasure, DatabaseError> {
    Ok(AmountMeasure {
        id: row.get(0)?,
        name: row.get(1)?,
        symbol: row.get(2)?,
    })
}

/// Fields for a new inventory item.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub name: String,
    pub identifier: String,
    pub item_type_id: String,
    pub barcode: Option<String>,
    pub location_id: Option<String>,
    pub amount_available: f64,
    pub amount_measure_id: Option<String>,
    pub in_inventory: bool,
    pub added_by: Option<String>,
}

impl NewItem {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        identifier: impl Into<String>,
        item_type_id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            identifier: identifier.into(),
            item_type_id: item_type_id.into(),
            barcode: None,
            location_id: None,
            amount_available: 0.0,
            amount_measure_id: None,
            in_inventory: true,
            added_by: None,
        }
    }

    #[must_use]
    pub const fn amount(mut self, amount: f64) -> Self {
        self.amount_available = amount;
        self
    }

    #[must_use]
    pub fn location(mut self, location_id: impl Into<String>) -> Self {
        self.location_id = Some(location_id.into());
        self
    }

    #[must_use]
    pub fn barcode(mut self, barcode: impl Into<String>) -> Self {
        self.barcode = Some(barcode.into());
        self
    }

    #[must_use]
    pub fn measure(mut self, amount_measure_id: impl Into<String>) -> Self {
        self.amount_measure_id = Some(amount_measure_id.into());
        self
    }
}

/// Filter criteria for item listing.
#[derive(Debug, Default)]
pub struct ItemFilter {
    pub item_type_id: Option<String>,
    pub location_id: Option<String>,
    pub set_id: Option<String>,
    pub in_inventory: Option<bool>,
    pub limit: Option<u32>,
}

impl LimsService {
    // -- measures ------------------------------------------------------------

    pub async fn list_measures(&self) -> Result<Vec<AmountMeasure>, DatabaseError> {
        let rows = self
            .db()
            .conn()
            .query("SELECT id, name, symbol FROM amount_measures ORDER BY name", ())
            .await?;
        collect_rows(rows, row_to_measure).await
    }

    pub async fn get_measure_by_symbol(&self, symbol: &str) -> Result<AmountMeasure, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT id, name, symbol FROM amount_measures WHERE symbol = ?1",
                [symbol],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("amount measure", symbol))?;
        row_to_measure(&row)
    }

    // -- item types ----------------------------------------------------------

    pub async fn create_item_type(
        &self,
        name: &str,
        parent_id: Option<&str>,
    ) -> Result<ItemType, DatabaseError> {
        require_non_blank("name", name)?;
        if let Some(parent) = parent_id {
            self.get_item_type(parent).await?;
        }

        let now = db_now();
        let id = self.db().generate_id(PREFIX_ITEM_TYPE).await?;
        self.db()
            .conn()
            .execute(
                &format!("INSERT INTO item_types ({ITEM_TYPE_COLS}) VALUES (?1, ?2, ?3, ?4)"),
                libsql::params![id.as_str(), name, parent_id, to_db_time(now)],
            )
            .await
            .map_err(|e| DatabaseError::from_write(e, &format!("item type '{name}'")))?;

        self.record(EntityType::ItemType, &id, AuditAction::Created, None)
            .await?;

        Ok(ItemType {
            id,
            name: name.to_string(),
            parent_id: parent_id.map(String::from),
            created_at: now,
        })
    }

    pub async fn get_item_type(&self, id: &str) -> Result<ItemType, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(&format!("SELECT {ITEM_TYPE_COLS} FROM item_types WHERE id = ?1"), [id])
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("item type", id))?;
        row_to_item_type(&row)
    }

    pub async fn get_item_type_by_name(&self, name: &str) -> Result<ItemType, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(&format!("SELECT {ITEM_TYPE_COLS} FROM item_types WHERE name = ?1"), [name])
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("item type", name))?;
        row_to_item_type(&row)
    }

    pub async fn list_item_types(&self) -> Result<Vec<ItemType>, DatabaseError> {
        let rows = self
            .db()
            .conn()
            .query(&format!("SELECT {ITEM_TYPE_COLS} FROM item_types ORDER BY name"), ())
            .await?;
        collect_rows(rows, row_to_item_type).await
    }

    // -- sets ----------------------------------------------------------------

    pub async fn create_set(&self, name: &str, is_public: bool) -> Result<InventorySet, DatabaseError> {
        require_non_blank("name", name)?;
        let now = db_now();
        let id = self.db().generate_id(PREFIX_SET).await?;
        self.db()
            .conn()
            .execute(
                "INSERT INTO inventory_sets (id, name, is_public, created_at) VALUES (?1, ?2, ?3, ?4)",
                libsql::params![id.as_str(), name, i64::from(is_public), to_db_time(now)],
            )
            .await
            .map_err(|e| DatabaseError::from_write(e, &format!("set '{name}'")))?;

        self.record(EntityType::InventorySet, &id, AuditAction::Created, None)
            .await?;

        Ok(InventorySet {
            id,
            name: name.to_string(),
            is_public,
            created_at: now,
        })
    }

    /// Add an item to a set. Adding twice is a no-op.
    pub async fn add_item_to_set(&self, set_id: &str, item_id: &str) -> Result<(), DatabaseError> {
        self.get_item(item_id).await?;
        let inserted = self
            .db()
            .conn()
            .execute(
                "INSERT OR IGNORE INTO set_items (set_id, item_id) VALUES (?1, ?2)",
                [set_id, item_id],
            )
            .await
            .map_err(|e| DatabaseError::from_write(e, "set membership"))?;
        if inserted > 0 {
            self.record(
                EntityType::InventorySet,
                set_id,
                AuditAction::Linked,
                Some(serde_json::json!({ "item_id": item_id })),
            )
            .await?;
        }
        Ok(())
    }

    pub async fn remove_item_from_set(&self, set_id: &str, item_id: &str) -> Result<bool, DatabaseError> {
        let removed = self
            .db()
            .conn()
            .execute(
                "DELETE FROM set_items WHERE set_id = ?1 AND item_id = ?2",
                [set_id, item_id],
            )
            .await?;
        if removed > 0 {
            self.record(
                EntityType::InventorySet,
                set_id,
                AuditAction::Unlinked,
                Some(serde_json::json!({ "item_id": item_id })),
            )
            .await?;
        }
        Ok(removed > 0)
    }

    // -- items ---------------------------------------------------------------

    pub async fn create_item(&self, new: NewItem) -> Result<Item, DatabaseError> {
        require_non_blank("name", &new.name)?;
        require_non_blank("identifier", &new.identifier)?;
        require_non_negative("amount_available", new.amount_available)?;
        self.get_item_type(&new.item_type_id).await?;

        let now = db_now();
        let id = self.db().generate_id(PREFIX_ITEM).await?;
        self.db()
            .conn()
            .execute(
                &format!(
                    "INSERT INTO items ({ITEM_COLS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
                ),
                libsql::params![
                    id.as_str(),
                    new.name.as_str(),
                    new.identifier.as_str(),
                    new.barcode.as_deref(),
                    new.item_type_id.as_str(),
                    new.location_id.as_deref(),
                    new.amount_available,
                    new.amount_measure_id.as_deref(),
                    i64::from(new.in_inventory),
                    new.added_by.as_deref(),
                    to_db_time(now),
                    to_db_time(now)
                ],
            )
            .await
            .map_err(|e| DatabaseError::from_write(e, &format!("item '{}'", new.identifier)))?;

        self.record(EntityType::Item, &id, AuditAction::Created, None)
            .await?;

        Ok(Item {
            id,
            name: new.name,
            identifier: new.identifier,
            barcode: new.barcode,
            item_type_id: new.item_type_id,
            location_id: new.location_id,
            amount_available: new.amount_available,
            amount_measure_id: new.amount_measure_id,
            in_inventory: new.in_inventory,
            added_by: new.added_by,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_item_where(&self, column: &str, value: &str) -> Result<Item, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(&format!("SELECT {ITEM_COLS} FROM items WHERE {column} = ?1"), [value])
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("item", value))?;
        row_to_item(&row)
    }

    pub async fn get_item(&self, id: &str) -> Result<Item, DatabaseError> {
        self.get_item_where("id", id).await
    }

    pub async fn get_item_by_identifier(&self, identifier: &str) -> Result<Item, DatabaseError> {
        self.get_item_where("identifier", identifier).await
    }

    pub async fn get_item_by_barcode(&self, barcode: &str) -> Result<Item, DatabaseError> {
        self.get_item_where("barcode", barcode).await
    }

    pub async fn update_item(&self, item_id: &str, update: ItemUpdate) -> Result<Item, DatabaseError> {
        let mut clauses = SetClauses::default();
        if let Some(ref name) = update.name {
            require_non_blank("name", name)?;
            clauses.push("name", name.clone());
        }
        if let Some(ref barcode) = update.barcode {
            clauses.push_opt("barcode", barcode.clone());
        }
        if let Some(ref item_type_id) = update.item_type_id {
            self.get_item_type(item_type_id).await?;
            clauses.push("item_type_id", item_type_id.clone());
        }
        if let Some(ref location_id) = update.location_id {
            clauses.push_opt("location_id", location_id.clone());
        }
        if let Some(ref measure) = update.amount_measure_id {
            clauses.push_opt("amount_measure_id", measure.clone());
        }
        if let Some(in_inventory) = update.in_inventory {
            clauses.push("in_inventory", i64::from(in_inventory));
        }

        if clauses.is_empty() {
            return self.get_item(item_id).await;
        }

        clauses.push("updated_at", to_db_time(db_now()));
        let (sql, params) = clauses.into_update("items", item_id);
        let changed = self
            .db()
            .conn()
            .execute(&sql, libsql::params_from_iter(params))
            .await
            .map_err(|e| DatabaseError::from_write(e, "item barcode"))?;
        if changed == 0 {
            return Err(DatabaseError::not_found("item", item_id));
        }

        self.record(EntityType::Item, item_id, AuditAction::Updated, to_detail(&update)?)
            .await?;
        self.get_item(item_id).await
    }

    /// Overwrite an item's stock level (stock-take correction).
    pub async fn set_item_amount(&self, item_id: &str, amount: f64) -> Result<Item, DatabaseError> {
        require_non_negative("amount_available", amount)?;
        let before = self.get_item(item_id).await?;
        let now = db_now();
        self.db()
            .conn()
            .execute(
                "UPDATE items SET amount_available = ?1, updated_at = ?2 WHERE id = ?3",
                libsql::params![amount, to_db_time(now), item_id],
            )
            .await?;

        self.record(
            EntityType::Item,
            item_id,
            AuditAction::Updated,
            Some(serde_json::json!({
                "amount_available": { "from": before.amount_available, "to": amount }
            })),
        )
        .await?;

        Ok(Item {
            amount_available: amount,
            updated_at: now,
            ..before
        })
    }

    pub async fn list_items(&self, filter: &ItemFilter) -> Result<Vec<Item>, DatabaseError> {
        let mut conditions = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();

        if let Some(ref type_id) = filter.item_type_id {
            params.push(type_id.clone().into());
            conditions.push(format!("item_type_id = ?{}", params.len()));
        }
        if let Some(ref location_id) = filter.location_id {
            params.push(location_id.clone().into());
            conditions.push(format!("location_id = ?{}", params.len()));
        }
        if let Some(ref set_id) = filter.set_id {
            params.push(set_id.clone().into());
            conditions.push(format!(
                "id IN (SELECT item_id FROM set_items WHERE set_id = ?{})",
                params.len()
            ));
        }
        if let Some(in_inventory) = filter.in_inventory {
            params.push(i64::from(in_inventory).into());
            conditions.push(format!("in_inventory = ?{}", params.len()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let limit = filter.limit.unwrap_or(100);
        let rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {ITEM_COLS} FROM items {where_clause} ORDER BY name, identifier LIMIT {limit}"
                ),
                libsql::params_from_iter(params),
            )
            .await?;
        collect_rows(rows, row_to_item).await
    }
}
