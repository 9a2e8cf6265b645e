//! Equipment, reservations, and instrument data files.
//!
//! Reservations cover the half-open interval `[start, end)`; two bookings of
//! the same device may touch but never overlap.

use chrono::{DateTime, Utc};
use lims_core::audit_detail::StatusChangedDetail;
use lims_core::entities::{DataFile, Equipment, EquipmentReservation};
use lims_core::enums::{AuditAction, EntityType, EquipmentStatus};
use lims_core::errors::require_non_blank;
use lims_core::ids::{PREFIX_DATA_FILE, PREFIX_EQUIPMENT, PREFIX_RESERVATION};

use crate::error::DatabaseError;
use crate::helpers::{collect_rows, db_now, get_bool, get_datetime, get_opt_string, parse_enum, to_db_time, to_detail};
use crate::service::LimsService;

const EQUIPMENT_COLS: &str = "id, name, status, can_reserve, location_id, created_at";

const RESERVATION_COLS: &str = "id, equipment_id, start_at, end_at, reserved_for, reserved_by, \
     is_confirmed, checked_in, created_at";

const DATA_FILE_COLS: &str =
    "id, run_id, equipment_id, task_run_identifier, file_name, path, created_at";

fn row_to_equipment(row: &libsql::Row) -> Result<Equipment, DatabaseError> {
    Ok(Equipment {
        id: row.get(0)?,
        name: row.get(1)?,
        status: parse_enum(&row.get::<String>(2)?)?,
        can_reserve: get_bool(row, 3)?,
        location_id: get_opt_string(row, 4)?,
        created_at: get_datetime(row, 5)?,
    })
}

fn row_to_reservation(row: &libsql::Row) -> Result<EquipmentReservation, DatabaseError> {
    Ok(EquipmentReservation {
        id: row.get(0)?,
        equipment_id: row.get(1)?,
        start: get_datetime(row, 2)?,
        end: get_datetime(row, 3)?,
        reserved_for: get_opt_string(row, 4)?,
        reserved_by: get_opt_string(row, 5)?,
        is_confirmed: get_bool(row, 6)?,
        checked_in: get_bool(row, 7)?,
        created_at: get_datetime(row, 8)?,
    })
}

fn row_to_data_file(row: &libsql::Row) -> Result<DataFile, DatabaseError> {
    Ok(DataFile {
        id: row.get(0)?,
        run_id: row.get(1)?,
        equipment_id: get_opt_string(row, 2)?,
        task_run_identifier: get_opt_string(row, 3)?,
        file_name: row.get(4)?,
        path: row.get(5)?,
        created_at: get_datetime(row, 6)?,
    })
}

/// A reservation request.
#[derive(Debug, Clone)]
pub struct NewReservation {
    pub equipment_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub reserved_for: Option<String>,
    pub reserved_by: Option<String>,
}

impl LimsService {
    // -- equipment -----------------------------------------------------------

    pub async fn create_equipment(
        &self,
        name: &str,
        can_reserve: bool,
        location_id: Option<&str>,
    ) -> Result<Equipment, DatabaseError> {
        require_non_blank("name", name)?;
        if let Some(location) = location_id {
            self.get_location(location).await?;
        }

        let now = db_now();
        let id = self.db().generate_id(PREFIX_EQUIPMENT).await?;
        self.db()
            .conn()
            .execute(
                &format!("INSERT INTO equipment ({EQUIPMENT_COLS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"),
                libsql::params![
                    id.as_str(),
                    name,
                    EquipmentStatus::Idle.as_str(),
                    i64::from(can_reserve),
                    location_id,
                    to_db_time(now)
                ],
            )
            .await
            .map_err(|e| DatabaseError::from_write(e, &format!("equipment '{name}'")))?;

        self.record(EntityType::Equipment, &id, AuditAction::Created, None)
            .await?;

        Ok(Equipment {
            id,
            name: name.to_string(),
            status: EquipmentStatus::Idle,
            can_reserve,
            location_id: location_id.map(String::from),
            created_at: now,
        })
    }

    pub async fn get_equipment(&self, id: &str) -> Result<Equipment, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(&format!("SELECT {EQUIPMENT_COLS} FROM equipment WHERE id = ?1"), [id])
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("equipment", id))?;
        row_to_equipment(&row)
    }

    pub async fn list_equipment(&self) -> Result<Vec<Equipment>, DatabaseError> {
        let rows = self
            .db()
            .conn()
            .query(&format!("SELECT {EQUIPMENT_COLS} FROM equipment ORDER BY name"), ())
            .await?;
        collect_rows(rows, row_to_equipment).await
    }

    pub async fn set_equipment_status(
        &self,
        id: &str,
        status: EquipmentStatus,
    ) -> Result<Equipment, DatabaseError> {
        let equipment = self.get_equipment(id).await?;
        if equipment.status == status {
            return Ok(equipment);
        }
        self.db()
            .conn()
            .execute(
                "UPDATE equipment SET status = ?1 WHERE id = ?2",
                [status.as_str(), id],
            )
            .await?;

        let detail = StatusChangedDetail {
            from: equipment.status.as_str().to_string(),
            to: status.as_str().to_string(),
            reason: None,
        };
        self.record(EntityType::Equipment, id, AuditAction::StatusChanged, to_detail(&detail)?)
            .await?;

        Ok(Equipment { status, ..equipment })
    }

    // -- reservations --------------------------------------------------------

    /// Book a device. Rejects unreservable devices and overlapping intervals.
    pub async fn reserve_equipment(
        &self,
        new: NewReservation,
    ) -> Result<EquipmentReservation, DatabaseError> {
        if new.end <= new.start {
            return Err(DatabaseError::Validation(
                "reservation end must be after its start".into(),
            ));
        }
        let equipment = self.get_equipment(&new.equipment_id).await?;
        if !equipment.is_reservable() {
            return Err(DatabaseError::InvalidState(format!(
                "Equipment '{}' cannot be reserved",
                equipment.name
            )));
        }

        let now = db_now();
        let id = self.db().generate_id(PREFIX_RESERVATION).await?;

        self.db().begin().await?;
        let result = async {
            let clashes = self
                .reservations_between(&new.equipment_id, new.start, new.end)
                .await?;
            if let Some(clash) = clashes.first() {
                return Err(DatabaseError::Conflict(format!(
                    "Equipment '{}' is already reserved from {} to {} ({})",
                    equipment.name, clash.start, clash.end, clash.id
                )));
            }
            self.db()
                .conn()
                .execute(
                    &format!(
                        "INSERT INTO equipment_reservations ({RESERVATION_COLS})
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, 0, ?7)"
                    ),
                    libsql::params![
                        id.as_str(),
                        new.equipment_id.as_str(),
                        to_db_time(new.start),
                        to_db_time(new.end),
                        new.reserved_for.as_deref(),
                        new.reserved_by.as_deref(),
                        to_db_time(now)
                    ],
                )
                .await?;
            self.record(
                EntityType::Reservation,
                &id,
                AuditAction::Created,
                Some(serde_json::json!({ "equipment_id": new.equipment_id })),
            )
            .await
        }
        .await;
        self.db().finish(result).await?;

        Ok(EquipmentReservation {
            id,
            equipment_id: new.equipment_id,
            start: new.start,
            end: new.end,
            reserved_for: new.reserved_for,
            reserved_by: new.reserved_by,
            is_confirmed: false,
            checked_in: false,
            created_at: now,
        })
    }

    pub async fn get_reservation(&self, id: &str) -> Result<EquipmentReservation, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {RESERVATION_COLS} FROM equipment_reservations WHERE id = ?1"),
                [id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("reservation", id))?;
        row_to_reservation(&row)
    }

    pub async fn confirm_reservation(&self, id: &str) -> Result<EquipmentReservation, DatabaseError> {
        let reservation = self.get_reservation(id).await?;
        if reservation.is_confirmed {
            return Ok(reservation);
        }
        self.db()
            .conn()
            .execute("UPDATE equipment_reservations SET is_confirmed = 1 WHERE id = ?1", [id])
            .await?;
        self.record(EntityType::Reservation, id, AuditAction::Updated, Some(serde_json::json!({ "confirmed": true })))
            .await?;
        Ok(EquipmentReservation {
            is_confirmed: true,
            ..reservation
        })
    }

    /// Check in a confirmed reservation.
    pub async fn check_in_reservation(&self, id: &str) -> Result<EquipmentReservation, DatabaseError> {
        let reservation = self.get_reservation(id).await?;
        if !reservation.is_confirmed {
            return Err(DatabaseError::InvalidState(format!(
                "Reservation {id} must be confirmed before check-in"
            )));
        }
        if reservation.checked_in {
            return Ok(reservation);
        }
        self.db()
            .conn()
            .execute("UPDATE equipment_reservations SET checked_in = 1 WHERE id = ?1", [id])
            .await?;
        self.record(EntityType::Reservation, id, AuditAction::Updated, Some(serde_json::json!({ "checked_in": true })))
            .await?;
        Ok(EquipmentReservation {
            checked_in: true,
            ..reservation
        })
    }

    pub async fn cancel_reservation(&self, id: &str) -> Result<(), DatabaseError> {
        self.get_reservation(id).await?;
        self.db()
            .conn()
            .execute("DELETE FROM equipment_reservations WHERE id = ?1", [id])
            .await?;
        self.record(EntityType::Reservation, id, AuditAction::Deleted, None)
            .await
    }

    /// Reservations of a device, optionally only those overlapping `window`.
    pub async fn list_reservations(
        &self,
        equipment_id: &str,
        window: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Result<Vec<EquipmentReservation>, DatabaseError> {
        match window {
            Some((start, end)) => self.reservations_between(equipment_id, start, end).await,
            None => {
                let rows = self
                    .db()
                    .conn()
                    .query(
                        &format!(
                            "SELECT {RESERVATION_COLS} FROM equipment_reservations
                             WHERE equipment_id = ?1 ORDER BY start_at"
                        ),
                        [equipment_id],
                    )
                    .await?;
                collect_rows(rows, row_to_reservation).await
            }
        }
    }

    async fn reservations_between(
        &self,
        equipment_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<EquipmentReservation>, DatabaseError> {
        let rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {RESERVATION_COLS} FROM equipment_reservations
                     WHERE equipment_id = ?1 AND start_at < ?3 AND ?2 < end_at
                     ORDER BY start_at"
                ),
                libsql::params![equipment_id, to_db_time(start), to_db_time(end)],
            )
            .await?;
        collect_rows(rows, row_to_reservation).await
    }

    // -- data files ----------------------------------------------------------

    pub async fn add_data_file(
        &self,
        run_id: &str,
        equipment_id: Option<&str>,
        task_run_identifier: Option<&str>,
        file_name: &str,
        path: &str,
    ) -> Result<DataFile, DatabaseError> {
        require_non_blank("file_name", file_name)?;
        require_non_blank("path", path)?;
        self.get_run(run_id).await?;
        if let Some(equipment) = equipment_id {
            self.get_equipment(equipment).await?;
        }

        let now = db_now();
        let id = self.db().generate_id(PREFIX_DATA_FILE).await?;
        self.db()
            .conn()
            .execute(
                &format!("INSERT INTO data_files ({DATA_FILE_COLS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"),
                libsql::params![
                    id.as_str(),
                    run_id,
                    equipment_id,
                    task_run_identifier,
                    file_name,
                    path,
                    to_db_time(now)
                ],
            )
            .await?;
        self.record(EntityType::DataFile, &id, AuditAction::Created, None)
            .await?;

        Ok(DataFile {
            id,
            run_id: run_id.to_string(),
            equipment_id: equipment_id.map(String::from),
            task_run_identifier: task_run_identifier.map(String::from),
            file_name: file_name.to_string(),
            path: path.to_string(),
            created_at: now,
        })
    }

    pub async fn list_data_files(&self, run_id: &str) -> Result<Vec<DataFile>, DatabaseError> {
        let rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {DATA_FILE_COLS} FROM data_files WHERE run_id = ?1 ORDER BY created_at, rowid"),
                [run_id],
            )
            .await?;
        collect_rows(rows, row_to_data_file).await
    }
}
