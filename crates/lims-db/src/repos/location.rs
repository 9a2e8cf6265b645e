//! Location repository: a tree of storage places.
//!
//! Listing flattens the tree in pre-order, siblings sorted by name. Moving a
//! location below one of its own descendants is rejected.

use std::collections::HashMap;

use lims_core::entities::{Location, LocationNode};
use lims_core::enums::{AuditAction, EntityType};
use lims_core::errors::require_non_blank;
use lims_core::ids::PREFIX_LOCATION;

use crate::error::DatabaseError;
use crate::helpers::{collect_rows, db_now, get_datetime, get_opt_string, to_db_time};
use crate::service::LimsService;

const SELECT_COLS: &str = "id, name, code, parent_id, created_at";

fn row_to_location(row: &libsql::Row) -> Result<Location, DatabaseError> {
    Ok(Location {
        id: row.get(0)?,
        name: row.get(1)?,
        code: row.get(2)?,
        parent_id: get_opt_string(row, 3)?,
        created_at: get_datetime(row, 4)?,
    })
}

/// Flatten locations into pre-order, siblings sorted by name.
///
/// Locations whose parent is missing from `locations` are treated as roots.
#[must_use]
pub fn flatten_tree(mut locations: Vec<Location>) -> Vec<LocationNode> {
    locations.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.code.cmp(&b.code)));
    let known: std::collections::HashSet<String> =
        locations.iter().map(|l| l.id.clone()).collect();

    let mut children: HashMap<Option<String>, Vec<Location>> = HashMap::new();
    for location in locations {
        let key = location
            .parent_id
            .clone()
            .filter(|parent| known.contains(parent));
        children.entry(key).or_default().push(location);
    }

    let mut nodes = Vec::new();
    let mut stack: Vec<(Location, u32, String)> = children
        .remove(&None)
        .unwrap_or_default()
        .into_iter()
        .rev()
        .map(|root| {
            let path = root.name.clone();
            (root, 0, path)
        })
        .collect();

    while let Some((location, depth, path)) = stack.pop() {
        if let Some(kids) = children.remove(&Some(location.id.clone())) {
            for kid in kids.into_iter().rev() {
                let kid_path = format!("{path}/{}", kid.name);
                stack.push((kid, depth + 1, kid_path));
            }
        }
        nodes.push(LocationNode {
            location,
            depth,
            path,
        });
    }
    nodes
}

impl LimsService {
    pub async fn create_location(
        &self,
        name: &str,
        code: &str,
        parent_id: Option<&str>,
    ) -> Result<Location, DatabaseError> {
        require_non_blank("name", name)?;
        require_non_blank("code", code)?;
        if let Some(parent) = parent_id {
            self.get_location(parent).await?;
        }

        let now = db_now();
        let id = self.db().generate_id(PREFIX_LOCATION).await?;
        self.db()
            .conn()
            .execute(
                &format!("INSERT INTO locations ({SELECT_COLS}) VALUES (?1, ?2, ?3, ?4, ?5)"),
                libsql::params![id.as_str(), name, code, parent_id, to_db_time(now)],
            )
            .await
            .map_err(|e| DatabaseError::from_write(e, &format!("location code '{code}'")))?;

        self.record(EntityType::Location, &id, AuditAction::Created, None)
            .await?;

        Ok(Location {
            id,
            name: name.to_string(),
            code: code.to_string(),
            parent_id: parent_id.map(String::from),
            created_at: now,
        })
    }

    pub async fn get_location(&self, id: &str) -> Result<Location, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(&format!("SELECT {SELECT_COLS} FROM locations WHERE id = ?1"), [id])
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("location", id))?;
        row_to_location(&row)
    }

    pub async fn get_location_by_code(&self, code: &str) -> Result<Location, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(&format!("SELECT {SELECT_COLS} FROM locations WHERE code = ?1"), [code])
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("location", code))?;
        row_to_location(&row)
    }

    /// Re-parent a location. `None` makes it a root.
    pub async fn move_location(
        &self,
        id: &str,
        new_parent_id: Option<&str>,
    ) -> Result<Location, DatabaseError> {
        let current = self.get_location(id).await?;

        if let Some(parent) = new_parent_id {
            // Walk up from the new parent; meeting `id` means a cycle.
            let mut cursor = Some(self.get_location(parent).await?);
            while let Some(ancestor) = cursor {
                if ancestor.id == id {
                    return Err(DatabaseError::Validation(format!(
                        "Cannot move location {id} under its own descendant {parent}"
                    )));
                }
                cursor = match ancestor.parent_id {
                    Some(ref next) => Some(self.get_location(next).await?),
                    None => None,
                };
            }
        }

        self.db()
            .conn()
            .execute(
                "UPDATE locations SET parent_id = ?1 WHERE id = ?2",
                libsql::params![new_parent_id, id],
            )
            .await?;

        self.record(
            EntityType::Location,
            id,
            AuditAction::Updated,
            Some(serde_json::json!({ "parent_id": new_parent_id })),
        )
        .await?;

        Ok(Location {
            parent_id: new_parent_id.map(String::from),
            ..current
        })
    }

    pub async fn list_locations(&self) -> Result<Vec<Location>, DatabaseError> {
        let rows = self
            .db()
            .conn()
            .query(&format!("SELECT {SELECT_COLS} FROM locations ORDER BY name"), ())
            .await?;
        collect_rows(rows, row_to_location).await
    }

    /// All locations as a pre-ordered tree with depth and path.
    pub async fn location_tree(&self) -> Result<Vec<LocationNode>, DatabaseError> {
        Ok(flatten_tree(self.list_locations().await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::test_service;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn tree_is_preordered_by_name() {
        let svc = test_service().await;
        let lab_b = svc.create_location("Lab B", "LB", None).await.unwrap();
        let lab_a = svc.create_location("Lab A", "LA", None).await.unwrap();
        let freezer = svc
            .create_location("Freezer", "LA-F", Some(&lab_a.id))
            .await
            .unwrap();
        svc.create_location("Bench", "LA-B", Some(&lab_a.id)).await.unwrap();
        svc.create_location("Shelf 1", "LA-F-1", Some(&freezer.id))
            .await
            .unwrap();
        svc.create_location("Cabinet", "LB-C", Some(&lab_b.id)).await.unwrap();

        let tree = svc.location_tree().await.unwrap();
        let paths: Vec<(&str, u32)> = tree.iter().map(|n| (n.path.as_str(), n.depth)).collect();
        assert_eq!(
            paths,
            vec![
                ("Lab A", 0),
                ("Lab A/Bench", 1),
                ("Lab A/Freezer", 1),
                ("Lab A/Freezer/Shelf 1", 2),
                ("Lab B", 0),
                ("Lab B/Cabinet", 1),
            ]
        );
    }

    #[tokio::test]
    async fn move_under_descendant_is_rejected() {
        let svc = test_service().await;
        let room = svc.create_location("Room", "R", None).await.unwrap();
        let freezer = svc.create_location("Freezer", "R-F", Some(&room.id)).await.unwrap();
        let shelf = svc.create_location("Shelf", "R-F-S", Some(&freezer.id)).await.unwrap();

        let err = svc.move_location(&room.id, Some(&shelf.id)).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));

        let err = svc.move_location(&room.id, Some(&room.id)).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));

        let moved = svc.move_location(&shelf.id, None).await.unwrap();
        assert_eq!(moved.parent_id, None);
        assert_eq!(svc.get_location(&shelf.id).await.unwrap().parent_id, None);
    }

    #[tokio::test]
    async fn duplicate_code_conflicts() {
        let svc = test_service().await;
        svc.create_location("Room", "R", None).await.unwrap();
        let err = svc.create_location("Other room", "R", None).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Conflict(_)));
        assert_eq!(svc.get_location_by_code("R").await.unwrap().name, "Room");
    }

    #[tokio::test]
    async fn missing_parent_is_not_found() {
        let svc = test_service().await;
        let err = svc
            .create_location("Shelf", "S", Some("loc-00000000"))
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }
}
