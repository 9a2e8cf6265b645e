//! Permission sets for the three fixed account roles.
//!
//! Codenames follow `<area>.<action>_<model>`.

use lims_core::enums::Role;
use serde::{Deserialize, Serialize};

const VIEW: &[&str] = &[
    "inventory.view_item",
    "inventory.view_location",
    "workflow.view_run",
    "workflow.view_tasktemplate",
    "projects.view_project",
    "projects.view_product",
    "equipment.view_equipment",
    "pricing.view_price",
];

const STAFF_EXTRA: &[&str] = &[
    "inventory.add_item",
    "inventory.change_item",
    "inventory.add_itemtransfer",
    "inventory.change_itemtransfer",
    "workflow.add_run",
    "workflow.change_run",
    "workflow.add_dataentry",
    "workflow.change_dataentry",
    "projects.add_product",
    "projects.change_product",
    "equipment.add_equipmentreservation",
    "equipment.add_datafile",
];

const ADMIN_EXTRA: &[&str] = &[
    "inventory.delete_item",
    "inventory.add_location",
    "inventory.change_location",
    "workflow.add_tasktemplate",
    "workflow.change_tasktemplate",
    "workflow.add_workflow",
    "projects.add_project",
    "projects.change_project",
    "projects.delete_product",
    "equipment.add_equipment",
    "equipment.change_equipment",
    "pricing.add_price",
    "pricing.change_price",
    "accounts.add_user",
    "accounts.change_user",
];

fn owned(parts: &[&[&str]]) -> Vec<String> {
    parts
        .iter()
        .flat_map(|part| part.iter().map(|p| (*p).to_string()))
        .collect()
}

fn default_admin() -> Vec<String> {
    owned(&[VIEW, STAFF_EXTRA, ADMIN_EXTRA])
}

fn default_staff() -> Vec<String> {
    owned(&[VIEW, STAFF_EXTRA])
}

fn default_user() -> Vec<String> {
    owned(&[VIEW])
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RolesConfig {
    #[serde(default = "default_admin")]
    pub admin: Vec<String>,

    #[serde(default = "default_staff")]
    pub staff: Vec<String>,

    #[serde(default = "default_user")]
    pub user: Vec<String>,
}

impl Default for RolesConfig {
    fn default() -> Self {
        Self {
            admin: default_admin(),
            staff: default_staff(),
            user: default_user(),
        }
    }
}

impl RolesConfig {
    #[must_use]
    pub fn permissions_for(&self, role: Role) -> &[String] {
        match role {
            Role::Admin => &self.admin,
            Role::Staff => &self.staff,
            Role::User => &self.user,
        }
    }

    /// Every role paired with its configured permissions.
    #[must_use]
    pub fn entries(&self) -> Vec<(Role, &[String])> {
        Role::ALL
            .into_iter()
            .map(|role| (role, self.permissions_for(role)))
            .collect()
    }

    /// Return the first codename that is not of the form `area.action_model`.
    #[must_use]
    pub fn first_malformed(&self) -> Option<&str> {
        Role::ALL
            .into_iter()
            .flat_map(|role| self.permissions_for(role))
            .map(String::as_str)
            .find(|codename| !is_codename(codename))
    }
}

fn is_codename(codename: &str) -> bool {
    let Some((area, rest)) = codename.split_once('.') else {
        return false;
    };
    let Some((action, model)) = rest.split_once('_') else {
        return false;
    };
    [area, action, model]
        .iter()
        .all(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_lowercase() || c == '_'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_is_superset_of_staff_and_staff_of_user() {
        let roles = RolesConfig::default();
        assert!(roles.user.iter().all(|p| roles.staff.contains(p)));
        assert!(roles.staff.iter().all(|p| roles.admin.contains(p)));
        assert!(roles.admin.len() > roles.staff.len());
    }

    #[test]
    fn defaults_are_well_formed() {
        assert_eq!(RolesConfig::default().first_malformed(), None);
    }

    #[test]
    fn malformed_codename_is_reported() {
        let roles = RolesConfig {
            user: vec!["inventory.view_item".into(), "viewitem".into()],
            ..Default::default()
        };
        assert_eq!(roles.first_malformed(), Some("viewitem"));
        assert!(!is_codename("inventory.view"));
        assert!(!is_codename(".view_item"));
    }

    #[test]
    fn entries_cover_all_roles() {
        let roles = RolesConfig::default();
        let names: Vec<_> = roles.entries().iter().map(|(r, _)| r.as_str()).collect();
        assert_eq!(names, vec!["admin", "staff", "user"]);
    }
}
