//! Look entities up by the human key users type, falling back to the raw ID.

use lims_core::entities::{Item, ItemType, Location, Project, Run, TaskTemplate, User, Workflow};
use lims_core::ids::{
    PREFIX_ITEM, PREFIX_ITEM_TYPE, PREFIX_LOCATION, PREFIX_PROJECT, PREFIX_RUN,
    PREFIX_TASK_TEMPLATE, PREFIX_WORKFLOW,
};
use lims_db::service::LimsService;

/// Whether `key` has the shape of a generated ID with `prefix`.
#[must_use]
pub fn looks_like_id(key: &str, prefix: &str) -> bool {
    key.strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('-'))
        .is_some_and(|hex| hex.len() == 8 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

pub async fn item(svc: &LimsService, key: &str) -> anyhow::Result<Item> {
    Ok(if looks_like_id(key, PREFIX_ITEM) {
        svc.get_item(key).await?
    } else {
        svc.get_item_by_identifier(key).await?
    })
}

pub async fn item_type(svc: &LimsService, key: &str) -> anyhow::Result<ItemType> {
    Ok(if looks_like_id(key, PREFIX_ITEM_TYPE) {
        svc.get_item_type(key).await?
    } else {
        svc.get_item_type_by_name(key).await?
    })
}

pub async fn location(svc: &LimsService, key: &str) -> anyhow::Result<Location> {
    Ok(if looks_like_id(key, PREFIX_LOCATION) {
        svc.get_location(key).await?
    } else {
        svc.get_location_by_code(key).await?
    })
}

pub async fn template(svc: &LimsService, key: &str) -> anyhow::Result<TaskTemplate> {
    Ok(if looks_like_id(key, PREFIX_TASK_TEMPLATE) {
        svc.get_task_template(key).await?
    } else {
        svc.get_task_template_by_name(key).await?
    })
}

pub async fn workflow(svc: &LimsService, key: &str) -> anyhow::Result<Workflow> {
    if looks_like_id(key, PREFIX_WORKFLOW) {
        return Ok(svc.get_workflow(key).await?);
    }
    svc.list_workflows()
        .await?
        .into_iter()
        .find(|w| w.name == key)
        .ok_or_else(|| anyhow::anyhow!("no workflow named '{key}'"))
}

pub async fn run(svc: &LimsService, key: &str) -> anyhow::Result<Run> {
    Ok(if looks_like_id(key, PREFIX_RUN) {
        svc.get_run(key).await?
    } else {
        svc.get_run_by_identifier(key).await?
    })
}

pub async fn project(svc: &LimsService, key: &str) -> anyhow::Result<Project> {
    Ok(if looks_like_id(key, PREFIX_PROJECT) {
        svc.get_project(key).await?
    } else {
        svc.get_project_by_identifier(key).await?
    })
}

pub async fn user(svc: &LimsService, username: &str) -> anyhow::Result<User> {
    svc.find_user_by_username(username)
        .await?
        .ok_or_else(|| anyhow::anyhow!("no user named '{username}'"))
}

/// The user behind the current actor, when the actor is a username.
pub async fn actor_user_id(svc: &LimsService) -> anyhow::Result<Option<String>> {
    Ok(svc.find_user_by_username(svc.actor()).await?.map(|u| u.id))
}

/// Resolve a measure symbol to its ID.
pub async fn measure_id(svc: &LimsService, symbol: Option<&str>) -> anyhow::Result<Option<String>> {
    match symbol {
        Some(symbol) => Ok(Some(svc.get_measure_by_symbol(symbol).await?.id)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::looks_like_id;

    #[test]
    fn recognizes_generated_ids() {
        assert!(looks_like_id("itm-0a1b2c3d", "itm"));
        assert!(!looks_like_id("itm-0a1b2c3d", "run"));
        assert!(!looks_like_id("TRIS-1", "itm"));
        assert!(!looks_like_id("itm-xyz", "itm"));
        // An item type ID is not an item ID.
        assert!(!looks_like_id("ityp-0a1b2c3d", "itm"));
    }
}
