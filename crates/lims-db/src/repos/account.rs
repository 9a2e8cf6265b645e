//! Users, groups, permissions, default group bootstrap, and superuser setup.
//!
//! Passwords are stored as argon2 PHC strings and never leave this module.

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use lims_config::RolesConfig;
use lims_core::entities::{Group, User};
use lims_core::enums::{AuditAction, EntityType, Role};
use lims_core::errors::require_non_blank;
use lims_core::ids::{PREFIX_GROUP, PREFIX_USER};
use lims_core::responses::{BootstrapReport, SuperuserOutcome};

use crate::error::DatabaseError;
use crate::helpers::{collect_rows, db_now, get_bool, get_datetime, get_opt_string, to_db_time};
use crate::service::LimsService;

const USER_COLS: &str = "id, username, email, is_staff, is_superuser, is_active, created_at";

fn row_to_user(row: &libsql::Row) -> Result<User, DatabaseError> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: get_opt_string(row, 2)?,
        is_staff: get_bool(row, 3)?,
        is_superuser: get_bool(row, 4)?,
        is_active: get_bool(row, 5)?,
        created_at: get_datetime(row, 6)?,
    })
}

/// Fields for a new user account.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub username: String,
    pub email: Option<String>,
    pub password: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl LimsService {
    // -- users ---------------------------------------------------------------

    async fn hash_password(&self, password: &str) -> Result<String, DatabaseError> {
        let mut rows = self.db().conn().query("SELECT randomblob(16)", ()).await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        let salt_bytes = row.get::<Vec<u8>>(0)?;
        let salt = SaltString::encode_b64(&salt_bytes)
            .map_err(|e| anyhow::anyhow!("salt encoding failed: {e}"))?;
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("password hashing failed: {e}"))?;
        Ok(hash.to_string())
    }

    pub async fn create_user(&self, new: NewUser) -> Result<User, DatabaseError> {
        require_non_blank("username", &new.username)?;
        if new.password.is_empty() {
            return Err(DatabaseError::Validation("password must not be empty".into()));
        }
        let password_hash = self.hash_password(&new.password).await?;

        let now = db_now();
        let id = self.db().generate_id(PREFIX_USER).await?;
        self.db()
            .conn()
            .execute(
                "INSERT INTO users (id, username, email, password_hash, is_staff, is_superuser, is_active, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7)",
                libsql::params![
                    id.as_str(),
                    new.username.as_str(),
                    new.email.as_deref(),
                    password_hash,
                    i64::from(new.is_staff),
                    i64::from(new.is_superuser),
                    to_db_time(now)
                ],
            )
            .await
            .map_err(|e| DatabaseError::from_write(e, &format!("user '{}'", new.username)))?;

        self.record(EntityType::User, &id, AuditAction::Created, None)
            .await?;

        Ok(User {
            id,
            username: new.username,
            email: new.email,
            is_staff: new.is_staff,
            is_superuser: new.is_superuser,
            is_active: true,
            created_at: now,
        })
    }

    pub async fn get_user(&self, id: &str) -> Result<User, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(&format!("SELECT {USER_COLS} FROM users WHERE id = ?1"), [id])
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("user", id))?;
        row_to_user(&row)
    }

    /// Look up a user by username. `None` when no such account exists.
    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(&format!("SELECT {USER_COLS} FROM users WHERE username = ?1"), [username])
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_user(&row)?)),
            None => Ok(None),
        }
    }

    /// Check a password against the stored hash. Inactive and unknown users never verify.
    pub async fn verify_password(&self, username: &str, password: &str) -> Result<bool, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT password_hash FROM users WHERE username = ?1 AND is_active = 1",
                [username],
            )
            .await?;
        let Some(row) = rows.next().await? else {
            return Ok(false);
        };
        let stored = row.get::<String>(0)?;
        let parsed = PasswordHash::new(&stored)
            .map_err(|e| DatabaseError::Query(format!("stored password hash is malformed: {e}")))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    pub async fn set_user_active(&self, id: &str, active: bool) -> Result<User, DatabaseError> {
        let user = self.get_user(id).await?;
        self.db()
            .conn()
            .execute(
                "UPDATE users SET is_active = ?1 WHERE id = ?2",
                libsql::params![i64::from(active), id],
            )
            .await?;
        self.record(EntityType::User, id, AuditAction::Updated, Some(serde_json::json!({ "is_active": active })))
            .await?;
        Ok(User {
            is_active: active,
            ..user
        })
    }

    // -- groups --------------------------------------------------------------

    /// Create a group with its permissions in one transaction.
    pub async fn create_group(&self, name: &str, permissions: &[String]) -> Result<Group, DatabaseError> {
        require_non_blank("name", name)?;
        let id = self.db().generate_id(PREFIX_GROUP).await?;

        self.db().begin().await?;
        let result = async {
            self.db()
                .conn()
                .execute("INSERT INTO groups (id, name) VALUES (?1, ?2)", [id.as_str(), name])
                .await
                .map_err(|e| DatabaseError::from_write(e, &format!("group '{name}'")))?;
            for codename in permissions {
                self.db()
                    .conn()
                    .execute(
                        "INSERT OR IGNORE INTO group_permissions (group_id, codename) VALUES (?1, ?2)",
                        [id.as_str(), codename.as_str()],
                    )
                    .await?;
            }
            self.record(
                EntityType::Group,
                &id,
                AuditAction::Created,
                Some(serde_json::json!({ "name": name, "permissions": permissions.len() })),
            )
            .await
        }
        .await;
        self.db().finish(result).await?;

        self.get_group(&id).await
    }

    pub async fn get_group(&self, id: &str) -> Result<Group, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query("SELECT id, name FROM groups WHERE id = ?1", [id])
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("group", id))?;
        let (id, name) = (row.get::<String>(0)?, row.get::<String>(1)?);
        let permissions = self.group_permissions(&id).await?;
        Ok(Group { id, name, permissions })
    }

    /// Look up a group by name. `None` when it does not exist.
    pub async fn find_group_by_name(&self, name: &str) -> Result<Option<Group>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query("SELECT id FROM groups WHERE name = ?1", [name])
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(self.get_group(&row.get::<String>(0)?).await?)),
            None => Ok(None),
        }
    }

    pub async fn list_groups(&self) -> Result<Vec<Group>, DatabaseError> {
        let rows = self
            .db()
            .conn()
            .query("SELECT id FROM groups ORDER BY name", ())
            .await?;
        let ids = collect_rows(rows, |row| Ok(row.get::<String>(0)?)).await?;
        let mut groups = Vec::with_capacity(ids.len());
        for id in ids {
            groups.push(self.get_group(&id).await?);
        }
        Ok(groups)
    }

    async fn group_permissions(&self, group_id: &str) -> Result<Vec<String>, DatabaseError> {
        let rows = self
            .db()
            .conn()
            .query(
                "SELECT codename FROM group_permissions WHERE group_id = ?1 ORDER BY codename",
                [group_id],
            )
            .await?;
        collect_rows(rows, |row| Ok(row.get::<String>(0)?)).await
    }

    /// Add a user to a group. Returns `false` when already a member.
    pub async fn add_user_to_group(&self, user_id: &str, group_id: &str) -> Result<bool, DatabaseError> {
        self.get_user(user_id).await?;
        self.get_group(group_id).await?;
        let inserted = self
            .db()
            .conn()
            .execute(
                "INSERT OR IGNORE INTO user_groups (user_id, group_id) VALUES (?1, ?2)",
                [user_id, group_id],
            )
            .await?;
        if inserted > 0 {
            self.record(
                EntityType::User,
                user_id,
                AuditAction::Linked,
                Some(serde_json::json!({ "group_id": group_id })),
            )
            .await?;
        }
        Ok(inserted > 0)
    }

    /// Names of the groups a user belongs to.
    pub async fn user_group_names(&self, user_id: &str) -> Result<Vec<String>, DatabaseError> {
        let rows = self
            .db()
            .conn()
            .query(
                "SELECT g.name FROM user_groups ug JOIN groups g ON g.id = ug.group_id
                 WHERE ug.user_id = ?1 ORDER BY g.name",
                [user_id],
            )
            .await?;
        collect_rows(rows, |row| Ok(row.get::<String>(0)?)).await
    }

    /// Whether a user holds a permission through any group. Superusers hold all.
    pub async fn user_has_permission(&self, user_id: &str, codename: &str) -> Result<bool, DatabaseError> {
        let user = self.get_user(user_id).await?;
        if !user.is_active {
            return Ok(false);
        }
        if user.is_superuser {
            return Ok(true);
        }
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT 1 FROM user_groups ug JOIN group_permissions gp ON gp.group_id = ug.group_id
                 WHERE ug.user_id = ?1 AND gp.codename = ?2 LIMIT 1",
                [user_id, codename],
            )
            .await?;
        Ok(rows.next().await?.is_some())
    }

    // -- setup ---------------------------------------------------------------

    /// Create the `admin`, `staff`, and `user` groups with their configured
    /// permissions. Existing groups are left untouched and reported as skipped.
    pub async fn bootstrap_default_groups(
        &self,
        roles: &RolesConfig,
    ) -> Result<BootstrapReport, DatabaseError> {
        let mut report = BootstrapReport::default();
        for (role, permissions) in roles.entries() {
            let name = role.as_str();
            if self.find_group_by_name(name).await?.is_some() {
                tracing::debug!(group = name, "group exists; skipping");
                report.skipped.push(name.to_string());
                continue;
            }
            match self.create_group(name, permissions).await {
                Ok(_) => {
                    tracing::info!(group = name, permissions = permissions.len(), "group created");
                    report.created.push(name.to_string());
                }
                Err(e) => tracing::warn!(group = name, error = %e, "failed to create group"),
            }
        }
        Ok(report)
    }

    /// Create a superuser unless the username is taken, then grant the
    /// `staff` and `admin` groups.
    pub async fn create_superuser(
        &self,
        username: &str,
        email: Option<&str>,
        password: &str,
    ) -> Result<SuperuserOutcome, DatabaseError> {
        if let Some(existing) = self.find_user_by_username(username).await? {
            tracing::info!(username, "superuser already exists");
            return Ok(SuperuserOutcome::AlreadyExists(existing));
        }

        let user = self
            .create_user(NewUser {
                username: username.to_string(),
                email: email.map(String::from),
                password: password.to_string(),
                is_staff: true,
                is_superuser: true,
            })
            .await?;
        tracing::info!(username, "superuser created");

        self.grant_superuser_groups(&user).await;
        Ok(SuperuserOutcome::Created(user))
    }

    /// Add a user to every superuser group that exists. Missing groups and
    /// failures are logged and skipped. Returns the groups now held.
    pub async fn grant_superuser_groups(&self, user: &User) -> Vec<String> {
        let mut granted = Vec::new();
        for role in Role::SUPERUSER_GROUPS {
            let name = role.as_str();
            let group = match self.find_group_by_name(name).await {
                Ok(Some(group)) => group,
                Ok(None) => {
                    tracing::warn!(group = name, username = %user.username, "group missing; not granted");
                    continue;
                }
                Err(e) => {
                    tracing::warn!(group = name, error = %e, "group lookup failed");
                    continue;
                }
            };
            match self.add_user_to_group(&user.id, &group.id).await {
                Ok(_) => granted.push(name.to_string()),
                Err(e) => tracing::warn!(group = name, error = %e, "failed to grant group"),
            }
        }
        granted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::test_service;
    use pretty_assertions::assert_eq;

    fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: None,
            password: "correct horse".to_string(),
            ..NewUser::default()
        }
    }

    #[tokio::test]
    async fn passwords_are_hashed_and_verified() {
        let svc = test_service().await;
        svc.create_user(new_user("ada")).await.unwrap();

        let mut rows = svc
            .db()
            .conn()
            .query("SELECT password_hash FROM users WHERE username = 'ada'", ())
            .await
            .unwrap();
        let stored: String = rows.next().await.unwrap().unwrap().get(0).unwrap();
        assert!(stored.starts_with("$argon2"));

        assert!(svc.verify_password("ada", "correct horse").await.unwrap());
        assert!(!svc.verify_password("ada", "wrong").await.unwrap());
        assert!(!svc.verify_password("nobody", "correct horse").await.unwrap());
    }

    #[tokio::test]
    async fn inactive_users_do_not_verify() {
        let svc = test_service().await;
        let user = svc.create_user(new_user("ada")).await.unwrap();
        svc.set_user_active(&user.id, false).await.unwrap();
        assert!(!svc.verify_password("ada", "correct horse").await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let svc = test_service().await;
        svc.create_user(new_user("ada")).await.unwrap();
        assert!(matches!(
            svc.create_user(new_user("ada")).await,
            Err(DatabaseError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn bootstrap_is_idempotent() {
        let svc = test_service().await;
        let roles = RolesConfig::default();

        let first = svc.bootstrap_default_groups(&roles).await.unwrap();
        assert_eq!(first.created, vec!["admin", "staff", "user"]);
        assert!(first.skipped.is_empty());
        let before = svc.list_groups().await.unwrap();

        let second = svc.bootstrap_default_groups(&roles).await.unwrap();
        assert!(second.created.is_empty());
        assert_eq!(second.skipped, vec!["admin", "staff", "user"]);
        assert_eq!(svc.list_groups().await.unwrap(), before);

        let staff = svc.find_group_by_name("staff").await.unwrap().unwrap();
        let mut expected = roles.staff.clone();
        expected.sort();
        expected.dedup();
        assert_eq!(staff.permissions, expected);
    }

    #[tokio::test]
    async fn bootstrap_keeps_existing_group_permissions() {
        let svc = test_service().await;
        svc.create_group("user", &["inventory.view_item".to_string()])
            .await
            .unwrap();

        let report = svc.bootstrap_default_groups(&RolesConfig::default()).await.unwrap();
        assert_eq!(report.created, vec!["admin", "staff"]);
        assert_eq!(report.skipped, vec!["user"]);
        assert_eq!(
            svc.find_group_by_name("user").await.unwrap().unwrap().permissions,
            vec!["inventory.view_item".to_string()]
        );
    }

    #[tokio::test]
    async fn superuser_creation_is_idempotent_and_grants_groups() {
        let svc = test_service().await;
        svc.bootstrap_default_groups(&RolesConfig::default()).await.unwrap();

        let first = svc.create_superuser("admin", Some("admin@lab.org"), "s3cret").await.unwrap();
        assert!(first.was_created());
        assert!(first.user().is_superuser && first.user().is_staff);
        assert_eq!(
            svc.user_group_names(&first.user().id).await.unwrap(),
            vec!["admin", "staff"]
        );

        let second = svc.create_superuser("admin", Some("admin@lab.org"), "other").await.unwrap();
        assert!(!second.was_created());
        assert_eq!(second.user(), first.user());

        let mut rows = svc
            .db()
            .conn()
            .query("SELECT COUNT(*) FROM users WHERE username = 'admin'", ())
            .await
            .unwrap();
        let count: i64 = rows.next().await.unwrap().unwrap().get(0).unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn grant_skips_missing_groups() {
        let svc = test_service().await;
        svc.create_group("staff", &[]).await.unwrap();

        let outcome = svc.create_superuser("root", None, "pw").await.unwrap();
        let user = outcome.user();
        assert_eq!(svc.user_group_names(&user.id).await.unwrap(), vec!["staff"]);

        // Running the hook again once the group exists fills the gap only.
        svc.create_group("admin", &[]).await.unwrap();
        assert_eq!(svc.grant_superuser_groups(user).await, vec!["staff", "admin"]);
        assert_eq!(
            svc.user_group_names(&user.id).await.unwrap(),
            vec!["admin", "staff"]
        );
    }

    #[tokio::test]
    async fn permissions_resolve_through_groups() {
        let svc = test_service().await;
        let group = svc
            .create_group("readers", &["inventory.view_item".to_string()])
            .await
            .unwrap();
        let user = svc.create_user(new_user("ada")).await.unwrap();
        assert!(!svc.user_has_permission(&user.id, "inventory.view_item").await.unwrap());

        assert!(svc.add_user_to_group(&user.id, &group.id).await.unwrap());
        assert!(!svc.add_user_to_group(&user.id, &group.id).await.unwrap());
        assert!(svc.user_has_permission(&user.id, "inventory.view_item").await.unwrap());
        assert!(!svc.user_has_permission(&user.id, "inventory.delete_item").await.unwrap());
    }
}
