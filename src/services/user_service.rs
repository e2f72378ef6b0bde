// src/services/user_service.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::{Role, User},
};

/// Account administration (admin only).
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
}

impl UserService {
    pub fn new(user_repo: UserRepository) -> Self {
        Self { user_repo }
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.user_repo.list_users().await
    }

    pub async fn update_role(&self, actor: &User, user_id: Uuid, role: Role) -> Result<User, AppError> {
        ensure_not_self_lockout(actor, user_id, role == Role::Admin)?;

        let user = self
            .user_repo
            .update_role(user_id, role)
            .await?
            .ok_or(AppError::NotFound("User"))?;

        tracing::info!(actor = %actor.id, user_id = %user.id, role = ?role, "User role changed");
        Ok(user)
    }

    pub async fn set_active(&self, actor: &User, user_id: Uuid, is_active: bool) -> Result<User, AppError> {
        ensure_not_self_lockout(actor, user_id, is_active)?;

        let user = self
            .user_repo
            .set_active(user_id, is_active)
            .await?
            .ok_or(AppError::NotFound("User"))?;

        tracing::info!(actor = %actor.id, user_id = %user.id, is_active, "User status changed");
        Ok(user)
    }
}

// An admin demoting or deactivating themself could leave nobody able to manage users.
fn ensure_not_self_lockout(actor: &User, target: Uuid, keeps_access: bool) -> Result<(), AppError> {
    if actor.id == target && !keeps_access {
        return Err(AppError::BadRequest(
            "You cannot remove your own administrator access.".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn admin() -> User {
        User {
            id: Uuid::new_v4(),
            name: "Root".into(),
            email: "root@stockmaster.io".into(),
            password_hash: String::new(),
            role: Role::Admin,
            is_active: true,
            reset_otp_hash: None,
            reset_otp_expires_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn admin_cannot_lock_themself_out() {
        let actor = admin();
        assert!(ensure_not_self_lockout(&actor, actor.id, false).is_err());
        assert!(ensure_not_self_lockout(&actor, actor.id, true).is_ok());
    }

    #[test]
    fn admin_can_change_other_accounts() {
        let actor = admin();
        assert!(ensure_not_self_lockout(&actor, Uuid::new_v4(), false).is_ok());
    }
}
