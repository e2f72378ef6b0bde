// src/middleware/rbac.rs

use axum::{extract::FromRequestParts, http::request::Parts};
use std::marker::PhantomData;

use crate::{
    common::error::AppError,
    models::auth::{Permission, User},
};

/// A permission a handler can demand through `RequirePermission<T>`.
pub trait PermissionDef: Send + Sync + 'static {
    fn permission() -> Permission;
}

/// Guard extractor. Must be listed before any body extractor so a caller
/// without the permission is turned away before the payload is parsed.
pub struct RequirePermission<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequirePermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts.extensions.get::<User>().ok_or(AppError::InvalidToken)?;

        let required = T::permission();
        if !user.role.grants(required) {
            tracing::warn!(user_id = %user.id, role = ?user.role, permission = required.slug(), "permission denied");
            return Err(AppError::Forbidden(required.slug()));
        }

        Ok(RequirePermission(PhantomData))
    }
}

// ---
// Permission types
// ---

pub struct PermRead;
impl PermissionDef for PermRead {
    fn permission() -> Permission { Permission::Read }
}

pub struct PermCatalogWrite;
impl PermissionDef for PermCatalogWrite {
    fn permission() -> Permission { Permission::CatalogWrite }
}

pub struct PermCatalogDelete;
impl PermissionDef for PermCatalogDelete {
    fn permission() -> Permission { Permission::CatalogDelete }
}

pub struct PermOperationsCreate;
impl PermissionDef for PermOperationsCreate {
    fn permission() -> Permission { Permission::OperationsCreate }
}

pub struct PermOperationsValidate;
impl PermissionDef for PermOperationsValidate {
    fn permission() -> Permission { Permission::OperationsValidate }
}

pub struct PermAdjustmentsWrite;
impl PermissionDef for PermAdjustmentsWrite {
    fn permission() -> Permission { Permission::AdjustmentsWrite }
}

pub struct PermAlertsResolve;
impl PermissionDef for PermAlertsResolve {
    fn permission() -> Permission { Permission::AlertsResolve }
}

pub struct PermUsersManage;
impl PermissionDef for PermUsersManage {
    fn permission() -> Permission { Permission::UsersManage }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::Role;
    use axum::http::Request;
    use chrono::Utc;
    use uuid::Uuid;

    fn user_with(role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Test".into(),
            email: "test@stockmaster.io".into(),
            password_hash: String::new(),
            role,
            is_active: true,
            reset_otp_hash: None,
            reset_otp_expires_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn parts_for(user: Option<User>) -> Parts {
        let (mut parts, _) = Request::new(()).into_parts();
        if let Some(user) = user {
            parts.extensions.insert(user);
        }
        parts
    }

    #[tokio::test]
    async fn staff_can_create_operations_but_not_validate() {
        let mut parts = parts_for(Some(user_with(Role::Staff)));
        assert!(RequirePermission::<PermOperationsCreate>::from_request_parts(&mut parts, &()).await.is_ok());

        let err = RequirePermission::<PermOperationsValidate>::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AppError::Forbidden("operations:validate")));
    }

    #[tokio::test]
    async fn manager_cannot_delete_catalog_or_manage_users() {
        let mut parts = parts_for(Some(user_with(Role::InventoryManager)));
        assert!(RequirePermission::<PermCatalogWrite>::from_request_parts(&mut parts, &()).await.is_ok());
        assert!(RequirePermission::<PermCatalogDelete>::from_request_parts(&mut parts, &()).await.is_err());
        assert!(RequirePermission::<PermUsersManage>::from_request_parts(&mut parts, &()).await.is_err());
    }

    #[tokio::test]
    async fn admin_passes_every_guard() {
        let mut parts = parts_for(Some(user_with(Role::Admin)));
        assert!(RequirePermission::<PermUsersManage>::from_request_parts(&mut parts, &()).await.is_ok());
        assert!(RequirePermission::<PermAlertsResolve>::from_request_parts(&mut parts, &()).await.is_ok());
    }

    #[tokio::test]
    async fn missing_user_is_unauthorized() {
        let mut parts = parts_for(None);
        let err = RequirePermission::<PermRead>::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AppError::InvalidToken));
    }
}
