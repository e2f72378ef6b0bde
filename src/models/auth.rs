// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    InventoryManager,
    Staff,
}

/// Actions guarded by `RequirePermission`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Read,
    CatalogWrite,
    CatalogDelete,
    OperationsCreate,
    OperationsValidate,
    AdjustmentsWrite,
    AlertsResolve,
    UsersManage,
}

impl Permission {
    pub const ALL: [Permission; 8] = [
        Permission::Read,
        Permission::CatalogWrite,
        Permission::CatalogDelete,
        Permission::OperationsCreate,
        Permission::OperationsValidate,
        Permission::AdjustmentsWrite,
        Permission::AlertsResolve,
        Permission::UsersManage,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            Permission::Read => "read",
            Permission::CatalogWrite => "catalog:write",
            Permission::CatalogDelete => "catalog:delete",
            Permission::OperationsCreate => "operations:create",
            Permission::OperationsValidate => "operations:validate",
            Permission::AdjustmentsWrite => "adjustments:write",
            Permission::AlertsResolve => "alerts:resolve",
            Permission::UsersManage => "users:manage",
        }
    }
}

impl Role {
    pub fn grants(self, permission: Permission) -> bool {
        match self {
            Role::Admin => true,
            Role::InventoryManager => !matches!(
                permission,
                Permission::CatalogDelete | Permission::UsersManage
            ),
            Role::Staff => matches!(permission, Permission::Read | Permission::OperationsCreate),
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    #[schema(example = "Ana Souza")]
    pub name: String,
    #[schema(example = "ana@stockmaster.io")]
    pub email: String,

    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub password_hash: String,

    pub role: Role,
    pub is_active: bool,

    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub reset_otp_hash: Option<String>,
    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub reset_otp_expires_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterUserPayload {
    #[validate(length(min = 1, max = 120, message = "Name is required."))]
    #[schema(example = "Ana Souza")]
    pub name: String,
    #[validate(email(message = "The email address is invalid."))]
    #[schema(example = "ana@stockmaster.io")]
    pub email: String,
    #[validate(length(min = 8, message = "The password must have at least 8 characters."))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginUserPayload {
    #[validate(email(message = "The email address is invalid."))]
    pub email: String,
    #[validate(length(min = 1, message = "The password is required."))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ForgotPasswordPayload {
    #[validate(email(message = "The email address is invalid."))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordPayload {
    #[validate(email(message = "The email address is invalid."))]
    pub email: String,
    #[validate(length(equal = 6, message = "The reset code has 6 digits."))]
    #[schema(example = "042917")]
    pub otp: String,
    #[validate(length(min = 8, message = "The password must have at least 8 characters."))]
    pub new_password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRolePayload {
    pub role: Role,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusPayload {
    pub is_active: bool,
}

// JWT claims
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub exp: usize,
    pub iat: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_holds_every_permission() {
        assert!(Permission::ALL.iter().all(|p| Role::Admin.grants(*p)));
    }

    #[test]
    fn manager_cannot_delete_catalog_or_manage_users() {
        for p in Permission::ALL {
            let expected = !matches!(p, Permission::CatalogDelete | Permission::UsersManage);
            assert_eq!(Role::InventoryManager.grants(p), expected, "{}", p.slug());
        }
    }

    #[test]
    fn staff_can_only_read_and_draft_documents() {
        let granted: Vec<&str> = Permission::ALL
            .into_iter()
            .filter(|p| Role::Staff.grants(*p))
            .map(Permission::slug)
            .collect();
        assert_eq!(granted, vec!["read", "operations:create"]);
    }

    #[test]
    fn role_uses_screaming_snake_case_on_the_wire() {
        assert_eq!(serde_json::to_string(&Role::InventoryManager).unwrap(), "\"INVENTORY_MANAGER\"");
        let role: Role = serde_json::from_str("\"STAFF\"").unwrap();
        assert_eq!(role, Role::Staff);
    }

    #[test]
    fn reset_payload_requires_six_digit_code() {
        let payload = ResetPasswordPayload {
            email: "ana@stockmaster.io".into(),
            otp: "123".into(),
            new_password: "long-enough".into(),
        };
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("otp"));
    }
}
