// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::{Context, bail};
use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{
    db::{CatalogRepository, DashboardRepository, InventoryRepository, OperationsRepository, UserRepository},
    services::{
        auth::AuthService, catalog_service::CatalogService, dashboard_service::DashboardService,
        inventory_service::InventoryService, operation_service::OperationsService,
        user_service::UserService,
    },
};

const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_JWT_TTL_HOURS: i64 = 24 * 7;
const DEFAULT_OTP_TTL_MINUTES: i64 = 10;

/// Runtime settings, read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub db_max_connections: u32,
    pub jwt_ttl_hours: i64,
    pub otp_ttl_minutes: i64,
    pub cors_allowed_origin: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup, so parsing is testable without
    /// touching the process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL must be set")?;
        let jwt_secret = lookup("JWT_SECRET").context("JWT_SECRET must be set")?;
        if jwt_secret.len() < 16 {
            bail!("JWT_SECRET must have at least 16 characters");
        }

        let server_addr = lookup("SERVER_ADDR").unwrap_or_else(|| DEFAULT_SERVER_ADDR.to_string());
        let db_max_connections = parse_or(&lookup, "DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?;
        let jwt_ttl_hours = parse_or(&lookup, "JWT_TTL_HOURS", DEFAULT_JWT_TTL_HOURS)?;
        let otp_ttl_minutes = parse_or(&lookup, "OTP_TTL_MINUTES", DEFAULT_OTP_TTL_MINUTES)?;
        let cors_allowed_origin = lookup("CORS_ALLOWED_ORIGIN").filter(|v| !v.is_empty());

        Ok(Self {
            database_url,
            jwt_secret,
            server_addr,
            db_max_connections,
            jwt_ttl_hours,
            otp_ttl_minutes,
            cors_allowed_origin,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{} has an invalid value: {:?}", key, raw)),
        None => Ok(default),
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<Config>,
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub catalog_service: CatalogService,
    pub inventory_service: InventoryService,
    pub operations_service: OperationsService,
    pub dashboard_service: DashboardService,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("failed to connect to the database")?;

        tracing::info!("✅ Database connection established");

        Ok(Self::from_pool(config, db_pool))
    }

    /// Wires repositories and services around an existing pool.
    pub fn from_pool(config: Config, db_pool: PgPool) -> Self {
        let user_repo = UserRepository::new(db_pool.clone());
        let catalog_repo = CatalogRepository::new(db_pool.clone());
        let inventory_repo = InventoryRepository::new(db_pool.clone());
        let operations_repo = OperationsRepository::new(db_pool.clone());
        let dashboard_repo = DashboardRepository::new(db_pool.clone());

        let auth_service = AuthService::new(
            user_repo.clone(),
            config.jwt_secret.clone(),
            config.jwt_ttl_hours,
            config.otp_ttl_minutes,
            db_pool.clone(),
        );
        let user_service = UserService::new(user_repo);
        let catalog_service = CatalogService::new(catalog_repo.clone(), inventory_repo.clone());
        let inventory_service =
            InventoryService::new(inventory_repo, catalog_repo.clone(), db_pool.clone());
        let operations_service = OperationsService::new(
            operations_repo,
            catalog_repo,
            inventory_service.clone(),
            db_pool.clone(),
        );
        let dashboard_service = DashboardService::new(dashboard_repo);

        Self {
            db_pool,
            config: Arc::new(config),
            auth_service,
            user_service,
            catalog_service,
            inventory_service,
            operations_service,
            dashboard_service,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_optional_keys_are_missing() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/stockmaster"),
            ("JWT_SECRET", "0123456789abcdef0123"),
        ]))
        .unwrap();

        assert_eq!(config.server_addr, "0.0.0.0:3000");
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.jwt_ttl_hours, 168);
        assert_eq!(config.otp_ttl_minutes, 10);
        assert!(config.cors_allowed_origin.is_none());
    }

    #[test]
    fn missing_required_keys_fail() {
        let err = Config::from_lookup(lookup_from(&[("JWT_SECRET", "0123456789abcdef0123")])).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn short_secret_is_rejected() {
        let result = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/stockmaster"),
            ("JWT_SECRET", "short"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn malformed_numbers_name_the_key() {
        let err = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/stockmaster"),
            ("JWT_SECRET", "0123456789abcdef0123"),
            ("DB_MAX_CONNECTIONS", "many"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("DB_MAX_CONNECTIONS"));
    }
}
