pub mod auth;
pub mod catalog_service;
pub mod dashboard_service;
pub mod inventory_service;
pub mod operation_service;
pub mod user_service;
