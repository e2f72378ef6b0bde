pub mod catalog_repo;
pub mod dashboard_repo;
pub mod inventory_repo;
pub mod operations_repo;
pub mod user_repo;

pub use catalog_repo::CatalogRepository;
pub use dashboard_repo::DashboardRepository;
pub use inventory_repo::InventoryRepository;
pub use operations_repo::OperationsRepository;
pub use user_repo::UserRepository;
