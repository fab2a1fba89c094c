pub mod auth_service;
pub mod catalog_service;
pub mod error;

pub use auth_service::AuthService;
pub use catalog_service::CatalogService;
pub use error::ServiceError;
