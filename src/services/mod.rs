pub mod auth_service;
pub mod category_service;
pub mod error;
pub mod product_service;
pub mod user_service;

pub use auth_service::{AuthService, LoginOutcome};
pub use category_service::CategoryService;
pub use error::ServiceError;
pub use product_service::ProductService;
pub use user_service::UserService;
