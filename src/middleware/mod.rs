pub mod auth;
pub mod response;

pub use auth::{Admin, AuthUser, Operator};
pub use response::{ApiResponse, ApiResult};
