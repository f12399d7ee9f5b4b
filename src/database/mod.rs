pub mod manager;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod query_builder;
pub mod repository;
pub mod seed;

pub use manager::{DatabaseError, DatabaseManager};
pub use repository::{ProductFilter, Repositories};
