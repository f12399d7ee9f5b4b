pub mod types;
pub mod page;
pub mod filter_order;
pub mod error;

pub use types::*;
pub use page::{Page, PageRequest};
pub use filter_order::FilterOrder;
pub use error::FilterError;
