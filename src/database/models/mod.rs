pub mod category;
pub mod product;
pub mod role;
pub mod user;

pub use category::{Category, CategoryInput};
pub use product::{Product, ProductInput, ProductWithCategories};
pub use role::Role;
pub use user::{NewUser, User, UserChanges, UserWithRoles};
