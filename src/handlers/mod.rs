// Read endpoints for products and categories are public; writes need an
// operator token and every /users endpoint needs an admin token. The guards
// are the `Operator` / `Admin` extractors in each handler signature.
pub mod auth;
pub mod categories;
pub mod health;
pub mod products;
pub mod users;
