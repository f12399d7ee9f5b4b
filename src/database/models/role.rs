use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const ROLE_OPERATOR: &str = "ROLE_OPERATOR";
pub const ROLE_ADMIN: &str = "ROLE_ADMIN";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Role {
    pub id: i64,
    pub authority: String,
}
