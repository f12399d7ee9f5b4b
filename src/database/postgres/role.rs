use async_trait::async_trait;

use super::PgStore;
use crate::database::manager::DatabaseError;
use crate::database::models::Role;
use crate::database::repository::RoleRepository;

#[async_trait]
impl RoleRepository for PgStore {
    async fn find_all(&self) -> Result<Vec<Role>, DatabaseError> {
        let roles = sqlx::query_as::<_, Role>("SELECT id, authority FROM tb_role ORDER BY id")
            .fetch_all(self.pool())
            .await?;
        Ok(roles)
    }

    async fn find_by_authority(&self, authority: &str) -> Result<Option<Role>, DatabaseError> {
        let role = sqlx::query_as::<_, Role>("SELECT id, authority FROM tb_role WHERE authority = $1")
            .bind(authority)
            .fetch_optional(self.pool())
            .await?;
        Ok(role)
    }

    async fn insert(&self, authority: &str) -> Result<Role, DatabaseError> {
        let role = sqlx::query_as::<_, Role>(
            "INSERT INTO tb_role (authority) VALUES ($1) RETURNING id, authority",
        )
        .bind(authority)
        .fetch_one(self.pool())
        .await?;
        Ok(role)
    }
}
