use async_trait::async_trait;

use super::PgStore;
use crate::database::manager::DatabaseError;
use crate::database::models::{Category, CategoryInput};
use crate::database::repository::CategoryRepository;
use crate::filter::{FilterOrder, PageRequest};

#[async_trait]
impl CategoryRepository for PgStore {
    async fn find_page(&self, page: &PageRequest) -> Result<(Vec<Category>, i64), DatabaseError> {
        let sql = format!(
            "SELECT id, name FROM tb_category {} LIMIT $1 OFFSET $2",
            FilterOrder::generate(&page.sort, "id")
        );
        let categories = sqlx::query_as::<_, Category>(&sql)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.pool())
            .await?;
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tb_category")
            .fetch_one(self.pool())
            .await?;
        Ok((categories, total))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Category>, DatabaseError> {
        let category = sqlx::query_as::<_, Category>("SELECT id, name FROM tb_category WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(category)
    }

    async fn insert(&self, input: &CategoryInput) -> Result<Category, DatabaseError> {
        let mut tx = self.pool().begin().await?;
        let category = sqlx::query_as::<_, Category>(
            "INSERT INTO tb_category (name) VALUES ($1) RETURNING id, name",
        )
        .bind(&input.name)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(category)
    }

    async fn update(&self, id: i64, input: &CategoryInput) -> Result<Category, DatabaseError> {
        let mut tx = self.pool().begin().await?;
        let category = sqlx::query_as::<_, Category>(
            "UPDATE tb_category SET name = $1 WHERE id = $2 RETURNING id, name",
        )
        .bind(&input.name)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("Category {} not found", id)))?;
        tx.commit().await?;
        Ok(category)
    }

    async fn delete(&self, id: i64) -> Result<(), DatabaseError> {
        let mut tx = self.pool().begin().await?;
        let deleted = sqlx::query("DELETE FROM tb_category WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Category {} not found", id)));
        }
        tx.commit().await?;
        Ok(())
    }
}
