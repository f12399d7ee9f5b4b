mod category;
mod product;
mod role;
mod user;

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::repository::HealthCheck;

/// PostgreSQL-backed implementation of every repository trait.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl HealthCheck for PgStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }
}

/// Fails with `ReferenceNotFound` for the first id in `ids` that has no row in `table`.
async fn ensure_exist(
    conn: &mut PgConnection,
    table: &'static str,
    entity: &'static str,
    ids: &[i64],
) -> Result<(), DatabaseError> {
    if ids.is_empty() {
        return Ok(());
    }
    let sql = format!("SELECT id FROM {} WHERE id = ANY($1)", table);
    let found: Vec<i64> = sqlx::query_scalar(&sql).bind(ids).fetch_all(&mut *conn).await?;
    match ids.iter().find(|id| !found.contains(id)) {
        Some(missing) => Err(DatabaseError::ReferenceNotFound { entity, id: *missing }),
        None => Ok(()),
    }
}
