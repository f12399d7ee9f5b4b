use async_trait::async_trait;
use sqlx::postgres::PgExecutor;
use sqlx::{FromRow, PgConnection};

use super::{ensure_exist, PgStore};
use crate::database::manager::DatabaseError;
use crate::database::models::{NewUser, Role, User, UserChanges, UserWithRoles};
use crate::database::repository::{distinct_ids, UserRepository};
use crate::filter::{FilterOrder, PageRequest};

const USERS_WITH_ROLES_SQL: &str = "SELECT u.id, u.first_name, u.last_name, u.email, u.password, \
     r.id AS role_id, r.authority \
     FROM tb_user u \
     LEFT JOIN tb_user_role ur ON ur.user_id = u.id \
     LEFT JOIN tb_role r ON r.id = ur.role_id \
     WHERE u.id = ANY($1) \
     ORDER BY u.id, r.id";

#[derive(FromRow)]
struct UserRoleRow {
    id: i64,
    first_name: String,
    last_name: String,
    email: String,
    password: String,
    role_id: Option<i64>,
    authority: Option<String>,
}

async fn load_with_roles<'e, E: PgExecutor<'e>>(
    executor: E,
    ids: &[i64],
) -> Result<Vec<UserWithRoles>, DatabaseError> {
    if ids.is_empty() {
        return Ok(vec![]);
    }
    let rows = sqlx::query_as::<_, UserRoleRow>(USERS_WITH_ROLES_SQL)
        .bind(ids)
        .fetch_all(executor)
        .await?;

    let mut out: Vec<UserWithRoles> = Vec::new();
    for row in rows {
        let role = match (row.role_id, row.authority) {
            (Some(id), Some(authority)) => Some(Role { id, authority }),
            _ => None,
        };
        match out.last_mut() {
            Some(last) if last.user.id == row.id => last.roles.extend(role),
            _ => out.push(UserWithRoles {
                user: User {
                    id: row.id,
                    first_name: row.first_name,
                    last_name: row.last_name,
                    email: row.email,
                    password: row.password,
                },
                roles: role.into_iter().collect(),
            }),
        }
    }
    Ok(out)
}

async fn replace_roles(
    conn: &mut PgConnection,
    user_id: i64,
    role_ids: &[i64],
) -> Result<(), DatabaseError> {
    let ids = distinct_ids(role_ids);
    ensure_exist(conn, "tb_role", "Role", &ids).await?;

    sqlx::query("DELETE FROM tb_user_role WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    if !ids.is_empty() {
        sqlx::query("INSERT INTO tb_user_role (user_id, role_id) SELECT $1, UNNEST($2::bigint[])")
            .bind(user_id)
            .bind(&ids)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

async fn load_one(conn: &mut PgConnection, id: i64) -> Result<UserWithRoles, DatabaseError> {
    load_with_roles(conn, &[id])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| DatabaseError::NotFound(format!("User {} not found", id)))
}

#[async_trait]
impl UserRepository for PgStore {
    async fn find_page(
        &self,
        page: &PageRequest,
    ) -> Result<(Vec<UserWithRoles>, i64), DatabaseError> {
        let sql = format!(
            "SELECT id FROM tb_user {} LIMIT $1 OFFSET $2",
            FilterOrder::generate(&page.sort, "id")
        );
        let ids: Vec<i64> = sqlx::query_scalar(&sql)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.pool())
            .await?;
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tb_user")
            .fetch_one(self.pool())
            .await?;

        let mut loaded = load_with_roles(self.pool(), &ids).await?;
        loaded.sort_by_key(|u| ids.iter().position(|id| *id == u.user.id));
        Ok((loaded, total))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<UserWithRoles>, DatabaseError> {
        Ok(load_with_roles(self.pool(), &[id]).await?.into_iter().next())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserWithRoles>, DatabaseError> {
        let id: Option<i64> = sqlx::query_scalar("SELECT id FROM tb_user WHERE email = $1")
            .bind(email)
            .fetch_optional(self.pool())
            .await?;
        match id {
            Some(id) => self.find_by_id(id).await,
            None => Ok(None),
        }
    }

    async fn insert(&self, user: &NewUser) -> Result<UserWithRoles, DatabaseError> {
        let mut tx = self.pool().begin().await?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO tb_user (first_name, last_name, email, password) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&mut *tx)
        .await?;

        replace_roles(&mut tx, id, &user.role_ids).await?;
        let created = load_one(&mut tx, id).await?;
        tx.commit().await?;
        Ok(created)
    }

    async fn update(&self, id: i64, changes: &UserChanges) -> Result<UserWithRoles, DatabaseError> {
        let mut tx = self.pool().begin().await?;

        let updated = sqlx::query(
            "UPDATE tb_user SET first_name = $1, last_name = $2, email = $3 WHERE id = $4",
        )
        .bind(&changes.first_name)
        .bind(&changes.last_name)
        .bind(&changes.email)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("User {} not found", id)));
        }

        replace_roles(&mut tx, id, &changes.role_ids).await?;
        let user = load_one(&mut tx, id).await?;
        tx.commit().await?;
        Ok(user)
    }

    async fn delete(&self, id: i64) -> Result<(), DatabaseError> {
        let mut tx = self.pool().begin().await?;
        let deleted = sqlx::query("DELETE FROM tb_user WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("User {} not found", id)));
        }
        tx.commit().await?;
        Ok(())
    }
}
