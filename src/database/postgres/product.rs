use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgExecutor;
use sqlx::{FromRow, PgConnection};

use super::{ensure_exist, PgStore};
use crate::database::manager::DatabaseError;
use crate::database::models::{Category, Product, ProductInput, ProductWithCategories};
use crate::database::query_builder::{
    bind_params_query_as, bind_params_scalar, ProductSearchQuery, PRODUCTS_WITH_CATEGORIES_SQL,
};
use crate::database::repository::{distinct_ids, ProductFilter, ProductRepository, SearchPage};
use crate::filter::PageRequest;

/// One row of the product/category join; category columns are NULL for
/// products without categories.
#[derive(FromRow)]
struct ProductCategoryRow {
    id: i64,
    name: String,
    description: String,
    price: Decimal,
    img_url: Option<String>,
    date: DateTime<Utc>,
    category_id: Option<i64>,
    category_name: Option<String>,
}

/// Fold join rows (ordered by product id) into one entry per product.
fn group_rows(rows: Vec<ProductCategoryRow>) -> Vec<ProductWithCategories> {
    let mut out: Vec<ProductWithCategories> = Vec::new();
    for row in rows {
        let category = match (row.category_id, row.category_name) {
            (Some(id), Some(name)) => Some(Category { id, name }),
            _ => None,
        };
        match out.last_mut() {
            Some(last) if last.product.id == row.id => last.categories.extend(category),
            _ => out.push(ProductWithCategories {
                product: Product {
                    id: row.id,
                    name: row.name,
                    description: row.description,
                    price: row.price,
                    img_url: row.img_url,
                    date: row.date,
                },
                categories: category.into_iter().collect(),
            }),
        }
    }
    out
}

async fn load_with_categories<'e, E: PgExecutor<'e>>(
    executor: E,
    ids: &[i64],
) -> Result<Vec<ProductWithCategories>, DatabaseError> {
    if ids.is_empty() {
        return Ok(vec![]);
    }
    let rows = sqlx::query_as::<_, ProductCategoryRow>(PRODUCTS_WITH_CATEGORIES_SQL)
        .bind(ids)
        .fetch_all(executor)
        .await?;
    Ok(group_rows(rows))
}

/// Clear and rebuild the category set of `product_id`.
async fn replace_categories(
    conn: &mut PgConnection,
    product_id: i64,
    category_ids: &[i64],
) -> Result<(), DatabaseError> {
    let ids = distinct_ids(category_ids);
    ensure_exist(conn, "tb_category", "Category", &ids).await?;

    sqlx::query("DELETE FROM tb_product_category WHERE product_id = $1")
        .bind(product_id)
        .execute(&mut *conn)
        .await?;

    if !ids.is_empty() {
        sqlx::query(
            "INSERT INTO tb_product_category (product_id, category_id) \
             SELECT $1, UNNEST($2::bigint[])",
        )
        .bind(product_id)
        .bind(&ids)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Pass 1 and its distinct count, read on the same connection.
async fn search_in(
    conn: &mut PgConnection,
    filter: &ProductFilter,
    page: &PageRequest,
) -> Result<(Vec<Product>, i64), DatabaseError> {
    let query = ProductSearchQuery::new(filter, page);

    let select = query.to_sql();
    let products = bind_params_query_as(sqlx::query_as::<_, Product>(&select.query), &select.params)
        .fetch_all(&mut *conn)
        .await?;

    let count = query.to_count_sql();
    let total = bind_params_scalar(sqlx::query_scalar::<_, i64>(&count.query), &count.params)
        .fetch_one(&mut *conn)
        .await?;

    Ok((products, total))
}

async fn load_one(conn: &mut PgConnection, id: i64) -> Result<ProductWithCategories, DatabaseError> {
    load_with_categories(conn, &[id])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| DatabaseError::NotFound(format!("Product {} not found", id)))
}

#[async_trait]
impl ProductRepository for PgStore {
    async fn search(
        &self,
        filter: &ProductFilter,
        page: &PageRequest,
    ) -> Result<(Vec<Product>, i64), DatabaseError> {
        let mut conn = self.pool().acquire().await?;
        search_in(&mut conn, filter, page).await
    }

    async fn search_page(
        &self,
        filter: &ProductFilter,
        page: &PageRequest,
    ) -> Result<SearchPage, DatabaseError> {
        let mut tx = self.pool().begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let (found, total) = search_in(&mut *tx, filter, page).await?;
        let ids: Vec<i64> = found.iter().map(|p| p.id).collect();
        let products = load_with_categories(&mut *tx, &ids).await?;
        tx.commit().await?;

        Ok(SearchPage { ids, products, total })
    }

    async fn find_with_categories(
        &self,
        ids: &[i64],
    ) -> Result<Vec<ProductWithCategories>, DatabaseError> {
        load_with_categories(self.pool(), ids).await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<ProductWithCategories>, DatabaseError> {
        Ok(load_with_categories(self.pool(), &[id]).await?.into_iter().next())
    }

    async fn insert(&self, input: &ProductInput) -> Result<ProductWithCategories, DatabaseError> {
        let mut tx = self.pool().begin().await?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO tb_product (name, description, price, img_url, date) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(&input.img_url)
        .bind(input.date)
        .fetch_one(&mut *tx)
        .await?;

        replace_categories(&mut tx, id, &input.category_ids).await?;
        let created = load_one(&mut tx, id).await?;
        tx.commit().await?;
        Ok(created)
    }

    async fn update(
        &self,
        id: i64,
        input: &ProductInput,
    ) -> Result<ProductWithCategories, DatabaseError> {
        let mut tx = self.pool().begin().await?;

        let updated = sqlx::query(
            "UPDATE tb_product SET name = $1, description = $2, price = $3, img_url = $4, date = $5 \
             WHERE id = $6",
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(&input.img_url)
        .bind(input.date)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Product {} not found", id)));
        }

        replace_categories(&mut tx, id, &input.category_ids).await?;
        let product = load_one(&mut tx, id).await?;
        tx.commit().await?;
        Ok(product)
    }

    async fn delete(&self, id: i64) -> Result<(), DatabaseError> {
        let mut tx = self.pool().begin().await?;
        let deleted = sqlx::query("DELETE FROM tb_product WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Product {} not found", id)));
        }
        tx.commit().await?;
        Ok(())
    }

    async fn count(&self) -> Result<i64, DatabaseError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tb_product")
            .fetch_one(self.pool())
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(id: i64, category: Option<(i64, &str)>) -> ProductCategoryRow {
        ProductCategoryRow {
            id,
            name: format!("Product {}", id),
            description: String::new(),
            price: Decimal::new(1000, 2),
            img_url: None,
            date: Utc.with_ymd_and_hms(2020, 7, 14, 10, 0, 0).unwrap(),
            category_id: category.map(|c| c.0),
            category_name: category.map(|c| c.1.to_string()),
        }
    }

    #[test]
    fn group_rows_folds_categories_per_product() {
        let grouped = group_rows(vec![
            row(2, Some((2, "Electronics"))),
            row(2, Some((3, "Computers"))),
            row(7, None),
            row(9, Some((1, "Books"))),
        ]);
        assert_eq!(grouped.len(), 3);
        assert_eq!(grouped[0].product.id, 2);
        assert_eq!(grouped[0].categories.len(), 2);
        assert!(grouped[1].categories.is_empty());
        assert_eq!(grouped[2].categories[0].name, "Books");
    }
}
