use sqlx::postgres::{PgArguments, PgRow};
use sqlx::{FromRow, Postgres};

use crate::database::repository::ProductFilter;
use crate::filter::{FilterOrder, PageRequest};

/// A bindable query parameter
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    BigInt(i64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<SqlParam>,
}

const PRODUCT_COLUMNS: &str = "p.id, p.name, p.description, p.price, p.img_url, p.date";

/// Second pass: the selected products joined with every one of their categories.
/// Products without categories come back once with NULL category columns.
pub const PRODUCTS_WITH_CATEGORIES_SQL: &str = "SELECT p.id, p.name, p.description, p.price, p.img_url, p.date, \
     c.id AS category_id, c.name AS category_name \
     FROM tb_product p \
     LEFT JOIN tb_product_category pc ON pc.product_id = p.id \
     LEFT JOIN tb_category c ON c.id = pc.category_id \
     WHERE p.id = ANY($1) \
     ORDER BY p.id, c.id";

/// First pass of the product listing: distinct products filtered by category
/// membership and name, sorted and sliced.
pub struct ProductSearchQuery<'a> {
    filter: &'a ProductFilter,
    page: &'a PageRequest,
}

impl<'a> ProductSearchQuery<'a> {
    pub fn new(filter: &'a ProductFilter, page: &'a PageRequest) -> Self {
        Self { filter, page }
    }

    pub fn to_sql(&self) -> SqlResult {
        let mut params = Vec::new();
        let from_where = self.from_where(&mut params);
        let order_clause = FilterOrder::generate(&self.page.sort, "p.id");

        params.push(SqlParam::BigInt(self.page.limit()));
        let limit = params.len();
        params.push(SqlParam::BigInt(self.page.offset()));
        let offset = params.len();

        let query = format!(
            "SELECT DISTINCT {} {} {} LIMIT ${} OFFSET ${}",
            PRODUCT_COLUMNS, from_where, order_clause, limit, offset
        );
        SqlResult { query, params }
    }

    pub fn to_count_sql(&self) -> SqlResult {
        let mut params = Vec::new();
        let from_where = self.from_where(&mut params);
        let query = format!("SELECT COUNT(DISTINCT p.id) AS count {}", from_where);
        SqlResult { query, params }
    }

    fn from_where(&self, params: &mut Vec<SqlParam>) -> String {
        let mut sql =
            String::from("FROM tb_product p LEFT JOIN tb_product_category pc ON pc.product_id = p.id");
        let mut conditions = Vec::new();

        if let Some(category_id) = self.filter.category_id {
            params.push(SqlParam::BigInt(category_id));
            conditions.push(format!("pc.category_id = ${}", params.len()));
        }

        if !self.filter.name.is_empty() {
            params.push(SqlParam::Text(format!("%{}%", escape_like(&self.filter.name))));
            conditions.push(format!("LOWER(p.name) LIKE ${} ESCAPE '\\'", params.len()));
        }

        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql
    }
}

/// Make `%`, `_` and `\` in user input match literally inside a LIKE pattern.
pub fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

pub fn bind_params_query_as<'q, O>(
    mut q: sqlx::query::QueryAs<'q, Postgres, O, PgArguments>,
    params: &'q [SqlParam],
) -> sqlx::query::QueryAs<'q, Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, PgRow>,
{
    for p in params {
        q = match p {
            SqlParam::BigInt(v) => q.bind(*v),
            SqlParam::Text(s) => q.bind(s.as_str()),
        };
    }
    q
}

pub fn bind_params_scalar<'q, O>(
    mut q: sqlx::query::QueryScalar<'q, Postgres, O, PgArguments>,
    params: &'q [SqlParam],
) -> sqlx::query::QueryScalar<'q, Postgres, O, PgArguments> {
    for p in params {
        q = match p {
            SqlParam::BigInt(v) => q.bind(*v),
            SqlParam::Text(s) => q.bind(s.as_str()),
        };
    }
    q
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::repository::PRODUCT_SORT_FIELDS;

    fn page(sort: &str) -> PageRequest {
        let sort = FilterOrder::parse(sort, PRODUCT_SORT_FIELDS).unwrap();
        PageRequest::new(1, 10).with_sort(sort)
    }

    #[test]
    fn unfiltered_search_has_no_where() {
        let filter = ProductFilter::new(None, None);
        let page = page("");
        let sql = ProductSearchQuery::new(&filter, &page).to_sql();
        assert_eq!(
            sql.query,
            "SELECT DISTINCT p.id, p.name, p.description, p.price, p.img_url, p.date \
             FROM tb_product p LEFT JOIN tb_product_category pc ON pc.product_id = p.id \
             ORDER BY p.id ASC LIMIT $1 OFFSET $2"
        );
        assert_eq!(sql.params, vec![SqlParam::BigInt(10), SqlParam::BigInt(10)]);
    }

    #[test]
    fn category_and_name_filters_number_params_in_order() {
        let filter = ProductFilter::new(Some(3), Some("PC"));
        let page = page("name,desc");
        let sql = ProductSearchQuery::new(&filter, &page).to_sql();
        assert_eq!(
            sql.query,
            "SELECT DISTINCT p.id, p.name, p.description, p.price, p.img_url, p.date \
             FROM tb_product p LEFT JOIN tb_product_category pc ON pc.product_id = p.id \
             WHERE pc.category_id = $1 AND LOWER(p.name) LIKE $2 ESCAPE '\\' \
             ORDER BY p.name DESC, p.id ASC LIMIT $3 OFFSET $4"
        );
        assert_eq!(
            sql.params,
            vec![
                SqlParam::BigInt(3),
                SqlParam::Text("%pc%".to_string()),
                SqlParam::BigInt(10),
                SqlParam::BigInt(10),
            ]
        );
    }

    #[test]
    fn count_counts_distinct_products_with_same_filter() {
        let filter = ProductFilter::new(None, Some("gamer"));
        let page = page("price");
        let sql = ProductSearchQuery::new(&filter, &page).to_count_sql();
        assert_eq!(
            sql.query,
            "SELECT COUNT(DISTINCT p.id) AS count \
             FROM tb_product p LEFT JOIN tb_product_category pc ON pc.product_id = p.id \
             WHERE LOWER(p.name) LIKE $1 ESCAPE '\\'"
        );
        assert_eq!(sql.params, vec![SqlParam::Text("%gamer%".to_string())]);
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }
}
