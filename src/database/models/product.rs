use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::category::Category;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub img_url: Option<String>,
    pub date: DateTime<Utc>,
}

/// A product together with its full category set.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductWithCategories {
    pub product: Product,
    pub categories: Vec<Category>,
}

/// Writable fields of a product. `category_ids` replaces the whole association set.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductInput {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub img_url: Option<String>,
    pub date: DateTime<Utc>,
    pub category_ids: Vec<i64>,
}
