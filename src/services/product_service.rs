use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::error::ServiceError;
use crate::database::models::{ProductInput, ProductWithCategories};
use crate::database::repository::{ProductFilter, ProductRepository};
use crate::filter::{Page, PageRequest};

#[derive(Clone)]
pub struct ProductService {
    products: Arc<dyn ProductRepository>,
}

impl ProductService {
    pub fn new(products: Arc<dyn ProductRepository>) -> Self {
        Self { products }
    }

    /// Filtered listing. The first pass picks and counts distinct products, the
    /// second loads complete category sets for that page only.
    pub async fn find_all_paged(
        &self,
        filter: &ProductFilter,
        page: &PageRequest,
    ) -> Result<Page<ProductWithCategories>, ServiceError> {
        let found = self.products.search_page(filter, page).await?;
        debug!("Product search {:?} matched {} (page of {})", filter, found.total, found.ids.len());

        Ok(Page::new(restore_order(&found.ids, found.products), page, found.total))
    }

    pub async fn find_by_id(&self, id: i64) -> Result<ProductWithCategories, ServiceError> {
        self.products
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", id)))
    }

    pub async fn insert(&self, input: &ProductInput) -> Result<ProductWithCategories, ServiceError> {
        Ok(self.products.insert(input).await?)
    }

    pub async fn update(
        &self,
        id: i64,
        input: &ProductInput,
    ) -> Result<ProductWithCategories, ServiceError> {
        Ok(self.products.update(id, input).await?)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        Ok(self.products.delete(id).await?)
    }
}

/// Arrange hydrated products in the order of `ids`, dropping any that vanished
/// between the two passes.
fn restore_order(ids: &[i64], items: Vec<ProductWithCategories>) -> Vec<ProductWithCategories> {
    let mut by_id: HashMap<i64, ProductWithCategories> =
        items.into_iter().map(|p| (p.product.id, p)).collect();
    ids.iter().filter_map(|id| by_id.remove(id)).collect()
}
