use std::sync::Arc;

use super::error::ServiceError;
use crate::database::models::{Category, CategoryInput};
use crate::database::repository::CategoryRepository;
use crate::filter::{Page, PageRequest};

#[derive(Clone)]
pub struct CategoryService {
    categories: Arc<dyn CategoryRepository>,
}

impl CategoryService {
    pub fn new(categories: Arc<dyn CategoryRepository>) -> Self {
        Self { categories }
    }

    pub async fn find_all_paged(&self, page: &PageRequest) -> Result<Page<Category>, ServiceError> {
        let (content, total) = self.categories.find_page(page).await?;
        Ok(Page::new(content, page, total))
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Category, ServiceError> {
        self.categories
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Category {} not found", id)))
    }

    pub async fn insert(&self, input: &CategoryInput) -> Result<Category, ServiceError> {
        Ok(self.categories.insert(input).await?)
    }

    pub async fn update(&self, id: i64, input: &CategoryInput) -> Result<Category, ServiceError> {
        Ok(self.categories.update(id, input).await?)
    }

    /// Conflict while any product still references the category
    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        Ok(self.categories.delete(id).await?)
    }
}
