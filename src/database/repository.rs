use std::sync::Arc;

use async_trait::async_trait;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    Category, CategoryInput, NewUser, Product, ProductInput, ProductWithCategories, Role,
    UserChanges, UserWithRoles,
};
use crate::filter::{PageRequest, SortField};

/// Normalised product search criteria.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    /// `None` means any category
    pub category_id: Option<i64>,
    /// Lower-cased substring, spaces kept; empty means any name
    pub name: String,
}

impl ProductFilter {
    /// A category id of 0 and an empty name both mean "no filter".
    pub fn new(category_id: Option<i64>, name: Option<&str>) -> Self {
        Self {
            category_id: category_id.filter(|id| *id != 0),
            name: name.map(str::to_lowercase).unwrap_or_default(),
        }
    }
}

pub const PRODUCT_SORT_FIELDS: &[SortField] = &[
    SortField { name: "id", column: "p.id" },
    SortField { name: "name", column: "p.name" },
    SortField { name: "price", column: "p.price" },
    SortField { name: "date", column: "p.date" },
];

pub const CATEGORY_SORT_FIELDS: &[SortField] = &[
    SortField { name: "id", column: "id" },
    SortField { name: "name", column: "name" },
];

pub const USER_SORT_FIELDS: &[SortField] = &[
    SortField { name: "id", column: "id" },
    SortField { name: "firstName", column: "first_name" },
    SortField { name: "lastName", column: "last_name" },
    SortField { name: "email", column: "email" },
];

/// Both passes of a product listing: ids in pass-1 order, their hydrated
/// graphs (any order) and the distinct match count.
#[derive(Debug, Default)]
pub struct SearchPage {
    pub ids: Vec<i64>,
    pub products: Vec<ProductWithCategories>,
    pub total: i64,
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Distinct products matching `filter`, ordered and sliced by `page`, with the
    /// total number of distinct matches.
    async fn search(
        &self,
        filter: &ProductFilter,
        page: &PageRequest,
    ) -> Result<(Vec<Product>, i64), DatabaseError>;

    /// Products with their complete category sets, in no particular order.
    async fn find_with_categories(
        &self,
        ids: &[i64],
    ) -> Result<Vec<ProductWithCategories>, DatabaseError>;

    /// `search` followed by `find_with_categories`. Stores override this to read
    /// both passes from one snapshot.
    async fn search_page(
        &self,
        filter: &ProductFilter,
        page: &PageRequest,
    ) -> Result<SearchPage, DatabaseError> {
        let (found, total) = self.search(filter, page).await?;
        let ids: Vec<i64> = found.iter().map(|p| p.id).collect();
        let products = self.find_with_categories(&ids).await?;
        Ok(SearchPage { ids, products, total })
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<ProductWithCategories>, DatabaseError>;

    async fn insert(&self, input: &ProductInput) -> Result<ProductWithCategories, DatabaseError>;

    /// Overwrites scalar fields and replaces the category set in one transaction.
    async fn update(
        &self,
        id: i64,
        input: &ProductInput,
    ) -> Result<ProductWithCategories, DatabaseError>;

    async fn delete(&self, id: i64) -> Result<(), DatabaseError>;

    async fn count(&self) -> Result<i64, DatabaseError>;
}

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn find_page(&self, page: &PageRequest) -> Result<(Vec<Category>, i64), DatabaseError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Category>, DatabaseError>;

    async fn insert(&self, input: &CategoryInput) -> Result<Category, DatabaseError>;

    async fn update(&self, id: i64, input: &CategoryInput) -> Result<Category, DatabaseError>;

    /// Fails with `IntegrityViolation` while products still reference the category.
    async fn delete(&self, id: i64) -> Result<(), DatabaseError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_page(
        &self,
        page: &PageRequest,
    ) -> Result<(Vec<UserWithRoles>, i64), DatabaseError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<UserWithRoles>, DatabaseError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserWithRoles>, DatabaseError>;

    async fn insert(&self, user: &NewUser) -> Result<UserWithRoles, DatabaseError>;

    /// Overwrites profile fields and replaces the role set; the password is kept.
    async fn update(&self, id: i64, changes: &UserChanges) -> Result<UserWithRoles, DatabaseError>;

    async fn delete(&self, id: i64) -> Result<(), DatabaseError>;
}

#[async_trait]
pub trait RoleRepository: Send + Sync {
    async fn find_all(&self) -> Result<Vec<Role>, DatabaseError>;

    async fn find_by_authority(&self, authority: &str) -> Result<Option<Role>, DatabaseError>;

    async fn insert(&self, authority: &str) -> Result<Role, DatabaseError>;
}

#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn ping(&self) -> Result<(), DatabaseError>;
}

/// Every repository the services need, behind trait objects.
#[derive(Clone)]
pub struct Repositories {
    pub products: Arc<dyn ProductRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub users: Arc<dyn UserRepository>,
    pub roles: Arc<dyn RoleRepository>,
    pub health: Arc<dyn HealthCheck>,
}

impl Repositories {
    pub fn postgres(pool: sqlx::PgPool) -> Self {
        let store = Arc::new(crate::database::postgres::PgStore::new(pool));
        Self {
            products: store.clone(),
            categories: store.clone(),
            users: store.clone(),
            roles: store.clone(),
            health: store,
        }
    }

    pub fn in_memory() -> Self {
        let store = Arc::new(crate::database::memory::InMemoryStore::new());
        Self {
            products: store.clone(),
            categories: store.clone(),
            users: store.clone(),
            roles: store.clone(),
            health: store,
        }
    }
}

/// Identifiers in first-seen order with repeats removed.
pub fn distinct_ids(ids: &[i64]) -> Vec<i64> {
    let mut out: Vec<i64> = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(id) {
            out.push(*id);
        }
    }
    out
}
