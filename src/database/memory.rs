use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    Category, CategoryInput, NewUser, Product, ProductInput, ProductWithCategories, Role, User,
    UserChanges, UserWithRoles,
};
use crate::database::repository::{
    distinct_ids, CategoryRepository, HealthCheck, ProductFilter, ProductRepository,
    RoleRepository, SearchPage, UserRepository,
};
use crate::filter::types::{FilterOrderInfo, SortDirection};
use crate::filter::PageRequest;

#[derive(Default)]
struct Tables {
    products: BTreeMap<i64, Product>,
    categories: BTreeMap<i64, Category>,
    /// (product_id, category_id)
    product_categories: BTreeSet<(i64, i64)>,
    users: BTreeMap<i64, User>,
    roles: BTreeMap<i64, Role>,
    /// (user_id, role_id)
    user_roles: BTreeSet<(i64, i64)>,
    product_seq: i64,
    category_seq: i64,
    user_seq: i64,
    role_seq: i64,
}

fn next_id(seq: &mut i64) -> i64 {
    *seq += 1;
    *seq
}

impl Tables {
    fn product_graph(&self, id: i64) -> Option<ProductWithCategories> {
        let product = self.products.get(&id)?.clone();
        let categories = self
            .product_categories
            .range((id, i64::MIN)..=(id, i64::MAX))
            .filter_map(|(_, category_id)| self.categories.get(category_id).cloned())
            .collect();
        Some(ProductWithCategories { product, categories })
    }

    fn user_graph(&self, id: i64) -> Option<UserWithRoles> {
        let user = self.users.get(&id)?.clone();
        let roles = self
            .user_roles
            .range((id, i64::MIN)..=(id, i64::MAX))
            .filter_map(|(_, role_id)| self.roles.get(role_id).cloned())
            .collect();
        Some(UserWithRoles { user, roles })
    }

    fn search(&self, filter: &ProductFilter, page: &PageRequest) -> (Vec<Product>, i64) {
        let mut matches: Vec<Product> = self
            .products
            .values()
            .filter(|p| match filter.category_id {
                Some(category_id) => self.product_categories.contains(&(p.id, category_id)),
                None => true,
            })
            .filter(|p| p.name.to_lowercase().contains(&filter.name))
            .cloned()
            .collect();

        matches.sort_by(|a, b| {
            compare_by(
                a,
                b,
                &page.sort,
                |a, b, field| match field {
                    "name" => a.name.cmp(&b.name),
                    "price" => a.price.cmp(&b.price),
                    "date" => a.date.cmp(&b.date),
                    _ => a.id.cmp(&b.id),
                },
                |p| p.id,
            )
        });

        let total = matches.len() as i64;
        (slice(matches, page), total)
    }

    fn check_categories(&self, ids: &[i64]) -> Result<(), DatabaseError> {
        match ids.iter().find(|id| !self.categories.contains_key(id)) {
            Some(id) => Err(DatabaseError::ReferenceNotFound { entity: "Category", id: *id }),
            None => Ok(()),
        }
    }

    fn check_roles(&self, ids: &[i64]) -> Result<(), DatabaseError> {
        match ids.iter().find(|id| !self.roles.contains_key(id)) {
            Some(id) => Err(DatabaseError::ReferenceNotFound { entity: "Role", id: *id }),
            None => Ok(()),
        }
    }

    fn check_email_free(&self, email: &str, except: Option<i64>) -> Result<(), DatabaseError> {
        let taken = self
            .users
            .values()
            .any(|u| u.email == email && Some(u.id) != except);
        if taken {
            return Err(DatabaseError::UniqueViolation(format!("email {} already exists", email)));
        }
        Ok(())
    }

    fn replace_categories(&mut self, product_id: i64, ids: &[i64]) {
        self.product_categories.retain(|(p, _)| *p != product_id);
        self.product_categories.extend(ids.iter().map(|c| (product_id, *c)));
    }

    fn replace_roles(&mut self, user_id: i64, ids: &[i64]) {
        self.user_roles.retain(|(u, _)| *u != user_id);
        self.user_roles.extend(ids.iter().map(|r| (user_id, *r)));
    }
}

/// Lock-guarded tables with the same observable contract as the PostgreSQL store.
/// Used by tests and `serve --in-memory`.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Applies the requested ordering, then ascending id as the tie-breaker.
fn compare_by<T>(
    a: &T,
    b: &T,
    sort: &[FilterOrderInfo],
    field: impl Fn(&T, &T, &str) -> Ordering,
    id: impl Fn(&T) -> i64,
) -> Ordering {
    for info in sort {
        let ord = field(a, b, info.field.name);
        let ord = match info.sort {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    id(a).cmp(&id(b))
}

fn slice<T>(items: Vec<T>, page: &PageRequest) -> Vec<T> {
    let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    items.into_iter().skip(offset).take(page.size as usize).collect()
}

#[async_trait]
impl ProductRepository for InMemoryStore {
    async fn search(
        &self,
        filter: &ProductFilter,
        page: &PageRequest,
    ) -> Result<(Vec<Product>, i64), DatabaseError> {
        Ok(self.tables.read().await.search(filter, page))
    }

    async fn search_page(
        &self,
        filter: &ProductFilter,
        page: &PageRequest,
    ) -> Result<SearchPage, DatabaseError> {
        let tables = self.tables.read().await;
        let (found, total) = tables.search(filter, page);
        let ids: Vec<i64> = found.iter().map(|p| p.id).collect();
        let products = ids.iter().filter_map(|id| tables.product_graph(*id)).collect();
        Ok(SearchPage { ids, products, total })
    }

    async fn find_with_categories(
        &self,
        ids: &[i64],
    ) -> Result<Vec<ProductWithCategories>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(distinct_ids(ids)
            .into_iter()
            .filter_map(|id| tables.product_graph(id))
            .collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<ProductWithCategories>, DatabaseError> {
        Ok(self.tables.read().await.product_graph(id))
    }

    async fn insert(&self, input: &ProductInput) -> Result<ProductWithCategories, DatabaseError> {
        let mut tables = self.tables.write().await;
        let category_ids = distinct_ids(&input.category_ids);
        tables.check_categories(&category_ids)?;

        let id = next_id(&mut tables.product_seq);
        tables.products.insert(
            id,
            Product {
                id,
                name: input.name.clone(),
                description: input.description.clone(),
                price: input.price,
                img_url: input.img_url.clone(),
                date: input.date,
            },
        );
        tables.replace_categories(id, &category_ids);
        tables
            .product_graph(id)
            .ok_or_else(|| DatabaseError::NotFound(format!("Product {} not found", id)))
    }

    async fn update(
        &self,
        id: i64,
        input: &ProductInput,
    ) -> Result<ProductWithCategories, DatabaseError> {
        let mut tables = self.tables.write().await;
        if !tables.products.contains_key(&id) {
            return Err(DatabaseError::NotFound(format!("Product {} not found", id)));
        }
        let category_ids = distinct_ids(&input.category_ids);
        tables.check_categories(&category_ids)?;

        if let Some(product) = tables.products.get_mut(&id) {
            product.name = input.name.clone();
            product.description = input.description.clone();
            product.price = input.price;
            product.img_url = input.img_url.clone();
            product.date = input.date;
        }
        tables.replace_categories(id, &category_ids);
        tables
            .product_graph(id)
            .ok_or_else(|| DatabaseError::NotFound(format!("Product {} not found", id)))
    }

    async fn delete(&self, id: i64) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.products.remove(&id).is_none() {
            return Err(DatabaseError::NotFound(format!("Product {} not found", id)));
        }
        tables.replace_categories(id, &[]);
        Ok(())
    }

    async fn count(&self) -> Result<i64, DatabaseError> {
        Ok(self.tables.read().await.products.len() as i64)
    }
}

#[async_trait]
impl CategoryRepository for InMemoryStore {
    async fn find_page(&self, page: &PageRequest) -> Result<(Vec<Category>, i64), DatabaseError> {
        let tables = self.tables.read().await;
        let mut all: Vec<Category> = tables.categories.values().cloned().collect();
        all.sort_by(|a, b| {
            compare_by(
                a,
                b,
                &page.sort,
                |a, b, field| match field {
                    "name" => a.name.cmp(&b.name),
                    _ => a.id.cmp(&b.id),
                },
                |c| c.id,
            )
        });
        let total = all.len() as i64;
        Ok((slice(all, page), total))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Category>, DatabaseError> {
        Ok(self.tables.read().await.categories.get(&id).cloned())
    }

    async fn insert(&self, input: &CategoryInput) -> Result<Category, DatabaseError> {
        let mut tables = self.tables.write().await;
        let id = next_id(&mut tables.category_seq);
        let category = Category { id, name: input.name.clone() };
        tables.categories.insert(id, category.clone());
        Ok(category)
    }

    async fn update(&self, id: i64, input: &CategoryInput) -> Result<Category, DatabaseError> {
        let mut tables = self.tables.write().await;
        let category = tables
            .categories
            .get_mut(&id)
            .ok_or_else(|| DatabaseError::NotFound(format!("Category {} not found", id)))?;
        category.name = input.name.clone();
        Ok(category.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        if !tables.categories.contains_key(&id) {
            return Err(DatabaseError::NotFound(format!("Category {} not found", id)));
        }
        if tables.product_categories.iter().any(|(_, c)| *c == id) {
            return Err(DatabaseError::IntegrityViolation(format!(
                "category {} is still referenced by products",
                id
            )));
        }
        tables.categories.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_page(
        &self,
        page: &PageRequest,
    ) -> Result<(Vec<UserWithRoles>, i64), DatabaseError> {
        let tables = self.tables.read().await;
        let mut all: Vec<&User> = tables.users.values().collect();
        all.sort_by(|a, b| {
            compare_by(
                *a,
                *b,
                &page.sort,
                |a, b, field| match field {
                    "firstName" => a.first_name.cmp(&b.first_name),
                    "lastName" => a.last_name.cmp(&b.last_name),
                    "email" => a.email.cmp(&b.email),
                    _ => a.id.cmp(&b.id),
                },
                |u| u.id,
            )
        });
        let total = all.len() as i64;
        let content = slice(all, page)
            .into_iter()
            .filter_map(|u| tables.user_graph(u.id))
            .collect();
        Ok((content, total))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<UserWithRoles>, DatabaseError> {
        Ok(self.tables.read().await.user_graph(id))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserWithRoles>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.email == email)
            .and_then(|u| tables.user_graph(u.id)))
    }

    async fn insert(&self, user: &NewUser) -> Result<UserWithRoles, DatabaseError> {
        let mut tables = self.tables.write().await;
        let role_ids = distinct_ids(&user.role_ids);
        tables.check_roles(&role_ids)?;
        tables.check_email_free(&user.email, None)?;

        let id = next_id(&mut tables.user_seq);
        tables.users.insert(
            id,
            User {
                id,
                first_name: user.first_name.clone(),
                last_name: user.last_name.clone(),
                email: user.email.clone(),
                password: user.password_hash.clone(),
            },
        );
        tables.replace_roles(id, &role_ids);
        tables
            .user_graph(id)
            .ok_or_else(|| DatabaseError::NotFound(format!("User {} not found", id)))
    }

    async fn update(&self, id: i64, changes: &UserChanges) -> Result<UserWithRoles, DatabaseError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&id) {
            return Err(DatabaseError::NotFound(format!("User {} not found", id)));
        }
        let role_ids = distinct_ids(&changes.role_ids);
        tables.check_roles(&role_ids)?;
        tables.check_email_free(&changes.email, Some(id))?;

        if let Some(user) = tables.users.get_mut(&id) {
            user.first_name = changes.first_name.clone();
            user.last_name = changes.last_name.clone();
            user.email = changes.email.clone();
        }
        tables.replace_roles(id, &role_ids);
        tables
            .user_graph(id)
            .ok_or_else(|| DatabaseError::NotFound(format!("User {} not found", id)))
    }

    async fn delete(&self, id: i64) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.users.remove(&id).is_none() {
            return Err(DatabaseError::NotFound(format!("User {} not found", id)));
        }
        tables.replace_roles(id, &[]);
        Ok(())
    }
}

#[async_trait]
impl RoleRepository for InMemoryStore {
    async fn find_all(&self) -> Result<Vec<Role>, DatabaseError> {
        Ok(self.tables.read().await.roles.values().cloned().collect())
    }

    async fn find_by_authority(&self, authority: &str) -> Result<Option<Role>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.roles.values().find(|r| r.authority == authority).cloned())
    }

    async fn insert(&self, authority: &str) -> Result<Role, DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.roles.values().any(|r| r.authority == authority) {
            return Err(DatabaseError::UniqueViolation(format!(
                "authority {} already exists",
                authority
            )));
        }
        let id = next_id(&mut tables.role_seq);
        let role = Role { id, authority: authority.to_string() };
        tables.roles.insert(id, role.clone());
        Ok(role)
    }
}

#[async_trait]
impl HealthCheck for InMemoryStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::repository::PRODUCT_SORT_FIELDS;
    use crate::filter::FilterOrder;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn product(name: &str, category_ids: Vec<i64>) -> ProductInput {
        ProductInput {
            name: name.to_string(),
            description: String::new(),
            price: Decimal::new(9990, 2),
            img_url: None,
            date: Utc::now(),
            category_ids,
        }
    }

    async fn category(store: &InMemoryStore, name: &str) -> Category {
        CategoryRepository::insert(store, &CategoryInput { name: name.to_string() })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn duplicate_category_ids_collapse() {
        let store = InMemoryStore::new();
        let books = category(&store, "Books").await;
        let created = ProductRepository::insert(&store, &product("Dune", vec![books.id, books.id]))
            .await
            .unwrap();
        assert_eq!(created.categories, vec![books]);
    }

    #[tokio::test]
    async fn unknown_category_is_reference_not_found_and_writes_nothing() {
        let store = InMemoryStore::new();
        let err = ProductRepository::insert(&store, &product("Dune", vec![42])).await.unwrap_err();
        assert!(matches!(err, DatabaseError::ReferenceNotFound { entity: "Category", id: 42 }));
        assert_eq!(ProductRepository::count(&store).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn category_in_use_cannot_be_deleted() {
        let store = InMemoryStore::new();
        let books = category(&store, "Books").await;
        let p = ProductRepository::insert(&store, &product("Dune", vec![books.id])).await.unwrap();

        let err = CategoryRepository::delete(&store, books.id).await.unwrap_err();
        assert!(matches!(err, DatabaseError::IntegrityViolation(_)));

        ProductRepository::delete(&store, p.product.id).await.unwrap();
        CategoryRepository::delete(&store, books.id).await.unwrap();
    }

    #[tokio::test]
    async fn search_filters_and_counts_distinct_products() {
        let store = InMemoryStore::new();
        let books = category(&store, "Books").await;
        let computers = category(&store, "Computers").await;
        ProductRepository::insert(&store, &product("PC Gamer", vec![books.id, computers.id]))
            .await
            .unwrap();
        ProductRepository::insert(&store, &product("Macbook", vec![computers.id]))
            .await
            .unwrap();
        ProductRepository::insert(&store, &product("Orphan PC", vec![])).await.unwrap();

        let page = PageRequest::new(0, 10);
        let (all, total) = store.search(&ProductFilter::new(None, None), &page).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(all.len(), 3);

        let filter = ProductFilter::new(Some(computers.id), Some("pc"));
        let (found, total) = store.search(&filter, &page).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(found[0].name, "PC Gamer");
    }

    #[tokio::test]
    async fn search_page_hydrates_the_first_pass() {
        let store = InMemoryStore::new();
        let books = category(&store, "Books").await;
        let computers = category(&store, "Computers").await;
        ProductRepository::insert(&store, &product("Zed", vec![books.id, computers.id]))
            .await
            .unwrap();
        ProductRepository::insert(&store, &product("Alpha", vec![computers.id]))
            .await
            .unwrap();

        let sort = FilterOrder::parse("name", PRODUCT_SORT_FIELDS).unwrap();
        let page = PageRequest::new(0, 10).with_sort(sort);
        let filter = ProductFilter::new(Some(computers.id), None);
        let found = store.search_page(&filter, &page).await.unwrap();

        assert_eq!(found.total, 2);
        assert_eq!(found.ids, vec![2, 1]);
        let zed = found.products.iter().find(|p| p.product.id == 1).unwrap();
        assert_eq!(zed.categories, vec![books, computers]);
    }

    #[tokio::test]
    async fn duplicate_email_is_unique_violation() {
        let store = InMemoryStore::new();
        let user = NewUser {
            first_name: "Alex".to_string(),
            last_name: "Brown".to_string(),
            email: "alex@gmail.com".to_string(),
            password_hash: "hash".to_string(),
            role_ids: vec![],
        };
        UserRepository::insert(&store, &user).await.unwrap();
        let err = UserRepository::insert(&store, &user).await.unwrap_err();
        assert!(matches!(err, DatabaseError::UniqueViolation(_)));
    }
}
