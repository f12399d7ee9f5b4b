use std::sync::Arc;

use super::error::ServiceError;
use crate::auth::password::hash_password;
use crate::database::models::{NewUser, UserChanges, UserWithRoles};
use crate::database::repository::UserRepository;
use crate::database::DatabaseError;
use crate::filter::{Page, PageRequest};

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
}

fn email_conflict(email: &str) -> impl FnOnce(DatabaseError) -> ServiceError + '_ {
    move |err| match err {
        DatabaseError::UniqueViolation(_) => {
            ServiceError::Conflict(format!("Email {} is already in use", email))
        }
        other => other.into(),
    }
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    pub async fn find_all_paged(
        &self,
        page: &PageRequest,
    ) -> Result<Page<UserWithRoles>, ServiceError> {
        let (content, total) = self.users.find_page(page).await?;
        Ok(Page::new(content, page, total))
    }

    pub async fn find_by_id(&self, id: i64) -> Result<UserWithRoles, ServiceError> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", id)))
    }

    /// Stores an argon2 hash of `password`, never the plain text.
    pub async fn insert(
        &self,
        profile: &UserChanges,
        password: &str,
    ) -> Result<UserWithRoles, ServiceError> {
        let password_hash =
            hash_password(password).map_err(|e| ServiceError::Internal(e.to_string()))?;
        let user = NewUser {
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            email: profile.email.clone(),
            password_hash,
            role_ids: profile.role_ids.clone(),
        };
        self.users.insert(&user).await.map_err(email_conflict(&profile.email))
    }

    pub async fn update(&self, id: i64, changes: &UserChanges) -> Result<UserWithRoles, ServiceError> {
        self.users.update(id, changes).await.map_err(email_conflict(&changes.email))
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        Ok(self.users.delete(id).await?)
    }
}
