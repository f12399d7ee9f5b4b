use std::sync::Arc;

use tracing::{info, warn};

use super::error::ServiceError;
use crate::auth::password::verify_password;
use crate::auth::{generate_jwt, validate_jwt, Claims};
use crate::config::SecurityConfig;
use crate::database::models::UserWithRoles;
use crate::database::repository::UserRepository;

const INVALID_CREDENTIALS: &str = "Invalid username or password";

/// Issued token plus the account it belongs to
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub access_token: String,
    pub expires_in: i64,
    pub user: UserWithRoles,
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    jwt_secret: String,
    expiry_hours: u64,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, security: &SecurityConfig) -> Self {
        Self {
            users,
            jwt_secret: security.jwt_secret.clone(),
            expiry_hours: security.jwt_expiry_hours,
        }
    }

    /// Unknown emails and wrong passwords fail identically.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, ServiceError> {
        let Some(user) = self.users.find_by_email(email).await? else {
            warn!("Login failed: no account for {}", email);
            return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        };

        if !verify_password(password, &user.user.password) {
            warn!("Login failed: wrong password for {}", email);
            return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        let claims = Claims::new(
            user.user.id,
            user.user.email.clone(),
            user.authorities(),
            self.expiry_hours,
        );
        let access_token = generate_jwt(&claims, &self.jwt_secret)
            .map_err(|e| ServiceError::Internal(e.to_string()))?;

        info!("User {} logged in", email);
        Ok(LoginOutcome {
            access_token,
            expires_in: claims.exp - claims.iat,
            user,
        })
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, ServiceError> {
        validate_jwt(token, &self.jwt_secret).map_err(|e| ServiceError::Unauthorized(e.to_string()))
    }
}
