use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::auth::Claims;
use crate::database::models::{
    Category, CategoryInput, ProductInput, ProductWithCategories, Role, UserChanges, UserWithRoles,
};
use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryDto {
    pub id: i64,
    pub name: String,
}

impl CategoryDto {
    pub fn from_entity(category: Category) -> Self {
        Self { id: category.id, name: category.name }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub img_url: Option<String>,
    pub date: DateTime<Utc>,
    pub categories: Vec<CategoryDto>,
}

impl ProductDto {
    /// Categories are listed by ascending id
    pub fn from_entity(entity: ProductWithCategories) -> Self {
        let mut categories: Vec<CategoryDto> =
            entity.categories.into_iter().map(CategoryDto::from_entity).collect();
        categories.sort_by_key(|c| c.id);
        let p = entity.product;
        Self {
            id: p.id,
            name: p.name,
            description: p.description,
            price: p.price,
            img_url: p.img_url,
            date: p.date,
            categories,
        }
    }
}

/// Association reference inside a request body; only `id` is read.
#[derive(Debug, Clone, Deserialize)]
pub struct IdRef {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub img_url: Option<String>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub categories: Vec<IdRef>,
}

impl ProductRequest {
    pub fn into_input(self) -> Result<ProductInput, ApiError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(ApiError::bad_request("Product name is required"));
        }
        if self.price <= Decimal::ZERO {
            return Err(ApiError::bad_request("Price must be positive"));
        }
        Ok(ProductInput {
            name,
            description: self.description,
            price: self.price,
            img_url: self.img_url,
            date: self.date.unwrap_or_else(Utc::now),
            category_ids: self.categories.into_iter().map(|c| c.id).collect(),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryRequest {
    pub name: String,
}

impl CategoryRequest {
    pub fn into_input(self) -> Result<CategoryInput, ApiError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(ApiError::bad_request("Category name is required"));
        }
        Ok(CategoryInput { name })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleDto {
    pub id: i64,
    pub authority: String,
}

impl RoleDto {
    pub fn from_entity(role: Role) -> Self {
        Self { id: role.id, authority: role.authority }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub roles: Vec<RoleDto>,
}

impl UserDto {
    pub fn from_entity(entity: UserWithRoles) -> Self {
        let mut roles: Vec<RoleDto> = entity.roles.into_iter().map(RoleDto::from_entity).collect();
        roles.sort_by_key(|r| r.id);
        Self {
            id: entity.user.id,
            first_name: entity.user.first_name,
            last_name: entity.user.last_name,
            email: entity.user.email,
            roles,
        }
    }
}

fn user_changes(
    first_name: String,
    last_name: String,
    email: String,
    roles: Vec<IdRef>,
) -> Result<UserChanges, ApiError> {
    let email = email.trim().to_string();
    if !email.contains('@') {
        return Err(ApiError::bad_request("A valid email is required"));
    }
    if first_name.trim().is_empty() {
        return Err(ApiError::bad_request("First name is required"));
    }
    Ok(UserChanges {
        first_name: first_name.trim().to_string(),
        last_name: last_name.trim().to_string(),
        email,
        role_ids: roles.into_iter().map(|r| r.id).collect(),
    })
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInsertDto {
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub roles: Vec<IdRef>,
}

impl UserInsertDto {
    /// Profile fields plus the plain password to hash
    pub fn into_parts(self) -> Result<(UserChanges, String), ApiError> {
        if self.password.is_empty() {
            return Err(ApiError::bad_request("Password is required"));
        }
        let changes = user_changes(self.first_name, self.last_name, self.email, self.roles)?;
        Ok((changes, self.password))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdateDto {
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub roles: Vec<IdRef>,
}

impl UserUpdateDto {
    pub fn into_changes(self) -> Result<UserChanges, ApiError> {
        user_changes(self.first_name, self.last_name, self.email, self.roles)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub user: UserDto,
}

#[derive(Debug, Clone, Serialize)]
pub struct WhoAmIDto {
    pub id: i64,
    pub email: String,
    pub authorities: Vec<String>,
    pub exp: i64,
}

impl WhoAmIDto {
    pub fn from_claims(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            authorities: claims.authorities,
            exp: claims.exp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{Product, User};
    use serde_json::json;

    fn smart_tv() -> ProductWithCategories {
        ProductWithCategories {
            product: Product {
                id: 2,
                name: "Smart TV".into(),
                description: "Big screen".into(),
                price: Decimal::new(219000, 2),
                img_url: Some("https://img/2-big.jpg".into()),
                date: Utc::now(),
            },
            categories: vec![
                Category { id: 3, name: "Computers".into() },
                Category { id: 2, name: "Electronics".into() },
            ],
        }
    }

    #[test]
    fn product_dto_is_camel_case_with_sorted_categories() {
        let json = serde_json::to_value(ProductDto::from_entity(smart_tv())).unwrap();
        assert_eq!(json["imgUrl"], "https://img/2-big.jpg");
        assert_eq!(json["price"], 2190.0);
        assert_eq!(json["categories"][0]["id"], 2);
        assert_eq!(json["categories"][1]["name"], "Computers");
    }

    #[test]
    fn product_request_collects_category_ids() {
        let body = json!({
            "name": " Phone ",
            "price": 800.0,
            "imgUrl": null,
            "categories": [{"id": 1}, {"id": 2, "name": "ignored"}]
        });
        let input = serde_json::from_value::<ProductRequest>(body).unwrap().into_input().unwrap();
        assert_eq!(input.name, "Phone");
        assert_eq!(input.category_ids, vec![1, 2]);
        assert_eq!(input.description, "");
    }

    #[test]
    fn product_request_rejects_non_positive_price() {
        let body = json!({"name": "Phone", "price": 0});
        let err = serde_json::from_value::<ProductRequest>(body).unwrap().into_input().unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn user_dto_never_exposes_password() {
        let entity = UserWithRoles {
            user: User {
                id: 1,
                first_name: "Alex".into(),
                last_name: "Brown".into(),
                email: "alex@gmail.com".into(),
                password: "$argon2id$secret".into(),
            },
            roles: vec![Role { id: 1, authority: "ROLE_OPERATOR".into() }],
        };
        let json = serde_json::to_value(UserDto::from_entity(entity)).unwrap();
        assert_eq!(json["firstName"], "Alex");
        assert_eq!(json["roles"][0]["authority"], "ROLE_OPERATOR");
        assert!(json.get("password").is_none());
        assert!(!json.to_string().contains("argon2"));
    }

    #[test]
    fn user_insert_requires_password_and_email() {
        let body = json!({"firstName": "Bob", "email": "bob@gmail.com", "password": ""});
        let dto: UserInsertDto = serde_json::from_value(body).unwrap();
        assert!(dto.into_parts().is_err());

        let body = json!({"firstName": "Bob", "email": "bob", "password": "x"});
        let dto: UserInsertDto = serde_json::from_value(body).unwrap();
        assert!(dto.into_parts().is_err());
    }
}
