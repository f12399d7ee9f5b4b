use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use tracing::info;

use crate::database::manager::DatabaseError;
use crate::database::models::role::{ROLE_ADMIN, ROLE_OPERATOR};
use crate::database::models::{CategoryInput, NewUser, ProductInput};
use crate::database::repository::Repositories;

/// Plain password of the seeded accounts.
pub const SEED_PASSWORD: &str = "123456";

const CATEGORIES: [&str; 3] = ["Books", "Electronics", "Computers"];

const BOOKS: usize = 0;
const ELECTRONICS: usize = 1;
const COMPUTERS: usize = 2;

/// (name, price in cents, category indexes)
const PRODUCTS: &[(&str, i64, &[usize])] = &[
    ("The Lord of the Rings", 9050, &[BOOKS]),
    ("Smart TV", 219000, &[ELECTRONICS, COMPUTERS]),
    ("Macbook Pro", 125000, &[COMPUTERS]),
    ("PC Gamer", 120000, &[COMPUTERS]),
    ("Rails for Dummies", 10099, &[BOOKS]),
    ("PC Gamer Ex", 135000, &[COMPUTERS]),
    ("PC Gamer X", 135000, &[COMPUTERS]),
    ("PC Gamer Alfa", 185000, &[COMPUTERS]),
    ("PC Gamer Tera", 195000, &[COMPUTERS]),
    ("PC Gamer Y", 170000, &[COMPUTERS]),
    ("PC Gamer Nitro", 145000, &[COMPUTERS]),
    ("PC Gamer Card", 185000, &[COMPUTERS]),
    ("PC Gamer Plus", 135000, &[COMPUTERS]),
    ("PC Gamer Hera", 225000, &[COMPUTERS]),
    ("PC Gamer Weed", 220000, &[COMPUTERS]),
    ("PC Gamer Max", 234000, &[COMPUTERS]),
    ("PC Gamer Turbo", 128000, &[COMPUTERS]),
    ("PC Gamer Hot", 145000, &[COMPUTERS]),
    ("PC Gamer Ez", 175000, &[COMPUTERS]),
    ("PC Gamer Tr", 165000, &[COMPUTERS]),
    ("PC Gamer Tx", 168000, &[COMPUTERS]),
    ("PC Gamer Er", 185000, &[COMPUTERS]),
    ("PC Gamer Min", 225000, &[COMPUTERS]),
    ("PC Gamer Boo", 235000, &[COMPUTERS]),
    ("PC Gamer Foo", 417000, &[COMPUTERS]),
];

const DESCRIPTION: &str = "Lorem ipsum dolor sit amet, consectetur adipiscing elit, \
     sed do eiusmod tempor incididunt ut labore et dolore magna aliqua.";

/// Insert the demo catalog. Returns `false` when products already exist.
pub async fn seed_catalog(repos: &Repositories) -> Result<bool, DatabaseError> {
    if repos.products.count().await? > 0 {
        info!("Catalog already populated, skipping seed");
        return Ok(false);
    }

    let mut category_ids = Vec::with_capacity(CATEGORIES.len());
    for name in CATEGORIES {
        let category = repos.categories.insert(&CategoryInput { name: name.to_string() }).await?;
        category_ids.push(category.id);
    }

    let released = Utc.with_ymd_and_hms(2020, 7, 13, 20, 50, 7).single().unwrap_or_else(Utc::now);
    for (i, (name, cents, categories)) in PRODUCTS.iter().enumerate() {
        let n = i + 1;
        let input = ProductInput {
            name: name.to_string(),
            description: DESCRIPTION.to_string(),
            price: Decimal::new(*cents, 2),
            img_url: Some(format!(
                "https://raw.githubusercontent.com/devsuperior/dscatalog-resources/master/backend/img/{}-big.jpg",
                n
            )),
            date: released + Duration::days(i as i64),
            category_ids: categories.iter().map(|c| category_ids[*c]).collect(),
        };
        repos.products.insert(&input).await?;
    }

    info!("Seeded {} categories and {} products", CATEGORIES.len(), PRODUCTS.len());
    Ok(true)
}

/// Ensure both roles exist and create the demo accounts that are missing.
/// `password_hash` is stored as-is for every seeded account.
pub async fn seed_users(repos: &Repositories, password_hash: &str) -> Result<(), DatabaseError> {
    let mut role_ids = Vec::with_capacity(2);
    for authority in [ROLE_OPERATOR, ROLE_ADMIN] {
        let role = match repos.roles.find_by_authority(authority).await? {
            Some(role) => role,
            None => repos.roles.insert(authority).await?,
        };
        role_ids.push(role.id);
    }
    let (operator, admin) = (role_ids[0], role_ids[1]);

    let accounts = [
        ("Alex", "Brown", "alex@gmail.com", vec![operator]),
        ("Maria", "Green", "maria@gmail.com", vec![operator, admin]),
    ];
    for (first_name, last_name, email, roles) in accounts {
        if repos.users.find_by_email(email).await?.is_some() {
            continue;
        }
        repos
            .users
            .insert(&NewUser {
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                email: email.to_string(),
                password_hash: password_hash.to_string(),
                role_ids: roles,
            })
            .await?;
        info!("Seeded user {}", email);
    }
    Ok(())
}
