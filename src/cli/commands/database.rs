use anyhow::Context;
use tracing::info;

use crate::auth::password::hash_password;
use crate::config::AppConfig;
use crate::database::seed::{seed_catalog, seed_users, SEED_PASSWORD};
use crate::database::{DatabaseManager, Repositories};

pub async fn migrate(config: &AppConfig) -> anyhow::Result<()> {
    let pool = DatabaseManager::connect(&config.database).await?;
    DatabaseManager::migrate(&pool).await?;
    Ok(())
}

pub async fn seed(config: &AppConfig) -> anyhow::Result<()> {
    let pool = DatabaseManager::connect(&config.database).await?;
    if config.database.run_migrations {
        DatabaseManager::migrate(&pool).await?;
    }
    seed_all(&Repositories::postgres(pool)).await
}

/// Demo catalog plus the operator and admin accounts
pub async fn seed_all(repos: &Repositories) -> anyhow::Result<()> {
    seed_catalog(repos).await.context("seeding catalog")?;
    let hash = hash_password(SEED_PASSWORD)?;
    seed_users(repos, &hash).await.context("seeding users")?;
    info!("Seed complete");
    Ok(())
}
