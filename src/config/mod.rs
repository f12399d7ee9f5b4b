use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Connection string; `None` until DATABASE_URL is provided
    pub url: Option<String>,
    pub max_connections: u32,
    /// Pool acquire timeout in seconds
    pub connection_timeout: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub default_page_size: u32,
    pub max_page_size: u32,
    pub enable_request_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    #[serde(skip_serializing, default)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
}

impl Environment {
    /// `APP_ENV` value; anything unrecognised runs as development.
    fn detect() -> Self {
        match env::var("APP_ENV").unwrap_or_default().to_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "staging" | "stage" => Environment::Staging,
            _ => Environment::Development,
        }
    }
}

/// Overwrite `target` when `key` is set and parses; malformed values keep the profile default.
fn override_from_env<T: FromStr>(key: &str, target: &mut T) {
    if let Some(parsed) = env::var(key).ok().and_then(|raw| raw.trim().parse().ok()) {
        *target = parsed;
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut config = Self::for_environment(Environment::detect());
        config.apply_env_overrides();
        config
    }

    pub fn for_environment(environment: Environment) -> Self {
        match environment {
            Environment::Development => Self::development(),
            Environment::Staging => Self::staging(),
            Environment::Production => Self::production(),
        }
    }

    fn apply_env_overrides(&mut self) {
        let db = &mut self.database;
        if let Ok(url) = env::var("DATABASE_URL") {
            db.url = Some(url).filter(|u| !u.trim().is_empty()).or(db.url.take());
        }
        override_from_env("DATABASE_MAX_CONNECTIONS", &mut db.max_connections);
        override_from_env("DATABASE_CONNECTION_TIMEOUT", &mut db.connection_timeout);
        override_from_env("DATABASE_RUN_MIGRATIONS", &mut db.run_migrations);

        let api = &mut self.api;
        override_from_env("PORT", &mut api.port);
        override_from_env("API_PORT", &mut api.port);
        override_from_env("API_DEFAULT_PAGE_SIZE", &mut api.default_page_size);
        override_from_env("API_MAX_PAGE_SIZE", &mut api.max_page_size);
        override_from_env("API_ENABLE_REQUEST_LOGGING", &mut api.enable_request_logging);

        let security = &mut self.security;
        override_from_env("SECURITY_ENABLE_CORS", &mut security.enable_cors);
        override_from_env("SECURITY_JWT_EXPIRY_HOURS", &mut security.jwt_expiry_hours);
        if let Ok(origins) = env::var("SECURITY_CORS_ORIGINS") {
            security.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect();
        }
        if let Ok(secret) = env::var("JWT_SECRET") {
            security.jwt_secret = secret;
        }
    }

    /// Local work: generous page cap, fixed signing secret, Vite/CRA dev origins.
    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
                run_migrations: true,
            },
            api: ApiConfig {
                port: 8080,
                default_page_size: 12,
                max_page_size: 1000,
                enable_request_logging: true,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: ["http://localhost:3000", "http://localhost:5173"]
                    .map(String::from)
                    .to_vec(),
                jwt_secret: "dscatalog-development-secret".into(),
                jwt_expiry_hours: 24,
            },
        }
    }

    pub fn staging() -> Self {
        let mut config = Self::production();
        config.environment = Environment::Staging;
        config.database.max_connections = 20;
        config.database.connection_timeout = 10;
        config.database.run_migrations = true;
        config.api.max_page_size = 500;
        config.api.enable_request_logging = true;
        config.security.cors_origins = vec!["https://staging.dscatalog.dev".into()];
        config.security.jwt_expiry_hours = 24;
        config
    }

    /// Secret must come from `JWT_SECRET`; migrations run via `dscatalog migrate`.
    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
                run_migrations: false,
            },
            api: ApiConfig {
                port: 8080,
                default_page_size: 12,
                max_page_size: 100,
                enable_request_logging: false,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://dscatalog.dev".into()],
                jwt_secret: String::new(),
                jwt_expiry_hours: 4,
            },
        }
    }

    /// Reject configurations that would run with an unsigned token scheme.
    pub fn validate(&self) -> Result<(), String> {
        if self.security.jwt_secret.is_empty() {
            return Err(format!(
                "JWT_SECRET must be set in {:?} mode",
                self.environment
            ));
        }
        if self.api.default_page_size == 0 || self.api.default_page_size > self.api.max_page_size {
            return Err("API_DEFAULT_PAGE_SIZE must be between 1 and API_MAX_PAGE_SIZE".to_string());
        }
        Ok(())
    }
}

/// Process-wide configuration, read once by `cli::run` and passed down from there.
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}
