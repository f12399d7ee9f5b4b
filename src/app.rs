use std::sync::Arc;

use axum::http::HeaderValue;
use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::{AppConfig, SecurityConfig};
use crate::database::repository::{HealthCheck, Repositories};
use crate::handlers;
use crate::services::{AuthService, CategoryService, ProductService, UserService};

/// Shared, cheaply cloneable handler state
#[derive(Clone)]
pub struct AppState {
    pub products: ProductService,
    pub categories: CategoryService,
    pub users: UserService,
    pub auth: AuthService,
    pub health: Arc<dyn HealthCheck>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(repos: &Repositories, config: AppConfig) -> Self {
        Self {
            products: ProductService::new(repos.products.clone()),
            categories: CategoryService::new(repos.categories.clone()),
            users: UserService::new(repos.users.clone()),
            auth: AuthService::new(repos.users.clone(), &config.security),
            health: repos.health.clone(),
            config: Arc::new(config),
        }
    }
}

pub fn app(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/", get(handlers::health::root))
        .route("/health", get(handlers::health::health))
        .merge(auth_routes())
        .merge(product_routes())
        .merge(category_routes())
        .merge(user_routes())
        .layer(cors_layer(&state.config.security));

    if state.config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router.with_state(state)
}

fn auth_routes() -> Router<AppState> {
    use axum::routing::post;
    use handlers::auth;

    Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/whoami", get(auth::whoami))
}

fn product_routes() -> Router<AppState> {
    use handlers::products;

    Router::new()
        .route("/products", get(products::list).post(products::create))
        .route(
            "/products/:id",
            get(products::get).put(products::update).delete(products::delete),
        )
}

fn category_routes() -> Router<AppState> {
    use handlers::categories;

    Router::new()
        .route("/categories", get(categories::list).post(categories::create))
        .route(
            "/categories/:id",
            get(categories::get).put(categories::update).delete(categories::delete),
        )
}

fn user_routes() -> Router<AppState> {
    use handlers::users;

    Router::new()
        .route("/users", get(users::list).post(users::create))
        .route("/users/:id", get(users::get).put(users::update).delete(users::delete))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }
    if security.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}
