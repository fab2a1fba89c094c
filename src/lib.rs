pub mod api;
pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod database;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod state;
pub mod types;

use axum::{
    extract::State,
    http::HeaderValue,
    middleware::from_fn_with_state,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::error::ApiError;
pub use crate::state::{AppState, StateError};

/// The full HTTP application: public auth routes, bearer-gated catalog routes, probes
pub fn app(state: AppState) -> Router {
    let router = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth_public_routes())
        // Protected
        .merge(book_routes(state.clone()))
        // Global middleware
        .layer(cors_layer(&state.config.security.cors_origins));

    let router = if state.config.api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    };

    router.with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    use handlers::public::auth;

    Router::new()
        .route("/auth/signup", post(auth::signup_post))
        .route("/auth/login", post(auth::login_post))
}

fn book_routes(state: AppState) -> Router<AppState> {
    use handlers::protected::books;

    Router::new()
        .route("/books", get(books::books_get).post(books::books_post))
        .route(
            "/books/:id",
            get(books::book_get).put(books::book_put).delete(books::book_delete),
        )
        .route_layer(from_fn_with_state(state, middleware::jwt_auth_middleware))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::permissive().allow_origin(AllowOrigin::list(origins))
}

async fn root() -> Json<Value> {
    Json(json!({
        "name": "Bookshelf API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Personal library catalog with token authentication",
        "endpoints": {
            "auth": "/auth/signup, /auth/login (public - token acquisition)",
            "books": "/books[/:id] (protected - bearer token)",
            "health": "/health (public)",
        }
    }))
}

async fn health(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    if let Err(e) = state.storage.health_check().await {
        tracing::error!("Health check failed: {}", e);
        return Err(ApiError::service_unavailable("Database temporarily unavailable"));
    }

    Ok(Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
        "storage": state.storage.backend(),
    })))
}
