//! CoApp API library
//!
//! Multi-tenant inventory and purchasing backend: users own companies,
//! companies own materials (with a stock movement ledger) and purchases
//! (with line items whose totals roll up into the purchase).
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod services;
pub mod tracing;

use axum::{
    extract::{FromRef, State},
    http::{header, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
};

use crate::{
    auth::{AuthConfig, AuthService},
    config::AppConfig,
    db::DbPool,
    handlers::AppServices,
};

pub const API_NAME: &str = "CoApp 2.0";
pub const API_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: AppConfig,
    pub auth: Arc<AuthService>,
    pub services: AppServices,
}

impl AppState {
    pub fn new(db: Arc<DbPool>, config: AppConfig) -> Self {
        let auth = Arc::new(AuthService::new(AuthConfig::from(&config), db.clone()));
        let services = AppServices::new(db.clone());
        Self {
            db,
            config,
            auth,
            services,
        }
    }
}

impl FromRef<AppState> for Arc<AuthService> {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

/// Full HTTP surface with request-id, tracing, compression and CORS layers.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/auth", handlers::auth::auth_routes())
        .nest("/companies", handlers::companies::company_routes())
        .nest("/materials", handlers::materials::material_routes())
        .nest("/purchases", handlers::purchases::purchase_routes())
        .merge(openapi::swagger_ui())
        .fallback(not_found)
        .layer(crate::tracing::configure_http_tracing())
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(state)
}

/// Explicit origins get credentials; the permissive fallback never does.
pub fn cors_layer(cfg: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = cfg
        .cors_origins()
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    let base = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::HeaderName::from_static(middleware_helpers::REQUEST_ID_HEADER),
        ])
        .expose_headers([header::HeaderName::from_static(
            middleware_helpers::REQUEST_ID_HEADER,
        )]);

    if cfg.cors_allow_any_origin || origins.is_empty() {
        ::tracing::info!("Using permissive CORS origin policy");
        base.allow_origin(AllowOrigin::any())
    } else {
        base.allow_origin(origins)
            .allow_credentials(cfg.cors_allow_credentials)
    }
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "message": "CoApp 2.0 API",
        "version": API_VERSION,
        "status": "operational",
        "docs": openapi::DOCS_PATH,
    }))
}

async fn health_check(State(state): State<AppState>) -> Response {
    let (status, code, database) = match db::check_connection(&state.db).await {
        Ok(()) => ("healthy", StatusCode::OK, "connected"),
        Err(err) => {
            ::tracing::warn!(error = %err, "Health check database ping failed");
            ("unhealthy", StatusCode::SERVICE_UNAVAILABLE, "unreachable")
        }
    };

    (
        code,
        Json(json!({
            "status": status,
            "api": API_NAME,
            "version": API_VERSION,
            "database": database,
        })),
    )
        .into_response()
}

async fn not_found(uri: Uri) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "detail": "The requested resource was not found",
            "path": uri.path(),
        })),
    )
        .into_response()
}

pub mod prelude {
    pub use crate::config::AppConfig;
    pub use crate::db::{with_transaction, DbPool};
    pub use crate::errors::{ApiError, ServiceError};
    pub use crate::{build_router, AppState};
}
