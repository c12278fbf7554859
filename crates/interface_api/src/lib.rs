//! HTTP API Layer
//!
//! REST surface of the policy assembly engine using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: policy issue, quote, listing and lifecycle; claim filing
//!   and listing; customer listing; health
//! - **Middleware**: bearer token authentication and request audit logging
//! - **DTOs**: camelCase request/response bodies validated with `validator`
//! - **Error Handling**: service errors mapped to HTTP statuses
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let app = create_router(AppState::new(service, config).with_pool(pool));
//! axum::serve(listener, app).await?;
//! ```

pub mod auth;
pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use app_services::AssemblyService;

use crate::config::ApiConfig;
use crate::handlers::{claims, customers, health, policy};
use crate::middleware::{audit_middleware, auth_middleware};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AssemblyService>,
    pub config: ApiConfig,
    /// Probed by `/health/ready`; absent when the service runs without a
    /// database
    pub pool: Option<PgPool>,
}

impl AppState {
    pub fn new(service: AssemblyService, config: ApiConfig) -> Self {
        Self {
            service: Arc::new(service),
            config,
            pool: None,
        }
    }

    pub fn with_pool(mut self, pool: PgPool) -> Self {
        self.pool = Some(pool);
        self
    }
}

/// Creates the main API router
pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let policy_routes = Router::new()
        .route("/", post(policy::issue_policy).get(policy::list_policies))
        .route("/quote", post(policy::quote_policy))
        .route("/:id", get(policy::get_policy).put(policy::update_policy))
        .route("/:id/status", put(policy::update_status));

    let claims_routes = Router::new()
        .route("/", post(claims::file_claim).get(claims::list_claims))
        .route("/:id", get(claims::get_claim));

    let api_routes = Router::new()
        .nest("/policies", policy_routes)
        .nest("/claims", claims_routes)
        .route("/customers", get(customers::list_customers))
        .layer(axum_middleware::from_fn(audit_middleware))
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .with_state(state)
}
