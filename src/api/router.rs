//! API router.
//!
//! Middleware stack on protected routes (outermost → innermost):
//! 1. Auth validator → 2. Audit logger
//!
//! Every response carries `Cache-Control: no-store`; patient data must
//! not land in shared caches.

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Build the API router.
///
/// Middleware uses `Extension<ApiContext>` (injected as the outermost layer).
/// Endpoint handlers use `State<ApiContext>` (provided via `with_state`).
pub fn api_router(core: Arc<CoreState>) -> Router {
    build_router(ApiContext::new(core))
}

fn build_router(ctx: ApiContext) -> Router {
    // Layers are applied from bottom (innermost) to top (outermost):
    //   Extension (outermost) → Auth → Audit (innermost) → Handler
    //
    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let protected = Router::new()
        .route(
            "/patients",
            post(endpoints::patients::create).get(endpoints::patients::list),
        )
        .route(
            "/patients/:id",
            get(endpoints::patients::detail).put(endpoints::patients::update),
        )
        .route("/patients/:id/trend", get(endpoints::patients::trend))
        .route("/indicators", post(endpoints::indicators::submit))
        .route("/followups", get(endpoints::follow_ups::list))
        .route(
            "/followups/:id",
            axum::routing::patch(endpoints::follow_ups::update),
        )
        .route("/dashboard", get(endpoints::reports::dashboard))
        .route("/logout", post(endpoints::auth::logout))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::middleware::from_fn(middleware::auth::require_auth))
        .layer(axum::Extension(ctx.clone()));

    // Unprotected routes: still audited, as "anonymous"
    let unprotected = Router::new()
        .route("/", get(endpoints::health::welcome))
        .route("/health", get(endpoints::health::check))
        .route("/users", post(endpoints::auth::register))
        .route("/token", post(endpoints::auth::login))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::Extension(ctx));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    Router::new()
        .merge(protected)
        .merge(unprotected)
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(cors)
}
