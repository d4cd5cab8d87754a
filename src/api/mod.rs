//! HTTP surface
//!
//! Everything lives under `/api/v1`, plus `/health`. Successful responses use
//! the `{status: "success", data}` envelope; failures go through the
//! [`EcommerceError`](crate::EcommerceError) responder.

pub mod error;
pub mod extract;
mod cart;
mod orders;
mod products;
mod reviews;
mod users;

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::routing::get;
use axum::{middleware, Json, Router};
use serde::Serialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::publisher::EventPublisher;
use crate::services::Services;
use crate::store::Store;

pub(crate) const JWT_COOKIE: &str = "jwt";

#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, publisher: Arc<dyn EventPublisher>, config: Config) -> Self {
        let config = Arc::new(config);
        Self { services: Services::new(store, publisher, config.clone()), config }
    }
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .nest("/users", users::routes())
        .nest("/products", products::routes())
        .nest("/reviews", reviews::routes())
        .nest("/cart", cart::routes())
        .nest("/order", orders::routes());

    let app = Router::new()
        .route("/health", get(|| async { Json(json!({"status": "healthy", "service": "storefront"})) }))
        .nest("/api/v1", api);
    let app = if state.config.is_production() {
        app
    } else {
        app.layer(middleware::map_response(error::expose_error_detail))
    };

    app.layer(TraceLayer::new_for_http())
        .layer(cors(&state.config))
        .with_state(state)
}

fn cors(config: &Config) -> CorsLayer {
    match config.frontend_url.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_credentials(true)
            .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
        Err(_) => CorsLayer::permissive(),
    }
}

pub(crate) fn success<T: Serialize>(data: T) -> Json<Value> {
    Json(json!({ "status": "success", "data": data }))
}

pub(crate) fn success_list<T: Serialize>(key: &str, items: Vec<T>) -> Json<Value> {
    Json(json!({ "status": "success", "results": items.len(), "data": { key: items } }))
}
