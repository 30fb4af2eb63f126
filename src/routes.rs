// src/routes.rs

use axum::{
    routing::{get, post},
    Json, Router,
};
use utoipa::OpenApi;

use crate::{config::AppState, docs::ApiDoc, handlers};

pub fn app_router(app_state: AppState) -> Router {
    let fulfillment_routes = Router::new()
        .route("/purchases", get(handlers::fulfillment::list_purchases))
        .route("/purchases/{order_id}", get(handlers::fulfillment::get_purchase))
        .route("/stats", get(handlers::fulfillment::get_stats))
        .route("/tasks/status", post(handlers::fulfillment::update_task_status));

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .nest("/api/fulfillment", fulfillment_routes)
        .with_state(app_state)
}
