// src/handlers/fulfillment.rs

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{clock::ClientOffset, i18n::Locale},
    models::fulfillment::{
        AggregateStats, DateRange, PurchaseFilter, PurchaseListResponse, StatusFilter,
        TaskListResponse, TrackedPurchase,
    },
};

const DEFAULT_PAGE: usize = 1;
const DEFAULT_LIMIT: usize = 50;

// =============================================================================
//  1. LEITURA (PEDIDOS ACOMPANHADOS + ESTATÍSTICAS)
// =============================================================================

#[derive(Debug, Default, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PurchaseQuery {
    /// all | pending_tasks | completed_tasks | urgent | <deliveryStatus>
    #[param(example = "pending_tasks")]
    pub status: Option<String>,

    /// all | today | week | month
    #[param(example = "week")]
    pub date_range: Option<String>,

    #[validate(length(max = 200, message = "too_long"))]
    #[param(example = "maria")]
    pub search: Option<String>,

    #[validate(range(min = 1, message = "min_1"))]
    pub page: Option<usize>,

    #[validate(range(min = 1, max = 500, message = "out_of_range"))]
    pub limit: Option<usize>,
}

impl PurchaseQuery {
    pub fn to_filter(&self) -> Result<PurchaseFilter, AppError> {
        let status = match self.status.as_deref() {
            Some(raw) => raw.parse::<StatusFilter>().map_err(|_| AppError::InvalidFilter {
                field: "status",
                value: raw.to_string(),
            })?,
            None => StatusFilter::All,
        };

        let date_range = match self.date_range.as_deref() {
            Some(raw) if !raw.trim().is_empty() => {
                raw.parse::<DateRange>().map_err(|_| AppError::InvalidFilter {
                    field: "dateRange",
                    value: raw.to_string(),
                })?
            }
            _ => DateRange::All,
        };

        Ok(PurchaseFilter {
            status,
            date_range,
            search: self.search.clone(),
        })
    }
}

// GET /api/fulfillment/purchases
#[utoipa::path(
    get,
    path = "/api/fulfillment/purchases",
    tag = "Fulfillment",
    params(
        PurchaseQuery,
        ("x-utc-offset" = Option<i32>, Header, description = "Fuso do cliente em minutos (ex.: -180)")
    ),
    responses(
        (status = 200, description = "Pedidos com tarefas, prioridade e estatísticas do filtro", body = PurchaseListResponse),
        (status = 400, description = "Filtro ou query inválidos")
    )
)]
pub async fn list_purchases(
    State(app_state): State<AppState>,
    locale: Locale,
    ClientOffset(offset): ClientOffset,
    query: Result<Query<PurchaseQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {

    // Query ilegível (ex.: page=abc) sai no mesmo formato {kind, message}
    let Query(query) = query.map_err(|rejection| {
        AppError::MalformedRequest(rejection.body_text()).to_api_error(&locale, &app_state.i18n_store)
    })?;

    query.validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let filter = query.to_filter()
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let page = query.page.unwrap_or(DEFAULT_PAGE);
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);

    let response = app_state.fulfillment_service
        .list_purchases(&filter, page, limit, Utc::now(), offset)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(response)))
}

// GET /api/fulfillment/stats
#[utoipa::path(
    get,
    path = "/api/fulfillment/stats",
    tag = "Fulfillment",
    params(
        PurchaseQuery,
        ("x-utc-offset" = Option<i32>, Header, description = "Fuso do cliente em minutos")
    ),
    responses(
        (status = 200, description = "Cards do dashboard", body = AggregateStats)
    )
)]
pub async fn get_stats(
    State(app_state): State<AppState>,
    locale: Locale,
    ClientOffset(offset): ClientOffset,
    query: Result<Query<PurchaseQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {

    // Query ilegível (ex.: page=abc) sai no mesmo formato {kind, message}
    let Query(query) = query.map_err(|rejection| {
        AppError::MalformedRequest(rejection.body_text()).to_api_error(&locale, &app_state.i18n_store)
    })?;

    query.validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let filter = query.to_filter()
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let stats = app_state.fulfillment_service
        .get_stats(&filter, Utc::now(), offset)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(stats)))
}

// GET /api/fulfillment/purchases/{order_id}
#[utoipa::path(
    get,
    path = "/api/fulfillment/purchases/{order_id}",
    tag = "Fulfillment",
    params(
        ("order_id" = String, Path, description = "ID do pedido")
    ),
    responses(
        (status = 200, description = "Pedido acompanhado", body = TrackedPurchase),
        (status = 404, description = "Pedido não encontrado")
    )
)]
pub async fn get_purchase(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(order_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {

    let purchase = app_state.fulfillment_service
        .get_purchase(&order_id, Utc::now())
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(purchase)))
}

// =============================================================================
//  2. ESCRITA (CONCLUSÃO DE TAREFA)
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskStatusPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "64f1c2a9e4b0a1b2c3d4e5f6")]
    pub order_id: String,

    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "shipping_prep")]
    pub task_id: String,

    #[schema(example = true)]
    pub completed: bool,
}

// POST /api/fulfillment/tasks/status
#[utoipa::path(
    post,
    path = "/api/fulfillment/tasks/status",
    tag = "Fulfillment",
    request_body = UpdateTaskStatusPayload,
    responses(
        (status = 200, description = "Lista de tarefas atualizada", body = TaskListResponse),
        (status = 400, description = "Corpo inválido"),
        (status = 404, description = "Pedido ou tarefa inexistente")
    )
)]
pub async fn update_task_status(
    State(app_state): State<AppState>,
    locale: Locale,
    payload: Result<Json<UpdateTaskStatusPayload>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {

    let Json(payload) = payload.map_err(|rejection| {
        AppError::MalformedRequest(rejection.body_text()).to_api_error(&locale, &app_state.i18n_store)
    })?;

    payload.validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let tasks = app_state.fulfillment_service
        .update_task_status(&payload.order_id, &payload.task_id, payload.completed)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(TaskListResponse { tasks })))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
        Router,
    };
    use chrono::Duration;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::{config::AppState, db::InMemoryFulfillmentStore, routes::app_router};

    fn app(orders: Vec<Value>) -> Router {
        let store = Arc::new(InMemoryFulfillmentStore::with_orders(orders));
        app_router(AppState::for_store(store).unwrap())
    }

    fn sample_orders() -> Vec<Value> {
        let now = chrono::Utc::now();
        vec![
            json!({
                "_id": "o1",
                "orderNumber": "ORD-1001",
                "shippingInfo": { "fullName": "Maria Silva", "email": "maria@example.com" },
                "totalAmount": 120.5,
                "paymentStatus": "paid",
                "deliveryStatus": "processing",
                "adminApproval": { "status": "approved" },
                "sellerConfirmation": { "status": "confirmed" },
                "orderDate": now.to_rfc3339(),
                "subOrders": [{ "sellerId": "S1", "shopName": "Casa das Velas", "amount": 120.5 }]
            }),
            json!({
                "_id": "o2",
                "paymentStatus": "pending",
                "adminApproval": { "status": "pending" },
                "orderDate": (now - Duration::days(10)).to_rfc3339()
            }),
        ]
    }

    async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_status(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/fulfillment/tasks/status")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn list_exposes_stable_field_names() {
        let (status, json) = send(app(sample_orders()), get("/api/fulfillment/purchases")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["total"], 2);
        assert_eq!(json["stats"]["totalPurchases"], 2);
        assert_eq!(json["stats"]["urgentTasks"], 1);

        let first = &json["purchases"][0];
        for field in [
            "id", "orderNumber", "customerName", "customerEmail", "customerPhone",
            "totalAmount", "paymentStatus", "deliveryStatus", "orderDate", "sellers",
            "tasks", "priority",
        ] {
            assert!(first.get(field).is_some(), "campo ausente: {}", field);
        }
        assert_eq!(first["customerName"], "Maria Silva");
        assert_eq!(first["customerPhone"], "N/A");
    }

    #[tokio::test]
    async fn urgent_and_today_combine_with_and() {
        let (_, urgent) = send(
            app(sample_orders()),
            get("/api/fulfillment/purchases?status=urgent"),
        )
        .await;
        assert_eq!(urgent["total"], 1);

        let (_, both) = send(
            app(sample_orders()),
            get("/api/fulfillment/purchases?status=urgent&dateRange=today"),
        )
        .await;
        assert_eq!(both["total"], 0);
    }

    #[tokio::test]
    async fn search_matches_shop_name() {
        let (_, json) = send(
            app(sample_orders()),
            get("/api/fulfillment/purchases?search=VELAS"),
        )
        .await;
        assert_eq!(json["total"], 1);
        assert_eq!(json["purchases"][0]["id"], "o1");
    }

    #[tokio::test]
    async fn invalid_filter_is_bad_request() {
        let (status, json) = send(
            app(sample_orders()),
            get("/api/fulfillment/purchases?status=archived"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["kind"], "InvalidFilter");
    }

    #[tokio::test]
    async fn stats_endpoint_uses_same_filter() {
        let (status, json) = send(
            app(sample_orders()),
            get("/api/fulfillment/stats?status=pending_tasks"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["totalPurchases"], 2);
        assert_eq!(json["pendingTasks"], 2);
        assert_eq!(json["completedTasks"], 0);
    }

    #[tokio::test]
    async fn task_update_round_trip_is_idempotent() {
        let app = app(sample_orders());
        let body = json!({ "orderId": "o1", "taskId": "customer_communication", "completed": true });

        let (status, first) = send(app.clone(), post_status(body.clone())).await;
        assert_eq!(status, StatusCode::OK);
        let (status, second) = send(app.clone(), post_status(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first, second);

        let (_, done) = send(app, get("/api/fulfillment/purchases?status=completed_tasks")).await;
        assert_eq!(done["total"], 1);
        assert_eq!(done["purchases"][0]["id"], "o1");
    }

    #[tokio::test]
    async fn unknown_task_is_localized_not_found() {
        let req = Request::builder()
            .method("POST")
            .uri("/api/fulfillment/tasks/status")
            .header("content-type", "application/json")
            .header("accept-language", "pt-BR,pt;q=0.9")
            .body(Body::from(
                json!({ "orderId": "o1", "taskId": "payment_verification", "completed": true })
                    .to_string(),
            ))
            .unwrap();

        let (status, json) = send(app(sample_orders()), req).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["kind"], "UnknownTask");
        assert!(json["message"].as_str().unwrap().contains("não existe"));
    }

    #[tokio::test]
    async fn unknown_order_is_not_found() {
        let (status, json) = send(app(sample_orders()), get("/api/fulfillment/purchases/zzz")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["kind"], "UnknownOrder");
    }

    #[tokio::test]
    async fn empty_task_id_fails_validation() {
        let (status, json) = send(
            app(sample_orders()),
            post_status(json!({ "orderId": "o1", "taskId": "", "completed": true })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["kind"], "ValidationError");
    }

    #[tokio::test]
    async fn bad_offset_header_is_rejected_in_the_caller_language() {
        let req = Request::builder()
            .uri("/api/fulfillment/purchases")
            .header("x-utc-offset", "lunch")
            .header("accept-language", "pt-BR")
            .body(Body::empty())
            .unwrap();

        let (status, json) = send(app(sample_orders()), req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["kind"], "InvalidFilter");
        let message = json["message"].as_str().unwrap();
        assert!(message.contains("x-utc-offset"));
        assert!(message.contains("inválido"));
    }

    #[tokio::test]
    async fn body_missing_completed_gets_error_object() {
        let (status, json) = send(
            app(sample_orders()),
            post_status(json!({ "orderId": "o1", "taskId": "admin_approval" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["kind"], "ValidationError");
        assert!(json["message"].as_str().unwrap().contains("completed"));
    }

    #[tokio::test]
    async fn non_boolean_completed_gets_error_object() {
        let (status, json) = send(
            app(sample_orders()),
            post_status(json!({ "orderId": "o1", "taskId": "admin_approval", "completed": "yes" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["kind"], "ValidationError");
    }

    #[tokio::test]
    async fn unparsable_page_gets_error_object() {
        let (status, json) = send(
            app(sample_orders()),
            get("/api/fulfillment/purchases?page=abc"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["kind"], "ValidationError");
    }
}
