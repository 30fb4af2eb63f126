// src/docs.rs

use utoipa::OpenApi;
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Fulfillment ---
        handlers::fulfillment::list_purchases,
        handlers::fulfillment::get_stats,
        handlers::fulfillment::get_purchase,
        handlers::fulfillment::update_task_status,
    ),
    components(
        schemas(
            // --- Fulfillment ---
            models::fulfillment::PaymentStatus,
            models::fulfillment::DeliveryStatus,
            models::fulfillment::ApprovalStatus,
            models::fulfillment::ConfirmationStatus,
            models::fulfillment::TaskId,
            models::fulfillment::TaskType,
            models::fulfillment::Priority,
            models::fulfillment::Assignee,
            models::fulfillment::Task,
            models::fulfillment::SubOrder,
            models::fulfillment::SellerSummary,
            models::fulfillment::TrackedPurchase,
            models::fulfillment::AggregateStats,
            models::fulfillment::PurchaseListResponse,
            models::fulfillment::TaskListResponse,
            handlers::fulfillment::UpdateTaskStatusPayload,
        )
    ),
    tags(
        (name = "Fulfillment", description = "Tarefas de fulfillment, prioridade e estatísticas dos pedidos")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_fulfillment_paths() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();

        assert!(paths.iter().any(|p| p.as_str() == "/api/fulfillment/purchases"));
        assert!(paths.iter().any(|p| p.as_str() == "/api/fulfillment/tasks/status"));
    }
}
