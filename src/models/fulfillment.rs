// src/models/fulfillment.rs

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// --- Enums de estado do pedido ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationStatus {
    #[default]
    Pending,
    Confirmed,
}

/// Erro de parse dos enums de estado; o normalizador cai no default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant(pub String);

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "valor desconhecido: {}", self.0)
    }
}

// Gera FromStr (case-insensitive), Display e as_str para os enums de estado.
macro_rules! status_enum_str {
    ($ty:ty { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(UnknownVariant(s.to_string())),
                }
            }
        }
    };
}

status_enum_str!(PaymentStatus {
    Pending => "pending",
    Paid => "paid",
    Failed => "failed",
    Refunded => "refunded",
});

status_enum_str!(DeliveryStatus {
    Pending => "pending",
    Processing => "processing",
    Shipped => "shipped",
    Delivered => "delivered",
    Cancelled => "cancelled",
});

status_enum_str!(ApprovalStatus {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
});

status_enum_str!(ConfirmationStatus {
    Pending => "pending",
    Confirmed => "confirmed",
});

// --- Snapshot ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    #[schema(example = "Maria Silva")]
    pub name: String,
    #[schema(example = "maria@example.com")]
    pub email: String,
    #[schema(example = "N/A")]
    pub phone: String,
}

/// Uma "perna" do pedido atendida por um vendedor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubOrder {
    pub seller_id: String,
    pub shop_name: String,
    pub delivery_status: DeliveryStatus,
    #[schema(example = "49.90")]
    pub amount: Decimal,
}

/// Visão normalizada e imutável de um pedido bruto.
///
/// Todas as derivações (tarefas, prioridade, vendedores) são funções puras
/// deste snapshot. `order_date == None` significa data desconhecida.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSnapshot {
    pub id: String,
    pub order_number: String,
    pub customer: CustomerInfo,
    pub total_amount: Decimal,
    pub payment_status: PaymentStatus,
    pub delivery_status: DeliveryStatus,
    pub admin_approval: ApprovalStatus,
    pub seller_confirmation: ConfirmationStatus,
    pub order_date: Option<DateTime<Utc>>,
    pub sub_orders: Vec<SubOrder>,
    pub product_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SellerSummary {
    pub seller_id: String,
    #[schema(example = "Loja do João")]
    pub shop_name: String,
    pub delivery_status: DeliveryStatus,
    #[schema(example = "49.90")]
    pub amount: Decimal,
    // Todas as pernas do vendedor, na ordem em que apareceram
    pub legs: Vec<SubOrder>,
}

// --- Tarefas ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TaskId {
    PaymentVerification,
    AdminApproval,
    SellerConfirmation,
    ShippingPrep,
    CustomerCommunication,
}

status_enum_str!(TaskId {
    PaymentVerification => "payment_verification",
    AdminApproval => "admin_approval",
    SellerConfirmation => "seller_confirmation",
    ShippingPrep => "shipping_prep",
    CustomerCommunication => "customer_communication",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Payment,
    Approval,
    Inventory,
    Shipping,
    Communication,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Assignee {
    Admin,
    Seller,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    #[schema(example = "Verify Payment")]
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    pub priority: Priority,
    pub completed: bool,
    pub assigned_to: Assignee,
    pub due_date: Option<DateTime<Utc>>,
}

// --- Saída (read path) ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackedPurchase {
    #[schema(example = "64f1c2a9e4b0a1b2c3d4e5f6")]
    pub id: String,
    #[schema(example = "ORD-1024")]
    pub order_number: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    #[schema(example = "150.50")]
    pub total_amount: Decimal,
    pub payment_status: PaymentStatus,
    pub delivery_status: DeliveryStatus,
    pub admin_approval_status: ApprovalStatus,
    pub seller_confirmation_status: ConfirmationStatus,
    pub order_date: Option<DateTime<Utc>>,
    pub product_count: usize,
    pub sellers: Vec<SellerSummary>,
    pub tasks: Vec<Task>,
    pub priority: Priority,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStats {
    pub total_purchases: usize,
    pub pending_tasks: usize,
    pub completed_tasks: usize,
    pub urgent_tasks: usize,
    pub today_purchases: usize,
}

// --- Filtros ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    PendingTasks,
    CompletedTasks,
    Urgent,
    Delivery(DeliveryStatus),
}

impl FromStr for StatusFilter {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(Self::All),
            "pending_tasks" => Ok(Self::PendingTasks),
            "completed_tasks" => Ok(Self::CompletedTasks),
            "urgent" => Ok(Self::Urgent),
            other => other
                .parse::<DeliveryStatus>()
                .map(Self::Delivery)
                .map_err(|_| UnknownVariant(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateRange {
    #[default]
    All,
    Today,
    Week,
    Month,
}

status_enum_str!(DateRange {
    All => "all",
    Today => "today",
    Week => "week",
    Month => "month",
});

/// Os três eixos do filtro, combinados com AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurchaseFilter {
    pub status: StatusFilter,
    pub date_range: DateRange,
    pub search: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseListResponse {
    pub purchases: Vec<TrackedPurchase>,
    pub stats: AggregateStats,
    #[schema(example = 42)]
    pub total: usize,
    #[schema(example = 1)]
    pub page: usize,
    #[schema(example = 50)]
    pub limit: usize,
    // Registros sem id que foram ignorados (e logados)
    pub skipped_records: usize,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskListResponse {
    pub tasks: Vec<Task>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_filter_accepts_delivery_values() {
        assert_eq!("urgent".parse::<StatusFilter>(), Ok(StatusFilter::Urgent));
        assert_eq!("".parse::<StatusFilter>(), Ok(StatusFilter::All));
        assert_eq!(
            "Shipped".parse::<StatusFilter>(),
            Ok(StatusFilter::Delivery(DeliveryStatus::Shipped))
        );
        assert!("archived".parse::<StatusFilter>().is_err());
    }

    #[test]
    fn task_serializes_with_stable_field_names() {
        let task = Task {
            id: TaskId::ShippingPrep,
            title: "Prepare Shipping".to_string(),
            description: "d".to_string(),
            task_type: TaskType::Shipping,
            priority: Priority::Medium,
            completed: true,
            assigned_to: Assignee::Seller,
            due_date: None,
        };

        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["id"], "shipping_prep");
        assert_eq!(json["type"], "shipping");
        assert_eq!(json["assignedTo"], "seller");
        assert_eq!(json["dueDate"], serde_json::Value::Null);
    }

    #[test]
    fn priority_orders_low_to_high() {
        assert!(Priority::High > Priority::Medium);
        assert!(Priority::Medium > Priority::Low);
    }
}
