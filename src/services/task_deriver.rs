// src/services/task_deriver.rs

use chrono::{DateTime, Duration, Utc};

use crate::models::fulfillment::{
    ApprovalStatus, Assignee, ConfirmationStatus, DeliveryStatus, OrderSnapshot, PaymentStatus,
    Priority, Task, TaskId, TaskType,
};

// Uma linha da tabela de regras: quando a tarefa existe e como nasce.
struct TaskRule {
    id: TaskId,
    title: &'static str,
    description: &'static str,
    task_type: TaskType,
    priority: Priority,
    assigned_to: Assignee,
    due_in_hours: i64,
    applies: fn(&OrderSnapshot) -> bool,
    completed: fn(&OrderSnapshot) -> bool,
}

const TASK_RULES: &[TaskRule] = &[
    TaskRule {
        id: TaskId::PaymentVerification,
        title: "Verify Payment",
        description: "Confirm that the customer's payment has been received.",
        task_type: TaskType::Payment,
        priority: Priority::High,
        assigned_to: Assignee::Admin,
        due_in_hours: 24,
        applies: |s| s.payment_status == PaymentStatus::Pending,
        completed: |s| s.payment_status == PaymentStatus::Paid,
    },
    TaskRule {
        id: TaskId::AdminApproval,
        title: "Admin Approval",
        description: "Review and approve the order before fulfillment.",
        task_type: TaskType::Approval,
        priority: Priority::High,
        assigned_to: Assignee::Admin,
        due_in_hours: 12,
        applies: |s| s.admin_approval == ApprovalStatus::Pending,
        completed: |s| s.admin_approval == ApprovalStatus::Approved,
    },
    TaskRule {
        id: TaskId::SellerConfirmation,
        title: "Seller Confirmation",
        description: "Sellers must confirm stock availability for their items.",
        task_type: TaskType::Inventory,
        priority: Priority::Medium,
        assigned_to: Assignee::Seller,
        due_in_hours: 48,
        applies: |s| s.seller_confirmation == ConfirmationStatus::Pending,
        completed: |s| s.seller_confirmation == ConfirmationStatus::Confirmed,
    },
    TaskRule {
        id: TaskId::ShippingPrep,
        title: "Prepare Shipping",
        description: "Pack the items and hand the order over to the carrier.",
        task_type: TaskType::Shipping,
        priority: Priority::Medium,
        assigned_to: Assignee::Seller,
        due_in_hours: 72,
        applies: |s| {
            s.payment_status == PaymentStatus::Paid && s.admin_approval == ApprovalStatus::Approved
        },
        completed: |s| {
            matches!(
                s.delivery_status,
                DeliveryStatus::Processing | DeliveryStatus::Shipped | DeliveryStatus::Delivered
            )
        },
    },
    TaskRule {
        id: TaskId::CustomerCommunication,
        title: "Customer Communication",
        description: "Keep the customer informed about the order status.",
        task_type: TaskType::Communication,
        priority: Priority::Low,
        assigned_to: Assignee::Admin,
        due_in_hours: 12,
        applies: |_| true,
        completed: |s| s.delivery_status == DeliveryStatus::Delivered,
    },
];

/// Gera a checklist de tarefas do pedido a partir do snapshot.
///
/// Função pura: cada regra é avaliada de forma independente e entra no
/// máximo uma vez. `customer_communication` sempre entra, então a lista
/// nunca é vazia. Não depende do relógio: os prazos são relativos à data do
/// pedido, então `due_date` fica `None` quando essa data é desconhecida (ou
/// quando o prazo sairia do intervalo representável).
pub fn derive_tasks(snapshot: &OrderSnapshot) -> Vec<Task> {
    TASK_RULES
        .iter()
        .filter(|rule| (rule.applies)(snapshot))
        .map(|rule| Task {
            id: rule.id,
            title: rule.title.to_string(),
            description: rule.description.to_string(),
            task_type: rule.task_type,
            priority: rule.priority,
            completed: (rule.completed)(snapshot),
            assigned_to: rule.assigned_to,
            due_date: snapshot
                .order_date
                .and_then(|date| due_date(&snapshot.id, date, rule)),
        })
        .collect()
}

fn due_date(order_id: &str, order_date: DateTime<Utc>, rule: &TaskRule) -> Option<DateTime<Utc>> {
    let due = order_date.checked_add_signed(Duration::hours(rule.due_in_hours));
    if due.is_none() {
        tracing::warn!(order_id, task_id = %rule.id, "prazo fora do intervalo de datas; dueDate vazio");
    }
    due
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fulfillment::CustomerInfo;
    use chrono::TimeZone;
    use rust_decimal::Decimal;
    use std::collections::HashSet;

    fn snapshot() -> OrderSnapshot {
        OrderSnapshot {
            id: "o1".to_string(),
            order_number: "ORD-1".to_string(),
            customer: CustomerInfo {
                name: "N/A".to_string(),
                email: "N/A".to_string(),
                phone: "N/A".to_string(),
            },
            total_amount: Decimal::ZERO,
            payment_status: PaymentStatus::Pending,
            delivery_status: DeliveryStatus::Pending,
            admin_approval: ApprovalStatus::Pending,
            seller_confirmation: ConfirmationStatus::Pending,
            order_date: Some(Utc.with_ymd_and_hms(2026, 10, 1, 8, 0, 0).unwrap()),
            sub_orders: vec![],
            product_count: 0,
        }
    }

    fn ids(tasks: &[Task]) -> Vec<TaskId> {
        tasks.iter().map(|t| t.id).collect()
    }

    #[test]
    fn fresh_order_gets_all_gated_tasks() {
        let tasks = derive_tasks(&snapshot());
        assert_eq!(
            ids(&tasks),
            vec![
                TaskId::PaymentVerification,
                TaskId::AdminApproval,
                TaskId::SellerConfirmation,
                TaskId::CustomerCommunication,
            ]
        );
        assert!(tasks.iter().all(|t| !t.completed));
    }

    #[test]
    fn seller_confirmed_order_has_three_tasks() {
        let snap = OrderSnapshot {
            seller_confirmation: ConfirmationStatus::Confirmed,
            ..snapshot()
        };
        assert_eq!(
            ids(&derive_tasks(&snap)),
            vec![
                TaskId::PaymentVerification,
                TaskId::AdminApproval,
                TaskId::CustomerCommunication,
            ]
        );
    }

    #[test]
    fn shipping_prep_fires_for_paid_and_approved() {
        let snap = OrderSnapshot {
            payment_status: PaymentStatus::Paid,
            admin_approval: ApprovalStatus::Approved,
            delivery_status: DeliveryStatus::Processing,
            seller_confirmation: ConfirmationStatus::Confirmed,
            ..snapshot()
        };
        let tasks = derive_tasks(&snap);

        assert_eq!(ids(&tasks), vec![TaskId::ShippingPrep, TaskId::CustomerCommunication]);
        let shipping = &tasks[0];
        assert!(shipping.completed);
        assert_eq!(shipping.assigned_to, Assignee::Seller);
        assert_eq!(shipping.priority, Priority::Medium);
    }

    #[test]
    fn due_dates_follow_fixed_offsets() {
        let snap = snapshot();
        let created = snap.order_date.unwrap();
        let tasks = derive_tasks(&snap);

        let due = |id: TaskId| tasks.iter().find(|t| t.id == id).unwrap().due_date.unwrap();
        assert_eq!(due(TaskId::PaymentVerification), created + Duration::hours(24));
        assert_eq!(due(TaskId::AdminApproval), created + Duration::hours(12));
        assert_eq!(due(TaskId::SellerConfirmation), created + Duration::hours(48));
        assert_eq!(due(TaskId::CustomerCommunication), created + Duration::hours(12));
    }

    #[test]
    fn unknown_order_date_leaves_due_dates_empty() {
        let snap = OrderSnapshot {
            order_date: None,
            ..snapshot()
        };
        assert!(derive_tasks(&snap).iter().all(|t| t.due_date.is_none()));
    }

    #[test]
    fn order_date_near_the_end_of_time_does_not_overflow() {
        let edge_millis = DateTime::<Utc>::MAX_UTC.timestamp_millis() - 1000;
        let edge = DateTime::<Utc>::from_timestamp_millis(edge_millis);
        assert!(edge.is_some());
        let snap = OrderSnapshot {
            order_date: edge,
            ..snapshot()
        };

        let tasks = derive_tasks(&snap);
        assert!(!tasks.is_empty());
        assert!(tasks.iter().all(|t| t.due_date.is_none()));
    }

    #[test]
    fn communication_always_present_and_ids_unique() {
        let payments = [
            PaymentStatus::Pending,
            PaymentStatus::Paid,
            PaymentStatus::Failed,
            PaymentStatus::Refunded,
        ];
        let approvals = [
            ApprovalStatus::Pending,
            ApprovalStatus::Approved,
            ApprovalStatus::Rejected,
        ];
        let confirmations = [ConfirmationStatus::Pending, ConfirmationStatus::Confirmed];

        for &payment_status in &payments {
            for &admin_approval in &approvals {
                for &seller_confirmation in &confirmations {
                    let snap = OrderSnapshot {
                        payment_status,
                        admin_approval,
                        seller_confirmation,
                        ..snapshot()
                    };
                    let tasks = derive_tasks(&snap);
                    let unique: HashSet<TaskId> = tasks.iter().map(|t| t.id).collect();

                    assert_eq!(unique.len(), tasks.len());
                    assert!(unique.contains(&TaskId::CustomerCommunication));
                }
            }
        }
    }

    #[test]
    fn derivation_is_deterministic() {
        let snap = snapshot();
        assert_eq!(derive_tasks(&snap), derive_tasks(&snap));
    }
}
