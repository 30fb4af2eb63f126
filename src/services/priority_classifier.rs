// src/services/priority_classifier.rs

use chrono::{DateTime, Utc};

use crate::models::fulfillment::{
    ApprovalStatus, ConfirmationStatus, OrderSnapshot, PaymentStatus, Priority,
};

const HIGH_AGE_DAYS: i64 = 7;
const MEDIUM_AGE_DAYS: i64 = 3;

/// Idade do pedido em dias inteiros; `None` se a data é desconhecida.
pub fn age_in_days(snapshot: &OrderSnapshot, now: DateTime<Utc>) -> Option<i64> {
    snapshot.order_date.map(|date| (now - date).num_days())
}

/// Urgência do pedido como um todo. Primeira regra que casar vence:
///
/// 1. `high`: mais de 7 dias, pagamento falhou ou aprovação pendente;
/// 2. `medium`: mais de 3 dias, pagamento pendente ou confirmação pendente;
/// 3. `low`.
///
/// Pedido com data desconhecida não passa pelas regras de idade e nunca cai
/// abaixo de `medium`.
pub fn classify_priority(snapshot: &OrderSnapshot, now: DateTime<Utc>) -> Priority {
    let age = age_in_days(snapshot, now);

    let is_high = age.is_some_and(|days| days > HIGH_AGE_DAYS)
        || snapshot.payment_status == PaymentStatus::Failed
        || snapshot.admin_approval == ApprovalStatus::Pending;
    if is_high {
        return Priority::High;
    }

    let is_medium = age.is_none_or(|days| days > MEDIUM_AGE_DAYS)
        || snapshot.payment_status == PaymentStatus::Pending
        || snapshot.seller_confirmation == ConfirmationStatus::Pending;
    if is_medium {
        return Priority::Medium;
    }

    Priority::Low
}
