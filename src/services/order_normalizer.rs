// src/services/order_normalizer.rs

use std::collections::HashSet;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;

use crate::{
    common::error::AppError,
    models::fulfillment::{
        ApprovalStatus, ConfirmationStatus, CustomerInfo, DeliveryStatus, OrderSnapshot,
        PaymentStatus, SubOrder,
    },
};

const NOT_AVAILABLE: &str = "N/A";
const ORDER_NUMBER_PREFIX_LEN: usize = 8;

// Ordem de resolução dos dados do cliente: endereço de entrega, depois perfil.
const CUSTOMER_NAME_PATHS: &[&str] = &[
    "/shippingInfo/fullName",
    "/shippingInfo/name",
    "/customerProfile/name",
    "/user/name",
];
const CUSTOMER_EMAIL_PATHS: &[&str] = &[
    "/shippingInfo/email",
    "/customerProfile/email",
    "/user/email",
];
const CUSTOMER_PHONE_PATHS: &[&str] = &[
    "/shippingInfo/phone",
    "/customerProfile/phone",
    "/user/phone",
];

/// Converte um pedido bruto (JSON heterogêneo) em `OrderSnapshot`.
///
/// Só falha se o pedido não tiver identificador. Qualquer outro campo
/// ausente ou inválido cai no default documentado (com warning quando há perda).
/// `index` é a posição do registro no lote, usada só para reportar o erro.
pub fn normalize_order(raw: &Value, index: usize) -> Result<OrderSnapshot, AppError> {
    let id = order_id(raw).ok_or(AppError::MalformedOrder { index })?;

    let order_number = first_string(raw, &["/orderNumber"])
        .unwrap_or_else(|| id.chars().take(ORDER_NUMBER_PREFIX_LEN).collect::<String>().to_uppercase());

    let customer = CustomerInfo {
        name: first_string(raw, CUSTOMER_NAME_PATHS).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        email: first_string(raw, CUSTOMER_EMAIL_PATHS).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        phone: first_string(raw, CUSTOMER_PHONE_PATHS).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
    };

    let total_amount = parse_amount(&id, "totalAmount", raw.pointer("/totalAmount"));

    let payment_status: PaymentStatus = parse_status(&id, raw, &["/paymentStatus"]);
    let delivery_status: DeliveryStatus =
        parse_status(&id, raw, &["/deliveryStatus", "/orderStatus"]);
    let admin_approval: ApprovalStatus = parse_status(&id, raw, &["/adminApproval/status"]);
    let seller_confirmation: ConfirmationStatus =
        parse_status(&id, raw, &["/sellerConfirmation/status"]);

    let order_date = parse_order_date(&id, raw);

    let raw_sub_orders = raw
        .get("subOrders")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    // Só as pernas com vendedor entram, tanto nos sub-pedidos quanto na contagem de produtos
    let (kept_entries, sub_orders): (Vec<&Value>, Vec<SubOrder>) = raw_sub_orders
        .iter()
        .filter_map(|entry| normalize_sub_order(&id, entry).map(|sub| (entry, sub)))
        .unzip();

    let product_count = count_distinct_products(&kept_entries);

    Ok(OrderSnapshot {
        id,
        order_number,
        customer,
        total_amount,
        payment_status,
        delivery_status,
        admin_approval,
        seller_confirmation,
        order_date,
        sub_orders,
        product_count,
    })
}

/// Identificador do pedido bruto (`id`, depois `_id`; vazio conta como ausente).
///
/// O store usa a mesma regra para localizar um pedido pelo id que a listagem devolveu.
pub(crate) fn order_id(raw: &Value) -> Option<String> {
    first_string(raw, &["/id", "/_id"])
}

fn normalize_sub_order(order_id: &str, entry: &Value) -> Option<SubOrder> {
    let Some(seller_id) = first_string(entry, &["/sellerId", "/seller/_id", "/seller/id"]) else {
        tracing::warn!(order_id, "sub-pedido sem sellerId ignorado");
        return None;
    };

    let shop_name = first_string(entry, &["/shopName", "/seller/shopName"])
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());
    let delivery_status = parse_status(order_id, entry, &["/deliveryStatus", "/status"]);
    let amount_value = entry.pointer("/amount").or_else(|| entry.pointer("/subtotal"));
    let amount = parse_amount(order_id, "subOrders.amount", amount_value);

    Some(SubOrder {
        seller_id,
        shop_name,
        delivery_status,
        amount,
    })
}

// Itens distintos por productId; item sem id conta sozinho.
fn count_distinct_products(sub_orders: &[&Value]) -> usize {
    let mut seen = HashSet::new();
    let mut anonymous = 0;

    let items = sub_orders
        .iter()
        .filter_map(|s| s.get("products").and_then(Value::as_array))
        .flatten();

    for item in items {
        match first_string(item, &["/productId", "/product/_id", "/product", "/id"]) {
            Some(product_id) => {
                seen.insert(product_id);
            }
            None => anonymous += 1,
        }
    }

    seen.len() + anonymous
}

fn parse_status<T>(order_id: &str, raw: &Value, paths: &[&str]) -> T
where
    T: FromStr + Default,
{
    let Some(text) = first_string(raw, paths) else {
        return T::default();
    };

    text.parse().unwrap_or_else(|_| {
        tracing::warn!(order_id, field = paths[0], value = %text, "status desconhecido, usando default");
        T::default()
    })
}

fn parse_amount(order_id: &str, field: &str, value: Option<&Value>) -> Decimal {
    let parsed = match value {
        None | Some(Value::Null) => return Decimal::ZERO,
        Some(Value::Number(n)) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .ok(),
        Some(Value::String(s)) => Decimal::from_str(s.trim()).ok(),
        Some(_) => None,
    };

    match parsed {
        Some(amount) if amount >= Decimal::ZERO => amount,
        _ => {
            tracing::warn!(order_id, field, value = ?value, "valor inválido, usando 0");
            Decimal::ZERO
        }
    }
}

// Data desconhecida fica None: nunca "agora".
fn parse_order_date(order_id: &str, raw: &Value) -> Option<DateTime<Utc>> {
    let value = ["/orderDate", "/createdAt"]
        .iter()
        .find_map(|p| raw.pointer(p).filter(|v| !v.is_null()));

    let Some(value) = value else {
        tracing::warn!(order_id, "pedido sem orderDate; excluído das regras por idade");
        return None;
    };

    let parsed = match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .map(|dt| dt.with_timezone(&Utc))
            .ok(),
        Value::Number(n) => n.as_i64().and_then(DateTime::<Utc>::from_timestamp_millis),
        _ => None,
    };

    if parsed.is_none() {
        tracing::warn!(order_id, value = ?value, "orderDate ilegível; excluído das regras por idade");
    }
    parsed
}

// Primeiro valor não vazio dentre os caminhos (aceita string ou número).
fn first_string(raw: &Value, paths: &[&str]) -> Option<String> {
    paths.iter().find_map(|path| match raw.pointer(path)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}
