// src/services/tracker.rs

use chrono::{DateTime, Duration, FixedOffset, Months, TimeZone, Utc};

use crate::{
    db::CompletionOverrides,
    models::fulfillment::{
        AggregateStats, DateRange, OrderSnapshot, Priority, PurchaseFilter, StatusFilter, Task,
        TrackedPurchase,
    },
    services::{
        priority_classifier::classify_priority, seller_aggregator::aggregate_sellers,
        task_deriver::derive_tasks,
    },
};

/// Aplica as conclusões gravadas por cima das tarefas recém-derivadas.
pub fn apply_overrides(order_id: &str, tasks: &mut [Task], overrides: &CompletionOverrides) {
    for task in tasks.iter_mut() {
        if let Some(&completed) = overrides.get(&(order_id.to_string(), task.id)) {
            task.completed = completed;
        }
    }
}

/// Monta o `TrackedPurchase`: deriva do zero e só então aplica os overrides.
pub fn track_purchase(
    snapshot: OrderSnapshot,
    overrides: &CompletionOverrides,
    now: DateTime<Utc>,
) -> TrackedPurchase {
    let mut tasks = derive_tasks(&snapshot);
    apply_overrides(&snapshot.id, &mut tasks, overrides);

    let sellers = aggregate_sellers(&snapshot.sub_orders);
    let priority = classify_priority(&snapshot, now);

    TrackedPurchase {
        id: snapshot.id,
        order_number: snapshot.order_number,
        customer_name: snapshot.customer.name,
        customer_email: snapshot.customer.email,
        customer_phone: snapshot.customer.phone,
        total_amount: snapshot.total_amount,
        payment_status: snapshot.payment_status,
        delivery_status: snapshot.delivery_status,
        admin_approval_status: snapshot.admin_approval,
        seller_confirmation_status: snapshot.seller_confirmation,
        order_date: snapshot.order_date,
        product_count: snapshot.product_count,
        sellers,
        tasks,
        priority,
    }
}

pub fn has_pending_tasks(purchase: &TrackedPurchase) -> bool {
    purchase.tasks.iter().any(|t| !t.completed)
}

pub fn all_tasks_completed(purchase: &TrackedPurchase) -> bool {
    purchase.tasks.iter().all(|t| t.completed)
}

// Meia-noite de hoje no fuso do cliente, em UTC.
fn start_of_day(now: DateTime<Utc>, offset: FixedOffset) -> DateTime<Utc> {
    let local_midnight = now.with_timezone(&offset).date_naive().and_time(chrono::NaiveTime::MIN);
    offset
        .from_local_datetime(&local_midnight)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        // Offset fixo: o resultado é sempre `Single`
        .unwrap_or(now)
}

/// Limite inferior (inclusivo) do intervalo de datas; `None` = sem limite.
pub fn date_range_start(
    range: DateRange,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> Option<DateTime<Utc>> {
    let midnight = start_of_day(now, offset);
    match range {
        DateRange::All => None,
        DateRange::Today => Some(midnight),
        DateRange::Week => Some(midnight - Duration::days(7)),
        DateRange::Month => Some(
            midnight
                .checked_sub_months(Months::new(1))
                .unwrap_or(midnight - Duration::days(30)),
        ),
    }
}

fn is_today(purchase: &TrackedPurchase, now: DateTime<Utc>, offset: FixedOffset) -> bool {
    let midnight = start_of_day(now, offset);
    let tomorrow = midnight + Duration::days(1);
    purchase
        .order_date
        .is_some_and(|date| date >= midnight && date < tomorrow)
}

fn matches_status(purchase: &TrackedPurchase, status: StatusFilter) -> bool {
    match status {
        StatusFilter::All => true,
        StatusFilter::PendingTasks => has_pending_tasks(purchase),
        StatusFilter::CompletedTasks => all_tasks_completed(purchase),
        StatusFilter::Urgent => purchase.priority == Priority::High,
        StatusFilter::Delivery(delivery) => purchase.delivery_status == delivery,
    }
}

fn matches_search(purchase: &TrackedPurchase, needle: &str) -> bool {
    let contains = |haystack: &str| haystack.to_lowercase().contains(needle);

    contains(&purchase.order_number)
        || contains(&purchase.customer_name)
        || contains(&purchase.customer_email)
        || purchase.sellers.iter().any(|s| contains(&s.shop_name))
}

/// Os três eixos (status, data, busca) combinados com AND.
pub fn matches_filter(
    purchase: &TrackedPurchase,
    filter: &PurchaseFilter,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> bool {
    if !matches_status(purchase, filter.status) {
        return false;
    }

    // Data desconhecida só aparece em "all"
    if let Some(start) = date_range_start(filter.date_range, now, offset) {
        if !purchase.order_date.is_some_and(|date| date >= start) {
            return false;
        }
    }

    match filter.search.as_deref().map(str::trim) {
        Some(needle) if !needle.is_empty() => matches_search(purchase, &needle.to_lowercase()),
        _ => true,
    }
}

pub fn filter_purchases(
    purchases: Vec<TrackedPurchase>,
    filter: &PurchaseFilter,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> Vec<TrackedPurchase> {
    purchases
        .into_iter()
        .filter(|p| matches_filter(p, filter, now, offset))
        .collect()
}

/// Estatísticas recalculadas do zero sobre o conjunto já filtrado.
/// Contagens de pedidos, não de tarefas.
pub fn compute_stats(
    purchases: &[TrackedPurchase],
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> AggregateStats {
    purchases.iter().fold(AggregateStats::default(), |mut stats, p| {
        stats.total_purchases += 1;
        if has_pending_tasks(p) {
            stats.pending_tasks += 1;
        }
        if all_tasks_completed(p) {
            stats.completed_tasks += 1;
        }
        if p.priority == Priority::High {
            stats.urgent_tasks += 1;
        }
        if is_today(p, now, offset) {
            stats.today_purchases += 1;
        }
        stats
    })
}

/// Mais recentes primeiro; datas desconhecidas no fim, desempate por id.
pub fn sort_purchases(purchases: &mut [TrackedPurchase]) {
    purchases.sort_by(|a, b| match (a.order_date, b.order_date) {
        (Some(x), Some(y)) => y.cmp(&x).then_with(|| a.id.cmp(&b.id)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.id.cmp(&b.id),
    });
}

/// Página 1-based.
pub fn paginate(purchases: Vec<TrackedPurchase>, page: usize, limit: usize) -> Vec<TrackedPurchase> {
    let skip = page.saturating_sub(1).saturating_mul(limit);
    purchases.into_iter().skip(skip).take(limit).collect()
}
