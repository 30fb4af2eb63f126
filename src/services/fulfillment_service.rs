// src/services/fulfillment_service.rs

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};

use crate::{
    common::error::AppError,
    db::FulfillmentStore,
    models::fulfillment::{
        AggregateStats, PurchaseFilter, PurchaseListResponse, Task, TaskId, TrackedPurchase,
    },
    services::{
        order_normalizer::normalize_order,
        task_deriver::derive_tasks,
        tracker::{self, apply_overrides, track_purchase},
    },
};

// Resultado da leitura completa: pedidos montados + registros descartados.
struct TrackedBatch {
    purchases: Vec<TrackedPurchase>,
    skipped: usize,
}

#[derive(Clone)]
pub struct FulfillmentService {
    store: Arc<dyn FulfillmentStore>,
}

impl FulfillmentService {
    pub fn new(store: Arc<dyn FulfillmentStore>) -> Self {
        Self { store }
    }

    // =========================================================================
    //  LEITURA (TRACKER)
    // =========================================================================

    async fn load_tracked(&self, now: DateTime<Utc>) -> Result<TrackedBatch, AppError> {
        let raw_orders = self.store.fetch_orders().await?;

        let mut snapshots = Vec::with_capacity(raw_orders.len());
        let mut skipped = 0;
        for (index, raw) in raw_orders.iter().enumerate() {
            match normalize_order(raw, index) {
                Ok(snapshot) => snapshots.push(snapshot),
                Err(e) => {
                    // Nunca some da contagem sem deixar rastro no log
                    tracing::warn!("⚠️ Pedido ignorado: {}", e);
                    skipped += 1;
                }
            }
        }

        let order_ids: Vec<String> = snapshots.iter().map(|s| s.id.clone()).collect();
        let overrides = self.store.fetch_overrides(&order_ids).await?;

        let mut purchases: Vec<TrackedPurchase> = snapshots
            .into_iter()
            .map(|snapshot| track_purchase(snapshot, &overrides, now))
            .collect();
        tracker::sort_purchases(&mut purchases);

        Ok(TrackedBatch { purchases, skipped })
    }

    /// Lista filtrada + estatísticas do conjunto filtrado (antes da paginação).
    pub async fn list_purchases(
        &self,
        filter: &PurchaseFilter,
        page: usize,
        limit: usize,
        now: DateTime<Utc>,
        offset: FixedOffset,
    ) -> Result<PurchaseListResponse, AppError> {
        let batch = self.load_tracked(now).await?;

        let filtered = tracker::filter_purchases(batch.purchases, filter, now, offset);
        let stats = tracker::compute_stats(&filtered, now, offset);
        let total = filtered.len();

        Ok(PurchaseListResponse {
            purchases: tracker::paginate(filtered, page, limit),
            stats,
            total,
            page,
            limit,
            skipped_records: batch.skipped,
        })
    }

    pub async fn get_stats(
        &self,
        filter: &PurchaseFilter,
        now: DateTime<Utc>,
        offset: FixedOffset,
    ) -> Result<AggregateStats, AppError> {
        let batch = self.load_tracked(now).await?;
        let filtered = tracker::filter_purchases(batch.purchases, filter, now, offset);
        Ok(tracker::compute_stats(&filtered, now, offset))
    }

    pub async fn get_purchase(
        &self,
        order_id: &str,
        now: DateTime<Utc>,
    ) -> Result<TrackedPurchase, AppError> {
        let raw = self
            .store
            .fetch_order(order_id)
            .await?
            .ok_or_else(|| AppError::UnknownOrder(order_id.to_string()))?;

        let snapshot = normalize_order(&raw, 0)?;
        let overrides = self.store.fetch_overrides(&[snapshot.id.clone()]).await?;

        Ok(track_purchase(snapshot, &overrides, now))
    }

    // =========================================================================
    //  ESCRITA (STATUS DE TAREFA)
    // =========================================================================

    /// Marca/desmarca uma tarefa do pedido. Idempotente: repetir a mesma
    /// transição devolve a mesma lista e não é erro.
    ///
    /// Só falha se o pedido não existe (`UnknownOrder`) ou se a tarefa não
    /// está na lista derivada atual do pedido (`UnknownTask`); nesses casos
    /// nada é gravado.
    pub async fn update_task_status(
        &self,
        order_id: &str,
        task_id: &str,
        completed: bool,
    ) -> Result<Vec<Task>, AppError> {
        let raw = self
            .store
            .fetch_order(order_id)
            .await?
            .ok_or_else(|| AppError::UnknownOrder(order_id.to_string()))?;

        let snapshot = normalize_order(&raw, 0)?;

        let unknown_task = || AppError::UnknownTask {
            order_id: order_id.to_string(),
            task_id: task_id.to_string(),
        };
        let task_id: TaskId = task_id.parse().map_err(|_| unknown_task())?;

        let mut tasks = derive_tasks(&snapshot);
        if !tasks.iter().any(|t| t.id == task_id) {
            return Err(unknown_task());
        }

        let mut overrides = self.store.fetch_overrides(&[snapshot.id.clone()]).await?;
        let previous = overrides.get(&(snapshot.id.clone(), task_id)).copied();

        self.store.save_override(&snapshot.id, task_id, completed).await?;
        overrides.insert((snapshot.id.clone(), task_id), completed);

        if previous == Some(completed) {
            tracing::debug!(order_id = %snapshot.id, %task_id, completed, "transição repetida (no-op)");
        } else {
            tracing::info!(order_id = %snapshot.id, %task_id, completed, "✅ Status de tarefa registrado");
        }

        apply_overrides(&snapshot.id, &mut tasks, &overrides);
        Ok(tasks)
    }
}
