// src/db/memory_store.rs

use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::{
    common::error::AppError,
    db::store::{CompletionOverrides, FulfillmentStore},
    models::fulfillment::TaskId,
    services::order_normalizer::order_id,
};

/// Store em memória: usado sem DATABASE_URL (demo/dev) e nos testes.
#[derive(Default)]
pub struct InMemoryFulfillmentStore {
    orders: RwLock<Vec<Value>>,
    overrides: RwLock<CompletionOverrides>,
}

impl InMemoryFulfillmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_orders(orders: Vec<Value>) -> Self {
        Self {
            orders: RwLock::new(orders),
            overrides: RwLock::new(HashMap::new()),
        }
    }

    /// Carrega um arquivo JSON com um array de pedidos brutos.
    pub async fn from_seed_file(path: &Path) -> anyhow::Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("falha ao ler {}", path.display()))?;
        let orders: Vec<Value> = serde_json::from_str(&raw)
            .with_context(|| format!("{} não contém um array JSON de pedidos", path.display()))?;

        tracing::info!("🌱 {} pedidos carregados de {}", orders.len(), path.display());
        Ok(Self::with_orders(orders))
    }
}

#[async_trait]
impl FulfillmentStore for InMemoryFulfillmentStore {
    async fn fetch_orders(&self) -> Result<Vec<Value>, AppError> {
        Ok(self.orders.read().await.clone())
    }

    async fn fetch_order(&self, wanted: &str) -> Result<Option<Value>, AppError> {
        let orders = self.orders.read().await;
        Ok(orders
            .iter()
            .find(|raw| order_id(raw).as_deref() == Some(wanted))
            .cloned())
    }

    async fn fetch_overrides(&self, order_ids: &[String]) -> Result<CompletionOverrides, AppError> {
        let wanted: HashSet<&str> = order_ids.iter().map(String::as_str).collect();
        let overrides = self.overrides.read().await;
        Ok(overrides
            .iter()
            .filter(|((order_id, _), _)| wanted.contains(order_id.as_str()))
            .map(|(key, completed)| (key.clone(), *completed))
            .collect())
    }

    async fn save_override(
        &self,
        order_id: &str,
        task_id: TaskId,
        completed: bool,
    ) -> Result<(), AppError> {
        self.overrides
            .write()
            .await
            .insert((order_id.to_string(), task_id), completed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn finds_orders_by_either_id_key() {
        let store = InMemoryFulfillmentStore::with_orders(vec![
            json!({ "_id": "a1" }),
            json!({ "id": 7 }),
        ]);

        assert!(store.fetch_order("a1").await.unwrap().is_some());
        assert!(store.fetch_order("7").await.unwrap().is_some());
        assert!(store.fetch_order("zz").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn blank_id_resolves_like_the_listing() {
        let store = InMemoryFulfillmentStore::with_orders(vec![json!({ "id": "", "_id": "abc" })]);

        assert!(store.fetch_order("abc").await.unwrap().is_some());
        assert!(store.fetch_order("").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn overrides_are_last_writer_wins_per_key() {
        let store = InMemoryFulfillmentStore::new();
        store.save_override("a1", TaskId::ShippingPrep, true).await.unwrap();
        store.save_override("a1", TaskId::ShippingPrep, false).await.unwrap();
        store.save_override("b2", TaskId::AdminApproval, true).await.unwrap();

        let only_a1 = store.fetch_overrides(&["a1".to_string()]).await.unwrap();
        assert_eq!(only_a1.len(), 1);
        assert_eq!(only_a1.get(&("a1".to_string(), TaskId::ShippingPrep)), Some(&false));
    }
}
