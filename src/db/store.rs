// src/db/store.rs

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::{common::error::AppError, models::fulfillment::TaskId};

/// Conclusões gravadas, por (orderId, taskId).
pub type CompletionOverrides = HashMap<(String, TaskId), bool>;

/// Fonte dos pedidos brutos + armazenamento das conclusões explícitas.
///
/// A persistência é um colaborador externo; o motor só exige que as
/// conclusões possam ser lidas e gravadas por `(orderId, taskId)`.
#[async_trait]
pub trait FulfillmentStore: Send + Sync + 'static {
    /// Todos os pedidos brutos, na ordem do armazenamento.
    async fn fetch_orders(&self) -> Result<Vec<Value>, AppError>;

    async fn fetch_order(&self, order_id: &str) -> Result<Option<Value>, AppError>;

    /// Conclusões gravadas para os pedidos informados.
    async fn fetch_overrides(&self, order_ids: &[String]) -> Result<CompletionOverrides, AppError>;

    /// Grava (upsert) a conclusão de uma tarefa. Último a escrever vence.
    async fn save_override(
        &self,
        order_id: &str,
        task_id: TaskId,
        completed: bool,
    ) -> Result<(), AppError>;
}
