// src/db/fulfillment_repo.rs

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{types::Json, FromRow, PgPool};

use crate::{
    common::error::AppError,
    db::store::{CompletionOverrides, FulfillmentStore},
    models::fulfillment::TaskId,
};

#[derive(Debug, FromRow)]
struct OrderRow {
    payload: Json<Value>,
}

#[derive(Debug, FromRow)]
struct OverrideRow {
    order_id: String,
    task_id: String,
    completed: bool,
}

#[derive(Clone)]
pub struct FulfillmentRepository {
    pool: PgPool,
}

impl FulfillmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FulfillmentStore for FulfillmentRepository {
    async fn fetch_orders(&self) -> Result<Vec<Value>, AppError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT payload
            FROM marketplace_orders
            ORDER BY created_at DESC, id
            "#,
        )
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|row| row.payload.0).collect())
    }

    async fn fetch_order(&self, order_id: &str) -> Result<Option<Value>, AppError> {
        // Mesma regra do normalizador: `id`, depois `_id`, vazio conta como ausente
        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT payload
            FROM marketplace_orders
            WHERE COALESCE(
                NULLIF(BTRIM(payload->>'id'), ''),
                NULLIF(BTRIM(payload->>'_id'), '')
            ) = $1
            LIMIT 1
            "#,
        )
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.payload.0))
    }

    async fn fetch_overrides(&self, order_ids: &[String]) -> Result<CompletionOverrides, AppError> {
        if order_ids.is_empty() {
            return Ok(CompletionOverrides::new());
        }

        let rows = sqlx::query_as::<_, OverrideRow>(
            r#"
            SELECT order_id, task_id, completed
            FROM task_completion_overrides
            WHERE order_id = ANY($1)
            "#,
        )
            .bind(order_ids)
            .fetch_all(&self.pool)
            .await?;

        let mut overrides = CompletionOverrides::with_capacity(rows.len());
        for row in rows {
            // Linha com task_id fora da taxonomia (ex.: versão antiga) é ignorada
            match row.task_id.parse::<TaskId>() {
                Ok(task_id) => {
                    overrides.insert((row.order_id, task_id), row.completed);
                }
                Err(_) => {
                    tracing::warn!(order_id = %row.order_id, task_id = %row.task_id, "override com tarefa desconhecida ignorado");
                }
            }
        }

        Ok(overrides)
    }

    async fn save_override(
        &self,
        order_id: &str,
        task_id: TaskId,
        completed: bool,
    ) -> Result<(), AppError> {
        // Upsert: a escrita por registro já serializa atualizações concorrentes
        sqlx::query(
            r#"
            INSERT INTO task_completion_overrides (order_id, task_id, completed, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (order_id, task_id)
            DO UPDATE SET completed = EXCLUDED.completed, updated_at = NOW()
            "#,
        )
            .bind(order_id)
            .bind(task_id.as_str())
            .bind(completed)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
