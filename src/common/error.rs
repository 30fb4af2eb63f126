use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::common::i18n::I18nStore;
use crate::middleware::i18n::Locale;

// Erros de domínio do motor de fulfillment + infraestrutura.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Pedido sem identificador (registro #{index})")]
    MalformedOrder { index: usize },

    #[error("Pedido não encontrado: {0}")]
    UnknownOrder(String),

    #[error("Tarefa {task_id} não existe no pedido {order_id}")]
    UnknownTask { order_id: String, task_id: String },

    #[error("Filtro inválido: {field}={value}")]
    InvalidFilter { field: &'static str, value: String },

    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // Corpo ou query que nem chegou a ser desserializado
    #[error("Requisição malformada: {0}")]
    MalformedRequest(String),

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

impl AppError {
    /// O `kind` estável exposto no corpo de erro.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::MalformedOrder { .. } => "MalformedOrder",
            AppError::UnknownOrder(_) => "UnknownOrder",
            AppError::UnknownTask { .. } => "UnknownTask",
            AppError::InvalidFilter { .. } => "InvalidFilter",
            AppError::ValidationError(_) | AppError::MalformedRequest(_) => "ValidationError",
            AppError::DatabaseError(_) => "DatabaseError",
            AppError::InternalServerError(_) => "InternalServerError",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::UnknownOrder(_) | AppError::UnknownTask { .. } => StatusCode::NOT_FOUND,
            AppError::MalformedOrder { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::InvalidFilter { .. }
            | AppError::ValidationError(_)
            | AppError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Converte para o erro HTTP com a mensagem no idioma do cliente.
    pub fn to_api_error(&self, locale: &Locale, i18n: &I18nStore) -> ApiError {
        let args: Vec<(&str, String)> = match self {
            AppError::MalformedOrder { index } => vec![("index", index.to_string())],
            AppError::UnknownOrder(order_id) => vec![("order_id", order_id.clone())],
            AppError::UnknownTask { order_id, task_id } => vec![
                ("order_id", order_id.clone()),
                ("task_id", task_id.clone()),
            ],
            AppError::InvalidFilter { field, value } => {
                vec![("field", field.to_string()), ("value", value.clone())]
            }
            AppError::ValidationError(errors) => vec![("details", validation_details(errors))],
            AppError::MalformedRequest(details) => vec![("details", details.clone())],
            // O detalhe interno vai para o log, nunca para o cliente
            e @ (AppError::DatabaseError(_) | AppError::InternalServerError(_)) => {
                tracing::error!("🔥 Erro Interno do Servidor: {:?}", e);
                vec![]
            }
        };

        ApiError {
            status: self.status(),
            kind: self.kind(),
            message: i18n.translate(&locale.0, self.kind(), &args),
        }
    }
}

fn validation_details(errors: &validator::ValidationErrors) -> String {
    let mut fields: Vec<String> = errors
        .field_errors()
        .iter()
        .map(|(field, field_errors)| {
            let codes: Vec<String> = field_errors.iter().map(|e| e.code.to_string()).collect();
            format!("{} ({})", field, codes.join(", "))
        })
        .collect();
    fields.sort();
    fields.join("; ")
}

// O erro que efetivamente sai na resposta HTTP: {kind, message}
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub kind: &'static str,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "kind": self.kind,
            "message": self.message,
        }));
        (self.status, body).into_response()
    }
}

// Fallback sem locale (ex.: rejeições antes do handler): usa o texto do thiserror.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if matches!(self, AppError::DatabaseError(_) | AppError::InternalServerError(_)) {
            tracing::error!("🔥 Erro Interno do Servidor: {:?}", self);
        }
        ApiError {
            status: self.status(),
            kind: self.kind(),
            message: self.to_string(),
        }
        .into_response()
    }
}
