// src/middleware/clock.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use chrono::FixedOffset;

use crate::common::error::{ApiError, AppError};
use crate::config::AppState;
use crate::middleware::i18n::Locale;

// Minutos a leste de UTC, ex.: "-180" para America/Sao_Paulo
const UTC_OFFSET_HEADER: &str = "x-utc-offset";
const MAX_OFFSET_MINUTES: i32 = 14 * 60;

// Fuso do cliente: define onde cai a "meia-noite de hoje" nos filtros de data.
#[derive(Debug, Clone, Copy)]
pub struct ClientOffset(pub FixedOffset);

pub fn parse_offset_minutes(raw: &str) -> Option<FixedOffset> {
    let minutes: i32 = raw.trim().parse().ok()?;
    if minutes.abs() > MAX_OFFSET_MINUTES {
        return None;
    }
    FixedOffset::east_opt(minutes * 60)
}

impl<S> FromRequestParts<S> for ClientOffset
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let Some(value) = parts.headers.get(UTC_OFFSET_HEADER) else {
            // Sem cabeçalho: usa o fuso padrão da configuração
            return Ok(ClientOffset(app_state.settings.default_utc_offset));
        };

        let raw = String::from_utf8_lossy(value.as_bytes()).into_owned();
        if let Some(offset) = parse_offset_minutes(&raw) {
            return Ok(ClientOffset(offset));
        }

        let locale = match Locale::from_request_parts(parts, state).await {
            Ok(locale) => locale,
            Err(never) => match never {},
        };
        Err(AppError::InvalidFilter {
            field: UTC_OFFSET_HEADER,
            value: raw,
        }
        .to_api_error(&locale, &app_state.i18n_store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_negative_offsets() {
        let offset = parse_offset_minutes("-180").unwrap();
        assert_eq!(offset.local_minus_utc(), -3 * 3600);
    }

    #[test]
    fn rejects_out_of_range_or_garbage() {
        assert!(parse_offset_minutes("900").is_none());
        assert!(parse_offset_minutes("abc").is_none());
    }
}
