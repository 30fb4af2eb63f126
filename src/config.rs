// src/config.rs

use std::{env, path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use chrono::{FixedOffset, Offset, Utc};
use sqlx::postgres::PgPoolOptions;

use crate::{
    common::i18n::I18nStore,
    db::{FulfillmentRepository, FulfillmentStore, InMemoryFulfillmentStore},
    middleware::clock::parse_offset_minutes,
    services::fulfillment_service::FulfillmentService,
};

const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

// Configuração lida do ambiente (.env)
#[derive(Debug, Clone)]
pub struct Settings {
    pub server_addr: String,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub seed_orders_path: Option<PathBuf>,
    pub default_utc_offset: FixedOffset,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_addr: DEFAULT_SERVER_ADDR.to_string(),
            database_url: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            seed_orders_path: None,
            default_utc_offset: Utc.fix(),
        }
    }
}

fn optional_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Settings::default();

        let max_connections = match optional_var("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("DATABASE_MAX_CONNECTIONS inválido: {}", raw))?,
            None => defaults.max_connections,
        };

        let default_utc_offset = match optional_var("DEFAULT_UTC_OFFSET_MINUTES") {
            Some(raw) => parse_offset_minutes(&raw)
                .with_context(|| format!("DEFAULT_UTC_OFFSET_MINUTES inválido: {}", raw))?,
            None => defaults.default_utc_offset,
        };

        Ok(Self {
            server_addr: optional_var("SERVER_ADDR").unwrap_or(defaults.server_addr),
            database_url: optional_var("DATABASE_URL"),
            max_connections,
            seed_orders_path: optional_var("SEED_ORDERS_PATH").map(PathBuf::from),
            default_utc_offset,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub i18n_store: Arc<I18nStore>,
    pub fulfillment_service: FulfillmentService,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let settings = Settings::from_env()?;

        let store: Arc<dyn FulfillmentStore> = match &settings.database_url {
            Some(database_url) => {
                let db_pool = PgPoolOptions::new()
                    .max_connections(settings.max_connections)
                    .acquire_timeout(Duration::from_secs(3))
                    .connect(database_url)
                    .await
                    .context("falha ao conectar ao banco de dados")?;

                tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

                sqlx::migrate!()
                    .run(&db_pool)
                    .await
                    .context("falha ao rodar as migrações do banco de dados")?;

                tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");
                Arc::new(FulfillmentRepository::new(db_pool))
            }
            None => {
                tracing::warn!("DATABASE_URL não definida; usando store em memória");
                match &settings.seed_orders_path {
                    Some(path) => Arc::new(InMemoryFulfillmentStore::from_seed_file(path).await?),
                    None => Arc::new(InMemoryFulfillmentStore::new()),
                }
            }
        };

        Self::build(settings, store)
    }

    /// Estado com um store já pronto e configuração padrão.
    #[cfg(test)]
    pub fn for_store(store: Arc<dyn FulfillmentStore>) -> anyhow::Result<Self> {
        Self::build(Settings::default(), store)
    }

    fn build(settings: Settings, store: Arc<dyn FulfillmentStore>) -> anyhow::Result<Self> {
        Ok(Self {
            settings: Arc::new(settings),
            i18n_store: Arc::new(I18nStore::load()?),
            fulfillment_service: FulfillmentService::new(store),
        })
    }
}
