use anyhow::{Context, Result};
use extract::{estate_schema, DisplayLabelMap, Extractor, GenerationSettings, OpenAiClient};
use ingest::{LayoutTableExtractor, TableDetectorConfig};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod handlers;
mod pipeline;
mod report;
mod upload;

use config::{AppConfig, LogFormat};
use pipeline::Pipeline;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    init_tracing(config.log_format);
    tracing::debug!(?config, "Loaded configuration");

    let client = OpenAiClient::new(
        config.llm.base_url.clone(),
        config.llm.model.clone(),
        config.llm.api_key.clone(),
        Duration::from_secs(config.llm.request_timeout_secs),
    )
    .context("Failed to build LLM client")?;

    if config.llm.api_key.is_empty() {
        tracing::warn!("OPENAI_API_KEY is not set; extraction calls will fail authentication");
    }

    let extractor = Extractor::new(
        client,
        Arc::new(estate_schema()),
        GenerationSettings {
            temperature: config.llm.temperature,
            max_tokens: config.llm.max_tokens,
        },
    );

    let tables = LayoutTableExtractor::new(TableDetectorConfig {
        min_rows: config.tables.min_rows,
        min_columns: config.tables.min_columns,
        column_gap: config.tables.column_gap,
    });

    let pipeline = Arc::new(Pipeline::new(extractor, tables, DisplayLabelMap::estate()));
    let app = handlers::router(pipeline, config.max_upload_bytes());

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind_addr))?;

    tracing::info!(
        addr = %config.server.bind_addr,
        model = %config.llm.model,
        "Server listening"
    );

    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}
