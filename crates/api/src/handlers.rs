use axum::{
    extract::{DefaultBodyLimit, Multipart, Query, State},
    http::header,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use extract::ChatModel;
use ingest::TableExtractor;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::pipeline::Pipeline;
use crate::upload;

const INDEX_HTML: &str = include_str!("../templates/index.html");

#[derive(Debug, Default, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Json,
    Text,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExtractParams {
    #[serde(default)]
    pub format: ReportFormat,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    model: String,
}

pub fn router<M, T>(pipeline: Arc<Pipeline<M, T>>, max_upload_bytes: usize) -> Router
where
    M: ChatModel + Send + Sync + 'static,
    T: TableExtractor + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check::<M, T>))
        .route("/extract", post(extract_pdf::<M, T>))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(pipeline)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health_check<M, T>(State(pipeline): State<Arc<Pipeline<M, T>>>) -> Json<HealthResponse>
where
    M: ChatModel + Send + Sync + 'static,
    T: TableExtractor + Send + Sync + 'static,
{
    Json(HealthResponse {
        status: "ok",
        model: pipeline.model_name().to_string(),
    })
}

async fn extract_pdf<M, T>(
    State(pipeline): State<Arc<Pipeline<M, T>>>,
    Query(params): Query<ExtractParams>,
    multipart: Multipart,
) -> Result<Response, AppError>
where
    M: ChatModel + Send + Sync + 'static,
    T: TableExtractor + Send + Sync + 'static,
{
    let upload = upload::parse_multipart(multipart).await?;
    let report = pipeline.run(&upload.filename, upload.data).await?;

    let response = match params.format {
        ReportFormat::Json => Json(report).into_response(),
        ReportFormat::Text => (
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            report.to_string(),
        )
            .into_response(),
    };
    Ok(response)
}
