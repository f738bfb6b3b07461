use extract::{change_key, ChatModel, DisplayLabelMap, Extractor};
use ingest::TableExtractor;
use std::sync::Arc;
use tracing::Instrument;

use crate::error::AppError;
use crate::report::ExtractionReport;

/// intake -> table text -> extraction -> relabel, all or nothing per upload.
pub struct Pipeline<M, T> {
    extractor: Extractor<M>,
    tables: T,
    labels: DisplayLabelMap,
}

impl<M, T> Pipeline<M, T>
where
    M: ChatModel + Send + Sync + 'static,
    T: TableExtractor + Send + Sync + 'static,
{
    pub fn new(extractor: Extractor<M>, tables: T, labels: DisplayLabelMap) -> Self {
        Self {
            extractor,
            tables,
            labels,
        }
    }

    pub fn model_name(&self) -> &str {
        self.extractor.model_name()
    }

    pub async fn run(self: &Arc<Self>, filename: &str, bytes: Vec<u8>) -> Result<ExtractionReport, AppError> {
        let request_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!(
            "extract_request",
            %request_id,
            filename,
            bytes = bytes.len(),
            fingerprint = tracing::field::Empty,
        );

        async move {
            let pipeline = Arc::clone(self);
            let document = tokio::task::spawn_blocking(move || ingest::ingest_pdf(&bytes, &pipeline.tables))
                .await
                .map_err(|e| AppError::Internal(format!("table extraction task failed: {e}")))??;
            tracing::Span::current().record("fingerprint", document.fingerprint.as_str());

            let extraction = self.extractor.extract(&document.text).await?;
            let output = change_key(&extraction.record, &self.labels);

            tracing::info!(
                fields = output.len(),
                cost_usd = extraction.usage.total_cost_usd,
                "Extraction complete"
            );

            Ok::<_, AppError>(ExtractionReport {
                input: document.text,
                output,
                cost: extraction.usage,
            })
        }
        .instrument(span)
        .await
    }
}
