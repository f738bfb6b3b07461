pub mod error;
pub mod flatten;
pub mod intake;
pub mod table;

pub use error::{IngestError, Result};
pub use flatten::{normalize_whitespace, table_to_text};
pub use intake::PendingDocument;
pub use table::{first_table, Glyph, LayoutTableExtractor, Table, TableDetectorConfig, TableExtractor};

/// Normalized table text pulled from one uploaded PDF.
#[derive(Debug, Clone)]
pub struct IngestedDocument {
    pub fingerprint: String,
    pub table: Table,
    pub tables_found: usize,
    pub text: String,
}

/// Stage the upload, pick its first table and flatten it to one line of text.
///
/// The staged file lives only for the duration of this call.
pub fn ingest_pdf<E: TableExtractor>(bytes: &[u8], extractor: &E) -> Result<IngestedDocument> {
    let pending = PendingDocument::write(bytes)?;
    tracing::debug!(
        fingerprint = pending.fingerprint(),
        bytes = pending.size(),
        path = %pending.path().display(),
        "Staged uploaded PDF"
    );

    let tables = extractor.extract_tables(pending.path())?;
    let tables_found = tables.len();
    let table = first_table(tables)?;
    let text = table_to_text(&table);

    tracing::info!(
        fingerprint = pending.fingerprint(),
        tables = tables_found,
        rows = table.row_count(),
        columns = table.column_count(),
        text_len = text.chars().count(),
        "Extracted table text"
    );

    Ok(IngestedDocument {
        fingerprint: pending.fingerprint().to_string(),
        table,
        tables_found,
        text,
    })
}
