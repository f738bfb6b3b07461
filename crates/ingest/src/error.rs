use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to stage uploaded document: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to read PDF text layer: {0}")]
    Pdf(String),

    #[error("no table found in document")]
    NoTableFound,
}

pub type Result<T> = std::result::Result<T, IngestError>;
