use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("request to extraction model failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("extraction model returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("malformed extraction response: {0}")]
    MalformedResponse(String),

    #[error("no record extracted from document")]
    NoRecordExtracted,
}

pub type Result<T> = std::result::Result<T, ExtractError>;
