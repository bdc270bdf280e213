use thiserror::Error;

#[derive(Error, Debug)]
pub enum Text2SqlError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported file format: {0} (expected .csv, .tsv, .xlsx or .xls)")]
    UnsupportedFormat(String),

    #[error("load error: {0}")]
    Load(String),

    #[error("cleaning error: {0}")]
    Cleaning(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("rate limited by language model provider: {0}")]
    RateLimited(String),

    #[error("language model transport error: {0}")]
    Transport(String),

    #[error("sql extraction failed: {0}")]
    QueryExtraction(String),

    #[error("row validation failed: {0}")]
    Validation(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("tracing initialization failed: {0}")]
    Tracing(String),
}

impl Text2SqlError {
    /// only rate limits from the model provider are worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, Text2SqlError::RateLimited(_))
    }
}

impl From<rusqlite::Error> for Text2SqlError {
    fn from(e: rusqlite::Error) -> Self {
        Text2SqlError::Store(e.to_string())
    }
}

impl From<csv::Error> for Text2SqlError {
    fn from(e: csv::Error) -> Self {
        Text2SqlError::Load(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Text2SqlError>;
