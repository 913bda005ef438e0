use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("movie {movie_id} not found at provider")]
    NotFound { movie_id: i64 },

    #[error("malformed movie document: {0}")]
    MalformedDocument(String),

    #[error("invalid ingestion request: {0}")]
    InvalidRequest(String),

    #[error("provider request failed: {0}")]
    Provider(#[from] reqwest::Error),

    #[error("database write failed: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("flat-file write failed: {0}")]
    FlatFile(#[from] csv::Error),

    #[error("store i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

impl IngestError {
    /// Failures raised by a persistence backend mid-sequence. Never retried.
    pub fn is_store_failure(&self) -> bool {
        matches!(self, Self::Database(_) | Self::FlatFile(_) | Self::Io(_))
    }
}

pub type IngestResult<T> = Result<T, IngestError>;
