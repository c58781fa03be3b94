use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error during {operation}: {source}")]
    Http {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("Storage rejected {operation} on '{table}' (status {status}): {body}")]
    Rejected {
        operation: &'static str,
        table: String,
        status: u16,
        body: String,
    },

    #[error("Invalid storage configuration: {0}")]
    Config(String),

    #[error("Table store unavailable: {0}")]
    Unavailable(String),
}

pub type StorageResult<T> = Result<T, StorageError>;
