use sea_orm::DbErr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Object store error: {0}")]
    ObjectStore(String),

    #[error("HTTP {status} fetching {url}")]
    HttpStatus { status: u16, url: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
}

impl From<s3::error::S3Error> for StoreError {
    fn from(e: s3::error::S3Error) -> Self {
        StoreError::ObjectStore(e.to_string())
    }
}

impl From<s3::creds::error::CredentialsError> for StoreError {
    fn from(e: s3::creds::error::CredentialsError) -> Self {
        StoreError::ObjectStore(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
