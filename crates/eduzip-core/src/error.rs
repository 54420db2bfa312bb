use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Figment(#[from] figment::Error),

    #[error("invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// The parse service answered, but nothing analysable came back.
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("no text could be extracted from the document")]
    EmptyDocumentText,
}
