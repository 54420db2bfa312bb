use eduzip_client::ClientError;
use eduzip_core::NormalizeError;
use thiserror::Error;

/// Conditions that stop a batch before any file is processed.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("no API key configured and no credential proxy set")]
    CredentialMissing,
    #[error("no files queued for analysis")]
    NoFiles,
}

/// Why a single file failed. Never aborts the batch.
#[derive(Error, Debug)]
pub enum FileError {
    #[error(transparent)]
    Upstream(#[from] ClientError),
    #[error("unexpected response shape: {0}")]
    InvalidResponse(#[from] serde_json::Error),
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}

impl FileError {
    pub fn is_credential_failure(&self) -> bool {
        match self {
            Self::Upstream(e) => e.is_credential_failure(),
            _ => false,
        }
    }
}
