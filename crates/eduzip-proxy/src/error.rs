use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("API key not configured")]
    KeyMissing,
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("invalid request body: {0}")]
    InvalidEnvelope(#[from] serde_json::Error),
    #[error("endpoint not allowed: {0}")]
    EndpointNotAllowed(String),
    #[error("invalid document data: {0}")]
    Document(#[from] base64::DecodeError),
    #[error("{0}")]
    Upstream(#[from] reqwest::Error),
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::InvalidEnvelope(_) | Self::EndpointNotAllowed(_) | Self::Document(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::KeyMissing | Self::Upstream(_) | Self::Bind { .. } | Self::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Every error is answered as `{"error": "<message>"}`.
impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "proxy request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "proxy request rejected");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
