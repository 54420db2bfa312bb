use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("upstream returned {status}: {}", upstream_message(*.status, .body))]
    Upstream { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    /// HTTP status of the failed call, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            Self::Json(_) => None,
        }
    }

    /// True for failures caused by a missing, invalid or exhausted credential:
    /// HTTP 401, or an error body that names `api_key`.
    pub fn is_credential_failure(&self) -> bool {
        self.status() == Some(401) || self.to_string().to_lowercase().contains("api_key")
    }
}

/// Human-readable message for an upstream error body.
///
/// Upstage reports errors as `{"error": {"message": ...}}`; the proxy reports
/// its own as `{"error": "..."}`. Non-JSON bodies are shown as-is, and an
/// empty body falls back to the status code.
pub(crate) fn upstream_message(status: u16, body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        let error = &json["error"];
        if let Some(message) = error["message"].as_str().or(error.as_str()) {
            return message.to_string();
        }
    }
    if body.trim().is_empty() {
        format!("API error {status}")
    } else {
        body.trim().to_string()
    }
}
