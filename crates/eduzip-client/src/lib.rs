//! Access to the two upstream calls a document goes through: document parse
//! and chat completion.
//!
//! [`DocumentService`] is the seam the ingestion pipeline depends on;
//! [`UpstageClient`] is the HTTP implementation.

mod error;
mod upstage;

use async_trait::async_trait;
use eduzip_core::wire::ChatRequest;
use eduzip_core::{AnalysisMode, UploadedFile};

pub use error::ClientError;
pub use upstage::UpstageClient;

/// Upstream document services.
///
/// Both calls return the response body as received so it can be kept for
/// audit display before being interpreted.
#[async_trait]
pub trait DocumentService: Send + Sync {
    /// Whether a call can be attempted at all: a credential is present or a
    /// proxy holds it.
    fn is_configured(&self) -> bool;

    /// Upload a document for OCR and layout parsing. `mode` selects the
    /// output formats requested.
    async fn parse_document(
        &self,
        file: &UploadedFile,
        mode: AnalysisMode,
    ) -> Result<serde_json::Value, ClientError>;

    async fn chat(&self, request: &ChatRequest) -> Result<serde_json::Value, ClientError>;
}
