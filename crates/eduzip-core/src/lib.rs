pub mod checklist;
pub mod config;
pub mod document;
mod error;
pub mod verdict;
pub mod wire;

pub use checklist::{ChecklistRecord, CriterionId, Criteria, RawExchange, UploadedFile, Verdict};
pub use config::{AnalysisMode, AppConfig, PipelineConfig, ProxyConfig, UpstageConfig};
pub use document::{ParseResponse, html_to_text};
pub use error::{ConfigError, NormalizeError};
pub use verdict::{classify, classify_model_answer};
