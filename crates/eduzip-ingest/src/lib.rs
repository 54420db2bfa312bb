//! Ingestion pipeline: drives each queued document through parsing and
//! extraction (or AI analysis) and appends the resulting rows to the session.

mod error;
pub mod event;
mod orchestrator;

pub use error::{FileError, IngestError};
pub use event::{FileState, IngestEvent, LogEntry, LogLevel};
pub use orchestrator::{BatchReport, FileOutcome, Orchestrator};
