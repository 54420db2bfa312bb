//! Turning a parsed document into checklist rows, either by reading its
//! table directly or by asking a chat model.

mod error;
pub mod prompt;
pub mod reply;
pub mod table;

pub use error::AnalysisError;
pub use prompt::{SYSTEM_PROMPT, build_chat_request, build_user_prompt};
pub use reply::{extract_json_span, parse_reply};
pub use table::{extract_from_response, extract_rows};
