//! Session state: the ordered result rows, the raw exchange log and their exports.

mod error;
pub mod export;
mod results;
mod session;

pub use error::{ExportError, StoreError};
pub use export::{CSV_HEADERS, csv_filename, to_clipboard_text, to_csv, write_csv};
pub use results::ResultStore;
pub use session::{Session, generate_session_id};
