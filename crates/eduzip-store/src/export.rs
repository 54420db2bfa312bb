//! CSV and clipboard serialisation of the result rows.
//!
//! Both formats use the checklist column order: sequence number, the four
//! text fields, then criteria `1-1` through `5-3`.

use std::io;
use std::path::{Path, PathBuf};

use csv::{QuoteStyle, Terminator, WriterBuilder};
use tracing::info;

use crate::{ExportError, ResultStore};

/// Header row, as labelled on the selection-criteria form.
pub const CSV_HEADERS: [&str; 14] = [
    "연번",
    "학습지원 소프트웨어명",
    "공급자",
    "유형",
    "주요용도",
    "1-1",
    "1-2",
    "1-3",
    "2",
    "3",
    "4",
    "5-1",
    "5-2",
    "5-3",
];

const BOM: &str = "\u{feff}";

/// Spreadsheet-friendly CSV: UTF-8 with a byte-order mark, every field
/// double-quoted (embedded quotes doubled), CR-LF line endings.
pub fn to_csv(store: &ResultStore) -> Result<String, ExportError> {
    if store.is_empty() {
        return Err(ExportError::Empty);
    }

    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::CRLF)
        .from_writer(BOM.as_bytes().to_vec());

    writer.write_record(CSV_HEADERS)?;
    for record in store.records() {
        writer.write_record(record.cells())?;
    }

    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(bytes).map_err(|e| ExportError::Io(io::Error::other(e)))
}

/// Tab-separated text for pasting into a spreadsheet. No quoting, `\n` between rows.
pub fn to_clipboard_text(store: &ResultStore) -> Result<String, ExportError> {
    if store.is_empty() {
        return Err(ExportError::Empty);
    }

    let mut writer = WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(QuoteStyle::Never)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADERS)?;
    for record in store.records() {
        writer.write_record(record.cells())?;
    }

    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    let text = String::from_utf8(bytes).map_err(|e| ExportError::Io(io::Error::other(e)))?;
    Ok(text.strip_suffix('\n').unwrap_or(&text).to_string())
}

/// Export file name for a session.
pub fn csv_filename(session_id: &str) -> String {
    format!("에듀집_선정기준_{session_id}.csv")
}

/// Write the CSV export into `dir`, named after the session. Returns the path written.
pub fn write_csv(store: &ResultStore, session_id: &str, dir: &Path) -> Result<PathBuf, ExportError> {
    let csv = to_csv(store)?;
    let path = dir.join(csv_filename(session_id));
    std::fs::write(&path, csv)?;
    info!(path = %path.display(), rows = store.len(), "wrote csv export");
    Ok(path)
}
