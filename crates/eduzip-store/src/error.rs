use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("row index {index} out of range (store has {len} rows)")]
    IndexOutOfRange { index: usize, len: usize },
}

#[derive(Debug, Error)]
pub enum ExportError {
    /// Nothing to export; callers show a notice instead of writing a file.
    #[error("there are no result rows to export")]
    Empty,

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
