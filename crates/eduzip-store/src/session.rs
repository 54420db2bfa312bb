use eduzip_core::{PipelineConfig, RawExchange, UploadedFile};
use tracing::{info, warn};
use uuid::Uuid;

use crate::ResultStore;

/// One in-memory unit of work: queued files, result rows and raw exchanges.
///
/// Nothing here is persisted. [`reset`](Self::reset) starts a fresh session
/// with a new identifier and drops everything unconditionally.
#[derive(Debug)]
pub struct Session {
    id: String,
    files: Vec<UploadedFile>,
    results: ResultStore,
    raw_exchanges: Vec<RawExchange>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        let id = generate_session_id();
        info!(session = %id, "session started");
        Self {
            id,
            files: Vec::new(),
            results: ResultStore::new(),
            raw_exchanges: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Discard all files, rows and exchanges and take a new identifier.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Queue the files whose extension the pipeline supports, in the given
    /// order. Returns how many were rejected.
    pub fn add_files(&mut self, files: Vec<UploadedFile>, pipeline: &PipelineConfig) -> usize {
        let mut rejected = 0;
        for file in files {
            if pipeline.is_supported(&file.name) {
                self.files.push(file);
            } else {
                warn!(file = %file.name, "unsupported file type, skipping");
                rejected += 1;
            }
        }
        rejected
    }

    pub fn clear_files(&mut self) {
        self.files.clear();
    }

    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    pub fn results(&self) -> &ResultStore {
        &self.results
    }

    pub fn results_mut(&mut self) -> &mut ResultStore {
        &mut self.results
    }

    pub fn raw_exchanges(&self) -> &[RawExchange] {
        &self.raw_exchanges
    }

    pub fn record_exchange(&mut self, exchange: RawExchange) {
        self.raw_exchanges.push(exchange);
    }

    /// Split the session for a batch run: the queued files are lent out
    /// read-only while the result store and exchange log are written.
    ///
    /// Rows and exchanges from a previous batch are dropped first; queued
    /// files stay.
    pub fn begin_batch(&mut self) -> (&[UploadedFile], &mut ResultStore, &mut Vec<RawExchange>) {
        self.results.clear();
        self.raw_exchanges.clear();
        (&self.files, &mut self.results, &mut self.raw_exchanges)
    }
}

/// Base-36 millisecond timestamp, a dash and six random characters.
pub fn generate_session_id() -> String {
    let millis = chrono::Utc::now().timestamp_millis().max(0) as u128;
    // The low 64 bits of a v4 UUID are random apart from two variant bits.
    let random = Uuid::new_v4().as_u128() % SUFFIX_SPACE;
    format!("{}-{:0>6}", to_base36(millis), to_base36(random))
}

/// 36^6: six base-36 digits.
const SUFFIX_SPACE: u128 = 2_176_782_336;

fn to_base36(mut n: u128) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".into();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}
