use eduzip_core::ChecklistRecord;
use tracing::debug;

use crate::StoreError;

/// Ordered, editable collection of checklist rows.
///
/// Sequence numbers are positional labels: every structural change (append,
/// delete) leaves them exactly `1..=len`, in order. In-place updates store
/// the record as given, including whatever sequence number the editor typed.
#[derive(Debug, Clone, Default)]
pub struct ResultStore {
    records: Vec<ChecklistRecord>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record, numbering it `len + 1`. Returns its index.
    pub fn append(&mut self, mut record: ChecklistRecord) -> usize {
        record.sequence_number = (self.records.len() + 1).to_string();
        self.records.push(record);
        self.records.len() - 1
    }

    /// Replace the record at `index` without renumbering.
    pub fn update(&mut self, index: usize, record: ChecklistRecord) -> Result<(), StoreError> {
        let len = self.records.len();
        let slot = self
            .records
            .get_mut(index)
            .ok_or(StoreError::IndexOutOfRange { index, len })?;
        *slot = record;
        Ok(())
    }

    /// Remove the record at `index` and renumber the rest to `1..=len`.
    pub fn delete(&mut self, index: usize) -> Result<ChecklistRecord, StoreError> {
        if index >= self.records.len() {
            return Err(StoreError::IndexOutOfRange {
                index,
                len: self.records.len(),
            });
        }
        let removed = self.records.remove(index);
        self.renumber();
        debug!(index, remaining = self.records.len(), "deleted result row");
        Ok(removed)
    }

    /// Append an all-empty row for manual entry. Returns its index so the
    /// caller can open it for editing right away.
    pub fn insert_blank(&mut self) -> usize {
        self.append(ChecklistRecord::default())
    }

    pub fn get(&self, index: usize) -> Option<&ChecklistRecord> {
        self.records.get(index)
    }

    pub fn records(&self) -> &[ChecklistRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    fn renumber(&mut self) {
        for (i, record) in self.records.iter_mut().enumerate() {
            record.sequence_number = (i + 1).to_string();
        }
    }
}
