use crate::application::checkout::Inconsistency;
use crate::error::{CheckoutError, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// Writes captured-but-unrecorded payments as CSV rows for manual reconciliation.
///
/// Columns: `submission_key, scholarship_id, user_email, amount, transaction_id, error`.
pub struct ReconciliationWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ReconciliationWriter<W> {
    /// Wraps any `Write` sink. The header row is emitted only when `with_header` is set.
    pub fn new(sink: W, with_header: bool) -> Self {
        let writer = csv::WriterBuilder::new()
            .has_headers(with_header)
            .from_writer(sink);
        Self { writer }
    }

    pub fn write(&mut self, inconsistency: &Inconsistency) -> Result<()> {
        self.writer.serialize(inconsistency)?;
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| CheckoutError::IoError(std::io::Error::new(e.error().kind(), e.to_string())))
    }
}

impl ReconciliationWriter<std::fs::File> {
    /// Opens `path` for appending, writing the header only into a new or empty file.
    pub fn append_to(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let is_empty = file.metadata()?.len() == 0;
        Ok(Self::new(file, is_empty))
    }
}
