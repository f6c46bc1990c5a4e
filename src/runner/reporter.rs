//! Machine-readable result sink.
//!
//! The harness injects a line-oriented stream (usually a file it owns);
//! the engine appends one JSON object per finalized record so partial
//! results survive a crashed or aborted run.

use std::io::{self, Write};

use crate::record::TestResultRecord;

/// Writes finalized records to an injected stream, one JSON line each.
pub struct Reporter {
    sink: Box<dyn Write + Send>,
}

impl Reporter {
    pub fn new(sink: Box<dyn Write + Send>) -> Self {
        Self { sink }
    }

    /// Append one record as a JSON line and flush.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error; serialization of a record
    /// cannot fail.
    pub fn write_record(&mut self, record: &TestResultRecord) -> io::Result<()> {
        let line = serde_json::to_string(record).map_err(io::Error::other)?;
        writeln!(self.sink, "{line}")?;
        self.sink.flush()
    }
}

impl std::fmt::Debug for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reporter").finish_non_exhaustive()
    }
}
