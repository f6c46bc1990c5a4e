//! Per-class-run result aggregation.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::record::{TestResultRecord, TestStatus};
use crate::signal::Signal;

/// Everything a class run produced: the requested names in request
/// order, and one finalized record per executed case bucketed by
/// outcome. Only the engine appends; a run that aborts early leaves the
/// unreached names in `requested` with no record (requested minus
/// executed = not run).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunResults {
    pub requested: Vec<String>,
    pub passed: Vec<TestResultRecord>,
    pub failed: Vec<TestResultRecord>,
    pub skipped: Vec<TestResultRecord>,
}

impl RunResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cases that actually ran to a finalized record.
    pub fn executed(&self) -> usize {
        self.passed.len() + self.failed.len() + self.skipped.len()
    }

    /// File a finalized record into its outcome bucket.
    pub fn add_record(&mut self, record: TestResultRecord) {
        match record.result {
            TestStatus::Pass => self.passed.push(record),
            TestStatus::Skip => self.skipped.push(record),
            // Unknown should never reach here; file it as a failure
            // rather than lose the record.
            TestStatus::Fail | TestStatus::Unknown => self.failed.push(record),
        }
    }

    /// Remove the first occurrence of `name` from the requested list.
    /// Used when a case turns out to be a silent generation trigger.
    pub fn remove_requested(&mut self, name: &str) {
        if let Some(pos) = self.requested.iter().position(|n| n == name) {
            self.requested.remove(pos);
        }
    }

    /// Bulk-skip every requested-but-unexecuted name with the same
    /// signal. Used when class setup fails before any case runs.
    pub fn skip_all(&mut self, signal: &Signal) {
        let executed: HashSet<&str> = self
            .passed
            .iter()
            .chain(self.failed.iter())
            .chain(self.skipped.iter())
            .map(|r| r.test_name.as_str())
            .collect();
        let pending: Vec<String> = self
            .requested
            .iter()
            .filter(|n| !executed.contains(n.as_str()))
            .cloned()
            .collect();
        for name in pending {
            let mut record = TestResultRecord::new(name);
            record.test_begin();
            record.test_skip(Some(signal));
            self.skipped.push(record);
        }
    }

    /// One-line human summary of the run.
    pub fn summary_line(&self) -> String {
        format!(
            "Requested {}, Executed {}, Passed {}, Failed {}, Skipped {}",
            self.requested.len(),
            self.executed(),
            self.passed.len(),
            self.failed.len(),
            self.skipped.len()
        )
    }
}

impl fmt::Display for RunResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary_line())
    }
}
