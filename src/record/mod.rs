//! Per-case result records.

pub mod aggregate;

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::signal::Signal;
use crate::util::time::epoch_ms;

/// Final classification of one executed test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TestStatus {
    /// Not yet finalized.
    Unknown,
    Pass,
    Fail,
    Skip,
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "UNKNOWN"),
            Self::Pass => write!(f, "PASS"),
            Self::Fail => write!(f, "FAIL"),
            Self::Skip => write!(f, "SKIP"),
        }
    }
}

/// The result data for one executed test case.
///
/// Created by the engine at case start (`test_begin` stamps the begin
/// time), finalized exactly once by one of `test_pass` / `test_fail` /
/// `test_skip` / `test_fail_with`, then moved into the run's
/// [`aggregate::RunResults`] and treated as immutable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestResultRecord {
    pub test_name: String,
    /// Epoch milliseconds, stamped when the case starts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub begin_time: Option<i64>,
    /// Epoch milliseconds, stamped at finalization.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
    pub result: TestStatus,
    /// Human-readable detail derived from the terminating signal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Structured payload carried by the terminating signal, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extras: Option<Value>,
}

impl TestResultRecord {
    pub fn new(test_name: impl Into<String>) -> Self {
        Self {
            test_name: test_name.into(),
            begin_time: None,
            end_time: None,
            result: TestStatus::Unknown,
            details: None,
            extras: None,
        }
    }

    /// Mark the start of the case.
    pub fn test_begin(&mut self) {
        self.begin_time = Some(epoch_ms());
    }

    fn finalize(&mut self, result: TestStatus, signal: Option<&Signal>) {
        self.end_time = Some(epoch_ms());
        self.result = result;
        if let Some(sig) = signal {
            let msg = sig.message();
            if !msg.is_empty() {
                self.details = Some(msg.to_owned());
            }
            self.extras = sig.extra().cloned();
        }
    }

    pub fn test_pass(&mut self, signal: Option<&Signal>) {
        self.finalize(TestStatus::Pass, signal);
    }

    pub fn test_fail(&mut self, signal: Option<&Signal>) {
        self.finalize(TestStatus::Fail, signal);
    }

    pub fn test_skip(&mut self, signal: Option<&Signal>) {
        self.finalize(TestStatus::Skip, signal);
    }

    /// Finalize as FAIL with free-form details. Used for unexpected
    /// panics where there is no signal to pull a message from.
    pub fn test_fail_with(&mut self, details: impl Into<String>) {
        self.end_time = Some(epoch_ms());
        self.result = TestStatus::Fail;
        self.details = Some(details.into());
    }
}

impl fmt::Display for TestResultRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Test Case] {} {}", self.test_name, self.result)?;
        if let Some(details) = &self.details {
            write!(f, ": {details}")?;
        }
        Ok(())
    }
}
