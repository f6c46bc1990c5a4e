//! The outcome vocabulary: how a test case ends.
//!
//! Test bodies and lifecycle hooks report results and steer control
//! flow by returning [`Signal`] values through `Result`, typically with
//! the `?` operator from arbitrarily deep call stacks. The engine is
//! the only place that interprets them; exactly one variant terminates
//! each executed case.

use std::fmt;

use log::warn;
use serde_json::Value;

/// Tagged outcome/control-flow value for a test case or lifecycle hook.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    /// Explicit pass with a message.
    Pass { message: String, extra: Option<Value> },
    /// Explicit failure.
    Fail { message: String, extra: Option<Value> },
    /// The case was skipped.
    Skip { reason: String, extra: Option<Value> },
    /// Suppress the case from reporting entirely. Used by generated-test
    /// trigger cases that exist only to expand parameter sets.
    Silent,
    /// Stop executing the remaining cases of the current class.
    AbortClass { reason: String, extra: Option<Value> },
    /// Stop the current class and signal upward that no further classes
    /// should run.
    AbortAll { reason: String, extra: Option<Value> },
}

impl Signal {
    pub fn pass(message: impl Into<String>) -> Self {
        Self::Pass {
            message: message.into(),
            extra: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self::Fail {
            message: message.into(),
            extra: None,
        }
    }

    pub fn skip(reason: impl Into<String>) -> Self {
        Self::Skip {
            reason: reason.into(),
            extra: None,
        }
    }

    /// Build a class abort. Logs a warning before returning the signal
    /// so the abort is visible even if a hook swallows it.
    pub fn abort_class(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        warn!("Abort class requested: {reason}");
        Self::AbortClass {
            reason,
            extra: None,
        }
    }

    /// Build a whole-run abort. Logs a warning before returning the
    /// signal.
    pub fn abort_all(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        warn!("Abort all requested: {reason}");
        Self::AbortAll {
            reason,
            extra: None,
        }
    }

    /// Attach a structured payload carried into the result record.
    pub fn with_extra(mut self, value: Value) -> Self {
        match &mut self {
            Self::Pass { extra, .. }
            | Self::Fail { extra, .. }
            | Self::Skip { extra, .. }
            | Self::AbortClass { extra, .. }
            | Self::AbortAll { extra, .. } => *extra = Some(value),
            Self::Silent => {}
        }
        self
    }

    /// The message or reason carried by the signal. Empty for `Silent`.
    pub fn message(&self) -> &str {
        match self {
            Self::Pass { message, .. } | Self::Fail { message, .. } => message,
            Self::Skip { reason, .. }
            | Self::AbortClass { reason, .. }
            | Self::AbortAll { reason, .. } => reason,
            Self::Silent => "",
        }
    }

    pub fn extra(&self) -> Option<&Value> {
        match self {
            Self::Pass { extra, .. }
            | Self::Fail { extra, .. }
            | Self::Skip { extra, .. }
            | Self::AbortClass { extra, .. }
            | Self::AbortAll { extra, .. } => extra.as_ref(),
            Self::Silent => None,
        }
    }

    /// `AbortAll` must be distinguishable at every catch site so it can
    /// be selectively re-propagated.
    pub fn is_abort_all(&self) -> bool {
        matches!(self, Self::AbortAll { .. })
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass { message, .. } => write!(f, "PASS: {message}"),
            Self::Fail { message, .. } => write!(f, "FAIL: {message}"),
            Self::Skip { reason, .. } => write!(f, "SKIP: {reason}"),
            Self::Silent => write!(f, "SILENT"),
            Self::AbortClass { reason, .. } => write!(f, "ABORT CLASS: {reason}"),
            Self::AbortAll { reason, .. } => write!(f, "ABORT ALL: {reason}"),
        }
    }
}

impl std::error::Error for Signal {}

/// What a test body hands back when it returns instead of signaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Explicit success.
    Pass,
    /// The body ran to completion without stating a verdict; counted as
    /// a pass.
    Done,
    /// Legacy convention: the body reported failure by returning it
    /// rather than signaling. Recorded as FAILED with no details.
    Fail,
}

/// Return type of every test-case function.
pub type TestOutcome = Result<Verdict, Signal>;

/// Terminal failure: `return fail("...")` never continues the case.
pub fn fail(message: impl Into<String>) -> TestOutcome {
    Err(Signal::fail(message))
}

/// Terminal explicit pass.
pub fn explicit_pass(message: impl Into<String>) -> TestOutcome {
    Err(Signal::pass(message))
}

/// Terminal skip.
pub fn skip(reason: impl Into<String>) -> TestOutcome {
    Err(Signal::skip(reason))
}

/// Terminal class abort.
pub fn abort_class(reason: impl Into<String>) -> TestOutcome {
    Err(Signal::abort_class(reason))
}

/// Terminal run abort.
pub fn abort_all(reason: impl Into<String>) -> TestOutcome {
    Err(Signal::abort_all(reason))
}

/// Skip the case when `cond` holds; no-op otherwise.
pub fn skip_if(cond: bool, reason: impl Into<String>, extra: Option<Value>) -> Result<(), Signal> {
    if cond {
        let mut sig = Signal::skip(reason);
        if let Some(v) = extra {
            sig = sig.with_extra(v);
        }
        return Err(sig);
    }
    Ok(())
}

/// Abort the class when `cond` holds; no-op otherwise.
pub fn abort_class_if(
    cond: bool,
    reason: impl Into<String>,
    extra: Option<Value>,
) -> Result<(), Signal> {
    if cond {
        let mut sig = Signal::abort_class(reason);
        if let Some(v) = extra {
            sig = sig.with_extra(v);
        }
        return Err(sig);
    }
    Ok(())
}

/// Abort the whole run when `cond` holds; no-op otherwise.
pub fn abort_all_if(
    cond: bool,
    reason: impl Into<String>,
    extra: Option<Value>,
) -> Result<(), Signal> {
    if cond {
        let mut sig = Signal::abort_all(reason);
        if let Some(v) = extra {
            sig = sig.with_extra(v);
        }
        return Err(sig);
    }
    Ok(())
}

/// Fail the case when `expr` does not hold.
///
/// This is the framework's assertion primitive; it takes the same path
/// through the engine as an explicit [`Signal::Fail`], unlike a raw
/// `assert!` panic which is treated as an unexpected exception.
pub fn assert_true(
    expr: bool,
    message: impl Into<String>,
    extra: Option<Value>,
) -> Result<(), Signal> {
    if !expr {
        let mut sig = Signal::fail(message);
        if let Some(v) = extra {
            sig = sig.with_extra(v);
        }
        return Err(sig);
    }
    Ok(())
}
