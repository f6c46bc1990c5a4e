//! The test-class trait: lifecycle hooks a suite may override.

use crate::signal::Signal;

/// Return type of every lifecycle hook.
///
/// `Ok(false)` means the hook declined (class setup refused to run, per-case
/// setup could not prepare the device); it is not a hard error. A returned
/// [`Signal`] steers control flow: `AbortAll` propagates through every
/// layer, anything else is contained by the engine's safe-call wrapper.
pub type HookResult = Result<bool, Signal>;

/// A collection of related test cases sharing setup/teardown and
/// device/config context.
///
/// Every hook has a permissive default so a minimal suite only
/// implements what it needs. Hook panics are contained by the engine;
/// a broken hook degrades to a logged `false`, it cannot corrupt the
/// run.
pub trait TestClass {
    /// Display name used in logs and summaries. Defaults to the short
    /// type name.
    fn tag(&self) -> &str
    where
        Self: Sized,
    {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }

    /// The default run list, in execution order. An empty list means
    /// the class runs nothing unless `run()` is given explicit names.
    fn tests(&self) -> Vec<&'static str> {
        Vec::new()
    }

    /// Class-level setup, run once before any case. Returning
    /// `Ok(false)` skips every requested case.
    fn setup_class(&mut self) -> HookResult {
        Ok(true)
    }

    /// Class-level teardown. Always attempted, even after aborts.
    fn teardown_class(&mut self) -> HookResult {
        Ok(true)
    }

    /// Per-case setup. Returning `Ok(false)` skips the case.
    fn setup_test(&mut self, _test_name: &str) -> HookResult {
        Ok(true)
    }

    /// Per-case teardown. Always attempted once the case started.
    fn teardown_test(&mut self, _test_name: &str) -> HookResult {
        Ok(true)
    }

    /// Called after a case is recorded as failed. `begin_time` is the
    /// case's begin stamp in epoch milliseconds, for bug-report and
    /// log-excerpt collection.
    fn on_fail(&mut self, _test_name: &str, _begin_time: i64) -> HookResult {
        Ok(true)
    }

    /// Called after a case is recorded as passed.
    fn on_success(&mut self, _test_name: &str, _begin_time: i64) -> HookResult {
        Ok(true)
    }

    /// Called after a case is recorded as skipped.
    fn on_skip(&mut self, _test_name: &str, _begin_time: i64) -> HookResult {
        Ok(true)
    }

    /// Called when a case ends in an unexpected panic, before the
    /// normal fail handling runs.
    fn on_exception(&mut self, _test_name: &str, _begin_time: i64) -> HookResult {
        Ok(true)
    }

    /// Final cleanup once the harness is done with the class.
    fn clean_up(&mut self) -> HookResult {
        Ok(true)
    }
}
