//! The test execution engine.
//!
//! [`TestRunner`] owns one test-class instance, its case registry, and
//! the run's [`RunResults`]. It drives class setup, the per-case
//! setup/body/teardown cycle with signal-to-outcome mapping, generated
//! test-case expansion, and class teardown. Lifecycle hooks run through
//! a safe-call wrapper so a broken hook degrades to a logged `false`
//! instead of corrupting the run; only `AbortAll` punches through every
//! layer.

use std::any::Any;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};

use log::{error, info, warn};
use serde_json::Value;

use crate::config::ClassConfig;
use crate::record::TestResultRecord;
use crate::record::aggregate::RunResults;
use crate::runner::class::{HookResult, TestClass};
use crate::runner::device::DeviceLog;
use crate::runner::registry::{CaseFn, CaseRegistry};
use crate::runner::reporter::Reporter;
use crate::signal::{Signal, Verdict};
use crate::util::names::{is_valid_test_name, truncate_filename};
use crate::util::time::{epoch_ms, log_line_timestamp};

/// The one error that can escape [`TestRunner::run`]: an `AbortAll`
/// signal, carrying the aggregate accumulated before the abort so a
/// multi-class harness loses no completed work.
#[derive(Debug)]
pub struct AbortRun {
    pub reason: String,
    pub extra: Option<Value>,
    pub results: RunResults,
}

impl fmt::Display for AbortRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "test run aborted: {}", self.reason)
    }
}

impl std::error::Error for AbortRun {}

/// Whether a case produced a record or was a silent generation trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// The case was finalized and filed into the aggregate.
    Recorded,
    /// The case raised `Silent`; it was removed from `requested` and
    /// left no record.
    Silent,
}

/// Derives a display name for one generated setting. Returning `None`
/// counts as a naming failure; the engine logs it and falls back to the
/// default `"<tag> <setting>"` scheme.
pub type NameFn = fn(setting: &str, extra_args: &[String]) -> Option<String>;

/// How one case body ended, before hooks and bookkeeping.
enum CaseEnd {
    Pass(Option<Signal>),
    Fail(Option<Signal>),
    Skip(Signal),
    Abort(Signal),
    Exception(String),
    Silent,
}

/// Drives one test class through a run.
pub struct TestRunner<T: TestClass> {
    class: T,
    tag: String,
    config: ClassConfig,
    cases: CaseRegistry<T>,
    results: RunResults,
    reporter: Option<Reporter>,
    device_logs: Vec<Box<dyn DeviceLog>>,
}

impl<T: TestClass> TestRunner<T> {
    pub fn new(class: T, config: ClassConfig) -> Self {
        let tag = class.tag().to_owned();
        Self {
            class,
            tag,
            config,
            cases: CaseRegistry::new(),
            results: RunResults::new(),
            reporter: None,
            device_logs: Vec::new(),
        }
    }

    /// Register a test case under `name`.
    pub fn register(&mut self, name: impl Into<String>, func: CaseFn<T>) {
        self.cases.register(name, func);
    }

    /// Inject the machine-readable result sink.
    pub fn set_reporter(&mut self, reporter: Reporter) {
        self.reporter = Some(reporter);
    }

    /// Attach a device-log source consulted on every failed case.
    pub fn add_device_log(&mut self, device_log: Box<dyn DeviceLog>) {
        self.device_logs.push(device_log);
    }

    pub fn class(&self) -> &T {
        &self.class
    }

    pub fn class_mut(&mut self) -> &mut T {
        &mut self.class
    }

    pub fn config(&self) -> &ClassConfig {
        &self.config
    }

    pub fn results(&self) -> &RunResults {
        &self.results
    }

    /// Execute the class's test list (or an explicit one) in order.
    ///
    /// Returns the run's aggregate. The only error is an `AbortAll`
    /// signal, re-raised as [`AbortRun`] with the partial aggregate
    /// attached; an `AbortClass` stops the loop but returns normally.
    ///
    /// The aggregate is moved out on return; invoking `run` a second
    /// time on the same runner is unsupported and starts from an empty
    /// aggregate.
    pub fn run(&mut self, test_names: Option<&[&str]>) -> Result<RunResults, AbortRun> {
        let names: Vec<String> = match test_names {
            Some(names) => names.iter().map(|n| (*n).to_owned()).collect(),
            None => self.class.tests().iter().map(|n| (*n).to_owned()).collect(),
        };
        // No explicit names and no default list: nothing to do, and
        // that is not an error. No hooks run.
        if names.is_empty() {
            return Ok(std::mem::take(&mut self.results));
        }
        self.results.requested = names.clone();
        let tag = self.tag.clone();
        info!("==========> {tag} <==========");

        let mut pending_abort: Option<Signal> = None;
        match exec_hook(&mut self.class, &tag, "setup_class", |c| c.setup_class()) {
            Err(sig) => {
                // AbortAll out of class setup: nothing ran, but the
                // abort still owns the run.
                pending_abort = Some(sig);
            }
            Ok(false) => {
                let reason = format!("Failed to set up {tag}.");
                error!("{reason}");
                self.results.skip_all(&Signal::skip(reason));
            }
            Ok(true) => {
                let cases = self.resolve_cases(&names);
                let params = self.config.cli_args.clone().unwrap_or_default();
                for (name, func) in cases {
                    match self.exec_one_case(&name, func, &params) {
                        Ok(_) => {}
                        Err(sig) if sig.is_abort_all() => {
                            pending_abort = Some(sig);
                            break;
                        }
                        Err(_) => break,
                    }
                }
            }
        }

        if let Err(sig) = exec_hook(&mut self.class, &tag, "teardown_class", |c| {
            c.teardown_class()
        }) {
            pending_abort.get_or_insert(sig);
        }
        info!(
            "Summary for test class {tag}: {}",
            self.results.summary_line()
        );

        let results = std::mem::take(&mut self.results);
        match pending_abort {
            Some(sig) => Err(AbortRun {
                reason: sig.message().to_owned(),
                extra: sig.extra().cloned(),
                results,
            }),
            None => Ok(results),
        }
    }

    /// Execute a single test case through its full lifecycle.
    ///
    /// # Errors
    ///
    /// Returns the signal when the case (or one of its hooks) aborts
    /// the class or the run; the record is still filed first.
    pub fn exec_one_case(
        &mut self,
        test_name: &str,
        func: CaseFn<T>,
        params: &[String],
    ) -> Result<Disposition, Signal> {
        let mut record = TestResultRecord::new(test_name);
        record.test_begin();
        let begin_time = record.begin_time.unwrap_or_default();
        info!("[Test Case] {test_name}");
        let tag = self.tag.clone();

        let end = 'body: {
            match exec_hook(&mut self.class, &tag, "setup_test", |c| {
                c.setup_test(test_name)
            }) {
                Err(sig) => break 'body CaseEnd::Abort(sig),
                Ok(false) => {
                    break 'body CaseEnd::Skip(Signal::skip(format!(
                        "Setup for {test_name} failed."
                    )));
                }
                Ok(true) => {}
            }
            let rig = &mut *self;
            match catch_unwind(AssertUnwindSafe(|| func(rig, params))) {
                Ok(Ok(Verdict::Pass | Verdict::Done)) => CaseEnd::Pass(None),
                Ok(Ok(Verdict::Fail)) => CaseEnd::Fail(None),
                Ok(Err(sig)) => match sig {
                    Signal::Pass { .. } => CaseEnd::Pass(Some(sig)),
                    Signal::Fail { .. } => CaseEnd::Fail(Some(sig)),
                    Signal::Skip { .. } => CaseEnd::Skip(sig),
                    Signal::Silent => CaseEnd::Silent,
                    Signal::AbortClass { .. } | Signal::AbortAll { .. } => CaseEnd::Abort(sig),
                },
                Err(panic) => CaseEnd::Exception(panic_message(panic.as_ref())),
            }
        };

        let mut propagate: Option<Signal> = None;
        let mut disposition = Disposition::Recorded;
        match end {
            CaseEnd::Pass(sig) => {
                record.test_pass(sig.as_ref());
                info!("{record}");
                if let Err(sig) = exec_hook(&mut self.class, &tag, "on_success", |c| {
                    c.on_success(test_name, begin_time)
                }) {
                    propagate.get_or_insert(sig);
                }
            }
            CaseEnd::Fail(sig) => {
                record.test_fail(sig.as_ref());
                self.handle_failed_case(&record, begin_time, &mut propagate);
            }
            CaseEnd::Exception(details) => {
                error!("Exception in {test_name}: {details}");
                record.test_fail_with(details);
                if let Err(sig) = exec_hook(&mut self.class, &tag, "on_exception", |c| {
                    c.on_exception(test_name, begin_time)
                }) {
                    propagate.get_or_insert(sig);
                }
                self.handle_failed_case(&record, begin_time, &mut propagate);
            }
            CaseEnd::Skip(sig) => {
                info!("Reason to skip: {}", sig.message());
                record.test_skip(Some(&sig));
                info!("{record}");
                if let Err(sig) = exec_hook(&mut self.class, &tag, "on_skip", |c| {
                    c.on_skip(test_name, begin_time)
                }) {
                    propagate.get_or_insert(sig);
                }
            }
            CaseEnd::Abort(sig) => {
                // Aborts bypass pass/fail bucketing but are still
                // counted as skipped so the aggregate stays consistent.
                record.test_skip(Some(&sig));
                info!("{record}");
                propagate = Some(sig);
            }
            CaseEnd::Silent => {
                disposition = Disposition::Silent;
                self.results.remove_requested(test_name);
            }
        }

        if let Err(sig) = exec_hook(&mut self.class, &tag, "teardown_test", |c| {
            c.teardown_test(test_name)
        }) {
            propagate.get_or_insert(sig);
        }
        if disposition == Disposition::Recorded {
            self.report_record(&record);
            self.results.add_record(record);
        }
        match propagate {
            Some(sig) => Err(sig),
            None => Ok(disposition),
        }
    }

    /// Exercise one test function against many parameter sets, each
    /// individually named and reported.
    ///
    /// Returns the settings whose case did not pass. A setting whose
    /// invocation raised `Silent` is neither reported nor counted as
    /// failed.
    ///
    /// # Errors
    ///
    /// Propagates abort signals from the generated cases.
    pub fn run_generated(
        &mut self,
        func: CaseFn<T>,
        settings: &[String],
        extra_args: &[String],
        tag: &str,
        name_func: Option<NameFn>,
    ) -> Result<Vec<String>, Signal> {
        let mut failed_settings = Vec::new();
        for setting in settings {
            let derived = name_func.and_then(|nf| {
                let name = nf(setting, extra_args);
                if name.is_none() {
                    warn!(
                        "Failed to get a test name for setting \"{setting}\"; \
                         falling back to the default name."
                    );
                }
                name
            });
            let name = derived.unwrap_or_else(|| format!("{tag} {setting}"));
            let name = truncate_filename(&name).to_owned();

            // Requested before execution, so the name is visible even
            // if the run aborts before reaching it.
            self.results.requested.push(name.clone());
            let previous_passed = self.results.passed.len();

            let mut params = Vec::with_capacity(1 + extra_args.len());
            params.push(setting.clone());
            params.extend_from_slice(extra_args);

            match self.exec_one_case(&name, func, &params)? {
                Disposition::Silent => {}
                Disposition::Recorded => {
                    if self.results.passed.len() != previous_passed + 1 {
                        failed_settings.push(setting.clone());
                    }
                }
            }
        }
        Ok(failed_settings)
    }

    /// Run the class's `clean_up` hook through the safe-call wrapper.
    ///
    /// # Errors
    ///
    /// Only an `AbortAll` signal from the hook propagates.
    pub fn clean_up(&mut self) -> Result<(), Signal> {
        let tag = self.tag.clone();
        exec_hook(&mut self.class, &tag, "clean_up", |c| c.clean_up())?;
        Ok(())
    }

    fn resolve_cases(&self, names: &[String]) -> Vec<(String, CaseFn<T>)> {
        let mut resolved = Vec::with_capacity(names.len());
        for name in names {
            if !is_valid_test_name(name) {
                warn!("Invalid test case name \"{name}\"; dropped.");
                continue;
            }
            match self.cases.get(name) {
                Some(func) => resolved.push((name.clone(), func)),
                None => warn!("{} has no test case named \"{name}\"; dropped.", self.tag),
            }
        }
        resolved
    }

    fn handle_failed_case(
        &mut self,
        record: &TestResultRecord,
        begin_time: i64,
        propagate: &mut Option<Signal>,
    ) {
        error!("{record}");
        self.collect_log_excerpts(&record.test_name, begin_time);
        let tag = self.tag.clone();
        let test_name = record.test_name.clone();
        if let Err(sig) = exec_hook(&mut self.class, &tag, "on_fail", |c| {
            c.on_fail(&test_name, begin_time)
        }) {
            propagate.get_or_insert(sig);
        }
    }

    /// Pull a time-bounded excerpt from every attached device log,
    /// padded on both sides by the configured offset.
    fn collect_log_excerpts(&self, test_name: &str, begin_time: i64) {
        if self.device_logs.is_empty() {
            return;
        }
        let offset_ms = self.config.adb_log_time_offset * 1000;
        let begin = log_line_timestamp(begin_time - offset_ms);
        let end = log_line_timestamp(epoch_ms() + offset_ms);
        for device_log in &self.device_logs {
            if let Err(e) = device_log.excerpt(test_name, &begin, &end, &self.config.log_path) {
                warn!(
                    "Failed to collect a log excerpt from {}: {e}",
                    device_log.device_tag()
                );
            }
        }
    }

    fn report_record(&mut self, record: &TestResultRecord) {
        if let Some(reporter) = &mut self.reporter
            && let Err(e) = reporter.write_record(record)
        {
            warn!("Failed to report record for {}: {e}", record.test_name);
        }
    }
}

/// The safe-call wrapper around lifecycle hooks.
///
/// Passes a normal return through unchanged. An `AbortAll` signal is
/// re-raised immediately; any other signal or a panic is logged with
/// the hook's name and the class tag and degrades to `Ok(false)`.
fn exec_hook<T>(
    class: &mut T,
    tag: &str,
    hook_name: &str,
    f: impl FnOnce(&mut T) -> HookResult,
) -> Result<bool, Signal> {
    match catch_unwind(AssertUnwindSafe(|| f(class))) {
        Ok(Ok(ok)) => Ok(ok),
        Ok(Err(sig)) if sig.is_abort_all() => Err(sig),
        Ok(Err(sig)) => {
            warn!("Signal in {hook_name} of {tag}: {sig}");
            Ok(false)
        }
        Err(panic) => {
            error!(
                "Exception in {hook_name} of {tag}: {}",
                panic_message(panic.as_ref())
            );
            Ok(false)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
