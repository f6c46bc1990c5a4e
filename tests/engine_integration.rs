//! End-to-end tests for the execution engine.
//!
//! These exercise the full flow a harness would drive: build a config
//! from a JSON mapping, register cases on a runner, inject a reporter
//! stream and a device-log collaborator, run, and inspect both the
//! returned aggregate and the artifacts the engine wrote.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde_json::json;

use testrig::config::ClassConfig;
use testrig::record::TestStatus;
use testrig::runner::class::{HookResult, TestClass};
use testrig::runner::device::DeviceLog;
use testrig::runner::engine::TestRunner;
use testrig::runner::reporter::Reporter;
use testrig::signal;
use testrig::signal::{TestOutcome, Verdict};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// -- Shared in-memory reporter sink --

#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SharedBuf {
    fn lines(&self) -> Vec<serde_json::Value> {
        let bytes = self.0.lock().unwrap().clone();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }
}

// -- Mock device log that records excerpt requests --

struct FakeLogcat {
    serial: &'static str,
    requests: Arc<Mutex<Vec<(String, String, String)>>>,
}

impl DeviceLog for FakeLogcat {
    fn device_tag(&self) -> &str {
        self.serial
    }

    fn excerpt(
        &self,
        test_name: &str,
        begin: &str,
        end: &str,
        dest_dir: &Path,
    ) -> io::Result<PathBuf> {
        self.requests
            .lock()
            .unwrap()
            .push((test_name.to_owned(), begin.to_owned(), end.to_owned()));
        let path = dest_dir.join(format!("{test_name}.{}.log", self.serial));
        std::fs::write(&path, "filtered log excerpt\n")?;
        Ok(path)
    }
}

// -- A small telephony-flavored suite --

struct SmsSuite {
    modem_ready: bool,
    delivered: Vec<String>,
}

impl SmsSuite {
    fn new() -> Self {
        Self {
            modem_ready: false,
            delivered: Vec::new(),
        }
    }
}

impl TestClass for SmsSuite {
    fn tag(&self) -> &str {
        "SmsSuite"
    }

    fn tests(&self) -> Vec<&'static str> {
        vec!["test_send_short_sms", "test_send_long_sms", "test_send_empty_sms"]
    }

    fn setup_class(&mut self) -> HookResult {
        self.modem_ready = true;
        Ok(true)
    }

    fn teardown_class(&mut self) -> HookResult {
        self.modem_ready = false;
        Ok(true)
    }
}

fn send_sms(suite: &mut SmsSuite, body: &str) -> Result<(), String> {
    if !suite.modem_ready {
        return Err("modem not ready".to_owned());
    }
    if body.is_empty() {
        return Err("refusing to send an empty message".to_owned());
    }
    suite.delivered.push(body.to_owned());
    Ok(())
}

fn test_send_short_sms(rig: &mut TestRunner<SmsSuite>, _args: &[String]) -> TestOutcome {
    send_sms(rig.class_mut(), "ping").map_err(signal::Signal::fail)?;
    Ok(Verdict::Done)
}

fn test_send_long_sms(rig: &mut TestRunner<SmsSuite>, _args: &[String]) -> TestOutcome {
    let body = "a".repeat(300);
    send_sms(rig.class_mut(), &body).map_err(signal::Signal::fail)?;
    signal::explicit_pass("segmented delivery verified")
}

fn test_send_empty_sms(rig: &mut TestRunner<SmsSuite>, _args: &[String]) -> TestOutcome {
    // Expected to fail: empty bodies are rejected by the stack.
    send_sms(rig.class_mut(), "").map_err(signal::Signal::fail)?;
    Ok(Verdict::Done)
}

fn sms_runner(config: ClassConfig) -> TestRunner<SmsSuite> {
    let mut rig = TestRunner::new(SmsSuite::new(), config);
    rig.register("test_send_short_sms", test_send_short_sms);
    rig.register("test_send_long_sms", test_send_long_sms);
    rig.register("test_send_empty_sms", test_send_empty_sms);
    rig
}

#[test]
fn e2e_default_list_with_reporter() {
    init_logging();
    let buf = SharedBuf::default();
    let mut rig = sms_runner(ClassConfig::default());
    rig.set_reporter(Reporter::new(Box::new(buf.clone())));

    let results = rig.run(None).unwrap();

    assert_eq!(results.requested.len(), 3);
    assert_eq!(results.passed.len(), 2);
    assert_eq!(results.failed.len(), 1);
    assert_eq!(results.failed[0].test_name, "test_send_empty_sms");

    // One JSON line per executed case, in execution order.
    let lines = buf.lines();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0]["test_name"], "test_send_short_sms");
    assert_eq!(lines[0]["result"], "PASS");
    assert_eq!(lines[1]["details"], "segmented delivery verified");
    assert_eq!(lines[2]["result"], "FAIL");
    assert_eq!(lines[2]["details"], "refusing to send an empty message");
}

#[test]
fn e2e_config_from_json_mapping() {
    init_logging();
    let config = ClassConfig::from_value(&json!({
        "testbed_name": "ota-chamber-1",
        "devices": ["R58M123ABC"],
        "sms_retry_count": 3,
    }))
    .unwrap();
    assert_eq!(config.param("sms_retry_count"), Some(&json!(3)));

    let mut rig = sms_runner(config);
    let results = rig.run(Some(&["test_send_short_sms"])).unwrap();
    assert_eq!(results.passed.len(), 1);
    assert_eq!(rig.class().delivered, vec!["ping"]);
}

#[test]
fn e2e_failed_case_pulls_device_log_excerpts() {
    init_logging();
    let log_dir = tempfile::tempdir().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));

    let config = ClassConfig {
        log_path: log_dir.path().to_path_buf(),
        adb_log_time_offset: 2,
        ..ClassConfig::default()
    };
    let mut rig = sms_runner(config);
    rig.add_device_log(Box::new(FakeLogcat {
        serial: "R58M123ABC",
        requests: requests.clone(),
    }));

    let results = rig
        .run(Some(&["test_send_short_sms", "test_send_empty_sms"]))
        .unwrap();
    assert_eq!(results.failed.len(), 1);

    // Only the failed case asked for an excerpt, with a sortable window.
    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let (name, begin, end) = &requests[0];
    assert_eq!(name, "test_send_empty_sms");
    assert!(begin.as_str() < end.as_str());
    assert!(
        log_dir
            .path()
            .join("test_send_empty_sms.R58M123ABC.log")
            .exists()
    );
}

#[test]
fn e2e_excerpt_io_errors_do_not_fail_the_run() {
    init_logging();

    struct BrokenLogcat;
    impl DeviceLog for BrokenLogcat {
        fn device_tag(&self) -> &str {
            "broken"
        }
        fn excerpt(&self, _: &str, _: &str, _: &str, _: &Path) -> io::Result<PathBuf> {
            Err(io::Error::other("device went away"))
        }
    }

    let mut rig = sms_runner(ClassConfig::default());
    rig.add_device_log(Box::new(BrokenLogcat));
    let results = rig.run(Some(&["test_send_empty_sms"])).unwrap();
    assert_eq!(results.failed.len(), 1);
}

// -- Generated expansion driven from a trigger case --

struct BandSweep {
    bad_bands: Vec<String>,
}

impl TestClass for BandSweep {
    fn tag(&self) -> &str {
        "BandSweep"
    }

    fn tests(&self) -> Vec<&'static str> {
        vec!["test_band_sweep"]
    }
}

fn check_band(_rig: &mut TestRunner<BandSweep>, args: &[String]) -> TestOutcome {
    match args[0].as_str() {
        "b13" => signal::fail("no attach on band 13"),
        _ => Ok(Verdict::Done),
    }
}

fn band_name(setting: &str, _extra: &[String]) -> Option<String> {
    Some(format!("test_attach_{setting}"))
}

fn test_band_sweep(rig: &mut TestRunner<BandSweep>, _args: &[String]) -> TestOutcome {
    let settings: Vec<String> = ["b1", "b7", "b13"].iter().map(|s| s.to_string()).collect();
    let failed = rig.run_generated(check_band, &settings, &[], "test_attach", Some(band_name))?;
    rig.class_mut().bad_bands = failed;
    // The trigger itself is not a reportable case; the generated
    // records already carry the per-band outcomes.
    Err(signal::Signal::Silent)
}

#[test]
fn e2e_trigger_case_expands_and_goes_silent() {
    init_logging();
    let mut rig = TestRunner::new(BandSweep { bad_bands: Vec::new() }, ClassConfig::default());
    rig.register("test_band_sweep", test_band_sweep);

    let results = rig.run(None).unwrap();

    // The trigger vanished from requested; the generated names remain.
    assert_eq!(
        results.requested,
        vec!["test_attach_b1", "test_attach_b7", "test_attach_b13"]
    );
    assert_eq!(results.passed.len(), 2);
    assert_eq!(results.failed.len(), 1);
    assert_eq!(results.failed[0].test_name, "test_attach_b13");
    assert_eq!(results.failed[0].result, TestStatus::Fail);
    assert_eq!(rig.class().bad_bands, vec!["b13"]);
}

// -- Multi-class harness shape: AbortAll across classes --

struct FlakyRig;
impl TestClass for FlakyRig {
    fn tag(&self) -> &str {
        "FlakyRig"
    }
}

fn test_power_ok(_rig: &mut TestRunner<FlakyRig>, _args: &[String]) -> TestOutcome {
    Ok(Verdict::Done)
}

fn test_callbox_dead(_rig: &mut TestRunner<FlakyRig>, _args: &[String]) -> TestOutcome {
    signal::abort_all("callbox unreachable, nothing else can run")
}

#[test]
fn e2e_abort_all_surfaces_partial_results_to_the_harness() {
    init_logging();
    let mut rig = TestRunner::new(FlakyRig, ClassConfig::default());
    rig.register("test_power_ok", test_power_ok);
    rig.register("test_callbox_dead", test_callbox_dead);

    let err = rig
        .run(Some(&["test_power_ok", "test_callbox_dead", "test_power_ok"]))
        .unwrap_err();

    // A harness above records the partial aggregate and stops the run.
    assert!(err.reason.contains("callbox unreachable"));
    assert_eq!(err.results.passed.len(), 1);
    assert_eq!(err.results.skipped.len(), 1);
    assert_eq!(err.results.executed(), 2);
    assert_eq!(err.results.requested.len(), 3);
}
