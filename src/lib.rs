//! testrig — test-class execution engine for hardware-in-the-loop
//! device test suites.
//!
//! A suite is a struct implementing [`runner::class::TestClass`] plus a
//! set of registered test-case functions. A [`runner::engine::TestRunner`]
//! drives the class through its lifecycle (class setup, per-case
//! setup/body/teardown, class teardown), classifies each case's outcome
//! through the [`signal`] vocabulary, and collects one
//! [`record::TestResultRecord`] per executed case into a
//! [`record::aggregate::RunResults`].
//!
//! Device controllers, log-stream setup, and suite CLIs live above or
//! beside this crate; the engine only sees them through the hook trait,
//! the [`runner::device::DeviceLog`] collaborator, and the injected
//! reporter stream.

pub mod config;
pub mod record;
pub mod runner;
pub mod signal;
pub mod util;
