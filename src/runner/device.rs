//! Device-log collaborator boundary.

use std::io;
use std::path::{Path, PathBuf};

/// A source of device logs the engine can pull a time-bounded excerpt
/// from when a case fails (an ADB logcat stream, a callbox event log).
///
/// `begin` and `end` are sortable text timestamps in the
/// [`crate::util::time::log_line_timestamp`] format; implementations
/// filter their stream to that window and write the excerpt under
/// `dest_dir`, returning the path they wrote.
pub trait DeviceLog {
    /// Identifier of the device this log belongs to (e.g. a serial).
    fn device_tag(&self) -> &str;

    /// Write a filtered excerpt for `test_name` covering `begin..end`.
    ///
    /// # Errors
    ///
    /// Returns any I/O error from reading the stream or writing the
    /// excerpt file. The engine logs such errors and moves on.
    fn excerpt(
        &self,
        test_name: &str,
        begin: &str,
        end: &str,
        dest_dir: &Path,
    ) -> io::Result<PathBuf>;
}
