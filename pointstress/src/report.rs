//! The append-only run report: one text line per event.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

/// Append-only text report shared by all workers and the sampler.
///
/// Writes are serialized through an internal mutex, so lines from
/// concurrent workers never interleave. Write failures are logged and
/// swallowed; a broken report must not take down the run.
#[derive(Debug)]
pub struct Report {
    writer: Mutex<BufWriter<File>>,
}

impl Report {
    /// Opens (or creates) the report file in append mode.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().append(true).create(true).open(path)?;
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    /// Appends one timestamped event line.
    pub fn line(&self, message: fmt::Arguments<'_>) {
        let now = humantime::format_rfc3339_seconds(SystemTime::now());
        let mut writer = self.writer.lock().unwrap();
        if let Err(err) = writeln!(writer, "{now} {message}") {
            tracing::error!(error = %err, "failed to append to report");
        }
    }

    /// Appends one measurement line for a state probe.
    ///
    /// `point` is the raw response rendering, recorded as-is even
    /// when the probe did not answer with a parsable balance.
    pub fn measurement(&self, count: u64, status: u16, point: &str, elapsed: Duration) {
        let now = humantime::format_rfc3339_seconds(SystemTime::now());
        self.line(format_args!(
            "measure: count: {count}, status: {status}, point: {point}, time: {}ms, {now}",
            elapsed.as_millis()
        ));
    }

    /// Flushes buffered lines to disk.
    pub fn flush(&self) {
        if let Err(err) = self.writer.lock().unwrap().flush() {
            tracing::error!(error = %err, "failed to flush report");
        }
    }
}
