//! Access log records and the shared output they are written to.
//!
//! One line per request in the Apache-common-inspired layout consumed by
//! existing log tooling:
//!
//! ```text
//! 203.0.113.5 - - [02/Jan/2006 15:04:05 +0000] "GET /?p=... HTTP/1.1" 200 512 0.012345
//! ```
//!
//! Field order and punctuation are fixed.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::config::{AccessLogConfig, AccessLogOutput};

/// `strftime` layout for the bracketed timestamp.
pub const TIMESTAMP_FORMAT: &str = "%d/%b/%Y %H:%M:%S %z";

/// Everything logged about a single request.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessLogRecord {
    /// Client IP with the port suffix removed.
    pub ip: String,
    /// Completion time.
    pub time: DateTime<Utc>,
    pub method: String,
    pub uri: String,
    pub protocol: String,
    /// Final status code (200 unless the handler set one).
    pub status: u16,
    /// Bytes written to the response body.
    pub response_bytes: u64,
    pub elapsed: Duration,
}

impl AccessLogRecord {
    /// Start a record with status 200, zero bytes and zero elapsed time.
    pub fn new(
        ip: impl Into<String>,
        method: impl Into<String>,
        uri: impl Into<String>,
        protocol: impl Into<String>,
    ) -> Self {
        Self {
            ip: ip.into(),
            time: DateTime::default(),
            method: method.into(),
            uri: uri.into(),
            protocol: protocol.into(),
            status: 200,
            response_bytes: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// Render the record as one newline-terminated line.
    pub fn format_line(&self) -> String {
        format!(
            "{} - - [{}] \"{} {} {}\" {} {} {:.6}\n",
            self.ip,
            self.time.format(TIMESTAMP_FORMAT),
            self.method,
            self.uri,
            self.protocol,
            self.status,
            self.response_bytes,
            self.elapsed.as_secs_f64(),
        )
    }
}

/// Strip a trailing `:port` from a peer address.
///
/// Splits on the last colon; an address without one is returned unchanged.
pub fn client_ip(remote: &str) -> &str {
    match remote.rfind(':') {
        Some(colon) => &remote[..colon],
        None => remote,
    }
}

/// Cloneable handle to the access log output.
///
/// Writes are serialized: every line is formatted up front and written with a
/// single `write_all` while the lock is held, so concurrent requests never
/// interleave partial lines.
#[derive(Clone)]
pub struct AccessLogSink {
    out: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl AccessLogSink {
    /// Wrap an arbitrary writer.
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            out: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }

    /// Discards every record.
    pub fn disabled() -> Self {
        Self::new(io::sink())
    }

    /// Sink selected by the `[access_log]` section.
    pub fn from_config(config: &AccessLogConfig) -> Self {
        match (config.enabled, config.output) {
            (false, _) => Self::disabled(),
            (true, AccessLogOutput::Stdout) => Self::stdout(),
            (true, AccessLogOutput::Stderr) => Self::stderr(),
        }
    }

    /// Write one record. Output failures are reported through `tracing` and
    /// otherwise ignored.
    pub fn emit(&self, record: &AccessLogRecord) {
        let line = record.format_line();
        let mut out = match self.out.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = out.write_all(line.as_bytes()).and_then(|_| out.flush()) {
            tracing::warn!(error = %e, "Failed to write access log line");
        }
    }
}

impl std::fmt::Debug for AccessLogSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessLogSink").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn fixed_record() -> AccessLogRecord {
        let mut record = AccessLogRecord::new(
            client_ip("203.0.113.5:54321"),
            "GET",
            "/?p=http%3A%2F%2Fexample.test%2Fok",
            "HTTP/1.1",
        );
        record.time = Utc.with_ymd_and_hms(2024, 3, 7, 16, 5, 9).unwrap();
        record.response_bytes = 1234;
        record.elapsed = Duration::from_micros(12_345);
        record
    }

    #[test]
    fn formats_fixed_clock_line_exactly() {
        assert_eq!(
            fixed_record().format_line(),
            "203.0.113.5 - - [07/Mar/2024 16:05:09 +0000] \
             \"GET /?p=http%3A%2F%2Fexample.test%2Fok HTTP/1.1\" 200 1234 0.012345\n"
        );
    }

    #[test]
    fn new_record_defaults() {
        let record = AccessLogRecord::new("10.0.0.1", "POST", "/", "HTTP/1.0");
        assert_eq!(record.status, 200);
        assert_eq!(record.response_bytes, 0);
        assert_eq!(record.elapsed, Duration::ZERO);
    }

    #[test]
    fn client_ip_strips_last_colon_segment() {
        assert_eq!(client_ip("203.0.113.5:54321"), "203.0.113.5");
        assert_eq!(client_ip("[::1]:8080"), "[::1]");
        assert_eq!(client_ip("localhost"), "localhost");
        assert_eq!(client_ip(""), "");
    }

    #[test]
    fn sink_writes_whole_lines() {
        let buffer = Buffer::default();
        let sink = AccessLogSink::new(buffer.clone());

        sink.emit(&fixed_record());
        sink.clone().emit(&fixed_record());

        let written = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        let lines: Vec<_> = written.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| l.starts_with("203.0.113.5 - - [")));
    }
}
