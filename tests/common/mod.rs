//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::io::{self, Write};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::Router;
use query_relay::{AccessLogSink, RelayConfig, RelayServer, Shutdown};
use tokio::net::TcpListener;

/// In-memory access log output.
#[derive(Clone, Default)]
pub struct CapturedLog(Arc<Mutex<Vec<u8>>>);

impl CapturedLog {
    pub fn sink(&self) -> AccessLogSink {
        AccessLogSink::new(self.clone())
    }

    pub fn raw(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }

    pub fn lines(&self) -> Vec<String> {
        self.raw().lines().map(str::to_string).collect()
    }

    /// Wait until at least `n` lines were written, then give stragglers a
    /// moment so over-emission would show up too.
    pub async fn wait_for_lines(&self, n: usize) -> Vec<String> {
        let deadline = Instant::now() + Duration::from_secs(5);
        while self.lines().len() < n {
            assert!(
                Instant::now() < deadline,
                "timed out waiting for {n} log lines, got {:?}",
                self.lines()
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        self.lines()
    }
}

impl Write for CapturedLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Fields of one access log line.
#[derive(Debug, Clone, PartialEq)]
pub struct LogLine {
    pub ip: String,
    pub timestamp: String,
    pub request: String,
    pub status: u16,
    pub bytes: u64,
    pub elapsed: f64,
}

/// Parse `IP - - [TS] "REQ" STATUS BYTES ELAPSED`, panicking on any deviation.
pub fn parse_line(line: &str) -> LogLine {
    let (ip, rest) = line.split_once(" - - [").unwrap_or_else(|| panic!("bad prefix: {line}"));
    let (timestamp, rest) = rest.split_once("] \"").unwrap_or_else(|| panic!("bad timestamp: {line}"));
    let (request, rest) = rest.rsplit_once("\" ").unwrap_or_else(|| panic!("bad request: {line}"));

    let fields: Vec<&str> = rest.split(' ').collect();
    assert_eq!(fields.len(), 3, "bad trailer: {line}");

    LogLine {
        ip: ip.to_string(),
        timestamp: timestamp.to_string(),
        request: request.to_string(),
        status: fields[0].parse().unwrap(),
        bytes: fields[1].parse().unwrap(),
        elapsed: fields[2].parse().unwrap(),
    }
}

/// Start an axum app on an ephemeral port.
pub async fn start_backend(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// A relay running on an ephemeral port. Stops when dropped.
pub struct RunningRelay {
    pub addr: SocketAddr,
    pub log: CapturedLog,
    _shutdown: Shutdown,
}

impl RunningRelay {
    /// Relay URL whose `p` is `target`, URL-encoded.
    pub fn url_for(&self, target: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(target.as_bytes()).collect();
        format!("http://{}/?p={}", self.addr, encoded)
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

pub async fn start_relay(config: RelayConfig) -> RunningRelay {
    let log = CapturedLog::default();
    let server = RelayServer::new(&config, log.sink());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    RunningRelay {
        addr,
        log,
        _shutdown: shutdown,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
