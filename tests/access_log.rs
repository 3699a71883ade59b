//! Access log behaviour under concurrency.

use std::collections::HashSet;
use std::convert::Infallible;

use axum::body::{Body, Bytes};
use axum::http::{Request, Response};
use futures_util::stream;
use query_relay::http::AccessLogLayer;
use query_relay::RelayConfig;
use tower::{service_fn, Layer, ServiceExt};

mod common;

use common::{parse_line, start_relay, CapturedLog};

#[tokio::test]
async fn test_concurrent_requests_log_one_line_each() {
    // 1. Start relay
    let relay = start_relay(RelayConfig::default()).await;
    let client = common::client();

    // 2. Fire requests concurrently
    let total = 100;
    let mut handles = Vec::with_capacity(total);
    for i in 0..total {
        let client = client.clone();
        let url = format!("{}/?n={i}", relay.base_url());
        handles.push(tokio::spawn(async move {
            let response = client.get(url).send().await.unwrap();
            response.bytes().await.unwrap().len()
        }));
    }

    let mut lengths = Vec::with_capacity(total);
    for handle in handles {
        lengths.push(handle.await.unwrap());
    }

    // 3. Exactly one well-formed, unbroken line per request
    let lines = relay.log.wait_for_lines(total).await;
    assert_eq!(lines.len(), total);
    assert!(relay.log.raw().ends_with('\n'));

    let mut seen = HashSet::new();
    for line in &lines {
        let parsed = parse_line(line);
        assert_eq!(parsed.status, 200);
        assert_eq!(parsed.bytes, lengths[0] as u64);
        assert!(parsed.elapsed >= 0.0);
        assert!(seen.insert(parsed.request), "duplicate line: {line}");
    }
    for i in 0..total {
        assert!(seen.contains(&format!("GET /?n={i} HTTP/1.1")), "missing n={i}");
    }
}

#[tokio::test]
async fn test_chunked_bodies_are_counted_per_request() {
    let log = CapturedLog::default();
    let layer = AccessLogLayer::new(log.sink());

    // each handler streams `n` chunks of 16 KiB
    let handler = service_fn(|request: Request<Body>| async move {
        let n: usize = request
            .uri()
            .query()
            .and_then(|q| q.strip_prefix("n="))
            .and_then(|n| n.parse().ok())
            .unwrap_or(0);
        let chunks = (0..n).map(|_| Ok::<_, Infallible>(Bytes::from(vec![b'z'; 16 * 1024])));
        Ok::<_, Infallible>(Response::new(Body::from_stream(stream::iter(chunks))))
    });

    let mut handles = Vec::new();
    for n in 0..20usize {
        let svc = layer.layer(handler);
        handles.push(tokio::spawn(async move {
            let request = Request::builder()
                .uri(format!("/?n={n}"))
                .body(Body::empty())
                .unwrap();
            let response = svc.oneshot(request).await.unwrap();
            axum::body::to_bytes(Body::new(response.into_body()), usize::MAX)
                .await
                .unwrap()
                .len()
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let lines = log.wait_for_lines(20).await;
    assert_eq!(lines.len(), 20);
    for line in &lines {
        let parsed = parse_line(line);
        let n: u64 = parsed
            .request
            .trim_start_matches("GET /?n=")
            .trim_end_matches(" HTTP/1.1")
            .parse()
            .unwrap();
        assert_eq!(parsed.bytes, n * 16 * 1024, "{line}");
        assert_eq!(parsed.ip, "-");
    }
}
