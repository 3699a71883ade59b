//! Request forwarding.
//!
//! # Flow
//! ```text
//! inbound request
//!     → extract `p`            (absent → greeting page)
//!     → parse target           (invalid → 400, error text as body)
//!     → build outbound request (method, headers, body stream; HTTP/1.1)
//!     → dispatch via shared client (failure → 500, error text as body)
//!     → banner line + outbound body streamed back
//! ```
//!
//! The outbound status is not copied onto the relayed response unless
//! `forward.propagate_status` is set.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{header, HeaderValue, Request, StatusCode, Version};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures_util::{future, stream, Stream, StreamExt};
use hyper::body::Incoming;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;

use crate::config::{ForwardConfig, MultiValueHeaders};
use crate::error::RelayError;
use crate::forward::headers::build_outbound_headers;
use crate::forward::target::{extract_target, parse_target, Target};
use crate::http::greeting::greeting;

/// Outbound client shared by every request.
pub type HttpClient = Client<HttpConnector, Body>;

/// Build the process-wide outbound client. Clones share one connection pool.
pub fn build_client() -> HttpClient {
    Client::builder(TokioExecutor::new()).build(HttpConnector::new())
}

/// Relays inbound requests to the target named in `p`.
#[derive(Clone)]
pub struct Forwarder {
    client: HttpClient,
    propagate_status: bool,
    multi_value_headers: MultiValueHeaders,
}

impl Forwarder {
    pub fn new(client: HttpClient, config: &ForwardConfig) -> Self {
        Self {
            client,
            propagate_status: config.propagate_status,
            multi_value_headers: config.multi_value_headers,
        }
    }

    /// Handle one inbound request. Always produces a response.
    pub async fn handle(&self, request: Request<Body>, remote: Option<SocketAddr>) -> Response {
        let Some(raw) = extract_target(request.uri()) else {
            return greeting();
        };

        match self.forward(&raw, request, remote).await {
            Ok(response) => response,
            Err(e) => e.into_response(),
        }
    }

    async fn forward(
        &self,
        raw: &str,
        request: Request<Body>,
        remote: Option<SocketAddr>,
    ) -> Result<Response, RelayError> {
        let target = parse_target(raw)?;

        tracing::info!(
            host = request
                .headers()
                .get(header::HOST)
                .and_then(|h| h.to_str().ok())
                .unwrap_or(""),
            uri = %request.uri(),
            remote_addr = ?remote,
            "Relaying request"
        );

        let method = request.method().clone();
        let outbound = self.build_outbound(request, &target);
        tracing::debug!(target = %target, headers = ?outbound.headers(), "Outbound request");

        let start = Instant::now();
        let result = self.client.request(outbound).await;
        let latency = start.elapsed();

        let response = result.map_err(|e| {
            let err = RelayError::from(e);
            tracing::warn!(method = %method, target = %target, error = %err, "Dispatch failed");
            err
        })?;

        tracing::info!(
            method = %method,
            target = %target,
            status = %response.status(),
            latency_ms = latency.as_millis() as u64,
            "Remote response"
        );

        Ok(self.relay_response(response, &target, latency))
    }

    fn build_outbound(&self, request: Request<Body>, target: &Target) -> Request<Body> {
        let (parts, body) = request.into_parts();

        // the body is moved, not buffered: it can be read exactly once
        let mut outbound = Request::new(body);
        *outbound.method_mut() = parts.method;
        *outbound.uri_mut() = target.uri().clone();
        *outbound.version_mut() = Version::HTTP_11;
        *outbound.headers_mut() =
            build_outbound_headers(&parts.headers, target, self.multi_value_headers);
        outbound
    }

    fn relay_response(
        &self,
        response: Response<Incoming>,
        target: &Target,
        latency: Duration,
    ) -> Response {
        let status = response.status();
        let banner = Bytes::from(banner(latency, status, target.raw()));
        let upstream = Body::new(response.into_body()).into_data_stream();

        let relayed = stream::once(future::ready(Ok::<_, axum::Error>(banner)))
            .chain(truncate_on_error(upstream, target.raw().to_string()));

        let mut relayed = Response::new(Body::from_stream(relayed));
        relayed.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/html; charset=utf-8"),
        );
        if self.propagate_status {
            *relayed.status_mut() = status;
        }
        relayed
    }
}

/// HTML line written ahead of the relayed body.
pub fn banner(latency: Duration, status: StatusCode, target: &str) -> String {
    format!(
        "<h1>{}ms {} - Response from '{}' </h1><br>\r\n",
        latency.as_millis(),
        status_line(status),
        target
    )
}

/// `"200 OK"`, or just the code when there is no canonical reason.
fn status_line(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {}", status.as_str(), reason),
        None => status.as_str().to_string(),
    }
}

/// End the stream at the first read error instead of failing the response.
fn truncate_on_error<S>(
    upstream: S,
    target: String,
) -> impl Stream<Item = Result<Bytes, axum::Error>> + Send
where
    S: Stream<Item = Result<Bytes, axum::Error>> + Send,
{
    upstream.take_while(move |chunk| {
        if let Err(e) = chunk {
            tracing::warn!(target = %target, error = %e, "Upstream body read failed, truncating");
        }
        future::ready(chunk.is_ok())
    })
}
