//! Access logging middleware.
//!
//! Wraps any `Service<Request<_>, Response = Response<_>>` without the inner
//! service's cooperation:
//!
//! - the status is read off the response the inner service returns (200 if it
//!   never set one)
//! - the response body is replaced by [`CountingBody`], which forwards every
//!   frame untouched and adds data-frame lengths to the record
//! - the record is emitted once the body has been fully streamed, has failed,
//!   or has been dropped (client went away), whichever happens first
//!
//! If the inner future is dropped before it produces a response the record is
//! still emitted, with the default status and zero bytes. An inner service
//! error is logged as 500.

use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use std::time::Instant;

use axum::extract::ConnectInfo;
use axum::http::{Request, Response};
use bytes::Buf;
use chrono::Utc;
use http_body::{Body, Frame, SizeHint};
use pin_project_lite::pin_project;
use tower::{Layer, Service};

use crate::observability::access_log::{client_ip, AccessLogRecord, AccessLogSink};

/// Layer that applies [`AccessLogService`].
#[derive(Debug, Clone)]
pub struct AccessLogLayer {
    sink: AccessLogSink,
}

impl AccessLogLayer {
    pub fn new(sink: AccessLogSink) -> Self {
        Self { sink }
    }
}

impl<S> Layer<S> for AccessLogLayer {
    type Service = AccessLogService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AccessLogService {
            inner,
            sink: self.sink.clone(),
        }
    }
}

/// Service produced by [`AccessLogLayer`].
#[derive(Debug, Clone)]
pub struct AccessLogService<S> {
    inner: S,
    sink: AccessLogSink,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for AccessLogService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    ResBody: Body,
{
    type Response = Response<CountingBody<ResBody>>;
    type Error = S::Error;
    type Future = ResponseFuture<S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<ReqBody>) -> Self::Future {
        let remote = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.to_string());
        let ip = remote.as_deref().map(client_ip).unwrap_or("-");

        let record = AccessLogRecord::new(
            ip,
            request.method().as_str(),
            request.uri().to_string(),
            format!("{:?}", request.version()),
        );
        let pending = PendingRecord {
            record,
            sink: self.sink.clone(),
            start: Instant::now(),
        };

        ResponseFuture {
            inner: self.inner.call(request),
            pending: Some(pending),
        }
    }
}

/// A record being filled in. Emits itself when dropped.
struct PendingRecord {
    record: AccessLogRecord,
    sink: AccessLogSink,
    start: Instant,
}

impl Drop for PendingRecord {
    fn drop(&mut self) {
        self.record.elapsed = self.start.elapsed();
        self.record.time = Utc::now();
        self.sink.emit(&self.record);
    }
}

pin_project! {
    /// Response future for [`AccessLogService`].
    pub struct ResponseFuture<F> {
        #[pin]
        inner: F,
        pending: Option<PendingRecord>,
    }
}

impl<F, B, E> Future for ResponseFuture<F>
where
    F: Future<Output = Result<Response<B>, E>>,
{
    type Output = Result<Response<CountingBody<B>>, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let result = ready!(this.inner.poll(cx));
        let mut pending = this.pending.take();

        match result {
            Ok(response) => {
                let (parts, body) = response.into_parts();
                if let Some(pending) = pending.as_mut() {
                    pending.record.status = parts.status.as_u16();
                }
                let body = CountingBody {
                    inner: body,
                    pending,
                };
                Poll::Ready(Ok(Response::from_parts(parts, body)))
            }
            Err(e) => {
                if let Some(pending) = pending.as_mut() {
                    pending.record.status = 500;
                }
                Poll::Ready(Err(e))
            }
        }
    }
}

pin_project! {
    /// Response body that counts the bytes passing through it.
    pub struct CountingBody<B> {
        #[pin]
        inner: B,
        pending: Option<PendingRecord>,
    }
}

impl<B> Body for CountingBody<B>
where
    B: Body,
{
    type Data = B::Data;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.project();
        let polled = ready!(this.inner.poll_frame(cx));

        match &polled {
            Some(Ok(frame)) => {
                if let (Some(data), Some(pending)) = (frame.data_ref(), this.pending.as_mut()) {
                    pending.record.response_bytes += data.remaining() as u64;
                }
            }
            // end of stream or a failed read: the record is final
            Some(Err(_)) | None => {
                this.pending.take();
            }
        }

        Poll::Ready(polled)
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}
