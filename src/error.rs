//! Per-request errors and how they reach the caller.
//!
//! Every variant is recovered locally: the caller gets a response whose body is
//! the raw error text. Nothing here is fatal to the process.

use std::error::Error;

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::forward::target::TargetError;

/// Failure while relaying a single request.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// `p` did not parse as an absolute URI. Answered with 400.
    #[error(transparent)]
    InvalidTarget(#[from] TargetError),

    /// The outbound request could not be completed. Answered with 500.
    #[error("{}", error_chain(.0))]
    Dispatch(#[from] hyper_util::client::legacy::Error),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::InvalidTarget(_) => StatusCode::BAD_REQUEST,
            RelayError::Dispatch(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        (
            self.status(),
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.to_string(),
        )
            .into_response()
    }
}

/// Render an error followed by each of its sources, `": "`-separated.
pub fn error_chain(err: &(dyn Error + 'static)) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}
