//! Target extraction and validation.
//!
//! The target arrives URL-encoded in query parameter `p` and must be an
//! absolute URI with both a scheme and a host.

use std::fmt;

use axum::http::uri::InvalidUri;
use axum::http::Uri;
use url::Url;

/// Query parameter that carries the target.
pub const TARGET_PARAM: &str = "p";

/// Why `p` was rejected. The display text is sent verbatim as the 400 body.
#[derive(Debug, thiserror::Error)]
pub enum TargetError {
    #[error("parse {input:?}: {source}")]
    Malformed {
        input: String,
        source: url::ParseError,
    },
    #[error("parse {input:?}: missing scheme or host")]
    NotAbsolute { input: String },
    #[error("parse {input:?}: leading or trailing space or control character")]
    Untrimmed { input: String },
    #[error("parse {input:?}: {source}")]
    Unrepresentable { input: String, source: InvalidUri },
}

/// A validated forward target.
#[derive(Debug, Clone)]
pub struct Target {
    raw: String,
    uri: Uri,
    host: String,
}

impl Target {
    /// The value of `p` exactly as received (after URL decoding).
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Absolute URI the outbound request is sent to.
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Value for the outbound `Host` header.
    pub fn host(&self) -> &str {
        &self.host
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// First value of `p` in the query string. An empty value counts as absent.
pub fn extract_target(uri: &Uri) -> Option<String> {
    let query = uri.query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == TARGET_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

/// Parse `raw` as an absolute URI.
///
/// The URL parser silently strips surrounding spaces and C0 controls; such
/// input is rejected instead of being repaired.
pub fn parse_target(raw: &str) -> Result<Target, TargetError> {
    if raw.trim_matches(|c: char| c <= ' ') != raw {
        return Err(TargetError::Untrimmed {
            input: raw.to_string(),
        });
    }

    let mut url = Url::parse(raw).map_err(|source| TargetError::Malformed {
        input: raw.to_string(),
        source,
    })?;

    let host = match url.host_str() {
        Some(host) if !host.is_empty() => host.to_string(),
        _ => {
            return Err(TargetError::NotAbsolute {
                input: raw.to_string(),
            })
        }
    };
    let host = match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host,
    };

    // fragments never go on the wire
    url.set_fragment(None);
    let uri = url
        .as_str()
        .parse::<Uri>()
        .map_err(|source| TargetError::Unrepresentable {
            input: raw.to_string(),
            source,
        })?;

    Ok(Target {
        raw: raw.to_string(),
        uri,
        host,
    })
}
