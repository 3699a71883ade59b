//! Outbound header construction.

use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};

use crate::config::MultiValueHeaders;
use crate::forward::target::Target;

/// Copy inbound headers for the outbound request.
///
/// `Host` is replaced by the target's host. Headers with a single value are
/// copied as-is; headers with several values follow `policy`.
pub fn build_outbound_headers(
    inbound: &HeaderMap,
    target: &Target,
    policy: MultiValueHeaders,
) -> HeaderMap {
    let mut outbound = HeaderMap::with_capacity(inbound.keys_len());

    for name in inbound.keys() {
        if name == header::HOST {
            continue;
        }
        let values: Vec<&HeaderValue> = inbound.get_all(name).iter().collect();

        match (policy, values.as_slice()) {
            (_, [single]) => {
                outbound.insert(name.clone(), (*single).clone());
            }
            (MultiValueHeaders::Join, many) => match join_values(name, many) {
                Some(joined) => {
                    outbound.insert(name.clone(), joined);
                }
                None => append_all(&mut outbound, name, many),
            },
            (MultiValueHeaders::Preserve, many) => append_all(&mut outbound, name, many),
        }
    }

    match HeaderValue::from_str(target.host()) {
        Ok(host) => {
            outbound.insert(header::HOST, host);
        }
        Err(e) => {
            tracing::debug!(host = %target.host(), error = %e, "Target host is not a valid header value");
        }
    }

    outbound
}

fn append_all(outbound: &mut HeaderMap, name: &HeaderName, values: &[&HeaderValue]) {
    for value in values {
        outbound.append(name.clone(), (*value).clone());
    }
}

/// `cookie` pairs are `; `-separated; everything else uses the list syntax.
fn join_values(name: &HeaderName, values: &[&HeaderValue]) -> Option<HeaderValue> {
    let separator: &[u8] = if name == header::COOKIE { b"; " } else { b", " };

    let mut joined = Vec::new();
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            joined.extend_from_slice(separator);
        }
        joined.extend_from_slice(value.as_bytes());
    }
    HeaderValue::from_bytes(&joined).ok()
}
