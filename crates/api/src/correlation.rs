//! Correlation ID propagation
//!
//! Every request carries an `X-Correlation-ID`; requests that arrive
//! without one get a fresh UUID. The ID flows through logs, the published
//! event, and back out on the response.

use axum::http::{HeaderMap, HeaderValue};
use loadlab_domain::{constants, new_correlation_id};

/// Read the correlation ID from the request headers, or mint one.
pub fn correlation_id_from(headers: &HeaderMap) -> String {
    headers
        .get(constants::CORRELATION_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(new_correlation_id)
}

/// Stamp the correlation ID onto outgoing response headers.
///
/// IDs that cannot be encoded as a header value are skipped; the body and
/// logs still carry them.
pub fn stamp_correlation(headers: &mut HeaderMap, correlation_id: &str) {
    if let Ok(value) = HeaderValue::from_str(correlation_id) {
        headers.insert(constants::CORRELATION_HEADER, value);
    }
}
