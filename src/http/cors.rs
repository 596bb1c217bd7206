//! Cross-origin headers
//!
//! Every route is readable from any origin.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{
    HeaderValue, ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_EXPOSE_HEADERS,
};
use hyper::Response;

/// Headers answered to a preflight request
pub const PREFLIGHT_HEADERS: [(&str, &str); 4] = [
    ("access-control-allow-origin", "*"),
    ("access-control-allow-methods", "GET, HEAD, OPTIONS"),
    ("access-control-allow-headers", "Content-Type, Range, If-None-Match"),
    ("access-control-max-age", "86400"),
];

/// Range responses need these visible to cross-origin PDF viewers
const EXPOSED_HEADERS: &str = "Content-Length, Content-Range, Accept-Ranges, ETag";

/// Add the simple-request CORS headers to a response
pub fn apply_cors_headers(response: &mut Response<Full<Bytes>>) {
    let headers = response.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_EXPOSE_HEADERS,
        HeaderValue::from_static(EXPOSED_HEADERS),
    );
}
