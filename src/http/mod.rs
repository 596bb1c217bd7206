//! HTTP protocol layer module
//!
//! Protocol helpers shared by the route handlers, independent of what is served.

pub mod cache;
pub mod cors;
pub mod mime;
pub mod range;
pub mod response;

// Re-export commonly used items
pub use cors::apply_cors_headers;
pub use range::{parse_range_header, RangeOutcome};
pub use response::{
    build_304_response, build_404_response, build_405_response, build_416_response,
    build_json_error, build_json_response, build_options_response,
};
