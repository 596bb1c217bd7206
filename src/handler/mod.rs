//! Request handler module
//!
//! Routes requests to the dataset endpoint, the PDF directory, or the
//! frontend bundle.

pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;
