//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method validation, route
//! matching, dispatch, and the headers every response carries.

use crate::config::AppState;
use crate::dataset;
use crate::handler::static_files;
use crate::http::{self, cache::CachePolicy};
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderValue, SERVER};
use hyper::{Method, Request, Response, StatusCode};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

const DATA_PATH: &str = "/api/data";
const PDF_PREFIX: &str = "/pdfs/";

/// Request context encapsulating information needed for request processing
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub is_head: bool,
    pub if_none_match: Option<String>,
    pub range_header: Option<String>,
}

/// Where a request path leads
#[derive(Debug, PartialEq, Eq)]
pub enum Route {
    /// `/api/data`
    Dataset,
    /// `/pdfs/<file>`, decoded path relative to the PDF directory
    Pdf(String),
    /// Anything else, decoded path relative to the frontend directory
    Frontend(String),
    /// Undecodable `/pdfs/` path
    NotFound,
}

impl Route {
    pub fn from_path(path: &str) -> Self {
        if path == DATA_PATH {
            return Self::Dataset;
        }

        if let Some(file) = path.strip_prefix(PDF_PREFIX).filter(|f| !f.is_empty()) {
            return match urlencoding::decode(file) {
                Ok(decoded) => Self::Pdf(decoded.into_owned()),
                Err(_) => Self::NotFound,
            };
        }

        // Undecodable frontend paths can only be client-side routes
        let relative = path.trim_start_matches('/');
        Self::Frontend(
            urlencoding::decode(relative)
                .map(std::borrow::Cow::into_owned)
                .unwrap_or_default(),
        )
    }
}

/// Main entry point for HTTP request handling
///
/// The body is never read, so any body type is accepted.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    remote_addr: Option<SocketAddr>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let access_entry = state
        .config
        .logging
        .access_log
        .then(|| AccessLogEntry::from_request(&req, remote_addr));

    let method_response = check_http_method(req.method(), state.config.http.enable_cors);
    let mut response = match method_response {
        Some(resp) => resp,
        None => {
            let ctx = RequestContext {
                path: req.uri().path(),
                is_head: *req.method() == Method::HEAD,
                if_none_match: header_string(&req, "if-none-match"),
                range_header: header_string(&req, "range"),
            };
            route_request(&ctx, &state).await
        }
    };

    finish_response(&mut response, &state);

    if let Some(mut entry) = access_entry {
        entry.status = response.status().as_u16();
        entry.body_bytes = usize::try_from(response.body().size_hint().exact().unwrap_or(0))
            .unwrap_or(usize::MAX);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

fn header_string<B>(req: &Request<B>, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

/// Return a response for anything other than GET/HEAD
fn check_http_method(method: &Method, enable_cors: bool) -> Option<Response<Full<Bytes>>> {
    match *method {
        Method::GET | Method::HEAD => None,
        Method::OPTIONS => Some(http::build_options_response(enable_cors)),
        _ => {
            logger::log_debug(&format!("Method not allowed: {method}"));
            Some(http::build_405_response())
        }
    }
}

/// Route request based on path
async fn route_request(ctx: &RequestContext<'_>, state: &AppState) -> Response<Full<Bytes>> {
    let route = Route::from_path(ctx.path);
    logger::log_debug(&format!("{} -> {route:?}", ctx.path));

    let policy = CachePolicy::from_max_age(state.config.http.cache_max_age);
    match route {
        Route::Dataset => serve_dataset(ctx, state).await,
        Route::Pdf(file) => {
            static_files::serve_directory(ctx, &state.paths.pdf_dir, &file, policy).await
        }
        Route::Frontend(relative) => {
            static_files::serve_frontend(ctx, &state.paths, &relative, policy).await
        }
        Route::NotFound => http::build_404_response(),
    }
}

/// `/api/data`: the whole dataset as a JSON array, or a 500 with the reason
async fn serve_dataset(ctx: &RequestContext<'_>, state: &AppState) -> Response<Full<Bytes>> {
    match dataset::load_dataset(&state.paths.csv_file).await {
        Ok(rows) => http::build_json_response(StatusCode::OK, &rows, ctx.is_head),
        Err(e) => {
            logger::log_error(&e.to_string());
            http::build_json_error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

/// Headers added to every response
fn finish_response(response: &mut Response<Full<Bytes>>, state: &AppState) {
    if state.config.http.enable_cors {
        http::apply_cors_headers(response);
    }
    if let Ok(name) = HeaderValue::from_str(&state.config.http.server_name) {
        response.headers_mut().insert(SERVER, name);
    }
}
