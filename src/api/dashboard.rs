// Record book dashboard - Web UI over the record API

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};

use crate::logger;

/// Serve the record book HTML page
pub fn serve_dashboard() -> Response<Full<Bytes>> {
    let html = include_str!("dashboard.html");

    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "text/html; charset=utf-8")
        .header("Cache-Control", "no-cache")
        .body(Full::new(Bytes::from(html)))
        .unwrap_or_else(|e| {
            logger::log_error(&format!("Failed to build dashboard response: {e}"));
            Response::new(Full::new(Bytes::new()))
        })
}
