// API module entry
// Maps (verb, path) pairs onto record store operations

mod dashboard;
mod handlers;
mod query;
mod response;

use http_body_util::BodyExt;
use http_body_util::Full;
use hyper::body::{Body as _, Bytes, Incoming};
use hyper::header::{HeaderValue, SERVER};
use hyper::{Method, Request, Response, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use crate::config::AppState;
use crate::logger::{self, AccessLogEntry};

/// Recognized (verb, path) combinations
#[derive(Debug, PartialEq, Eq)]
enum Route {
    Dashboard,
    List,
    Create,
    Get(String),
    Update(String),
    Delete(String),
    NotFound,
}

/// Map a verb and path onto a route
///
/// Path segmentation ignores empty segments, so a trailing slash does not
/// change the route. Anything unmatched is `NotFound`.
fn recognize(method: &Method, path: &str) -> Route {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    match (method.clone(), segments.as_slice()) {
        (Method::GET, []) => Route::Dashboard,
        (Method::GET, ["records"]) => Route::List,
        (Method::POST, ["records"]) => Route::Create,
        (Method::GET, ["records", id]) => Route::Get((*id).to_string()),
        (Method::PUT, ["records", id]) => Route::Update((*id).to_string()),
        (Method::DELETE, ["records", id]) => Route::Delete((*id).to_string()),
        _ => Route::NotFound,
    }
}

/// Main entry point for request handling
///
/// Dispatches to the record handlers, stamps the Server (and, when
/// enabled, CORS) headers, and emits one access log entry per request.
pub async fn handle_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();

    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let raw_query = req.uri().query().map(ToString::to_string);
    let http_version = version_label(req.version()).to_string();
    let referer = header_text(&req, "referer");
    let user_agent = header_text(&req, "user-agent");

    let mut response = process(req, &state, &method, &path, raw_query.as_deref()).await;

    if let Ok(value) = HeaderValue::from_str(&state.config.http.server_name) {
        response.headers_mut().insert(SERVER, value);
    }
    if state.config.http.enable_cors {
        response
            .headers_mut()
            .insert("Access-Control-Allow-Origin", HeaderValue::from_static("*"));
    }

    if state.cached_access_log.load(Ordering::Relaxed) {
        let entry = AccessLogEntry {
            remote_addr: peer_addr.ip().to_string(),
            time: chrono::Local::now(),
            method: method.to_string(),
            path,
            query: raw_query,
            http_version,
            status: response.status().as_u16(),
            body_bytes: response
                .body()
                .size_hint()
                .exact()
                .and_then(|n| usize::try_from(n).ok())
                .unwrap_or(0),
            referer,
            user_agent,
            request_time_us: u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX),
        };
        logger::log_access(&entry, &state.access_log_format);
    }

    Ok(response)
}

/// Validate the request shape and dispatch to a handler
async fn process(
    req: Request<Incoming>,
    state: &AppState,
    method: &Method,
    path: &str,
    raw_query: Option<&str>,
) -> Response<Full<Bytes>> {
    // 1. Content-Length guard before touching the body
    if let Some(resp) = check_body_size(&req, state.config.http.max_body_size) {
        return resp;
    }

    // 2. Preflight requests are answered directly
    if *method == Method::OPTIONS {
        return response::preflight(state.config.http.enable_cors);
    }

    // 3. Health probes (configurable paths, highest priority)
    let health = &state.config.health;
    if health.enabled
        && *method == Method::GET
        && (path == health.liveness_path || path == health.readiness_path)
    {
        return response::health_ok();
    }

    // 4. Record routes
    match recognize(method, path) {
        Route::Dashboard => dashboard::serve_dashboard(),
        Route::List => handlers::handle_list(state, raw_query),
        Route::Get(id) => handlers::handle_get(state, &id),
        Route::Delete(id) => handlers::handle_delete(state, &id),
        Route::Create => match read_body(req, state.config.http.max_body_size).await {
            Ok(body) => handlers::handle_create(state, &body),
            Err(resp) => *resp,
        },
        Route::Update(id) => match read_body(req, state.config.http.max_body_size).await {
            Ok(body) => handlers::handle_update(state, &id, &body),
            Err(resp) => *resp,
        },
        Route::NotFound => response::route_not_found(method, path),
    }
}

/// Collect the request body, enforcing the configured size limit on the
/// bytes actually received (the Content-Length guard only sees declared
/// sizes)
async fn read_body(
    req: Request<Incoming>,
    max_body_size: u64,
) -> Result<Bytes, Box<Response<Full<Bytes>>>> {
    match req.into_body().collect().await {
        Ok(collected) => {
            let bytes = collected.to_bytes();
            if bytes.len() as u64 > max_body_size {
                logger::log_warning(&format!(
                    "Request body too large: {} bytes (max: {max_body_size})",
                    bytes.len()
                ));
                return Err(Box::new(response::payload_too_large(max_body_size)));
            }
            Ok(bytes)
        }
        Err(e) => Err(Box::new(response::bad_request(&format!(
            "failed to read request body: {e}"
        )))),
    }
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size(
    req: &Request<Incoming>,
    max_body_size: u64,
) -> Option<Response<Full<Bytes>>> {
    let content_length = req.headers().get("content-length")?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_warning(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(response::payload_too_large(max_body_size))
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', skipping size check"
                ));
                None
            }
            _ => None,
        },
    )
}

fn header_text(req: &Request<Incoming>, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}
