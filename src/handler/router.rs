//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: preflight and body-size checks,
//! route matching, CORS and access logging.

use crate::config::AppState;
use crate::handler::{buffers, editor_config, execute, folder, log_stream, static_files};
use crate::http::{self, HttpResponse};
use crate::logger::{self, AccessLogEntry};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::{Method, Request};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

const ALLOW_POST: &str = "POST, OPTIONS";
const ALLOW_GET: &str = "GET, HEAD, OPTIONS";

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Request information needed by static file handling
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub is_head: bool,
    pub if_none_match: Option<String>,
}

/// Routes with a fixed path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Save,
    OpenFolder,
    Execute,
    Log,
    Config,
    SaveConfig,
    TextFiles,
    Static,
}

impl Route {
    fn from_path(path: &str) -> Self {
        match path {
            "/save" => Self::Save,
            "/open_folder" => Self::OpenFolder,
            "/execute" => Self::Execute,
            "/log" => Self::Log,
            "/config" => Self::Config,
            "/save_config" => Self::SaveConfig,
            "/text_files" => Self::TextFiles,
            _ => Self::Static,
        }
    }

    /// Routes answered only for POST
    const fn is_post(self) -> bool {
        matches!(
            self,
            Self::Save | Self::OpenFolder | Self::Execute | Self::SaveConfig
        )
    }

    const fn allowed_methods(self) -> &'static str {
        if self.is_post() {
            ALLOW_POST
        } else {
            ALLOW_GET
        }
    }

    fn accepts(self, method: &Method) -> bool {
        if self.is_post() {
            method == Method::POST
        } else {
            method == Method::GET || method == Method::HEAD
        }
    }
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<HttpResponse, Infallible>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    let started = Instant::now();
    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = http_version(req.version()).to_string();
    entry.user_agent = header_string(&req, "user-agent");

    let mut response = http::with_server_name(
        dispatch(req, &state).await,
        &state.config.http.server_name,
    );
    if state.config.http.enable_cors {
        response = http::allow_any_origin(response);
    }

    if state.config.logging.access_log {
        entry.status = response.status().as_u16();
        entry.body_bytes = response
            .headers()
            .get("content-length")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }
    Ok(response)
}

async fn dispatch<B>(req: Request<B>, state: &AppState) -> HttpResponse
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    let method = req.method().clone();
    if method == Method::OPTIONS {
        return http::build_options_response(state.config.http.enable_cors);
    }

    let route = Route::from_path(req.uri().path());
    if !route.accepts(&method) {
        logger::log_warning(&format!("Method not allowed: {method} {}", req.uri().path()));
        return http::build_405_response(route.allowed_methods());
    }

    if let Some(resp) = check_body_size(&req, state.config.http.max_body_size) {
        return resp;
    }

    match route {
        Route::Save | Route::Execute | Route::SaveConfig => {
            let body = match read_body(req, state.config.http.max_body_size).await {
                Ok(b) => b,
                Err(resp) => return resp,
            };
            match route {
                Route::Save => buffers::save_buffers(state, &body).await,
                Route::Execute => execute::execute(state, &body).await,
                _ => editor_config::save_config(state, &body).await,
            }
        }
        Route::OpenFolder => folder::open_folder(state),
        Route::Log => log_stream::stream_log(state).await,
        Route::Config => editor_config::get_config(state).await,
        Route::TextFiles => buffers::text_files(state).await,
        Route::Static => {
            let ctx = RequestContext {
                path: req.uri().path(),
                is_head: method == Method::HEAD,
                if_none_match: header_string(&req, "if-none-match"),
            };
            static_files::serve_static(&ctx, &state.static_dir).await
        }
    }
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size<B>(req: &Request<B>, max_body_size: u64) -> Option<HttpResponse> {
    let content_length = req.headers().get("content-length")?;
    match content_length.to_str().ok()?.parse::<u64>() {
        Ok(size) if size > max_body_size => {
            logger::log_error(&format!(
                "Request body too large: {size} bytes (max: {max_body_size})"
            ));
            Some(http::build_413_response())
        }
        _ => None,
    }
}

/// Collect the request body, enforcing the size limit while reading
async fn read_body<B>(req: Request<B>, max_body_size: u64) -> Result<Bytes, HttpResponse>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    match Limited::new(req.into_body(), limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            logger::log_error(&format!("Request body exceeded {max_body_size} bytes"));
            Err(http::build_413_response())
        }
        Err(e) => {
            // Handlers decide how an unreadable body is reported
            logger::log_warning(&format!("Failed to read request body: {e}"));
            Ok(Bytes::new())
        }
    }
}

fn header_string<B>(req: &Request<B>, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

fn http_version(version: hyper::Version) -> &'static str {
    match version {
        hyper::Version::HTTP_10 => "1.0",
        hyper::Version::HTTP_2 => "2",
        _ => "1.1",
    }
}
