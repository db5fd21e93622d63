//! Static file serving module
//!
//! Serves the built editor client. Any path that is not a file inside the
//! static directory falls back to `index.html`, so client-side routes load
//! the app.

use crate::handler::router::RequestContext;
use crate::http::{self, cache, mime, HttpResponse};
use crate::logger;
use hyper::body::Bytes;
use std::path::{Path, PathBuf};
use tokio::fs;

pub const INDEX_FILE: &str = "index.html";

pub async fn serve_static(ctx: &RequestContext<'_>, static_dir: &Path) -> HttpResponse {
    let resolved = match urlencoding::decode(ctx.path) {
        Ok(decoded) => resolve_in_dir(static_dir, decoded.trim_start_matches('/')).await,
        Err(e) => {
            logger::log_warning(&format!("Undecodable request path {}: {e}", ctx.path));
            None
        }
    };
    let file = resolved.unwrap_or_else(|| static_dir.join(INDEX_FILE));

    let content = match fs::read(&file).await {
        Ok(c) => c,
        Err(e) => {
            logger::log_warning(&format!("Failed to read '{}': {e}", file.display()));
            return http::build_404_response();
        }
    };

    let etag = cache::generate_etag(&content);
    if cache::check_etag_match(ctx.if_none_match.as_deref(), &etag) {
        return http::build_304_response(&etag);
    }

    let content_type = mime::get_content_type(file.extension().and_then(|e| e.to_str()));
    http::build_static_response(Bytes::from(content), content_type, &etag, ctx.is_head)
}

/// Canonical path of `relative` if it is a regular file inside `static_dir`
async fn resolve_in_dir(static_dir: &Path, relative: &str) -> Option<PathBuf> {
    if relative.is_empty() {
        return None;
    }

    let root = match fs::canonicalize(static_dir).await {
        Ok(p) => p,
        Err(e) => {
            logger::log_warning(&format!(
                "Static directory not found or inaccessible '{}': {e}",
                static_dir.display()
            ));
            return None;
        }
    };

    // A missing file is the normal client-route case, not worth logging
    let candidate = fs::canonicalize(root.join(relative)).await.ok()?;
    if !candidate.starts_with(&root) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {relative} -> {}",
            candidate.display()
        ));
        return None;
    }

    let meta = fs::metadata(&candidate).await.ok()?;
    meta.is_file().then_some(candidate)
}
