use std::{collections::HashMap, fs, path::PathBuf, sync::Arc};

use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use rust_embed::Embed;

use crate::handlers::{leads, neighborhoods, site, Ctx};

/// Default site theme embedded in the binary. A --site directory on
/// disk overrides it wholesale.
#[derive(Embed)]
#[folder = "site/"]
pub struct SiteTheme;

/// Initialize HTTP routes.
pub fn init_handlers(ctx: Arc<Ctx>) -> Router {
    // JSON API.
    let api_routes = Router::new()
        .route("/api/neighborhoods", get(neighborhoods::filter))
        .route("/api/leads", post(leads::create_lead));

    // Server-rendered site.
    let site_routes = Router::new()
        .route("/", get(site::index))
        .route("/hizmetler", get(site::services))
        .route("/fiyatlar", get(site::pricing))
        .route("/kurye", get(site::kurye))
        .route("/kurye", post(site::submit_kurye))
        .route("/message", get(site::message))
        .route("/page/{page}", get(site::render_custom_page))
        .route("/static/_bundle.js", get(serve_bundle))
        .route("/static/_bundle.css", get(serve_bundle))
        .route("/static/{*path}", get(serve_static));

    Router::new()
        .merge(api_routes)
        .merge(site_routes)
        .with_state(ctx)
}

/// Serve a bundle by concatenating multiple files from preloaded static files.
/// Content-Type is determined by route extension (.js or .css).
async fn serve_bundle(
    State(ctx): State<Arc<Ctx>>,
    uri: axum::http::Uri,
    axum::extract::Query(params): axum::extract::Query<Vec<(String, String)>>,
) -> impl IntoResponse {
    let r#type = if uri.path().ends_with(".css") {
        "text/css"
    } else {
        "application/javascript"
    };

    // Get file names from the ?f query param.
    let files: Vec<&str> = params
        .iter()
        .filter(|(k, _)| k == "f")
        .map(|(_, v)| v.as_str())
        .filter(|s| !s.is_empty())
        .collect();

    // Lookup all files first (fail fast if any missing).
    let mut parts = Vec::with_capacity(files.len());
    for name in &files {
        match ctx.static_files.get(*name) {
            Some(b) => parts.push(b.clone()), // Bytes::clone is cheap (refcount bump)
            None => {
                return (
                    StatusCode::NOT_FOUND,
                    [(header::CONTENT_TYPE, "text/plain")],
                    format!("File not found: {}", name),
                )
                    .into_response();
            }
        }
    }

    // Concatenate into a single buffer with exact capacity.
    let len: usize = parts.iter().map(|b| b.len()).sum::<usize>() + parts.len().saturating_sub(1);
    let mut buf = Vec::with_capacity(len);
    for (i, b) in parts.iter().enumerate() {
        buf.extend_from_slice(b);
        if i + 1 < parts.len() {
            buf.push(b'\n');
        }
    }

    (StatusCode::OK, [(header::CONTENT_TYPE, r#type)], buf).into_response()
}

/// Serve theme static files: from the --site directory when given,
/// falling back to the embedded theme.
async fn serve_static(
    State(ctx): State<Arc<Ctx>>,
    axum::extract::Path(path): axum::extract::Path<String>,
) -> impl IntoResponse {
    let uri = match safe_path(&path) {
        Some(p) => p,
        None => return (StatusCode::NOT_FOUND, "not found").into_response(),
    };

    if let Some(ref site_dir) = ctx.site_path {
        let file_path = site_dir.join("static").join(uri);
        if file_path.exists() {
            return match fs::read(&file_path) {
                Ok(content) => {
                    let mime = mime_guess::from_path(uri)
                        .first_or_octet_stream()
                        .to_string();
                    (StatusCode::OK, [(header::CONTENT_TYPE, mime)], content).into_response()
                }
                Err(_) => (StatusCode::NOT_FOUND, "not found").into_response(),
            };
        }
    }

    match SiteTheme::get(&format!("static/{}", uri)) {
        Some(content) => {
            let mime = mime_guess::from_path(uri)
                .first_or_octet_stream()
                .to_string();
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, mime)],
                content.data.to_vec(),
            )
                .into_response()
        }
        None => (StatusCode::NOT_FOUND, "not found").into_response(),
    }
}

/// Strip the leading slash and reject paths with parent-directory
/// segments so a disk theme can never be escaped.
fn safe_path(path: &str) -> Option<&str> {
    let p = path.trim_start_matches('/');
    if p.split('/').any(|seg| seg == "..") {
        return None;
    }
    Some(p)
}

/// Preload static files (JS & CSS) for bundling, from the --site
/// directory or the embedded theme.
pub fn preload_static_files(site_path: &Option<PathBuf>) -> HashMap<String, Bytes> {
    // Prealloc for "a few js/css files"
    let mut files = HashMap::with_capacity(8);

    let site_dir = match site_path {
        Some(p) => p,
        None => {
            for name in SiteTheme::iter() {
                let path = name.as_ref();
                if let Some(short) = path.strip_prefix("static/") {
                    if short.ends_with(".js") || short.ends_with(".css") {
                        if let Some(content) = SiteTheme::get(path) {
                            files.insert(short.to_string(), Bytes::from(content.data.to_vec()));
                        }
                    }
                }
            }
            return files;
        }
    };

    let static_dir = site_dir.join("static");

    let entries = match fs::read_dir(&static_dir) {
        Ok(e) => e,
        Err(_) => return files,
    };

    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();

        // Only accept .js or .css
        let _ = match path.extension().and_then(|e| e.to_str()) {
            Some(e) if matches!(e, "js" | "css") => e,
            _ => continue,
        };

        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(n) => n.to_owned(),
            None => continue,
        };

        if let Ok(content) = fs::read(&path) {
            files.insert(name, Bytes::from(content));
        }
    }

    files
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_segments_are_rejected() {
        assert_eq!(safe_path("site.css"), Some("site.css"));
        assert_eq!(safe_path("/img/logo.svg"), Some("img/logo.svg"));
        assert_eq!(safe_path("../config.toml"), None);
        assert_eq!(safe_path("a/../../etc/passwd"), None);
        assert_eq!(safe_path("/..%2f-less/.."), None);
        // Dotted file names are fine, only whole ".." segments are not.
        assert_eq!(safe_path("..hidden.css"), Some("..hidden.css"));
    }
}
