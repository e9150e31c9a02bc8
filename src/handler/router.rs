//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method validation, selection of
//! the mount with the longest matching prefix, and access logging.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::{REFERER, USER_AGENT};
use hyper::{Method, Request, Response, Version};

use crate::config::{Config, ConfigError, MountConfig};
use crate::handler::assets::AssetHandler;
use crate::http;
use crate::logger::{self, AccessLogEntry};
use crate::resolve::strip_prefix;

/// Handlers for every configured mount
pub struct MountTable {
    /// Longest prefix first
    handlers: Vec<AssetHandler>,
}

impl MountTable {
    pub fn new(mut handlers: Vec<AssetHandler>) -> Self {
        handlers.sort_by(|a, b| b.uri_prefix().len().cmp(&a.uri_prefix().len()));
        Self { handlers }
    }

    pub fn from_mounts(mounts: &[MountConfig]) -> Self {
        Self::new(mounts.iter().map(AssetHandler::new).collect())
    }

    /// The handler whose prefix covers `path`, preferring the longest prefix
    pub fn find(&self, path: &str) -> Option<&AssetHandler> {
        self.handlers
            .iter()
            .find(|h| strip_prefix(path, h.uri_prefix()).is_ok())
    }

    pub fn handlers(&self) -> &[AssetHandler] {
        &self.handlers
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Shared state for every connection
pub struct AppState {
    pub mounts: MountTable,
    pub access_log: bool,
    pub access_log_format: String,
}

impl AppState {
    pub fn new(config: &Config, mounts: &[MountConfig]) -> Self {
        Self {
            mounts: MountTable::from_mounts(mounts),
            access_log: config.logging.access_log,
            access_log_format: config.logging.access_log_format.clone(),
        }
    }
}

/// Build validated mounts from configuration, one shared embedded tree for all
pub fn build_mounts(
    config: &Config,
    tree: Option<Arc<dyn crate::resolve::ResourceTree>>,
) -> Result<Vec<MountConfig>, ConfigError> {
    config
        .mounts
        .iter()
        .map(|m| m.build_mount(tree.clone()))
        .collect()
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let start = Instant::now();
    // Bodies are never read; keep only the head
    let (parts, _) = req.into_parts();
    let req = Request::from_parts(parts, ());

    let response = route_request(&req, &state.mounts).await;

    if state.access_log {
        let entry = access_log_entry(&req, &response, peer_addr, start);
        logger::log_access(&entry, &state.access_log_format);
    }
    Ok(response)
}

/// Dispatch a request to its mount
pub async fn route_request<B>(req: &Request<B>, mounts: &MountTable) -> Response<Full<Bytes>> {
    if let Some(resp) = check_http_method(req.method()) {
        return resp;
    }
    match mounts.find(req.uri().path()) {
        Some(handler) => handler.handle(req).await,
        None => http::build_404_response(),
    }
}

/// Only GET and HEAD are served
fn check_http_method(method: &Method) -> Option<Response<Full<Bytes>>> {
    match *method {
        Method::GET | Method::HEAD => None,
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            Some(http::build_405_response())
        }
    }
}

fn access_log_entry<B>(
    req: &Request<B>,
    response: &Response<Full<Bytes>>,
    peer_addr: SocketAddr,
    start: Instant,
) -> AccessLogEntry {
    let header = |name: hyper::header::HeaderName| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };

    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = version_label(req.version()).to_string();
    entry.status = response.status().as_u16();
    entry.body_bytes = response
        .body()
        .size_hint()
        .exact()
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(0);
    entry.referer = header(REFERER);
    entry.user_agent = header(USER_AGENT);
    entry.request_time_us = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);
    entry
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CachePolicy;
    use crate::resolve::{MemoryTree, OverrideTable, ResourceRoot};
    use http_body_util::BodyExt;
    use hyper::StatusCode;
    use std::collections::HashMap;

    fn mount(prefix: &str, base: &str) -> MountConfig {
        let tree = MemoryTree::new()
            .with_file("assets/app.js", "root app", None)
            .with_file("js/app.js", "js app", None)
            .with_file("js/lib/app.js", "lib app", None);
        MountConfig {
            uri_prefix: prefix.to_string(),
            resource_root: ResourceRoot::new(Arc::new(tree), base),
            filesystem_root: None,
            overrides: OverrideTable::default(),
            index_file: None,
            default_content_type: "text/html".to_string(),
            extra_mime_types: HashMap::new(),
            cache_policy: CachePolicy::default(),
            cache_control: None,
        }
    }

    fn table() -> MountTable {
        MountTable::from_mounts(&[
            mount("", "/assets"),
            mount("/js", "/js"),
            mount("/js/lib", "/js/lib"),
        ])
    }

    async fn body_of(mounts: &MountTable, method: Method, uri: &str) -> (StatusCode, String) {
        let req = Request::builder().method(method).uri(uri).body(()).unwrap();
        let resp = route_request(&req, mounts).await;
        let status = resp.status();
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[test]
    fn test_longest_prefix_first() {
        let mounts = table();
        let prefixes: Vec<_> = mounts.handlers().iter().map(AssetHandler::uri_prefix).collect();
        assert_eq!(prefixes, ["/js/lib", "/js", ""]);
        assert_eq!(mounts.find("/js/lib/app.js").map(AssetHandler::uri_prefix), Some("/js/lib"));
        assert_eq!(mounts.find("/js/app.js").map(AssetHandler::uri_prefix), Some("/js"));
        // `/jsx` is not under `/js`
        assert_eq!(mounts.find("/jsx/app.js").map(AssetHandler::uri_prefix), Some(""));
    }

    #[tokio::test]
    async fn test_dispatch() {
        let mounts = table();
        assert_eq!(body_of(&mounts, Method::GET, "/app.js").await, (StatusCode::OK, "root app".to_string()));
        assert_eq!(body_of(&mounts, Method::GET, "/js/app.js").await, (StatusCode::OK, "js app".to_string()));
        assert_eq!(
            body_of(&mounts, Method::GET, "/js/lib/app.js").await,
            (StatusCode::OK, "lib app".to_string())
        );
    }

    #[tokio::test]
    async fn test_no_mount_is_404() {
        let mounts = MountTable::from_mounts(&[mount("/js", "/js")]);
        assert_eq!(body_of(&mounts, Method::GET, "/css/site.css").await.0, StatusCode::NOT_FOUND);
        assert!(MountTable::new(Vec::new()).is_empty());
    }

    #[tokio::test]
    async fn test_method_not_allowed() {
        let mounts = table();
        for method in [Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS] {
            assert_eq!(body_of(&mounts, method, "/app.js").await.0, StatusCode::METHOD_NOT_ALLOWED);
        }
        assert_eq!(body_of(&mounts, Method::HEAD, "/app.js").await, (StatusCode::OK, String::new()));
    }

    #[test]
    fn test_access_log_entry() {
        let req = Request::get("/js/app.js?v=1")
            .header(USER_AGENT, "curl/8.0")
            .body(())
            .unwrap();
        let resp = Response::new(Full::new(Bytes::from_static(b"hello")));
        let peer: SocketAddr = "10.0.0.7:51000".parse().unwrap();
        let entry = access_log_entry(&req, &resp, peer, Instant::now());
        assert_eq!(entry.remote_addr, "10.0.0.7");
        assert_eq!(entry.path, "/js/app.js");
        assert_eq!(entry.query.as_deref(), Some("v=1"));
        assert_eq!(entry.body_bytes, 5);
        assert_eq!(entry.status, 200);
        assert_eq!(entry.user_agent.as_deref(), Some("curl/8.0"));
        assert_eq!(entry.referer, None);
    }
}
