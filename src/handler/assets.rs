//! Asset mount request handler
//!
//! One [`AssetHandler`] serves one mount. For each `GET`/`HEAD` it strips the
//! mount prefix, checks the overrides, then looks the relative path up in the
//! cache (resolving on a miss) and answers with the asset, a `304`, or an
//! error status. Override hits are re-read on every request and never cached.

use std::sync::Arc;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{IF_MODIFIED_SINCE, IF_NONE_MATCH};
use hyper::{Method, Request, Response};

use crate::cache::AssetCache;
use crate::config::MountConfig;
use crate::http::cache::{check_etag_match, check_not_modified_since};
use crate::http::mime::MimeTable;
use crate::http::{self, AssetHeaders};
use crate::logger;
use crate::resolve::{strip_prefix, RelativePath, ResolverChain};

/// Request handler for a single asset mount
pub struct AssetHandler {
    uri_prefix: String,
    chain: ResolverChain,
    cache: AssetCache,
    mime: MimeTable,
    cache_control: Option<String>,
}

impl AssetHandler {
    pub fn new(mount: &MountConfig) -> Self {
        Self {
            uri_prefix: mount.uri_prefix.clone(),
            chain: ResolverChain::new(mount),
            cache: AssetCache::new(mount.cache_policy),
            mime: MimeTable::new(&mount.extra_mime_types, &mount.default_content_type),
            cache_control: mount.cache_control.clone(),
        }
    }

    pub fn uri_prefix(&self) -> &str {
        &self.uri_prefix
    }

    /// The memoizing cache, for introspection and invalidation
    pub const fn cache(&self) -> &AssetCache {
        &self.cache
    }

    /// Answer one request addressed to this mount
    ///
    /// The request body is never read.
    pub async fn handle<B>(&self, req: &Request<B>) -> Response<Full<Bytes>> {
        let path = req.uri().path();
        let is_head = req.method() == Method::HEAD;

        let raw = match strip_prefix(path, &self.uri_prefix) {
            Ok(raw) => raw,
            Err(e) => {
                logger::log_error(&e.to_string());
                return http::build_500_response();
            }
        };
        let Some(rel) = RelativePath::parse(raw) else {
            return http::build_404_response();
        };

        let asset = match self.chain.resolve_override(&rel).await {
            Some(asset) => Some(Arc::new(asset)),
            None => {
                self.cache
                    .get_with(rel.key(), || {
                        logger::log_cache_miss(&self.uri_prefix, rel.key());
                        self.chain.resolve_sources(&rel)
                    })
                    .await
            }
        };
        let Some(asset) = asset else {
            return http::build_404_response();
        };

        let headers = req.headers();
        let if_none_match = headers.get(IF_NONE_MATCH).and_then(|v| v.to_str().ok());
        if check_etag_match(if_none_match, asset.etag()) {
            return http::build_304_response(&asset);
        }
        let if_modified_since = headers.get(IF_MODIFIED_SINCE).and_then(|v| v.to_str().ok());
        if check_not_modified_since(if_modified_since, asset.last_modified_ms()) {
            return http::build_304_response(&asset);
        }

        let asset_headers = AssetHeaders {
            content_type: self.mime.content_type_for(path),
            cache_control: self.cache_control.as_deref(),
        };
        http::build_asset_response(&asset, &asset_headers, is_head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{BoundedPolicy, CachePolicy};
    use crate::http::cache::format_http_date;
    use crate::resolve::{MemoryTree, Override, OverrideMatch, OverrideTable, ResourceRoot};
    use http_body_util::BodyExt;
    use hyper::header::{CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE, ETAG, LAST_MODIFIED};
    use hyper::StatusCode;
    use std::collections::HashMap;
    use std::time::{Duration, UNIX_EPOCH};

    const MODIFIED_MS: i64 = 1_700_000_000_000;

    fn mount(prefix: &str) -> MountConfig {
        let modified = Some(UNIX_EPOCH + Duration::from_millis(MODIFIED_MS as u64));
        let tree = MemoryTree::new()
            .with_file("assets/app.js", "console.log(1)", modified)
            .with_file("assets/index.htm", "<h1>home</h1>", modified)
            .with_file("assets/data.weird", "??", modified)
            .with_file("assets/docs/readme.txt", "docs", modified);
        MountConfig {
            uri_prefix: prefix.to_string(),
            resource_root: ResourceRoot::new(Arc::new(tree), "/assets"),
            filesystem_root: None,
            overrides: OverrideTable::default(),
            index_file: Some("index.htm".to_string()),
            default_content_type: "text/html".to_string(),
            extra_mime_types: HashMap::from([("weird".to_string(), "application/x-weird".to_string())]),
            cache_policy: CachePolicy::Bounded(BoundedPolicy {
                max_entries: Some(10),
                ..BoundedPolicy::default()
            }),
            cache_control: Some("public, max-age=300".to_string()),
        }
    }

    fn get(uri: &str) -> Request<()> {
        Request::get(uri).body(()).unwrap()
    }

    fn get_with(uri: &str, name: &str, value: &str) -> Request<()> {
        Request::get(uri).header(name, value).body(()).unwrap()
    }

    async fn body(resp: Response<Full<Bytes>>) -> Bytes {
        resp.into_body().collect().await.unwrap().to_bytes()
    }

    #[tokio::test]
    async fn test_serves_asset_with_validators() {
        let handler = AssetHandler::new(&mount("/assets"));
        let resp = handler.handle(&get("/assets/app.js")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let headers = resp.headers();
        assert_eq!(headers[CONTENT_TYPE], "application/javascript");
        assert_eq!(headers[CONTENT_LENGTH], "14");
        assert_eq!(headers[LAST_MODIFIED], format_http_date(MODIFIED_MS));
        assert_eq!(headers[ETAG].len(), 34);
        assert_eq!(headers[CACHE_CONTROL], "public, max-age=300");
        assert_eq!(&body(resp).await[..], b"console.log(1)");
    }

    #[tokio::test]
    async fn test_if_none_match() {
        let handler = AssetHandler::new(&mount("/assets"));
        let first = handler.handle(&get("/assets/app.js")).await;
        let etag = first.headers()[ETAG].to_str().unwrap().to_string();

        let resp = handler.handle(&get_with("/assets/app.js", "if-none-match", &etag)).await;
        assert_eq!(resp.status(), StatusCode::NOT_MODIFIED);
        assert_eq!(resp.headers()[ETAG], etag.as_str());
        assert!(body(resp).await.is_empty());

        let stale = handler
            .handle(&get_with("/assets/app.js", "if-none-match", "\"stale\""))
            .await;
        assert_eq!(stale.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_if_modified_since() {
        let handler = AssetHandler::new(&mount("/assets"));
        let same = format_http_date(MODIFIED_MS);
        let resp = handler
            .handle(&get_with("/assets/app.js", "if-modified-since", &same))
            .await;
        assert_eq!(resp.status(), StatusCode::NOT_MODIFIED);

        let earlier = format_http_date(MODIFIED_MS - 1_000);
        let resp = handler
            .handle(&get_with("/assets/app.js", "if-modified-since", &earlier))
            .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let garbage = handler
            .handle(&get_with("/assets/app.js", "if-modified-since", "yesterday"))
            .await;
        assert_eq!(garbage.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_index_and_default_type() {
        let handler = AssetHandler::new(&mount("/assets"));
        for uri in ["/assets", "/assets/"] {
            let resp = handler.handle(&get(uri)).await;
            assert_eq!(resp.status(), StatusCode::OK, "{uri}");
            assert_eq!(resp.headers()[CONTENT_TYPE], "text/html");
            assert_eq!(&body(resp).await[..], b"<h1>home</h1>");
        }
        // Directory without an index file
        let resp = handler.handle(&get("/assets/docs/")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_extra_mime_types() {
        let handler = AssetHandler::new(&mount("/assets"));
        let resp = handler.handle(&get("/assets/data.weird")).await;
        assert_eq!(resp.headers()[CONTENT_TYPE], "application/x-weird");
    }

    #[tokio::test]
    async fn test_not_found_and_traversal() {
        let handler = AssetHandler::new(&mount("/assets"));
        assert_eq!(handler.handle(&get("/assets/nope.js")).await.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            handler.handle(&get("/assets/../assets/app.js")).await.status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            handler.handle(&get("/assets/%2e%2e/app.js")).await.status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(handler.cache().entry_count(), 0);
    }

    #[tokio::test]
    async fn test_prefix_mismatch_is_500() {
        let handler = AssetHandler::new(&mount("/assets"));
        assert_eq!(
            handler.handle(&get("/other/app.js")).await.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            handler.handle(&get("/assetsx/app.js")).await.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_head() {
        let handler = AssetHandler::new(&mount("/assets"));
        let req = Request::head("/assets/app.js").body(()).unwrap();
        let resp = handler.handle(&req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[CONTENT_LENGTH], "14");
        assert!(body(resp).await.is_empty());
    }

    #[tokio::test]
    async fn test_cache_memoizes_by_relative_path() {
        let handler = AssetHandler::new(&mount("/assets"));
        handler.handle(&get("/assets/app.js")).await;
        handler.handle(&get("/assets/app.js")).await;
        handler.handle(&get("/assets/app.js?v=2")).await;
        let stats = handler.cache().stats();
        assert_eq!(stats.loads, 1);
        assert_eq!(stats.hits, 2);
        assert_eq!(handler.cache().entry_count(), 1);
    }

    #[tokio::test]
    async fn test_root_mount() {
        let handler = AssetHandler::new(&mount(""));
        let resp = handler.handle(&get("/app.js")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let resp = handler.handle(&get("/")).await;
        assert_eq!(&body(resp).await[..], b"<h1>home</h1>");
    }

    #[tokio::test]
    async fn test_override_edits_bypass_cache() {
        let dir = tempfile::TempDir::new().unwrap();
        let dev = dir.path().join("dev.js");
        std::fs::write(&dev, "v1").unwrap();

        let mut config = mount("/assets");
        config.overrides = OverrideTable::new(
            vec![Override::new("/assets/app.js", &dev)],
            OverrideMatch::Prefix,
        );
        let handler = AssetHandler::new(&config);

        let first = handler.handle(&get("/assets/app.js")).await;
        let first_etag = first.headers()[ETAG].clone();
        assert_eq!(&body(first).await[..], b"v1");

        std::fs::write(&dev, "v2 edited").unwrap();
        let second = handler.handle(&get("/assets/app.js")).await;
        assert_ne!(second.headers()[ETAG], first_etag);
        assert_eq!(&body(second).await[..], b"v2 edited");
        assert_eq!(handler.cache().entry_count(), 0);

        // Once the override target is gone the cached embedded copy is used
        std::fs::remove_file(&dev).unwrap();
        assert_eq!(&body(handler.handle(&get("/assets/app.js")).await).await[..], b"console.log(1)");
        assert_eq!(handler.cache().entry_count(), 1);
    }
}
