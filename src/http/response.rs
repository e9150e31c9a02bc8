//! HTTP response building module
//!
//! Provides builders for the status codes an asset mount emits.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE, ETAG, LAST_MODIFIED};
use hyper::{Response, StatusCode};

use crate::asset::Asset;
use crate::http::cache::format_http_date;

/// Headers describing a `200 OK` asset response
pub struct AssetHeaders<'a> {
    pub content_type: &'a str,
    pub cache_control: Option<&'a str>,
}

/// Build `200 OK` carrying an asset with its validators
pub fn build_asset_response(
    asset: &Asset,
    headers: &AssetHeaders<'_>,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let body = if is_head {
        Bytes::new()
    } else {
        asset.bytes().clone()
    };

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(LAST_MODIFIED, format_http_date(asset.last_modified_ms()))
        .header(ETAG, asset.etag())
        .header(CONTENT_TYPE, headers.content_type)
        .header(CONTENT_LENGTH, asset.len());
    if let Some(cache_control) = headers.cache_control {
        builder = builder.header(CACHE_CONTROL, cache_control);
    }

    // An unrepresentable header value is treated like a missing asset
    builder.body(Full::new(body)).unwrap_or_else(|e| {
        log_build_error("200", &e);
        status_only(StatusCode::NOT_FOUND)
    })
}

/// Build 304 Not Modified response
pub fn build_304_response(asset: &Asset) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::NOT_MODIFIED)
        .header(ETAG, asset.etag())
        .header(LAST_MODIFIED, format_http_date(asset.last_modified_ms()))
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("304", &e);
            status_only(StatusCode::NOT_MODIFIED)
        })
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<Full<Bytes>> {
    build_text_response(StatusCode::NOT_FOUND, "404 Not Found")
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> Response<Full<Bytes>> {
    let mut resp = build_text_response(StatusCode::METHOD_NOT_ALLOWED, "405 Method Not Allowed");
    resp.headers_mut()
        .insert(hyper::header::ALLOW, hyper::header::HeaderValue::from_static("GET, HEAD"));
    resp
}

/// Build 500 Internal Server Error response
pub fn build_500_response() -> Response<Full<Bytes>> {
    build_text_response(StatusCode::INTERNAL_SERVER_ERROR, "500 Internal Server Error")
}

fn build_text_response(status: StatusCode, text: &'static str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "text/plain")
        .body(Full::new(Bytes::from_static(text.as_bytes())))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            status_only(status)
        })
}

fn status_only(status: StatusCode) -> Response<Full<Bytes>> {
    let mut resp = Response::new(Full::new(Bytes::new()));
    *resp.status_mut() = status;
    resp
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
