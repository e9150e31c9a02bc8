//! MIME type detection module
//!
//! Maps the extension of a request path to a Content-Type, consulting the
//! mount's extra table before the built-in one.

use std::collections::HashMap;

/// Get the built-in MIME Content-Type for a lowercase file extension
///
/// # Examples
/// ```
/// use asset_mount::http::mime::get_content_type;
/// assert_eq!(get_content_type("js"), Some("application/javascript"));
/// assert_eq!(get_content_type("mp4"), Some("video/mp4"));
/// assert_eq!(get_content_type("xyz"), None);
/// ```
pub fn get_content_type(extension: &str) -> Option<&'static str> {
    let content_type = match extension {
        // Text
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "txt" | "md" => "text/plain",
        "csv" => "text/csv",
        "xml" => "application/xml",

        // JavaScript/WASM
        "js" | "mjs" => "application/javascript",
        "json" | "map" => "application/json",
        "wasm" => "application/wasm",

        // Images
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "webp" => "image/webp",

        // Video
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "ogg" | "ogv" => "video/ogg",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",

        // Audio
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "flac" => "audio/flac",
        "m4a" => "audio/mp4",

        // Fonts
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        "eot" => "application/vnd.ms-fontobject",

        // Documents
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "gz" | "gzip" => "application/gzip",
        "tar" => "application/x-tar",

        _ => return None,
    };
    Some(content_type)
}

/// Extract the lowercase extension of the last path segment
///
/// Returns `None` when the basename has no `.` or ends with one.
pub fn extension_of(path: &str) -> Option<String> {
    let basename = path.rsplit('/').next().unwrap_or(path);
    let (_, ext) = basename.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Extension to Content-Type table for one mount
#[derive(Debug, Clone)]
pub struct MimeTable {
    extra: HashMap<String, String>,
    default_content_type: String,
}

impl MimeTable {
    /// Build a table; extra keys are lowercased and may carry a leading dot
    pub fn new(extra: &HashMap<String, String>, default_content_type: &str) -> Self {
        let extra = extra
            .iter()
            .map(|(ext, ty)| (ext.trim_start_matches('.').to_ascii_lowercase(), ty.clone()))
            .collect();
        Self {
            extra,
            default_content_type: default_content_type.to_string(),
        }
    }

    /// Resolve the Content-Type for a request path
    pub fn content_type_for(&self, path: &str) -> &str {
        extension_of(path)
            .and_then(|ext| {
                self.extra
                    .get(&ext)
                    .map(String::as_str)
                    .or_else(|| get_content_type(&ext))
            })
            .unwrap_or(&self.default_content_type)
    }
}
