//! HTTP cache validation module
//!
//! Provides `ETag` generation, HTTP-date handling and conditional request checks.

use chrono::{DateTime, NaiveDateTime, Utc};
use xxhash_rust::xxh3::xxh3_128;

/// IMF-fixdate, the preferred HTTP-date format (RFC 7231 section 7.1.1.1)
const IMF_FIXDATE: &str = "%a, %d %b %Y %H:%M:%S GMT";
/// Obsolete RFC 850 format, still accepted on input
const RFC850_DATE: &str = "%A, %d-%b-%y %H:%M:%S GMT";
/// Obsolete ANSI C `asctime()` format, still accepted on input
const ASCTIME_DATE: &str = "%a %b %e %H:%M:%S %Y";

/// Generate a strong `ETag` from the 128-bit xxh3 hash of the content
///
/// # Returns
/// Quoted lowercase hex digest, always 34 characters, e.g. `"0123...cdef"`
pub fn generate_etag(content: &[u8]) -> String {
    format!("\"{:032x}\"", xxh3_128(content))
}

/// Check if client's `If-None-Match` header matches the server's `ETag`
///
/// Supports:
/// - Single `ETag`: `"abc123"`
/// - Multiple `ETags`: `"abc123", "def456"`
/// - Wildcard: `*`
///
/// # Returns
/// Returns true if matched (should return 304), false otherwise
pub fn check_etag_match(if_none_match: Option<&str>, etag: &str) -> bool {
    if_none_match.is_some_and(|client_etag| {
        client_etag
            .split(',')
            .any(|e| e.trim() == etag || e.trim() == "*")
    })
}

/// Check the `If-Modified-Since` header against an asset's modification time
///
/// Both sides are compared at whole-second resolution. A missing or
/// unparseable header never yields a match.
pub fn check_not_modified_since(if_modified_since: Option<&str>, last_modified_ms: i64) -> bool {
    if_modified_since
        .and_then(parse_http_date)
        .is_some_and(|since_ms| last_modified_ms <= since_ms)
}

/// Format milliseconds since the Unix epoch as an IMF-fixdate
///
/// Sub-second precision is dropped.
pub fn format_http_date(epoch_ms: i64) -> String {
    let secs = epoch_ms.div_euclid(1000);
    DateTime::<Utc>::from_timestamp(secs, 0)
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
        .format(IMF_FIXDATE)
        .to_string()
}

/// Parse an HTTP-date into milliseconds since the Unix epoch
///
/// Accepts IMF-fixdate as well as the obsolete RFC 850 and asctime forms.
pub fn parse_http_date(value: &str) -> Option<i64> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.timestamp() * 1000);
    }
    [RFC850_DATE, ASCTIME_DATE]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc().timestamp() * 1000)
}
