//! Immutable asset snapshot
//!
//! An [`Asset`] is the unit the cache stores and the handler serves: the raw
//! bytes, their content-derived `ETag`, and a modification time truncated to
//! whole seconds (HTTP-dates carry no sub-second part).

use std::time::{SystemTime, UNIX_EPOCH};

use hyper::body::Bytes;

use crate::http::cache::generate_etag;

/// Resolved asset: bytes plus cache validators
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    bytes: Bytes,
    etag: String,
    last_modified_ms: i64,
}

impl Asset {
    /// Create an asset; `last_modified_ms` is truncated down to whole seconds
    pub fn new(bytes: Bytes, last_modified_ms: i64) -> Self {
        let etag = generate_etag(&bytes);
        Self {
            bytes,
            etag,
            last_modified_ms: truncate_to_seconds(last_modified_ms),
        }
    }

    /// Create an asset stamped with a `SystemTime`
    pub fn with_modified(bytes: Bytes, modified: SystemTime) -> Self {
        Self::new(bytes, system_time_to_millis(modified))
    }

    pub const fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// Quoted `ETag`
    pub fn etag(&self) -> &str {
        &self.etag
    }

    /// Milliseconds since the Unix epoch, always a multiple of 1000
    pub const fn last_modified_ms(&self) -> i64 {
        self.last_modified_ms
    }

    /// Size in bytes; this is also the asset's cache weight
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Round down to a whole second (towards negative infinity for pre-epoch times)
pub const fn truncate_to_seconds(epoch_ms: i64) -> i64 {
    epoch_ms - epoch_ms.rem_euclid(1000)
}

/// Convert a `SystemTime` to signed milliseconds since the Unix epoch
pub fn system_time_to_millis(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(after) => i64::try_from(after.as_millis()).unwrap_or(i64::MAX),
        Err(before) => i64::try_from(before.duration().as_millis()).map_or(i64::MIN, |ms| -ms),
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch
pub fn now_millis() -> i64 {
    system_time_to_millis(SystemTime::now())
}
