//! Logger module
//!
//! Provides logging utilities for the asset server including:
//! - Server lifecycle and mount logging
//! - Access logging with multiple formats
//! - Error and warning logging, filtered by the configured level
//! - File-based logging support

mod format;
pub mod writer;

pub use format::AccessLogEntry;
pub use writer::Level;

use std::error::Error as _;
use std::net::SocketAddr;

use crate::config::{Config, MountConfig};
use crate::error::AssetError;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(
        config.logging.level.parse()?,
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

/// Whether a line at `level` would be written
///
/// Before `init` everything up to `Info` is written.
pub fn enabled(level: Level) -> bool {
    let max = writer::get().map_or(Level::Info, writer::LogWriter::level);
    level <= max
}

fn write_info(message: &str) {
    if !enabled(Level::Info) {
        return;
    }
    match writer::get() {
        Some(w) => w.write_info(message),
        None => println!("{message}"),
    }
}

fn write_error(level: Level, message: &str) {
    if !enabled(level) {
        return;
    }
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

fn write_access(message: &str) {
    match writer::get() {
        Some(w) => w.write_access(message),
        None => println!("{message}"),
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    write_info("======================================");
    write_info("Asset server started successfully");
    write_info(&format!("Listening on: http://{addr}"));
    write_info(&format!("Log level: {}", config.logging.level));
    if let Some(workers) = config.server.workers {
        write_info(&format!("Worker threads: {workers}"));
    }
    if let Some(ref path) = config.logging.access_log_file {
        write_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_info(&format!("Error log: {path}"));
    }
    write_info(&format!("Mounts: {}", config.mounts.len()));
    write_info("======================================\n");
}

pub fn log_mount(mount: &MountConfig) {
    let prefix = if mount.uri_prefix.is_empty() {
        "/"
    } else {
        mount.uri_prefix.as_str()
    };
    let mut sources = Vec::new();
    if !mount.overrides.is_empty() {
        sources.push(format!("{} override(s)", mount.overrides.entries().len()));
    }
    if let Some(root) = &mount.filesystem_root {
        sources.push(format!("live {}", root.display()));
    }
    if let Some(root) = &mount.resource_root {
        sources.push(format!("embedded /{}", root.base()));
    }
    let cache = if mount.cache_policy.is_disabled() {
        "off".to_string()
    } else {
        format!("{:?}", mount.cache_policy)
    };
    write_info(&format!(
        "[Mount] {prefix} <- {} (cache: {cache})",
        if sources.is_empty() {
            "nothing".to_string()
        } else {
            sources.join(", ")
        }
    ));
}

pub fn log_shutdown() {
    write_info("[Shutdown] Signal received, no longer accepting connections");
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(Level::Error, &format!("[ERROR] Failed to serve connection: {err:?}"));
}

pub fn log_error(message: &str) {
    write_error(Level::Error, &format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(Level::Warn, &format!("[WARN] {message}"));
}

pub fn log_debug(message: &str) {
    write_error(Level::Debug, &format!("[DEBUG] {message}"));
}

/// A source failed while resolving `key` under `prefix`; the request sees 404
pub fn log_resolve_failure(prefix: &str, key: &str, err: &AssetError) {
    let cause = err
        .source()
        .map(|cause| format!(": {cause}"))
        .unwrap_or_default();
    write_error(
        Level::Error,
        &format!("[ERROR] Failed to resolve {prefix}{key}: {err}{cause}"),
    );
}

pub fn log_cache_miss(prefix: &str, key: &str) {
    if enabled(Level::Debug) {
        log_debug(&format!("[Cache] miss {prefix}{key}"));
    }
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    write_access(&entry.format(format));
}
