//! Cache policy parsing
//!
//! A cache spec is a comma-separated list of `name=value` pairs:
//!
//! | key | value |
//! |-----|-------|
//! | `maximumSize` | max entries; `0` disables caching |
//! | `maximumWeight` | max total bytes |
//! | `expireAfterAccess` | duration since last hit, `<int><s\|m\|h\|d>` |
//! | `expireAfterWrite` | duration since insertion |
//! | `initialCapacity` | accepted, ignored |
//! | `concurrencyLevel` | accepted, ignored |
//! | `recordStats` | flag, accepted (statistics are always kept) |
//!
//! The literal `off` also disables caching.

use std::collections::HashSet;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

/// Spec used when a mount does not configure one
pub const DEFAULT_CACHE_SPEC: &str = "maximumSize=100";

/// Spec that turns memoization off (live-reload mode)
pub const DISABLED_CACHE_SPEC: &str = "maximumSize=0";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheSpecError {
    #[error("cache spec key `{0}` was already set")]
    Duplicate(String),

    #[error("unknown cache spec key `{0}`")]
    UnknownKey(String),

    #[error("cache spec key `{0}` requires a value")]
    MissingValue(String),

    #[error("cache spec key `{0}` does not take a value")]
    UnexpectedValue(String),

    #[error("invalid value `{value}` for cache spec key `{key}`")]
    InvalidValue { key: String, value: String },

    #[error("maximumSize and maximumWeight cannot both be set")]
    SizeAndWeight,
}

/// Limits for a memoizing cache; `None` means unlimited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoundedPolicy {
    pub max_entries: Option<u64>,
    pub max_weight: Option<u64>,
    pub expire_after_access: Option<Duration>,
    pub expire_after_write: Option<Duration>,
}

/// How a mount memoizes resolved assets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Every lookup invokes the resolver
    Disabled,
    Bounded(BoundedPolicy),
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::Bounded(BoundedPolicy {
            max_entries: Some(100),
            ..BoundedPolicy::default()
        })
    }
}

impl CachePolicy {
    pub const fn is_disabled(&self) -> bool {
        matches!(self, Self::Disabled)
    }

    /// Parse a cache spec string
    pub fn parse(spec: &str) -> Result<Self, CacheSpecError> {
        let spec = spec.trim();
        if spec.eq_ignore_ascii_case("off") {
            return Ok(Self::Disabled);
        }

        let mut policy = BoundedPolicy::default();
        let mut seen = HashSet::new();

        for pair in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = match pair.split_once('=') {
                Some((k, v)) => (k.trim(), Some(v.trim())),
                None => (pair, None),
            };
            if !seen.insert(key.to_string()) {
                return Err(CacheSpecError::Duplicate(key.to_string()));
            }

            match key {
                "maximumSize" => policy.max_entries = Some(parse_integer(key, value)?),
                "maximumWeight" => policy.max_weight = Some(parse_integer(key, value)?),
                "expireAfterAccess" => policy.expire_after_access = Some(parse_duration(key, value)?),
                "expireAfterWrite" => policy.expire_after_write = Some(parse_duration(key, value)?),
                "initialCapacity" | "concurrencyLevel" => {
                    parse_integer::<u32>(key, value)?;
                }
                "recordStats" => {
                    if value.is_some() {
                        return Err(CacheSpecError::UnexpectedValue(key.to_string()));
                    }
                }
                _ => return Err(CacheSpecError::UnknownKey(key.to_string())),
            }
        }

        if policy.max_entries.is_some() && policy.max_weight.is_some() {
            return Err(CacheSpecError::SizeAndWeight);
        }
        if policy.max_entries == Some(0) {
            return Ok(Self::Disabled);
        }
        Ok(Self::Bounded(policy))
    }
}

impl FromStr for CachePolicy {
    type Err = CacheSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn require<'a>(key: &str, value: Option<&'a str>) -> Result<&'a str, CacheSpecError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(CacheSpecError::MissingValue(key.to_string())),
    }
}

fn invalid(key: &str, value: &str) -> CacheSpecError {
    CacheSpecError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn parse_integer<T: FromStr>(key: &str, value: Option<&str>) -> Result<T, CacheSpecError> {
    let value = require(key, value)?;
    value.parse().map_err(|_| invalid(key, value))
}

/// Parse `<integer><s|m|h|d>`
fn parse_duration(key: &str, value: Option<&str>) -> Result<Duration, CacheSpecError> {
    let value = require(key, value)?;
    let unit = value.chars().last().ok_or_else(|| invalid(key, value))?;
    let amount: u64 = value[..value.len() - unit.len_utf8()]
        .parse()
        .map_err(|_| invalid(key, value))?;
    let seconds_per_unit = match unit {
        's' => 1,
        'm' => 60,
        'h' => 60 * 60,
        'd' => 24 * 60 * 60,
        _ => return Err(invalid(key, value)),
    };
    amount
        .checked_mul(seconds_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| invalid(key, value))
}
