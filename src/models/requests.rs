//! Request DTOs for the cache HTTP API
//!
//! Defines the JSON body of `/setcache` and the query strings of the
//! key-based endpoints.

use chrono::Duration;
use serde::Deserialize;

use crate::cache::BackendConfig;

/// Request body for POST /setcache
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetCacheRequest {
    /// Backend tag ("in-memory", "remote", anything else for no-op)
    #[serde(default)]
    pub cache_type: String,
    /// Remote server address
    #[serde(default)]
    pub addr: String,
    /// Remote server password
    #[serde(default)]
    pub password: String,
    /// Remote database index
    #[serde(default)]
    pub db: i64,
}

impl SetCacheRequest {
    /// Builds backend parameters, keeping `defaults` for fields left empty.
    pub fn to_backend_config(&self, defaults: &BackendConfig) -> BackendConfig {
        BackendConfig {
            kind: self.cache_type.clone(),
            address: if self.addr.is_empty() {
                defaults.address.clone()
            } else {
                self.addr.clone()
            },
            password: self.password.clone(),
            db: self.db,
            connect_timeout: defaults.connect_timeout,
        }
    }
}

/// Query string of GET /get, /delete, /ttl and /exists
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeyQuery {
    pub key: Option<String>,
}

impl KeyQuery {
    /// Returns the key, or an error message if it is missing or empty.
    pub fn require_key(&self) -> Result<&str, String> {
        match self.key.as_deref() {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err("Missing key".to_string()),
        }
    }
}

/// Query string of /set
///
/// `ttl` is duration text such as `3s`, `1m30s` or `250ms`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SetQuery {
    pub key: Option<String>,
    pub value: Option<String>,
    pub ttl: Option<String>,
}

impl SetQuery {
    /// Validates the query, returning key, value and parsed TTL.
    ///
    /// A missing TTL means zero.
    pub fn validate(&self) -> Result<(&str, &str, Duration), String> {
        let key = self.key.as_deref().unwrap_or_default();
        let value = self.value.as_deref().unwrap_or_default();
        if key.is_empty() || value.is_empty() {
            return Err("Missing key or value".to_string());
        }
        let ttl = parse_ttl(self.ttl.as_deref().unwrap_or_default())?;
        Ok((key, value, ttl))
    }
}

/// Query string of /ttl when used to refresh an expiry
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TtlQuery {
    pub key: Option<String>,
    pub ttl: Option<String>,
}

impl TtlQuery {
    /// Validates the query, returning key and parsed TTL. Both are required.
    pub fn validate(&self) -> Result<(&str, Duration), String> {
        let key = self.key.as_deref().unwrap_or_default();
        let ttl = self.ttl.as_deref().unwrap_or_default();
        if key.is_empty() || ttl.is_empty() {
            return Err("Missing key or ttl".to_string());
        }
        Ok((key, parse_ttl(ttl)?))
    }
}

const NANOS_PER_MICRO: i128 = 1_000;
const NANOS_PER_MILLI: i128 = 1_000_000;
const NANOS_PER_SEC: i128 = 1_000_000_000;

/// Parses duration text: an optional sign followed by one or more
/// `<number><unit>` pairs, units `ns`, `us`/`µs`, `ms`, `s`, `m`, `h`.
///
/// Fractions are allowed (`1.5h`). A bare `0` and the empty string are zero.
pub fn parse_ttl(text: &str) -> Result<Duration, String> {
    let text = text.trim();
    let invalid = || format!("Invalid ttl '{}'", text);

    let (negative, mut rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    if rest.is_empty() || rest == "0" {
        return if text.is_empty() || rest == "0" {
            Ok(Duration::zero())
        } else {
            Err(invalid())
        };
    }

    let mut total: i128 = 0;
    while !rest.is_empty() {
        let number_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let number = &rest[..number_end];
        rest = &rest[number_end..];

        let unit_end = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let unit = &rest[..unit_end];
        rest = &rest[unit_end..];

        let scale = match unit {
            "ns" => 1,
            "us" | "µs" | "μs" => NANOS_PER_MICRO,
            "ms" => NANOS_PER_MILLI,
            "s" => NANOS_PER_SEC,
            "m" => 60 * NANOS_PER_SEC,
            "h" => 3_600 * NANOS_PER_SEC,
            "" => return Err(format!("Missing unit in ttl '{}'", text)),
            other => return Err(format!("Unknown unit '{}' in ttl '{}'", other, text)),
        };

        let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        let whole: i128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };

        let mut fraction_value: i128 = 0;
        let mut divisor: i128 = 1;
        for c in fraction.chars() {
            let digit = c.to_digit(10).ok_or_else(invalid)?;
            // Digits beyond nanosecond precision are dropped
            if divisor < NANOS_PER_SEC * 1_000 {
                fraction_value = fraction_value * 10 + i128::from(digit);
                divisor *= 10;
            }
        }

        total = whole
            .checked_mul(scale)
            .and_then(|n| n.checked_add(fraction_value * scale / divisor))
            .and_then(|n| n.checked_add(total))
            .filter(|n| *n <= i128::from(i64::MAX))
            .ok_or_else(|| format!("Ttl '{}' is out of range", text))?;
    }

    let nanos = total as i64;
    Ok(Duration::nanoseconds(if negative { -nanos } else { nanos }))
}
