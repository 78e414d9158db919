//! Environment variable parsing helpers
//!
//! Used by `DbConfig` and by service configuration so that missing or
//! malformed variables fall back to defaults instead of panicking.

use std::str::FromStr;

/// Parse an environment variable, falling back to `default` when it is
/// missing or does not parse
pub fn parse_env_with_default<T: FromStr>(key: &str, default: T) -> T {
    parse_env_optional(key).unwrap_or(default)
}

/// Parse an environment variable, returning None if missing or invalid.
/// Empty values count as missing.
fn parse_env_optional<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .and_then(|v| v.trim().parse().ok())
}
