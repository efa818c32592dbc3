//! # uic-sync
//!
//! Keeps the Ultra Instinct Crew website's JSON caches up to date.
//!
//! ## Architecture
//!
//! - **models**: Team and player records as written to the caches
//! - **calculate**: Standings derived from a team's match history
//! - **fetch**: HTTP client for the upstream JSON APIs
//! - **sync**: Sync engine and the PrimeBot / Riot sources
//! - **storage**: Keyed JSON stores with atomic replacement
//! - **config**: Configuration loading and validation

pub mod calculate;
pub mod config;
pub mod fetch;
pub mod models;
pub mod storage;
pub mod sync;

pub use models::*;

use std::time::Duration;

/// Parse a human-friendly duration string (e.g., "1200ms", "2s", "5m").
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Some(n) = s.strip_suffix("ms") {
        return n.trim().parse().ok().map(Duration::from_millis);
    }

    let (num_str, multiplier) = if let Some(n) = s.strip_suffix('h') {
        (n, 3600)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 60)
    } else if let Some(n) = s.strip_suffix('s') {
        (n, 1)
    } else {
        // Default to milliseconds
        return s.parse().ok().map(Duration::from_millis);
    };

    let num: u64 = num_str.trim().parse().ok()?;
    Some(Duration::from_secs(num.checked_mul(multiplier)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_millis() {
        assert_eq!(parse_duration("1200ms"), Some(Duration::from_millis(1200)));
    }

    #[test]
    fn test_parse_duration_minutes() {
        assert_eq!(parse_duration("5m"), Some(Duration::from_secs(300)));
    }

    #[test]
    fn test_parse_duration_seconds() {
        assert_eq!(parse_duration("2s"), Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_parse_duration_hours() {
        assert_eq!(parse_duration("1h"), Some(Duration::from_secs(3600)));
    }

    #[test]
    fn test_parse_duration_default_millis() {
        assert_eq!(parse_duration("500"), Some(Duration::from_millis(500)));
    }

    #[test]
    fn test_parse_duration_invalid() {
        assert_eq!(parse_duration("abc"), None);
        assert_eq!(parse_duration("ms"), None);
    }

    #[test]
    fn test_parse_duration_overflow() {
        assert_eq!(parse_duration("9999999999999999999h"), None);
    }

    #[test]
    fn test_parse_duration_empty() {
        assert_eq!(parse_duration(""), None);
    }

    #[test]
    fn test_parse_duration_zero() {
        assert_eq!(parse_duration("0ms"), Some(Duration::ZERO));
    }
}
