//! Rate-limit headers reported by the API on every response.

use reqwest::header::HeaderMap;
use std::fmt;
use std::time::{Duration, SystemTime};

pub const LIMIT_REQUESTS: &str = "x-ratelimit-limit-requests";
pub const LIMIT_TOKENS: &str = "x-ratelimit-limit-tokens";
pub const REMAINING_REQUESTS: &str = "x-ratelimit-remaining-requests";
pub const REMAINING_TOKENS: &str = "x-ratelimit-remaining-tokens";
pub const RESET_REQUESTS: &str = "x-ratelimit-reset-requests";
pub const RESET_TOKENS: &str = "x-ratelimit-reset-tokens";

/// Immutable view of the six rate-limit headers, captured once per response.
///
/// Missing or malformed numeric headers read as zero; extraction never fails.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateLimitSnapshot {
    pub limit_requests: u64,
    pub limit_tokens: u64,
    pub remaining_requests: u64,
    pub remaining_tokens: u64,
    pub reset_requests: ResetTime,
    pub reset_tokens: ResetTime,
}

impl RateLimitSnapshot {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            limit_requests: header_u64(headers, LIMIT_REQUESTS),
            limit_tokens: header_u64(headers, LIMIT_TOKENS),
            remaining_requests: header_u64(headers, REMAINING_REQUESTS),
            remaining_tokens: header_u64(headers, REMAINING_TOKENS),
            reset_requests: ResetTime(header_str(headers, RESET_REQUESTS)),
            reset_tokens: ResetTime(header_str(headers, RESET_TOKENS)),
        }
    }
}

fn header_str(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

fn header_u64(headers: &HeaderMap, name: &str) -> u64 {
    header_str(headers, name).parse().unwrap_or(0)
}

/// A reset interval as sent by the server, e.g. `"1s"`, `"6m0s"`, `"7.66s"`.
///
/// Kept verbatim; [`ResetTime::duration`] interprets it on demand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ResetTime(pub String);

impl ResetTime {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse the interval. `None` when empty or not a valid duration string.
    pub fn duration(&self) -> Option<Duration> {
        parse_duration(&self.0)
    }

    /// Wall-clock instant at which the budget resets, measured from now.
    pub fn resets_at(&self) -> Option<SystemTime> {
        self.duration().map(|d| SystemTime::now() + d)
    }
}

impl fmt::Display for ResetTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResetTime {
    fn from(s: &str) -> Self {
        ResetTime(s.to_string())
    }
}

/// Parse a sequence of `<decimal><unit>` pairs (`h`, `m`, `s`, `ms`, `us`/`µs`, `ns`).
fn parse_duration(raw: &str) -> Option<Duration> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if s == "0" {
        return Some(Duration::ZERO);
    }

    let mut total = 0f64;
    let mut rest = s;
    while !rest.is_empty() {
        let num_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if num_len == 0 {
            return None;
        }
        let value: f64 = rest[..num_len].parse().ok()?;
        rest = &rest[num_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let secs_per_unit = match &rest[..unit_len] {
            "h" => 3600.0,
            "m" => 60.0,
            "s" => 1.0,
            "ms" => 1e-3,
            "us" | "µs" => 1e-6,
            "ns" => 1e-9,
            _ => return None,
        };
        rest = &rest[unit_len..];
        total += value * secs_per_unit;
    }

    Duration::try_from_secs_f64(total).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_reads_all_six_headers() {
        let mut h = HeaderMap::new();
        h.insert(LIMIT_REQUESTS, HeaderValue::from_static("100"));
        h.insert(LIMIT_TOKENS, HeaderValue::from_static("6000"));
        h.insert(REMAINING_REQUESTS, HeaderValue::from_static("99"));
        h.insert(REMAINING_TOKENS, HeaderValue::from_static("5990"));
        h.insert(RESET_REQUESTS, HeaderValue::from_static("1s"));
        h.insert(RESET_TOKENS, HeaderValue::from_static("1m"));

        let snap = RateLimitSnapshot::from_headers(&h);
        assert_eq!(snap.limit_requests, 100);
        assert_eq!(snap.limit_tokens, 6000);
        assert_eq!(snap.remaining_requests, 99);
        assert_eq!(snap.remaining_tokens, 5990);
        assert_eq!(snap.reset_requests.as_str(), "1s");
        assert_eq!(snap.reset_tokens.as_str(), "1m");
    }

    #[test]
    fn test_missing_or_malformed_headers_are_zero() {
        let mut h = HeaderMap::new();
        h.insert(LIMIT_REQUESTS, HeaderValue::from_static("lots"));
        let snap = RateLimitSnapshot::from_headers(&h);
        assert_eq!(snap, RateLimitSnapshot::default());
        assert!(snap.reset_tokens.is_empty());
    }

    #[test]
    fn test_duration_parsing() {
        assert_eq!(ResetTime::from("1s").duration(), Some(Duration::from_secs(1)));
        assert_eq!(ResetTime::from("1m").duration(), Some(Duration::from_secs(60)));
        assert_eq!(ResetTime::from("6m0s").duration(), Some(Duration::from_secs(360)));
        assert_eq!(ResetTime::from("2ms").duration(), Some(Duration::from_millis(2)));
        assert_eq!(
            ResetTime::from("1h2m3s").duration(),
            Some(Duration::from_secs(3723))
        );
        let d = ResetTime::from("7.66s").duration().unwrap();
        assert!((d.as_secs_f64() - 7.66).abs() < 1e-9);
        assert_eq!(ResetTime::from("").duration(), None);
        assert_eq!(ResetTime::from("soon").duration(), None);
        assert_eq!(ResetTime::from("5").duration(), None);
    }

    #[test]
    fn test_resets_at_is_in_the_future() {
        let at = ResetTime::from("30s").resets_at().unwrap();
        assert!(at > SystemTime::now());
    }
}
