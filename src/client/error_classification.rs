//! Error classification logic

/// Statuses the dispatcher treats as worth another attempt.
///
/// Only `500 Internal Server Error` and `503 Service Unavailable` qualify. A
/// `429` is left to the caller, who can inspect the rate limit snapshot.
pub fn is_transient_status(status: u16) -> bool {
    matches!(status, 500 | 503)
}

/// Anything outside `[200, 400)` is a failed response.
pub fn is_failure_status(status: u16) -> bool {
    !(200..400).contains(&status)
}
