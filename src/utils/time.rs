use chrono::{DateTime, Duration, Utc};

/// Tokens are treated as expired this long before their literal expiry.
pub const EXPIRY_SKEW_SECONDS: i64 = 60;

/// Absolute expiry for a token issued at `issued_at` and valid for `expires_in` seconds
pub fn expires_at(issued_at: DateTime<Utc>, expires_in: i64) -> DateTime<Utc> {
    issued_at + Duration::seconds(expires_in)
}

/// Whether a token expiring at `expires_at` should no longer be used at `now`
pub fn is_expired(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now >= expires_at - Duration::seconds(EXPIRY_SKEW_SECONDS)
}
