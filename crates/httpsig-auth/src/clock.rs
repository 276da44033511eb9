//! Time source used for `date`, `(created)` and `(expires)`.
//!
//! Signing and parsing read the current time through [`Clock`] so callers
//! (and tests) can pin it.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};

/// RFC 1123 format used for the `Date` header.
pub const RFC1123_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// A source of the current time.
pub trait Clock: Send + Sync + fmt::Debug {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at a fixed instant.
///
/// # Examples
///
/// ```
/// use httpsig_auth::clock::{Clock, FixedClock};
///
/// let clock = FixedClock::from_unix(1_402_170_695);
/// assert_eq!(clock.now().timestamp(), 1_402_170_695);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// A clock fixed at the given unix second. Out-of-range values fall back to the epoch.
    #[must_use]
    pub fn from_unix(seconds: i64) -> Self {
        Self(DateTime::from_timestamp(seconds, 0).unwrap_or_default())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Format an instant as an RFC 1123 `Date` header value.
#[must_use]
pub fn rfc1123(at: DateTime<Utc>) -> String {
    at.format(RFC1123_FORMAT).to_string()
}

/// Parse an RFC 1123 `Date` header value.
#[must_use]
pub fn parse_rfc1123(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value.trim(), RFC1123_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}
