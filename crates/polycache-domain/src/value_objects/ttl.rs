//! Entry time-to-live
//!
//! A TTL is a whole number of seconds; zero means the entry never expires.
//! Callers may also supply relative expressions (`"90s"`, `"2 minutes"`,
//! `"+1 hour"`), converted to seconds at parse time.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Time-to-live in seconds; `Ttl::FOREVER` (zero) disables expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ttl(u64);

impl Ttl {
    /// Entry never expires
    pub const FOREVER: Ttl = Ttl(0);

    /// A TTL of `secs` seconds
    pub fn from_secs(secs: u64) -> Self {
        Ttl(secs)
    }

    /// Parse a TTL: a bare number is seconds, anything else is a relative
    /// duration expression handled by humantime (a leading `+` is allowed).
    pub fn parse(expr: &str) -> Result<Self> {
        let trimmed = expr.trim();
        if trimmed.is_empty() {
            return Err(Error::invalid_value("empty duration expression"));
        }
        if let Ok(secs) = trimmed.parse::<u64>() {
            return Ok(Ttl(secs));
        }
        // "2 minutes" and "+1 hour" both normalize to humantime's compact form
        let compact: String = trimmed
            .trim_start_matches('+')
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        let duration = humantime::parse_duration(&compact).map_err(|e| {
            Error::invalid_value(format!("unparseable duration expression {expr:?}: {e}"))
        })?;
        Ok(Ttl(duration.as_secs()))
    }

    /// Seconds until expiry; zero means forever
    pub fn as_secs(self) -> u64 {
        self.0
    }

    /// True when this TTL disables expiry
    pub fn is_forever(self) -> bool {
        self.0 == 0
    }

    /// Absolute expiry timestamp for an entry written at `now` (unix
    /// seconds); zero marks a never-expiring entry.
    pub fn expires_at(self, now: i64) -> i64 {
        if self.0 == 0 {
            0
        } else {
            now.saturating_add(self.0 as i64)
        }
    }
}

/// Current unix timestamp in seconds
pub fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}

/// True when an entry stamped with `expires_at` is past its expiry at
/// `now`; a zero stamp never expires.
pub fn stamp_expired(expires_at: i64, now: i64) -> bool {
    expires_at != 0 && now > expires_at
}

impl From<Duration> for Ttl {
    fn from(d: Duration) -> Self {
        Ttl(d.as_secs())
    }
}

impl From<u64> for Ttl {
    fn from(secs: u64) -> Self {
        Ttl(secs)
    }
}

impl FromStr for Ttl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ttl::parse(s)
    }
}

impl fmt::Display for Ttl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0 {
            write!(f, "forever")
        } else {
            write!(f, "{}s", self.0)
        }
    }
}
