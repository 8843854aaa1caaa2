//! Stored attribution record and its wire format

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utm_keeper_params::ParameterSet;

pub const MILLIS_PER_DAY: i64 = 86_400_000;

/// A captured parameter set with its capture and expiry times.
///
/// Serialized as `{"params": {...}, "timestamp": ms, "expiresAt": ms}`.
/// Unknown fields are ignored; a missing `expiresAt` reads as already expired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub params: ParameterSet,
    #[serde(rename = "timestamp")]
    pub captured_at: i64,
    #[serde(rename = "expiresAt", default = "already_expired")]
    pub expires_at: i64,
}

fn already_expired() -> i64 {
    i64::MIN
}

impl StoredRecord {
    /// Record captured at `now` that lives for `expiration_days`
    pub fn new(params: ParameterSet, now: i64, expiration_days: u32) -> Self {
        let window = i64::from(expiration_days).saturating_mul(MILLIS_PER_DAY);
        Self {
            params,
            captured_at: now,
            expires_at: now.saturating_add(window),
        }
    }

    /// Expired once `now` reaches `expires_at`
    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.expires_at
    }

    pub fn captured_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.captured_at)
    }

    pub fn expires_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.expires_at)
    }
}
