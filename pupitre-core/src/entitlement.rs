//! Premium grants and their evaluation
//!
//! A grant is a time window during which a user holds premium access.
//! Evaluation is a pure function of the grant record and an instant;
//! cleanup of stale grants is the service layer's concern.

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::ids::UserId;

/// Length class of a premium grant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrantDuration {
    Week,
    Month,
    Year,
}

impl GrantDuration {
    pub fn as_str(&self) -> &'static str {
        match self {
            GrantDuration::Week => "week",
            GrantDuration::Month => "month",
            GrantDuration::Year => "year",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "week" => Some(GrantDuration::Week),
            "month" => Some(GrantDuration::Month),
            "year" => Some(GrantDuration::Year),
            _ => None,
        }
    }

    /// Expiry instant for a grant starting at `start`.
    ///
    /// A "year" is an academic year: nine calendar months, not twelve.
    pub fn expiry_from(&self, start: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            GrantDuration::Week => start + Duration::days(7),
            GrantDuration::Month => start + Months::new(1),
            GrantDuration::Year => start + Months::new(9),
        }
    }
}

/// A premium grant, at most one per user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PremiumGrant {
    pub user_id: UserId,
    pub started_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub duration: GrantDuration,
}

impl PremiumGrant {
    /// Grant running from `start` for `duration`, dates taken from the
    /// duration table.
    pub fn starting_at(user_id: UserId, duration: GrantDuration, start: DateTime<Utc>) -> Self {
        Self {
            user_id,
            started_at: start,
            expires_at: duration.expiry_from(start),
            duration,
        }
    }

    /// Grant with explicit dates. Rejects a window that ends at or before
    /// its start.
    pub fn with_dates(
        user_id: UserId,
        duration: GrantDuration,
        started_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<Self, Error> {
        if expires_at <= started_at {
            return Err(Error::GrantDatesInverted);
        }
        Ok(Self {
            user_id,
            started_at,
            expires_at,
            duration,
        })
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// Derived premium state, recomputed on every read and never stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PremiumStatus {
    pub is_premium: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

impl PremiumStatus {
    /// Status of a user without any grant
    pub fn none() -> Self {
        Self {
            is_premium: false,
            expires_at: None,
        }
    }
}

/// Evaluate a grant against the given instant.
///
/// A grant whose window ends exactly at `now` still counts as premium;
/// an expired grant reports its old expiry so callers can show when
/// access lapsed.
pub fn evaluate_at(grant: Option<&PremiumGrant>, now: DateTime<Utc>) -> PremiumStatus {
    match grant {
        None => PremiumStatus::none(),
        Some(g) if g.is_expired_at(now) => PremiumStatus {
            is_premium: false,
            expires_at: Some(g.expires_at),
        },
        Some(g) => PremiumStatus {
            is_premium: true,
            expires_at: Some(g.expires_at),
        },
    }
}
