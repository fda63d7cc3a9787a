//! User profile records and activity points

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ResourceId, UserId};

/// Current profile record layout version
pub const PROFILE_VERSION: u32 = 1;

/// A user's profile.
///
/// Every collection-valued field defaults to empty; absence is never
/// modeled as null. The `points` counter is only ever moved through the
/// points ledger's atomic increment, never by profile updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub version: u32,
    pub id: UserId,
    pub display_name: String,
    pub school: Option<String>,
    pub class_name: Option<String>,
    pub series: Option<String>,
    pub contact: Option<String>,
    pub points: u64,
    pub saved_courses: BTreeSet<ResourceId>,
    pub saved_resources: BTreeSet<ResourceId>,
    pub requests_sent: BTreeSet<UserId>,
    pub requests_received: BTreeSet<UserId>,
    pub read_admin_notifications: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    /// Fresh profile with every optional field unset and every collection
    /// empty.
    pub fn new(id: UserId, display_name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            version: PROFILE_VERSION,
            id,
            display_name: display_name.into(),
            school: None,
            class_name: None,
            series: None,
            contact: None,
            points: 0,
            saved_courses: BTreeSet::new(),
            saved_resources: BTreeSet::new(),
            requests_sent: BTreeSet::new(),
            requests_received: BTreeSet::new(),
            read_admin_notifications: BTreeSet::new(),
            created_at,
        }
    }
}

/// Point-earning activities. The ledger only ever adds; there is no
/// deduction in this domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    FlashcardReview,
    ChapterReview,
}

impl Activity {
    pub fn points(&self) -> u64 {
        match self {
            Activity::FlashcardReview => 1,
            Activity::ChapterReview => 5,
        }
    }
}
