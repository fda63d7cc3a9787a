//! Public ranking and the admin exclusion set

use std::sync::Arc;

use pupitre_core::UserId;

use crate::error::ServiceError;
use crate::store::{LeaderboardStore, ProfileStore};

/// One row of the public ranking
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standing {
    pub user_id: UserId,
    pub display_name: String,
    pub points: u64,
}

pub struct LeaderboardService<S> {
    store: Arc<S>,
    limit: usize,
}

impl<S: ProfileStore + LeaderboardStore> LeaderboardService<S> {
    pub fn new(store: Arc<S>, limit: usize) -> Self {
        Self { store, limit }
    }

    /// Add or remove a user from the global exclusion set. The backing
    /// record is created on the first exclusion.
    pub fn set_excluded(&self, user: &UserId, excluded: bool) -> Result<(), ServiceError> {
        tracing::debug!(user = %user, excluded, "Updating leaderboard exclusion");
        self.store.set_excluded(user, excluded)
    }

    pub fn is_excluded(&self, user: &UserId) -> Result<bool, ServiceError> {
        self.store.is_excluded(user)
    }

    /// Top users by points with excluded users filtered out. Over-fetches
    /// by the exclusion count so a full page survives the filter.
    pub fn standings(&self) -> Result<Vec<Standing>, ServiceError> {
        let excluded = self.store.excluded_users()?;
        let profiles = self.store.top_profiles(self.limit + excluded.len())?;

        Ok(profiles
            .into_iter()
            .filter(|p| !excluded.contains(&p.id))
            .take(self.limit)
            .map(|p| Standing {
                user_id: p.id,
                display_name: p.display_name,
                points: p.points,
            })
            .collect())
    }
}
