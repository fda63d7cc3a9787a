//! Service wiring over a shared store

use std::sync::Arc;

use crate::config::Config;
use crate::decks::DeckService;
use crate::engagement::EngagementService;
use crate::entitlement::EntitlementService;
use crate::leaderboard::LeaderboardService;
use crate::points::PointsLedger;
use crate::profiles::ProfileService;
use crate::progress::ProgressService;
use crate::store::Store;

/// All services over one shared store backend. UI shells hold one of
/// these (usually inside an `Arc`) and call into the service they need.
pub struct AppState<S> {
    pub store: Arc<S>,
    pub profiles: ProfileService<S>,
    pub entitlements: EntitlementService<S>,
    pub decks: DeckService<S>,
    pub progress: ProgressService<S>,
    pub points: PointsLedger<S>,
    pub engagement: EngagementService<S>,
    pub leaderboard: LeaderboardService<S>,
}

impl<S: Store> AppState<S> {
    pub fn new(store: S, config: Config) -> Self {
        let store = Arc::new(store);
        let entitlements = EntitlementService::new(store.clone());

        Self {
            profiles: ProfileService::new(store.clone()),
            decks: DeckService::new(store.clone(), entitlements.clone()),
            progress: ProgressService::new(store.clone()),
            points: PointsLedger::new(store.clone()),
            engagement: EngagementService::new(store.clone()),
            leaderboard: LeaderboardService::new(store.clone(), config.leaderboard_limit),
            entitlements,
            store,
        }
    }
}
