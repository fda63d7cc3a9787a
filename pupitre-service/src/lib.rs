//! Pupitre service library
//!
//! Storage backends and services for the pupitre study platform. This
//! crate is consumed directly by UI shells; it exposes function-call
//! contracts, not a wire protocol. The domain rules themselves live in
//! `pupitre-core`; everything here is the plumbing around them:
//! store traits with in-memory and SQLite backends, and one service per
//! platform concern (entitlement, decks, progress, points, engagement,
//! leaderboard).

pub mod config;
pub mod decks;
pub mod engagement;
pub mod entitlement;
pub mod error;
pub mod leaderboard;
pub mod points;
pub mod profiles;
pub mod progress;
pub mod state;
pub mod store;

pub use config::Config;
pub use decks::{DeckAccess, DeckService};
pub use engagement::EngagementService;
pub use entitlement::EntitlementService;
pub use error::ServiceError;
pub use leaderboard::{LeaderboardService, Standing};
pub use points::PointsLedger;
pub use profiles::ProfileService;
pub use progress::ProgressService;
pub use state::AppState;
pub use store::{
    DeckStore, EngagementStore, EntitlementStore, InMemoryStore, LeaderboardStore, LikeOutcome,
    ProfileStore, SqliteStore, Store, StoreResult,
};
