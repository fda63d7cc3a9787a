//! Storage abstractions for the study platform
//!
//! The backing document store is modeled as a set of domain-focused
//! traits. Each trait names the atomicity it needs from an
//! implementation: the like toggle is a transactional read-modify-write,
//! the points bump is an in-store increment, everything else is an
//! independent single-record operation.

pub mod memory;
pub mod sqlite;

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

use std::collections::{BTreeSet, HashMap};

use pupitre_core::{
    CardId, CardStatus, Comment, DeckId, FlashcardDeck, PremiumGrant, Resource, ResourceId,
    UserId, UserProfile,
};

use crate::error::ServiceError;

/// Result type for store operations
pub type StoreResult<T> = Result<T, ServiceError>;

/// Premium grant persistence, at most one grant per user
pub trait EntitlementStore: Send + Sync {
    /// Replace whatever grant the user had (full replace, never a merge)
    fn put_grant(&self, grant: PremiumGrant) -> StoreResult<()>;

    /// Get a user's grant, if any
    fn get_grant(&self, user: &UserId) -> StoreResult<Option<PremiumGrant>>;

    /// Delete the grant if present; absence is not an error
    fn delete_grant(&self, user: &UserId) -> StoreResult<()>;

    /// One-pass fetch for listing screens
    fn get_grants(&self, users: &[UserId]) -> StoreResult<HashMap<UserId, PremiumGrant>>;
}

/// User profiles and the points counter
pub trait ProfileStore: Send + Sync {
    /// Create a profile; fails if the user already has one
    fn create_profile(&self, profile: UserProfile) -> StoreResult<()>;

    /// Get a profile by user id
    fn get_profile(&self, user: &UserId) -> StoreResult<Option<UserProfile>>;

    /// Replace the profile's attribute fields. The stored points counter
    /// is preserved; it only moves through `add_points`.
    fn update_profile(&self, profile: UserProfile) -> StoreResult<()>;

    /// Atomic in-store increment, never a read-modify-write of a caller's
    /// stale copy
    fn add_points(&self, user: &UserId, delta: u64) -> StoreResult<()>;

    /// Profiles ordered by points, highest first
    fn top_profiles(&self, limit: usize) -> StoreResult<Vec<UserProfile>>;
}

/// Flashcard decks and per-user card progress
pub trait DeckStore: Send + Sync {
    /// Create or replace a deck
    fn put_deck(&self, deck: FlashcardDeck) -> StoreResult<()>;

    /// Get a deck by id
    fn get_deck(&self, deck: &DeckId) -> StoreResult<Option<FlashcardDeck>>;

    /// All stored decks
    fn list_decks(&self) -> StoreResult<Vec<FlashcardDeck>>;

    /// Delete the deck and every progress record referencing it, as one
    /// logical operation
    fn delete_deck(&self, deck: &DeckId) -> StoreResult<()>;

    /// Progress map for one user and deck; empty if never studied
    fn get_progress(
        &self,
        user: &UserId,
        deck: &DeckId,
    ) -> StoreResult<HashMap<CardId, CardStatus>>;

    /// Merge-upsert of one card's status; sibling entries stay untouched
    fn set_card_status(
        &self,
        user: &UserId,
        deck: &DeckId,
        card: &CardId,
        status: CardStatus,
    ) -> StoreResult<()>;
}

/// Outcome of a like toggle, reflecting the committed state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeOutcome {
    pub liked: bool,
    pub like_count: u64,
}

/// Shared resources with their like sets and comment sub-collections
pub trait EngagementStore: Send + Sync {
    /// Create or replace a resource
    fn put_resource(&self, resource: Resource) -> StoreResult<()>;

    /// Get a resource by id
    fn get_resource(&self, resource: &ResourceId) -> StoreResult<Option<Resource>>;

    /// Atomically flip the user's membership in the like set and adjust
    /// the counter in the same unit. A resource that was never liked
    /// starts from an implicit empty set.
    fn toggle_like(&self, user: &UserId, resource: &ResourceId) -> StoreResult<LikeOutcome>;

    /// Append a comment, then bump the resource's counter. A failed bump
    /// after a successful append surfaces as `CommentCountLag`.
    fn add_comment(&self, comment: Comment) -> StoreResult<()>;

    /// Comments for a resource, oldest first
    fn list_comments(&self, resource: &ResourceId) -> StoreResult<Vec<Comment>>;
}

/// The global set of users excluded from public ranking
pub trait LeaderboardStore: Send + Sync {
    /// Add or remove a user. The backing record is created on first
    /// exclusion; removing a never-excluded user is a no-op.
    fn set_excluded(&self, user: &UserId, excluded: bool) -> StoreResult<()>;

    /// Whether a user is currently excluded
    fn is_excluded(&self, user: &UserId) -> StoreResult<bool>;

    /// The whole exclusion set
    fn excluded_users(&self) -> StoreResult<BTreeSet<UserId>>;
}

/// A complete backend: every store concern in one place.
pub trait Store:
    EntitlementStore + ProfileStore + DeckStore + EngagementStore + LeaderboardStore
{
}

impl<T> Store for T where
    T: EntitlementStore + ProfileStore + DeckStore + EngagementStore + LeaderboardStore
{
}
