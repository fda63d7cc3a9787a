//! In-memory storage backend

use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;

use pupitre_core::{
    CardId, CardStatus, Comment, DeckId, FlashcardDeck, PremiumGrant, Resource, ResourceId,
    UserId, UserProfile,
};

use super::{
    DeckStore, EngagementStore, EntitlementStore, LeaderboardStore, LikeOutcome, ProfileStore,
    StoreResult,
};
use crate::error::ServiceError;

/// In-memory store backing every trait; the default for tests and demos
pub struct InMemoryStore {
    grants: RwLock<HashMap<UserId, PremiumGrant>>,
    profiles: RwLock<HashMap<UserId, UserProfile>>,
    decks: RwLock<HashMap<DeckId, FlashcardDeck>>,
    progress: RwLock<HashMap<(UserId, DeckId), HashMap<CardId, CardStatus>>>,
    resources: RwLock<HashMap<ResourceId, Resource>>,
    likes: RwLock<HashMap<ResourceId, BTreeSet<UserId>>>,
    comments: RwLock<HashMap<ResourceId, Vec<Comment>>>,
    /// None until the first exclusion, matching the lazily-created record
    exclusions: RwLock<Option<BTreeSet<UserId>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            grants: RwLock::new(HashMap::new()),
            profiles: RwLock::new(HashMap::new()),
            decks: RwLock::new(HashMap::new()),
            progress: RwLock::new(HashMap::new()),
            resources: RwLock::new(HashMap::new()),
            likes: RwLock::new(HashMap::new()),
            comments: RwLock::new(HashMap::new()),
            exclusions: RwLock::new(None),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EntitlementStore for InMemoryStore {
    fn put_grant(&self, grant: PremiumGrant) -> StoreResult<()> {
        self.grants
            .write()
            .unwrap()
            .insert(grant.user_id.clone(), grant);
        Ok(())
    }

    fn get_grant(&self, user: &UserId) -> StoreResult<Option<PremiumGrant>> {
        Ok(self.grants.read().unwrap().get(user).cloned())
    }

    fn delete_grant(&self, user: &UserId) -> StoreResult<()> {
        self.grants.write().unwrap().remove(user);
        Ok(())
    }

    fn get_grants(&self, users: &[UserId]) -> StoreResult<HashMap<UserId, PremiumGrant>> {
        let grants = self.grants.read().unwrap();
        Ok(users
            .iter()
            .filter_map(|u| grants.get(u).map(|g| (u.clone(), g.clone())))
            .collect())
    }
}

impl ProfileStore for InMemoryStore {
    fn create_profile(&self, profile: UserProfile) -> StoreResult<()> {
        let mut profiles = self.profiles.write().unwrap();
        if profiles.contains_key(&profile.id) {
            return Err(ServiceError::UserExists);
        }
        profiles.insert(profile.id.clone(), profile);
        Ok(())
    }

    fn get_profile(&self, user: &UserId) -> StoreResult<Option<UserProfile>> {
        Ok(self.profiles.read().unwrap().get(user).cloned())
    }

    fn update_profile(&self, profile: UserProfile) -> StoreResult<()> {
        let mut profiles = self.profiles.write().unwrap();
        match profiles.get_mut(&profile.id) {
            Some(existing) => {
                // The counter only moves through add_points.
                let points = existing.points;
                *existing = UserProfile { points, ..profile };
                Ok(())
            }
            None => Err(ServiceError::UserNotFound),
        }
    }

    fn add_points(&self, user: &UserId, delta: u64) -> StoreResult<()> {
        let mut profiles = self.profiles.write().unwrap();
        match profiles.get_mut(user) {
            Some(profile) => {
                profile.points += delta;
                Ok(())
            }
            None => Err(ServiceError::UserNotFound),
        }
    }

    fn top_profiles(&self, limit: usize) -> StoreResult<Vec<UserProfile>> {
        let profiles = self.profiles.read().unwrap();
        let mut all: Vec<UserProfile> = profiles.values().cloned().collect();
        all.sort_by(|a, b| b.points.cmp(&a.points).then_with(|| a.id.cmp(&b.id)));
        all.truncate(limit);
        Ok(all)
    }
}

impl DeckStore for InMemoryStore {
    fn put_deck(&self, deck: FlashcardDeck) -> StoreResult<()> {
        self.decks.write().unwrap().insert(deck.id.clone(), deck);
        Ok(())
    }

    fn get_deck(&self, deck: &DeckId) -> StoreResult<Option<FlashcardDeck>> {
        Ok(self.decks.read().unwrap().get(deck).cloned())
    }

    fn list_decks(&self) -> StoreResult<Vec<FlashcardDeck>> {
        Ok(self.decks.read().unwrap().values().cloned().collect())
    }

    fn delete_deck(&self, deck: &DeckId) -> StoreResult<()> {
        self.decks.write().unwrap().remove(deck);

        // Fan-out delete of every progress record for this deck.
        self.progress
            .write()
            .unwrap()
            .retain(|(_, d), _| d != deck);

        Ok(())
    }

    fn get_progress(
        &self,
        user: &UserId,
        deck: &DeckId,
    ) -> StoreResult<HashMap<CardId, CardStatus>> {
        let progress = self.progress.read().unwrap();
        Ok(progress
            .get(&(user.clone(), deck.clone()))
            .cloned()
            .unwrap_or_default())
    }

    fn set_card_status(
        &self,
        user: &UserId,
        deck: &DeckId,
        card: &CardId,
        status: CardStatus,
    ) -> StoreResult<()> {
        let mut progress = self.progress.write().unwrap();
        progress
            .entry((user.clone(), deck.clone()))
            .or_default()
            .insert(card.clone(), status);
        Ok(())
    }
}

impl EngagementStore for InMemoryStore {
    fn put_resource(&self, resource: Resource) -> StoreResult<()> {
        self.resources
            .write()
            .unwrap()
            .insert(resource.id.clone(), resource);
        Ok(())
    }

    fn get_resource(&self, resource: &ResourceId) -> StoreResult<Option<Resource>> {
        Ok(self.resources.read().unwrap().get(resource).cloned())
    }

    fn toggle_like(&self, user: &UserId, resource: &ResourceId) -> StoreResult<LikeOutcome> {
        // Both maps under write locks for the whole toggle, so the
        // membership flip and the counter adjustment commit together.
        let mut resources = self.resources.write().unwrap();
        let record = resources
            .get_mut(resource)
            .ok_or(ServiceError::ResourceNotFound)?;

        let mut likes = self.likes.write().unwrap();
        let set = likes.entry(resource.clone()).or_default();

        let liked = if set.remove(user) {
            record.like_count -= 1;
            false
        } else {
            set.insert(user.clone());
            record.like_count += 1;
            true
        };

        Ok(LikeOutcome {
            liked,
            like_count: record.like_count,
        })
    }

    fn add_comment(&self, comment: Comment) -> StoreResult<()> {
        let mut resources = self.resources.write().unwrap();
        let record = resources
            .get_mut(&comment.resource_id)
            .ok_or(ServiceError::ResourceNotFound)?;

        self.comments
            .write()
            .unwrap()
            .entry(comment.resource_id.clone())
            .or_default()
            .push(comment);
        record.comment_count += 1;

        Ok(())
    }

    fn list_comments(&self, resource: &ResourceId) -> StoreResult<Vec<Comment>> {
        let comments = self.comments.read().unwrap();
        Ok(comments.get(resource).cloned().unwrap_or_default())
    }
}

impl LeaderboardStore for InMemoryStore {
    fn set_excluded(&self, user: &UserId, excluded: bool) -> StoreResult<()> {
        let mut exclusions = self.exclusions.write().unwrap();
        if excluded {
            // Created on first write with the singleton element.
            exclusions
                .get_or_insert_with(BTreeSet::new)
                .insert(user.clone());
        } else if let Some(set) = exclusions.as_mut() {
            set.remove(user);
        }
        Ok(())
    }

    fn is_excluded(&self, user: &UserId) -> StoreResult<bool> {
        let exclusions = self.exclusions.read().unwrap();
        Ok(exclusions.as_ref().is_some_and(|set| set.contains(user)))
    }

    fn excluded_users(&self) -> StoreResult<BTreeSet<UserId>> {
        let exclusions = self.exclusions.read().unwrap();
        Ok(exclusions.clone().unwrap_or_default())
    }
}
