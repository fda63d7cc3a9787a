//! Deck lifecycle and the study access path

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use pupitre_core::{
    can_access, AccessDecision, DeckId, DenyReason, FlashcardDeck, NewDeck, Owner, UserId,
};

use crate::entitlement::EntitlementService;
use crate::error::ServiceError;
use crate::store::{DeckStore, EntitlementStore, ProfileStore};

/// Outcome of opening a deck for study. A denial is an ordinary value;
/// presenting the upsell is the caller's concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeckAccess {
    Granted(FlashcardDeck),
    Denied(DenyReason),
}

pub struct DeckService<S> {
    store: Arc<S>,
    entitlements: EntitlementService<S>,
}

impl<S: DeckStore + ProfileStore + EntitlementStore> DeckService<S> {
    pub fn new(store: Arc<S>, entitlements: EntitlementService<S>) -> Self {
        Self {
            store,
            entitlements,
        }
    }

    /// Create a deck. User-authored decks are always private and target
    /// exactly the author's own class and series; system decks keep the
    /// targeting they were given.
    pub fn create(&self, owner: Owner, mut new_deck: NewDeck) -> Result<FlashcardDeck, ServiceError> {
        if let Owner::User(user) = &owner {
            let profile = self
                .store
                .get_profile(user)?
                .ok_or(ServiceError::UserNotFound)?;
            new_deck.is_public = false;
            new_deck.classes = profile.class_name.into_iter().collect();
            new_deck.series = profile.series.into_iter().collect();
        }

        let deck = new_deck.into_deck(
            DeckId(Uuid::new_v4().to_string()),
            owner,
            Utc::now(),
        )?;

        tracing::debug!(deck = %deck.id, title = %deck.title, "Creating deck");
        self.store.put_deck(deck.clone())?;
        Ok(deck)
    }

    pub fn get(&self, deck: &DeckId) -> Result<Option<FlashcardDeck>, ServiceError> {
        self.store.get_deck(deck)
    }

    /// Replace the deck's content fields. Only the owner or the system
    /// may edit; identity and creation date are kept.
    pub fn update(
        &self,
        actor: &Owner,
        deck_id: &DeckId,
        update: NewDeck,
    ) -> Result<FlashcardDeck, ServiceError> {
        let existing = self
            .store
            .get_deck(deck_id)?
            .ok_or(ServiceError::DeckNotFound)?;
        if !may_edit(actor, &existing.owner) {
            return Err(ServiceError::Forbidden);
        }

        let deck = update.into_deck(existing.id, existing.owner, existing.created_at)?;
        self.store.put_deck(deck.clone())?;
        Ok(deck)
    }

    /// Delete a deck. The store drops every progress record referencing
    /// it in the same operation, so no orphaned progress survives.
    pub fn delete(&self, actor: &Owner, deck_id: &DeckId) -> Result<(), ServiceError> {
        let existing = self
            .store
            .get_deck(deck_id)?
            .ok_or(ServiceError::DeckNotFound)?;
        if !may_edit(actor, &existing.owner) {
            return Err(ServiceError::Forbidden);
        }

        tracing::debug!(deck = %deck_id, "Deleting deck and its progress records");
        self.store.delete_deck(deck_id)
    }

    /// Study entry point: fetch the deck and run the access gate over
    /// ownership, visibility, and the caller's entitlement.
    pub fn open(&self, user: &UserId, deck_id: &DeckId) -> Result<DeckAccess, ServiceError> {
        let deck = self
            .store
            .get_deck(deck_id)?
            .ok_or(ServiceError::DeckNotFound)?;

        let premium = self.entitlements.status(user);
        match can_access(user, &deck, &premium) {
            AccessDecision::Allow => Ok(DeckAccess::Granted(deck)),
            AccessDecision::Deny(reason) => Ok(DeckAccess::Denied(reason)),
        }
    }

    /// Decks that show up in the user's listing: their own plus any
    /// targeting their class or series. Listing is a filter, not an
    /// access decision; `open` still gates actual study.
    pub fn list_for(&self, user: &UserId) -> Result<Vec<FlashcardDeck>, ServiceError> {
        let profile = self
            .store
            .get_profile(user)?
            .ok_or(ServiceError::UserNotFound)?;
        let decks = self.store.list_decks()?;

        Ok(decks
            .into_iter()
            .filter(|d| {
                d.owner.is_user(user)
                    || profile
                        .class_name
                        .as_ref()
                        .is_some_and(|c| d.classes.contains(c))
                    || profile.series.as_ref().is_some_and(|s| d.series.contains(s))
            })
            .collect())
    }
}

fn may_edit(actor: &Owner, owner: &Owner) -> bool {
    match actor {
        Owner::System => true,
        Owner::User(user) => owner.is_user(user),
    }
}
