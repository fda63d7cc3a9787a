//! Per-user, per-deck card progress

use std::collections::HashMap;
use std::sync::Arc;

use pupitre_core::{CardId, CardStatus, DeckId, UserId};

use crate::error::ServiceError;
use crate::store::DeckStore;

pub struct ProgressService<S> {
    store: Arc<S>,
}

impl<S: DeckStore> ProgressService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Progress map for one user and deck. A user who never studied the
    /// deck gets an empty map, not an error.
    pub fn progress(
        &self,
        user: &UserId,
        deck: &DeckId,
    ) -> Result<HashMap<CardId, CardStatus>, ServiceError> {
        self.store.get_progress(user, deck)
    }

    /// Record one card's status. The upsert addresses a single card key,
    /// so sibling statuses in the same deck are never clobbered and
    /// concurrent calls for different cards don't lose updates.
    pub fn set_card_status(
        &self,
        user: &UserId,
        deck: &DeckId,
        card: &CardId,
        status: CardStatus,
    ) -> Result<(), ServiceError> {
        if self.store.get_deck(deck)?.is_none() {
            return Err(ServiceError::DeckNotFound);
        }
        self.store.set_card_status(user, deck, card, status)
    }
}
