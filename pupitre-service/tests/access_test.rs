//! Tests for the study access path over the policy gate

mod common;

use chrono::Utc;
use common::{enroll, memory_state, sample_deck};
use pupitre_core::{DeckId, DenyReason, GrantDuration, Owner, UserId};
use pupitre_service::{DeckAccess, DeckStore, EntitlementStore, ServiceError};

#[test]
fn test_public_deck_needs_premium_for_non_owners() {
    let state = memory_state();
    let alice = enroll(&state, "alice", "Alice", "Terminale", "D");
    let bob = UserId("bob".into());

    // Bob's deck is public; stored directly since user-created decks are
    // forced private by the service.
    let deck = sample_deck("Suites numériques", true)
        .into_deck(DeckId("d1".into()), Owner::User(bob.clone()), Utc::now())
        .unwrap();
    state.store.put_deck(deck).unwrap();

    // Alice without premium: upsell.
    let access = state.decks.open(&alice, &DeckId("d1".into())).unwrap();
    assert_eq!(access, DeckAccess::Denied(DenyReason::PremiumRequired));

    // Alice with premium: in.
    state.entitlements.activate(&alice, GrantDuration::Month).unwrap();
    let access = state.decks.open(&alice, &DeckId("d1".into())).unwrap();
    assert!(matches!(access, DeckAccess::Granted(_)));
}

#[test]
fn test_private_deck_is_owner_only() {
    let state = memory_state();
    let alice = enroll(&state, "alice", "Alice", "Terminale", "D");
    let bob = UserId("bob".into());

    let deck = sample_deck("Révisions perso", false)
        .into_deck(DeckId("d2".into()), Owner::User(bob.clone()), Utc::now())
        .unwrap();
    state.store.put_deck(deck).unwrap();

    // Premium does not open someone else's private deck.
    state.entitlements.activate(&alice, GrantDuration::Year).unwrap();
    let access = state.decks.open(&alice, &DeckId("d2".into())).unwrap();
    assert_eq!(access, DeckAccess::Denied(DenyReason::NotOwner));

    // The owner gets in without any entitlement.
    let access = state.decks.open(&bob, &DeckId("d2".into())).unwrap();
    assert!(matches!(access, DeckAccess::Granted(_)));
}

#[test]
fn test_system_deck_is_gated_like_any_public_deck() {
    let state = memory_state();
    let alice = enroll(&state, "alice", "Alice", "Terminale", "D");

    let created = state
        .decks
        .create(Owner::System, sample_deck("Conjugaison", true))
        .unwrap();

    let access = state.decks.open(&alice, &created.id).unwrap();
    assert_eq!(access, DeckAccess::Denied(DenyReason::PremiumRequired));

    state.entitlements.activate(&alice, GrantDuration::Week).unwrap();
    let access = state.decks.open(&alice, &created.id).unwrap();
    assert!(matches!(access, DeckAccess::Granted(_)));
}

#[test]
fn test_open_missing_deck_is_an_error() {
    let state = memory_state();
    let alice = enroll(&state, "alice", "Alice", "Terminale", "D");

    let result = state.decks.open(&alice, &DeckId("nope".into()));
    assert!(matches!(result, Err(ServiceError::DeckNotFound)));
}

#[test]
fn test_opening_with_an_expired_grant_denies_and_reaps() {
    let state = memory_state();
    let alice = enroll(&state, "alice", "Alice", "Terminale", "D");

    let created = state
        .decks
        .create(Owner::System, sample_deck("Géographie", true))
        .unwrap();

    state.store.put_grant(common::expired_grant(&alice)).unwrap();

    let access = state.decks.open(&alice, &created.id).unwrap();
    assert_eq!(access, DeckAccess::Denied(DenyReason::PremiumRequired));

    // The open consulted the single-user path, which reaps.
    assert!(state.store.get_grant(&alice).unwrap().is_none());
}
