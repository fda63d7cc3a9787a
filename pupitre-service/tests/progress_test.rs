//! Tests for card progress: absence, merge semantics, per-card upserts

mod common;

use common::{enroll, memory_state, sample_deck, sqlite_state};
use pupitre_core::{CardId, CardStatus, DeckId, Owner};
use pupitre_service::ServiceError;

#[test]
fn test_unstudied_deck_has_empty_progress() {
    let state = memory_state();
    let alice = enroll(&state, "alice", "Alice", "Terminale", "D");

    // Absence is a normal value, not an error.
    let progress = state
        .progress
        .progress(&alice, &DeckId("never-studied".into()))
        .unwrap();
    assert!(progress.is_empty());
}

#[test]
fn test_merge_keeps_sibling_cards() {
    let state = memory_state();
    let alice = enroll(&state, "alice", "Alice", "Terminale", "D");
    let deck = state
        .decks
        .create(Owner::System, sample_deck("Maths", true))
        .unwrap();

    state
        .progress
        .set_card_status(&alice, &deck.id, &CardId("c1".into()), CardStatus::Mastered)
        .unwrap();
    state
        .progress
        .set_card_status(&alice, &deck.id, &CardId("c2".into()), CardStatus::Learning)
        .unwrap();

    let progress = state.progress.progress(&alice, &deck.id).unwrap();
    assert_eq!(progress.len(), 2);
    assert_eq!(progress[&CardId("c1".into())], CardStatus::Mastered);
    assert_eq!(progress[&CardId("c2".into())], CardStatus::Learning);
    // c3 was never reviewed, so it has no entry at all.
    assert!(!progress.contains_key(&CardId("c3".into())));
}

#[test]
fn test_reviewing_again_overwrites_one_card() {
    let state = memory_state();
    let alice = enroll(&state, "alice", "Alice", "Terminale", "D");
    let deck = state
        .decks
        .create(Owner::System, sample_deck("Maths", true))
        .unwrap();

    state
        .progress
        .set_card_status(&alice, &deck.id, &CardId("c1".into()), CardStatus::Learning)
        .unwrap();
    state
        .progress
        .set_card_status(&alice, &deck.id, &CardId("c2".into()), CardStatus::Mastered)
        .unwrap();
    state
        .progress
        .set_card_status(&alice, &deck.id, &CardId("c1".into()), CardStatus::Mastered)
        .unwrap();

    let progress = state.progress.progress(&alice, &deck.id).unwrap();
    assert_eq!(progress[&CardId("c1".into())], CardStatus::Mastered);
    assert_eq!(progress[&CardId("c2".into())], CardStatus::Mastered);
}

#[test]
fn test_progress_is_per_user() {
    let state = memory_state();
    let alice = enroll(&state, "alice", "Alice", "Terminale", "D");
    let bob = enroll(&state, "bob", "Bob", "Terminale", "D");
    let deck = state
        .decks
        .create(Owner::System, sample_deck("Maths", true))
        .unwrap();

    state
        .progress
        .set_card_status(&alice, &deck.id, &CardId("c1".into()), CardStatus::Mastered)
        .unwrap();

    assert!(state.progress.progress(&bob, &deck.id).unwrap().is_empty());
}

#[test]
fn test_recording_against_missing_deck_fails() {
    let state = memory_state();
    let alice = enroll(&state, "alice", "Alice", "Terminale", "D");

    let result = state.progress.set_card_status(
        &alice,
        &DeckId("nope".into()),
        &CardId("c1".into()),
        CardStatus::Learning,
    );
    assert!(matches!(result, Err(ServiceError::DeckNotFound)));
}

#[test]
fn test_merge_semantics_on_sqlite() {
    let (state, _dir) = sqlite_state();
    let alice = enroll(&state, "alice", "Alice", "Terminale", "D");
    let deck = state
        .decks
        .create(Owner::System, sample_deck("Maths", true))
        .unwrap();

    state
        .progress
        .set_card_status(&alice, &deck.id, &CardId("c1".into()), CardStatus::Mastered)
        .unwrap();
    state
        .progress
        .set_card_status(&alice, &deck.id, &CardId("c2".into()), CardStatus::Learning)
        .unwrap();

    let progress = state.progress.progress(&alice, &deck.id).unwrap();
    assert_eq!(progress.len(), 2);
    assert_eq!(progress[&CardId("c1".into())], CardStatus::Mastered);
    assert_eq!(progress[&CardId("c2".into())], CardStatus::Learning);
}
