//! Tests for likes and comments on shared resources

mod common;

use common::{memory_state, sample_resource, sqlite_state};
use pupitre_core::{ResourceId, UserId};
use pupitre_service::{LikeOutcome, ServiceError};

#[test]
fn test_first_like_initializes_implicitly() {
    let state = memory_state();
    let alice = UserId("alice".into());
    state.engagement.publish(sample_resource("r1", "Fiche de révision")).unwrap();

    // No separate initialization call: a never-liked resource starts
    // from an empty set.
    let outcome = state
        .engagement
        .toggle_like(&alice, &ResourceId("r1".into()))
        .unwrap();
    assert_eq!(outcome, LikeOutcome { liked: true, like_count: 1 });
}

#[test]
fn test_toggle_twice_restores_the_original_state() {
    let state = memory_state();
    let alice = UserId("alice".into());
    let bob = UserId("bob".into());
    let id = ResourceId("r1".into());
    state.engagement.publish(sample_resource("r1", "Fiche")).unwrap();

    // Start from a non-empty state so the involution is visible.
    state.engagement.toggle_like(&bob, &id).unwrap();

    let first = state.engagement.toggle_like(&alice, &id).unwrap();
    assert_eq!(first, LikeOutcome { liked: true, like_count: 2 });

    let second = state.engagement.toggle_like(&alice, &id).unwrap();
    assert_eq!(second, LikeOutcome { liked: false, like_count: 1 });

    // Bob's like is untouched.
    let resource = state.engagement.resource(&id).unwrap().unwrap();
    assert_eq!(resource.like_count, 1);
}

#[test]
fn test_like_count_tracks_the_set() {
    let state = memory_state();
    let id = ResourceId("r1".into());
    state.engagement.publish(sample_resource("r1", "Fiche")).unwrap();

    for i in 0..5 {
        let user = UserId(format!("u{i}"));
        state.engagement.toggle_like(&user, &id).unwrap();
    }

    let resource = state.engagement.resource(&id).unwrap().unwrap();
    assert_eq!(resource.like_count, 5);
}

#[test]
fn test_liking_a_missing_resource_fails() {
    let state = memory_state();
    let alice = UserId("alice".into());

    let result = state
        .engagement
        .toggle_like(&alice, &ResourceId("nope".into()));
    assert!(matches!(result, Err(ServiceError::ResourceNotFound)));
}

#[test]
fn test_comment_appends_and_bumps_the_counter() {
    let state = memory_state();
    let alice = UserId("alice".into());
    let id = ResourceId("r1".into());
    state.engagement.publish(sample_resource("r1", "Annales")).unwrap();

    let comment = state
        .engagement
        .add_comment(&alice, &id, "Très clair, merci !")
        .unwrap();
    assert_eq!(comment.author, alice);
    assert_eq!(comment.body, "Très clair, merci !");

    state
        .engagement
        .add_comment(&UserId("bob".into()), &id, "Page 3 ?")
        .unwrap();

    let comments = state.engagement.comments(&id).unwrap();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0].body, "Très clair, merci !");

    let resource = state.engagement.resource(&id).unwrap().unwrap();
    assert_eq!(resource.comment_count, 2);
}

#[test]
fn test_commenting_a_missing_resource_fails() {
    let state = memory_state();

    let result =
        state
            .engagement
            .add_comment(&UserId("alice".into()), &ResourceId("nope".into()), "?");
    assert!(matches!(result, Err(ServiceError::ResourceNotFound)));
}

#[test]
fn test_toggle_involution_on_sqlite() {
    let (state, _dir) = sqlite_state();
    let alice = UserId("alice".into());
    let id = ResourceId("r1".into());
    state.engagement.publish(sample_resource("r1", "Fiche")).unwrap();

    let first = state.engagement.toggle_like(&alice, &id).unwrap();
    assert_eq!(first, LikeOutcome { liked: true, like_count: 1 });

    let second = state.engagement.toggle_like(&alice, &id).unwrap();
    assert_eq!(second, LikeOutcome { liked: false, like_count: 0 });
}

#[test]
fn test_concurrent_toggles_by_different_users() {
    let state = memory_state();
    let id = ResourceId("r1".into());
    state.engagement.publish(sample_resource("r1", "Fiche")).unwrap();

    std::thread::scope(|scope| {
        for i in 0..8 {
            let id = id.clone();
            let state = &state;
            scope.spawn(move || {
                let user = UserId(format!("u{i}"));
                state.engagement.toggle_like(&user, &id).unwrap();
            });
        }
    });

    // Eight distinct users each added one like; none were lost.
    let resource = state.engagement.resource(&id).unwrap().unwrap();
    assert_eq!(resource.like_count, 8);
}
