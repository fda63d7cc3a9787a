//! Common test utilities for service integration tests
#![allow(dead_code)]

use std::collections::{BTreeSet, HashMap};

use chrono::{Duration, Utc};
use tempfile::TempDir;

use pupitre_core::{
    Card, CardId, GrantDuration, NewDeck, Owner, PremiumGrant, Resource, ResourceId, UserId,
};
use pupitre_service::{
    AppState, Config, EntitlementStore, InMemoryStore, ServiceError, SqliteStore, Store,
    StoreResult,
};

/// Install a test subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn memory_state() -> AppState<InMemoryStore> {
    init_tracing();
    AppState::new(InMemoryStore::new(), Config::default())
}

pub fn sqlite_state() -> (AppState<SqliteStore>, TempDir) {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let store = SqliteStore::open(dir.path().join("test.db")).unwrap();
    (AppState::new(store, Config::default()), dir)
}

/// Create a student profile enrolled in a class and series.
pub fn enroll<S: Store>(
    state: &AppState<S>,
    id: &str,
    name: &str,
    class: &str,
    series: &str,
) -> UserId {
    let user = UserId(id.into());
    let mut profile = state.profiles.create(user.clone(), name).unwrap();
    profile.class_name = Some(class.into());
    profile.series = Some(series.into());
    state.profiles.update(profile).unwrap();
    user
}

/// A three-card deck submission targeting Terminale D.
pub fn sample_deck(title: &str, is_public: bool) -> NewDeck {
    NewDeck {
        title: title.into(),
        subject: "maths".into(),
        is_public,
        classes: BTreeSet::from(["Terminale".to_string()]),
        series: BTreeSet::from(["D".to_string()]),
        cards: vec![
            Card {
                id: CardId("c1".into()),
                question: "Dérivée de x²".into(),
                answer: "2x".into(),
            },
            Card {
                id: CardId("c2".into()),
                question: "Limite de 1/x en +∞".into(),
                answer: "0".into(),
            },
            Card {
                id: CardId("c3".into()),
                question: "Primitive de cos".into(),
                answer: "sin".into(),
            },
        ],
    }
}

/// A public system resource ready for likes and comments.
pub fn sample_resource(id: &str, title: &str) -> Resource {
    Resource::new(ResourceId(id.into()), title, Owner::System, Utc::now())
}

/// A week grant whose window closed well in the past.
pub fn expired_grant(user: &UserId) -> PremiumGrant {
    let start = Utc::now() - Duration::days(30);
    PremiumGrant::with_dates(
        user.clone(),
        GrantDuration::Week,
        start,
        start + Duration::days(7),
    )
    .unwrap()
}

/// Entitlement store stub whose every operation fails, for exercising the
/// fail-closed read policy.
pub struct FailingStore;

impl EntitlementStore for FailingStore {
    fn put_grant(&self, _grant: PremiumGrant) -> StoreResult<()> {
        Err(ServiceError::Store("backend offline".into()))
    }

    fn get_grant(&self, _user: &UserId) -> StoreResult<Option<PremiumGrant>> {
        Err(ServiceError::Store("backend offline".into()))
    }

    fn delete_grant(&self, _user: &UserId) -> StoreResult<()> {
        Err(ServiceError::Store("backend offline".into()))
    }

    fn get_grants(&self, _users: &[UserId]) -> StoreResult<HashMap<UserId, PremiumGrant>> {
        Err(ServiceError::Store("backend offline".into()))
    }
}
