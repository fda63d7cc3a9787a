//! Premium entitlement activation and evaluation
//!
//! Evaluation itself is a pure function in `pupitre_core`; this service
//! adds the store plumbing, the fail-closed read policy, and the
//! best-effort reaping of expired grants.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;

use pupitre_core::{evaluate_at, GrantDuration, PremiumGrant, PremiumStatus, UserId};

use crate::error::ServiceError;
use crate::store::EntitlementStore;

pub struct EntitlementService<S> {
    store: Arc<S>,
}

impl<S> Clone for EntitlementService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: EntitlementStore> EntitlementService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Grant premium from now for the given duration, fully replacing any
    /// existing grant.
    pub fn activate(&self, user: &UserId, duration: GrantDuration) -> Result<(), ServiceError> {
        let grant = PremiumGrant::starting_at(user.clone(), duration, Utc::now());
        tracing::debug!(
            user = %user,
            duration = duration.as_str(),
            expires = %grant.expires_at,
            "Activating premium grant"
        );
        self.store.put_grant(grant)
    }

    /// Drop the user's grant. Calling this for a user without one is a
    /// no-op, not an error.
    pub fn deactivate(&self, user: &UserId) -> Result<(), ServiceError> {
        self.store.delete_grant(user)
    }

    /// Current premium status for one user.
    ///
    /// Store read failures degrade to "not premium" instead of
    /// propagating: an entitlement check must never take a page down, and
    /// a transient failure denies premium rather than granting it. An
    /// expired grant is reaped best-effort after the status has been
    /// computed; the returned status stands whether or not the delete
    /// lands.
    pub fn status(&self, user: &UserId) -> PremiumStatus {
        let grant = match self.store.get_grant(user) {
            Ok(grant) => grant,
            Err(e) => {
                tracing::warn!(user = %user, error = %e, "Entitlement read failed, treating as non-premium");
                return PremiumStatus::none();
            }
        };

        let status = evaluate_at(grant.as_ref(), Utc::now());

        if grant.is_some() && !status.is_premium {
            if let Err(e) = self.store.delete_grant(user) {
                tracing::warn!(user = %user, error = %e, "Failed to reap expired grant");
            }
        }

        status
    }

    /// Bulk status for listing screens: one fetch, the same expiry rule,
    /// and no reaping (the single-user path handles cleanup, so list
    /// rendering never amplifies writes).
    pub fn status_batch(&self, users: &[UserId]) -> HashMap<UserId, PremiumStatus> {
        let grants = match self.store.get_grants(users) {
            Ok(grants) => grants,
            Err(e) => {
                tracing::warn!(error = %e, "Entitlement batch read failed, treating all as non-premium");
                HashMap::new()
            }
        };

        let now = Utc::now();
        users
            .iter()
            .map(|u| (u.clone(), evaluate_at(grants.get(u), now)))
            .collect()
    }
}
