//! Activity points ledger

use std::sync::Arc;

use pupitre_core::{Activity, UserId};

use crate::error::ServiceError;
use crate::store::ProfileStore;

pub struct PointsLedger<S> {
    store: Arc<S>,
}

impl<S: ProfileStore> PointsLedger<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Credit the points for one completed activity. The increment is
    /// applied inside the store, so concurrent completions by the same
    /// user all land.
    pub fn record(&self, user: &UserId, activity: Activity) -> Result<(), ServiceError> {
        tracing::debug!(user = %user, activity = ?activity, "Recording activity points");
        self.store.add_points(user, activity.points())
    }
}
