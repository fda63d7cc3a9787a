//! Profile creation and maintenance
//!
//! Saved-content and notification updates are plain read-modify-writes
//! of the caller's own profile; per-user operations are issued
//! sequentially by the UI, and the stored points counter is immune to
//! profile updates either way.

use std::sync::Arc;

use chrono::Utc;

use pupitre_core::{ResourceId, UserId, UserProfile};

use crate::error::ServiceError;
use crate::store::ProfileStore;

pub struct ProfileService<S> {
    store: Arc<S>,
}

impl<S: ProfileStore> ProfileService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Register a fresh profile with every collection empty.
    pub fn create(&self, id: UserId, display_name: &str) -> Result<UserProfile, ServiceError> {
        let profile = UserProfile::new(id, display_name, Utc::now());
        self.store.create_profile(profile.clone())?;
        Ok(profile)
    }

    pub fn get(&self, user: &UserId) -> Result<Option<UserProfile>, ServiceError> {
        self.store.get_profile(user)
    }

    /// Replace the profile's attribute fields. The stored points counter
    /// is preserved by the store.
    pub fn update(&self, profile: UserProfile) -> Result<(), ServiceError> {
        self.store.update_profile(profile)
    }

    pub fn save_resource(&self, user: &UserId, resource: &ResourceId) -> Result<(), ServiceError> {
        let mut profile = self.require(user)?;
        if profile.saved_resources.insert(resource.clone()) {
            self.store.update_profile(profile)?;
        }
        Ok(())
    }

    pub fn unsave_resource(
        &self,
        user: &UserId,
        resource: &ResourceId,
    ) -> Result<(), ServiceError> {
        let mut profile = self.require(user)?;
        if profile.saved_resources.remove(resource) {
            self.store.update_profile(profile)?;
        }
        Ok(())
    }

    pub fn save_course(&self, user: &UserId, course: &ResourceId) -> Result<(), ServiceError> {
        let mut profile = self.require(user)?;
        if profile.saved_courses.insert(course.clone()) {
            self.store.update_profile(profile)?;
        }
        Ok(())
    }

    pub fn unsave_course(&self, user: &UserId, course: &ResourceId) -> Result<(), ServiceError> {
        let mut profile = self.require(user)?;
        if profile.saved_courses.remove(course) {
            self.store.update_profile(profile)?;
        }
        Ok(())
    }

    /// Remember that the user has seen an admin notification.
    pub fn mark_notification_read(
        &self,
        user: &UserId,
        notification: &str,
    ) -> Result<(), ServiceError> {
        let mut profile = self.require(user)?;
        if profile
            .read_admin_notifications
            .insert(notification.to_string())
        {
            self.store.update_profile(profile)?;
        }
        Ok(())
    }

    fn require(&self, user: &UserId) -> Result<UserProfile, ServiceError> {
        self.store
            .get_profile(user)?
            .ok_or(ServiceError::UserNotFound)
    }
}
