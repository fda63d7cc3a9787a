//! Likes and comments on shared resources

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use pupitre_core::{Comment, CommentId, Resource, ResourceId, UserId};

use crate::error::ServiceError;
use crate::store::{EngagementStore, LikeOutcome};

pub struct EngagementService<S> {
    store: Arc<S>,
}

impl<S: EngagementStore> EngagementService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Publish a resource so it can be liked and commented on.
    pub fn publish(&self, resource: Resource) -> Result<(), ServiceError> {
        self.store.put_resource(resource)
    }

    pub fn resource(&self, id: &ResourceId) -> Result<Option<Resource>, ServiceError> {
        self.store.get_resource(id)
    }

    /// Flip the caller's like on a resource; returns the committed state.
    /// Failures propagate so the UI can offer a retry.
    pub fn toggle_like(
        &self,
        user: &UserId,
        resource: &ResourceId,
    ) -> Result<LikeOutcome, ServiceError> {
        self.store.toggle_like(user, resource)
    }

    /// Append a comment and bump the resource's counter.
    pub fn add_comment(
        &self,
        user: &UserId,
        resource: &ResourceId,
        body: impl Into<String>,
    ) -> Result<Comment, ServiceError> {
        let comment = Comment {
            id: CommentId(Uuid::new_v4().to_string()),
            resource_id: resource.clone(),
            author: user.clone(),
            body: body.into(),
            created_at: Utc::now(),
        };
        self.store.add_comment(comment.clone())?;
        Ok(comment)
    }

    /// Comments for a resource, oldest first.
    pub fn comments(&self, resource: &ResourceId) -> Result<Vec<Comment>, ServiceError> {
        self.store.list_comments(resource)
    }
}
