//! Service error types
//!
//! Expected absences (no grant, no progress record, no exclusion set) are
//! normal return values, never errors. Errors here are transient store
//! failures, authorization refusals on mutations, and entities whose
//! absence genuinely breaks the call.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("User not found")]
    UserNotFound,

    #[error("User already exists")]
    UserExists,

    #[error("Deck not found")]
    DeckNotFound,

    #[error("Resource not found")]
    ResourceNotFound,

    #[error("Not the owner of this content")]
    Forbidden,

    /// The comment was appended but the counter increment failed, leaving
    /// `comment_count` understated by one. Known consistency gap; surfaced
    /// to the caller rather than hidden.
    #[error("Comment stored but counter update failed: {0}")]
    CommentCountLag(String),

    #[error(transparent)]
    Invalid(#[from] pupitre_core::Error),

    #[error("Store error: {0}")]
    Store(String),
}
