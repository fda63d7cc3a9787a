//! Pupitre core library
//!
//! Pure domain rules for the pupitre study platform:
//! - premium grants, their duration table, and status evaluation
//! - the access policy gate combining ownership, visibility, and entitlement
//! - content and profile records with their validation boundaries
//!
//! Nothing in this crate performs I/O; time is always passed in as an
//! argument, never sampled, so every rule is testable with plain values.

pub mod content;
pub mod entitlement;
pub mod error;
pub mod ids;
pub mod policy;
pub mod profile;

pub use content::{Card, CardStatus, Comment, FlashcardDeck, NewDeck, Owner, Resource};
pub use entitlement::{evaluate_at, GrantDuration, PremiumGrant, PremiumStatus};
pub use error::Error;
pub use ids::{CardId, CommentId, DeckId, ResourceId, UserId};
pub use policy::{can_access, AccessDecision, Accessible, DenyReason};
pub use profile::{Activity, UserProfile, PROFILE_VERSION};

/// Result type for pupitre-core operations
pub type Result<T> = std::result::Result<T, Error>;
