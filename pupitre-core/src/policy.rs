//! Access policy gate
//!
//! Decides whether a user may open a piece of content, combining
//! ownership, visibility, and entitlement. The gate is a pure function
//! over already-fetched data; fetching the content and evaluating the
//! entitlement happen before the call.

use crate::content::Owner;
use crate::entitlement::PremiumStatus;
use crate::ids::UserId;

/// Why access was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// Private content, and the caller is not its owner
    NotOwner,
    /// Public content, but the caller holds no active premium grant
    PremiumRequired,
}

/// Outcome of the gate. A denial is an ordinary value, not an error;
/// callers decide how to present it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    Deny(DenyReason),
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allow)
    }
}

/// Anything the gate can rule on: who owns it and whether it is public.
pub trait Accessible {
    fn owner(&self) -> &Owner;
    fn is_public(&self) -> bool;
}

/// Decide whether `user` may open `content`. First match wins:
/// owners always get in, private content is closed to everyone else,
/// and public content needs an active premium grant.
pub fn can_access(
    user: &UserId,
    content: &impl Accessible,
    premium: &PremiumStatus,
) -> AccessDecision {
    if content.owner().is_user(user) {
        return AccessDecision::Allow;
    }
    if !content.is_public() {
        return AccessDecision::Deny(DenyReason::NotOwner);
    }
    if premium.is_premium {
        AccessDecision::Allow
    } else {
        AccessDecision::Deny(DenyReason::PremiumRequired)
    }
}
