//! Content units: flashcard decks, cards, shared resources, comments

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::ids::{CardId, CommentId, DeckId, ResourceId, UserId};
use crate::policy::Accessible;

/// Who created a piece of content.
///
/// Content authored through the admin surface belongs to the system, not
/// to any user account, so `System` never matches a user in ownership
/// checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Owner {
    User(UserId),
    System,
}

impl Owner {
    pub fn is_user(&self, user: &UserId) -> bool {
        matches!(self, Owner::User(u) if u == user)
    }

    pub fn is_system(&self) -> bool {
        matches!(self, Owner::System)
    }
}

/// One question/answer pair in a deck
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub question: String,
    pub answer: String,
}

/// Mastery state of one card for one user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardStatus {
    Learning,
    Mastered,
}

impl CardStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardStatus::Learning => "learning",
            CardStatus::Mastered => "mastered",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "learning" => Some(CardStatus::Learning),
            "mastered" => Some(CardStatus::Mastered),
            _ => None,
        }
    }
}

/// A named collection of cards with audience targeting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashcardDeck {
    pub id: DeckId,
    pub title: String,
    pub subject: String,
    pub is_public: bool,
    /// Class names this deck is aimed at
    pub classes: BTreeSet<String>,
    /// Series codes this deck is aimed at
    pub series: BTreeSet<String>,
    pub cards: Vec<Card>,
    pub owner: Owner,
    pub created_at: DateTime<Utc>,
}

impl Accessible for FlashcardDeck {
    fn owner(&self) -> &Owner {
        &self.owner
    }

    fn is_public(&self) -> bool {
        self.is_public
    }
}

/// Deck fields as submitted, before validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDeck {
    pub title: String,
    pub subject: String,
    pub is_public: bool,
    pub classes: BTreeSet<String>,
    pub series: BTreeSet<String>,
    pub cards: Vec<Card>,
}

impl NewDeck {
    /// Validation boundary: a deck must carry at least one card.
    pub fn into_deck(
        self,
        id: DeckId,
        owner: Owner,
        created_at: DateTime<Utc>,
    ) -> Result<FlashcardDeck, Error> {
        if self.cards.is_empty() {
            return Err(Error::EmptyDeck);
        }
        Ok(FlashcardDeck {
            id,
            title: self.title,
            subject: self.subject,
            is_public: self.is_public,
            classes: self.classes,
            series: self.series,
            cards: self.cards,
            owner,
            created_at,
        })
    }
}

/// A shared resource or course document.
///
/// `like_count` and `comment_count` are denormalized mirrors of the like
/// set and the comment sub-collection; every mutation of those goes
/// through the store paths that adjust the counter in the same unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub title: String,
    pub subject: Option<String>,
    pub is_public: bool,
    pub classes: BTreeSet<String>,
    pub series: BTreeSet<String>,
    pub owner: Owner,
    pub like_count: u64,
    pub comment_count: u64,
    pub created_at: DateTime<Utc>,
}

impl Resource {
    /// Fresh resource with zeroed counters and empty targeting.
    pub fn new(
        id: ResourceId,
        title: impl Into<String>,
        owner: Owner,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            subject: None,
            is_public: true,
            classes: BTreeSet::new(),
            series: BTreeSet::new(),
            owner,
            like_count: 0,
            comment_count: 0,
            created_at,
        }
    }
}

impl Accessible for Resource {
    fn owner(&self) -> &Owner {
        &self.owner
    }

    fn is_public(&self) -> bool {
        self.is_public
    }
}

/// A comment in a resource's comment sub-collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub resource_id: ResourceId,
    pub author: UserId,
    pub body: String,
    pub created_at: DateTime<Utc>,
}
