//! Validation errors for the domain types

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("A deck needs at least one card")]
    EmptyDeck,

    #[error("Grant expires at or before it starts")]
    GrantDatesInverted,
}
