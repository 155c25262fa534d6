//! Core flashcard types for flashforge.
//!
//! A [`Flashcard`] is a term/definition pair with an immutable identifier.
//! Cards are never edited: they are created from a validated [`NewCard`]
//! and live unchanged until deleted.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Which side of a card a piece of text belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardSide {
    /// The prompt/term side.
    Front,
    /// The answer/definition side.
    Back,
}

impl CardSide {
    /// Human-readable name used in messages.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Front => "front",
            Self::Back => "back",
        }
    }
}

impl std::fmt::Display for CardSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A single flashcard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flashcard {
    /// Unique identifier, generated at creation.
    pub id: Uuid,

    /// Term side of the card.
    pub front_text: String,

    /// Definition side of the card.
    pub back_text: String,
}

impl Flashcard {
    /// Build a card from a validated draft with a fresh identifier.
    #[must_use]
    pub fn from_draft(draft: NewCard) -> Self {
        Self::with_id(Uuid::new_v4(), draft)
    }

    /// Build a card from a validated draft with an explicit identifier.
    #[must_use]
    pub fn with_id(id: Uuid, draft: NewCard) -> Self {
        Self {
            id,
            front_text: draft.front_text,
            back_text: draft.back_text,
        }
    }

    /// Text shown for the given side.
    #[must_use]
    pub fn text(&self, side: CardSide) -> &str {
        match side {
            CardSide::Front => &self.front_text,
            CardSide::Back => &self.back_text,
        }
    }

    /// Check that both sides hold text, as [`NewCard::new`] requires.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyField`] for the first empty side.
    pub fn validate(&self) -> Result<()> {
        check_sides(&self.front_text, &self.back_text)
    }

    /// Short form of the identifier for listings.
    #[must_use]
    pub fn short_id(&self) -> String {
        let mut id = self.id.simple().to_string();
        id.truncate(8);
        id
    }
}

/// A validated card draft.
///
/// Both sides are guaranteed non-empty, so the store never has to reject
/// an `add`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCard {
    front_text: String,
    back_text: String,
}

impl NewCard {
    /// Validate the two sides of a new card.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyField`] if either side is empty or whitespace.
    pub fn new(front_text: impl Into<String>, back_text: impl Into<String>) -> Result<Self> {
        let front_text = front_text.into();
        let back_text = back_text.into();
        check_sides(&front_text, &back_text)?;

        Ok(Self {
            front_text,
            back_text,
        })
    }

    /// The front text.
    #[must_use]
    pub fn front_text(&self) -> &str {
        &self.front_text
    }

    /// The back text.
    #[must_use]
    pub fn back_text(&self) -> &str {
        &self.back_text
    }
}

fn check_sides(front_text: &str, back_text: &str) -> Result<()> {
    if front_text.trim().is_empty() {
        return Err(Error::EmptyField {
            field: CardSide::Front.label(),
        });
    }
    if back_text.trim().is_empty() {
        return Err(Error::EmptyField {
            field: CardSide::Back.label(),
        });
    }
    Ok(())
}
