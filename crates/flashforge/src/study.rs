//! Flip-card study navigation.
//!
//! A session walks the deck in display order. The index never wraps: moving
//! past either end is refused. Moving to another card always shows its
//! front side again.

use crate::card::{CardSide, Flashcard};

/// A user action in study mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudyAction {
    /// Go to the next card.
    Next,
    /// Go to the previous card.
    Previous,
    /// Turn the current card over.
    Flip,
    /// Leave study mode.
    Exit,
}

impl StudyAction {
    /// Map a line of terminal input to an action.
    ///
    /// An empty line flips the card, the terminal analogue of the space bar.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "" | "f" | "flip" | " " => Some(Self::Flip),
            "n" | "next" | "l" | "right" => Some(Self::Next),
            "p" | "prev" | "previous" | "h" | "left" => Some(Self::Previous),
            "q" | "quit" | "exit" | "esc" => Some(Self::Exit),
            _ => None,
        }
    }
}

/// Navigation state over a non-empty deck.
#[derive(Debug, Clone)]
pub struct StudySession<'a> {
    cards: &'a [Flashcard],
    index: usize,
    flipped: bool,
}

impl<'a> StudySession<'a> {
    /// Start at the first card, front side up.
    ///
    /// Returns `None` for an empty deck.
    #[must_use]
    pub fn new(cards: &'a [Flashcard]) -> Option<Self> {
        if cards.is_empty() {
            return None;
        }
        Some(Self {
            cards,
            index: 0,
            flipped: false,
        })
    }

    /// The card being studied.
    #[must_use]
    pub fn current(&self) -> &'a Flashcard {
        &self.cards[self.index]
    }

    /// The side currently facing the user.
    #[must_use]
    pub fn side(&self) -> CardSide {
        if self.flipped {
            CardSide::Back
        } else {
            CardSide::Front
        }
    }

    /// Text on the side currently facing the user.
    #[must_use]
    pub fn visible_text(&self) -> &'a str {
        self.current().text(self.side())
    }

    /// Whether the back side is showing.
    #[must_use]
    pub fn is_flipped(&self) -> bool {
        self.flipped
    }

    /// Turn the current card over.
    pub fn flip(&mut self) {
        self.flipped = !self.flipped;
    }

    /// Advance to the next card. Returns `false` on the last card.
    pub fn next(&mut self) -> bool {
        if self.is_last() {
            return false;
        }
        self.index += 1;
        self.flipped = false;
        true
    }

    /// Go back to the previous card. Returns `false` on the first card.
    pub fn prev(&mut self) -> bool {
        if self.is_first() {
            return false;
        }
        self.index -= 1;
        self.flipped = false;
        true
    }

    /// Apply an action. Returns `false` when the session should end.
    pub fn apply(&mut self, action: StudyAction) -> bool {
        match action {
            StudyAction::Next => {
                self.next();
            }
            StudyAction::Previous => {
                self.prev();
            }
            StudyAction::Flip => self.flip(),
            StudyAction::Exit => return false,
        }
        true
    }

    /// Whether the first card is showing.
    #[must_use]
    pub fn is_first(&self) -> bool {
        self.index == 0
    }

    /// Whether the last card is showing.
    #[must_use]
    pub fn is_last(&self) -> bool {
        self.index + 1 == self.cards.len()
    }

    /// One-based position and deck size, e.g. `(2, 5)` for "Card 2 of 5".
    #[must_use]
    pub fn position(&self) -> (usize, usize) {
        (self.index + 1, self.cards.len())
    }

    /// Share of the deck reached so far, in percent.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn progress_percent(&self) -> f64 {
        let (position, total) = self.position();
        position as f64 / total as f64 * 100.0
    }
}
