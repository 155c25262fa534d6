//! The card store: the session's authoritative card sequence, mirrored to a
//! durable slot.
//!
//! Every mutation rewrites the full sequence to the slot before returning.
//! Persistence is best effort: a failed write is logged and the in-memory
//! change is kept, so the session continues with state that will not survive
//! a restart until a later write succeeds.

use std::collections::HashSet;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::card::{Flashcard, NewCard};
use crate::error::{Error, Result};
use crate::storage::{document, Slot};

/// Default slot key for the deck.
pub const DEFAULT_SLOT_KEY: &str = "flashforge-deck";

/// What [`CardStore::load`] found in the slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The slot held a deck; this many cards were hydrated.
    Hydrated(usize),
    /// The slot was empty; the store starts with no cards.
    Empty,
    /// The slot could not be read or decoded; the store starts with no cards.
    Recovered {
        /// Why the stored deck was discarded.
        reason: String,
    },
}

/// In-memory card sequence kept in step with a [`Slot`].
#[derive(Debug)]
pub struct CardStore<S> {
    slot: S,
    key: String,
    cards: Vec<Flashcard>,
    loaded: bool,
    persisted: bool,
}

impl<S: Slot> CardStore<S> {
    /// Create an unloaded store over `slot`, persisting under `key`.
    pub fn new(slot: S, key: impl Into<String>) -> Self {
        Self {
            slot,
            key: key.into(),
            cards: Vec::new(),
            loaded: false,
            persisted: true,
        }
    }

    /// Create a store and immediately [`load`](Self::load) it.
    pub fn open(slot: S, key: impl Into<String>) -> Self {
        let mut store = Self::new(slot, key);
        store.load();
        store
    }

    /// Hydrate the card sequence from the slot.
    ///
    /// Never fails: an unreadable or malformed slot is logged as a warning and
    /// the store starts empty. Cards with an empty side, or with an id
    /// already seen earlier in the stored sequence, are dropped.
    pub fn load(&mut self) -> LoadOutcome {
        let outcome = match self.read_slot() {
            Ok(None) => {
                self.cards.clear();
                LoadOutcome::Empty
            }
            Ok(Some(cards)) => {
                self.cards = dedupe(drop_blank(cards));
                LoadOutcome::Hydrated(self.cards.len())
            }
            Err(err) => {
                warn!(
                    "Failed to load deck from slot '{}', starting empty: {}",
                    self.key, err
                );
                self.cards.clear();
                LoadOutcome::Recovered {
                    reason: err.to_string(),
                }
            }
        };

        self.loaded = true;
        debug!("Card store loaded: {:?}", outcome);
        outcome
    }

    fn read_slot(&self) -> Result<Option<Vec<Flashcard>>> {
        self.slot
            .read(&self.key)?
            .map(|raw| document::decode(&raw))
            .transpose()
    }

    /// Whether the store has been hydrated from its slot.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Whether the slot reflects the in-memory sequence as of the last mutation.
    #[must_use]
    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    /// Append a new card and persist the deck.
    ///
    /// Returns the created card.
    pub fn add(&mut self, draft: NewCard) -> &Flashcard {
        self.ensure_loaded();

        let mut id = Uuid::new_v4();
        while self.contains(id) {
            id = Uuid::new_v4();
        }

        let card = Flashcard::with_id(id, draft);
        info!("Adding card {}", card.id);
        self.cards.push(card);
        self.persist();

        &self.cards[self.cards.len() - 1]
    }

    /// Remove the card with `id` and persist the deck.
    ///
    /// Returns `true` if a card was removed; deleting an unknown id is a no-op.
    pub fn delete(&mut self, id: Uuid) -> bool {
        self.ensure_loaded();

        let before = self.cards.len();
        self.cards.retain(|card| card.id != id);
        let removed = self.cards.len() != before;

        if removed {
            info!("Deleted card {}", id);
        } else {
            debug!("Delete of unknown card {} ignored", id);
        }
        self.persist();
        removed
    }

    /// All cards in insertion order.
    #[must_use]
    pub fn cards(&self) -> &[Flashcard] {
        &self.cards
    }

    /// Number of cards.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Whether the deck has no cards.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Look up a card by id.
    #[must_use]
    pub fn get(&self, id: Uuid) -> Option<&Flashcard> {
        self.cards.iter().find(|card| card.id == id)
    }

    /// Whether a card with `id` exists.
    #[must_use]
    pub fn contains(&self, id: Uuid) -> bool {
        self.get(id).is_some()
    }

    /// Resolve a full id or a unique id prefix to a card id.
    ///
    /// Hyphens are ignored and matching is case-insensitive.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CardNotFound`] if nothing matches and
    /// [`Error::AmbiguousCardId`] if the prefix matches several cards.
    pub fn resolve(&self, id_or_prefix: &str) -> Result<Uuid> {
        if let Ok(id) = Uuid::parse_str(id_or_prefix) {
            if self.contains(id) {
                return Ok(id);
            }
        }

        let needle: String = id_or_prefix
            .chars()
            .filter(|c| *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        if needle.is_empty() {
            return Err(Error::CardNotFound {
                id: id_or_prefix.to_string(),
            });
        }

        let matches: Vec<Uuid> = self
            .cards
            .iter()
            .filter(|card| card.id.simple().to_string().starts_with(&needle))
            .map(|card| card.id)
            .collect();

        match matches.as_slice() {
            [id] => Ok(*id),
            [] => Err(Error::CardNotFound {
                id: id_or_prefix.to_string(),
            }),
            _ => Err(Error::AmbiguousCardId {
                prefix: id_or_prefix.to_string(),
                matches: matches.len(),
            }),
        }
    }

    /// The slot key this store persists under.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Borrow the backing slot.
    #[must_use]
    pub fn slot(&self) -> &S {
        &self.slot
    }

    /// Give back the backing slot, discarding in-memory state.
    pub fn into_slot(self) -> S {
        self.slot
    }

    fn ensure_loaded(&mut self) {
        if !self.loaded {
            debug!("Card store mutated before load; hydrating first");
            self.load();
        }
    }

    fn persist(&mut self) {
        let result = document::encode(&self.cards).and_then(|raw| self.slot.write(&self.key, &raw));

        match result {
            Ok(()) => {
                if !self.persisted {
                    info!("Deck saved to slot '{}' again after earlier failure", self.key);
                }
                self.persisted = true;
            }
            Err(err) => {
                error!(
                    "Failed to save deck to slot '{}'; changes are kept in memory only: {}",
                    self.key, err
                );
                self.persisted = false;
            }
        }
    }
}

fn drop_blank(cards: Vec<Flashcard>) -> Vec<Flashcard> {
    let total = cards.len();
    let complete: Vec<Flashcard> = cards
        .into_iter()
        .filter(|card| match card.validate() {
            Ok(()) => true,
            Err(err) => {
                debug!("Skipping stored card {}: {}", card.id, err);
                false
            }
        })
        .collect();

    if complete.len() != total {
        warn!(
            "Dropped {} stored cards with an empty side",
            total - complete.len()
        );
    }
    complete
}

fn dedupe(cards: Vec<Flashcard>) -> Vec<Flashcard> {
    let mut seen = HashSet::with_capacity(cards.len());
    let total = cards.len();
    let unique: Vec<Flashcard> = cards.into_iter().filter(|card| seen.insert(card.id)).collect();

    if unique.len() != total {
        warn!(
            "Dropped {} stored cards with duplicate ids",
            total - unique.len()
        );
    }
    unique
}
