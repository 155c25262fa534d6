//! `flashforge` - A terminal flashcard deck with a durable local card store
//!
//! This library provides the card model, the persistent card store, study-mode
//! navigation and the optional AI suggestion service used by the `flashforge`
//! binary.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod card;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod storage;
pub mod store;
pub mod study;
pub mod suggest;

pub use card::{CardSide, Flashcard, NewCard};
pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use storage::{MemorySlot, Slot, SlotStats, SqliteSlot};
pub use store::{CardStore, LoadOutcome};
pub use study::{StudyAction, StudySession};
