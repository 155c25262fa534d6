//! Error types for flashforge.
//!
//! This module defines all error types used throughout the flashforge crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for flashforge operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    /// A slot write would exceed the configured storage quota.
    #[error("storage quota exceeded for slot '{key}': {size} bytes (limit {limit})")]
    QuotaExceeded {
        /// The slot key being written.
        key: String,
        /// Size of the rejected value in bytes.
        size: usize,
        /// The configured limit in bytes.
        limit: usize,
    },

    /// The persisted deck document could not be decoded.
    #[error("malformed deck document: {message}")]
    Document {
        /// Description of what went wrong.
        message: String,
    },

    /// The persisted deck document was written by a newer version.
    #[error("unsupported deck document version {found} (newest supported is {supported})")]
    UnsupportedDocumentVersion {
        /// Version found in the document.
        found: u32,
        /// Newest version this build understands.
        supported: u32,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Card Errors ===
    /// A card side was empty.
    #[error("{field} text cannot be empty")]
    EmptyField {
        /// Which side of the card was empty.
        field: &'static str,
    },

    /// No card matched the given identifier.
    #[error("no card matches '{id}'")]
    CardNotFound {
        /// The identifier or prefix that was looked up.
        id: String,
    },

    /// An identifier prefix matched more than one card.
    #[error("'{prefix}' matches {matches} cards; use more characters")]
    AmbiguousCardId {
        /// The prefix that was looked up.
        prefix: String,
        /// How many cards matched.
        matches: usize,
    },

    // === Suggestion Errors ===
    /// The suggestion request was rejected before it was sent.
    #[error("suggestion input needed: {message}")]
    SuggestionInput {
        /// Why the request was rejected.
        message: String,
    },

    /// The suggestion call failed.
    #[error("failed to generate suggestions: {0}")]
    Suggestion(String),

    /// The HTTP transport for the suggestion call failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // === Study Errors ===
    /// Study mode was requested for an empty deck.
    #[error("no cards to study; add some cards to the deck first")]
    EmptyDeck,

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for flashforge operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a new suggestion failure.
    #[must_use]
    pub fn suggestion(message: impl Into<String>) -> Self {
        Self::Suggestion(message.into())
    }

    /// Create a new malformed document error.
    #[must_use]
    pub fn document(message: impl Into<String>) -> Self {
        Self::Document {
            message: message.into(),
        }
    }

    /// Check if this error is a suggestion-call failure.
    #[must_use]
    pub fn is_suggestion_error(&self) -> bool {
        matches!(
            self,
            Self::SuggestionInput { .. } | Self::Suggestion(_) | Self::Http(_)
        )
    }
}
