//! Versioned JSON document persisted in the deck slot.
//!
//! Current layout (version 1):
//!
//! ```json
//! {"version": 1, "cards": [{"id": "…", "frontText": "…", "backText": "…"}]}
//! ```
//!
//! Version 0 is the unversioned layout written by earlier builds: a bare
//! array of card records. Decoding upgrades older documents one version at a
//! time before deserializing.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::card::Flashcard;
use crate::error::{Error, Result};

/// Newest document version this build reads and the one it writes.
pub const DOCUMENT_VERSION: u32 = 1;

#[derive(Serialize)]
struct DocumentRef<'a> {
    version: u32,
    cards: &'a [Flashcard],
}

#[derive(Deserialize)]
struct Document {
    version: u32,
    cards: Vec<Flashcard>,
}

/// Serialize a card sequence as a current-version document.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn encode(cards: &[Flashcard]) -> Result<String> {
    let doc = DocumentRef {
        version: DOCUMENT_VERSION,
        cards,
    };
    Ok(serde_json::to_string(&doc)?)
}

/// Parse a stored document of any supported version into cards, preserving order.
///
/// # Errors
///
/// Returns [`Error::Document`] if the text is not a recognizable deck
/// document and [`Error::UnsupportedDocumentVersion`] if it was written by a
/// newer version.
pub fn decode(raw: &str) -> Result<Vec<Flashcard>> {
    let mut value: Value =
        serde_json::from_str(raw).map_err(|e| Error::document(e.to_string()))?;

    let found = document_version(&value)?;
    if found > DOCUMENT_VERSION {
        return Err(Error::UnsupportedDocumentVersion {
            found,
            supported: DOCUMENT_VERSION,
        });
    }

    for from in found..DOCUMENT_VERSION {
        debug!("Upgrading deck document from v{} to v{}", from, from + 1);
        value = upgrade(value, from)?;
    }

    let doc: Document = serde_json::from_value(value).map_err(|e| Error::document(e.to_string()))?;
    if doc.version != DOCUMENT_VERSION {
        return Err(Error::internal(format!(
            "document upgrade ended at v{} instead of v{DOCUMENT_VERSION}",
            doc.version
        )));
    }
    Ok(doc.cards)
}

fn document_version(value: &Value) -> Result<u32> {
    match value {
        Value::Array(_) => Ok(0),
        Value::Object(map) => {
            let version = map
                .get("version")
                .and_then(Value::as_u64)
                .ok_or_else(|| Error::document("missing numeric 'version' field"))?;
            match u32::try_from(version) {
                Ok(0) => Err(Error::document(
                    "version 0 decks are bare card arrays, not versioned objects",
                )),
                Ok(version) => Ok(version),
                Err(_) => Err(Error::document(format!("version {version} is out of range"))),
            }
        }
        _ => Err(Error::document("expected a card array or a versioned object")),
    }
}

/// Upgrade a document from version `from` to `from + 1`.
fn upgrade(value: Value, from: u32) -> Result<Value> {
    match from {
        0 => Ok(json!({ "version": 1, "cards": value })),
        _ => Err(Error::internal(format!("no document upgrade from v{from}"))),
    }
}
