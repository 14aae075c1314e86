//! Thread post data structures.

use serde::{Deserialize, Deserializer, Serialize};

use crate::pipeline::fingerprint::{Fingerprint, fingerprint};

/// A post extracted from a thread page.
///
/// The fingerprint is computed on construction so it always matches `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    text: String,
    fingerprint: Fingerprint,
    source: String,
}

impl Item {
    /// Create an item from its text and the URL of the page it was found on.
    pub fn new(text: impl Into<String>, source: impl Into<String>) -> Self {
        let text = text.into();
        let fingerprint = fingerprint(&text);
        Self {
            text,
            fingerprint,
            source: source.into(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    /// URL of the page the item was extracted from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Fingerprint-only projection of this item.
    pub fn to_hash(&self) -> ItemHash {
        ItemHash {
            texthash: self.fingerprint.clone(),
        }
    }
}

/// Fingerprint-only item, the shape that is persisted and diffed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemHash {
    pub texthash: Fingerprint,
}

impl ItemHash {
    pub fn new(texthash: impl Into<Fingerprint>) -> Self {
        Self {
            texthash: texthash.into(),
        }
    }
}

/// Items sharing one page number, in the order they appeared on the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Page<T> {
    #[serde(default = "Vec::new", deserialize_with = "null_as_empty")]
    pub items: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

/// Older record files store an absent page as `{"items": null}`.
fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
