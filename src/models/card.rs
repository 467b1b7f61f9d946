//! Card identifier and extracted card data.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Catalog identifier of a card.
///
/// Used both as the detail page path suffix and as the destination primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(pub i64);

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for CardId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// Fields extracted from one card detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardRecord {
    /// Catalog identifier
    pub id: CardId,

    /// Card display name
    pub name: String,

    /// Ability text (empty if the card has none)
    pub ability: String,

    /// Attack names, `/`-separated (empty if none were found)
    pub attack: String,
}

impl CardRecord {
    pub fn new(
        id: CardId,
        name: impl Into<String>,
        ability: impl Into<String>,
        attack: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            ability: ability.into(),
            attack: attack.into(),
        }
    }
}
