use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// A single video item as read from the media library catalog
///
/// The catalog is owned by the media server; this is a read-only projection
/// of the fields the snapshot needs.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogItem {
    /// Server-side item id, used by the display surface
    pub item_id: String,
    pub name: String,
    pub path: Option<String>,
    /// External `(provider, id)` pairs, e.g. `("Imdb", "tt1375666")`
    pub provider_ids: Vec<(String, String)>,
    pub community_rating: Option<f32>,
    pub is_played: bool,
    pub genres: Vec<String>,
    pub date_created: DateTime<Utc>,
    pub date_modified: DateTime<Utc>,
}

impl CatalogItem {
    /// Canonical row identity derived from the provider-id pairs
    ///
    /// `None` when the item carries no provider identifiers; such items are
    /// excluded from synchronization entirely.
    pub fn provider_key(&self) -> Option<ProviderKey> {
        ProviderKey::from_pairs(
            self.provider_ids
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str())),
        )
    }

    /// Date of record for the snapshot: the modification timestamp when it is
    /// strictly later than creation, otherwise the creation timestamp.
    pub fn date_of_record(&self) -> DateTime<Utc> {
        if self.date_created < self.date_modified {
            self.date_modified
        } else {
            self.date_created
        }
    }
}

/// Canonical, order-independent identity string built from an item's
/// provider-id pairs: pairs sorted by provider name, joined as `name=value`
/// with `|`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProviderKey(String);

impl ProviderKey {
    /// Builds a key from provider-id pairs, in any order.
    ///
    /// Returns `None` when there are no pairs or the joined key is blank.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Option<Self> {
        let mut pairs: Vec<(&str, &str)> = pairs.into_iter().collect();
        if pairs.is_empty() {
            return None;
        }
        pairs.sort_by(|a, b| a.0.cmp(b.0));

        let joined = pairs
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("|");

        // A key made only of separators and whitespace identifies nothing.
        let has_content = joined
            .chars()
            .any(|c| c != '=' && c != '|' && !c.is_whitespace());
        if !has_content {
            return None;
        }

        Some(ProviderKey(joined))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Display for ProviderKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Minimal media reference handed to the display surface
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaRef {
    pub item_id: String,
    pub path: Option<String>,
    pub name: String,
}
