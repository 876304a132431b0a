use std::collections::BTreeMap;

use crate::models::CatalogItem;

/// Dynamic per-genre column set derived from the catalog
///
/// Maps a normalized genre key (trimmed, case-folded) to a generated boolean
/// column name of the form `Is<PascalCaseGenre>`. Two raw labels that
/// normalize to the same key collapse into one column; the last-seen label
/// wins the column name, but membership always tests the normalized key.
/// Distinct keys can still generate the same column name (`"sci fi"` and
/// `"sci-fi"`), so consumers must merge flags per column, not per key.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GenreColumns {
    columns: BTreeMap<String, String>,
}

impl GenreColumns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects the genre column set from every genre label in the catalog.
    pub fn from_items<'a>(items: impl IntoIterator<Item = &'a CatalogItem>) -> Self {
        let mut columns = Self::new();
        for item in items {
            for genre in &item.genres {
                columns.insert(genre);
            }
        }
        columns
    }

    /// Registers a raw genre label, collapsing it into an existing column
    /// when its normalized key is already known.
    pub fn insert(&mut self, raw: &str) {
        let name = Self::column_name(raw);
        // Labels that sanitize down to nothing cannot name a column.
        if name == "Is" {
            return;
        }
        self.columns.insert(Self::normalize(raw), name);
    }

    /// Registers a key/column pair as-is, bypassing normalization and
    /// sanitization. Lets tests stage column names the sanitizer would
    /// never produce.
    #[cfg(test)]
    pub(crate) fn insert_unchecked(&mut self, key: &str, column: &str) {
        self.columns.insert(key.to_string(), column.to_string());
    }

    /// Normalized membership key for a raw genre label
    pub fn normalize(raw: &str) -> String {
        raw.trim().to_lowercase()
    }

    /// Generated column name: `Is` + PascalCase label with whitespace and
    /// hyphens removed. Any character outside `[A-Za-z0-9]` is stripped, so
    /// the result is always safe to splice into DDL.
    pub fn column_name(raw: &str) -> String {
        let mut name = String::from("Is");
        let mut upper_next = true;
        for ch in raw.trim().chars() {
            if ch.is_whitespace() || ch == '-' {
                upper_next = true;
                continue;
            }
            if !ch.is_ascii_alphanumeric() {
                continue;
            }
            if upper_next {
                name.push(ch.to_ascii_uppercase());
                upper_next = false;
            } else {
                name.push(ch);
            }
        }
        name
    }

    /// `(normalized key, column name)` pairs in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.values().map(|v| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
