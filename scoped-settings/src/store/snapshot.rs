//! Per-context property snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;

/// Header line of a property listing.
pub const LISTING_HEADER: &str = "-- listing properties --";

/// Values longer than this are abbreviated in listings.
pub const MAX_LISTED_VALUE_CHARS: usize = 40;

/// Where a snapshot's initial contents came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotOrigin {
    /// Seeded from the ambient source on first access.
    Ambient,
    /// Copied from a parent context at spawn time.
    Inherited,
}

impl std::fmt::Display for SnapshotOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ambient => f.write_str("ambient"),
            Self::Inherited => f.write_str("inherited"),
        }
    }
}

/// A mutable key/value snapshot owned by exactly one execution context.
///
/// Cloning produces a fully independent copy; snapshots never share storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertySnapshot {
    /// The properties, kept in key order for stable listings.
    entries: BTreeMap<String, String>,

    /// Where the initial contents came from.
    origin: SnapshotOrigin,

    /// When the snapshot was created.
    created_at: DateTime<Utc>,
}

impl PropertySnapshot {
    /// Creates a snapshot seeded from a copy of the ambient configuration.
    #[must_use]
    pub fn seeded(ambient: HashMap<String, String>) -> Self {
        Self {
            entries: ambient.into_iter().collect(),
            origin: SnapshotOrigin::Ambient,
            created_at: Utc::now(),
        }
    }

    /// Creates an empty ambient snapshot.
    #[must_use]
    pub fn empty() -> Self {
        Self::seeded(HashMap::new())
    }

    /// Takes a point-in-time copy for a child context.
    #[must_use]
    pub fn inherit(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            origin: SnapshotOrigin::Inherited,
            created_at: Utc::now(),
        }
    }

    /// Gets a value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Checks if a key exists.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Sets a value, returning the previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(key.into(), value.into())
    }

    /// Removes a value, returning it if present.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the snapshot is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns all keys in order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Iterates over entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns a copy of all entries.
    #[must_use]
    pub fn to_map(&self) -> HashMap<String, String> {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Returns where the initial contents came from.
    #[must_use]
    pub fn origin(&self) -> SnapshotOrigin {
        self.origin
    }

    /// Returns when the snapshot was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Renders a human-readable listing of every entry.
    ///
    /// One `key=value` line per entry, in key order, under
    /// [`LISTING_HEADER`]. Long values are cut to 37 characters plus `...`.
    #[must_use]
    pub fn describe(&self) -> String {
        let mut out = String::with_capacity(LISTING_HEADER.len() + 1 + self.entries.len() * 32);
        out.push_str(LISTING_HEADER);
        out.push('\n');

        for (key, value) in &self.entries {
            let _ = writeln!(out, "{key}={}", abbreviate(value));
        }

        out
    }
}

fn abbreviate(value: &str) -> std::borrow::Cow<'_, str> {
    if value.chars().count() > MAX_LISTED_VALUE_CHARS {
        let head: String = value.chars().take(MAX_LISTED_VALUE_CHARS - 3).collect();
        std::borrow::Cow::Owned(format!("{head}..."))
    } else {
        std::borrow::Cow::Borrowed(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ambient(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_seeded_snapshot() {
        let snapshot = PropertySnapshot::seeded(ambient(&[("lang", "en")]));

        assert_eq!(snapshot.get("lang"), Some("en"));
        assert_eq!(snapshot.origin(), SnapshotOrigin::Ambient);
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn test_insert_and_remove() {
        let mut snapshot = PropertySnapshot::empty();
        assert_eq!(snapshot.insert("lang", "en"), None);
        assert_eq!(snapshot.insert("lang", "de"), Some("en".to_string()));
        assert_eq!(snapshot.remove("lang"), Some("de".to_string()));
        assert_eq!(snapshot.remove("lang"), None);
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_inherit_is_independent_copy() {
        let mut parent = PropertySnapshot::seeded(ambient(&[("lang", "en")]));
        let mut child = parent.inherit();

        parent.insert("lang", "de");
        child.insert("mode", "strict");

        assert_eq!(child.get("lang"), Some("en"));
        assert!(!parent.contains_key("mode"));
        assert_eq!(child.origin(), SnapshotOrigin::Inherited);
    }

    #[test]
    fn test_describe_lists_in_key_order() {
        let snapshot = PropertySnapshot::seeded(ambient(&[("b", "2"), ("a", "1")]));

        assert_eq!(
            snapshot.describe(),
            "-- listing properties --\na=1\nb=2\n"
        );
    }

    #[test]
    fn test_describe_empty() {
        assert_eq!(PropertySnapshot::empty().describe(), "-- listing properties --\n");
    }

    #[test]
    fn test_describe_abbreviates_long_values() {
        let long = "x".repeat(41);
        let exact = "y".repeat(40);
        let snapshot = PropertySnapshot::seeded(ambient(&[("long", &long), ("exact", &exact)]));

        let listing = snapshot.describe();
        assert!(listing.contains(&format!("long={}...\n", "x".repeat(37))));
        assert!(listing.contains(&format!("exact={exact}\n")));
    }

    #[test]
    fn test_keys_and_iter() {
        let snapshot = PropertySnapshot::seeded(ambient(&[("b", "2"), ("a", "1")]));

        assert_eq!(snapshot.keys(), vec!["a".to_string(), "b".to_string()]);
        let pairs: Vec<_> = snapshot.iter().collect();
        assert_eq!(pairs, vec![("a", "1"), ("b", "2")]);
    }

    #[test]
    fn test_snapshot_serialization() {
        let snapshot = PropertySnapshot::seeded(ambient(&[("lang", "en")])).inherit();
        let json = serde_json::to_string(&snapshot).unwrap();
        let restored: PropertySnapshot = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.get("lang"), Some("en"));
        assert_eq!(restored.origin(), SnapshotOrigin::Inherited);
        assert!(json.contains("\"inherited\""));
    }
}
