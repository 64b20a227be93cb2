//! The per-asset metadata aggregate
//!
//! An [`AssetRecord`] says which group an asset lives in, the address it is
//! loaded by and the labels attached to it. Records carry no behavior beyond
//! accessors; stores and the reconciliation engine own all mutation policy.

use crate::hash::ContentHash;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Ordered label set
pub type Labels = BTreeSet<String>;

/// Opaque asset identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetGuid(Uuid);

impl AssetGuid {
    /// Fresh random guid
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing uuid
    #[inline]
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Deterministic guid for tests and fixtures
    #[inline]
    #[must_use]
    pub const fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }

    /// Underlying uuid
    #[inline]
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AssetGuid {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for AssetGuid {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for AssetGuid {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Reference to an asset group
///
/// Equality is name-and-hash: two refs with the same name but different
/// content hashes are different groups.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupRef {
    name: String,
    content_hash: ContentHash,
}

impl GroupRef {
    /// Create from explicit name and hash
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, content_hash: ContentHash) -> Self {
        Self {
            name: name.into(),
            content_hash,
        }
    }

    /// Group whose hash is derived from its name
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        let content_hash = ContentHash::compute(name.as_bytes());
        Self { name, content_hash }
    }

    /// Group name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Group content hash
    #[inline]
    #[must_use]
    pub fn content_hash(&self) -> &ContentHash {
        &self.content_hash
    }
}

impl Display for GroupRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.content_hash.short())
    }
}

/// Asset metadata aggregate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    /// Identity; never changes for the life of the asset
    pub guid: AssetGuid,
    /// Load address
    pub address: String,
    /// Attached labels
    #[serde(default)]
    pub labels: Labels,
    /// Owning group
    pub group: GroupRef,
}

impl AssetRecord {
    /// Record with no labels
    #[must_use]
    pub fn new(guid: AssetGuid, address: impl Into<String>, group: GroupRef) -> Self {
        Self {
            guid,
            address: address.into(),
            labels: Labels::new(),
            group,
        }
    }

    /// Replace the label set
    #[must_use]
    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Whether the record carries `label`
    #[inline]
    #[must_use]
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.contains(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_equality_is_name_and_hash() {
        let a = GroupRef::named("Shared");
        let b = GroupRef::named("Shared");
        let renamed_hash = GroupRef::new("Shared", ContentHash::compute(b"other"));

        assert_eq!(a, b);
        assert_ne!(a, renamed_hash);
        assert_ne!(a, GroupRef::named("Common"));
    }

    #[test]
    fn guid_display_round_trips() {
        let guid = AssetGuid::from_u128(0xabc);
        let parsed: AssetGuid = guid.to_string().parse().unwrap();
        assert_eq!(guid, parsed);
        assert_eq!(guid.to_string().len(), 32);
    }

    #[test]
    fn record_labels_are_ordered_and_deduplicated() {
        let record = AssetRecord::new(AssetGuid::from_u128(1), "hero", GroupRef::named("Art"))
            .with_labels(["b", "a", "b"]);
        let labels: Vec<_> = record.labels.iter().map(String::as_str).collect();
        assert_eq!(labels, vec!["a", "b"]);
        assert!(record.has_label("a"));
    }

    #[test]
    fn record_serde_defaults_labels() {
        let guid = AssetGuid::from_u128(7);
        let group = GroupRef::named("Art");
        let json = serde_json::json!({
            "guid": guid,
            "address": "hero",
            "group": group,
        });
        let record: AssetRecord = serde_json::from_value(json).unwrap();
        assert!(record.labels.is_empty());
        assert_eq!(record.group, GroupRef::named("Art"));
    }
}
