//! Dependency facts supplied by the build-graph analyzer

use crate::path::AssetPath;
use crate::record::{AssetGuid, GroupRef};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// What the build graph currently knows about one asset
///
/// Read-only input to the promotion driver. A fresh set is derived every
/// round, so nothing here is ever patched in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyFact {
    /// Asset identity
    pub asset: AssetGuid,
    /// Where the asset lives on disk
    pub path: AssetPath,
    /// Pulled into more than one build output
    pub is_duplicate: bool,
    /// Only present because other assets depend on it
    pub is_implicit_root: bool,
    /// Assets that depend on this one
    #[serde(default)]
    pub dependents: BTreeSet<AssetGuid>,
    /// Groups whose bundles contain this asset
    #[serde(default)]
    pub bundle_groups: BTreeSet<GroupRef>,
}

impl DependencyFact {
    /// Fact for an explicitly placed, non-duplicated asset
    #[must_use]
    pub fn explicit(asset: AssetGuid, path: AssetPath, group: GroupRef) -> Self {
        Self {
            asset,
            path,
            is_duplicate: false,
            is_implicit_root: false,
            dependents: BTreeSet::new(),
            bundle_groups: BTreeSet::from([group]),
        }
    }

    /// True when the promotion driver should act on this asset
    #[inline]
    #[must_use]
    pub fn is_duplicate_root(&self) -> bool {
        self.is_duplicate && self.is_implicit_root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_root_needs_both_flags() {
        let path = AssetPath::new("Assets/tex.png").unwrap();
        let mut fact =
            DependencyFact::explicit(AssetGuid::from_u128(1), path, GroupRef::named("Art"));
        assert!(!fact.is_duplicate_root());

        fact.is_duplicate = true;
        assert!(!fact.is_duplicate_root());

        fact.is_implicit_root = true;
        assert!(fact.is_duplicate_root());
    }
}
