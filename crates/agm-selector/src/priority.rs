//! Priority-ordered selector
//!
//! Holds `(priority, group)` pairs; lower numbers win. Given a candidate set
//! it returns the highest-priority group that is a member of the set. There
//! is deliberately no default: an unmatched set is an error.

use crate::selector::{GroupSelector, SelectError, SelectionKey};
use agm_asset::GroupRef;

/// Picks the best-ranked candidate group
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrioritySelector {
    /// Sorted by priority; ties keep insertion order
    entries: Vec<(u32, GroupRef)>,
}

impl PrioritySelector {
    /// Selector over `(priority, group)` pairs
    #[must_use]
    pub fn new<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (u32, GroupRef)>,
    {
        let mut entries: Vec<_> = entries.into_iter().collect();
        entries.sort_by_key(|(priority, _)| *priority);
        Self { entries }
    }

    /// Selector ranking `groups` in the given order
    #[must_use]
    pub fn ranked<I>(groups: I) -> Self
    where
        I: IntoIterator<Item = GroupRef>,
    {
        Self::new((0u32..).zip(groups))
    }

    /// Add an entry, keeping the list sorted
    pub fn push(&mut self, priority: u32, group: GroupRef) {
        let at = self.entries.partition_point(|(p, _)| *p <= priority);
        self.entries.insert(at, (priority, group));
    }

    /// Entries in priority order
    #[must_use]
    pub fn entries(&self) -> &[(u32, GroupRef)] {
        &self.entries
    }
}

impl GroupSelector for PrioritySelector {
    fn select(&self, key: SelectionKey<'_>) -> Result<GroupRef, SelectError> {
        let SelectionKey::Candidates(candidates) = key else {
            return Err(SelectError::UnsupportedKey {
                selector: self.name(),
                kind: key.kind(),
            });
        };
        self.entries
            .iter()
            .find(|(_, group)| candidates.contains(group))
            .map(|(_, group)| group.clone())
            .ok_or_else(|| SelectError::NoMatch {
                candidates: key.to_string(),
            })
    }

    fn name(&self) -> &'static str {
        "priority"
    }
}
