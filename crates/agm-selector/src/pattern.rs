//! Pattern-matched selector
//!
//! Applies a regular expression to a path-like key and looks the matched
//! text up in a table of groups. The lookup key is the named capture `key`
//! if the pattern has one, else the first capture group, else the whole
//! match.

use crate::selector::{GroupSelector, SelectError, SelectionKey};
use agm_asset::GroupRef;
use indexmap::IndexMap;
use regex::Regex;

/// Selects a group from a regex match on a path
#[derive(Debug, Clone)]
pub struct PatternSelector {
    pattern: Option<Regex>,
    table: IndexMap<String, GroupRef>,
}

impl PatternSelector {
    /// Compile `pattern` and use `table` for lookups
    ///
    /// # Errors
    /// Returns [`SelectError::InvalidPattern`] if the pattern does not compile
    pub fn new<I>(pattern: &str, table: I) -> Result<Self, SelectError>
    where
        I: IntoIterator<Item = (String, GroupRef)>,
    {
        let regex = Regex::new(pattern).map_err(|e| SelectError::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            pattern: Some(regex),
            table: table.into_iter().collect(),
        })
    }

    /// Selector with no pattern; every selection fails
    #[must_use]
    pub fn without_pattern() -> Self {
        Self {
            pattern: None,
            table: IndexMap::new(),
        }
    }

    /// Source of the compiled pattern
    #[must_use]
    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_ref().map(Regex::as_str)
    }

    /// Lookup key derived from `path`, if the pattern matches
    #[must_use]
    pub fn derive_key<'p>(&self, path: &'p str) -> Option<&'p str> {
        let regex = self.pattern.as_ref()?;
        let captures = regex.captures(path)?;
        let matched = captures
            .name("key")
            .or_else(|| captures.get(1))
            .or_else(|| captures.get(0))?;
        Some(matched.as_str())
    }
}

impl GroupSelector for PatternSelector {
    fn select(&self, key: SelectionKey<'_>) -> Result<GroupRef, SelectError> {
        let SelectionKey::Path(path) = key else {
            return Err(SelectError::UnsupportedKey {
                selector: self.name(),
                kind: key.kind(),
            });
        };
        if self.pattern.is_none() {
            return Err(SelectError::no_selection(key, "no pattern configured"));
        }
        let derived = self
            .derive_key(path)
            .ok_or_else(|| SelectError::no_selection(key, "pattern does not match"))?;
        let group = self.table.get(derived).cloned().ok_or_else(|| {
            SelectError::no_selection(key, format!("no group for derived key `{derived}`"))
        })?;
        tracing::trace!(path, derived, group = %group, "pattern selection");
        Ok(group)
    }

    fn name(&self) -> &'static str {
        "pattern"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn table() -> Vec<(String, GroupRef)> {
        vec![
            ("Characters".to_string(), GroupRef::named("Characters")),
            ("UI".to_string(), GroupRef::named("Interface")),
        ]
    }

    #[test]
    fn named_capture_wins() {
        let selector = PatternSelector::new(r"^Assets/(\w+)/(?P<key>\w+)/", table()).unwrap();
        assert_eq!(
            selector.select(SelectionKey::Path("Assets/Game/UI/button.png")).unwrap(),
            GroupRef::named("Interface")
        );
    }

    #[test]
    fn first_group_then_whole_match() {
        let grouped = PatternSelector::new(r"^Assets/(\w+)/", table()).unwrap();
        assert_eq!(grouped.derive_key("Assets/Characters/hero.png"), Some("Characters"));

        let whole = PatternSelector::new(r"UI", table()).unwrap();
        assert_eq!(whole.derive_key("Assets/UI/x.png"), Some("UI"));
    }

    #[test]
    fn fails_without_pattern_match_or_table_entry() {
        let selector = PatternSelector::new(r"^Assets/(\w+)/", table()).unwrap();
        assert!(matches!(
            selector.select(SelectionKey::Path("Other/x.png")),
            Err(SelectError::NoSelection { .. })
        ));
        assert!(matches!(
            selector.select(SelectionKey::Path("Assets/Audio/x.wav")),
            Err(SelectError::NoSelection { .. })
        ));

        let absent = PatternSelector::without_pattern();
        assert!(matches!(
            absent.select(SelectionKey::Path("Assets/UI/x.png")),
            Err(SelectError::NoSelection { .. })
        ));
    }

    #[test]
    fn rejects_candidate_keys() {
        let selector = PatternSelector::new(r".*", table()).unwrap();
        let candidates = BTreeSet::new();
        assert!(matches!(
            selector.select(SelectionKey::Candidates(&candidates)),
            Err(SelectError::UnsupportedKey { .. })
        ));
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let err = PatternSelector::new(r"(unclosed", table()).unwrap_err();
        assert!(matches!(err, SelectError::InvalidPattern { .. }));
    }
}
