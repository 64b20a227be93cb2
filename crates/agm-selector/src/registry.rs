//! Selector registry and configuration
//!
//! Provides [`SelectorRegistry`] for naming selectors and
//! [`SelectorConfig`] for building them from configuration files.

use crate::constant::ConstantSelector;
use crate::pattern::PatternSelector;
use crate::priority::PrioritySelector;
use crate::selector::{GroupSelector, SelectError};
use agm_asset::GroupRef;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Declarative selector definition
///
/// Groups are named; their content hash is derived from the name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SelectorConfig {
    /// Always the same group
    Constant {
        /// Group name
        group: String,
    },

    /// Regex over a path, derived key looked up in `groups`
    Pattern {
        /// Regular expression
        pattern: String,
        /// Derived key → group name
        #[serde(default)]
        groups: BTreeMap<String, String>,
    },

    /// Highest-ranked candidate; first listed ranks highest
    Priority {
        /// Group names in priority order
        groups: Vec<String>,
    },
}

impl SelectorConfig {
    /// Build the configured selector
    ///
    /// # Errors
    /// Returns [`SelectError::InvalidPattern`] for a bad pattern
    pub fn build(&self) -> Result<Box<dyn GroupSelector>, SelectError> {
        Ok(match self {
            Self::Constant { group } => Box::new(ConstantSelector::new(GroupRef::named(group))),
            Self::Pattern { pattern, groups } => Box::new(PatternSelector::new(
                pattern,
                groups
                    .iter()
                    .map(|(key, group)| (key.clone(), GroupRef::named(group))),
            )?),
            Self::Priority { groups } => {
                Box::new(PrioritySelector::ranked(groups.iter().map(GroupRef::named)))
            }
        })
    }
}

/// Named group selectors
#[derive(Debug, Default)]
pub struct SelectorRegistry {
    selectors: IndexMap<String, Box<dyn GroupSelector>>,
}

impl SelectorRegistry {
    /// Create new empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every configured selector
    ///
    /// # Errors
    /// Returns the first build failure
    pub fn from_configs<'a, I>(configs: I) -> Result<Self, SelectError>
    where
        I: IntoIterator<Item = (&'a String, &'a SelectorConfig)>,
    {
        let mut registry = Self::new();
        for (name, config) in configs {
            registry.register(name.clone(), config.build()?);
        }
        Ok(registry)
    }

    /// Register (or replace) a selector
    pub fn register(&mut self, name: impl Into<String>, selector: Box<dyn GroupSelector>) {
        let name = name.into();
        tracing::debug!(name = %name, kind = selector.name(), "register selector");
        self.selectors.insert(name, selector);
    }

    /// Look up a selector
    ///
    /// # Errors
    /// Returns [`SelectError::UnknownSelector`] if nothing is registered
    /// under `name`
    pub fn get(&self, name: &str) -> Result<&dyn GroupSelector, SelectError> {
        self.selectors
            .get(name)
            .map(|selector| &**selector)
            .ok_or_else(|| SelectError::UnknownSelector(name.to_string()))
    }

    /// Check if selector exists
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.selectors.contains_key(name)
    }

    /// Remove selector
    pub fn remove(&mut self, name: &str) -> bool {
        self.selectors.shift_remove(name).is_some()
    }

    /// Registered names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.selectors.keys().map(String::as_str)
    }

    /// Get number of registered selectors
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::SelectionKey;
    use std::collections::BTreeSet;

    #[test]
    fn registry_new_empty() {
        let registry = SelectorRegistry::new();
        assert!(registry.is_empty());
        assert!(matches!(
            registry.get("shared"),
            Err(SelectError::UnknownSelector(_))
        ));
    }

    #[test]
    fn registry_register_and_remove() {
        let mut registry = SelectorRegistry::new();
        registry.register(
            "shared",
            Box::new(ConstantSelector::new(GroupRef::named("Shared"))),
        );
        assert!(registry.contains("shared"));
        assert_eq!(registry.get("shared").unwrap().name(), "constant");
        assert!(registry.remove("shared"));
        assert!(!registry.contains("shared"));
    }

    #[test]
    fn configs_deserialize_from_toml() {
        let source = r#"
            [shared]
            kind = "priority"
            groups = ["Common", "Shared"]

            [by_folder]
            kind = "pattern"
            pattern = '^Assets/(\w+)/'
            groups = { UI = "Interface" }

            [fallback]
            kind = "constant"
            group = "Misc"
        "#;
        let configs: BTreeMap<String, SelectorConfig> = toml::from_str(source).unwrap();
        let registry = SelectorRegistry::from_configs(&configs).unwrap();
        assert_eq!(registry.len(), 3);

        let candidates = BTreeSet::from([GroupRef::named("Shared"), GroupRef::named("Common")]);
        let shared = registry.get("shared").unwrap();
        assert_eq!(
            shared.select(SelectionKey::Candidates(&candidates)).unwrap(),
            GroupRef::named("Common")
        );

        let by_folder = registry.get("by_folder").unwrap();
        assert_eq!(
            by_folder.select(SelectionKey::Path("Assets/UI/button.png")).unwrap(),
            GroupRef::named("Interface")
        );
    }

    #[test]
    fn bad_pattern_fails_registry_build() {
        let configs = BTreeMap::from([(
            "broken".to_string(),
            SelectorConfig::Pattern {
                pattern: "(".to_string(),
                groups: BTreeMap::new(),
            },
        )]);
        assert!(SelectorRegistry::from_configs(&configs).is_err());
    }
}
