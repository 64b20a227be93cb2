//! Group selector trait and core types
//!
//! Provides the [`GroupSelector`] trait: a pluggable policy that maps a
//! selection key to exactly one [`GroupRef`].

use agm_asset::GroupRef;
use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};

/// Input to a group selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionKey<'a> {
    /// Raw, path-like key
    Path(&'a str),

    /// Candidate groups gathered from an asset's dependents
    Candidates(&'a BTreeSet<GroupRef>),
}

impl SelectionKey<'_> {
    /// Short kind name for diagnostics
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Path(_) => "path",
            Self::Candidates(_) => "candidates",
        }
    }
}

impl Display for SelectionKey<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "path `{path}`"),
            Self::Candidates(groups) => {
                let names: Vec<_> = groups.iter().map(GroupRef::name).collect();
                write!(f, "candidates [{}]", names.join(", "))
            }
        }
    }
}

/// Policy mapping a selection key to one group
///
/// Selectors never guess: when they cannot decide they return an error and
/// the caller decides whether to skip or retry.
pub trait GroupSelector: fmt::Debug {
    /// Select the group for `key`
    ///
    /// # Errors
    /// - [`SelectError::NoMatch`] if no candidate is acceptable
    /// - [`SelectError::NoSelection`] if the key yields no selection
    /// - [`SelectError::UnsupportedKey`] if the selector cannot use this
    ///   kind of key
    fn select(&self, key: SelectionKey<'_>) -> Result<GroupRef, SelectError>;

    /// Selector name (for logging)
    fn name(&self) -> &'static str;
}

impl<S: GroupSelector + ?Sized> GroupSelector for Box<S> {
    fn select(&self, key: SelectionKey<'_>) -> Result<GroupRef, SelectError> {
        (**self).select(key)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Group selection failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectError {
    /// None of the candidates is in the priority list
    #[error("no candidate group matches: {candidates}")]
    NoMatch {
        /// Rendered candidate set
        candidates: String,
    },

    /// Pattern absent, no match, or derived key unknown
    #[error("no selection for {key}: {reason}")]
    NoSelection {
        /// Rendered key
        key: String,
        /// Why nothing was selected
        reason: String,
    },

    /// Selector cannot handle this kind of key
    #[error("selector `{selector}` does not accept {kind} keys")]
    UnsupportedKey {
        /// Selector name
        selector: &'static str,
        /// Key kind
        kind: &'static str,
    },

    /// Configured pattern does not compile
    #[error("invalid selector pattern `{pattern}`: {message}")]
    InvalidPattern {
        /// Source pattern
        pattern: String,
        /// Compiler message
        message: String,
    },

    /// Named selector missing from the registry
    #[error("unknown selector `{0}`")]
    UnknownSelector(String),
}

impl SelectError {
    /// No-selection error for a key
    #[must_use]
    pub fn no_selection(key: SelectionKey<'_>, reason: impl Into<String>) -> Self {
        Self::NoSelection {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}
