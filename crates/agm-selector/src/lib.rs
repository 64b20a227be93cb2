//! AGM Group Selection
//!
//! Pluggable policies that decide which group an asset belongs to.
//!
//! # Core Concepts
//!
//! - [`GroupSelector`]: `select(key) -> GroupRef`
//! - [`ConstantSelector`]: always the same group
//! - [`PatternSelector`]: regex over a path, derived key looked up in a table
//! - [`PrioritySelector`]: best-ranked member of a candidate set, never a
//!   default
//! - [`SelectorRegistry`]: named selectors built from [`SelectorConfig`]
//!
//! # Example
//!
//! ```rust
//! use agm_asset::GroupRef;
//! use agm_selector::{GroupSelector, PrioritySelector, SelectionKey};
//! use std::collections::BTreeSet;
//!
//! let selector = PrioritySelector::ranked([GroupRef::named("A"), GroupRef::named("B")]);
//! let candidates = BTreeSet::from([GroupRef::named("B")]);
//! let group = selector.select(SelectionKey::Candidates(&candidates)).unwrap();
//! assert_eq!(group.name(), "B");
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod constant;
mod pattern;
mod priority;
mod registry;
mod selector;

pub use constant::ConstantSelector;
pub use pattern::PatternSelector;
pub use priority::PrioritySelector;
pub use registry::{SelectorConfig, SelectorRegistry};
pub use selector::{GroupSelector, SelectError, SelectionKey};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
