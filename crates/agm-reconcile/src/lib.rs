//! AGM Reconcile
//!
//! Type-driven three-way diff and merge of asset metadata across the
//! simulated, sidecar and live stores.
//!
//! # Overview
//!
//! - [`ComparerRegistry`]: how each [`TypeTag`] is hashed and expanded
//! - [`Reconciler::create_entry`]: builds the [`ComparisonTree`] for a path
//! - [`Reconciler::merge_copy`]: copies one store's value into another at
//!   any entry, then marks the affected part of the tree dirty
//!
//! ```
//! use agm_asset::{AssetGuid, AssetPath, AssetRecord, GroupRef};
//! use agm_reconcile::{ComparerRegistry, EntryId, Reconciler, StoreSet};
//! use agm_store::StoreKind;
//!
//! let registry = ComparerRegistry::with_defaults();
//! let engine = Reconciler::new(&registry);
//! let mut stores = StoreSet::empty();
//! let path = AssetPath::new("Assets/hero.png").unwrap();
//! let record = AssetRecord::new(AssetGuid::from_u128(1), "hero", GroupRef::named("Art"));
//! stores.get_mut(StoreKind::Sidecar).add_asset(path.clone(), record, false).unwrap();
//!
//! let mut tree = engine.create_entry(&stores, &path);
//! assert!(tree.has_drift());
//! engine
//!     .merge_copy(&mut tree, &mut stores, EntryId::ROOT, StoreKind::Sidecar, StoreKind::Live)
//!     .unwrap();
//! engine.refresh(&mut tree, &stores);
//! assert_eq!(tree.root().matches(StoreKind::Sidecar, StoreKind::Live), Some(true));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod comparer;
mod engine;
mod error;
mod stores;
mod tree;
mod value;

pub use comparer::{
    Comparer, ComparerRegistry, CompositeComparer, ContainerComparer, FieldComparer, Getter,
    Identity, Setter, WriteError,
};
pub use engine::{ReconcileReport, Reconciler};
pub use error::{ReconcileError, Result};
pub use stores::StoreSet;
pub use tree::{
    ComparisonEntry, ComparisonTree, EntryId, EntryKind, FieldStep, Operand, PerStore,
    ADJACENT_PAIRS,
};
pub use value::{MetaValue, TypeTag};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
