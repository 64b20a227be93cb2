//! AGM Core
//!
//! Duplicate-root promotion and reconciliation sessions.
//!
//! # Architecture
//!
//! ```text
//! DependencyFactSource ──► PromotionDriver ──► GroupSelector
//!                                 │
//!                                 ▼
//!                            Applicator ──► live Store
//!
//! Session ──► Reconciler ──► ComparisonTree ──► merge_copy ──► Store
//! ```
//!
//! # Example
//!
//! ```rust
//! use agm_asset::GroupRef;
//! use agm_core::{AgmConfig, DependencyGraph, Session};
//! use agm_reconcile::StoreSet;
//! use agm_store::StoreKind;
//!
//! let mut graph = DependencyGraph::new();
//! let a = agm_asset::AssetGuid::from_u128(1);
//! let b = agm_asset::AssetGuid::from_u128(2);
//! let tex = agm_asset::AssetGuid::from_u128(3);
//! graph.add_explicit(a, "Assets/a.prefab".parse().unwrap(), GroupRef::named("A"));
//! graph.add_explicit(b, "Assets/b.prefab".parse().unwrap(), GroupRef::named("B"));
//! graph.add_asset(tex, "Assets/tex.png".parse().unwrap());
//! graph.add_dependency(a, tex).unwrap();
//! graph.add_dependency(b, tex).unwrap();
//!
//! let mut session = Session::open(StoreSet::empty(), AgmConfig::default()).unwrap();
//! let report = session.promote(&mut graph).unwrap();
//! assert!(report.converged());
//! assert_eq!(report.promotions.len(), 1);
//! assert_eq!(graph.group_of(&tex), Some(&GroupRef::named("Shared")));
//! assert_eq!(session.stores().get(StoreKind::Live).len(), 1);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod applicator;
mod collaborators;
mod config;
mod driver;
mod error;
mod graph;
mod session;
mod state;

pub use applicator::StoreApplicator;
pub use collaborators::{Applicator, DependencyFactSource, LabelSource};
pub use config::{AddressMode, AgmConfig, LoggingConfig, PromotionConfig};
pub use driver::{
    Promotion, PromotionDriver, PromotionOutcome, PromotionReport, Skip, MAX_PROMOTION_ROUNDS,
};
pub use error::{AgmError, ApplyError, ConfigError, FactSourceError, PromotionError, Result};
pub use graph::{DependencyGraph, GraphAsset, GraphError};
pub use session::Session;
pub use state::{allowed_transitions, validate_transition, DriverState};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
