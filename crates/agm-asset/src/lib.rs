//! AGM Asset Model
//!
//! Per-asset metadata aggregate for the asset group pipeline.
//!
//! # Core Concepts
//!
//! - [`AssetRecord`]: group, address and labels of one asset
//! - [`GroupRef`]: name-and-hash group identity
//! - [`ContentHash`]: 32-byte blake3 hash; the zero hash means "absent"
//! - [`AssetPath`]: normalized store key
//! - [`DependencyFact`]: build-graph facts consumed by duplicate promotion
//! - [`AddressSimplifier`]: path to load-address mapping
//!
//! # Example
//!
//! ```rust
//! use agm_asset::{AssetGuid, AssetRecord, GroupRef};
//!
//! let record = AssetRecord::new(AssetGuid::new(), "hero", GroupRef::named("Characters"))
//!     .with_labels(["pc", "hd"]);
//! assert!(record.has_label("hd"));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod address;
mod fact;
mod hash;
mod path;
mod record;

pub use address::{AddressSimplifier, FileStemSimplifier, IdentitySimplifier};
pub use fact::DependencyFact;
pub use hash::{ContentHash, HashBuilder, HashError};
pub use path::{AssetPath, PathError};
pub use record::{AssetGuid, AssetRecord, GroupRef, Labels};

/// Label attached to every promoted shared asset
pub const SHARED_RESOURCES_LABEL: &str = "Shared Resources";

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
