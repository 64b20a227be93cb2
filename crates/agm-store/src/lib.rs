//! AGM Stores
//!
//! Three views of the same asset metadata, one [`Store`] each:
//!
//! - **simulated**: what the placement rules would produce; read-only
//! - **sidecar**: the persisted staging copy; read-write
//! - **live**: the authoritative deployed state; read-write unless locked
//!
//! Every store maps [`AssetPath`](agm_asset::AssetPath) to
//! [`AssetRecord`](agm_asset::AssetRecord) and keeps a monotonic global
//! label registry.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod sidecar;
mod store;

pub use sidecar::{MemorySidecar, SidecarError, SidecarReader, SidecarWriter};
pub use store::{Store, StoreError, StoreKind};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
