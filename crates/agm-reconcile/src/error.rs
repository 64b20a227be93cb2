//! Error types for reconciliation

use crate::comparer::WriteError;
use crate::tree::EntryId;
use agm_asset::AssetPath;
use agm_store::{StoreError, StoreKind};

/// Reconciliation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconcileError {
    /// Destination side refuses writes
    #[error("cannot merge into read-only {store} at `{entry}`")]
    ReadOnlyTarget {
        /// Entry being merged
        entry: String,
        /// Refusing store
        store: StoreKind,
    },

    /// Destination store has no record to write a field into
    #[error("{store} has no record at {path} to merge `{entry}` into")]
    MissingTarget {
        /// Compared path
        path: AssetPath,
        /// Destination store
        store: StoreKind,
        /// Entry being merged
        entry: String,
    },

    /// Entry id is not part of the tree
    #[error("unknown comparison entry {0}")]
    UnknownEntry(EntryId),

    /// Value could not be written along the entry's field path
    #[error("cannot write `{entry}`: {reason}")]
    Write {
        /// Entry being merged
        entry: String,
        /// Structural failure
        #[source]
        reason: WriteError,
    },

    /// Store passed in the wrong slot of a store set
    #[error("expected a {expected} store, found {found}")]
    WrongStoreKind {
        /// Slot's kind
        expected: StoreKind,
        /// Store's actual kind
        found: StoreKind,
    },

    /// Underlying store refused the write
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result alias for reconciliation
pub type Result<T> = std::result::Result<T, ReconcileError>;
