//! Error types for AGM Core
//!
//! Provides error handling for:
//! - Fact derivation failures
//! - Promotion state machine misuse
//! - Applicator failures
//! - Configuration loading

use crate::state::DriverState;
use agm_asset::AssetPath;
use agm_reconcile::ReconcileError;
use agm_selector::SelectError;
use agm_store::StoreError;
use std::path::PathBuf;

/// Main AGM error type
#[derive(Debug, thiserror::Error)]
pub enum AgmError {
    /// Promotion run failed
    #[error("promotion failed: {0}")]
    Promotion(#[from] PromotionError),

    /// Reconciliation failed
    #[error("reconciliation failed: {0}")]
    Reconcile(#[from] ReconcileError),

    /// Selector lookup or build failed
    #[error("selector error: {0}")]
    Select(#[from] SelectError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Store rejected a mutation
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Fact source could not derive facts
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("dependency facts unavailable: {message}")]
pub struct FactSourceError {
    /// Source message
    pub message: String,
}

impl FactSourceError {
    /// Create error with message
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Promotion driver errors
///
/// Per-asset failures never surface here; they are recorded as skips.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PromotionError {
    /// Fact source failed; the run stops
    #[error(transparent)]
    FactSource(#[from] FactSourceError),

    /// State machine was driven through an edge it does not have
    #[error("illegal driver transition {from:?} -> {to:?}")]
    IllegalTransition {
        /// Current state
        from: DriverState,
        /// Requested state
        to: DriverState,
    },
}

/// Applicator errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApplyError {
    /// Backing store refused the write
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Applicator declined the asset
    #[error("cannot apply {path}: {message}")]
    Rejected {
        /// Asset path
        path: AssetPath,
        /// Why
        message: String,
    },
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("cannot read {}: {source}", path.display())]
    Io {
        /// Config file
        path: PathBuf,
        /// I/O failure
        #[source]
        source: std::io::Error,
    },

    /// TOML did not parse
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Promotion names a selector that is not configured
    #[error("promotion selector `{0}` is not configured")]
    UnknownSelector(String),

    /// Promotion names a selector that needs a path key
    #[error("promotion selector `{0}` selects by path; promotion offers candidate groups")]
    PathSelectorForPromotion(String),

    /// Configured selector cannot be built
    #[error("selector `{name}`: {source}")]
    Selector {
        /// Selector name
        name: String,
        /// Build failure
        #[source]
        source: SelectError,
    },
}

/// Result type alias for AGM operations
pub type Result<T> = std::result::Result<T, AgmError>;
