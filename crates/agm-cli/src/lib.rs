//! AGM command-line front end
//!
//! `agm diff` prints comparison trees for the three metadata stores held in
//! a [snapshot](snapshot::Snapshot). `agm promote` runs duplicate-root
//! promotion over the snapshot's dependency graph and can write the
//! promoted stores back out.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod cli;
pub mod commands;
pub mod logging;
pub mod snapshot;

pub use commands::{diff, promote, DiffOptions, PromoteOptions};
pub use snapshot::{Snapshot, SnapshotError};
