//! Core pack building logic.
//!
//! This module contains:
//! - ManifestCache: records from the previous build, keyed by identity
//! - PackBuilder: the incremental build pass and atomic manifest write
//! - PackIndex: the picker index and its locked updater

pub mod builder;
pub mod cache;
pub mod error;
pub mod index;

// Re-export commonly used types
pub use builder::{BuildReport, BuildSession, PackBuilder, PackDefaults};
pub use cache::{load_manifest, ManifestCache};
pub use error::BuildError;
pub use index::{add_all_to_index, add_to_index, IndexError, PackIndex, INDEX_FILENAME};
