//! Source enumeration.
//!
//! - `directory`: a local folder of sticker files
//! - `provider`: a remote provider pack, fetched through a catalog
//! - `scalar`: an integration-manager asset dump (already uploaded)

pub mod directory;
pub mod provider;
pub mod scalar;

pub use directory::{
    convert_name, label_from_filename, DirectorySource, SourceError, DEFAULT_IGNORE_PATTERNS,
    MANIFEST_FILENAME,
};
pub use provider::{import_pack, parse_pack_reference, ProviderError, ProviderImport};
pub use scalar::{import_scalar, ScalarError, ScalarImport};
