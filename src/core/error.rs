//! Pack build errors.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::adapters::UploadError;
use crate::domain::Identity;
use crate::media::NormalizeFailure;

/// A build pass failure. The previous manifest on disk is untouched.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Failed to convert {filename} ({identity}): {failure}")]
    Normalize {
        filename: String,
        identity: Identity,
        #[source]
        failure: NormalizeFailure,
    },

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("Failed to read manifest {}: {source}", .path.display())]
    ReadManifest {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse manifest {}: {source}", .path.display())]
    ParseManifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write manifest {}: {source}", .path.display())]
    WriteManifest {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to serialize manifest: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl BuildError {
    /// Where the failing input was saved, for normalization failures
    pub fn diagnostic_path(&self) -> Option<&std::path::Path> {
        match self {
            BuildError::Normalize { failure, .. } => failure.diagnostic.path(),
            _ => None,
        }
    }
}
