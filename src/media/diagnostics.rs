//! Persisting inputs that failed to normalize.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{error, warn};

const FAILED_INPUT_PREFIX: &str = "stickerpack-failed-";

/// Where the failing input ended up, if anywhere
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticArtifact {
    /// Original bytes written to this path
    Saved(PathBuf),
    /// Writing the bytes failed too
    CaptureFailed(String),
}

impl DiagnosticArtifact {
    pub fn path(&self) -> Option<&Path> {
        match self {
            DiagnosticArtifact::Saved(path) => Some(path),
            DiagnosticArtifact::CaptureFailed(_) => None,
        }
    }
}

impl fmt::Display for DiagnosticArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticArtifact::Saved(path) => write!(f, "input saved to {}", path.display()),
            DiagnosticArtifact::CaptureFailed(reason) => {
                write!(f, "input could not be saved: {reason}")
            }
        }
    }
}

fn suffix_for(filename: Option<&str>) -> String {
    filename
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default()
}

/// Write the original bytes to a kept temporary file.
///
/// Never fails: a secondary error is reported inside the artifact instead.
pub fn capture_failed_input(data: &[u8], filename: Option<&str>) -> DiagnosticArtifact {
    let result = (|| -> std::io::Result<PathBuf> {
        let mut file = tempfile::Builder::new()
            .prefix(FAILED_INPUT_PREFIX)
            .suffix(&suffix_for(filename))
            .tempfile()?;
        file.write_all(data)?;
        file.flush()?;
        let (_, path) = file.keep().map_err(|e| e.error)?;
        Ok(path)
    })();

    match result {
        Ok(path) => {
            error!(path = %path.display(), "Saved failing input for inspection");
            DiagnosticArtifact::Saved(path)
        }
        Err(e) => {
            warn!(error = %e, "Could not save failing input");
            DiagnosticArtifact::CaptureFailed(e.to_string())
        }
    }
}
