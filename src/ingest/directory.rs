//! Local directory source.
//!
//! Every regular, non-ignored file whose sniffed type is an image, a video or
//! a gzip archive becomes a [`SourceItem`], in lexicographic filename order.

use std::path::{Path, PathBuf};

use glob::Pattern;
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::PackDefaults;
use crate::domain::SourceItem;
use crate::media::{sniff_mimetype, MediaCategory};

/// Manifest filename inside a source directory
pub const MANIFEST_FILENAME: &str = "pack.json";

/// Filenames never treated as stickers
pub const DEFAULT_IGNORE_PATTERNS: &[&str] = &[".*", MANIFEST_FILENAME];

/// Errors that can occur while enumerating a directory
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Source directory does not exist: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("Invalid ignore pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A directory of sticker files
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
    ignore: Vec<Pattern>,
}

impl DirectorySource {
    /// Open `dir` with the default ignore patterns
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, SourceError> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(SourceError::DirectoryNotFound(dir));
        }

        let ignore = DEFAULT_IGNORE_PATTERNS
            .iter()
            .map(|p| Pattern::new(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { dir, ignore })
    }

    /// Add filename glob patterns to skip
    pub fn with_ignore_patterns<S: AsRef<str>>(mut self, patterns: &[S]) -> Result<Self, SourceError> {
        for pattern in patterns {
            self.ignore.push(Pattern::new(pattern.as_ref())?);
        }
        Ok(self)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<dir>/pack.json`
    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILENAME)
    }

    /// Title and id for a new pack: the directory name, and its sanitized form
    pub fn defaults(&self) -> PackDefaults {
        let absolute = self.dir.canonicalize().unwrap_or_else(|_| self.dir.clone());
        let name = absolute
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        PackDefaults::new(name.clone(), convert_name(&name))
    }

    pub fn is_ignored(&self, filename: &str) -> bool {
        self.ignore.iter().any(|p| p.matches(filename))
    }

    /// Candidate files, sorted by name
    pub async fn entries(&self) -> Result<Vec<PathBuf>, SourceError> {
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        let mut paths = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                warn!(path = %path.display(), "Skipping non UTF-8 filename");
                continue;
            };
            if self.is_ignored(name) {
                continue;
            }

            match tokio::fs::metadata(&path).await {
                Ok(metadata) if metadata.is_file() => paths.push(path),
                Ok(_) => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable entry"),
            }
        }

        paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(paths)
    }

    /// Read one entry. `None` when it is unreadable or not sticker media.
    pub async fn load(&self, path: &Path) -> Option<SourceItem> {
        let filename = path.file_name()?.to_str()?.to_string();

        let data = match tokio::fs::read(path).await {
            Ok(data) => data,
            Err(e) => {
                warn!(file = %filename, error = %e, "Failed to read file, skipping");
                return None;
            }
        };

        let keep = sniff_mimetype(&data, Some(&filename))
            .map(|m| MediaCategory::of(m).is_source())
            .unwrap_or(false);
        if !keep {
            debug!(file = %filename, "Not sticker media, skipping");
            return None;
        }

        let label = label_from_filename(&filename);
        Some(SourceItem::local(filename, data, label))
    }

    /// Load every item eagerly
    pub async fn items(&self) -> Result<Vec<SourceItem>, SourceError> {
        let mut items = Vec::new();
        for path in self.entries().await? {
            if let Some(item) = self.load(&path).await {
                items.push(item);
            }
        }
        Ok(items)
    }
}

/// File stem with a leading `<digits>-` ordering prefix removed
pub fn label_from_filename(filename: &str) -> String {
    let stem = Path::new(filename)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    match stem.split_once('-') {
        Some((prefix, rest)) if !prefix.is_empty() && prefix.chars().all(|c| c.is_ascii_digit()) => {
            rest.to_string()
        }
        _ => stem,
    }
}

/// Pack id from a display name: spaces become `_`, then only
/// `[A-Za-z0-9_-/.#]` is kept
pub fn convert_name(name: &str) -> String {
    name.chars()
        .map(|c| if c == ' ' { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '/' | '.' | '#'))
        .collect()
}
