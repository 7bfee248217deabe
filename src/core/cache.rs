//! Previously built records, keyed by identity.

use std::collections::HashMap;
use std::io;
use std::path::Path;

use tracing::debug;

use super::error::BuildError;
use crate::domain::{Identity, Manifest, StickerRecord};

/// Read-only lookup of the records in an existing manifest
#[derive(Debug, Default)]
pub struct ManifestCache {
    records: HashMap<Identity, StickerRecord>,
}

impl ManifestCache {
    /// Index every record of `manifest`; later duplicates win
    pub fn from_manifest(manifest: &Manifest) -> Self {
        let records = manifest
            .stickers
            .iter()
            .map(|record| (record.id.clone(), record.clone()))
            .collect();
        Self { records }
    }

    pub fn get(&self, id: &Identity) -> Option<&StickerRecord> {
        self.records.get(id)
    }

    pub fn contains(&self, id: &Identity) -> bool {
        self.records.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Load a manifest; `Ok(None)` when the file does not exist.
///
/// An existing but unparseable manifest is an error rather than an empty
/// pack, so that a bad file never causes a full re-upload.
pub async fn load_manifest(path: &Path) -> Result<Option<Manifest>, BuildError> {
    let content = match tokio::fs::read(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "No existing manifest");
            return Ok(None);
        }
        Err(source) => {
            return Err(BuildError::ReadManifest {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let manifest = serde_json::from_slice(&content).map_err(|source| BuildError::ParseManifest {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(manifest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MediaInfo;
    use tempfile::TempDir;

    fn record(id: &str, body: &str) -> StickerRecord {
        StickerRecord::new(
            Identity::from_raw(id),
            body,
            format!("mxc://hs/{id}"),
            MediaInfo::new("mxc://hs/x", 1, 1, 1, "image/png"),
        )
    }

    #[test]
    fn test_lookup_by_identity() {
        let mut manifest = Manifest::new("t", "t");
        manifest.stickers = vec![record("sha256:aa", "one"), record("sha256:bb", "two")];

        let cache = ManifestCache::from_manifest(&manifest);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&Identity::from_raw("sha256:bb")).unwrap().body, "two");
        assert!(!cache.contains(&Identity::from_raw("sha256:cc")));
    }

    #[tokio::test]
    async fn test_absent_manifest_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(load_manifest(&dir.path().join("pack.json")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_manifest_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pack.json");
        std::fs::write(&path, b"{ not json").unwrap();

        assert!(matches!(
            load_manifest(&path).await,
            Err(BuildError::ParseManifest { .. })
        ));
    }
}
