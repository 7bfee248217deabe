//! Incremental manifest builder.
//!
//! A [`BuildSession`] walks source items in order. Items whose identity is
//! already in the previous manifest reuse the uploaded record (only `body` and
//! annotations are refreshed); new items are normalized and uploaded. The
//! manifest is written once, atomically, on [`BuildSession::commit`].

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info, instrument};

use super::cache::{load_manifest, ManifestCache};
use super::error::BuildError;
use crate::adapters::Uploader;
use crate::domain::{Identity, Manifest, MediaInfo, SourceItem, StickerRecord};
use crate::media::sniff::extension_for;
use crate::media::Normalizer;

/// Title, id and extension metadata for a pack that has no manifest yet
#[derive(Debug, Clone, Default)]
pub struct PackDefaults {
    pub title: String,
    pub id: String,

    /// Pack-level extension metadata, merged into the manifest on every build
    pub extensions: BTreeMap<String, Value>,
}

impl PackDefaults {
    pub fn new(title: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            id: id.into(),
            extensions: BTreeMap::new(),
        }
    }

    /// Attach a namespaced extension object (e.g. `net.maunium.telegram.pack`)
    pub fn with_extension(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extensions.insert(key.into(), value);
        self
    }
}

/// Outcome of a committed build
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub manifest_path: PathBuf,
    pub manifest: Manifest,
    /// Records carried over from the previous manifest
    pub reused: usize,
    /// Records created by a fresh upload
    pub uploaded: usize,
}

/// Builds manifests using a normalizer and an uploader
#[derive(Clone, Copy)]
pub struct PackBuilder<'a> {
    normalizer: &'a Normalizer,
    uploader: &'a dyn Uploader,
}

impl<'a> PackBuilder<'a> {
    pub fn new(normalizer: &'a Normalizer, uploader: &'a dyn Uploader) -> Self {
        Self {
            normalizer,
            uploader,
        }
    }

    /// Start a pass against the manifest at `path`
    pub async fn begin(
        &self,
        path: impl Into<PathBuf>,
        defaults: PackDefaults,
    ) -> Result<BuildSession<'a>, BuildError> {
        let path = path.into();
        let previous = load_manifest(&path).await?;

        let (cache, mut manifest) = match previous {
            Some(previous) => {
                let cache = ManifestCache::from_manifest(&previous);
                debug!(path = %path.display(), cached = cache.len(), "Loaded previous manifest");
                let mut manifest = Manifest::new(previous.title, previous.id);
                manifest.extra = previous.extra;
                (cache, manifest)
            }
            None => (
                ManifestCache::default(),
                Manifest::new(defaults.title, defaults.id),
            ),
        };
        manifest.extra.extend(defaults.extensions);

        Ok(BuildSession {
            builder: *self,
            path,
            cache,
            manifest,
            reused: 0,
            uploaded: 0,
        })
    }

    /// Run a whole pass over `items` and commit
    #[instrument(skip(self, defaults, items), fields(path = %path.as_ref().display()))]
    pub async fn build<P, I>(&self, path: P, defaults: PackDefaults, items: I) -> Result<BuildReport, BuildError>
    where
        P: AsRef<Path>,
        I: IntoIterator<Item = SourceItem>,
    {
        let mut session = self.begin(path.as_ref(), defaults).await?;
        for item in items {
            session.push(item).await?;
        }
        session.commit().await
    }
}

/// One in-progress build pass
pub struct BuildSession<'a> {
    builder: PackBuilder<'a>,
    path: PathBuf,
    cache: ManifestCache,
    manifest: Manifest,
    reused: usize,
    uploaded: usize,
}

impl BuildSession<'_> {
    /// Manifest built so far
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Whether `identity` was uploaded by a previous build and will be reused
    pub fn is_cached(&self, identity: &Identity) -> bool {
        self.cache.contains(identity)
    }

    /// Append the record for `item`, uploading only if it is new
    #[instrument(skip(self, item), fields(file = %item.filename))]
    pub async fn push(&mut self, item: SourceItem) -> Result<(), BuildError> {
        let identity = item.identity();
        let body = item.body();

        let record = match self.cache.get(&identity) {
            Some(cached) => {
                debug!(%identity, "Reusing uploaded sticker");
                self.reused += 1;
                cached
                    .clone()
                    .with_body(body)
                    .with_annotations(item.hints.annotations)
            }
            None => {
                let media = self
                    .builder
                    .normalizer
                    .normalize_or_capture(&item.data, Some(&item.filename))
                    .await
                    .map_err(|failure| BuildError::Normalize {
                        filename: item.filename.clone(),
                        identity: identity.clone(),
                        failure,
                    })?;

                let size = media.size();
                let filename = upload_filename(&item.filename, &media.mimetype);
                let url = self
                    .builder
                    .uploader
                    .upload(media.data, &media.mimetype, &filename)
                    .await?;
                info!(%identity, %url, "Uploaded sticker");
                self.uploaded += 1;

                let info = MediaInfo::new(&url, media.width, media.height, size, media.mimetype);
                StickerRecord::new(identity, body, url, info).with_annotations(item.hints.annotations)
            }
        };

        self.manifest.stickers.push(record);
        Ok(())
    }

    /// Write the manifest, atomically replacing the previous one
    pub async fn commit(self) -> Result<BuildReport, BuildError> {
        let content = serde_json::to_vec(&self.manifest)?;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || write_atomic(&path, &content))
            .await
            .map_err(|e| BuildError::WriteManifest {
                path: self.path.clone(),
                source: std::io::Error::new(std::io::ErrorKind::Other, e),
            })??;

        info!(
            path = %self.path.display(),
            stickers = self.manifest.len(),
            reused = self.reused,
            uploaded = self.uploaded,
            "Wrote manifest"
        );

        Ok(BuildReport {
            manifest_path: self.path,
            manifest: self.manifest,
            reused: self.reused,
            uploaded: self.uploaded,
        })
    }
}

/// Source filename with the extension of the normalized format
fn upload_filename(source: &str, mimetype: &str) -> String {
    let stem = Path::new(source)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("sticker");
    format!("{}.{}", stem, extension_for(mimetype))
}

/// Write to a sibling temp file, then rename over `path`
fn write_atomic(path: &Path, content: &[u8]) -> Result<(), BuildError> {
    let write_err = |source| BuildError::WriteManifest {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(content).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}
