//! Import of integration-manager (Scalar) sticker asset dumps.
//!
//! The stickers in a dump are already uploaded, so no media is touched: each
//! asset with images becomes a manifest, and all manifests are added to the
//! index in a single write.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{info, warn};

use crate::core::{add_all_to_index, IndexError};
use crate::domain::{Manifest, StickerRecord};

/// Errors from importing a dump
#[derive(Debug, Error)]
pub enum ScalarError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse asset dump: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Sticker in asset {asset} has no content URL")]
    MissingUrl { asset: String },

    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Index(#[from] IndexError),
}

#[derive(Debug, Deserialize)]
struct AssetDump {
    assets: Vec<Asset>,
}

#[derive(Debug, Deserialize)]
struct Asset {
    name: String,
    asset_id: Value,
    #[serde(default)]
    data: AssetData,
}

#[derive(Debug, Default, Deserialize)]
struct AssetData {
    images: Option<Vec<AssetImage>>,
}

#[derive(Debug, Deserialize)]
struct AssetImage {
    content: Map<String, Value>,
}

/// Result of an import
#[derive(Debug, Clone, Default)]
pub struct ScalarImport {
    /// Manifest files written
    pub written: Vec<PathBuf>,
    /// Titles of assets without images
    pub skipped: Vec<String>,
    /// Whether `index.json` was rewritten
    pub index_updated: bool,
}

/// Python-style title case: first letter of each alphabetic run upper, rest lower
pub fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_word = false;
    for c in name.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

fn asset_id(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Manifest filename for an asset name
pub fn manifest_filename(asset_name: &str) -> String {
    format!("scalar-{}.json", asset_name.replace(' ', "_"))
}

fn convert_asset(asset: Asset) -> Result<Option<(String, Manifest)>, ScalarError> {
    let title = title_case(&asset.name);
    let Some(images) = asset.data.images else {
        return Ok(None);
    };

    let mut manifest = Manifest::new(title, format!("scalar-{}", asset_id(&asset.asset_id)));
    for image in images {
        let mut content = image.content;
        let id = content
            .get("url")
            .and_then(Value::as_str)
            .and_then(|url| url.rsplit('/').next())
            .ok_or_else(|| ScalarError::MissingUrl {
                asset: asset.name.clone(),
            })?
            .to_string();
        content.insert("id".to_string(), Value::String(id));

        let record: StickerRecord = serde_json::from_value(Value::Object(content))?;
        manifest.stickers.push(record);
    }

    Ok(Some((manifest_filename(&asset.name), manifest)))
}

/// Convert the dump at `dump_path` into manifests under `output_dir`
pub async fn import_scalar(
    dump_path: &Path,
    output_dir: &Path,
    homeserver_url: Option<&str>,
) -> Result<ScalarImport, ScalarError> {
    let content = tokio::fs::read(dump_path)
        .await
        .map_err(|source| ScalarError::Read {
            path: dump_path.to_path_buf(),
            source,
        })?;
    let dump: AssetDump = serde_json::from_slice(&content)?;

    let mut result = ScalarImport::default();
    let mut names = Vec::new();

    for asset in dump.assets {
        let title = title_case(&asset.name);
        let Some((filename, manifest)) = convert_asset(asset)? else {
            warn!(%title, "Skipping asset without images");
            result.skipped.push(title);
            continue;
        };

        let path = output_dir.join(&filename);
        let json = serde_json::to_vec(&manifest)?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|source| ScalarError::Write {
                path: path.clone(),
                source,
            })?;
        info!(%title, path = %path.display(), stickers = manifest.len(), "Wrote pack");

        result.written.push(path);
        names.push(filename);
    }

    result.index_updated = add_all_to_index(output_dir, names, homeserver_url)?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{PackIndex, INDEX_FILENAME};
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("cute cats"), "Cute Cats");
        assert_eq!(title_case("LOUD dogs"), "Loud Dogs");
        assert_eq!(title_case("r2d2 pack"), "R2D2 Pack");
    }

    #[test]
    fn test_manifest_filename() {
        assert_eq!(manifest_filename("cute cats"), "scalar-cute_cats.json");
    }

    #[tokio::test]
    async fn test_import_dump() {
        let dir = TempDir::new().unwrap();
        let dump = json!({
            "assets": [
                {
                    "name": "cute cats",
                    "asset_id": 12,
                    "data": {"images": [{"content": {
                        "body": "meow",
                        "url": "mxc://example.org/AbCd",
                        "info": {"w": 256, "h": 256, "size": 100, "mimetype": "image/png"},
                        "msgtype": "m.sticker"
                    }}]}
                },
                {"name": "empty", "asset_id": "e1", "data": {}}
            ]
        });
        let dump_path = dir.path().join("dump.json");
        std::fs::write(&dump_path, serde_json::to_vec(&dump).unwrap()).unwrap();

        let result = import_scalar(&dump_path, dir.path(), None).await.unwrap();
        assert_eq!(result.skipped, vec!["Empty"]);
        assert!(result.index_updated);

        let manifest: Manifest = serde_json::from_slice(
            &std::fs::read(dir.path().join("scalar-cute_cats.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(manifest.title, "Cute Cats");
        assert_eq!(manifest.id, "scalar-12");
        assert_eq!(manifest.stickers[0].id.as_str(), "AbCd");
        assert_eq!(manifest.stickers[0].body, "meow");

        let index = PackIndex::load(&dir.path().join(INDEX_FILENAME));
        assert_eq!(index.packs, vec!["scalar-cute_cats.json"]);

        // A second import changes nothing in the index
        let again = import_scalar(&dump_path, dir.path(), None).await.unwrap();
        assert!(!again.index_updated);
    }
}
