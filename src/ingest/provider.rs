//! Import of remote provider sticker packs.
//!
//! A pack listing from a [`StickerCatalog`] becomes remote [`SourceItem`]s
//! keyed by provider id. Stickers already in the previous manifest are not
//! downloaded again; everything else goes through the normal build pass.
//! The manifest lands in `<output dir>/<short name>.json` and is added to the
//! index.

use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::adapters::{CatalogError, StickerCatalog};
use crate::core::{add_to_index, BuildError, BuildReport, IndexError, PackBuilder, PackDefaults};
use crate::domain::{Annotations, CatalogPack, CatalogSticker, Hints, Identity, SourceItem};

/// Per-sticker provider annotation key
pub const STICKER_ANNOTATION: &str = "net.maunium.telegram.sticker";

/// Pack-level provider annotation key
pub const PACK_ANNOTATION: &str = "net.maunium.telegram.pack";

const LINK_HOSTS: &[&str] = &["t.me", "t.dog", "telegram.me", "telegram.dog"];

/// Errors from importing a provider pack
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("'{0}' doesn't look like a sticker pack URL")]
    InvalidReference(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Index(#[from] IndexError),
}

/// Outcome of importing one pack
#[derive(Debug, Clone)]
pub struct ProviderImport {
    pub title: String,
    pub short_name: String,
    pub report: BuildReport,
    /// Stickers fetched from the provider in this run
    pub downloaded: usize,
    /// Whether `index.json` was rewritten
    pub index_updated: bool,
}

/// Short name from a pack link (`https://t.me/addstickers/<name>`), a
/// manifest filename (`<name>.json`) or a bare short name
pub fn parse_pack_reference(input: &str) -> Option<String> {
    let mut rest = input;
    for scheme in ["https://", "http://", ""] {
        let stripped = LINK_HOSTS.iter().find_map(|host| {
            rest.strip_prefix(scheme)?
                .strip_prefix(host)?
                .strip_prefix("/addstickers/")
        });
        if let Some(stripped) = stripped {
            rest = stripped;
            break;
        }
    }

    let name = rest.strip_suffix(".json").unwrap_or(rest);
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    valid.then(|| name.to_string())
}

/// Manifest filename of a provider pack
pub fn manifest_filename(pack: &CatalogPack) -> String {
    format!("{}.json", pack.short_name)
}

/// Title, id and pack-level annotation of a new provider pack
pub fn pack_defaults(provider: &str, pack: &CatalogPack) -> PackDefaults {
    let mut annotation = json!({ "short_name": pack.short_name });
    if let Some(hash) = &pack.hash {
        annotation["hash"] = Value::String(hash.clone());
    }

    PackDefaults::new(pack.title.clone(), Identity::from_provider(provider, &pack.id).to_string())
        .with_extension(PACK_ANNOTATION, annotation)
}

/// Label, emoticons and annotations of one sticker
pub fn sticker_hints(pack: &CatalogPack, sticker: &CatalogSticker, emoticons: Vec<String>) -> Hints {
    let mut annotations = Annotations::new();
    annotations.insert(
        STICKER_ANNOTATION.to_string(),
        json!({
            "pack": {
                "id": pack.id,
                "short_name": pack.short_name,
            },
            "id": sticker.id,
            "emoticons": emoticons,
        }),
    );

    Hints {
        label: Some(sticker.alt.clone()),
        emoticons,
        annotations,
    }
}

/// Import the pack named by `reference` into `output_dir`
#[instrument(skip(catalog, builder), fields(provider = catalog.provider()))]
pub async fn import_pack(
    catalog: &dyn StickerCatalog,
    builder: &PackBuilder<'_>,
    reference: &str,
    output_dir: &Path,
    homeserver_url: Option<&str>,
) -> Result<ProviderImport, ProviderError> {
    let short_name = parse_pack_reference(reference)
        .ok_or_else(|| ProviderError::InvalidReference(reference.to_string()))?;

    let pack = catalog.fetch_pack(&short_name).await?;
    let provider = catalog.provider();
    let filename = manifest_filename(&pack);
    let path: PathBuf = output_dir.join(&filename);
    info!(
        title = %pack.title,
        stickers = pack.stickers.len(),
        path = %path.display(),
        "Importing pack"
    );

    let mut emoticons = pack.emoticons();
    let mut session = builder.begin(&path, pack_defaults(provider, &pack)).await?;
    let mut downloaded = 0;

    for sticker in &pack.stickers {
        let identity = Identity::from_provider(provider, &sticker.id);
        let data = if session.is_cached(&identity) {
            debug!(%identity, "Already uploaded, skipping download");
            Vec::new()
        } else {
            downloaded += 1;
            catalog.download(sticker).await?
        };

        let hints = sticker_hints(&pack, sticker, emoticons.remove(sticker.id.as_str()).unwrap_or_default());
        let item = SourceItem::remote(provider, &sticker.id, sticker.filename(), data).with_hints(hints);
        session.push(item).await?;
    }

    let report = session.commit().await?;
    let index_updated = add_to_index(output_dir, &filename, homeserver_url)?;

    Ok(ProviderImport {
        title: pack.title,
        short_name: pack.short_name,
        report,
        downloaded,
        index_updated,
    })
}
