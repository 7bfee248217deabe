//! Telegram Bot API sticker catalog.
//!
//! Fetches sticker sets with `getStickerSet` and downloads media through
//! `getFile` and the file endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use super::StickerCatalog;
use crate::domain::{CatalogPack, CatalogSticker, EmojiGroup, StickerKind};

const API_BASE: &str = "https://api.telegram.org";

/// Errors from a sticker catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Catalog API error: {0}")]
    Api(String),

    #[error("Sticker pack not found: {0}")]
    NotFound(String),
}

/// Response envelope of the Bot API
#[derive(Debug, Deserialize)]
struct TelegramResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StickerSet {
    name: String,
    title: String,
    stickers: Vec<Sticker>,
}

#[derive(Debug, Deserialize)]
struct Sticker {
    file_id: String,
    file_unique_id: String,
    #[serde(default)]
    emoji: Option<String>,
    #[serde(default)]
    is_animated: bool,
    #[serde(default)]
    is_video: bool,
}

#[derive(Debug, Deserialize)]
struct FileResult {
    file_path: Option<String>,
}

/// Sticker catalog backed by a Telegram bot
pub struct TelegramCatalog {
    bot_token: String,
    client: reqwest::Client,
}

impl TelegramCatalog {
    pub fn new(bot_token: impl Into<String>, timeout: Duration) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            bot_token: bot_token.into(),
            client,
        })
    }

    /// Build API URL
    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", API_BASE, self.bot_token, method)
    }

    fn file_url(&self, file_path: &str) -> String {
        format!("{}/file/bot{}/{}", API_BASE, self.bot_token, file_path)
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        query: &[(&str, &str)],
    ) -> Result<T, CatalogError> {
        let response: TelegramResponse<T> = self
            .client
            .get(self.api_url(method))
            .query(query)
            .send()
            .await?
            .json()
            .await?;
        into_result(response)
    }
}

fn into_result<T>(response: TelegramResponse<T>) -> Result<T, CatalogError> {
    match response {
        TelegramResponse {
            ok: true,
            result: Some(result),
            ..
        } => Ok(result),
        TelegramResponse { description, .. } => {
            Err(CatalogError::Api(description.unwrap_or_default()))
        }
    }
}

/// Project a Bot API sticker set onto the provider-neutral listing.
///
/// The Bot API gives one emoji per sticker, so groups are formed by emoji in
/// order of first appearance.
fn into_catalog_pack(set: StickerSet) -> CatalogPack {
    let mut groups: Vec<EmojiGroup> = Vec::new();
    let mut stickers = Vec::with_capacity(set.stickers.len());

    for sticker in set.stickers {
        let alt = sticker.emoji.unwrap_or_default();
        if !alt.is_empty() {
            match groups.iter_mut().find(|g| g.emoticon == alt) {
                Some(group) => group.sticker_ids.push(sticker.file_unique_id.clone()),
                None => groups.push(EmojiGroup {
                    emoticon: alt.clone(),
                    sticker_ids: vec![sticker.file_unique_id.clone()],
                }),
            }
        }

        let kind = if sticker.is_animated {
            StickerKind::Vector
        } else if sticker.is_video {
            StickerKind::Video
        } else {
            StickerKind::Still
        };
        stickers.push(CatalogSticker {
            id: sticker.file_unique_id,
            alt,
            file_ref: sticker.file_id,
            kind,
        });
    }

    CatalogPack {
        id: set.name.clone(),
        short_name: set.name,
        title: set.title,
        hash: None,
        stickers,
        emoji_groups: groups,
    }
}

#[async_trait]
impl StickerCatalog for TelegramCatalog {
    fn provider(&self) -> &str {
        "tg"
    }

    async fn fetch_pack(&self, short_name: &str) -> Result<CatalogPack, CatalogError> {
        debug!(short_name, "Fetching sticker set");
        let set: StickerSet = self
            .call("getStickerSet", &[("name", short_name)])
            .await
            .map_err(|e| match e {
                CatalogError::Api(_) => CatalogError::NotFound(short_name.to_string()),
                other => other,
            })?;
        Ok(into_catalog_pack(set))
    }

    async fn download(&self, sticker: &CatalogSticker) -> Result<Vec<u8>, CatalogError> {
        let file: FileResult = self.call("getFile", &[("file_id", sticker.file_ref.as_str())]).await?;
        let file_path = file
            .file_path
            .ok_or_else(|| CatalogError::Api(format!("no file path for sticker {}", sticker.id)))?;

        let response = self.client.get(self.file_url(&file_path)).send().await?;
        let data = response.error_for_status()?.bytes().await?;
        debug!(sticker = %sticker.id, size = data.len(), "Downloaded sticker");
        Ok(data.to_vec())
    }
}
