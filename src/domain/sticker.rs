//! Sticker records as they appear in a pack manifest.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::identity::Identity;

/// Message type every sticker record carries
pub const STICKER_MSGTYPE: &str = "m.sticker";

/// Provider annotations, keyed by namespaced key (e.g. `net.maunium.telegram.sticker`)
pub type Annotations = BTreeMap<String, Value>;

/// Dimensions, size and type of uploaded media
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaInfo {
    pub w: u32,
    pub h: u32,
    pub size: u64,
    pub mimetype: String,

    /// Same URL as the sticker itself; some clients only render thumbnails
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_info: Option<ThumbnailInfo>,
}

/// Thumbnail variant of [`MediaInfo`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbnailInfo {
    pub w: u32,
    pub h: u32,
    pub size: u64,
    pub mimetype: String,
}

impl MediaInfo {
    /// Build media info with the thumbnail duplicate pointing at `url`
    pub fn new(url: &str, w: u32, h: u32, size: u64, mimetype: impl Into<String>) -> Self {
        let mimetype = mimetype.into();
        Self {
            w,
            h,
            size,
            mimetype: mimetype.clone(),
            thumbnail_url: Some(url.to_string()),
            thumbnail_info: Some(ThumbnailInfo {
                w,
                h,
                size,
                mimetype,
            }),
        }
    }
}

/// One sticker in a manifest.
///
/// `id`, `url` and `info` are frozen once uploaded; `body` and the
/// annotation map are refreshed on every build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StickerRecord {
    pub id: Identity,

    #[serde(default)]
    pub body: String,

    pub url: String,

    #[serde(default)]
    pub info: MediaInfo,

    #[serde(default = "default_msgtype")]
    pub msgtype: String,

    #[serde(flatten)]
    pub annotations: Annotations,
}

fn default_msgtype() -> String {
    STICKER_MSGTYPE.to_string()
}

impl StickerRecord {
    /// Create a record for freshly uploaded media
    pub fn new(id: Identity, body: impl Into<String>, url: impl Into<String>, info: MediaInfo) -> Self {
        Self {
            id,
            body: body.into(),
            url: url.into(),
            info,
            msgtype: default_msgtype(),
            annotations: Annotations::new(),
        }
    }

    /// Replace the display text
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Replace the provider annotation map
    pub fn with_annotations(mut self, annotations: Annotations) -> Self {
        self.annotations = annotations;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> StickerRecord {
        let info = MediaInfo::new("mxc://example.org/abc", 256, 64, 1234, "image/gif");
        StickerRecord::new(
            Identity::from_raw("sha256:00"),
            "wave",
            "mxc://example.org/abc",
            info,
        )
    }

    #[test]
    fn test_wire_shape() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "sha256:00",
                "body": "wave",
                "url": "mxc://example.org/abc",
                "info": {
                    "w": 256,
                    "h": 64,
                    "size": 1234,
                    "mimetype": "image/gif",
                    "thumbnail_url": "mxc://example.org/abc",
                    "thumbnail_info": {"w": 256, "h": 64, "size": 1234, "mimetype": "image/gif"}
                },
                "msgtype": "m.sticker"
            })
        );
    }

    #[test]
    fn test_annotations_are_flattened() {
        let mut annotations = Annotations::new();
        annotations.insert(
            "net.maunium.telegram.sticker".to_string(),
            json!({"id": "42", "emoticons": ["👋"]}),
        );
        let record = sample().with_annotations(annotations);

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["net.maunium.telegram.sticker"]["id"], "42");

        let back: StickerRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_legacy_record_without_msgtype() {
        let record: StickerRecord = serde_json::from_value(json!({
            "id": "sha256:11",
            "body": "old",
            "url": "mxc://example.org/old",
            "info": {"w": 10, "h": 10, "size": 5, "mimetype": "image/png"}
        }))
        .unwrap();

        assert_eq!(record.msgtype, "m.sticker");
        assert!(record.annotations.is_empty());
        assert!(record.info.thumbnail_info.is_none());
    }

    #[test]
    fn test_with_body_keeps_frozen_fields() {
        let original = sample();
        let renamed = original.clone().with_body("hello");

        assert_eq!(renamed.body, "hello");
        assert_eq!(renamed.id, original.id);
        assert_eq!(renamed.url, original.url);
        assert_eq!(renamed.info, original.info);
    }
}
