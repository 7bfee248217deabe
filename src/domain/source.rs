//! Source items produced by enumerating a local directory or a remote catalog.

use super::identity::Identity;
use super::sticker::Annotations;

/// Where a source item came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// A file on disk; identity is the content hash
    Local,

    /// A provider catalog item; identity is the provider id
    Remote { provider: String, item_id: String },
}

/// Label and annotation hints that refresh on every build
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hints {
    /// Explicit display text
    pub label: Option<String>,

    /// Associated emoji, in provider order
    pub emoticons: Vec<String>,

    /// Namespaced provider annotations
    pub annotations: Annotations,
}

/// A single raw media item
#[derive(Debug, Clone)]
pub struct SourceItem {
    /// Unmodified bytes
    pub data: Vec<u8>,

    /// Filename used for sniffing fallback and the upload
    pub filename: String,

    pub origin: Origin,

    pub hints: Hints,
}

impl SourceItem {
    /// Create a local item labelled `label`
    pub fn local(filename: impl Into<String>, data: Vec<u8>, label: impl Into<String>) -> Self {
        Self {
            data,
            filename: filename.into(),
            origin: Origin::Local,
            hints: Hints {
                label: Some(label.into()),
                ..Default::default()
            },
        }
    }

    /// Create a remote catalog item
    pub fn remote(
        provider: impl Into<String>,
        item_id: impl Into<String>,
        filename: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            data,
            filename: filename.into(),
            origin: Origin::Remote {
                provider: provider.into(),
                item_id: item_id.into(),
            },
            hints: Hints::default(),
        }
    }

    /// Attach hints
    pub fn with_hints(mut self, hints: Hints) -> Self {
        self.hints = hints;
        self
    }

    /// Resolve the dedup key
    pub fn identity(&self) -> Identity {
        match &self.origin {
            Origin::Local => Identity::from_content(&self.data),
            Origin::Remote { provider, item_id } => Identity::from_provider(provider, item_id),
        }
    }

    /// Display text: explicit label, else the first emoticon, else empty
    pub fn body(&self) -> String {
        self.hints
            .label
            .clone()
            .filter(|label| !label.is_empty())
            .or_else(|| self.hints.emoticons.first().cloned())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_identity_ignores_filename() {
        let a = SourceItem::local("01-cat.png", b"same".to_vec(), "cat");
        let b = SourceItem::local("kitty.png", b"same".to_vec(), "kitty");
        assert_eq!(a.identity(), b.identity());
    }

    #[test]
    fn test_remote_identity_uses_provider_id() {
        let a = SourceItem::remote("tg", "42", "42.webp", b"one".to_vec());
        let b = SourceItem::remote("tg", "42", "42.webp", b"two".to_vec());
        assert_eq!(a.identity(), b.identity());
        assert_eq!(a.identity().as_str(), "tg-42");
    }

    #[test]
    fn test_body_falls_back_to_first_emoticon() {
        let item = SourceItem::remote("tg", "1", "1.webp", Vec::new()).with_hints(Hints {
            label: Some(String::new()),
            emoticons: vec!["😺".to_string(), "🐱".to_string()],
            ..Default::default()
        });
        assert_eq!(item.body(), "😺");

        let bare = SourceItem::remote("tg", "2", "2.webp", Vec::new());
        assert_eq!(bare.body(), "");
    }
}
