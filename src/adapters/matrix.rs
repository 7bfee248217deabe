//! Matrix content repository uploader.
//!
//! Posts raw bytes to the homeserver's media upload endpoint and returns the
//! `mxc://` content URI.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use super::Uploader;
use crate::config::MatrixSettings;

/// Errors from the upload collaborator
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Upload request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Homeserver rejected upload ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Upload response did not contain a content_uri")]
    MissingContentUri,
}

/// Response from the media upload endpoint
#[derive(Debug, Deserialize)]
struct UploadResponse {
    content_uri: Option<String>,
}

/// Uploads media to a Matrix homeserver
pub struct MatrixUploader {
    /// Homeserver base URL, without trailing slash
    homeserver_url: String,
    access_token: String,
    client: reqwest::Client,
}

impl MatrixUploader {
    /// Create an uploader for the given credentials
    pub fn new(settings: &MatrixSettings, timeout: Duration) -> Result<Self, UploadError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            homeserver_url: settings.homeserver_url.trim_end_matches('/').to_string(),
            access_token: settings.access_token.clone(),
            client,
        })
    }

    /// Build the upload URL
    fn upload_url(&self) -> String {
        format!("{}/_matrix/media/v3/upload", self.homeserver_url)
    }
}

#[async_trait]
impl Uploader for MatrixUploader {
    async fn upload(&self, data: Vec<u8>, mimetype: &str, filename: &str) -> Result<String, UploadError> {
        debug!(filename, mimetype, size = data.len(), "Uploading media");

        let response = self
            .client
            .post(self.upload_url())
            .query(&[("filename", filename)])
            .bearer_auth(&self.access_token)
            .header(reqwest::header::CONTENT_TYPE, mimetype)
            .body(data)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UploadError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let result: UploadResponse = response.json().await?;
        result.content_uri.ok_or(UploadError::MissingContentUri)
    }
}
