//! Content-addressed upload client
//!
//! Uploads files to the HTTP storage API as one batch and derives gateway
//! URLs from the returned content identifier. The client is constructed
//! explicitly with its configuration and token; callers own the instance.

use crate::error::{Error, Result};
use miliki_common::db::settings::get_setting;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::multipart;
use reqwest::StatusCode;
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::{debug, warn};

/// Characters that must be escaped in a filename path segment
const FILENAME_ESCAPE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'?');

/// Storage API endpoints and retry budget
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub api_url: String,
    pub gateway_url: String,
    pub max_retries: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.web3.storage".to_string(),
            gateway_url: "https://gateway.storacha.network/ipfs".to_string(),
            max_retries: 3,
        }
    }
}

impl StorageConfig {
    /// Build the configuration from database settings
    pub async fn from_settings(db: &SqlitePool) -> Result<Self> {
        let defaults = Self::default();
        let api_url = get_setting::<String>(db, "storage_api_url")
            .await?
            .unwrap_or(defaults.api_url);
        let gateway_url = get_setting::<String>(db, "storage_gateway_url")
            .await?
            .unwrap_or(defaults.gateway_url);
        let max_retries = get_setting::<u32>(db, "storage_max_retries")
            .await?
            .unwrap_or(defaults.max_retries);

        Ok(Self {
            api_url,
            gateway_url,
            max_retries,
        })
    }
}

/// One file in an upload batch
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Gateway URL for one uploaded file
#[derive(Debug, Clone)]
pub struct FileUrl {
    pub filename: String,
    pub url: String,
}

/// Result of a batch upload: the content identifier plus one gateway URL
/// per file, in upload order
#[derive(Debug, Clone)]
pub struct UploadReceipt {
    pub cid: String,
    pub urls: Vec<FileUrl>,
}

#[derive(Debug, Deserialize)]
struct UploadResponseBody {
    cid: String,
}

/// Explicitly constructed storage client; no shared global instance
pub struct StorageClient {
    config: StorageConfig,
    token: String,
    client: reqwest::Client,
}

impl StorageClient {
    pub fn new(config: StorageConfig, token: String) -> Self {
        Self {
            config,
            token,
            client: reqwest::Client::new(),
        }
    }

    /// Upload a batch of files as a single directory-wrapped unit.
    ///
    /// All files in the batch share one content identifier; each file is
    /// addressable under it by filename. Transient transport failures are
    /// retried up to the configured budget; API rejections are not.
    pub async fn upload_batch(&self, files: &[UploadFile]) -> Result<UploadReceipt> {
        if files.is_empty() {
            return Err(Error::BadRequest("Nothing to upload".to_string()));
        }

        let mut attempt = 0;
        let cid = loop {
            attempt += 1;
            match self.try_upload(files).await {
                Ok(cid) => break cid,
                // Transport-level failures carry no hint; API rejections do
                // and are never retried
                Err(e @ Error::Upstream { hint: None, .. })
                    if attempt < self.config.max_retries =>
                {
                    warn!(
                        "Upload attempt {} of {} failed: {}",
                        attempt, self.config.max_retries, e
                    );
                }
                Err(e) => return Err(e),
            }
        };

        debug!("Uploaded {} file(s) under cid {}", files.len(), cid);

        let urls = files
            .iter()
            .map(|f| FileUrl {
                filename: f.name.clone(),
                url: self.file_url(&cid, &f.name),
            })
            .collect();

        Ok(UploadReceipt { cid, urls })
    }

    async fn try_upload(&self, files: &[UploadFile]) -> Result<String> {
        let mut form = multipart::Form::new();
        for file in files {
            let part = multipart::Part::bytes(file.data.clone())
                .file_name(file.name.clone())
                .mime_str(&file.content_type)
                .map_err(|e| Error::BadRequest(format!("Invalid content type: {}", e)))?;
            form = form.part("file", part);
        }

        let resp = self
            .client
            .post(format!("{}/upload", self.config.api_url))
            .bearer_auth(&self.token)
            .multipart(form)
            .send()
            .await?;

        match resp.status() {
            StatusCode::OK | StatusCode::CREATED => {}
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(Error::Upstream {
                    message: "Storage API rejected the upload token".to_string(),
                    detail: None,
                    hint: Some("Check the configured storage credential".to_string()),
                });
            }
            status => {
                let text = resp.text().await.unwrap_or_default();
                return Err(Error::Upstream {
                    message: format!("Storage upload failed with status {}", status),
                    detail: Some(text),
                    hint: Some(format!("HTTP {}", status)),
                });
            }
        }

        let body: UploadResponseBody = resp.json().await?;
        Ok(body.cid)
    }

    /// Gateway URL for a file addressed by cid and filename
    pub fn file_url(&self, cid: &str, filename: &str) -> String {
        let encoded = utf8_percent_encode(filename, FILENAME_ESCAPE);
        format!("{}/{}/{}", self.config.gateway_url, cid, encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> StorageClient {
        StorageClient::new(StorageConfig::default(), "token".to_string())
    }

    #[test]
    fn file_url_joins_gateway_cid_and_name() {
        let client = test_client();
        assert_eq!(
            client.file_url("bafy123", "song-audio.mp3"),
            "https://gateway.storacha.network/ipfs/bafy123/song-audio.mp3"
        );
    }

    #[test]
    fn file_url_escapes_spaces_and_reserved_characters() {
        let client = test_client();
        assert_eq!(
            client.file_url("bafy123", "My Song-audio.mp3"),
            "https://gateway.storacha.network/ipfs/bafy123/My%20Song-audio.mp3"
        );
        assert_eq!(
            client.file_url("bafy123", "a#b?c.mp3"),
            "https://gateway.storacha.network/ipfs/bafy123/a%23b%3Fc.mp3"
        );
    }

    #[tokio::test]
    async fn empty_batch_is_rejected_without_network() {
        let client = test_client();
        let err = client.upload_batch(&[]).await.unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
    }

    #[test]
    fn upload_response_parses_cid() {
        let body: UploadResponseBody =
            serde_json::from_str(r#"{"cid":"bafybeigdyr"}"#).unwrap();
        assert_eq!(body.cid, "bafybeigdyr");
    }
}
