// SPDX-License-Identifier: PMPL-1.0-or-later
//! Object storage for CVs and article images.
//!
//! Objects live at `{bucket}/{folder}/{uuid}.{ext}` and are served from the
//! bucket's public prefix. Deleting a URL outside that prefix is a no-op, so
//! callers can pass whatever URL an article happens to carry.

use crate::client::BackendClient;
use crate::error::GatewayError;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Upload limit used by the public forms (10 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// True if a file of `size` bytes fits within `limit`.
pub fn validate_file_size(size: u64, limit: u64) -> bool {
    size <= limit
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("File is {size} bytes, limit is {limit}")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("File is empty")]
    EmptyFile,

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl From<reqwest::Error> for StorageError {
    fn from(err: reqwest::Error) -> Self {
        Self::Gateway(GatewayError::Http(err))
    }
}

/// Folder inside the bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageFolder {
    Cv,
    News,
    Projects,
    Services,
}

impl StorageFolder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cv => "cv",
            Self::News => "news",
            Self::Projects => "projects",
            Self::Services => "services",
        }
    }
}

/// File received from a form or the admin editor
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Lower-case extension of the original name, `bin` if there is none.
    pub fn extension(&self) -> String {
        std::path::Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| {
                e.chars()
                    .filter(|c| c.is_ascii_alphanumeric())
                    .collect::<String>()
                    .to_ascii_lowercase()
            })
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| "bin".to_string())
    }
}

pub struct ObjectStorage {
    client: BackendClient,
    max_bytes: u64,
}

impl ObjectStorage {
    pub fn new(client: BackendClient) -> Self {
        Self {
            client,
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    fn bucket(&self) -> &str {
        &self.client.config().bucket
    }

    /// Prefix shared by every public object URL in the bucket.
    pub fn public_prefix(&self) -> Result<String, StorageError> {
        Ok(format!(
            "{}/storage/v1/object/public/{}/",
            self.client.base_url()?,
            self.bucket()
        ))
    }

    /// Upload a file and return its public URL.
    pub async fn upload(&self, file: &UploadFile, folder: StorageFolder) -> Result<String, StorageError> {
        if file.bytes.is_empty() {
            return Err(StorageError::EmptyFile);
        }
        if !validate_file_size(file.size(), self.max_bytes) {
            return Err(StorageError::FileTooLarge {
                size: file.size(),
                limit: self.max_bytes,
            });
        }

        let path = format!("{}/{}.{}", folder.as_str(), Uuid::new_v4(), file.extension());
        let url = format!(
            "{}/storage/v1/object/{}/{}",
            self.client.base_url()?,
            self.bucket(),
            path
        );

        debug!(%path, size = file.size(), "Uploading object");
        let request = self.client.authorize(
            self.client
                .http()
                .post(&url)
                .header(reqwest::header::CONTENT_TYPE, &file.content_type)
                .header("x-upsert", "false")
                .body(file.bytes.clone()),
        )?;
        BackendClient::check(request.send().await?).await?;

        let public_url = format!("{}{}", self.public_prefix()?, path);
        info!(%public_url, "Object uploaded");
        Ok(public_url)
    }

    /// Best-effort removal of a previously returned public URL.
    pub async fn delete(&self, public_url: &str) -> Result<(), StorageError> {
        let prefix = self.public_prefix()?;
        let Some(path) = public_url.strip_prefix(&prefix) else {
            debug!(%public_url, "URL outside storage bucket, nothing to delete");
            return Ok(());
        };
        let path = urlencoding::decode(path)
            .map(|p| p.into_owned())
            .unwrap_or_else(|_| path.to_string());

        let url = format!(
            "{}/storage/v1/object/{}",
            self.client.base_url()?,
            self.bucket()
        );
        let request = self.client.authorize(
            self.client
                .http()
                .delete(&url)
                .json(&serde_json::json!({ "prefixes": [path] })),
        )?;

        match BackendClient::check(request.send().await?).await {
            Ok(_) => {
                info!(%path, "Object deleted");
                Ok(())
            }
            Err(e) => {
                warn!(%path, error = %e, "Object delete failed");
                Err(e.into())
            }
        }
    }
}
