use super::store::{BlobPermissions, BlobStore};
use crate::connection::StorageAccount;
use crate::core::{Result, StoreError};
use chrono::Duration;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Container names are 3 to 63 lowercase letters, digits and single hyphens,
/// starting with a letter or digit.
pub fn validate_container_name(name: &str) -> Result<()> {
    let valid_chars = name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');

    if !(3..=63).contains(&name.len())
        || !valid_chars
        || name.starts_with('-')
        || name.ends_with('-')
        || name.contains("--")
    {
        return Err(StoreError::ConfigurationError(format!(
            "Invalid container name '{}'",
            name
        )));
    }
    Ok(())
}

/// Live reference to a container known to exist.
#[derive(Clone)]
pub struct BlobContainer {
    name: Arc<str>,
    store: Arc<dyn BlobStore>,
}

impl std::fmt::Debug for BlobContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobContainer").field("name", &self.name).finish()
    }
}

impl BlobContainer {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn upload(&self, blob: &str, data: Vec<u8>) -> Result<()> {
        tracing::debug!(container = %self.name, blob = %blob, bytes = data.len(), "uploading blob");
        self.store
            .upload_blob(&self.name, blob, data, content_type_for(blob))
            .await
    }

    pub async fn download(&self, blob: &str) -> Result<Option<Vec<u8>>> {
        tracing::debug!(container = %self.name, blob = %blob, "downloading blob");
        self.store.download_blob(&self.name, blob).await
    }

    pub async fn exists(&self, blob: &str) -> Result<bool> {
        tracing::debug!(container = %self.name, blob = %blob, "checking blob");
        self.store.blob_exists(&self.name, blob).await
    }

    pub async fn delete(&self, blob: &str) -> Result<bool> {
        tracing::debug!(container = %self.name, blob = %blob, "deleting blob");
        self.store.delete_blob(&self.name, blob).await
    }

    pub async fn signed_url_suffix(
        &self,
        blob: &str,
        validity: Duration,
        permissions: BlobPermissions,
    ) -> Result<String> {
        self.store
            .issue_signed_url(&self.name, blob, validity, permissions)
            .await
    }
}

/// Resolves container names to handles, creating missing containers on first use.
pub struct ContainerCache {
    store: Arc<dyn BlobStore>,
    account: StorageAccount,
    containers: RwLock<HashMap<String, BlobContainer>>,
}

impl ContainerCache {
    pub fn new(store: Arc<dyn BlobStore>, account: StorageAccount) -> Self {
        Self {
            store,
            account,
            containers: RwLock::new(HashMap::new()),
        }
    }

    pub fn account(&self) -> &StorageAccount {
        &self.account
    }

    pub async fn get_container(&self, name: &str) -> Result<BlobContainer> {
        if let Some(container) = self.containers.read().await.get(name) {
            return Ok(container.clone());
        }

        validate_container_name(name)?;
        if self.store.create_container_if_absent(name).await? {
            tracing::info!(container = %name, "created blob container");
        }

        let container = BlobContainer {
            name: Arc::from(name),
            store: Arc::clone(&self.store),
        };
        self.containers
            .write()
            .await
            .insert(name.to_string(), container.clone());
        Ok(container)
    }

    /// Public address of a blob. Development storage is addressed over plain
    /// HTTP on the emulator port; cloud addresses are scheme-relative.
    pub fn file_url(&self, container: &str, blob: &str) -> String {
        format!("{}/{}/{}", self.account.blob_endpoint(), container, blob)
    }
}

fn content_type_for(blob: &str) -> &'static str {
    let extension = blob
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "txt" => "text/plain",
        "htm" | "html" => "text/html",
        "css" => "text/css",
        "csv" => "text/csv",
        "json" => "application/json",
        "xml" => "application/xml",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "mp4" => "video/mp4",
        _ => "application/octet-stream",
    }
}
