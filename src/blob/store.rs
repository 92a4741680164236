use crate::core::{Result, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use std::collections::HashMap;
use std::fmt;
use tokio::sync::RwLock;

/// Access granted by a signed URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlobPermissions {
    pub read: bool,
    pub write: bool,
    pub delete: bool,
    pub list: bool,
}

impl BlobPermissions {
    pub const READ: Self = Self {
        read: true,
        write: false,
        delete: false,
        list: false,
    };

    pub const READ_WRITE: Self = Self {
        read: true,
        write: true,
        delete: false,
        list: false,
    };

    pub fn is_empty(&self) -> bool {
        !(self.read || self.write || self.delete || self.list)
    }
}

impl fmt::Display for BlobPermissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flags = [(self.read, 'r'), (self.write, 'w'), (self.delete, 'd'), (self.list, 'l')];
        for (granted, flag) in flags {
            if granted {
                write!(f, "{}", flag)?;
            }
        }
        Ok(())
    }
}

/// Blob service primitives.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Returns `true` if the container was created by this call.
    async fn create_container_if_absent(&self, container: &str) -> Result<bool>;

    /// Writes the blob, overwriting any existing content.
    async fn upload_blob(&self, container: &str, name: &str, data: Vec<u8>, content_type: &str) -> Result<()>;

    async fn download_blob(&self, container: &str, name: &str) -> Result<Option<Vec<u8>>>;

    /// Deletes the blob if present; returns whether it existed.
    async fn delete_blob(&self, container: &str, name: &str) -> Result<bool>;

    async fn blob_exists(&self, container: &str, name: &str) -> Result<bool>;

    /// Query-string suffix granting `permissions` on one blob for `validity`.
    async fn issue_signed_url(
        &self,
        container: &str,
        name: &str,
        validity: Duration,
        permissions: BlobPermissions,
    ) -> Result<String>;
}

#[derive(Debug, Clone)]
struct StoredBlob {
    data: Vec<u8>,
    content_type: String,
    last_modified: DateTime<Utc>,
}

/// Development blob store held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryBlobStore {
    containers: RwLock<HashMap<String, HashMap<String, StoredBlob>>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn content_type(&self, container: &str, name: &str) -> Option<String> {
        let containers = self.containers.read().await;
        containers
            .get(container)?
            .get(name)
            .map(|blob| blob.content_type.clone())
    }

    pub async fn last_modified(&self, container: &str, name: &str) -> Option<DateTime<Utc>> {
        let containers = self.containers.read().await;
        containers.get(container)?.get(name).map(|blob| blob.last_modified)
    }

    pub async fn blob_count(&self, container: &str) -> usize {
        self.containers
            .read()
            .await
            .get(container)
            .map_or(0, HashMap::len)
    }
}

fn missing_container(container: &str) -> StoreError {
    StoreError::NotFound(format!("Container '{}' not found", container))
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn create_container_if_absent(&self, container: &str) -> Result<bool> {
        let mut containers = self.containers.write().await;
        if containers.contains_key(container) {
            return Ok(false);
        }
        containers.insert(container.to_string(), HashMap::new());
        Ok(true)
    }

    async fn upload_blob(&self, container: &str, name: &str, data: Vec<u8>, content_type: &str) -> Result<()> {
        let mut containers = self.containers.write().await;
        let blobs = containers
            .get_mut(container)
            .ok_or_else(|| missing_container(container))?;
        blobs.insert(
            name.to_string(),
            StoredBlob {
                data,
                content_type: content_type.to_string(),
                last_modified: Utc::now(),
            },
        );
        Ok(())
    }

    async fn download_blob(&self, container: &str, name: &str) -> Result<Option<Vec<u8>>> {
        let containers = self.containers.read().await;
        let blobs = containers
            .get(container)
            .ok_or_else(|| missing_container(container))?;
        Ok(blobs.get(name).map(|blob| blob.data.clone()))
    }

    async fn delete_blob(&self, container: &str, name: &str) -> Result<bool> {
        let mut containers = self.containers.write().await;
        let blobs = containers
            .get_mut(container)
            .ok_or_else(|| missing_container(container))?;
        Ok(blobs.remove(name).is_some())
    }

    async fn blob_exists(&self, container: &str, name: &str) -> Result<bool> {
        let containers = self.containers.read().await;
        Ok(containers
            .get(container)
            .is_some_and(|blobs| blobs.contains_key(name)))
    }

    async fn issue_signed_url(
        &self,
        container: &str,
        name: &str,
        validity: Duration,
        permissions: BlobPermissions,
    ) -> Result<String> {
        if permissions.is_empty() {
            return Err(StoreError::ConfigurationError(
                "Signed URL needs at least one permission".to_string(),
            ));
        }
        if !self.containers.read().await.contains_key(container) {
            return Err(missing_container(container));
        }

        let expiry = Utc::now() + validity;
        tracing::debug!(container = %container, blob = %name, %permissions, "issued signed url");
        Ok(format!(
            "?sp={}&se={}&sr=b&sig={}",
            permissions,
            expiry.to_rfc3339_opts(SecondsFormat::Secs, true),
            uuid::Uuid::new_v4().simple()
        ))
    }
}
