use super::container::ContainerCache;
use super::store::{BlobPermissions, BlobStore};
use crate::connection::StorageAccount;
use crate::core::{EntityMeta, Properties, Result, StoreError};
use crate::entity::{FieldRule, MergeAnnotation, PersistentFields, TableEntity};
use chrono::Duration;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};

pub const NAME: &str = "Name";
pub const URL: &str = "Url";
pub const CONTAINER_NAME: &str = "ContainerName";
pub const FILE_NAME: &str = "FileName";

static STORAGE_FILE_RULES: [FieldRule; 4] = [
    FieldRule::new(CONTAINER_NAME, MergeAnnotation::new().allow_update(false)),
    PersistentFields::UPDATED_RULE,
    PersistentFields::CREATED_RULE,
    PersistentFields::UNIVERSAL_ID_RULE,
];

/// Descriptor of a file kept in blob storage.
///
/// The descriptor itself can be stored as a table entity; its container is
/// fixed once created.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StorageFile {
    pub meta: EntityMeta,
    pub name: Option<String>,
    pub url: Option<String>,
    pub container_name: String,
    pub file_name: String,
    pub persistent: PersistentFields,
}

impl StorageFile {
    pub fn new(container_name: &str, file_name: &str) -> Self {
        Self {
            container_name: container_name.to_string(),
            file_name: file_name.to_string(),
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<()> {
        if self.file_name.is_empty() || self.file_name.len() > 1024 {
            return Err(StoreError::ConfigurationError(format!(
                "Invalid file name '{}'",
                self.file_name
            )));
        }
        Ok(())
    }
}

impl TableEntity for StorageFile {
    fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut EntityMeta {
        &mut self.meta
    }

    fn merge_rules() -> &'static [FieldRule] {
        &STORAGE_FILE_RULES
    }

    fn to_properties(&self) -> Properties {
        let mut properties = Properties::new();
        properties.set_optional(NAME, self.name.clone());
        properties.set_optional(URL, self.url.clone());
        properties.insert(CONTAINER_NAME, self.container_name.as_str());
        properties.insert(FILE_NAME, self.file_name.as_str());
        self.persistent.write_into(&mut properties);
        properties
    }

    fn from_properties(meta: EntityMeta, properties: Properties) -> Result<Self> {
        Ok(Self {
            meta,
            name: properties.get_as(NAME)?,
            url: properties.get_as(URL)?,
            container_name: properties.get_as(CONTAINER_NAME)?.unwrap_or_default(),
            file_name: properties.get_as(FILE_NAME)?.unwrap_or_default(),
            persistent: PersistentFields::read_from(&properties)?,
        })
    }
}

/// Upload, download and addressing of `StorageFile` content.
pub struct FileService {
    containers: ContainerCache,
}

impl FileService {
    pub fn new(store: Arc<dyn BlobStore>, account: StorageAccount) -> Self {
        Self {
            containers: ContainerCache::new(store, account),
        }
    }

    pub fn containers(&self) -> &ContainerCache {
        &self.containers
    }

    /// Reads `content` to the end and stores it, replacing any previous content.
    pub async fn upload<R>(&self, file: &StorageFile, mut content: R) -> Result<()>
    where
        R: AsyncRead + Unpin + Send,
    {
        file.validate()?;
        let mut data = Vec::new();
        content.read_to_end(&mut data).await?;

        let container = self.containers.get_container(&file.container_name).await?;
        container.upload(&file.file_name, data).await
    }

    /// `Ok(None)` when the blob does not exist.
    pub async fn download(&self, file: &StorageFile) -> Result<Option<Vec<u8>>> {
        file.validate()?;
        let container = self.containers.get_container(&file.container_name).await?;
        if !container.exists(&file.file_name).await? {
            return Ok(None);
        }
        container.download(&file.file_name).await
    }

    /// Deleting a missing blob is not an error.
    pub async fn delete(&self, file: &StorageFile) -> Result<()> {
        file.validate()?;
        let container = self.containers.get_container(&file.container_name).await?;
        container.delete(&file.file_name).await?;
        Ok(())
    }

    pub fn file_url(&self, file: &StorageFile) -> String {
        self.containers.file_url(&file.container_name, &file.file_name)
    }

    /// File URL with a read-only signed suffix valid for `validity`.
    pub async fn file_url_with_token(&self, file: &StorageFile, validity: Duration) -> Result<String> {
        self.file_url_with_permissions(file, validity, BlobPermissions::READ)
            .await
    }

    pub async fn file_url_with_permissions(
        &self,
        file: &StorageFile,
        validity: Duration,
        permissions: BlobPermissions,
    ) -> Result<String> {
        file.validate()?;
        let container = self.containers.get_container(&file.container_name).await?;
        let suffix = container
            .signed_url_suffix(&file.file_name, validity, permissions)
            .await?;
        Ok(format!("{}{}", self.file_url(file), suffix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::InMemoryBlobStore;
    use crate::entity::{MergePolicy, MergeStrategy};

    fn service() -> FileService {
        FileService::new(Arc::new(InMemoryBlobStore::new()), StorageAccount::Development)
    }

    #[tokio::test]
    async fn test_upload_download_delete() {
        let service = service();
        let file = StorageFile::new("documents", "hello.txt");

        assert_eq!(service.download(&file).await.unwrap(), None);

        service.upload(&file, &b"hello"[..]).await.unwrap();
        assert_eq!(service.download(&file).await.unwrap(), Some(b"hello".to_vec()));

        service.upload(&file, &b"bye"[..]).await.unwrap();
        assert_eq!(service.download(&file).await.unwrap(), Some(b"bye".to_vec()));

        service.delete(&file).await.unwrap();
        assert_eq!(service.download(&file).await.unwrap(), None);
        service.delete(&file).await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_file_name_rejected() {
        let err = service()
            .upload(&StorageFile::new("documents", ""), &b""[..])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ConfigurationError(_)));
    }

    #[tokio::test]
    async fn test_url_with_token() {
        let service = service();
        let file = StorageFile::new("documents", "hello.txt");
        let url = service
            .file_url_with_token(&file, Duration::minutes(5))
            .await
            .unwrap();
        assert!(url.starts_with("http://127.0.0.1:10000/devstoreaccount1/documents/hello.txt?sp=r"));
    }

    #[test]
    fn test_container_name_is_immutable_on_merge() {
        let existing = StorageFile::new("documents", "a.txt").into_entity();
        let incoming = StorageFile::new("elsewhere", "b.txt").into_entity();

        let merged = MergePolicy::new(MergeStrategy::FieldMerge, StorageFile::merge_rules())
            .merge(existing, incoming);
        let merged = StorageFile::from_entity(merged).unwrap();
        assert_eq!(merged.container_name, "documents");
        assert_eq!(merged.file_name, "b.txt");
    }
}
