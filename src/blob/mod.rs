//! Blob containers and file descriptors stored alongside table records.

pub mod container;
pub mod file;
pub mod store;

pub use container::{BlobContainer, ContainerCache, validate_container_name};
pub use file::{FileService, StorageFile};
pub use store::{BlobPermissions, BlobStore, InMemoryBlobStore};
