pub mod account;
pub mod config;

pub use account::StorageAccount;
pub use config::{DEFAULT_PAGE_SIZE, StorageConfig};
