use super::account::StorageAccount;
use crate::core::{Result, StoreError};
use crate::record::CodecMode;

/// Default number of entities the development store returns per scan page.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Configuration of one CRUD façade
///
/// Passed explicitly at construction; nothing is resolved from process-wide state.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Storage connection string, resolved into a `StorageAccount`
    pub connection_string: String,

    /// Table the façade reads and writes
    pub table_name: String,

    /// Partition every record of the façade lives in
    pub partition_name: String,

    /// Page size used by development stores created from this config
    pub page_size: usize,

    /// How the schema-less codec treats unsupported field shapes
    pub codec_mode: CodecMode,
}

impl StorageConfig {
    pub fn new(table_name: &str, partition_name: &str) -> Self {
        Self {
            connection_string: "UseDevelopmentStorage=true".to_string(),
            table_name: table_name.to_string(),
            partition_name: partition_name.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            codec_mode: CodecMode::default(),
        }
    }

    /// Set the connection string
    pub fn connection_string(mut self, connection_string: &str) -> Self {
        self.connection_string = connection_string.to_string();
        self
    }

    /// Set the table name
    pub fn table(mut self, table_name: &str) -> Self {
        self.table_name = table_name.to_string();
        self
    }

    /// Set the partition name
    pub fn partition(mut self, partition_name: &str) -> Self {
        self.partition_name = partition_name.to_string();
        self
    }

    /// Set the scan page size
    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the codec mode
    pub fn codec_mode(mut self, mode: CodecMode) -> Self {
        self.codec_mode = mode;
        self
    }

    /// Resolve the storage account named by the connection string
    pub fn account(&self) -> Result<StorageAccount> {
        StorageAccount::parse(&self.connection_string)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.table_name.is_empty() {
            return Err(StoreError::ConfigurationError(
                "Table name cannot be empty".to_string(),
            ));
        }

        if self.partition_name.is_empty() {
            return Err(StoreError::ConfigurationError(
                "Partition name cannot be empty".to_string(),
            ));
        }

        if self.page_size == 0 {
            return Err(StoreError::ConfigurationError(
                "page_size must be > 0".to_string(),
            ));
        }

        self.account().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StorageConfig::new("Humans", "Ralston");
        assert_eq!(config.table_name, "Humans");
        assert_eq!(config.partition_name, "Ralston");
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert!(config.account().unwrap().is_development());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = StorageConfig::new("People", "Ralston")
            .connection_string("AccountName=acme;AccountKey=c2VjcmV0")
            .table("Pets")
            .partition("Smith")
            .page_size(50)
            .codec_mode(CodecMode::Strict);

        assert_eq!(config.table_name, "Pets");
        assert_eq!(config.partition_name, "Smith");
        assert_eq!(config.page_size, 50);
        assert_eq!(config.codec_mode, CodecMode::Strict);
        assert_eq!(config.account().unwrap().account_name(), "acme");
    }

    #[test]
    fn test_validate() {
        assert!(StorageConfig::new("", "p").validate().is_err());
        assert!(StorageConfig::new("People", "").validate().is_err());
        assert!(StorageConfig::new("People", "p").page_size(0).validate().is_err());

        let bad_account = StorageConfig::new("People", "p").connection_string("AccountName=x");
        assert!(matches!(
            bad_account.validate(),
            Err(StoreError::ConfigurationError(_))
        ));
    }
}
