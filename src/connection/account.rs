use crate::core::{Result, StoreError};

/// Account name the storage emulator answers to.
pub const DEVELOPMENT_ACCOUNT_NAME: &str = "devstoreaccount1";

const DEFAULT_PROTOCOL: &str = "https";
const DEFAULT_ENDPOINT_SUFFIX: &str = "core.windows.net";

/// Storage account resolved from a connection string.
///
/// Format: either `UseDevelopmentStorage=true`, or `;`-separated `Key=Value`
/// pairs such as
/// `DefaultEndpointsProtocol=https;AccountName=acme;AccountKey=c2VjcmV0;EndpointSuffix=core.windows.net`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageAccount {
    Development,
    Named {
        account_name: String,
        account_key: String,
        protocol: String,
        endpoint_suffix: String,
    },
}

impl StorageAccount {
    pub fn parse(connection_string: &str) -> Result<Self> {
        let connection_string = connection_string.trim();
        if connection_string.is_empty() {
            return Err(StoreError::ConfigurationError(
                "Storage connection string is empty".to_string(),
            ));
        }

        let mut account_name = None;
        let mut account_key = None;
        let mut protocol = None;
        let mut endpoint_suffix = None;

        for pair in connection_string.split(';').filter(|p| !p.trim().is_empty()) {
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                StoreError::ConfigurationError(format!(
                    "Invalid connection string segment '{}'",
                    pair
                ))
            })?;

            match key.trim() {
                "UseDevelopmentStorage" => {
                    if value.trim().eq_ignore_ascii_case("true") {
                        return Ok(Self::Development);
                    }
                }
                "AccountName" => account_name = Some(value.trim().to_string()),
                "AccountKey" => account_key = Some(value.trim().to_string()),
                "DefaultEndpointsProtocol" => protocol = Some(value.trim().to_string()),
                "EndpointSuffix" => endpoint_suffix = Some(value.trim().to_string()),
                // Endpoint overrides and tokens belong to the store client
                _ => {}
            }
        }

        let account_name = account_name
            .filter(|name| !name.is_empty())
            .ok_or_else(|| StoreError::ConfigurationError("AccountName is required".to_string()))?;
        let account_key = account_key
            .filter(|key| !key.is_empty())
            .ok_or_else(|| StoreError::ConfigurationError("AccountKey is required".to_string()))?;

        let protocol = protocol.unwrap_or_else(|| DEFAULT_PROTOCOL.to_string());
        if protocol != "http" && protocol != "https" {
            return Err(StoreError::ConfigurationError(format!(
                "Unsupported endpoints protocol '{}'",
                protocol
            )));
        }

        Ok(Self::Named {
            account_name,
            account_key,
            protocol,
            endpoint_suffix: endpoint_suffix.unwrap_or_else(|| DEFAULT_ENDPOINT_SUFFIX.to_string()),
        })
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    pub fn account_name(&self) -> &str {
        match self {
            Self::Development => DEVELOPMENT_ACCOUNT_NAME,
            Self::Named { account_name, .. } => account_name,
        }
    }

    /// Base URL of the blob service, without a trailing slash.
    ///
    /// The emulator has no TLS, so development URLs stay on plain http.
    pub fn blob_endpoint(&self) -> String {
        match self {
            Self::Development => format!("http://127.0.0.1:10000/{}", DEVELOPMENT_ACCOUNT_NAME),
            Self::Named { account_name, endpoint_suffix, .. } => {
                format!("//{}.blob.{}", account_name, endpoint_suffix)
            }
        }
    }

    pub fn table_endpoint(&self) -> String {
        match self {
            Self::Development => format!("http://127.0.0.1:10002/{}", DEVELOPMENT_ACCOUNT_NAME),
            Self::Named { account_name, protocol, endpoint_suffix, .. } => {
                format!("{}://{}.table.{}", protocol, account_name, endpoint_suffix)
            }
        }
    }
}
