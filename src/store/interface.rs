use serde::{Deserialize, Serialize};
use thiserror::Error;

#[cfg(test)]
use mockall::automock;

use super::CredentialError;

pub type StoreResult<A> = std::result::Result<A, StoreError>;

/// Key-value access to the configuration store. Both operations address a single setting
/// with no label.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn get_setting(
        &self,
        key: String,
    ) -> StoreResult<ConfigurationSetting>;

    async fn set_setting(
        &self,
        key: String,
        value: String,
    ) -> StoreResult<ConfigurationSetting>;
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("[store] setting {0} was not found")]
    NotFound(String),
    #[error("[store] unauthorized access to the configuration store")]
    Unauthorized,
    #[error("[store] the configuration store responded with {status}: {body}")]
    Unexpected { status: u16, body: String },
    #[error("[store] invalid connection string: {0}")]
    InvalidConnectionString(String),
    #[error(transparent)]
    Credential(#[from] CredentialError),
    #[error("[store] request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// A key-value as exposed by the App Configuration REST API.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationSetting {
    pub key: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub etag: Option<String>,
    #[serde(default)]
    pub last_modified: Option<String>,
    #[serde(default)]
    pub locked: bool,
}

impl ConfigurationSetting {
    pub fn new(key: &str, value: &str) -> Self {
        return ConfigurationSetting {
            key: key.to_string(),
            value: Some(value.to_string()),
            ..ConfigurationSetting::default()
        };
    }
}
