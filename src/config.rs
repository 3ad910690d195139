use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::settings::Settings;
use crate::store::{ConfigStore, ConfigurationSetting, StoreResult};

pub const SITE_ID_KEY: &str = "SiteID";
pub const LIST_ID_KEY: &str = "ListID";

/// The two settings the extension persists in the configuration store.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "SiteID", default, skip_serializing_if = "Option::is_none")]
    pub site_id: Option<String>,
    #[serde(rename = "ListID", default, skip_serializing_if = "Option::is_none")]
    pub list_id: Option<String>,
}

impl Config {
    pub fn site_id(&self) -> &str {
        return self.site_id.as_deref().unwrap_or("");
    }

    pub fn list_id(&self) -> &str {
        return self.list_id.as_deref().unwrap_or("");
    }

    pub fn is_complete(&self) -> bool {
        return !self.site_id().is_empty() && !self.list_id().is_empty();
    }
}

/// Reads both settings from the store. Never fails: each key falls back on its own to the
/// configured default (SITE_ID, LIST_ID), then to an empty string.
pub async fn retrieve_config(store: &dyn ConfigStore, settings: &Settings) -> Config {
    let site_id = read_or_default(store, SITE_ID_KEY, &settings.site_id_default).await;
    let list_id = read_or_default(store, LIST_ID_KEY, &settings.list_id_default).await;

    return Config {
        site_id: Some(site_id),
        list_id: Some(list_id),
    };
}

async fn read_or_default(store: &dyn ConfigStore, key: &str, default: &Option<String>) -> String {
    let fallback = || default.clone().unwrap_or_default();

    return match store.get_setting(key.to_string()).await {
        Ok(ConfigurationSetting { value: Some(value), .. }) => value,
        Ok(_) => {
            warn!("[config] setting {} has no value, using the default", key);
            fallback()
        },
        Err(err) => {
            warn!("[config] could not read setting {}, using the default: {}", key, err);
            fallback()
        },
    };
}

/// Writes every present, non-empty field. Absent fields are left untouched in the store and
/// the first failing write is returned to the caller.
pub async fn save_config(store: &dyn ConfigStore, new_config: &Config) -> StoreResult<()> {
    let updates = [
        (SITE_ID_KEY, &new_config.site_id),
        (LIST_ID_KEY, &new_config.list_id),
    ];

    for (key, value) in updates {
        match value {
            Some(value) if !value.is_empty() => {
                store.set_setting(key.to_string(), value.clone()).await?;
                info!("[config] saved setting {}", key);
            },
            _ => {},
        }
    }

    return Ok(());
}
