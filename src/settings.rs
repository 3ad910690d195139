use std::collections::HashMap;

use thiserror::Error;

pub const DEFAULT_PORT: u16 = 3007;

#[derive(Debug, Error, PartialEq)]
pub enum SettingsError {
    #[error("[settings] {0} must be set")]
    Missing(&'static str),
    #[error("[settings] {name} is not valid: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Everything the extension reads from the process environment, gathered once at start-up
/// and passed down explicitly from there.
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub store_connection_string: String,
    pub hostname: String,
    pub port: u16,
    pub client_secret: Option<String>,
    pub tenant_id: Option<String>,
    pub client_id: Option<String>,
    pub identity_endpoint: Option<String>,
    pub identity_header: Option<String>,
    pub site_id_default: Option<String>,
    pub list_id_default: Option<String>,
}

impl Settings {
    pub fn from_env() -> Result<Self, SettingsError> {
        return Settings::from_lookup(|name| std::env::var(name).ok());
    }

    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self, SettingsError> {
        return Settings::from_lookup(|name| vars.get(name).cloned());
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError> where
        F: Fn(&str) -> Option<String>,
    {
        // Empty variables behave like unset ones, an empty AZURE_CLIENT_SECRET must not
        // select the client secret credential.
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let store_connection_string = get("AZURE_CONFIG_CONNECTION_STRING")
            .ok_or(SettingsError::Missing("AZURE_CONFIG_CONNECTION_STRING"))?;
        let hostname = get("HOSTNAME")
            .ok_or(SettingsError::Missing("HOSTNAME"))?;

        let port = match get("PORT") {
            Some(port) => port.trim().parse::<u16>().map_err(|_| SettingsError::Invalid {
                name: "PORT",
                value: port.clone(),
            })?,
            None => DEFAULT_PORT,
        };

        return Ok(Settings {
            store_connection_string,
            hostname,
            port,
            client_secret: get("AZURE_CLIENT_SECRET"),
            tenant_id: get("AZURE_TENANT_ID"),
            client_id: get("AZURE_CLIENT_ID"),
            identity_endpoint: get("IDENTITY_ENDPOINT"),
            identity_header: get("IDENTITY_HEADER"),
            site_id_default: get("SITE_ID"),
            list_id_default: get("LIST_ID"),
        });
    }
}
