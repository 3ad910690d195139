use std::str::FromStr;

use reqwest::{Client, Response, StatusCode};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Serialize;
use tracing::instrument;
use url::Url;

use crate::settings::Settings;
use super::*;

const API_VERSION: &str = "1.0";
const KV_CONTENT_TYPE: &str = "application/vnd.microsoft.appconfig.kv+json";

/// `Endpoint=https://<name>.azconfig.io;Id=<id>;Secret=<secret>`, as copied from the portal.
/// A bare endpoint URL is accepted too. Only the endpoint is kept: access key authentication is
/// not supported, the store is always called with a token from the selected credential.
#[derive(Clone, Debug, PartialEq)]
pub struct ConnectionString {
    pub endpoint: Url,
}

impl FromStr for ConnectionString {
    type Err = StoreError;

    fn from_str(value: &str) -> StoreResult<Self> {
        let value = value.trim();
        if !value.contains('=') {
            let endpoint = parse_endpoint(value)?;
            return Ok(ConnectionString { endpoint });
        }

        let mut endpoint = None;
        for part in value.split(';').filter(|part| !part.trim().is_empty()) {
            // Secrets are base64 and may end with '=' padding, only the first '=' separates.
            let (name, field) = part.split_once('=')
                .ok_or_else(|| StoreError::InvalidConnectionString(format!("malformed segment {}", part)))?;
            if name.trim().eq_ignore_ascii_case("endpoint") {
                endpoint = Some(parse_endpoint(field.trim())?);
            }
        }

        let endpoint = endpoint.ok_or_else(|| StoreError::InvalidConnectionString("missing Endpoint".to_string()))?;
        return Ok(ConnectionString { endpoint });
    }
}

fn parse_endpoint(value: &str) -> StoreResult<Url> {
    let endpoint = Url::parse(value)
        .map_err(|err| StoreError::InvalidConnectionString(format!("invalid endpoint {}: {}", value, err)))?;
    if endpoint.cannot_be_a_base() || endpoint.host_str().is_none() {
        return Err(StoreError::InvalidConnectionString(format!("invalid endpoint {}", value)));
    }
    return Ok(endpoint);
}

#[derive(Serialize)]
struct SetSettingBody<'a> {
    value: &'a str,
}

/// REST client for Azure App Configuration, authenticated with a bearer token obtained for
/// every request.
pub struct AppConfigurationClient {
    http: Client,
    endpoint: Url,
    credential: Credential,
}

impl AppConfigurationClient {
    pub fn new(settings: &Settings) -> StoreResult<Self> {
        let connection_string = settings.store_connection_string.parse::<ConnectionString>()?;
        return Ok(AppConfigurationClient::with_credential(
            connection_string.endpoint,
            Credential::select(settings),
        ));
    }

    pub fn with_credential(endpoint: Url, credential: Credential) -> Self {
        return AppConfigurationClient {
            http: Client::new(),
            endpoint,
            credential,
        };
    }

    pub fn endpoint(&self) -> &Url {
        return &self.endpoint;
    }

    pub fn credential(&self) -> &Credential {
        return &self.credential;
    }

    /// Token audience, i.e. the endpoint origin with no trailing slash.
    fn resource(&self) -> String {
        return self.endpoint.origin().ascii_serialization();
    }

    fn setting_url(&self, key: &str) -> StoreResult<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::InvalidConnectionString(format!("invalid endpoint {}", self.endpoint)))?
            .pop_if_empty()
            .push("kv")
            .push(key);
        url.query_pairs_mut().append_pair("api-version", API_VERSION);
        return Ok(url);
    }
}

#[async_trait]
impl ConfigStore for AppConfigurationClient {
    #[instrument(name = "store.get_setting", level = "debug", skip(self))]
    async fn get_setting(
        &self,
        key: String,
    ) -> StoreResult<ConfigurationSetting> {
        let url = self.setting_url(&key)?;
        let token = self.credential.acquire_token(&self.http, &self.resource()).await?;
        let response = self.http.get(url)
            .bearer_auth(token)
            .header(ACCEPT, KV_CONTENT_TYPE)
            .send()
            .await?;

        return check_status(response, &key).await?
            .json::<ConfigurationSetting>()
            .await
            .map_err(StoreError::from);
    }

    #[instrument(name = "store.set_setting", level = "debug", skip(self, value))]
    async fn set_setting(
        &self,
        key: String,
        value: String,
    ) -> StoreResult<ConfigurationSetting> {
        let url = self.setting_url(&key)?;
        let token = self.credential.acquire_token(&self.http, &self.resource()).await?;
        let response = self.http.put(url)
            .bearer_auth(token)
            .header(ACCEPT, KV_CONTENT_TYPE)
            .header(CONTENT_TYPE, KV_CONTENT_TYPE)
            .json(&SetSettingBody { value: &value })
            .send()
            .await?;

        return check_status(response, &key).await?
            .json::<ConfigurationSetting>()
            .await
            .map_err(StoreError::from);
    }
}

async fn check_status(response: Response, key: &str) -> StoreResult<Response> {
    return match response.status() {
        status if status.is_success() => Ok(response),
        StatusCode::NOT_FOUND => Err(StoreError::NotFound(key.to_string())),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(StoreError::Unauthorized),
        status => {
            let body = response.text().await.unwrap_or_default();
            Err(StoreError::Unexpected { status: status.as_u16(), body })
        },
    };
}
