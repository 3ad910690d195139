use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;

use crate::settings::Settings;

const AUTHORITY_HOST: &str = "https://login.microsoftonline.com";
const IMDS_ENDPOINT: &str = "http://169.254.169.254/metadata/identity/oauth2/token";
const IMDS_API_VERSION: &str = "2018-02-01";
const APP_SERVICE_API_VERSION: &str = "2019-08-01";

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("[credential] {0} must be set to use the client secret credential")]
    Incomplete(&'static str),
    #[error("[credential] token request was rejected with {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("[credential] token request failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Credential {
    Environment(EnvironmentCredential),
    ManagedIdentity(ManagedIdentityCredential),
}

/// Service principal authenticated with a client secret (AZURE_TENANT_ID, AZURE_CLIENT_ID,
/// AZURE_CLIENT_SECRET).
#[derive(Clone, Debug, PartialEq)]
pub struct EnvironmentCredential {
    pub tenant_id: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: String,
}

/// Identity assigned to the hosting resource. On App Service the local identity endpoint is
/// used, anywhere else the instance metadata service.
#[derive(Clone, Debug, PartialEq)]
pub struct ManagedIdentityCredential {
    pub client_id: Option<String>,
    pub identity_endpoint: Option<String>,
    pub identity_header: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl Credential {
    /// The only place deciding how the store is authenticated: a client secret in the
    /// settings selects the environment credential, its absence the managed identity.
    pub fn select(settings: &Settings) -> Self {
        return match &settings.client_secret {
            Some(client_secret) => Credential::Environment(EnvironmentCredential {
                tenant_id: settings.tenant_id.clone(),
                client_id: settings.client_id.clone(),
                client_secret: client_secret.clone(),
            }),
            None => Credential::ManagedIdentity(ManagedIdentityCredential {
                client_id: settings.client_id.clone(),
                identity_endpoint: settings.identity_endpoint.clone(),
                identity_header: settings.identity_header.clone(),
            }),
        };
    }

    pub fn kind(&self) -> &'static str {
        return match self {
            Credential::Environment(_) => "environment",
            Credential::ManagedIdentity(_) => "managed identity",
        };
    }

    /// Requests a bearer token for `resource` (e.g. `https://contoso.azconfig.io`).
    pub async fn acquire_token(&self, http: &Client, resource: &str) -> Result<String, CredentialError> {
        return match self {
            Credential::Environment(credential) => credential.acquire_token(http, resource).await,
            Credential::ManagedIdentity(credential) => credential.acquire_token(http, resource).await,
        };
    }
}

impl EnvironmentCredential {
    async fn acquire_token(&self, http: &Client, resource: &str) -> Result<String, CredentialError> {
        let tenant_id = self.tenant_id.as_ref().ok_or(CredentialError::Incomplete("AZURE_TENANT_ID"))?;
        let client_id = self.client_id.as_ref().ok_or(CredentialError::Incomplete("AZURE_CLIENT_ID"))?;
        let scope = format!("{}/.default", resource.trim_end_matches('/'));

        let response = http.post(format!("{}/{}/oauth2/v2.0/token", AUTHORITY_HOST, tenant_id))
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("scope", scope.as_str()),
            ])
            .send()
            .await?;

        return read_token(response).await;
    }
}

impl ManagedIdentityCredential {
    async fn acquire_token(&self, http: &Client, resource: &str) -> Result<String, CredentialError> {
        let mut query = vec![("resource", resource.to_string())];
        if let Some(client_id) = &self.client_id {
            query.push(("client_id", client_id.clone()));
        }

        let request = match (&self.identity_endpoint, &self.identity_header) {
            (Some(endpoint), Some(header)) => {
                query.push(("api-version", APP_SERVICE_API_VERSION.to_string()));
                http.get(endpoint)
                    .header("X-IDENTITY-HEADER", header)
                    .query(&query)
            },
            _ => {
                query.push(("api-version", IMDS_API_VERSION.to_string()));
                http.get(IMDS_ENDPOINT)
                    .header("Metadata", "true")
                    .query(&query)
            },
        };

        let response = request.send().await?;
        return read_token(response).await;
    }
}

async fn read_token(response: reqwest::Response) -> Result<String, CredentialError> {
    let status = response.status();
    if status != StatusCode::OK {
        let body = response.text().await.unwrap_or_default();
        return Err(CredentialError::Rejected { status: status.as_u16(), body });
    }

    let token = response.json::<TokenResponse>().await?;
    return Ok(token.access_token);
}
