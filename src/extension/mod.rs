use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};
use url::form_urlencoded::byte_serialize;

use crate::config::{retrieve_config, save_config, Config};
use crate::settings::Settings;
use crate::store::{ConfigStore, StoreError};

pub mod activity;
pub mod card;

use activity::*;

pub const SETTINGS_TITLE: &str = "Action Config in Azure Configuration";
pub const PAGE_PATH: &str = "actionConfigInAzureMessageExtension";
const TEAMS_CONTEXT_QUERY: &str = "name={loginHint}&tenant={tid}&group={groupId}&theme={theme}";

#[derive(Debug, Error)]
pub enum ExtensionError {
    #[error("[extension] invalid {invoke} payload: {source}")]
    InvalidPayload {
        invoke: &'static str,
        source: serde_json::Error,
    },
    #[error("[extension] invalid settings state: {0}")]
    InvalidSettings(serde_json::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The "action config in Azure" message extension. Every hook runs on its own, the only
/// state shared between them is read-only.
pub struct MessageExtension {
    settings: Arc<Settings>,
    store: Box<dyn ConfigStore>,
}

impl MessageExtension {
    pub fn new(settings: Arc<Settings>, store: Box<dyn ConfigStore>) -> Self {
        return MessageExtension { settings, store };
    }

    /// Routes an activity to its hook. Activities other than invokes are acknowledged with an
    /// empty body, unknown invokes with 501.
    pub async fn handle(&self, activity: Activity) -> Result<InvokeResponse, ExtensionError> {
        let name = match activity.invoke_name() {
            Some(name) => name.to_string(),
            None => {
                debug!("[extension] ignoring {} activity", activity.activity_type);
                return Ok(InvokeResponse::ok(InvokeBody::Empty {}));
            },
        };

        info!("[extension] handling {}", name);
        let value = activity.value.unwrap_or(serde_json::Value::Null);

        return match name.as_str() {
            FETCH_TASK => Ok(InvokeResponse::ok(self.on_fetch_task().await)),
            SUBMIT_ACTION => {
                let value = serde_json::from_value::<SubmitActionValue>(value)
                    .map_err(|source| ExtensionError::InvalidPayload { invoke: SUBMIT_ACTION, source })?;
                Ok(InvokeResponse::ok(self.on_submit_action(value)))
            },
            QUERY_SETTING_URL => Ok(InvokeResponse::ok(self.on_query_settings_url().await)),
            SETTING => {
                let value = match value {
                    serde_json::Value::Null => SettingValue::default(),
                    value => serde_json::from_value::<SettingValue>(value)
                        .map_err(|source| ExtensionError::InvalidPayload { invoke: SETTING, source })?,
                };
                self.on_settings(value).await?;
                Ok(InvokeResponse::ok(InvokeBody::Empty {}))
            },
            _ => {
                warn!("[extension] unknown invoke: {}", name);
                Ok(InvokeResponse { status: 501, body: InvokeBody::Empty {} })
            },
        };
    }

    /// Opens the input form once SiteID and ListID are both configured, and points the user at
    /// the configuration page otherwise.
    pub async fn on_fetch_task(&self) -> InvokeBody {
        let config = retrieve_config(self.store.as_ref(), &self.settings).await;

        if !config.is_complete() {
            info!("[extension] configuration is incomplete, asking for it first");
            return InvokeBody::ComposeExtension {
                compose_extension: MessagingExtensionResult::config(
                    CardAction::open_url("Configuration", self.page_url("config.html")),
                ),
            };
        }

        return InvokeBody::Task {
            task: TaskModuleResponse {
                response_type: "continue".to_string(),
                value: TaskInfo {
                    title: "Input form".to_string(),
                    url: self.page_url("action.html"),
                    height: "medium".to_string(),
                },
            },
        };
    }

    pub fn on_submit_action(&self, value: SubmitActionValue) -> InvokeBody {
        let card = card::document_card(&value.data.doc, &self.settings.hostname);
        return InvokeBody::ComposeExtension {
            compose_extension: MessagingExtensionResult::list(vec![card]),
        };
    }

    pub async fn on_query_settings_url(&self) -> InvokeBody {
        let config = retrieve_config(self.store.as_ref(), &self.settings).await;
        return InvokeBody::ComposeExtension {
            compose_extension: MessagingExtensionResult::config(
                CardAction::open_url(SETTINGS_TITLE, self.settings_url(&config)),
            ),
        };
    }

    /// Persists what the configuration page returned. A cancelled dialog comes back without
    /// state and changes nothing.
    pub async fn on_settings(&self, value: SettingValue) -> Result<(), ExtensionError> {
        let state = match value.state.as_deref().map(str::trim) {
            Some(state) if !state.is_empty() => state.to_string(),
            _ => {
                info!("[extension] settings dialog returned no state");
                return Ok(());
            },
        };

        let setting = serde_json::from_str::<SettingState>(&state)
            .map_err(ExtensionError::InvalidSettings)?;
        debug!("[extension] new setting: {:?}", setting);

        save_config(self.store.as_ref(), &Config {
            site_id: setting.site_id,
            list_id: setting.list_id,
        }).await?;

        return Ok(());
    }

    fn page_url(&self, page: &str) -> String {
        return format!("https://{}/{}/{}?{}", self.settings.hostname, PAGE_PATH, page, TEAMS_CONTEXT_QUERY);
    }

    /// Teams substitutes the `{...}` placeholders itself, so only the stored values are encoded.
    fn settings_url(&self, config: &Config) -> String {
        return format!(
            "{}&siteID={}&listID={}",
            self.page_url("config.html"),
            encode(config.site_id()),
            encode(config.list_id()),
        );
    }
}

fn encode(value: &str) -> String {
    return byte_serialize(value.as_bytes()).collect();
}
