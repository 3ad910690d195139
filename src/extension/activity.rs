use serde::{Deserialize, Serialize};

pub const INVOKE: &str = "invoke";
pub const FETCH_TASK: &str = "composeExtension/fetchTask";
pub const SUBMIT_ACTION: &str = "composeExtension/submitAction";
pub const QUERY_SETTING_URL: &str = "composeExtension/querySettingUrl";
pub const SETTING: &str = "composeExtension/setting";

pub const ADAPTIVE_CARD_CONTENT_TYPE: &str = "application/vnd.microsoft.card.adaptive";

/// The part of a Bot Framework activity the extension looks at.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(rename = "type")]
    pub activity_type: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
}

impl Activity {
    pub fn invoke_name(&self) -> Option<&str> {
        if self.activity_type != INVOKE {
            return None;
        }
        return self.name.as_deref();
    }
}

/// `value` of a submit action invoke, only the document the action form posts.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SubmitActionValue {
    pub data: SubmitActionData,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SubmitActionData {
    pub doc: Document,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Document {
    pub name: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub modified: String,
    pub url: String,
}

/// `value` of a setting invoke. `state` is whatever the configuration page handed back to
/// Teams, a JSON document serialized as a string.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct SettingValue {
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct SettingState {
    #[serde(rename = "siteID", default)]
    pub site_id: Option<String>,
    #[serde(rename = "listID", default)]
    pub list_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct InvokeResponse {
    pub status: u16,
    pub body: InvokeBody,
}

impl InvokeResponse {
    pub fn ok(body: InvokeBody) -> Self {
        return InvokeResponse { status: 200, body };
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum InvokeBody {
    ComposeExtension {
        #[serde(rename = "composeExtension")]
        compose_extension: MessagingExtensionResult,
    },
    Task {
        task: TaskModuleResponse,
    },
    Empty {},
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultType {
    Result,
    Config,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagingExtensionResult {
    #[serde(rename = "type")]
    pub result_type: ResultType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment_layout: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_actions: Option<SuggestedActions>,
}

impl MessagingExtensionResult {
    pub fn config(action: CardAction) -> Self {
        return MessagingExtensionResult {
            result_type: ResultType::Config,
            attachment_layout: None,
            attachments: vec![],
            suggested_actions: Some(SuggestedActions { actions: vec![action] }),
        };
    }

    pub fn list(attachments: Vec<Attachment>) -> Self {
        return MessagingExtensionResult {
            result_type: ResultType::Result,
            attachment_layout: Some("list".to_string()),
            attachments,
            suggested_actions: None,
        };
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub content_type: String,
    pub content: serde_json::Value,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SuggestedActions {
    pub actions: Vec<CardAction>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CardAction {
    #[serde(rename = "type")]
    pub action_type: String,
    pub title: String,
    pub value: String,
}

impl CardAction {
    pub fn open_url(title: &str, url: String) -> Self {
        return CardAction {
            action_type: "openUrl".to_string(),
            title: title.to_string(),
            value: url,
        };
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TaskModuleResponse {
    #[serde(rename = "type")]
    pub response_type: String,
    pub value: TaskInfo,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TaskInfo {
    pub title: String,
    pub url: String,
    pub height: String,
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_invoke_name_of_invoke_activity() {
        let activity: Activity = serde_json::from_value(json!({
            "type": "invoke",
            "name": "composeExtension/fetchTask",
            "value": { "commandId": "actionConfigInAzureMessageExtension" },
            "channelId": "msteams"
        })).unwrap();

        assert_eq!(activity.invoke_name(), Some(FETCH_TASK));
    }

    #[test]
    fn test_invoke_name_of_message_activity() {
        let activity: Activity = serde_json::from_value(json!({
            "type": "message",
            "name": "composeExtension/fetchTask"
        })).unwrap();

        assert_eq!(activity.invoke_name(), None);
    }

    #[test]
    fn test_serialize_empty_body() {
        assert_eq!(serde_json::to_value(InvokeBody::Empty {}).unwrap(), json!({}));
    }

    #[test]
    fn test_serialize_config_result() {
        let body = InvokeBody::ComposeExtension {
            compose_extension: MessagingExtensionResult::config(
                CardAction::open_url("Configuration", "https://contoso.ngrok.io/config.html".to_string()),
            ),
        };

        assert_eq!(serde_json::to_value(body).unwrap(), json!({
            "composeExtension": {
                "type": "config",
                "suggestedActions": {
                    "actions": [{
                        "type": "openUrl",
                        "title": "Configuration",
                        "value": "https://contoso.ngrok.io/config.html"
                    }]
                }
            }
        }));
    }
}
