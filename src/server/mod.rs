use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use serde_json::json;
use tracing::{error, info};
use warp::http::StatusCode;
use warp::http::header::{HeaderMap, HeaderValue, CONTENT_SECURITY_POLICY, X_FRAME_OPTIONS};
use warp::{Filter, Rejection, Reply};

use crate::extension::{MessageExtension, PAGE_PATH};
use crate::extension::activity::Activity;

/// Limit on the size of incoming activities, Teams payloads stay far below it.
const MAX_ACTIVITY_SIZE: u64 = 256 * 1024;

const TEAMS_FRAME_ANCESTORS: &str = "frame-ancestors teams.microsoft.com *.teams.microsoft.com *.skype.com";
const TEAMS_FRAME_OPTIONS: &str = "ALLOW-FROM https://teams.microsoft.com/";

pub fn routes(
    extension: Arc<MessageExtension>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let messages = warp::path!("api" / "messages")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_ACTIVITY_SIZE))
        .and(warp::body::json::<Activity>())
        .and(with_extension(extension))
        .and_then(handle_activity);

    let health = warp::path!("health")
        .and(warp::get())
        .map(|| "OK");

    // The configuration and input pages are only meant to be embedded by Teams.
    let pages = warp::path(PAGE_PATH)
        .and(warp::get())
        .and(warp::fs::dir(format!("public/{}", PAGE_PATH)))
        .with(warp::reply::with::headers(teams_frame_headers()));

    let public = warp::get()
        .and(warp::fs::dir("public"));

    return messages
        .or(health)
        .or(pages)
        .or(public)
        .with(warp::trace::request());
}

pub async fn serve(extension: Arc<MessageExtension>, port: u16) {
    let address: SocketAddr = ([0, 0, 0, 0], port).into();
    info!("[server] listening on http://{}/", address);
    warp::serve(routes(extension))
        .run(address)
        .await;
}

fn teams_frame_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_SECURITY_POLICY, HeaderValue::from_static(TEAMS_FRAME_ANCESTORS));
    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static(TEAMS_FRAME_OPTIONS));
    return headers;
}

fn with_extension(
    extension: Arc<MessageExtension>,
) -> impl Filter<Extract = (Arc<MessageExtension>,), Error = Infallible> + Clone {
    return warp::any().map(move || Arc::clone(&extension));
}

async fn handle_activity(
    activity: Activity,
    extension: Arc<MessageExtension>,
) -> Result<impl Reply, Infallible> {
    return match extension.handle(activity).await {
        Ok(response) => {
            let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::OK);
            Ok(warp::reply::with_status(warp::reply::json(&response.body), status))
        },
        Err(err) => {
            error!("[server] could not handle the activity: {}", err);
            Ok(warp::reply::with_status(
                warp::reply::json(&json!({ "error": err.to_string() })),
                StatusCode::INTERNAL_SERVER_ERROR,
            ))
        },
    };
}

#[cfg(test)]
mod test {
    use std::future::Future;

    use mockall::predicate::*;
    use serde_json::Value;
    use tokio::runtime::Builder;

    use crate::settings::test::get_test_settings;
    use crate::store::{ConfigurationSetting, MockConfigStore, StoreError};
    use super::*;

    fn with_runtime<F>(f: F) -> F::Output where F: Future {
        return Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(f);
    }

    fn get_extension(store: MockConfigStore) -> Arc<MessageExtension> {
        return Arc::new(MessageExtension::new(Arc::new(get_test_settings()), Box::new(store)));
    }

    #[test]
    fn test_health() {
        let filter = routes(get_extension(MockConfigStore::new()));

        let response = with_runtime(warp::test::request()
            .method("GET")
            .path("/health")
            .reply(&filter));

        assert_eq!(response.status(), 200);
        assert_eq!(response.body(), "OK");
    }

    #[test]
    fn test_extension_pages_can_only_be_framed_by_teams() {
        let filter = routes(get_extension(MockConfigStore::new()));

        for page in ["config.html", "action.html"] {
            let response = with_runtime(warp::test::request()
                .method("GET")
                .path(&format!("/actionConfigInAzureMessageExtension/{}", page))
                .reply(&filter));

            assert_eq!(response.status(), 200, "{} should be served", page);
            assert_eq!(
                response.headers()["content-security-policy"],
                "frame-ancestors teams.microsoft.com *.teams.microsoft.com *.skype.com",
            );
            assert_eq!(response.headers()["x-frame-options"], "ALLOW-FROM https://teams.microsoft.com/");
        }
    }

    #[test]
    fn test_health_has_no_frame_restrictions() {
        let filter = routes(get_extension(MockConfigStore::new()));

        let response = with_runtime(warp::test::request()
            .method("GET")
            .path("/health")
            .reply(&filter));

        assert!(response.headers().get("content-security-policy").is_none());
    }

    #[test]
    fn test_query_setting_url_invoke() {
        let mut store = MockConfigStore::new();
        store.expect_get_setting()
            .with(eq("SiteID".to_string()))
            .returning(|key| Ok(ConfigurationSetting::new(&key, "S1")));
        store.expect_get_setting()
            .with(eq("ListID".to_string()))
            .returning(|key| Ok(ConfigurationSetting::new(&key, "L1")));
        let filter = routes(get_extension(store));

        let response = with_runtime(warp::test::request()
            .method("POST")
            .path("/api/messages")
            .json(&json!({
                "type": "invoke",
                "name": "composeExtension/querySettingUrl",
                "value": {}
            }))
            .reply(&filter));

        assert_eq!(response.status(), 200);
        let body: Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["composeExtension"]["type"], "config");
        assert_eq!(body["composeExtension"]["suggestedActions"]["actions"][0]["title"], "Action Config in Azure Configuration");
    }

    #[test]
    fn test_setting_invoke_when_store_fails_then_internal_server_error() {
        let mut store = MockConfigStore::new();
        store.expect_set_setting()
            .returning(|_, _| Err(StoreError::Unauthorized));
        let filter = routes(get_extension(store));

        let response = with_runtime(warp::test::request()
            .method("POST")
            .path("/api/messages")
            .json(&json!({
                "type": "invoke",
                "name": "composeExtension/setting",
                "value": { "state": "{\"siteID\":\"S2\"}" }
            }))
            .reply(&filter));

        assert_eq!(response.status(), 500);
    }

    #[test]
    fn test_unknown_invoke_is_not_implemented() {
        let filter = routes(get_extension(MockConfigStore::new()));

        let response = with_runtime(warp::test::request()
            .method("POST")
            .path("/api/messages")
            .json(&json!({
                "type": "invoke",
                "name": "composeExtension/queryLink",
                "value": {}
            }))
            .reply(&filter));

        assert_eq!(response.status(), 501);
    }
}
