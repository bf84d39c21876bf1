//! reqwest implementation of [`NotificationApi`].

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use visadesk_core::config::{ApiConfig, SessionConfig};
use visadesk_core::types::id::NotificationId;
use visadesk_core::types::pagination::{PageRequest, PageResponse};
use visadesk_entity::Notification;

use crate::api::NotificationApi;
use crate::error::{ApiError, ApiResult};
use crate::types::{DeleteRequest, ErrorBody, MarkAllReadResponse, MarkReadRequest};
use crate::wire;

/// HTTP client for the notification REST surface.
#[derive(Debug, Clone)]
pub struct HttpNotificationApi {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpNotificationApi {
    /// Build a client from configuration.
    pub fn new(config: &ApiConfig, session: &SessionConfig) -> ApiResult<Self> {
        Url::parse(&config.base_url)
            .map_err(|e| ApiError::Configuration(format!("invalid api.base_url: {e}")))?;

        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("visadesk/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: session.token.clone(),
        })
    }

    fn url(&self, path: &str) -> ApiResult<Url> {
        Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| ApiError::Configuration(format!("invalid URL for '{path}': {e}")))
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client.request(method, url).bearer_auth(&self.token)
    }

    /// Send a request and turn non-success statuses into [`ApiError`].
    async fn send(&self, builder: RequestBuilder) -> ApiResult<Response> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_status(
            status.as_u16(),
            ErrorBody::message_from(&body),
        ))
    }

    /// Decode an optional JSON body; an empty body yields `None`.
    async fn optional_json<T: DeserializeOwned>(response: Response) -> ApiResult<Option<T>> {
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&body)
            .map(Some)
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl NotificationApi for HttpNotificationApi {
    async fn list(&self, page: PageRequest) -> ApiResult<PageResponse<Notification>> {
        let mut url = self.url("/notifications")?;
        url.query_pairs_mut()
            .append_pair("page", &page.page.to_string())
            .append_pair("pageSize", &page.page_size.to_string());

        debug!(page = page.page, page_size = page.page_size, "Fetching notifications");
        let response = self.send(self.request(Method::GET, url)).await?;
        let body = response.text().await?;
        let raw: PageResponse<Value> =
            serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))?;

        let received_at = Utc::now();
        let page = raw.filter_map_items(|item| match wire::decode_notification(&item, received_at) {
            Ok(notification) => Some(notification),
            Err(e) => {
                warn!(error = %e, "Dropping undecodable notification from listing");
                None
            }
        });
        Ok(page)
    }

    async fn mark_read(
        &self,
        id: &NotificationId,
        is_read: bool,
    ) -> ApiResult<Option<Notification>> {
        let url = self.url("/notifications/read")?;
        let body = MarkReadRequest {
            notification_id: id.clone(),
            is_read,
        };
        debug!(notification_id = %id, is_read, "Marking notification");
        let response = self
            .send(self.request(Method::PUT, url).json(&body))
            .await?;
        let echoed: Option<Value> = Self::optional_json(response).await?;
        // The echo is advisory; a body we cannot decode is ignored.
        Ok(echoed.and_then(|v| wire::decode_notification(&v, Utc::now()).ok()))
    }

    async fn mark_all_read(&self) -> ApiResult<Option<u64>> {
        let url = self.url("/notifications/read-all")?;
        debug!("Marking all notifications read");
        let response = self.send(self.request(Method::POST, url)).await?;
        let parsed: Option<MarkAllReadResponse> = Self::optional_json(response).await?;
        Ok(parsed.and_then(|r| r.updated))
    }

    async fn delete(&self, id: &NotificationId) -> ApiResult<()> {
        let url = self.url("/notifications")?;
        let body = DeleteRequest {
            notification_id: id.clone(),
        };
        debug!(notification_id = %id, "Deleting notification");
        self.send(self.request(Method::DELETE, url).json(&body))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn api_for(server: &MockServer) -> HttpNotificationApi {
        let config = ApiConfig {
            base_url: server.base_url(),
            ..ApiConfig::default()
        };
        let session = SessionConfig {
            user_id: "u1".to_string(),
            token: "secret".to_string(),
        };
        HttpNotificationApi::new(&config, &session).expect("client")
    }

    #[tokio::test]
    async fn test_list_sends_pagination_and_token() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/notifications")
                    .query_param("page", "1")
                    .query_param("pageSize", "50")
                    .header("authorization", "Bearer secret");
                then.status(200).json_body(json!({
                    "items": [{
                        "id": "n1",
                        "message": "Visa approved",
                        "category": "applications",
                        "type": "success",
                        "isRead": false,
                        "createdAt": "2026-05-01T08:00:00Z"
                    }],
                    "page": 1,
                    "pageSize": 50,
                    "total": 1,
                    "unreadCount": 1
                }));
            })
            .await;

        let page = api_for(&server)
            .list(PageRequest::first(50))
            .await
            .expect("list");
        mock.assert_async().await;
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id.as_str(), "n1");
        assert_eq!(page.unread_count, Some(1));
    }

    #[tokio::test]
    async fn test_list_drops_only_undecodable_items() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/notifications");
                then.status(200).json_body(json!({
                    "items": [
                        { "id": 12, "message": "Interview booked", "category": "Applications", "type": "notice" },
                        { "id": "n2", "message": "Spam", "category": "promotions" },
                        { "id": "n3", "message": "Upload received", "category": "documents", "type": "success" }
                    ],
                    "page": 1,
                    "pageSize": 50
                }));
            })
            .await;

        let page = api_for(&server)
            .list(PageRequest::first(50))
            .await
            .expect("one bad item does not fail the page");
        let ids: Vec<&str> = page.items.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["12", "n3"]);
        assert_eq!(page.items[0].severity, visadesk_entity::NotificationSeverity::Info);
        assert_eq!(page.skipped, 1);
        assert_eq!(page.total, None);
        assert!(page.is_complete());
    }

    #[tokio::test]
    async fn test_mark_read_sends_camel_case_body() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(PUT)
                    .path("/notifications/read")
                    .json_body(json!({"notificationId": "n1", "isRead": true}));
                then.status(204);
            })
            .await;

        let result = api_for(&server)
            .mark_read(&NotificationId::from("n1"), true)
            .await
            .expect("mark read");
        mock.assert_async().await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_delete_maps_not_found() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(DELETE).path("/notifications");
                then.status(404).json_body(json!({"message": "gone"}));
            })
            .await;

        let err = api_for(&server)
            .delete(&NotificationId::from("n1"))
            .await
            .expect_err("should fail");
        assert_eq!(err, ApiError::NotFound("gone".to_string()));
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/notifications/read-all");
                then.status(401).body("expired");
            })
            .await;

        let err = api_for(&server)
            .mark_all_read()
            .await
            .expect_err("should fail");
        assert!(matches!(err, ApiError::Auth { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_server_error_is_classified() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/notifications");
                then.status(503).body("maintenance");
            })
            .await;

        let err = api_for(&server)
            .list(PageRequest::default())
            .await
            .expect_err("should fail");
        assert_eq!(
            err,
            ApiError::Server {
                status: 503,
                message: "maintenance".to_string()
            }
        );
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        let config = ApiConfig {
            base_url: "not a url".to_string(),
            ..ApiConfig::default()
        };
        let err = HttpNotificationApi::new(&config, &SessionConfig::default())
            .expect_err("should fail");
        assert!(matches!(err, ApiError::Configuration(_)));
    }
}
