use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;

use crate::config::ApiConfig;
use crate::error::{ClientError, Result};
use crate::notification::{
    AdminFilter, Notification, NotificationDraft, NotificationFilter, NotificationType,
};

use super::types::{
    BroadcastAudience, BroadcastReceipt, BroadcastRequest, NotificationPage, NotificationStats,
    RetryDeliveryResponse, UnreadCountResponse,
};
use super::{AdminNotificationApi, NotificationApi};

/// Error body shape returned by the notification service.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: String,
    message: String,
}

/// REST client for the notification service.
pub struct HttpNotificationApi {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpNotificationApi {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Convert a non-success response into a `ClientError`, preferring the
    /// server's error body when it parses.
    async fn error_from(&self, response: Response) -> ClientError {
        let status = response.status();
        let message = match response.json::<ErrorResponse>().await {
            Ok(body) => {
                tracing::debug!(code = %body.error.code, status = %status.as_u16(), "API error response");
                body.error.message
            }
            Err(_) => format!("Request failed with status {}", status),
        };

        if status == StatusCode::NOT_FOUND {
            ClientError::NotFound(message)
        } else {
            ClientError::Api {
                status: status.as_u16(),
                message,
            }
        }
    }

    async fn check(&self, response: Response) -> Result<Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(self.error_from(response).await)
        }
    }
}

fn list_params(page: u32, limit: u32, filter: &NotificationFilter) -> Vec<(&'static str, String)> {
    let mut params = vec![("page", page.to_string()), ("limit", limit.to_string())];
    if let Some(kind) = filter.kind {
        params.push(("type", kind.as_str().to_string()));
    }
    if let Some(read) = filter.read {
        params.push(("read", read.to_string()));
    }
    if let Some(start) = filter.start_date {
        params.push(("startDate", start.to_rfc3339()));
    }
    if let Some(end) = filter.end_date {
        params.push(("endDate", end.to_rfc3339()));
    }
    params
}

fn admin_list_params(page: u32, limit: u32, filter: &AdminFilter) -> Vec<(&'static str, String)> {
    let mut params = vec![("page", page.to_string()), ("limit", limit.to_string())];
    if let Some(kind) = filter.kind {
        params.push(("type", kind.as_str().to_string()));
    }
    if let Some(priority) = filter.priority {
        params.push(("priority", priority.as_str().to_string()));
    }
    if let Some(read) = filter.read {
        params.push(("read", read.to_string()));
    }
    if let Some(start) = filter.start_date {
        params.push(("startDate", start.to_rfc3339()));
    }
    if let Some(end) = filter.end_date {
        params.push(("endDate", end.to_rfc3339()));
    }
    if let Some(user_id) = &filter.user_id {
        params.push(("userId", user_id.clone()));
    }
    params
}

#[async_trait]
impl NotificationApi for HttpNotificationApi {
    async fn list(
        &self,
        page: u32,
        limit: u32,
        filter: &NotificationFilter,
    ) -> Result<NotificationPage> {
        let request = self
            .authorize(self.client.get(self.url("/notifications")))
            .query(&list_params(page, limit, filter));

        let response = self.check(request.send().await?).await?;
        Ok(response.json::<NotificationPage>().await?)
    }

    async fn mark_read(&self, id: &str) -> Result<Notification> {
        let request = self.authorize(
            self.client
                .patch(self.url(&format!("/notifications/{}/read", id))),
        );

        let response = self.check(request.send().await?).await?;
        Ok(response.json::<Notification>().await?)
    }

    async fn mark_all_read(&self, kind: Option<NotificationType>) -> Result<()> {
        let mut request = self.authorize(self.client.patch(self.url("/notifications/read-all")));
        if let Some(kind) = kind {
            request = request.query(&[("type", kind.as_str())]);
        }

        self.check(request.send().await?).await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let request = self.authorize(
            self.client
                .delete(self.url(&format!("/notifications/{}", id))),
        );

        self.check(request.send().await?).await?;
        Ok(())
    }

    async fn delete_all(&self) -> Result<()> {
        let request = self.authorize(self.client.delete(self.url("/notifications")));

        self.check(request.send().await?).await?;
        Ok(())
    }

    async fn unread_count(&self, kind: Option<NotificationType>) -> Result<u64> {
        let mut request = self.authorize(
            self.client
                .get(self.url("/notifications/unread-count")),
        );
        if let Some(kind) = kind {
            request = request.query(&[("type", kind.as_str())]);
        }

        let response = self.check(request.send().await?).await?;
        Ok(response.json::<UnreadCountResponse>().await?.count)
    }
}

#[async_trait]
impl AdminNotificationApi for HttpNotificationApi {
    async fn admin_list(
        &self,
        page: u32,
        limit: u32,
        filter: &AdminFilter,
    ) -> Result<NotificationPage> {
        let request = self
            .authorize(self.client.get(self.url("/admin/notifications")))
            .query(&admin_list_params(page, limit, filter));

        let response = self.check(request.send().await?).await?;
        Ok(response.json::<NotificationPage>().await?)
    }

    async fn broadcast(
        &self,
        draft: &NotificationDraft,
        audience: &BroadcastAudience,
    ) -> Result<BroadcastReceipt> {
        let body = BroadcastRequest {
            notification: draft.clone(),
            audience: audience.clone(),
        };
        let request = self
            .authorize(self.client.post(self.url("/admin/notifications")))
            .json(&body);

        let response = self.check(request.send().await?).await?;
        Ok(response.json::<BroadcastReceipt>().await?)
    }

    async fn admin_delete_all(&self) -> Result<()> {
        let request = self.authorize(self.client.delete(self.url("/admin/notifications")));

        self.check(request.send().await?).await?;
        Ok(())
    }

    async fn stats(&self) -> Result<NotificationStats> {
        let request = self.authorize(self.client.get(self.url("/admin/notifications/stats")));

        let response = self.check(request.send().await?).await?;
        Ok(response.json::<NotificationStats>().await?)
    }

    async fn retry_delivery(&self) -> Result<u64> {
        let request = self.authorize(
            self.client
                .post(self.url("/admin/notifications/retry-delivery")),
        );

        let response = self.check(request.send().await?).await?;
        Ok(response.json::<RetryDeliveryResponse>().await?.retried)
    }
}
