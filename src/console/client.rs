use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use super::connection::HubConnection;
use super::error::ConsoleError;
use crate::handlers::notifications::{
    NotificationRequest, NotificationResponse, ReadAllResponse, ReadResponse,
};

/// Supplies the caller's current access token, if there is one.
pub trait TokenSource: Send + Sync {
    fn access_token(&self) -> Option<String>;
}

/// A token fixed at construction.
#[derive(Debug, Clone, Default)]
pub struct StaticToken(Option<String>);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Some(token.into()))
    }

    /// A source that never has a token.
    pub fn none() -> Self {
        Self(None)
    }
}

impl TokenSource for StaticToken {
    fn access_token(&self) -> Option<String> {
        self.0.clone().filter(|t| !t.is_empty())
    }
}

/// Client for the notification hub and its pull fallback.
pub struct ConsoleClient {
    base_url: String,
    http: Client,
    tokens: Arc<dyn TokenSource>,
}

impl ConsoleClient {
    pub fn new(
        base_url: impl Into<String>,
        tokens: Arc<dyn TokenSource>,
    ) -> Result<Self, ConsoleError> {
        // No overall timeout: the hub stream stays open indefinitely.
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
            tokens,
        })
    }

    /// A hub connection carrying the current access token.
    pub fn build_hub_with_token(&self) -> Result<HubConnection, ConsoleError> {
        Ok(HubConnection::new(
            self.url("/hub"),
            self.token()?,
            self.http.clone(),
        ))
    }

    /// Open `connection` and dispatch pushes to its handlers until the stream
    /// ends. Reconnecting is up to the caller.
    pub async fn start_async(&self, connection: &HubConnection) -> Result<(), ConsoleError> {
        connection.listen().await
    }

    pub async fn get_notifications_by_user_jwt(
        &self,
    ) -> Result<Vec<NotificationResponse>, ConsoleError> {
        self.send(self.http.get(self.url("/notifications"))).await
    }

    pub async fn read_noti(&self, id: Uuid) -> Result<bool, ConsoleError> {
        let path = format!("/notifications/{id}/read");
        let response: ReadResponse = self.send(self.http.put(self.url(&path))).await?;
        Ok(response.updated)
    }

    pub async fn read_all_noti(&self) -> Result<usize, ConsoleError> {
        let response: ReadAllResponse = self
            .send(self.http.put(self.url("/notifications/read-all")))
            .await?;
        Ok(response.count)
    }

    pub async fn send_noti_all_admin(
        &self,
        notification: &NotificationRequest,
    ) -> Result<NotificationResponse, ConsoleError> {
        self.send(
            self.http
                .post(self.url("/notifications/admins"))
                .json(notification),
        )
        .await
    }

    pub async fn send_noti_user_id(
        &self,
        notification: &NotificationRequest,
        user_id: Uuid,
    ) -> Result<NotificationResponse, ConsoleError> {
        let path = format!("/notifications/users/{user_id}");
        self.send(self.http.post(self.url(&path)).json(notification))
            .await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn token(&self) -> Result<String, ConsoleError> {
        self.tokens
            .access_token()
            .ok_or_else(|| ConsoleError::Authentication("no access token available".to_string()))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ConsoleError> {
        let response = request.bearer_auth(self.token()?).send().await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ConsoleError::Authentication(error_message(response).await));
        }
        if !status.is_success() {
            return Err(ConsoleError::Api {
                status: status.as_u16(),
                message: error_message(response).await,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ConsoleError::Decode(e.to_string()))
    }
}

/// The `error` field of a JSON error body, or the raw body.
async fn error_message(response: reqwest::Response) -> String {
    let status = response.status();
    match response.text().await {
        Ok(body) => serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
            .unwrap_or(body),
        Err(_) => format!("HTTP {status}"),
    }
}
