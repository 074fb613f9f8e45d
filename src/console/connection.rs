use std::collections::HashMap;

use futures::StreamExt;
use reqwest::StatusCode;
use tokio::sync::watch;

use super::error::ConsoleError;
use super::sse::{SseDecoder, SseFrame};
use crate::domain::notification::HubEvent;

type Handler = Box<dyn Fn(&HubEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Created,
    Listening,
    Disconnected,
}

/// An authenticated push connection to `GET /hub`. Built by
/// [`ConsoleClient::build_hub_with_token`](super::ConsoleClient::build_hub_with_token),
/// started with [`ConsoleClient::start_async`](super::ConsoleClient::start_async).
pub struct HubConnection {
    url: String,
    token: String,
    http: reqwest::Client,
    handlers: HashMap<&'static str, Vec<Handler>>,
    state: watch::Sender<ConnectionState>,
}

impl HubConnection {
    pub(crate) fn new(url: String, token: String, http: reqwest::Client) -> Self {
        let (state, _) = watch::channel(ConnectionState::Created);
        Self {
            url,
            token,
            http,
            handlers: HashMap::new(),
            state,
        }
    }

    /// Register `handler` for pushes named `event` (`notification`, `chat`
    /// or `message`). Several handlers per event run in registration order.
    pub fn on(
        &mut self,
        event: &'static str,
        handler: impl Fn(&HubEvent) + Send + Sync + 'static,
    ) -> &mut Self {
        self.handlers
            .entry(event)
            .or_default()
            .push(Box::new(handler));
        self
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Follow state changes from another task.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Listen until the server closes the stream or it fails.
    pub(crate) async fn listen(&self) -> Result<(), ConsoleError> {
        let response = self
            .http
            .get(&self.url)
            .bearer_auth(&self.token)
            .header("Accept", "text/event-stream")
            .send()
            .await
            .map_err(|e| self.fail(ConsoleError::Transport(e.to_string())))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(self.fail(ConsoleError::Authentication(format!(
                "hub refused the connection with {status}"
            ))));
        }
        if !status.is_success() {
            return Err(self.fail(ConsoleError::Api {
                status: status.as_u16(),
                message: "hub connection rejected".to_string(),
            }));
        }

        self.state.send_replace(ConnectionState::Listening);
        log::info!("Listening on {}", self.url);

        let mut body = response.bytes_stream();
        let mut decoder = SseDecoder::default();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| self.fail(ConsoleError::Transport(e.to_string())))?;
            for frame in decoder.push(&chunk) {
                self.dispatch(&frame);
            }
        }

        self.state.send_replace(ConnectionState::Disconnected);
        log::info!("Hub stream closed by server");
        Ok(())
    }

    fn dispatch(&self, frame: &SseFrame) {
        let event: HubEvent = match serde_json::from_str(&frame.data) {
            Ok(event) => event,
            Err(e) => {
                log::warn!("Skipping undecodable {} event: {}", frame.event, e);
                return;
            }
        };

        match self.handlers.get(event.name()) {
            Some(handlers) => handlers.iter().for_each(|handler| handler(&event)),
            None => log::debug!("No handler for {} event", event.name()),
        }
    }

    fn fail(&self, error: ConsoleError) -> ConsoleError {
        self.state.send_replace(ConnectionState::Disconnected);
        log::warn!("Hub connection failed: {}", error);
        error
    }
}
