//! Sinks for chat announcements.

use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;

use crate::{
    dto::sse::{AnnouncementEvent, ServerEvent},
    state::SseHub,
};

/// Failures while delivering an announcement.
#[derive(Debug, Error)]
pub enum AnnounceError {
    /// Building the HTTP client failed.
    #[error("failed to build announcement client")]
    ClientBuilder(#[source] reqwest::Error),
    /// The announcement payload could not be serialised.
    #[error("failed to serialise announcement")]
    Encode(#[from] serde_json::Error),
    /// The relay could not be reached.
    #[error("failed to reach announcement relay")]
    Send(#[source] reqwest::Error),
    /// The relay rejected the announcement.
    #[error("announcement relay answered with status {0}")]
    Status(reqwest::StatusCode),
}

/// Destination for plain-text chat announcements.
pub trait Announcer: Send + Sync {
    /// Deliver `message`.
    fn announce(&self, message: String) -> BoxFuture<'static, Result<(), AnnounceError>>;
}

/// Publishes announcements on the `/sse/announcements` stream.
pub struct SseAnnouncer {
    hub: Arc<SseHub>,
}

impl SseAnnouncer {
    /// Announce through `hub`.
    pub fn new(hub: Arc<SseHub>) -> Self {
        Self { hub }
    }
}

impl Announcer for SseAnnouncer {
    fn announce(&self, message: String) -> BoxFuture<'static, Result<(), AnnounceError>> {
        let result = ServerEvent::json(
            Some("announcement".to_string()),
            &AnnouncementEvent::new(message),
        )
        .map(|event| {
            self.hub.broadcast(event);
        })
        .map_err(AnnounceError::from);
        Box::pin(async move { result })
    }
}

#[derive(Serialize)]
struct WebhookPayload {
    message: String,
}

/// POSTs announcements to a relay bridging into the chat network.
pub struct WebhookAnnouncer {
    client: Client,
    url: Arc<str>,
}

impl WebhookAnnouncer {
    /// Relay announcements to `url`, failing requests after `timeout`.
    pub fn new(url: &str, timeout: Duration) -> Result<Self, AnnounceError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(AnnounceError::ClientBuilder)?;
        Ok(Self {
            client,
            url: Arc::from(url),
        })
    }
}

impl Announcer for WebhookAnnouncer {
    fn announce(&self, message: String) -> BoxFuture<'static, Result<(), AnnounceError>> {
        let request = self
            .client
            .post(self.url.as_ref())
            .json(&WebhookPayload { message });
        Box::pin(async move {
            let response = request.send().await.map_err(AnnounceError::Send)?;
            if response.status().is_success() {
                Ok(())
            } else {
                Err(AnnounceError::Status(response.status()))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sse_announcer_publishes_event() {
        let hub = Arc::new(SseHub::new(4));
        let mut receiver = hub.subscribe();
        let announcer = SseAnnouncer::new(hub);

        announcer
            .announce("Switching servers".to_string())
            .await
            .unwrap();

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.event.as_deref(), Some("announcement"));
        assert!(event.data.contains("Switching servers"));
    }
}
