//! ntfy push sink.
//!
//! Posts a short human-readable string to a named ntfy topic. No auth; the
//! topic name is the only secret.

use super::{NotificationEvent, NotificationSink};
use crate::config::NtfyConfig;
use crate::error::{MailboxError, Result};
use async_trait::async_trait;
use log::{debug, info};
use reqwest::Client;

pub const NTFY_BASE_URL: &str = "https://ntfy.sh";

pub struct NtfySink {
    config: NtfyConfig,
    base_url: String,
    client: Client,
}

impl NtfySink {
    pub fn new(config: NtfyConfig) -> Self {
        Self {
            config,
            base_url: NTFY_BASE_URL.to_string(),
            client: Client::new(),
        }
    }

    /// Point the sink at a different ntfy server (self-hosted instances).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn topic_url(&self) -> String {
        format!("{}/{}", self.base_url, self.config.topic)
    }
}

#[async_trait]
impl NotificationSink for NtfySink {
    fn name(&self) -> &'static str {
        "ntfy"
    }

    fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    async fn publish(&self, event: &NotificationEvent) -> Result<()> {
        if !self.is_configured() {
            return Err(MailboxError::NotifierUnconfigured(self.name().to_string()));
        }

        let text = event.push_text().to_string();
        info!("Pushing to ntfy topic {}: {text}", self.config.topic);

        let response = self
            .client
            .post(self.topic_url())
            .body(text)
            .send()
            .await
            .map_err(|e| MailboxError::NotifierTransportFailure(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MailboxError::NotifierTransportFailure(format!(
                "ntfy returned {status}"
            )));
        }
        debug!("ntfy accepted push ({status})");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NOT_SET;
    use crate::notify::Notifier;
    use std::sync::Arc;

    #[test]
    fn test_topic_url() {
        let sink = NtfySink::new(NtfyConfig {
            topic: "mailbox-alerts".to_string(),
        });
        assert_eq!(sink.topic_url(), "https://ntfy.sh/mailbox-alerts");

        let sink = sink.with_base_url("http://ntfy.lan:8080");
        assert_eq!(sink.topic_url(), "http://ntfy.lan:8080/mailbox-alerts");
    }

    #[test]
    fn test_placeholder_topic_is_unconfigured() {
        let sink = NtfySink::new(NtfyConfig {
            topic: NOT_SET.to_string(),
        });
        assert!(!sink.is_configured());
    }

    #[tokio::test]
    async fn test_unconfigured_topic_never_reaches_the_network() {
        // The notifier skips the sink before any request is built; the
        // announce completes immediately and without error.
        let sink = Arc::new(NtfySink::new(NtfyConfig {
            topic: NOT_SET.to_string(),
        }));
        let notifier = Notifier::new(vec![sink]);

        notifier.announce(&NotificationEvent::state(true)).await;
        let result = notifier.try_announce(&NotificationEvent::state(true)).await;
        assert!(result.is_ok());
    }
}
