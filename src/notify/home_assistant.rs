//! Home Assistant state-publish sink.
//!
//! Posts the mailbox state to the Home Assistant states API with
//! bearer-token authorization. The entity shows up as "Smart Mailbox".

use super::{NotificationEvent, NotificationSink};
use crate::config::HomeAssistantConfig;
use crate::error::{MailboxError, Result};
use async_trait::async_trait;
use log::{debug, info};
use reqwest::Client;
use serde_json::{Value, json};

pub struct HomeAssistantSink {
    config: HomeAssistantConfig,
    client: Client,
}

impl HomeAssistantSink {
    pub fn new(config: HomeAssistantConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    fn state_url(&self) -> String {
        format!("{}api/states/{}", self.config.url, self.config.entity_id)
    }

    fn request_body(&self, delivered: bool) -> Value {
        json!({
            "state": if delivered { 1 } else { 0 },
            "attributes": {
                "device_class": "enum",
                "friendly_name": "Smart Mailbox",
                "unit_of_measurement": "Mail in box",
                "state_class": null,
                "unique_id": self.config.unique_id,
            }
        })
    }
}

#[async_trait]
impl NotificationSink for HomeAssistantSink {
    fn name(&self) -> &'static str {
        "home-assistant"
    }

    fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    async fn publish(&self, event: &NotificationEvent) -> Result<()> {
        if !self.is_configured() {
            return Err(MailboxError::NotifierUnconfigured(self.name().to_string()));
        }

        let state = if event.delivered { 1 } else { 0 };
        info!("Publishing state {state} to Home Assistant");

        let response = self
            .client
            .post(self.state_url())
            .bearer_auth(&self.config.bearer_token)
            .json(&self.request_body(event.delivered))
            .send()
            .await
            .map_err(|e| MailboxError::NotifierTransportFailure(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MailboxError::NotifierTransportFailure(format!(
                "Home Assistant returned {status}"
            )));
        }
        debug!("Home Assistant accepted state {state} ({status})");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MIN_BEARER_TOKEN_LEN;

    fn configured() -> HomeAssistantConfig {
        HomeAssistantConfig {
            url: "http://homeassistant.local:8123/".to_string(),
            bearer_token: "t".repeat(MIN_BEARER_TOKEN_LEN),
            unique_id: "mailbox-1".to_string(),
            entity_id: "sensor.smart_mailbox".to_string(),
        }
    }

    #[test]
    fn test_state_url_joins_entity_id() {
        let sink = HomeAssistantSink::new(configured());
        assert_eq!(
            sink.state_url(),
            "http://homeassistant.local:8123/api/states/sensor.smart_mailbox"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let sink = HomeAssistantSink::new(configured());

        let body = sink.request_body(true);
        assert_eq!(body["state"], 1);
        assert_eq!(body["attributes"]["device_class"], "enum");
        assert_eq!(body["attributes"]["friendly_name"], "Smart Mailbox");
        assert_eq!(body["attributes"]["unit_of_measurement"], "Mail in box");
        assert_eq!(body["attributes"]["state_class"], Value::Null);
        assert_eq!(body["attributes"]["unique_id"], "mailbox-1");

        let body = sink.request_body(false);
        assert_eq!(body["state"], 0);
    }

    #[tokio::test]
    async fn test_unconfigured_publish_is_typed() {
        let sink = HomeAssistantSink::new(HomeAssistantConfig {
            url: "http://homeassistant.local:8123/".to_string(),
            bearer_token: "short".to_string(),
            unique_id: "mailbox-1".to_string(),
            entity_id: "sensor.smart_mailbox".to_string(),
        });
        assert!(!sink.is_configured());
        let result = sink.publish(&NotificationEvent::state(false)).await;
        assert!(matches!(
            result,
            Err(MailboxError::NotifierUnconfigured(_))
        ));
    }
}
