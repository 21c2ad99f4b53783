//! State-change notification fan-out.
//!
//! Two independent sinks, each optional based on configuration presence: a
//! structured state publish to Home Assistant and a plain-text ntfy push.
//! Each call makes a single submission attempt; the retry policy for the
//! mandatory startup state reset belongs to the controller.

pub mod home_assistant;
pub mod push;

pub use home_assistant::HomeAssistantSink;
pub use push::NtfySink;

use crate::config::Config;
use crate::error::Result;
use async_trait::async_trait;
use log::{error, warn};
use std::sync::Arc;

pub const MSG_DELIVERED: &str = "Mail has been delivered";
pub const MSG_NOT_DELIVERED: &str = "Mail has not been delivered";
pub const MSG_RESET: &str = "Mailbox has been reset";

/// A state transition headed for the sinks. Constructed at transitions and
/// not retained afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationEvent {
    pub delivered: bool,
    pub message: Option<String>,
}

impl NotificationEvent {
    /// Plain delivered / not-delivered state change.
    pub fn state(delivered: bool) -> Self {
        Self {
            delivered,
            message: None,
        }
    }

    /// Rearm announcement, distinct from the binary state.
    pub fn reset() -> Self {
        Self {
            delivered: false,
            message: Some(MSG_RESET.to_string()),
        }
    }

    /// Text for the push sink: the explicit message if any, else the fixed
    /// delivered / not-delivered string.
    pub fn push_text(&self) -> &str {
        match &self.message {
            Some(message) => message,
            None if self.delivered => MSG_DELIVERED,
            None => MSG_NOT_DELIVERED,
        }
    }
}

/// One external notification endpoint.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether the deployment supplied this sink's settings. Unconfigured
    /// sinks are skipped, never an error.
    fn is_configured(&self) -> bool;

    /// Single network submission attempt, no retry.
    async fn publish(&self, event: &NotificationEvent) -> Result<()>;
}

/// Fans one event out to every configured sink.
pub struct Notifier {
    sinks: Vec<Arc<dyn NotificationSink>>,
}

impl Notifier {
    pub fn new(sinks: Vec<Arc<dyn NotificationSink>>) -> Self {
        Self { sinks }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(vec![
            Arc::new(HomeAssistantSink::new(config.home_assistant.clone())),
            Arc::new(NtfySink::new(config.ntfy.clone())),
        ])
    }

    /// Names of sinks that will be skipped for missing configuration.
    pub fn unconfigured_sinks(&self) -> Vec<&'static str> {
        self.sinks
            .iter()
            .filter(|sink| !sink.is_configured())
            .map(|sink| sink.name())
            .collect()
    }

    /// Fire-and-forget announce: transport failures are logged, never
    /// propagated, and never block the caller's loop.
    pub async fn announce(&self, event: &NotificationEvent) {
        for sink in &self.sinks {
            if !sink.is_configured() {
                warn!("Sink {} is not configured, skipping", sink.name());
                continue;
            }
            if let Err(e) = sink.publish(event).await {
                error!("Notification via {} failed: {e}", sink.name());
            }
        }
    }

    /// Single attempt across all configured sinks; the first transport error
    /// propagates so the caller can apply its own retry policy.
    pub async fn try_announce(&self, event: &NotificationEvent) -> Result<()> {
        for sink in &self.sinks {
            if !sink.is_configured() {
                warn!("Sink {} is not configured, skipping", sink.name());
                continue;
            }
            sink.publish(event).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::error::MailboxError;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Records every published event; optionally reports itself unconfigured.
    pub struct RecordingSink {
        name: &'static str,
        configured: bool,
        events: Mutex<Vec<NotificationEvent>>,
    }

    impl RecordingSink {
        pub fn new(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                configured: true,
                events: Mutex::new(Vec::new()),
            })
        }

        pub fn unconfigured(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                configured: false,
                events: Mutex::new(Vec::new()),
            })
        }

        pub fn events(&self) -> Vec<NotificationEvent> {
            self.events.lock().clone()
        }
    }

    #[async_trait]
    impl NotificationSink for RecordingSink {
        fn name(&self) -> &'static str {
            self.name
        }

        fn is_configured(&self) -> bool {
            self.configured
        }

        async fn publish(&self, event: &NotificationEvent) -> Result<()> {
            self.events.lock().push(event.clone());
            Ok(())
        }
    }

    /// Fails every publish and counts the attempts.
    pub struct FailingSink {
        calls: AtomicU32,
    }

    impl FailingSink {
        pub fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicU32::new(0),
            })
        }

        pub fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl NotificationSink for FailingSink {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn is_configured(&self) -> bool {
            true
        }

        async fn publish(&self, _event: &NotificationEvent) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(MailboxError::NotifierTransportFailure(
                "connection refused".to_string(),
            ))
        }
    }
}
