//! WiFi association seam.
//!
//! The controller only needs to start an association and poll whether the
//! link is up; everything radio-specific stays behind this trait. The
//! simulated link stands in on hosts without a managed WLAN interface.

use async_trait::async_trait;
use log::info;

#[async_trait]
pub trait WifiLink: Send {
    /// Begin association with the given credentials. Non-blocking; progress
    /// is observed through `poll_connected`.
    async fn begin(&mut self, ssid: &str, password: &str);

    /// Whether the link has come up since `begin`.
    fn poll_connected(&mut self) -> bool;
}

/// Simulated link that comes up after a fixed number of polls.
pub struct SimWifiLink {
    polls_until_up: u32,
    started: bool,
}

impl SimWifiLink {
    pub fn up_after(polls_until_up: u32) -> Self {
        Self {
            polls_until_up,
            started: false,
        }
    }

    /// A link that never associates; exercises the attempt cap.
    pub fn never() -> Self {
        Self::up_after(u32::MAX)
    }
}

#[async_trait]
impl WifiLink for SimWifiLink {
    async fn begin(&mut self, ssid: &str, _password: &str) {
        info!("[Sim] associating with WiFi network {ssid}");
        self.started = true;
    }

    fn poll_connected(&mut self) -> bool {
        if !self.started {
            return false;
        }
        if self.polls_until_up == 0 {
            return true;
        }
        self.polls_until_up -= 1;
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sim_link_comes_up_after_polls() {
        let mut link = SimWifiLink::up_after(2);
        assert!(!link.poll_connected(), "not started yet");

        link.begin("test-network", "secret").await;
        assert!(!link.poll_connected());
        assert!(!link.poll_connected());
        assert!(link.poll_connected());
        assert!(link.poll_connected());
    }
}
