//! Mailbox controller.
//!
//! Owns the polling loop and every piece of mutable state: the sensors, the
//! sample window, the detector, the notifier and the feedback panel. One
//! logical thread of control; no transition can be preempted mid-action.

use crate::clock::Clock;
use crate::config::Config;
use crate::error::{MailboxError, Result, SIGNAL_CODE_NOTIFIER_FAILED};
use crate::feedback::FeedbackPanel;
use crate::net::WifiLink;
use crate::notify::{NotificationEvent, Notifier};
use crate::sensors::{DeliveryDetector, DigitalSensor, Sample, SampleWindow};
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;
use strum::Display;

/// Pause between reset-line polls once a delivery is pending. Detection is
/// deliberately blind while the pause runs; delivery is treated as a single
/// exclusive event until acknowledged.
const AWAIT_RESET_PAUSE: Duration = Duration::from_secs(10);
/// Pause increment; the wake line is checked between increments.
const PAUSE_STEP: Duration = Duration::from_secs(1);
const WIFI_POLL_DELAY: Duration = Duration::from_secs(1);
const STARTUP_NOTIFY_RETRY_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum MailboxState {
    Monitoring,
    Delivered,
    AwaitingReset,
}

/// The wired (or absent) mailbox input lines.
pub struct MailboxSensors {
    pub lid: DigitalSensor,
    pub bottom: DigitalSensor,
    pub tilt: DigitalSensor,
    pub reset: DigitalSensor,
    pub wake: DigitalSensor,
}

pub struct MailboxController {
    config: Config,
    sensors: MailboxSensors,
    window: SampleWindow,
    detector: DeliveryDetector,
    notifier: Notifier,
    feedback: FeedbackPanel,
    wifi: Box<dyn WifiLink>,
    clock: Arc<dyn Clock>,
    state: MailboxState,
    sequence: u64,
}

impl MailboxController {
    pub fn new(
        config: Config,
        sensors: MailboxSensors,
        notifier: Notifier,
        feedback: FeedbackPanel,
        wifi: Box<dyn WifiLink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let window = SampleWindow::new(config.detection.sliding_window_size);
        let detector = DeliveryDetector::from_config(&config.detection);
        Self {
            config,
            sensors,
            window,
            detector,
            notifier,
            feedback,
            wifi,
            clock,
            state: MailboxState::Monitoring,
            sequence: 0,
        }
    }

    pub fn state(&self) -> MailboxState {
        self.state
    }

    /// Full lifecycle: startup ceremony, then the polling loop. Only returns
    /// with a fatal error; the caller decides between restart and idle.
    pub async fn run(&mut self) -> Result<()> {
        self.startup().await?;
        loop {
            match self.state {
                MailboxState::Monitoring => {
                    self.clock
                        .sleep(self.config.detection.sampling_interval())
                        .await;
                    self.tick().await;
                }
                MailboxState::Delivered | MailboxState::AwaitingReset => {
                    self.low_power_pause(AWAIT_RESET_PAUSE).await;
                    self.check_reset().await;
                }
            }
        }
    }

    /// Startup ceremony: outputs low, light cycle, WiFi association, sensor
    /// presence check, then the mandatory state-reset notification. Every
    /// fatal path signals its code before returning.
    pub async fn startup(&mut self) -> Result<()> {
        self.feedback.all_low();
        self.feedback.cycle_lights(5).await;

        if let Err(e) = self.connect_wifi().await {
            self.feedback.signal_error(e.signal_code()).await;
            return Err(e);
        }

        self.log_sensor_presence();
        if !self.any_mailbox_sensor_present() {
            let e = MailboxError::NoSensorsConfigured;
            self.feedback.signal_error(e.signal_code()).await;
            return Err(e);
        }

        for name in self.notifier.unconfigured_sinks() {
            warn!("Notification sink {name} is not configured and will be skipped");
            self.feedback.signal_error(SIGNAL_CODE_NOTIFIER_FAILED).await;
        }

        self.startup_state_reset().await?;
        info!("Startup complete, monitoring mailbox");
        Ok(())
    }

    async fn connect_wifi(&mut self) -> Result<()> {
        if !self.config.wifi.is_configured() {
            return Err(MailboxError::ConfigurationMissing(
                "WiFi SSID and password".to_string(),
            ));
        }

        let ssid = self.config.wifi.ssid.clone();
        let password = self.config.wifi.password.clone();
        info!("Connecting to WiFi: {ssid}");
        self.wifi.begin(&ssid, &password).await;

        let mut attempts = 0;
        while !self.wifi.poll_connected() {
            debug!("Waiting for connection...");
            self.clock.sleep(WIFI_POLL_DELAY).await;
            self.feedback.toggle_onboard();
            attempts += 1;
            if attempts > self.config.wifi.max_connect_attempts {
                return Err(MailboxError::ConnectivityFailure { attempts });
            }
        }

        self.feedback.flash_onboard(5).await;
        self.feedback.set_onboard(true);
        self.feedback.buzz(5).await;
        info!("Connected to WiFi: {ssid}");
        Ok(())
    }

    fn log_sensor_presence(&self) {
        for sensor in [
            &self.sensors.lid,
            &self.sensors.bottom,
            &self.sensors.tilt,
            &self.sensors.reset,
            &self.sensors.wake,
        ] {
            info!(
                "  sensor {}: {}",
                sensor.id(),
                if sensor.is_present() { "wired" } else { "absent" }
            );
        }
    }

    /// The wake line does not count; a device with only a wake line has
    /// nothing to monitor.
    fn any_mailbox_sensor_present(&self) -> bool {
        self.sensors.lid.is_present()
            || self.sensors.bottom.is_present()
            || self.sensors.tilt.is_present()
            || self.sensors.reset.is_present()
    }

    /// Mandatory startup notification establishing "no mail" at the sinks.
    /// Retries with a fixed backoff; exhaustion is fatal and the polling
    /// loop is never entered.
    async fn startup_state_reset(&mut self) -> Result<()> {
        let event = NotificationEvent::state(false);
        let cap = self.config.startup_notify_attempts;
        let mut attempts = 0;
        loop {
            match self.notifier.try_announce(&event).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    attempts += 1;
                    if attempts > cap {
                        let err = MailboxError::NotifierStartupFailure { attempts };
                        self.feedback.signal_error(err.signal_code()).await;
                        return Err(err);
                    }
                    warn!("Startup state reset failed (attempt {attempts}/{cap}): {e}");
                    self.clock.sleep(STARTUP_NOTIFY_RETRY_DELAY).await;
                }
            }
        }
    }

    /// One monitoring tick: sample all sensors, apply the reset guard, push
    /// into the window and evaluate the verdict.
    pub async fn tick(&mut self) {
        let sample = self.sample_sensors();
        debug!("sample {sample:?}");

        if sample.reset_active {
            // No delivery pending in Monitoring; clearing the window is the
            // whole effect, and it is idempotent.
            info!("Reset observed while monitoring; clearing the sample window");
            self.window.clear();
        }

        self.window.push(sample);

        if self.state == MailboxState::Monitoring && self.detector.evaluate(&self.window) {
            self.on_delivered().await;
        }
    }

    fn sample_sensors(&mut self) -> Sample {
        let sample = Sample {
            lid_open: self.sensors.lid.read(),
            bottom_active: self.sensors.bottom.read(),
            tilt_active: self.sensors.tilt.read(),
            reset_active: self.sensors.reset.read(),
            sequence: self.sequence,
        };
        self.sequence += 1;
        sample
    }

    /// Fires exactly once per delivery cycle, on the false-to-true verdict.
    async fn on_delivered(&mut self) {
        info!(
            "Mail has been delivered ({} -> {})",
            MailboxState::Monitoring,
            MailboxState::Delivered
        );
        self.state = MailboxState::Delivered;
        self.feedback.buzz(5).await;
        self.notifier.announce(&NotificationEvent::state(true)).await;
        self.state = MailboxState::AwaitingReset;
        info!("Awaiting manual reset");
    }

    /// Reset-line poll while a delivery is pending. Also flashes the onboard
    /// LED as a mail-is-waiting heartbeat.
    pub async fn check_reset(&mut self) {
        self.feedback.flash_onboard(5).await;
        if self.sensors.reset.read() {
            self.rearm().await;
        }
    }

    /// Clear pending-delivery state and the window, announce the reset and
    /// resume normal polling cadence.
    async fn rearm(&mut self) {
        info!(
            "Mailbox reset; re-arming detection ({} -> {})",
            self.state,
            MailboxState::Monitoring
        );
        self.window.clear();
        self.state = MailboxState::Monitoring;
        self.notifier.announce(&NotificationEvent::reset()).await;
    }

    /// Coarse-grained pause in one-second increments. An active wake line
    /// ends the pause early; it flags readiness and carries no payload.
    async fn low_power_pause(&mut self, total: Duration) {
        let mut elapsed = Duration::ZERO;
        while elapsed < total {
            self.clock.sleep(PAUSE_STEP).await;
            elapsed += PAUSE_STEP;
            if self.sensors.wake.read() {
                debug!("Wake source active; resuming early");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::NullClock;
    use crate::hal::{InputLine, SimInputLine, SimOutputLine};
    use crate::net::SimWifiLink;
    use crate::notify::testing::{FailingSink, RecordingSink};
    use crate::notify::{MSG_RESET, NotificationSink};
    use crate::sensors::SensorId;

    struct Rig {
        controller: MailboxController,
        tilt: Arc<SimInputLine>,
        reset: Arc<SimInputLine>,
        wake: Arc<SimInputLine>,
        buzzer: Arc<SimOutputLine>,
        clock: Arc<NullClock>,
    }

    fn test_config() -> Config {
        let mut config = Config::default();
        config.wifi.ssid = "test-network".to_string();
        config.wifi.password = "test-password".to_string();
        config
    }

    fn rig_with_sinks(config: Config, sinks: Vec<Arc<dyn NotificationSink>>) -> Rig {
        let tilt = Arc::new(SimInputLine::new(false));
        let reset = Arc::new(SimInputLine::new(true));
        let wake = Arc::new(SimInputLine::new(false));
        let buzzer = Arc::new(SimOutputLine::new());
        let clock = Arc::new(NullClock::new());

        let sensors = MailboxSensors {
            lid: DigitalSensor::absent(SensorId::Lid),
            bottom: DigitalSensor::absent(SensorId::Bottom),
            tilt: DigitalSensor::new(
                SensorId::Tilt,
                Some(tilt.clone() as Arc<dyn InputLine>),
                false,
            ),
            reset: DigitalSensor::new(
                SensorId::Reset,
                Some(reset.clone() as Arc<dyn InputLine>),
                true,
            ),
            wake: DigitalSensor::new(
                SensorId::Wake,
                Some(wake.clone() as Arc<dyn InputLine>),
                false,
            ),
        };
        let feedback = FeedbackPanel::new(
            Arc::new(SimOutputLine::new()),
            Arc::new(SimOutputLine::new()),
            Arc::new(SimOutputLine::new()),
            Arc::new(SimOutputLine::new()),
            buzzer.clone(),
            clock.clone(),
        );
        let controller = MailboxController::new(
            config,
            sensors,
            Notifier::new(sinks),
            feedback,
            Box::new(SimWifiLink::up_after(2)),
            clock.clone(),
        );
        Rig {
            controller,
            tilt,
            reset,
            wake,
            buzzer,
            clock,
        }
    }

    #[tokio::test]
    async fn test_reset_while_monitoring_is_a_no_op() {
        let ha = RecordingSink::new("state");
        let push = RecordingSink::new("push");
        let mut rig = rig_with_sinks(test_config(), vec![ha.clone(), push.clone()]);

        // Reset line pulled low = pressed, empty window, Monitoring state.
        rig.reset.set(false);
        rig.controller.tick().await;

        assert_eq!(rig.controller.state(), MailboxState::Monitoring);
        assert!(ha.events().is_empty(), "no notification may fire");
        assert!(push.events().is_empty(), "no notification may fire");
        // The cleared window still receives the current sample.
        assert_eq!(rig.controller.window.len(), 1);
    }

    #[tokio::test]
    async fn test_delivery_cycle_end_to_end() {
        let ha = RecordingSink::new("state");
        let push = RecordingSink::new("push");
        let mut rig = rig_with_sinks(test_config(), vec![ha.clone(), push.clone()]);

        // Four idle ticks satisfy the minimum-window guard once the tilt
        // samples arrive.
        for _ in 0..4 {
            rig.controller.tick().await;
        }

        // Default tilt threshold is 5: the 6th consecutive active sample
        // makes the 5th active-active pair and flips the verdict.
        rig.tilt.set(true);
        for tick in 1..=5 {
            rig.controller.tick().await;
            assert_eq!(
                rig.controller.state(),
                MailboxState::Monitoring,
                "tick {tick} must not trigger yet"
            );
        }
        rig.controller.tick().await;

        assert_eq!(rig.controller.state(), MailboxState::AwaitingReset);
        let ha_events = ha.events();
        let push_events = push.events();
        assert_eq!(ha_events.len(), 1, "exactly one notification per sink");
        assert_eq!(push_events.len(), 1, "exactly one notification per sink");
        assert!(ha_events[0].delivered);
        assert!(push_events[0].delivered);
        assert_eq!(rig.buzzer.high_pulses(), 5, "delivery buzzer burst");

        // Detection stays off until the reset: further ticks change nothing.
        rig.controller.tick().await;
        assert_eq!(ha.events().len(), 1);

        // Owner presses the reset button (active-low line goes low).
        rig.reset.set(false);
        rig.controller.check_reset().await;

        assert_eq!(rig.controller.state(), MailboxState::Monitoring);
        assert!(rig.controller.window.is_empty());
        let ha_events = ha.events();
        assert_eq!(ha_events.len(), 2);
        assert!(!ha_events[1].delivered);
        assert_eq!(ha_events[1].message.as_deref(), Some(MSG_RESET));
        let push_events = push.events();
        assert_eq!(push_events[1].push_text(), MSG_RESET);
    }

    #[tokio::test]
    async fn test_startup_notify_exhaustion_is_fatal() {
        let failing = FailingSink::new();
        let mut rig = rig_with_sinks(test_config(), vec![failing.clone()]);

        let result = rig.controller.startup().await;

        assert!(matches!(
            result,
            Err(MailboxError::NotifierStartupFailure { attempts: 11 })
        ));
        // Attempt cap 10 means the 11th failure gives up.
        assert_eq!(failing.calls(), 11);
        // Fixed one-second backoff between attempts.
        assert!(rig.clock.total_slept() >= Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_startup_without_wifi_credentials_is_fatal() {
        let mut rig = rig_with_sinks(Config::default(), vec![]);
        let result = rig.controller.startup().await;
        assert!(matches!(
            result,
            Err(MailboxError::ConfigurationMissing(_))
        ));
    }

    #[tokio::test]
    async fn test_wifi_attempt_cap_is_fatal() {
        let mut rig = rig_with_sinks(test_config(), vec![]);
        rig.controller.wifi = Box::new(SimWifiLink::never());
        let result = rig.controller.startup().await;
        assert!(matches!(
            result,
            Err(MailboxError::ConnectivityFailure { attempts: 11 })
        ));
    }

    #[tokio::test]
    async fn test_no_sensors_wired_is_fatal() {
        let mut rig = rig_with_sinks(test_config(), vec![]);
        rig.controller.sensors = MailboxSensors {
            lid: DigitalSensor::absent(SensorId::Lid),
            bottom: DigitalSensor::absent(SensorId::Bottom),
            tilt: DigitalSensor::absent(SensorId::Tilt),
            reset: DigitalSensor::absent(SensorId::Reset),
            // A lone wake line is not a mailbox sensor.
            wake: DigitalSensor::new(
                SensorId::Wake,
                Some(rig.wake.clone() as Arc<dyn InputLine>),
                false,
            ),
        };
        let result = rig.controller.startup().await;
        assert!(matches!(result, Err(MailboxError::NoSensorsConfigured)));
    }

    #[tokio::test]
    async fn test_startup_succeeds_with_recording_sinks() {
        let ha = RecordingSink::new("state");
        let mut rig = rig_with_sinks(test_config(), vec![ha.clone()]);

        rig.controller.startup().await.expect("startup succeeds");

        // The mandatory startup call establishes "no mail".
        let events = ha.events();
        assert_eq!(events.len(), 1);
        assert!(!events[0].delivered);
        assert!(events[0].message.is_none());
        assert_eq!(rig.controller.state(), MailboxState::Monitoring);
    }

    #[tokio::test]
    async fn test_wake_line_shortens_the_pause() {
        let mut rig = rig_with_sinks(test_config(), vec![]);

        rig.wake.set(true);
        let before = rig.clock.total_slept();
        rig.controller.low_power_pause(AWAIT_RESET_PAUSE).await;
        assert_eq!(
            rig.clock.total_slept() - before,
            PAUSE_STEP,
            "active wake line ends the pause after one increment"
        );

        rig.wake.set(false);
        let before = rig.clock.total_slept();
        rig.controller.low_power_pause(AWAIT_RESET_PAUSE).await;
        assert_eq!(rig.clock.total_slept() - before, AWAIT_RESET_PAUSE);
    }

    #[tokio::test]
    async fn test_alternating_tilt_never_delivers() {
        let mut rig = rig_with_sinks(test_config(), vec![]);

        for tick in 0..120 {
            rig.tilt.set(tick % 2 == 0);
            rig.controller.tick().await;
        }
        assert_eq!(rig.controller.state(), MailboxState::Monitoring);
    }
}
