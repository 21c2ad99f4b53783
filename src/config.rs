use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Placeholder used by unset string settings.
pub const NOT_SET: &str = "not_set";

/// Home Assistant long-lived access tokens are far longer than this; anything
/// shorter is treated as a placeholder left in the settings.
pub const MIN_BEARER_TOKEN_LEN: usize = 40;

/// Load environment variables from .env file with robust parsing.
/// Handles values with spaces without requiring quotes.
pub fn load_dotenv() {
    let env_path = Path::new(".env");
    if !env_path.exists() {
        return;
    }

    let content = match fs::read_to_string(env_path) {
        Ok(c) => c,
        Err(_) => return,
    };

    for line in content.lines() {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        // Find the first '=' and split there
        if let Some(eq_pos) = line.find('=') {
            let key = line[..eq_pos].trim();
            let mut value = line[eq_pos + 1..].trim();

            // Remove surrounding quotes if present
            if (value.starts_with('"') && value.ends_with('"'))
                || (value.starts_with('\'') && value.ends_with('\''))
            {
                value = &value[1..value.len() - 1];
            }

            // Only set if not already set (env vars take precedence)
            if std::env::var(key).is_err() {
                // SAFETY: We're single-threaded at this point (called before any async runtime)
                unsafe { std::env::set_var(key, value) };
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub wifi: WifiConfig,
    pub home_assistant: HomeAssistantConfig,
    pub ntfy: NtfyConfig,
    pub pins: PinConfig,
    pub detection: DetectionConfig,
    /// Attempt cap for the mandatory startup state-reset notification.
    pub startup_notify_attempts: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WifiConfig {
    pub ssid: String,
    pub password: String,
    pub max_connect_attempts: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomeAssistantConfig {
    pub url: String,
    pub bearer_token: String,
    pub unique_id: String,
    pub entity_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NtfyConfig {
    pub topic: String,
}

/// Input line assignments. A `None` pin means the sensor is not wired; it
/// reads as inactive and is excluded from the no-sensors check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PinConfig {
    pub sensor_bottom_pin: Option<u8>,
    pub sensor_tilt_pin: Option<u8>,
    pub sensor_lid_pin: Option<u8>,
    pub sensor_reset_pin: Option<u8>,
    pub wake_source_pin: Option<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    pub consecutive_tilt_sensor_active_needed_to_trigger: u32,
    pub consecutive_lid_open_needed_to_trigger: u32,
    pub consecutive_bottom_sensor_active_needed_to_trigger: u32,
    pub sliding_window_size: usize,
    pub min_samples_to_evaluate: usize,
    /// Seconds between polling ticks.
    pub sampling_interval: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            wifi: WifiConfig {
                ssid: "ssid_not_set".to_string(),
                password: "wifi_password_not_set".to_string(),
                max_connect_attempts: 10,
            },
            home_assistant: HomeAssistantConfig {
                url: "http://homeassistant.local:8123/".to_string(),
                bearer_token: NOT_SET.to_string(),
                unique_id: NOT_SET.to_string(),
                entity_id: NOT_SET.to_string(),
            },
            ntfy: NtfyConfig {
                topic: NOT_SET.to_string(),
            },
            pins: PinConfig {
                sensor_bottom_pin: Some(12),
                sensor_tilt_pin: Some(11),
                sensor_lid_pin: Some(10),
                sensor_reset_pin: Some(9),
                wake_source_pin: Some(2),
            },
            detection: DetectionConfig {
                consecutive_tilt_sensor_active_needed_to_trigger: 5,
                consecutive_lid_open_needed_to_trigger: 10,
                consecutive_bottom_sensor_active_needed_to_trigger: 10,
                sliding_window_size: 60,
                min_samples_to_evaluate: 10,
                sampling_interval: 0.5,
            },
            startup_notify_attempts: 10,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(ssid) = std::env::var("WIFI_SSID") {
            config.wifi.ssid = ssid;
        }
        if let Ok(password) = std::env::var("WIFI_PASSWORD") {
            config.wifi.password = password;
        }
        if let Ok(attempts) = std::env::var("MAX_WIFI_CONNECT_ATTEMPTS_BEFORE_RESETTING_DEVICE")
            && let Ok(n) = attempts.parse()
        {
            config.wifi.max_connect_attempts = n;
        }

        if let Ok(url) = std::env::var("HOME_ASSISTANT_URL") {
            config.home_assistant.url = url;
        }
        if let Ok(token) = std::env::var("HOME_ASSISTANT_BEARER_TOKEN") {
            config.home_assistant.bearer_token = token;
        }
        if let Ok(unique_id) = std::env::var("HOME_ASSISTANT_UNIQUE_ID") {
            config.home_assistant.unique_id = unique_id;
        }
        if let Ok(entity_id) = std::env::var("HOME_ASSISTANT_ENTITY_ID") {
            config.home_assistant.entity_id = entity_id;
        }

        if let Ok(topic) = std::env::var("NTFY_TOPIC") {
            config.ntfy.topic = topic;
        }

        if let Ok(pin) = std::env::var("SENSOR_BOTTOM_PIN") {
            config.pins.sensor_bottom_pin = parse_pin(&pin);
        }
        if let Ok(pin) = std::env::var("SENSOR_TILT_PIN") {
            config.pins.sensor_tilt_pin = parse_pin(&pin);
        }
        if let Ok(pin) = std::env::var("SENSOR_LID_PIN") {
            config.pins.sensor_lid_pin = parse_pin(&pin);
        }
        if let Ok(pin) = std::env::var("SENSOR_RESET_PIN") {
            config.pins.sensor_reset_pin = parse_pin(&pin);
        }
        if let Ok(pin) = std::env::var("WAKE_SOURCE_PIN") {
            config.pins.wake_source_pin = parse_pin(&pin);
        }

        if let Ok(count) = std::env::var("CONSECUTIVE_TILT_SENSOR_ACTIVE_NEEDED_TO_TRIGGER")
            && let Ok(n) = count.parse()
        {
            config.detection.consecutive_tilt_sensor_active_needed_to_trigger = n;
        }
        if let Ok(count) = std::env::var("CONSECUTIVE_LID_OPEN_NEEDED_TO_TRIGGER")
            && let Ok(n) = count.parse()
        {
            config.detection.consecutive_lid_open_needed_to_trigger = n;
        }
        if let Ok(count) = std::env::var("CONSECUTIVE_BOTTOM_SENSOR_ACTIVE_NEEDED_TO_TRIGGER")
            && let Ok(n) = count.parse()
        {
            config.detection.consecutive_bottom_sensor_active_needed_to_trigger = n;
        }
        if let Ok(size) = std::env::var("SLIDING_WINDOW_SIZE")
            && let Ok(n) = size.parse()
        {
            config.detection.sliding_window_size = n;
        }
        if let Ok(count) = std::env::var("MIN_SAMPLES_TO_EVALUATE")
            && let Ok(n) = count.parse()
        {
            config.detection.min_samples_to_evaluate = n;
        }
        if let Ok(interval) = std::env::var("SAMPLING_INTERVAL")
            && let Ok(secs) = interval.parse()
        {
            config.detection.sampling_interval = secs;
        }

        if let Ok(attempts) = std::env::var("STARTUP_NOTIFY_ATTEMPTS")
            && let Ok(n) = attempts.parse()
        {
            config.startup_notify_attempts = n;
        }

        config
    }
}

impl WifiConfig {
    /// Credentials still carry their placeholders until the operator sets them.
    pub fn is_configured(&self) -> bool {
        self.ssid != "ssid_not_set" && self.password != "wifi_password_not_set"
    }
}

impl HomeAssistantConfig {
    /// A token shorter than a real long-lived access token, or equal to the
    /// placeholder, counts as not configured. Same for the identifiers.
    pub fn is_configured(&self) -> bool {
        self.bearer_token != NOT_SET
            && self.bearer_token.len() >= MIN_BEARER_TOKEN_LEN
            && self.unique_id != NOT_SET
            && self.entity_id != NOT_SET
            && !self.url.is_empty()
    }
}

impl NtfyConfig {
    pub fn is_configured(&self) -> bool {
        self.topic != NOT_SET && !self.topic.is_empty()
    }
}

impl DetectionConfig {
    pub fn sampling_interval(&self) -> Duration {
        Duration::from_secs_f64(self.sampling_interval)
    }
}

fn parse_pin(value: &str) -> Option<u8> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("none") {
        return None;
    }
    value.parse().ok()
}
