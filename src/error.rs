use thiserror::Error as ThisError;

/// Signal code flashed for missing WiFi credentials.
pub const SIGNAL_CODE_WIFI_NOT_CONFIGURED: u8 = 8;
/// Signal code flashed when WiFi association exhausts its attempt cap.
pub const SIGNAL_CODE_WIFI_NOT_CONNECTED: u8 = 2;
/// Signal code flashed for notifier failures.
pub const SIGNAL_CODE_NOTIFIER_FAILED: u8 = 4;
/// Signal code flashed when no mailbox inputs are wired.
pub const SIGNAL_CODE_NO_SENSORS: u8 = 6;

#[derive(ThisError, Debug)]
pub enum MailboxError {
    #[error("Configuration missing: {0}")]
    ConfigurationMissing(String),

    #[error("WiFi association failed after {attempts} attempts")]
    ConnectivityFailure { attempts: u32 },

    #[error("Notification sink not configured: {0}")]
    NotifierUnconfigured(String),

    #[error("Notification transport failure: {0}")]
    NotifierTransportFailure(String),

    #[error("Startup state reset failed after {attempts} attempts")]
    NotifierStartupFailure { attempts: u32 },

    #[error("No sensors are wired, nothing to monitor")]
    NoSensorsConfigured,

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    SerdeJsonError(#[from] serde_json::Error),
}

impl MailboxError {
    /// Numeric code signaled through the buzzer/LED burst pattern so a fatal
    /// failure is observable on the device without logs.
    pub fn signal_code(&self) -> u8 {
        match self {
            MailboxError::ConfigurationMissing(_) => SIGNAL_CODE_WIFI_NOT_CONFIGURED,
            MailboxError::ConnectivityFailure { .. } => SIGNAL_CODE_WIFI_NOT_CONNECTED,
            MailboxError::NotifierUnconfigured(_)
            | MailboxError::NotifierTransportFailure(_)
            | MailboxError::NotifierStartupFailure { .. } => SIGNAL_CODE_NOTIFIER_FAILED,
            MailboxError::NoSensorsConfigured => SIGNAL_CODE_NO_SENSORS,
            _ => 1,
        }
    }

    /// Whether this error ends the process (or, for a sensorless device,
    /// parks it in an idle loop). Non-fatal kinds are logged and dropped.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            MailboxError::NotifierUnconfigured(_) | MailboxError::NotifierTransportFailure(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, MailboxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_codes_match_taxonomy() {
        assert_eq!(
            MailboxError::ConfigurationMissing("wifi".into()).signal_code(),
            8
        );
        assert_eq!(
            MailboxError::ConnectivityFailure { attempts: 11 }.signal_code(),
            2
        );
        assert_eq!(
            MailboxError::NotifierStartupFailure { attempts: 11 }.signal_code(),
            4
        );
        assert_eq!(MailboxError::NoSensorsConfigured.signal_code(), 6);
    }

    #[test]
    fn test_transport_failures_are_non_fatal() {
        assert!(!MailboxError::NotifierTransportFailure("timeout".into()).is_fatal());
        assert!(!MailboxError::NotifierUnconfigured("ntfy".into()).is_fatal());
        assert!(MailboxError::NotifierStartupFailure { attempts: 11 }.is_fatal());
        assert!(MailboxError::NoSensorsConfigured.is_fatal());
    }
}
