//! Mailbox sensor inputs.
//!
//! A [`DigitalSensor`] wraps one optional input line and yields a logical
//! boolean per polling tick. Per-tick readings are collected into immutable
//! [`Sample`]s, buffered by the [`SampleWindow`] and evaluated by the
//! [`DeliveryDetector`].

pub mod detector;
pub mod digital;
pub mod window;

pub use detector::DeliveryDetector;
pub use digital::DigitalSensor;
pub use window::SampleWindow;

use strum::Display;

/// The input lines a deployment may wire. Any subset is valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SensorId {
    Lid,
    Bottom,
    Tilt,
    Reset,
    Wake,
}

/// Immutable snapshot of all logical sensor values for one polling tick.
/// Absent sensors report `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub lid_open: bool,
    pub bottom_active: bool,
    pub tilt_active: bool,
    pub reset_active: bool,
    pub sequence: u64,
}

impl Sample {
    /// A sample with every signal inactive.
    pub fn idle(sequence: u64) -> Self {
        Self {
            lid_open: false,
            bottom_active: false,
            tilt_active: false,
            reset_active: false,
            sequence,
        }
    }
}
