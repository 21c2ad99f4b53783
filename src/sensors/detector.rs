//! Delivery detection over the sample window.
//!
//! Debouncing lives here, not at the sensor layer: a signal only counts once
//! it has been active on consecutive ticks. Each sample is compared to its
//! immediate predecessor only, never to an aggregate baseline.

use super::{Sample, SampleWindow};
use crate::config::DetectionConfig;

/// Evaluates the window for a delivered verdict using per-signal
/// consecutive-run counters.
///
/// Counter rule, per signal: an active-active pair increments the run; an
/// inactive current sample resets it; an inactive-to-active transition pair
/// leaves it untouched. An isolated one-tick activation therefore never
/// accumulates, and a signal alternating every tick never triggers. The run
/// threshold is in ticks, so the true hold-stable duration is
/// `threshold x sampling_interval`.
pub struct DeliveryDetector {
    tilt_threshold: u32,
    lid_threshold: u32,
    bottom_threshold: u32,
    min_samples: usize,
}

impl DeliveryDetector {
    pub fn new(
        tilt_threshold: u32,
        lid_threshold: u32,
        bottom_threshold: u32,
        min_samples: usize,
    ) -> Self {
        Self {
            tilt_threshold,
            lid_threshold,
            bottom_threshold,
            min_samples,
        }
    }

    pub fn from_config(detection: &DetectionConfig) -> Self {
        Self::new(
            detection.consecutive_tilt_sensor_active_needed_to_trigger,
            detection.consecutive_lid_open_needed_to_trigger,
            detection.consecutive_bottom_sensor_active_needed_to_trigger,
            detection.min_samples_to_evaluate,
        )
    }

    /// Walk the window oldest to newest and return the verdict. Short-circuits
    /// as soon as any one signal reaches its threshold; a freshly cleared
    /// window below the minimum sample count is never a delivery.
    pub fn evaluate(&self, window: &SampleWindow) -> bool {
        if window.len() < self.min_samples {
            return false;
        }

        let mut tilt_run: u32 = 0;
        let mut lid_run: u32 = 0;
        let mut bottom_run: u32 = 0;
        let mut previous: Option<&Sample> = None;

        for sample in window.iter() {
            let Some(prev) = previous else {
                previous = Some(sample);
                continue;
            };

            if sample.tilt_active && prev.tilt_active {
                tilt_run += 1;
            } else if !sample.tilt_active {
                tilt_run = 0;
            }
            if sample.lid_open && prev.lid_open {
                lid_run += 1;
            } else if !sample.lid_open {
                lid_run = 0;
            }
            if sample.bottom_active && prev.bottom_active {
                bottom_run += 1;
            } else if !sample.bottom_active {
                bottom_run = 0;
            }

            previous = Some(sample);

            if tilt_run >= self.tilt_threshold
                || lid_run >= self.lid_threshold
                || bottom_run >= self.bottom_threshold
            {
                return true;
            }
        }

        false
    }
}
