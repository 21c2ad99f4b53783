//! Smart mailbox monitor.
//!
//! Polls discrete mailbox sensors (lid, bottom weight, tilt, reset button),
//! collects per-tick samples into a sliding window, infers a delivery from
//! consecutive-run thresholds and reports state transitions to Home
//! Assistant and ntfy, then waits for a manual reset before re-arming.

pub mod clock;
pub mod config;
pub mod controller;
pub mod error;
pub mod feedback;
pub mod hal;
pub mod net;
pub mod notify;
pub mod sensors;
pub mod sim;
