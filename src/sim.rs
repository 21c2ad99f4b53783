//! Simulation bench.
//!
//! Wires a controller to simulated lines so the whole monitor can run on a
//! development host. An agitator task plays the part of the postal worker:
//! occasional one-tick glitches, then a real delivery, then the owner
//! pressing reset.

use crate::clock::Clock;
use crate::config::Config;
use crate::controller::{MailboxController, MailboxSensors};
use crate::feedback::FeedbackPanel;
use crate::hal::{InputLine, SimInputLine, SimOutputLine};
use crate::net::SimWifiLink;
use crate::notify::Notifier;
use crate::sensors::{DigitalSensor, SensorId};
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Handles to the simulated input lines, exposed in logical terms (active /
/// pressed) so callers never deal with pull-up polarity.
pub struct SimBench {
    lid: Arc<SimInputLine>,
    bottom: Arc<SimInputLine>,
    tilt: Arc<SimInputLine>,
    reset: Arc<SimInputLine>,
    wake: Arc<SimInputLine>,
}

impl SimBench {
    fn new() -> Self {
        Self {
            // Lid and tilt rest low; bottom and reset sit behind pull-ups.
            lid: Arc::new(SimInputLine::new(false)),
            bottom: Arc::new(SimInputLine::new(true)),
            tilt: Arc::new(SimInputLine::new(false)),
            reset: Arc::new(SimInputLine::new(true)),
            wake: Arc::new(SimInputLine::new(false)),
        }
    }

    pub fn set_lid_open(&self, open: bool) {
        self.lid.set(open);
    }

    pub fn set_tilt_active(&self, active: bool) {
        self.tilt.set(active);
    }

    pub fn set_bottom_active(&self, active: bool) {
        self.bottom.set(!active);
    }

    pub fn press_reset(&self, pressed: bool) {
        self.reset.set(!pressed);
    }

    pub fn set_wake_active(&self, active: bool) {
        self.wake.set(active);
    }
}

/// Build a controller wired to simulated lines. Sensors whose pin is not
/// configured are left absent, exactly as on real hardware.
pub fn build_controller(config: Config, clock: Arc<dyn Clock>) -> (MailboxController, Arc<SimBench>) {
    let bench = Arc::new(SimBench::new());

    let line = |wired: bool, line: &Arc<SimInputLine>| -> Option<Arc<dyn InputLine>> {
        wired.then(|| line.clone() as Arc<dyn InputLine>)
    };

    let onboard = Arc::new(SimOutputLine::new());
    let green = Arc::new(SimOutputLine::new());
    let yellow = Arc::new(SimOutputLine::new());
    let red = Arc::new(SimOutputLine::new());
    let buzzer = Arc::new(SimOutputLine::new());

    let pins = &config.pins;
    let sensors = MailboxSensors {
        lid: DigitalSensor::new(
            SensorId::Lid,
            line(pins.sensor_lid_pin.is_some(), &bench.lid),
            false,
        )
        .with_indicator(yellow.clone()),
        bottom: DigitalSensor::new(
            SensorId::Bottom,
            line(pins.sensor_bottom_pin.is_some(), &bench.bottom),
            true,
        )
        .with_indicator(red.clone()),
        tilt: DigitalSensor::new(
            SensorId::Tilt,
            line(pins.sensor_tilt_pin.is_some(), &bench.tilt),
            false,
        )
        .with_indicator(green.clone()),
        reset: DigitalSensor::new(
            SensorId::Reset,
            line(pins.sensor_reset_pin.is_some(), &bench.reset),
            true,
        ),
        wake: DigitalSensor::new(
            SensorId::Wake,
            line(pins.wake_source_pin.is_some(), &bench.wake),
            false,
        ),
    };

    let notifier = Notifier::from_config(&config);
    let feedback = FeedbackPanel::new(onboard, green, yellow, red, buzzer, clock.clone());
    let wifi = Box::new(SimWifiLink::up_after(2));

    let controller = MailboxController::new(config, sensors, notifier, feedback, wifi, clock);
    (controller, bench)
}

/// Spawn the agitator: after `deliver_after`, hold the tilt and (sometimes)
/// lid lines active long enough to trigger, leave a parcel on the bottom
/// plate, then press reset long enough to be observed through the pause.
pub fn spawn_agitator(
    bench: Arc<SimBench>,
    seed: u64,
    deliver_after: Duration,
    tick: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut rng = StdRng::seed_from_u64(seed);
        loop {
            // Quiet phase with occasional one-tick glitches; these must
            // never accumulate a run.
            let glitch_ticks = deliver_after.as_millis() / tick.as_millis().max(1);
            for _ in 0..glitch_ticks {
                if rng.gen_bool(0.05) {
                    info!("[Sim] lid glitch");
                    bench.set_lid_open(true);
                    tokio::time::sleep(tick).await;
                    bench.set_lid_open(false);
                } else {
                    tokio::time::sleep(tick).await;
                }
            }

            info!("[Sim] dropping mail through the flap");
            let with_lid = rng.gen_bool(0.5);
            bench.set_tilt_active(true);
            bench.set_lid_open(with_lid);
            tokio::time::sleep(tick * 8).await;
            bench.set_tilt_active(false);
            bench.set_lid_open(false);
            bench.set_bottom_active(true);

            tokio::time::sleep(Duration::from_secs(30)).await;

            info!("[Sim] owner empties the mailbox and presses reset");
            bench.set_bottom_active(false);
            bench.press_reset(true);
            tokio::time::sleep(Duration::from_secs(12)).await;
            bench.press_reset(false);
        }
    })
}
