//! LED and buzzer feedback.
//!
//! Cosmetic signals only, plus the one load-bearing pattern: fatal errors are
//! flashed as a numeric burst so a failure is observable without logs.

use crate::clock::Clock;
use crate::hal::OutputLine;
use log::debug;
use std::sync::Arc;
use std::time::Duration;

const FLASH_DURATION: Duration = Duration::from_millis(100);
const SLOW_FLASH_DURATION: Duration = Duration::from_secs(1);
const BUZZ_DURATION: Duration = Duration::from_millis(100);
const CYCLE_STEP: Duration = Duration::from_millis(100);

pub struct FeedbackPanel {
    onboard: Arc<dyn OutputLine>,
    green: Arc<dyn OutputLine>,
    yellow: Arc<dyn OutputLine>,
    red: Arc<dyn OutputLine>,
    buzzer: Arc<dyn OutputLine>,
    clock: Arc<dyn Clock>,
}

impl FeedbackPanel {
    pub fn new(
        onboard: Arc<dyn OutputLine>,
        green: Arc<dyn OutputLine>,
        yellow: Arc<dyn OutputLine>,
        red: Arc<dyn OutputLine>,
        buzzer: Arc<dyn OutputLine>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            onboard,
            green,
            yellow,
            red,
            buzzer,
            clock,
        }
    }

    /// Drive every output low; startup baseline.
    pub fn all_low(&self) {
        for line in [
            &self.onboard,
            &self.green,
            &self.yellow,
            &self.red,
            &self.buzzer,
        ] {
            line.set_low();
        }
    }

    pub fn set_onboard(&self, high: bool) {
        if high {
            self.onboard.set_high();
        } else {
            self.onboard.set_low();
        }
    }

    pub fn toggle_onboard(&self) {
        self.onboard.toggle();
    }

    pub async fn flash_onboard(&self, flashes: u32) {
        self.flash(&self.onboard, flashes, FLASH_DURATION).await;
    }

    async fn slow_flash_onboard(&self, flashes: u32) {
        self.flash(&self.onboard, flashes, SLOW_FLASH_DURATION).await;
    }

    async fn flash(&self, line: &Arc<dyn OutputLine>, flashes: u32, duration: Duration) {
        debug!("flashing led: {flashes} times for {duration:?} each");
        for _ in 0..flashes {
            line.set_high();
            self.clock.sleep(duration).await;
            line.set_low();
        }
    }

    pub async fn buzz(&self, buzzes: u32) {
        debug!("buzzing the buzzer: {buzzes} times");
        for _ in 0..buzzes {
            self.buzzer.set_high();
            self.clock.sleep(BUZZ_DURATION).await;
            self.buzzer.set_low();
        }
    }

    /// Startup light show: toggle the LEDs forward then back.
    pub async fn cycle_lights(&self, cycles: u32) {
        for cycle in 0..cycles {
            debug!("toggling lights: {cycle}/{cycles}");
            let leds = [&self.onboard, &self.green, &self.yellow, &self.red];
            for led in leds {
                led.toggle();
                self.clock.sleep(CYCLE_STEP).await;
            }
            for led in leds.into_iter().rev() {
                led.toggle();
                self.clock.sleep(CYCLE_STEP).await;
            }
        }
    }

    /// Audible/visual fatal pattern: two buzzes, five fast flashes, two
    /// buzzes, then `code` slow flashes. Burst count = error code.
    pub async fn signal_error(&self, code: u8) {
        debug!("signaling error code: {code}");
        self.buzz(2).await;
        self.flash_onboard(5).await;
        self.buzz(2).await;
        self.slow_flash_onboard(code as u32).await;
    }
}
