//! Simulated digital lines.
//!
//! Thread-safe stand-ins for real GPIO: an input line whose level can be set
//! from a simulation task, and an output line that records every level write
//! so feedback patterns (flashes, buzzes) can be inspected after the fact.

use super::{InputLine, OutputLine};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// Simulated input line with an externally settable level.
pub struct SimInputLine {
    level: AtomicBool,
}

impl SimInputLine {
    /// Create a line resting at the given electrical level. Lines behind
    /// pull-ups rest high.
    pub fn new(initial: bool) -> Self {
        Self {
            level: AtomicBool::new(initial),
        }
    }

    /// Drive the line to a level.
    pub fn set(&self, level: bool) {
        self.level.store(level, Ordering::SeqCst);
    }

    pub fn get(&self) -> bool {
        self.level.load(Ordering::SeqCst)
    }
}

impl InputLine for SimInputLine {
    fn read(&self) -> bool {
        self.level.load(Ordering::SeqCst)
    }
}

/// Simulated output line. Every write is appended to a transition log.
#[derive(Default)]
pub struct SimOutputLine {
    level: AtomicBool,
    transitions: Mutex<Vec<bool>>,
}

impl SimOutputLine {
    pub fn new() -> Self {
        Self::default()
    }

    /// All levels written to the line, in order.
    pub fn transitions(&self) -> Vec<bool> {
        self.transitions.lock().clone()
    }

    /// Number of high writes; a flash or buzz burst of N produces N of these.
    pub fn high_pulses(&self) -> usize {
        self.transitions.lock().iter().filter(|&&level| level).count()
    }

    fn write(&self, level: bool) {
        self.level.store(level, Ordering::SeqCst);
        self.transitions.lock().push(level);
    }
}

impl OutputLine for SimOutputLine {
    fn set_high(&self) {
        self.write(true);
    }

    fn set_low(&self) {
        self.write(false);
    }

    fn toggle(&self) {
        let old = self.level.load(Ordering::SeqCst);
        self.write(!old);
    }

    fn is_high(&self) -> bool {
        self.level.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_line_level() {
        let line = SimInputLine::new(true);
        assert!(line.read());
        line.set(false);
        assert!(!line.read());
    }

    #[test]
    fn test_output_line_records_writes() {
        let line = SimOutputLine::new();
        line.set_high();
        line.set_low();
        line.set_high();
        line.toggle();
        assert_eq!(line.transitions(), vec![true, false, true, false]);
        assert_eq!(line.high_pulses(), 2);
        assert!(!line.is_high());
    }
}
