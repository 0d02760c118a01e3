use crate::pitch::{Frequency, TonePlayer};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

/// Keeps every request so tests can inspect what would have sounded.
#[derive(Debug, Clone, Default)]
pub struct RecordingPlayer {
    played: Rc<RefCell<Vec<(Frequency, Duration, f64)>>>,
}

impl RecordingPlayer {
    pub fn played(&self) -> Vec<(Frequency, Duration, f64)> {
        self.played.borrow().clone()
    }
}

impl TonePlayer for RecordingPlayer {
    fn play(&self, frequency: Frequency, duration: Duration, volume: f64) {
        self.played.borrow_mut().push((frequency, duration, volume));
    }
}
