use parking_lot::RwLock;
use rodio::source::SineWave;
use rodio::{OutputStream, OutputStreamHandle, Sink, Source};
use sectors::{Frequency, TonePlayer};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Peak amplitude of a tone at volume 1.0.
pub const BASE_GAIN: f32 = 0.1;
/// Largest loudness boost a low tone gets.
pub const MAX_VOLUME: f64 = 5.0;

/// Plays sine tones on the default output device.
///
/// The device is opened on a thread of its own that lives as long as the process.
/// Until it is ready (or if there is no device at all) requests are dropped.
#[derive(Clone, Default)]
pub struct SinePlayer {
    handle: Arc<RwLock<Option<OutputStreamHandle>>>,
}

impl SinePlayer {
    pub fn spawn() -> Self {
        let player = Self::default();
        let slot = player.handle.clone();

        thread::spawn(move || {
            let _stream = match OutputStream::try_default() {
                Ok((stream, handle)) => {
                    *slot.write() = Some(handle);
                    log::info!("Audio output ready");
                    stream
                }
                Err(e) => {
                    log::warn!("No audio output, tones are disabled: {}", e);
                    return;
                }
            };

            loop {
                thread::park();
            }
        });

        player
    }

    pub fn is_ready(&self) -> bool {
        self.handle.read().is_some()
    }
}

pub fn gain(volume: f64) -> f32 {
    BASE_GAIN * volume.clamp(0.0, MAX_VOLUME) as f32
}

impl TonePlayer for SinePlayer {
    fn play(&self, frequency: Frequency, duration: Duration, volume: f64) {
        let guard = self.handle.read();
        let Some(handle) = guard.as_ref() else {
            log::debug!("Audio not ready, skipping {}", frequency);
            return;
        };

        match Sink::try_new(handle) {
            Ok(sink) => {
                let source = SineWave::new(frequency.hz() as f32)
                    .take_duration(duration)
                    .amplify(gain(volume));
                sink.append(source);
                sink.detach();
            }
            Err(e) => log::error!("Failed to play {}: {}", frequency, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gain_is_scaled_and_clamped() {
        assert_eq!(gain(1.0), BASE_GAIN);
        assert_eq!(gain(0.0), 0.0);
        assert_eq!(gain(-1.0), 0.0);
        assert!((gain(0.5) - 0.05).abs() < 1e-6);
        assert!((gain(3.0) - 0.3).abs() < 1e-6);
        assert!((gain(5.0) - 0.5).abs() < 1e-6);
        assert!((gain(8.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_low_tones_are_louder() {
        let low = Frequency::audible(130.81).unwrap();
        let high = Frequency::audible(959.66).unwrap();
        assert!((gain(low.volume_multiplier()) - 0.5).abs() < 1e-6);
        assert!((gain(high.volume_multiplier()) - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_unready_player_drops_requests() {
        let player = SinePlayer::default();
        assert!(!player.is_ready());
        player.play(Frequency::audible(440.0).unwrap(), Duration::from_millis(10), 1.0);
    }
}
