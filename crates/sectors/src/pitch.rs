use crate::grid::{GridLayout, MAX_OCTAVE, MIN_OCTAVE, SectorAddress};
use derive_more::{Deref, Display, Into};
use std::ops::RangeInclusive;
use std::time::Duration;

/// Middle C, the pitch of octave 4.
pub const REFERENCE_PITCH: f64 = 261.63;
pub const REFERENCE_OCTAVE: i32 = 4;
pub const MIN_FREQUENCY: f64 = 60.0;
pub const MAX_FREQUENCY: f64 = 4100.0;

/// A pitch inside the playable 60–4100 Hz band.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Display, Deref, Into)]
#[display("{_0:.2} Hz")]
pub struct Frequency(f64);

impl Frequency {
    /// Returns `None` outside the playable band; callers drop the note silently.
    pub fn audible(hz: f64) -> Option<Self> {
        Self::within(hz, &(MIN_FREQUENCY..=MAX_FREQUENCY))
    }

    /// Like [`Frequency::audible`] for a band that may be narrower than the playable one.
    pub fn within(hz: f64, band: &RangeInclusive<f64>) -> Option<Self> {
        (band.contains(&hz) && (MIN_FREQUENCY..=MAX_FREQUENCY).contains(&hz)).then_some(Self(hz))
    }

    pub fn hz(&self) -> f64 {
        self.0
    }

    /// Flattens perceived loudness, low tones get boosted.
    pub fn volume_multiplier(&self) -> f64 {
        match self.0 {
            f if f < 200.0 => 5.0,
            f if f < 400.0 => 3.0,
            f if f < 800.0 => 1.5,
            _ => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Note {
    pub frequency: Frequency,
    pub sector: SectorAddress,
}

impl Note {
    pub fn new(frequency: Frequency, sector: SectorAddress) -> Self {
        Self { frequency, sector }
    }
}

/// Sound output. Implementations must accept requests before their device is ready
/// and drop them quietly in that case.
pub trait TonePlayer {
    fn play(&self, frequency: Frequency, duration: Duration, volume: f64);
}

impl GridLayout {
    pub fn octave(&self, sector: SectorAddress) -> u32 {
        (MIN_OCTAVE + sector.radial_index + self.octave_shift()).clamp(MIN_OCTAVE, MAX_OCTAVE)
    }

    pub fn frequency(&self, sector: SectorAddress) -> Option<Frequency> {
        let octave = self.octave(sector) as i32;
        let base = REFERENCE_PITCH * 2f64.powi(octave - REFERENCE_OCTAVE);
        let step =
            sector.circumferential_index as f64 / self.circumferential_divisions() as f64;
        Frequency::within(base * step.exp2(), self.band())
    }

    pub fn note(&self, sector: SectorAddress) -> Option<Note> {
        self.frequency(sector).map(|f| Note::new(f, sector))
    }
}
