use crate::pitch::{MAX_FREQUENCY, MIN_FREQUENCY};
use derive_more::Display;
use rand::Rng;
use std::f64::consts::TAU;
use std::fmt;
use std::ops::RangeInclusive;
use thiserror::Error;

pub const MIN_OCTAVE: u32 = 2;
pub const MAX_OCTAVE: u32 = 7;
pub const TOTAL_OCTAVES: u32 = MAX_OCTAVE - MIN_OCTAVE + 1;
pub const MAX_RADIAL_DIVISIONS: u32 = 8;
pub const MAX_CIRCUMFERENTIAL_DIVISIONS: u32 = 20;
pub const CANVAS_MARGIN: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Radius in canvas pixels, angle in radians within [0, 2π).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PolarPoint {
    pub r: f64,
    pub theta: f64,
}

impl PolarPoint {
    pub fn new(r: f64, theta: f64) -> Self {
        Self { r, theta }
    }
}

impl fmt::Display for PolarPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.0}, {:.0}°)", self.r, self.theta.to_degrees())
    }
}

/// A sector in playable coordinates: ring 0 is the innermost ring that has an octave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[display("({radial_index}, {circumferential_index})")]
pub struct SectorAddress {
    pub radial_index: u32,
    pub circumferential_index: u32,
}

impl SectorAddress {
    pub fn new(radial_index: u32, circumferential_index: u32) -> Self {
        Self {
            radial_index,
            circumferential_index,
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridConfigError {
    #[error("Please enter a valid number for Radial Divisions (1-8).")]
    RadialOutOfRange(u32),
    #[error("Please enter a valid number for Circumferential Divisions (1-20).")]
    CircumferentialOutOfRange(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridConfig {
    radial_divisions: u32,
    circumferential_divisions: u32,
}

impl GridConfig {
    pub fn new(
        radial_divisions: u32,
        circumferential_divisions: u32,
    ) -> Result<Self, GridConfigError> {
        if !(1..=MAX_RADIAL_DIVISIONS).contains(&radial_divisions) {
            return Err(GridConfigError::RadialOutOfRange(radial_divisions));
        }
        if !(1..=MAX_CIRCUMFERENTIAL_DIVISIONS).contains(&circumferential_divisions) {
            return Err(GridConfigError::CircumferentialOutOfRange(
                circumferential_divisions,
            ));
        }
        Ok(Self {
            radial_divisions,
            circumferential_divisions,
        })
    }

    pub fn radial_divisions(&self) -> u32 {
        self.radial_divisions
    }

    pub fn circumferential_divisions(&self) -> u32 {
        self.circumferential_divisions
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            radial_divisions: 3,
            circumferential_divisions: 8,
        }
    }
}

pub fn cartesian_to_polar(point: Point) -> PolarPoint {
    let theta = point.y.atan2(point.x);
    let theta = if theta < 0.0 { theta + TAU } else { theta };
    PolarPoint::new(point.x.hypot(point.y), theta)
}

/// Everything derived from a [`GridConfig`] and the canvas size.
#[derive(Debug, Clone, PartialEq)]
pub struct GridLayout {
    config: GridConfig,
    skip_radial_levels: u32,
    adjusted_radial_divisions: u32,
    octave_shift: u32,
    center: Point,
    max_radius: f64,
    band: RangeInclusive<f64>,
}

impl GridLayout {
    pub fn new(config: GridConfig, width: f64, height: f64) -> Self {
        let radial = config.radial_divisions;
        let skip_radial_levels = radial.saturating_sub(TOTAL_OCTAVES);
        let octave_shift = match radial {
            0..=2 => 2,
            3..=5 => 1,
            _ => 0,
        };

        let mut layout = Self {
            config,
            skip_radial_levels,
            adjusted_radial_divisions: radial - skip_radial_levels,
            octave_shift,
            center: Point::default(),
            max_radius: 0.0,
            band: MIN_FREQUENCY..=MAX_FREQUENCY,
        };
        layout.resize(width, height);
        layout
    }

    /// Narrows the frequencies this grid will sound. Sectors outside it are silent.
    pub fn with_band(mut self, band: RangeInclusive<f64>) -> Self {
        self.band = band;
        self
    }

    pub fn band(&self) -> &RangeInclusive<f64> {
        &self.band
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.center = Point::new(width / 2.0, height / 2.0);
        self.max_radius = (width.min(height) / 2.0 - CANVAS_MARGIN).max(0.0);
    }

    pub fn config(&self) -> GridConfig {
        self.config
    }

    pub fn radial_divisions(&self) -> u32 {
        self.config.radial_divisions
    }

    pub fn circumferential_divisions(&self) -> u32 {
        self.config.circumferential_divisions
    }

    pub fn skip_radial_levels(&self) -> u32 {
        self.skip_radial_levels
    }

    pub fn adjusted_radial_divisions(&self) -> u32 {
        self.adjusted_radial_divisions
    }

    pub fn octave_shift(&self) -> u32 {
        self.octave_shift
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn max_radius(&self) -> f64 {
        self.max_radius
    }

    pub fn division_radius(&self) -> f64 {
        self.max_radius / self.config.radial_divisions as f64
    }

    /// Radius of the dead zone left by skipped rings.
    pub fn inner_limit(&self) -> f64 {
        self.division_radius() * self.skip_radial_levels as f64
    }

    pub fn wedge_angle(&self) -> f64 {
        TAU / self.config.circumferential_divisions as f64
    }

    pub fn polar_to_sector(&self, polar: PolarPoint) -> Option<SectorAddress> {
        let division_radius = self.division_radius();
        if division_radius <= 0.0 {
            return None;
        }

        let inner_limit = self.inner_limit();
        if polar.r < inner_limit || polar.r > self.max_radius {
            return None;
        }

        let radial = ((polar.r - inner_limit) / division_radius).floor();
        if !(0.0..self.adjusted_radial_divisions as f64).contains(&radial) {
            return None;
        }

        // theta can land a hair past the last wedge when it rounds up to 2π
        let circumferential = ((polar.theta / self.wedge_angle()).floor().max(0.0) as u32)
            .min(self.config.circumferential_divisions - 1);

        Some(SectorAddress::new(radial as u32, circumferential))
    }

    pub fn sector_center(&self, sector: SectorAddress) -> PolarPoint {
        let division_radius = self.division_radius();
        let r = self.inner_limit() + (sector.radial_index as f64 + 0.5) * division_radius;
        let theta = ((sector.circumferential_index as f64 + 0.5) * self.wedge_angle()).rem_euclid(TAU);
        PolarPoint::new(r, theta)
    }

    /// Resolves a canvas-relative pointer position to the sector under it.
    pub fn locate(&self, canvas: Point) -> Option<SectorAddress> {
        let relative = Point::new(canvas.x - self.center.x, canvas.y - self.center.y);
        self.polar_to_sector(cartesian_to_polar(relative))
    }

    pub fn to_canvas(&self, polar: PolarPoint) -> Point {
        Point::new(
            self.center.x + polar.r * polar.theta.cos(),
            self.center.y + polar.r * polar.theta.sin(),
        )
    }

    /// Raw ring index counted from the centre, dead rings included.
    pub fn ring_of(&self, sector: SectorAddress) -> u32 {
        self.skip_radial_levels + sector.radial_index
    }

    pub fn contains(&self, sector: SectorAddress) -> bool {
        sector.radial_index < self.adjusted_radial_divisions
            && sector.circumferential_index < self.config.circumferential_divisions
    }

    pub fn sectors(&self) -> impl Iterator<Item = SectorAddress> + '_ {
        (0..self.adjusted_radial_divisions).flat_map(move |radial| {
            (0..self.config.circumferential_divisions)
                .map(move |circumferential| SectorAddress::new(radial, circumferential))
        })
    }

    pub fn sector_count(&self) -> usize {
        (self.adjusted_radial_divisions * self.config.circumferential_divisions) as usize
    }

    pub fn random_sector<R: Rng + ?Sized>(&self, rng: &mut R) -> SectorAddress {
        SectorAddress::new(
            rng.gen_range(0..self.adjusted_radial_divisions),
            rng.gen_range(0..self.config.circumferential_divisions),
        )
    }
}
