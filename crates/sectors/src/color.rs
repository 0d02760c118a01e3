use crate::grid::{GridLayout, SectorAddress};
use palette::{FromColor, Hsl, Srgb};
use std::fmt;

pub const SATURATION: f64 = 100.0;

/// Hue in degrees, lightness in percent. Saturation is always full.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectorColor {
    pub hue: f64,
    pub lightness: f64,
}

impl SectorColor {
    pub fn to_hsl(&self) -> Hsl<palette::encoding::Srgb, f64> {
        Hsl::new(self.hue, SATURATION / 100.0, self.lightness / 100.0)
    }

    pub fn to_rgb(&self) -> Srgb<f64> {
        Srgb::from_color(self.to_hsl())
    }
}

/// CSS notation; two colours are the same exactly when these strings are.
impl fmt::Display for SectorColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hsl({}, {}%, {}%)", self.hue, SATURATION, self.lightness)
    }
}

impl GridLayout {
    pub fn color(&self, sector: SectorAddress) -> SectorColor {
        let hue =
            360.0 * sector.circumferential_index as f64 / self.circumferential_divisions() as f64;
        let lightness = match self.adjusted_radial_divisions() {
            1 => 50.0,
            rings => 20.0 + 60.0 * sector.radial_index as f64 / (rings - 1) as f64,
        };
        SectorColor { hue, lightness }
    }
}
