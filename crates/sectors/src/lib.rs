pub mod color;
pub mod grid;
pub mod learning;
pub mod passive;
pub mod pitch;
pub mod scene;
pub mod session;
pub mod timeline;
pub mod tracker;

#[cfg(test)]
pub(crate) mod testing;

pub use color::SectorColor;
pub use grid::{GridConfig, GridConfigError, GridLayout, Point, PolarPoint, SectorAddress};
pub use learning::{LearningConfig, LearningError, Modality, Phase, Verdict};
pub use pitch::{Frequency, Note, TonePlayer};
pub use scene::Scene;
pub use session::{ClickOutcome, Session};
