//! Cairo rendering of the sector grid.

pub mod view;

pub use view::draw;

pub const LINE_WIDTH: f64 = 1.0;
pub const BOLD_LINE_WIDTH: f64 = 3.0;
