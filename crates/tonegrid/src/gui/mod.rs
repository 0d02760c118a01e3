pub mod app;
pub mod grid;
pub mod quiz;
pub mod theme;

/// Initial width and height of the grid canvas.
pub const CANVAS_SIZE: i32 = 600;
