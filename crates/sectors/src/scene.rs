//! What the grid looks like for a given layout and tracker snapshot.
//!
//! The scene is a flat list of primitives in paint order. It knows nothing about the
//! drawing backend; the GUI walks it with cairo.

use crate::color::SectorColor;
use crate::grid::{GridLayout, Point, SectorAddress};
use crate::tracker::{Layer, SectorTracker};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fill {
    Background,
    Color(SectorColor),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stroke {
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    Clear,
    /// Disk covering the skipped rings.
    DeadZone { radius: f64 },
    /// Annular wedge between two radii and two angles.
    Cell {
        sector: SectorAddress,
        inner_radius: f64,
        outer_radius: f64,
        start_angle: f64,
        end_angle: f64,
        fill: Fill,
        stroke: Stroke,
    },
    Ring { radius: f64 },
    Spoke { angle: f64, length: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub center: Point,
    pub primitives: Vec<Primitive>,
}

impl Scene {
    /// Cells are drawn when colours are shown or any sector is flashing or highlighted;
    /// otherwise only the rings and spokes.
    pub fn build(layout: &GridLayout, tracker: &SectorTracker, show_colors: bool) -> Self {
        let mut primitives = vec![Primitive::Clear];

        if layout.skip_radial_levels() > 0 {
            primitives.push(Primitive::DeadZone {
                radius: layout.inner_limit(),
            });
        }

        let show_cells = show_colors
            || !tracker.is_empty(Layer::Flashing)
            || !tracker.is_empty(Layer::Highlighted);

        if show_cells {
            primitives.extend(cells(layout, tracker, show_colors));
        } else {
            primitives.extend(skeleton(layout));
        }

        Self {
            center: layout.center(),
            primitives,
        }
    }

    /// True when only grid lines are drawn.
    pub fn is_skeleton(&self) -> bool {
        !self
            .primitives
            .iter()
            .any(|p| matches!(p, Primitive::Cell { .. }))
    }
}

fn cells<'a>(
    layout: &'a GridLayout,
    tracker: &'a SectorTracker,
    show_colors: bool,
) -> impl Iterator<Item = Primitive> + 'a {
    let division_radius = layout.division_radius();
    let wedge = layout.wedge_angle();

    layout.sectors().map(move |sector| {
        let ring = layout.ring_of(sector) as f64;
        let start_angle = wedge * sector.circumferential_index as f64;

        let fill = if show_colors || tracker.contains(Layer::Flashing, sector) {
            Fill::Color(layout.color(sector))
        } else {
            Fill::Background
        };
        let stroke = if tracker.contains(Layer::Highlighted, sector) {
            Stroke::Bold
        } else {
            Stroke::Normal
        };

        Primitive::Cell {
            sector,
            inner_radius: division_radius * ring,
            outer_radius: division_radius * (ring + 1.0),
            start_angle,
            end_angle: start_angle + wedge,
            fill,
            stroke,
        }
    })
}

fn skeleton(layout: &GridLayout) -> impl Iterator<Item = Primitive> + '_ {
    let division_radius = layout.division_radius();
    let wedge = layout.wedge_angle();

    let rings = (layout.skip_radial_levels() + 1..=layout.radial_divisions()).map(move |i| {
        Primitive::Ring {
            radius: division_radius * i as f64,
        }
    });
    let spokes = (0..layout.circumferential_divisions()).map(move |i| Primitive::Spoke {
        angle: wedge * i as f64,
        length: layout.max_radius(),
    });
    rings.chain(spokes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridConfig;

    fn layout(radial: u32, circumferential: u32) -> GridLayout {
        GridLayout::new(GridConfig::new(radial, circumferential).unwrap(), 600.0, 600.0)
    }

    fn cell(scene: &Scene, sector: SectorAddress) -> (f64, Fill, Stroke) {
        scene
            .primitives
            .iter()
            .find_map(|p| match *p {
                Primitive::Cell {
                    sector: s,
                    inner_radius,
                    fill,
                    stroke,
                    ..
                } if s == sector => Some((inner_radius, fill, stroke)),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn test_idle_grid_is_skeleton() {
        let layout = layout(8, 5);
        let scene = Scene::build(&layout, &SectorTracker::new(), false);

        assert!(scene.is_skeleton());
        assert_eq!(scene.primitives[0], Primitive::Clear);
        assert!(matches!(scene.primitives[1], Primitive::DeadZone { .. }));

        let rings = scene
            .primitives
            .iter()
            .filter(|p| matches!(p, Primitive::Ring { .. }))
            .count();
        let spokes = scene
            .primitives
            .iter()
            .filter(|p| matches!(p, Primitive::Spoke { .. }))
            .count();
        // rings 3..=8 around two dead rings
        assert_eq!(rings, 6);
        assert_eq!(spokes, 5);
    }

    #[test]
    fn test_show_colors_fills_every_cell() {
        let layout = layout(3, 8);
        let scene = Scene::build(&layout, &SectorTracker::new(), true);

        assert!(!scene.is_skeleton());
        assert_eq!(scene.primitives.len(), 1 + 24);
        assert!(scene.primitives.iter().all(|p| !matches!(
            p,
            Primitive::Cell {
                fill: Fill::Background,
                ..
            }
        )));
    }

    #[test]
    fn test_flashing_sector_is_filled_at_its_raw_ring() {
        let layout = layout(8, 4);
        let sector = SectorAddress::new(0, 2);
        let mut tracker = SectorTracker::new();
        tracker.add(Layer::Flashing, sector);

        let scene = Scene::build(&layout, &tracker, false);
        let (inner, fill, stroke) = cell(&scene, sector);

        assert_eq!(inner, layout.inner_limit());
        assert_eq!(fill, Fill::Color(layout.color(sector)));
        assert_eq!(stroke, Stroke::Normal);

        let (_, other_fill, _) = cell(&scene, SectorAddress::new(1, 2));
        assert_eq!(other_fill, Fill::Background);
    }

    #[test]
    fn test_highlight_is_bold_border() {
        let layout = layout(3, 8);
        let sector = SectorAddress::new(1, 1);
        let mut tracker = SectorTracker::new();
        tracker.add(Layer::Highlighted, sector);

        let scene = Scene::build(&layout, &tracker, false);
        let (_, fill, stroke) = cell(&scene, sector);
        assert_eq!(fill, Fill::Background);
        assert_eq!(stroke, Stroke::Bold);
    }

    #[test]
    fn test_build_is_idempotent() {
        let layout = layout(5, 7);
        let mut tracker = SectorTracker::new();
        tracker.add(Layer::Flashing, SectorAddress::new(4, 6));
        assert_eq!(
            Scene::build(&layout, &tracker, false),
            Scene::build(&layout, &tracker, false)
        );
    }
}
