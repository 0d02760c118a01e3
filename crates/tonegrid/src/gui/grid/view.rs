use super::{BOLD_LINE_WIDTH, LINE_WIDTH};
use crate::gui::theme::ThemeColors;
use cairo::Context;
use palette::Srgba;
use sectors::SectorColor;
use sectors::scene::{Fill, Primitive, Scene, Stroke};
use std::f64::consts::TAU;

fn set_source(cr: &Context, color: Srgba<f64>) {
    let (r, g, b, a) = color.into_components();
    cr.set_source_rgba(r, g, b, a);
}

fn set_sector_source(cr: &Context, color: SectorColor) {
    let (r, g, b) = color.to_rgb().into_components();
    cr.set_source_rgb(r, g, b);
}

struct SceneRenderer<'a> {
    scene: &'a Scene,
    colors: &'a ThemeColors,
    backdrop: Option<SectorColor>,
}

impl SceneRenderer<'_> {
    fn draw(&self, cr: &Context) -> Result<(), cairo::Error> {
        for primitive in &self.scene.primitives {
            self.draw_primitive(cr, primitive)?;
        }
        Ok(())
    }

    fn draw_primitive(&self, cr: &Context, primitive: &Primitive) -> Result<(), cairo::Error> {
        let (cx, cy) = (self.scene.center.x, self.scene.center.y);
        cr.new_path();

        match *primitive {
            Primitive::Clear => {
                match self.backdrop {
                    Some(color) => set_sector_source(cr, color),
                    None => set_source(cr, self.colors.background),
                }
                cr.paint()
            }
            Primitive::DeadZone { radius } => {
                set_source(cr, self.colors.background);
                cr.arc(cx, cy, radius, 0.0, TAU);
                cr.fill()
            }
            Primitive::Cell {
                inner_radius,
                outer_radius,
                start_angle,
                end_angle,
                fill,
                stroke,
                ..
            } => {
                cr.arc(cx, cy, outer_radius, start_angle, end_angle);
                cr.arc_negative(cx, cy, inner_radius, end_angle, start_angle);
                cr.close_path();

                match fill {
                    Fill::Color(color) => set_sector_source(cr, color),
                    Fill::Background => set_source(cr, self.colors.background),
                }
                cr.fill_preserve()?;

                set_source(cr, self.colors.lines);
                cr.set_line_width(match stroke {
                    Stroke::Normal => LINE_WIDTH,
                    Stroke::Bold => BOLD_LINE_WIDTH,
                });
                cr.stroke()
            }
            Primitive::Ring { radius } => {
                set_source(cr, self.colors.lines);
                cr.set_line_width(LINE_WIDTH);
                cr.arc(cx, cy, radius, 0.0, TAU);
                cr.stroke()
            }
            Primitive::Spoke { angle, length } => {
                set_source(cr, self.colors.lines);
                cr.set_line_width(LINE_WIDTH);
                cr.move_to(cx, cy);
                cr.line_to(cx + length * angle.cos(), cy + length * angle.sin());
                cr.stroke()
            }
        }
    }
}

/// Paints `scene` in order. `backdrop` replaces the canvas background while a colour cue is shown.
pub fn draw(
    cr: &Context,
    scene: &Scene,
    colors: &ThemeColors,
    backdrop: Option<SectorColor>,
) -> Result<(), cairo::Error> {
    SceneRenderer {
        scene,
        colors,
        backdrop,
    }
    .draw(cr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairo::{Format, ImageSurface};
    use sectors::tracker::SectorTracker;
    use sectors::{GridConfig, GridLayout, SectorAddress};

    const SIZE: i32 = 200;

    fn render(scene: &Scene, backdrop: Option<SectorColor>) -> Vec<u8> {
        let mut surface = ImageSurface::create(Format::ARgb32, SIZE, SIZE).unwrap();
        {
            let cr = Context::new(&surface).unwrap();
            draw(&cr, scene, &ThemeColors::default(), backdrop).unwrap();
        }
        surface.flush();
        surface.data().unwrap().to_vec()
    }

    /// (r, g, b) of the pixel at (x, y); ARGB32 is stored little-endian as BGRA.
    fn pixel(data: &[u8], x: i32, y: i32) -> (u8, u8, u8) {
        let stride = Format::ARgb32.stride_for_width(SIZE as u32).unwrap() as usize;
        let i = y as usize * stride + x as usize * 4;
        (data[i + 2], data[i + 1], data[i])
    }

    fn close(a: (u8, u8, u8), b: (u8, u8, u8)) -> bool {
        a.0.abs_diff(b.0) <= 2 && a.1.abs_diff(b.1) <= 2 && a.2.abs_diff(b.2) <= 2
    }

    fn layout() -> GridLayout {
        GridLayout::new(GridConfig::default(), SIZE as f64, SIZE as f64)
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let scene = Scene::build(&layout(), &SectorTracker::new(), true);
        assert_eq!(render(&scene, None), render(&scene, None));
    }

    #[test]
    fn test_colored_cell_is_filled() {
        let layout = layout();
        let sector = SectorAddress::new(0, 0);
        let center = layout.to_canvas(layout.sector_center(sector));
        let (x, y) = (center.x as i32, center.y as i32);

        let skeleton = render(&Scene::build(&layout, &SectorTracker::new(), false), None);
        assert!(close(pixel(&skeleton, x, y), (255, 255, 255)));

        // hsl(0, 100%, 20%)
        let colored = render(&Scene::build(&layout, &SectorTracker::new(), true), None);
        assert!(close(pixel(&colored, x, y), (102, 0, 0)));
    }

    #[test]
    fn test_backdrop_fills_outside_the_grid() {
        let scene = Scene::build(&layout(), &SectorTracker::new(), false);
        let backdrop = SectorColor {
            hue: 120.0,
            lightness: 50.0,
        };
        let data = render(&scene, Some(backdrop));
        assert!(close(pixel(&data, 1, 1), (0, 255, 0)));
        assert!(close(pixel(&render(&scene, None), 1, 1), (255, 255, 255)));
    }
}
