//! Software rasterizer for [`RenderPlan`]s.
//!
//! Replays draw commands onto an `RgbaImage` at the plan's pixel ratio. Shapes are
//! anti-aliased with 4×4 supersampling; shadows and glows are accumulated into a coverage mask,
//! blurred, and composited beneath the shapes that cast them.

use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, Rgba, RgbaImage};

use crate::color::Color;
use crate::draw::{DrawCommand, Paint, Point, Rect, RenderPlan, Shadow, Shape};

const SAMPLES: u32 = 4;

/// Replays `plan` onto a fresh surface.
///
/// The surface starts fully transparent; plans produced by [`crate::render`] clear it to the
/// background color first.
pub fn rasterize(plan: &RenderPlan) -> RgbaImage {
    let side = plan.surface_size();
    let scale = plan.device_scale();
    let mut surface = RgbaImage::new(side, side);
    let commands = &plan.commands;

    let mut i = 0;
    while i < commands.len() {
        match &commands[i] {
            DrawCommand::Clear(color) => {
                for pixel in surface.pixels_mut() {
                    *pixel = Rgba(color.to_array());
                }
                i += 1;
            }
            DrawCommand::Image { image, dest, clip } => {
                draw_image(&mut surface, image, *dest, clip.as_ref(), scale);
                i += 1;
            }
            DrawCommand::Fill { .. } => {
                let run = fill_run(&commands[i..]);
                draw_fills(&mut surface, &commands[i..i + run], scale);
                i += run;
            }
        }
    }
    surface
}

/// Length of the run of fills starting at `commands[0]` that share at most one shadow.
fn fill_run(commands: &[DrawCommand]) -> usize {
    let mut shared: Option<Shadow> = None;
    commands
        .iter()
        .take_while(|command| match command {
            DrawCommand::Fill { shadow: None, .. } => true,
            DrawCommand::Fill {
                shadow: Some(shadow),
                ..
            } => match shared {
                None => {
                    shared = Some(*shadow);
                    true
                }
                Some(existing) => existing == *shadow,
            },
            _ => false,
        })
        .count()
}

fn draw_fills(surface: &mut RgbaImage, fills: &[DrawCommand], scale: f32) {
    let shadow = fills.iter().find_map(|command| match command {
        DrawCommand::Fill { shadow, .. } => *shadow,
        _ => None,
    });
    if let Some(shadow) = shadow {
        let casters = fills.iter().filter_map(|command| match command {
            DrawCommand::Fill {
                shape,
                shadow: Some(_),
                ..
            } => Some(shape),
            _ => None,
        });
        draw_shadow(surface, casters, &shadow, scale);
    }
    for command in fills {
        if let DrawCommand::Fill { shape, paint, .. } = command {
            fill_shape(surface, shape, paint, scale);
        }
    }
}

fn draw_shadow<'a>(
    surface: &mut RgbaImage,
    casters: impl Iterator<Item = &'a Shape>,
    shadow: &Shadow,
    scale: f32,
) {
    let (width, height) = surface.dimensions();
    let mut mask = GrayImage::new(width, height);
    let offset = Point::new(shadow.offset.x * scale, shadow.offset.y * scale);

    for shape in casters {
        for_each_covered(shape, scale, offset, width, height, |x, y, coverage| {
            let value = (coverage * 255.0).round() as u8;
            let pixel = mask.get_pixel_mut(x, y);
            pixel.0[0] = pixel.0[0].max(value);
        });
    }

    let sigma = shadow.blur * scale / 2.0;
    let mask = if sigma > 0.0 {
        imageops::blur(&mask, sigma)
    } else {
        mask
    };

    for (x, y, Luma([value])) in mask.enumerate_pixels() {
        if *value > 0 {
            blend(
                surface.get_pixel_mut(x, y),
                shadow.color,
                f32::from(*value) / 255.0,
            );
        }
    }
}

fn fill_shape(surface: &mut RgbaImage, shape: &Shape, paint: &Paint, scale: f32) {
    let (width, height) = surface.dimensions();
    for_each_covered(
        shape,
        scale,
        Point::new(0.0, 0.0),
        width,
        height,
        |x, y, coverage| {
            let center = Point::new((x as f32 + 0.5) / scale, (y as f32 + 0.5) / scale);
            blend(surface.get_pixel_mut(x, y), paint.color_at(center), coverage);
        },
    );
}

/// Calls `f(x, y, coverage)` for every device pixel the shape touches, with the shape shifted by
/// `offset` device pixels.
fn for_each_covered(
    shape: &Shape,
    scale: f32,
    offset: Point,
    width: u32,
    height: u32,
    mut f: impl FnMut(u32, u32, f32),
) {
    let bounds = shape.bounds();
    let x0 = (bounds.x * scale + offset.x).floor().max(0.0) as u32;
    let y0 = (bounds.y * scale + offset.y).floor().max(0.0) as u32;
    let x1 = ((bounds.right() * scale + offset.x).ceil().max(0.0) as u32).min(width);
    let y1 = ((bounds.bottom() * scale + offset.y).ceil().max(0.0) as u32).min(height);

    for y in y0..y1 {
        for x in x0..x1 {
            let coverage = pixel_coverage(shape, x, y, scale, offset);
            if coverage > 0.0 {
                f(x, y, coverage);
            }
        }
    }
}

/// Fraction of device pixel `(x, y)` inside the shape, from a 4×4 sample grid.
fn pixel_coverage(shape: &Shape, x: u32, y: u32, scale: f32, offset: Point) -> f32 {
    let mut inside = 0u32;
    for sy in 0..SAMPLES {
        for sx in 0..SAMPLES {
            let px = x as f32 + (sx as f32 + 0.5) / SAMPLES as f32 - offset.x;
            let py = y as f32 + (sy as f32 + 0.5) / SAMPLES as f32 - offset.y;
            if shape.contains(Point::new(px / scale, py / scale)) {
                inside += 1;
            }
        }
    }
    inside as f32 / (SAMPLES * SAMPLES) as f32
}

fn draw_image(
    surface: &mut RgbaImage,
    image: &RgbaImage,
    dest: Rect,
    clip: Option<&Shape>,
    scale: f32,
) {
    let (width, height) = surface.dimensions();
    let x0 = (dest.x * scale).round();
    let y0 = (dest.y * scale).round();
    let w = (dest.width * scale).round().max(1.0) as u32;
    let h = (dest.height * scale).round().max(1.0) as u32;
    if image.width() == 0 || image.height() == 0 {
        return;
    }
    let scaled = imageops::resize(image, w, h, FilterType::Triangle);

    for (ix, iy, pixel) in scaled.enumerate_pixels() {
        let (sx, sy) = (x0 + ix as f32, y0 + iy as f32);
        if sx < 0.0 || sy < 0.0 || sx >= width as f32 || sy >= height as f32 {
            continue;
        }
        let (sx, sy) = (sx as u32, sy as u32);
        let coverage = clip.map_or(1.0, |shape| {
            pixel_coverage(shape, sx, sy, scale, Point::new(0.0, 0.0))
        });
        if coverage > 0.0 {
            let [r, g, b, a] = pixel.0;
            blend(surface.get_pixel_mut(sx, sy), Color::rgba(r, g, b, a), coverage);
        }
    }
}

/// Source-over compositing of `src` (scaled by `coverage`) onto a non-premultiplied pixel.
fn blend(dst: &mut Rgba<u8>, src: Color, coverage: f32) {
    let sa = f32::from(src.a) / 255.0 * coverage;
    if sa <= 0.0 {
        return;
    }
    let da = f32::from(dst.0[3]) / 255.0;
    let out_a = sa + da * (1.0 - sa);
    let channel = |s: u8, d: u8| {
        let value = (f32::from(s) * sa + f32::from(d) * da * (1.0 - sa)) / out_a;
        value.round().clamp(0.0, 255.0) as u8
    };
    let [dr, dg, db, _] = dst.0;
    *dst = Rgba([
        channel(src.r, dr),
        channel(src.g, dg),
        channel(src.b, db),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn plan(commands: Vec<DrawCommand>) -> RenderPlan {
        RenderPlan {
            canvas_size: 40,
            pixel_ratio: 1.0,
            commands,
        }
    }

    fn red() -> Paint {
        Paint::Solid(Color::rgb(255, 0, 0))
    }

    #[test]
    fn test_clear_fills_surface() {
        let img = rasterize(&plan(vec![DrawCommand::Clear(Color::rgb(1, 2, 3))]));
        assert_eq!(img.dimensions(), (40, 40));
        assert!(img.pixels().all(|p| *p == Rgba([1, 2, 3, 255])));
    }

    #[test]
    fn test_rect_fill_is_pixel_exact_on_integer_bounds() {
        let img = rasterize(&plan(vec![
            DrawCommand::Clear(Color::WHITE),
            DrawCommand::Fill {
                shape: Shape::Rect(Rect::new(10.0, 10.0, 5.0, 5.0)),
                paint: red(),
                shadow: None,
            },
        ]));
        assert_eq!(*img.get_pixel(10, 10), Rgba([255, 0, 0, 255]));
        assert_eq!(*img.get_pixel(14, 14), Rgba([255, 0, 0, 255]));
        assert_eq!(*img.get_pixel(15, 15), Rgba([255, 255, 255, 255]));
        assert_eq!(*img.get_pixel(9, 12), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_circle_edges_are_antialiased() {
        let img = rasterize(&plan(vec![
            DrawCommand::Clear(Color::WHITE),
            DrawCommand::Fill {
                shape: Shape::Circle {
                    center: Point::new(20.0, 20.0),
                    radius: 8.0,
                },
                paint: red(),
                shadow: None,
            },
        ]));
        assert_eq!(*img.get_pixel(20, 20), Rgba([255, 0, 0, 255]));
        assert_eq!(*img.get_pixel(2, 2), Rgba([255, 255, 255, 255]));
        // a pixel straddling the rim is a blend
        let rim = img.get_pixel(27, 16);
        assert!(rim.0[1] > 0 && rim.0[1] < 255);
    }

    #[test]
    fn test_pixel_ratio_scales_surface_and_shapes() {
        let mut p = plan(vec![
            DrawCommand::Clear(Color::WHITE),
            DrawCommand::Fill {
                shape: Shape::Rect(Rect::new(10.0, 10.0, 5.0, 5.0)),
                paint: red(),
                shadow: None,
            },
        ]);
        p.pixel_ratio = 2.0;
        let img = rasterize(&p);
        assert_eq!(img.dimensions(), (80, 80));
        assert_eq!(*img.get_pixel(20, 20), Rgba([255, 0, 0, 255]));
        assert_eq!(*img.get_pixel(29, 29), Rgba([255, 0, 0, 255]));
        assert_eq!(*img.get_pixel(30, 30), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_glow_tints_surroundings() {
        let glow = Shadow::glow(8.0, Color::rgb(0, 0, 255));
        let img = rasterize(&plan(vec![
            DrawCommand::Clear(Color::WHITE),
            DrawCommand::Fill {
                shape: Shape::Rect(Rect::new(15.0, 15.0, 10.0, 10.0)),
                paint: red(),
                shadow: Some(glow),
            },
        ]));
        let near = img.get_pixel(13, 20);
        assert!(near.0[0] < 255, "glow should darken red near the shape");
        assert_eq!(*img.get_pixel(20, 20), Rgba([255, 0, 0, 255]));
        assert_eq!(*img.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_fill_runs_split_on_a_different_shadow() {
        let a = Shadow::glow(4.0, Color::BLACK);
        let b = Shadow::glow(2.0, Color::BLACK);
        let fill = |shadow| DrawCommand::Fill {
            shape: Shape::Rect(Rect::new(0.0, 0.0, 1.0, 1.0)),
            paint: red(),
            shadow,
        };
        let commands = vec![fill(Some(a)), fill(None), fill(Some(a)), fill(Some(b))];
        assert_eq!(fill_run(&commands), 3);
        assert_eq!(fill_run(&commands[3..]), 1);
    }

    #[test]
    fn test_image_is_scaled_and_clipped() {
        let logo = Arc::new(RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255])));
        let dest = Rect::new(10.0, 10.0, 20.0, 20.0);
        let unclipped = rasterize(&plan(vec![
            DrawCommand::Clear(Color::WHITE),
            DrawCommand::Image {
                image: logo.clone(),
                dest,
                clip: None,
            },
        ]));
        assert_eq!(*unclipped.get_pixel(10, 10), Rgba([0, 0, 0, 255]));
        assert_eq!(*unclipped.get_pixel(29, 29), Rgba([0, 0, 0, 255]));
        assert_eq!(*unclipped.get_pixel(30, 30), Rgba([255, 255, 255, 255]));

        let clipped = rasterize(&plan(vec![
            DrawCommand::Clear(Color::WHITE),
            DrawCommand::Image {
                image: logo,
                dest,
                clip: Some(Shape::RoundRect {
                    rect: dest,
                    radius: 8.0,
                }),
            },
        ]));
        assert_eq!(*clipped.get_pixel(10, 10), Rgba([255, 255, 255, 255]));
        assert_eq!(*clipped.get_pixel(20, 20), Rgba([0, 0, 0, 255]));
    }
}
