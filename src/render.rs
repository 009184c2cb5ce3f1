//! The stylized renderer.
//!
//! Rendering turns a [`ModuleMatrix`] and a [`StyleDescriptor`] into a [`RenderPlan`]. It runs in
//! two phases:
//!
//! 1. **Drawing modules** ([`plan`]), synchronous: background, geometry, fill resolution, finder
//!    patterns drawn per [`EyeStyle`], data modules drawn per [`PatternType`], and the logo
//!    region left empty when a logo is requested.
//! 2. **Awaiting the logo** ([`render`]), only when a logo is requested: the asset is decoded off
//!    the calling thread and its commands are appended on top.
//!
//! The plan is complete once [`render`] resolves. Rendering never fails. Unknown style values
//! were already mapped to defaults by the descriptor, and a logo that cannot be decoded is
//! dropped. When that happens the modules held back for it are drawn, so the result matches a
//! render without a logo.
//!
//! The logo region and error correction level H depend on each other. The region removes every
//! module with both indices in `[floor(0.4N), floor(0.6N)]`, and the 22% logo box covers a
//! little more. That pairing has been checked against level H decoding; widening either one needs
//! checking again.

use std::sync::Arc;

use image::RgbaImage;
use tracing::{debug, warn};

use crate::color::Color;
use crate::draw::{DrawCommand, Paint, Point, Rect, RenderPlan, Shadow, Shape};
use crate::encoder::{ModuleMatrix, FINDER_SIZE};
use crate::style::{EyeStyle, LogoBackground, PatternType, StyleDescriptor};

/// Start of the logo skip region, as a fraction of the matrix size.
pub const LOGO_SKIP_START: f32 = 0.4;
/// End (inclusive) of the logo skip region, as a fraction of the matrix size.
pub const LOGO_SKIP_END: f32 = 0.6;
/// Side of the logo box, as a fraction of the canvas.
pub const LOGO_SIZE_FRACTION: f32 = 0.22;

const LOGO_BACKDROP_SPREAD: f32 = 5.0;
const LOGO_CORNER_RADIUS: f32 = 8.0;
const LOGO_SHADOW_BLUR: f32 = 10.0;
const LOGO_SHADOW: Color = Color::rgba(0, 0, 0, 51);

const NEON_GLOW_BLUR: f32 = 12.0;
const NEON_HIGHLIGHT: Color = Color::rgba(255, 255, 255, 128);
const SOFT_SHADOW: Shadow = Shadow {
    blur: 4.0,
    color: Color::rgba(0, 0, 0, 20),
    offset: Point::new(0.0, 2.0),
};

const STANDARD_CORNER_RADIUS: f32 = 2.0;
const EYE_CORNER_FRACTION: f32 = 0.3;
const MIN_PADDING: f32 = 0.5;
const PADDING_FRACTION: f32 = 0.05;

/// Where a render is in its life cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    DrawingModules,
    AwaitingLogo,
    Complete,
}

/// Pixel geometry of a symbol on the canvas, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    /// Matrix side length, in modules.
    pub modules: usize,
    pub canvas_size: f32,
    /// Quiet zone on each side, clamped to half the canvas.
    pub margin: f32,
    pub module_size: f32,
    /// Inset that keeps neighboring data modules visually apart.
    pub padding: f32,
}

impl Geometry {
    pub fn new(modules: usize, style: &StyleDescriptor) -> Self {
        let canvas_size = style.canvas_size as f32;
        let margin = style.margin().clamp(0.0, canvas_size / 2.0);
        let available = canvas_size - 2.0 * margin;
        let module_size = if modules == 0 {
            0.0
        } else {
            available / modules as f32
        };
        Self {
            modules,
            canvas_size,
            margin,
            module_size,
            padding: MIN_PADDING.max(module_size * PADDING_FRACTION),
        }
    }

    /// The square holding the symbol, quiet zone excluded.
    pub fn content_box(&self) -> Rect {
        Rect::square(self.margin, self.margin, self.canvas_size - 2.0 * self.margin)
    }

    /// The full, unpadded box of module `(x, y)`.
    pub fn module_box(&self, x: usize, y: usize) -> Rect {
        Rect::square(
            self.margin + x as f32 * self.module_size,
            self.margin + y as f32 * self.module_size,
            self.module_size,
        )
    }

    /// The square covering the finder pattern whose top-left module is `(x, y)`.
    pub fn finder_box(&self, x: usize, y: usize) -> Rect {
        let origin = self.module_box(x, y);
        Rect::square(origin.x, origin.y, FINDER_SIZE as f32 * self.module_size)
    }

    /// The centered logo box.
    pub fn logo_box(&self) -> Rect {
        let size = self.canvas_size * LOGO_SIZE_FRACTION;
        let origin = (self.canvas_size - size) / 2.0;
        Rect::square(origin, origin, size)
    }
}

/// The block of module indices left empty under a logo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogoRegion {
    pub start: usize,
    /// Inclusive.
    pub end: usize,
}

impl LogoRegion {
    pub fn for_size(modules: usize) -> Self {
        let n = modules as f32;
        Self {
            start: (n * LOGO_SKIP_START).floor() as usize,
            end: (n * LOGO_SKIP_END).floor() as usize,
        }
    }

    pub fn contains(&self, x: usize, y: usize) -> bool {
        (self.start..=self.end).contains(&x) && (self.start..=self.end).contains(&y)
    }
}

/// The result of the module phase.
#[derive(Debug, Clone, PartialEq)]
pub struct ModulePlan {
    pub plan: RenderPlan,
    /// Commands for the dark modules under the logo, drawn only if the logo cannot be. Each
    /// carries the index in `plan.commands` it was taken out before.
    pub held_back: Vec<(usize, DrawCommand)>,
}

impl ModulePlan {
    /// Puts the held-back commands back where they were taken out, giving the same plan as a
    /// style without a logo.
    pub fn without_logo(self) -> RenderPlan {
        let ModulePlan { mut plan, held_back } = self;
        if held_back.is_empty() {
            return plan;
        }
        let kept = std::mem::take(&mut plan.commands);
        let mut held = held_back.into_iter().peekable();
        let mut commands = Vec::with_capacity(kept.len() + held.len());
        for (index, command) in kept.into_iter().enumerate() {
            while let Some((_, restored)) = held.next_if(|(slot, _)| *slot == index) {
                commands.push(restored);
            }
            commands.push(command);
        }
        commands.extend(held.map(|(_, restored)| restored));
        plan.commands = commands;
        plan
    }
}

/// Runs the synchronous module phase.
///
/// The returned plan starts with a full-surface clear, so replaying it always repaints the
/// whole surface. If the style requests a logo, the dark modules inside the [`LogoRegion`] go to
/// [`ModulePlan::held_back`] instead of the plan.
pub fn plan(matrix: &ModuleMatrix, style: &StyleDescriptor) -> ModulePlan {
    debug!(state = ?RenderState::DrawingModules, modules = matrix.size(), "render started");
    let geometry = Geometry::new(matrix.size(), style);
    let mut commands = vec![DrawCommand::Clear(style.background_color)];
    let mut held_back = Vec::new();

    if matrix.is_empty() || geometry.module_size <= 0.0 {
        debug!("nothing to draw beyond the background");
        return ModulePlan {
            plan: finish(style, commands),
            held_back,
        };
    }

    let paint = fill_paint(style, &geometry);
    let effect = data_effect(style);
    let logo_region = style
        .logo
        .as_ref()
        .map(|_| LogoRegion::for_size(matrix.size()));

    for y in 0..matrix.size() {
        for x in 0..matrix.size() {
            if !matrix.get(x, y) {
                continue;
            }
            let cell = geometry.module_box(x, y);
            let slot = commands.len();
            if matrix.is_finder(x, y) {
                commands.push(eye_module(style.eye_style, cell, paint));
            } else {
                data_module(&mut commands, &style.pattern_type, &geometry, cell, paint, effect);
            }
            if logo_region.is_some_and(|region| region.contains(x, y)) {
                held_back.extend(commands.drain(slot..).map(|command| (slot, command)));
            }
        }
    }

    debug!(
        commands = commands.len(),
        held_back = held_back.len(),
        "modules planned"
    );
    ModulePlan {
        plan: finish(style, commands),
        held_back,
    }
}

/// Renders a matrix completely, waiting for the logo if one is requested.
///
/// # Example
///
/// ```rust
/// use uniqr::{encoder::encode, render::render, style::StyleDescriptor};
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let matrix = encode("Unique QR Code").unwrap();
/// let plan = render(&matrix, &StyleDescriptor::default()).await;
/// let surface = plan.rasterize();
/// assert_eq!(surface.dimensions(), (500, 500));
/// # });
/// ```
pub async fn render(matrix: &ModuleMatrix, style: &StyleDescriptor) -> RenderPlan {
    let modules = plan(matrix, style);

    let plan = match &style.logo {
        None => modules.plan,
        Some(source) => {
            debug!(state = ?RenderState::AwaitingLogo, "loading logo");
            match source.load().await {
                Ok(image) => {
                    let mut plan = modules.plan;
                    plan.commands.extend(logo_commands(Arc::new(image), style));
                    plan
                }
                Err(err) => {
                    warn!(error = %err, "logo could not be loaded, rendering without it");
                    modules.without_logo()
                }
            }
        }
    };

    debug!(state = ?RenderState::Complete, commands = plan.commands.len(), "render finished");
    plan
}

/// Renders a matrix and hands the finished plan to `on_complete`.
///
/// The callback fires exactly once, after the logo step if there is one.
pub async fn render_with<F>(matrix: &ModuleMatrix, style: &StyleDescriptor, on_complete: F)
where
    F: FnOnce(RenderPlan),
{
    on_complete(render(matrix, style).await);
}

/// Builds the commands that draw a decoded logo on top of the modules.
pub fn logo_commands(image: Arc<RgbaImage>, style: &StyleDescriptor) -> Vec<DrawCommand> {
    let logo_box = Geometry::new(0, style).logo_box();
    match style.logo_background_color {
        LogoBackground::Transparent => vec![DrawCommand::Image {
            image,
            dest: logo_box,
            clip: None,
        }],
        LogoBackground::Solid(color) => vec![
            DrawCommand::Fill {
                shape: Shape::RoundRect {
                    rect: logo_box.inflate(LOGO_BACKDROP_SPREAD),
                    radius: LOGO_CORNER_RADIUS,
                },
                paint: Paint::Solid(color),
                shadow: Some(Shadow::glow(LOGO_SHADOW_BLUR, LOGO_SHADOW)),
            },
            DrawCommand::Image {
                image,
                dest: logo_box,
                clip: Some(Shape::RoundRect {
                    rect: logo_box,
                    radius: LOGO_CORNER_RADIUS,
                }),
            },
        ],
    }
}

fn finish(style: &StyleDescriptor, commands: Vec<DrawCommand>) -> RenderPlan {
    RenderPlan {
        canvas_size: style.canvas_size,
        pixel_ratio: style.pixel_ratio,
        commands,
    }
}

/// The paint shared by every dark module, finder patterns included.
fn fill_paint(style: &StyleDescriptor, geometry: &Geometry) -> Paint {
    match style.active_gradient() {
        Some(gradient) => {
            let content = geometry.content_box();
            Paint::LinearGradient {
                from: Point::new(content.x, content.y),
                to: Point::new(content.right(), content.bottom()),
                start: gradient.start_color,
                end: gradient.end_color,
            }
        }
        None => Paint::Solid(style.foreground_color),
    }
}

/// The effect applied to data modules. Finder modules never carry one.
fn data_effect(style: &StyleDescriptor) -> Option<Shadow> {
    match style.pattern_type {
        PatternType::Neon => Some(Shadow::glow(NEON_GLOW_BLUR, style.glow_color())),
        PatternType::Soft => Some(SOFT_SHADOW),
        _ => None,
    }
}

fn eye_module(eye_style: EyeStyle, cell: Rect, paint: Paint) -> DrawCommand {
    let shape = match eye_style {
        EyeStyle::Square => Shape::Rect(cell),
        EyeStyle::Circle => Shape::Circle {
            center: cell.center(),
            radius: cell.width / 2.0,
        },
        EyeStyle::Rounded => Shape::RoundRect {
            rect: cell,
            radius: cell.width * EYE_CORNER_FRACTION,
        },
    };
    DrawCommand::Fill {
        shape,
        paint,
        shadow: None,
    }
}

fn data_module(
    out: &mut Vec<DrawCommand>,
    pattern: &PatternType,
    geometry: &Geometry,
    cell: Rect,
    paint: Paint,
    effect: Option<Shadow>,
) {
    let size = geometry.module_size;
    let padding = geometry.padding;
    let center = cell.center();
    let fill = |shape| DrawCommand::Fill {
        shape,
        paint,
        shadow: effect,
    };

    match pattern {
        PatternType::Standard => out.push(fill(Shape::RoundRect {
            rect: cell.inflate(-padding / 2.0),
            radius: STANDARD_CORNER_RADIUS,
        })),
        PatternType::Rounded => out.push(fill(Shape::Circle {
            center,
            radius: (size - padding) / 2.0,
        })),
        PatternType::Dots => out.push(fill(Shape::Circle {
            center,
            radius: size / 3.0,
        })),
        PatternType::Neon => {
            out.push(fill(Shape::Circle {
                center,
                radius: ((size - 2.0 * padding) / 2.0).max(0.0),
            }));
            out.push(DrawCommand::Fill {
                shape: Shape::Circle {
                    center,
                    radius: ((size - 3.0 * padding) / 2.0).max(0.0),
                },
                paint: Paint::Solid(NEON_HIGHLIGHT),
                shadow: None,
            });
        }
        PatternType::Soft | PatternType::Other(_) => out.push(fill(Shape::Rect(cell))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::encode;
    use crate::logo::LogoSource;
    use crate::style::Gradient;
    use image::Rgba;

    fn minimal_style() -> StyleDescriptor {
        StyleDescriptor {
            canvas_size: 380,
            quiet_zone_margin: Some(40.0),
            foreground_color: "#6366f1".parse().unwrap(),
            ..StyleDescriptor::default()
        }
    }

    fn fills(plan: &RenderPlan) -> Vec<(Shape, Paint, Option<Shadow>)> {
        plan.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Fill {
                    shape,
                    paint,
                    shadow,
                } => Some((*shape, *paint, *shadow)),
                _ => None,
            })
            .collect()
    }

    fn png_logo() -> Vec<u8> {
        let img = RgbaImage::from_pixel(16, 16, Rgba([220, 38, 38, 255]));
        let mut out = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn test_geometry_derivation() {
        let g = Geometry::new(25, &minimal_style());
        assert_eq!(g.margin, 40.0);
        assert_eq!(g.module_size, 12.0);
        assert!((g.padding - 0.6).abs() < 1e-6);
        assert_eq!(g.module_box(2, 3), Rect::square(64.0, 76.0, 12.0));
        assert_eq!(g.content_box(), Rect::square(40.0, 40.0, 300.0));

        let tiny = Geometry::new(
            100,
            &StyleDescriptor {
                canvas_size: 120,
                quiet_zone_margin: Some(10.0),
                ..StyleDescriptor::default()
            },
        );
        assert_eq!(tiny.padding, 0.5);
    }

    #[test]
    fn test_plan_starts_with_background_clear() {
        let matrix = encode("Unique QR Code").unwrap();
        let plan = plan(&matrix, &minimal_style()).plan;
        assert_eq!(plan.commands[0], DrawCommand::Clear(Color::WHITE));
        // one fill per dark module for the standard pattern
        assert_eq!(plan.commands.len(), 1 + matrix.dark_count());
    }

    #[test]
    fn test_standard_modules_are_padded_round_rects() {
        let matrix = encode("Unique QR Code").unwrap();
        let style = minimal_style();
        let g = Geometry::new(matrix.size(), &style);
        let plan = plan(&matrix, &style).plan;
        let (x, y) = (0..matrix.size())
            .flat_map(|y| (0..matrix.size()).map(move |x| (x, y)))
            .find(|&(x, y)| matrix.get(x, y) && !matrix.is_finder(x, y))
            .unwrap();
        let expected = Shape::RoundRect {
            rect: g.module_box(x, y).inflate(-g.padding / 2.0),
            radius: 2.0,
        };
        assert!(fills(&plan).iter().any(|(shape, _, _)| *shape == expected));
    }

    #[test]
    fn test_gradient_wins_over_foreground() {
        let matrix = encode("Unique QR Code").unwrap();
        let style = StyleDescriptor {
            gradient: Gradient {
                enabled: true,
                start_color: "#6366f1".parse().unwrap(),
                end_color: "#ec4899".parse().unwrap(),
            },
            pattern_type: PatternType::Neon,
            ..minimal_style()
        };
        let plan = plan(&matrix, &style).plan;
        let expected = Paint::LinearGradient {
            from: Point::new(40.0, 40.0),
            to: Point::new(340.0, 340.0),
            start: style.gradient.start_color,
            end: style.gradient.end_color,
        };
        let all = fills(&plan);
        let glowing: Vec<_> = all.iter().filter(|(_, _, s)| s.is_some()).collect();
        assert!(!glowing.is_empty());
        for (_, paint, shadow) in glowing {
            assert_eq!(*paint, expected);
            assert_eq!(shadow.unwrap().color, style.gradient.end_color);
        }
        // finder modules share the gradient but never glow
        let g = Geometry::new(matrix.size(), &style);
        let corner = g.finder_box(0, 0);
        for (shape, paint, shadow) in &all {
            if corner.contains(shape.bounds().center()) {
                assert_eq!(*paint, expected);
                assert!(shadow.is_none());
            }
        }
    }

    #[test]
    fn test_neon_adds_translucent_highlight() {
        let matrix = encode("Unique QR Code").unwrap();
        let style = StyleDescriptor {
            pattern_type: PatternType::Neon,
            ..minimal_style()
        };
        let g = Geometry::new(matrix.size(), &style);
        let all = fills(&plan(&matrix, &style).plan);
        let highlights: Vec<_> = all
            .iter()
            .filter(|(_, paint, _)| *paint == Paint::Solid(NEON_HIGHLIGHT))
            .collect();
        assert!(!highlights.is_empty());
        for (shape, _, shadow) in highlights {
            assert!(shadow.is_none());
            match shape {
                Shape::Circle { radius, .. } => {
                    assert!((radius - (g.module_size - 3.0 * g.padding) / 2.0).abs() < 1e-4)
                }
                other => panic!("unexpected highlight shape {other:?}"),
            }
        }
    }

    #[test]
    fn test_finder_commands_ignore_pattern_type() {
        let matrix = encode("https://example.com").unwrap();
        let g = Geometry::new(matrix.size(), &minimal_style());
        let n = matrix.size();
        let corners = [
            g.finder_box(0, 0),
            g.finder_box(n - 7, 0),
            g.finder_box(0, n - 7),
        ];
        let in_corners = |plan: &RenderPlan| -> Vec<(Shape, Paint, Option<Shadow>)> {
            fills(plan)
                .into_iter()
                .filter(|(shape, _, _)| {
                    corners
                        .iter()
                        .any(|c| c.contains(shape.bounds().center()))
                })
                .collect()
        };

        for eye in [EyeStyle::Square, EyeStyle::Circle, EyeStyle::Rounded] {
            let reference = in_corners(
                &plan(
                    &matrix,
                    &StyleDescriptor {
                        eye_style: eye,
                        ..minimal_style()
                    },
                )
                .plan,
            );
            assert_eq!(reference.len(), 3 * 33);
            for pattern in [
                PatternType::Rounded,
                PatternType::Dots,
                PatternType::Neon,
                PatternType::Soft,
                PatternType::Other("zigzag".into()),
            ] {
                let style = StyleDescriptor {
                    eye_style: eye,
                    pattern_type: pattern,
                    ..minimal_style()
                };
                assert_eq!(in_corners(&plan(&matrix, &style).plan), reference);
            }
        }
    }

    #[test]
    fn test_unknown_pattern_draws_unpadded_squares() {
        let matrix = encode("Unique QR Code").unwrap();
        let style = StyleDescriptor {
            pattern_type: PatternType::parse("hexagon"),
            ..minimal_style()
        };
        let g = Geometry::new(matrix.size(), &style);
        let all = fills(&plan(&matrix, &style).plan);
        assert_eq!(all.len(), matrix.dark_count());
        for (shape, _, shadow) in all {
            assert!(shadow.is_none());
            match shape {
                Shape::Rect(rect) => assert_eq!(rect.width, g.module_size),
                other => panic!("unexpected shape {other:?}"),
            }
        }
    }

    #[test]
    fn test_logo_region_bounds() {
        let region = LogoRegion::for_size(25);
        assert_eq!((region.start, region.end), (10, 15));
        assert!(region.contains(10, 15));
        assert!(!region.contains(9, 12));
        assert!(!region.contains(12, 16));

        let region = LogoRegion::for_size(21);
        assert_eq!((region.start, region.end), (8, 12));
    }

    #[test]
    fn test_logo_holds_back_exactly_the_region() {
        let matrix = encode("https://example.com/some/longer/path?q=1").unwrap();
        let style = StyleDescriptor {
            pattern_type: PatternType::Other("square".into()),
            logo: Some(LogoSource::from_bytes(png_logo())),
            ..minimal_style()
        };
        let region = LogoRegion::for_size(matrix.size());
        let in_region = (0..matrix.size())
            .flat_map(|y| (0..matrix.size()).map(move |x| (x, y)))
            .filter(|&(x, y)| matrix.get(x, y) && region.contains(x, y))
            .count();
        assert!(in_region > 0);

        let ModulePlan { plan, held_back } = plan(&matrix, &style);
        assert_eq!(held_back.len(), in_region);
        assert_eq!(plan.commands.len(), 1 + matrix.dark_count() - in_region);
    }

    #[tokio::test]
    async fn test_render_appends_logo_with_backdrop() {
        let matrix = encode("Unique QR Code").unwrap();
        let style = StyleDescriptor {
            logo: Some(LogoSource::from_bytes(png_logo())),
            ..minimal_style()
        };
        let modules = plan(&matrix, &style).plan;
        let plan = render(&matrix, &style).await;
        assert_eq!(plan.commands.len(), modules.commands.len() + 2);

        let logo_box = Geometry::new(0, &style).logo_box();
        assert!((logo_box.width - 83.6).abs() < 1e-3);
        match &plan.commands[plan.commands.len() - 2..] {
            [DrawCommand::Fill {
                shape: Shape::RoundRect { rect, radius },
                shadow: Some(_),
                ..
            }, DrawCommand::Image { dest, clip, .. }] => {
                assert_eq!(*rect, logo_box.inflate(5.0));
                assert_eq!(*radius, 8.0);
                assert_eq!(*dest, logo_box);
                assert!(clip.is_some());
            }
            other => panic!("unexpected logo commands {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_transparent_logo_is_unclipped_without_backdrop() {
        let matrix = encode("Unique QR Code").unwrap();
        let style = StyleDescriptor {
            logo: Some(LogoSource::from_bytes(png_logo())),
            logo_background_color: LogoBackground::Transparent,
            ..minimal_style()
        };
        let plan = render(&matrix, &style).await;
        match plan.commands.last() {
            Some(DrawCommand::Image { clip, .. }) => assert!(clip.is_none()),
            other => panic!("unexpected last command {other:?}"),
        }
        let backdrops = plan
            .commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Fill { paint: Paint::Solid(c), .. } if *c == Color::WHITE))
            .count();
        assert_eq!(backdrops, 0);
    }

    #[tokio::test]
    async fn test_failed_logo_renders_as_if_absent() {
        let matrix = encode("Unique QR Code").unwrap();
        let broken = StyleDescriptor {
            logo: Some(LogoSource::from_bytes(vec![0u8, 1, 2])),
            ..minimal_style()
        };
        let with_broken_logo = render(&matrix, &broken).await;
        let without_logo = render(&matrix, &minimal_style()).await;

        // Same commands in the same order, so edge pixels blend identically.
        assert_eq!(with_broken_logo, without_logo);
        assert_eq!(
            with_broken_logo.rasterize().into_raw(),
            without_logo.rasterize().into_raw()
        );
    }

    #[test]
    fn test_without_logo_restores_command_order() {
        let matrix = encode("https://example.com/unique/qr?id=1234567").unwrap();
        for pattern_type in [PatternType::Standard, PatternType::Neon] {
            let plain = StyleDescriptor {
                pattern_type,
                ..minimal_style()
            };
            let with_logo = StyleDescriptor {
                logo: Some(LogoSource::from_bytes(png_logo())),
                ..plain.clone()
            };
            let modules = plan(&matrix, &with_logo);
            assert!(!modules.held_back.is_empty());
            assert_eq!(modules.without_logo(), plan(&matrix, &plain).plan);
        }
    }

    #[tokio::test]
    async fn test_render_with_fires_once_with_the_plan() {
        let matrix = encode("Unique QR Code").unwrap();
        let mut calls = Vec::new();
        render_with(&matrix, &minimal_style(), |plan| calls.push(plan)).await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], plan(&matrix, &minimal_style()).plan);
    }

    #[test]
    fn test_empty_matrix_and_oversized_margin_draw_background_only() {
        let empty = plan(&ModuleMatrix::empty(), &minimal_style()).plan;
        assert_eq!(empty.commands, vec![DrawCommand::Clear(Color::WHITE)]);

        let matrix = encode("Unique QR Code").unwrap();
        let style = StyleDescriptor {
            quiet_zone_margin: Some(1000.0),
            ..minimal_style()
        };
        assert_eq!(plan(&matrix, &style).plan.commands.len(), 1);
    }
}
