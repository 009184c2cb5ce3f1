//! Backend-neutral drawing commands.
//!
//! The renderer does not paint pixels itself. It produces a [`RenderPlan`]: an ordered list of
//! [`DrawCommand`]s in CSS-pixel coordinates that any 2D backend can replay. The crate ships two
//! backends, [`crate::raster`] (an `RgbaImage`) and [`crate::helper::to_svg_string`].

use std::sync::Arc;

use image::RgbaImage;

use crate::color::Color;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A square of side `size` with its top-left corner at `(x, y)`.
    pub const fn square(x: f32, y: f32, size: f32) -> Self {
        Self::new(x, y, size, size)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Grows the rectangle by `amount` on every side (shrinks it for negative amounts).
    pub fn inflate(&self, amount: f32) -> Rect {
        Rect::new(
            self.x - amount,
            self.y - amount,
            self.width + 2.0 * amount,
            self.height + 2.0 * amount,
        )
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }
}

/// A fillable shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Rect(Rect),
    /// A rectangle with circular corners; the radius is clamped to half the shorter side.
    RoundRect { rect: Rect, radius: f32 },
    Circle { center: Point, radius: f32 },
}

impl Shape {
    pub fn bounds(&self) -> Rect {
        match *self {
            Shape::Rect(rect) | Shape::RoundRect { rect, .. } => rect,
            Shape::Circle { center, radius } => Rect::square(
                center.x - radius,
                center.y - radius,
                2.0 * radius,
            ),
        }
    }

    /// Returns the corner radius after clamping, for round rectangles.
    pub fn effective_radius(&self) -> f32 {
        match *self {
            Shape::RoundRect { rect, radius } => radius
                .max(0.0)
                .min(rect.width / 2.0)
                .min(rect.height / 2.0),
            Shape::Circle { radius, .. } => radius.max(0.0),
            Shape::Rect(_) => 0.0,
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        match *self {
            Shape::Rect(rect) => rect.contains(p),
            Shape::Circle { center, radius } => {
                let (dx, dy) = (p.x - center.x, p.y - center.y);
                dx * dx + dy * dy <= radius * radius
            }
            Shape::RoundRect { rect, .. } => {
                if !rect.contains(p) {
                    return false;
                }
                let r = self.effective_radius();
                // Distance into the corner zone, zero when outside it
                let cx = (rect.x + r - p.x).max(p.x - (rect.right() - r)).max(0.0);
                let cy = (rect.y + r - p.y).max(p.y - (rect.bottom() - r)).max(0.0);
                cx * cx + cy * cy <= r * r
            }
        }
    }
}

/// What a shape is filled with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Paint {
    Solid(Color),
    /// A linear gradient from `start` at `from` to `end` at `to`, padded beyond both ends.
    LinearGradient {
        from: Point,
        to: Point,
        start: Color,
        end: Color,
    },
}

impl Paint {
    /// Returns the paint's color at `p`.
    ///
    /// For gradients, `p` is projected onto the `from`→`to` axis.
    pub fn color_at(&self, p: Point) -> Color {
        match *self {
            Paint::Solid(color) => color,
            Paint::LinearGradient {
                from,
                to,
                start,
                end,
            } => {
                let (dx, dy) = (to.x - from.x, to.y - from.y);
                let len2 = dx * dx + dy * dy;
                if len2 <= f32::EPSILON {
                    return end;
                }
                let t = ((p.x - from.x) * dx + (p.y - from.y) * dy) / len2;
                start.lerp(end, t)
            }
        }
    }

    /// The color used where a single color stands for the paint (glows, SVG fallbacks).
    pub fn representative(&self) -> Color {
        match *self {
            Paint::Solid(color) => color,
            Paint::LinearGradient { end, .. } => end,
        }
    }
}

/// A blurred copy of a shape drawn beneath it: a drop shadow, or a glow when unoffset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shadow {
    /// Blur extent in CSS pixels; the Gaussian sigma is half of it.
    pub blur: f32,
    pub color: Color,
    pub offset: Point,
}

impl Shadow {
    pub const fn glow(blur: f32, color: Color) -> Self {
        Self {
            blur,
            color,
            offset: Point::new(0.0, 0.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Paint the whole surface.
    Clear(Color),
    Fill {
        shape: Shape,
        paint: Paint,
        shadow: Option<Shadow>,
    },
    /// Draw an image scaled to `dest`, optionally clipped to a shape.
    Image {
        image: Arc<RgbaImage>,
        dest: Rect,
        clip: Option<Shape>,
    },
}

impl DrawCommand {
    /// The area the command paints, shadows excluded. `None` means the whole surface.
    pub fn bounds(&self) -> Option<Rect> {
        match self {
            DrawCommand::Clear(_) => None,
            DrawCommand::Fill { shape, .. } => Some(shape.bounds()),
            DrawCommand::Image { dest, .. } => Some(*dest),
        }
    }
}

/// Largest surface side, in device pixels, a plan rasterizes to.
pub const MAX_SURFACE_SIZE: u32 = 8192;

/// An ordered list of drawing commands for a square surface.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPlan {
    /// Side of the surface, in CSS pixels.
    pub canvas_size: u32,
    /// Device pixels per CSS pixel.
    pub pixel_ratio: f32,
    pub commands: Vec<DrawCommand>,
}

impl RenderPlan {
    /// Side of the output surface in device pixels, at most [`MAX_SURFACE_SIZE`].
    pub fn surface_size(&self) -> u32 {
        let side = self.canvas_size as f32 * self.pixel_ratio;
        if side.is_nan() {
            return self.canvas_size.clamp(1, MAX_SURFACE_SIZE);
        }
        side.round().clamp(1.0, MAX_SURFACE_SIZE as f32) as u32
    }

    /// Device pixels per CSS pixel of the surface [`surface_size`](Self::surface_size) gives.
    pub fn device_scale(&self) -> f32 {
        self.surface_size() as f32 / self.canvas_size.max(1) as f32
    }

    /// Replays the plan onto a fresh RGBA surface.
    pub fn rasterize(&self) -> RgbaImage {
        crate::raster::rasterize(self)
    }
}
