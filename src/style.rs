//! Style descriptors.
//!
//! A [`StyleDescriptor`] is built by the caller for each render and is never stored by the
//! renderer. It is also what the history store keeps next to the raw payload, so it
//! (de)serializes as camelCase JSON. Older records written with the generator's prop names
//! (`styleType`, `fgColor`, `margin`, ...) are accepted too.
//!
//! Parsing never rejects a value it merely does not recognize: unknown patterns are kept and
//! drawn as plain squares, unknown eye styles become [`EyeStyle::Square`], and unparsable colors
//! fall back to the field's default with a warning.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::warn;

use crate::color::Color;
use crate::draw::MAX_SURFACE_SIZE;
use crate::error::StyleError;
use crate::logo::LogoSource;

pub const DEFAULT_CANVAS_SIZE: u32 = 500;
pub const DEFAULT_FOREGROUND: Color = Color::rgb(0x63, 0x66, 0xf1);
pub const DEFAULT_BACKGROUND: Color = Color::WHITE;
pub const DEFAULT_GRADIENT_END: Color = Color::rgb(0xec, 0x48, 0x99);
/// Share of the canvas used as quiet zone on each side when no margin is given.
pub const DEFAULT_MARGIN_FRACTION: f32 = 0.1;

/// How data modules are drawn.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PatternType {
    /// Nearly square, slightly inset modules.
    #[default]
    Standard,
    /// Circles filling the padded module box.
    Rounded,
    /// Small circles, a third of the module size.
    Dots,
    /// Glowing circles with a translucent white highlight.
    Neon,
    /// Unpadded squares over a faint drop shadow.
    Soft,
    /// Any other name. Drawn as unpadded squares; the name is kept for re-serialization.
    Other(String),
}

impl PatternType {
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "standard" | "square" => Self::Standard,
            "rounded" | "rounded-dot" | "round" => Self::Rounded,
            "dots" | "dot" | "small-dot" => Self::Dots,
            "neon" | "neon-glow-dot" | "neon-glow" => Self::Neon,
            "soft" => Self::Soft,
            _ => Self::Other(name.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Standard => "standard",
            Self::Rounded => "rounded",
            Self::Dots => "dots",
            Self::Neon => "neon",
            Self::Soft => "soft",
            Self::Other(name) => name,
        }
    }
}

impl Serialize for PatternType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// How finder-pattern modules are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EyeStyle {
    #[default]
    Square,
    Circle,
    Rounded,
}

impl EyeStyle {
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "square" => Self::Square,
            "circle" => Self::Circle,
            "rounded" => Self::Rounded,
            other => {
                warn!(eye_style = other, "unknown eye style, using square");
                Self::Square
            }
        }
    }
}

/// A linear gradient across the symbol's content area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Gradient {
    pub enabled: bool,
    pub start_color: Color,
    pub end_color: Color,
}

impl Default for Gradient {
    fn default() -> Self {
        Self {
            enabled: false,
            start_color: DEFAULT_FOREGROUND,
            end_color: DEFAULT_GRADIENT_END,
        }
    }
}

/// The backdrop behind a logo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoBackground {
    /// No backdrop and no clip; the logo is drawn as-is over the modules.
    Transparent,
    /// A shadowed rounded backdrop in this color, with the logo clipped to a rounded box.
    Solid(Color),
}

impl Default for LogoBackground {
    fn default() -> Self {
        Self::Solid(Color::WHITE)
    }
}

impl LogoBackground {
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") => Self::Transparent,
            Some(s) if s.eq_ignore_ascii_case("transparent") => Self::Transparent,
            Some(s) => match s.parse::<Color>() {
                Ok(color) => Self::Solid(color),
                Err(err) => {
                    warn!(error = %err, "invalid logo background, using white");
                    Self::default()
                }
            },
        }
    }
}

impl Serialize for LogoBackground {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Transparent => serializer.serialize_str("transparent"),
            Self::Solid(color) => color.serialize(serializer),
        }
    }
}

/// Everything that controls how a module matrix is drawn.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleDescriptor {
    pub pattern_type: PatternType,
    pub eye_style: EyeStyle,
    pub foreground_color: Color,
    pub background_color: Color,
    /// Wins over `foreground_color` when enabled.
    pub gradient: Gradient,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<LogoSource>,
    pub logo_background_color: LogoBackground,
    /// Side of the square canvas, in CSS pixels.
    pub canvas_size: u32,
    /// Quiet zone on each side, in CSS pixels. `None` means 10% of the canvas.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quiet_zone_margin: Option<f32>,
    /// Device pixels per CSS pixel of the output surface.
    pub pixel_ratio: f32,
}

impl Default for StyleDescriptor {
    fn default() -> Self {
        Self {
            pattern_type: PatternType::default(),
            eye_style: EyeStyle::default(),
            foreground_color: DEFAULT_FOREGROUND,
            background_color: DEFAULT_BACKGROUND,
            gradient: Gradient::default(),
            logo: None,
            logo_background_color: LogoBackground::default(),
            canvas_size: DEFAULT_CANVAS_SIZE,
            quiet_zone_margin: None,
            pixel_ratio: 1.0,
        }
    }
}

impl StyleDescriptor {
    /// Parses a descriptor from JSON, filling every missing field with its default.
    ///
    /// # Example
    ///
    /// ```rust
    /// use uniqr::style::{PatternType, StyleDescriptor};
    ///
    /// let style = StyleDescriptor::from_json(r#"{"patternType":"neon","canvasSize":380}"#).unwrap();
    /// assert_eq!(style.pattern_type, PatternType::Neon);
    /// assert_eq!(style.margin(), 38.0);
    /// ```
    pub fn from_json(json: &str) -> Result<Self, StyleError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, StyleError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Returns the quiet-zone margin in CSS pixels.
    pub fn margin(&self) -> f32 {
        self.quiet_zone_margin
            .unwrap_or(self.canvas_size as f32 * DEFAULT_MARGIN_FRACTION)
    }

    /// Returns the gradient if it is enabled.
    pub fn active_gradient(&self) -> Option<&Gradient> {
        self.gradient.enabled.then_some(&self.gradient)
    }

    /// Returns the color a glow takes on: the gradient's end color, or the foreground color.
    pub fn glow_color(&self) -> Color {
        self.active_gradient()
            .map_or(self.foreground_color, |gradient| gradient.end_color)
    }
}

/// The wire shape of a descriptor, before defaults and fallbacks are applied.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct RawStyle {
    #[serde(alias = "styleType")]
    pattern_type: Option<String>,
    eye_style: Option<String>,
    #[serde(alias = "fgColor")]
    foreground_color: Option<String>,
    #[serde(alias = "bgColor")]
    background_color: Option<String>,
    #[serde(alias = "gradientInfo")]
    gradient: Option<RawGradient>,
    #[serde(alias = "logoImage")]
    logo: Option<String>,
    #[serde(alias = "logoBgColor", deserialize_with = "present")]
    logo_background_color: Option<Option<String>>,
    #[serde(alias = "size")]
    canvas_size: Option<f64>,
    #[serde(alias = "margin")]
    quiet_zone_margin: Option<f64>,
    pixel_ratio: Option<f64>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct RawGradient {
    #[serde(alias = "active")]
    enabled: bool,
    #[serde(alias = "start")]
    start_color: Option<String>,
    #[serde(alias = "end")]
    end_color: Option<String>,
}

/// Distinguishes an explicit `null` (`Some(None)`) from a missing field (`None`).
fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Option<String>>, D::Error> {
    Option::<String>::deserialize(deserializer).map(Some)
}

fn color_or(value: Option<&str>, field: &'static str, default: Color) -> Color {
    match value {
        None => default,
        Some(s) => s.parse().unwrap_or_else(|err| {
            warn!(field, error = %err, "invalid color, using default");
            default
        }),
    }
}

fn positive_or(value: Option<f64>, field: &'static str, default: f32) -> f32 {
    match value {
        None => default,
        Some(v) if v > 0.0 && (v as f32).is_finite() => v as f32,
        Some(v) => {
            warn!(field, value = v, "out of range, using default");
            default
        }
    }
}

impl From<RawStyle> for StyleDescriptor {
    fn from(raw: RawStyle) -> Self {
        let defaults = StyleDescriptor::default();
        let gradient = raw.gradient.map_or(defaults.gradient, |g| Gradient {
            enabled: g.enabled,
            start_color: color_or(
                g.start_color.as_deref(),
                "gradient.startColor",
                defaults.gradient.start_color,
            ),
            end_color: color_or(
                g.end_color.as_deref(),
                "gradient.endColor",
                defaults.gradient.end_color,
            ),
        });
        let canvas_size = positive_or(
            raw.canvas_size,
            "canvasSize",
            defaults.canvas_size as f32,
        )
        .round()
        .max(1.0);
        let canvas_size = if canvas_size > MAX_SURFACE_SIZE as f32 {
            warn!(value = canvas_size, max = MAX_SURFACE_SIZE, "canvas size too large, clamping");
            MAX_SURFACE_SIZE
        } else {
            canvas_size as u32
        };
        // The surface side is canvasSize × pixelRatio device pixels.
        let max_ratio = MAX_SURFACE_SIZE as f32 / canvas_size as f32;
        let pixel_ratio = match positive_or(raw.pixel_ratio, "pixelRatio", defaults.pixel_ratio) {
            ratio if ratio > max_ratio => {
                warn!(value = ratio, max = max_ratio, "pixel ratio too large, clamping");
                max_ratio
            }
            ratio => ratio,
        };
        let quiet_zone_margin = match raw.quiet_zone_margin {
            Some(m) if m >= 0.0 && (m as f32).is_finite() => Some(m as f32),
            Some(m) => {
                warn!(value = m, "invalid quiet zone margin, using default");
                None
            }
            None => None,
        };

        Self {
            pattern_type: raw
                .pattern_type
                .as_deref()
                .map_or(defaults.pattern_type, PatternType::parse),
            eye_style: raw
                .eye_style
                .as_deref()
                .map_or(defaults.eye_style, EyeStyle::parse),
            foreground_color: color_or(
                raw.foreground_color.as_deref(),
                "foregroundColor",
                defaults.foreground_color,
            ),
            background_color: color_or(
                raw.background_color.as_deref(),
                "backgroundColor",
                defaults.background_color,
            ),
            gradient,
            logo: raw.logo.as_deref().and_then(LogoSource::parse),
            logo_background_color: raw
                .logo_background_color
                .map_or(defaults.logo_background_color, |value| {
                    LogoBackground::parse(value.as_deref())
                }),
            canvas_size,
            quiet_zone_margin,
            pixel_ratio,
        }
    }
}

impl<'de> Deserialize<'de> for StyleDescriptor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawStyle::deserialize(deserializer).map(Self::from)
    }
}
