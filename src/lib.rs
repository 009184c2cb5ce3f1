//! # uniqr
//!
//! A Rust library for generating "unique" QR codes: standard level-H symbols drawn with custom
//! module shapes, eye styles, gradients, glow effects and a centered logo, while staying
//! scannable.
//!
//! The pipeline has two stages:
//!
//! - The **encoder** turns a payload string into an immutable module matrix at error correction
//!   level H.
//! - The **renderer** turns that matrix and a style descriptor into a backend-neutral list of
//!   draw commands. The software rasterizer or the SVG writer then replay the list.
//!
//! ## Features
//!
//! - Data module patterns: standard (near-square), rounded, dots, neon glow, soft shadow.
//! - Finder pattern ("eye") styles: square, circle, rounded, independent of the data pattern.
//! - Solid or linear-gradient fills.
//! - Logo overlay with an optional shadowed backdrop; modules under the logo are left out and
//!   recovered by error correction.
//! - PNG, data URL, SVG, terminal and plain reference-image output.
//! - WiFi, vCard, mailto payload builders.
//!
//! ## Installation
//!
//! Add to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! uniqr = "0.1" # Replace with the latest version
//! ```
//!
//! ## Example
//!
//! Generate a neon QR code with a gradient and save it:
//!
//! ```rust,no_run
//! use uniqr::helper::generate_image;
//! use uniqr::style::StyleDescriptor;
//!
//! # async fn run() -> Result<(), uniqr::error::Error> {
//! let style = StyleDescriptor::from_json(r##"{
//!     "patternType": "neon",
//!     "eyeStyle": "rounded",
//!     "gradient": {"enabled": true, "startColor": "#6366f1", "endColor": "#ec4899"},
//!     "canvasSize": 380,
//!     "quietZoneMargin": 40
//! }"##).expect("valid style");
//! generate_image("Unique QR Code", &style, Some("output"), Some("styled_qr")).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`encoder`]: Payload to module matrix.
//! - [`style`]: Style descriptors and their JSON form.
//! - [`render`]: The stylized renderer.
//! - [`draw`]: Draw commands and render plans.
//! - [`raster`]: Software rasterizer.
//! - [`helper`]: Export and one-call generation helpers.
//! - [`payload`]: Payload string builders.

pub mod color;
pub mod draw;
pub mod encoder;
pub mod error;
pub mod helper;
pub mod logo;
pub mod payload;
pub mod raster;
pub mod render;
pub mod style;

pub use crate::color::Color;
pub use crate::draw::{DrawCommand, RenderPlan};
pub use crate::encoder::{encode, encode_or_empty, ModuleMatrix};
pub use crate::render::{plan, render, render_with};
pub use crate::style::StyleDescriptor;
