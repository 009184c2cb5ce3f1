use crate::draw::{DrawCommand, Paint, RenderPlan, Shadow, Shape};
use crate::encoder::{encode, ModuleMatrix};
use crate::error::Error;
use crate::render::render;
use crate::style::StyleDescriptor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::{GrayImage, ImageFormat, Luma, RgbaImage};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/*---- Utilities ----*/

// Returns a string of SVG code replaying the given plan.
// Gradients, shadows and clips become <defs> entries referenced by id.
// The string always uses Unix newlines (\n), regardless of the platform.
pub fn to_svg_string(plan: &RenderPlan) -> String {
	let size = plan.canvas_size;
	let mut defs = String::new();
	let mut body = String::new();
	let mut gradients: Vec<Paint> = Vec::new();
	let mut filters: Vec<Shadow> = Vec::new();
	let mut clips = 0usize;

	for command in &plan.commands {
		match command {
			DrawCommand::Clear(color) => {
				body += &format!(
					"\t<rect width=\"100%\" height=\"100%\" fill=\"{}\"{}/>\n",
					hex(color), opacity(color.a));
			}
			DrawCommand::Fill { shape, paint, shadow } => {
				let fill = match paint {
					Paint::Solid(color) => format!("fill=\"{}\"{}", hex(color), opacity(color.a)),
					Paint::LinearGradient { from, to, start, end } => {
						let id = match gradients.iter().position(|g| g == paint) {
							Some(id) => id,
							None => {
								defs += &format!(
									"\t\t<linearGradient id=\"g{}\" gradientUnits=\"userSpaceOnUse\" x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\">\n",
									gradients.len(), from.x, from.y, to.x, to.y);
								defs += &format!("\t\t\t<stop offset=\"0\" stop-color=\"{}\"/>\n", hex(start));
								defs += &format!("\t\t\t<stop offset=\"1\" stop-color=\"{}\"/>\n", hex(end));
								defs += "\t\t</linearGradient>\n";
								gradients.push(*paint);
								gradients.len() - 1
							}
						};
						format!("fill=\"url(#g{})\"", id)
					}
				};
				let filter = match shadow {
					None => String::new(),
					Some(shadow) => {
						let id = match filters.iter().position(|f| f == shadow) {
							Some(id) => id,
							None => {
								defs += &format!(
									"\t\t<filter id=\"f{}\" x=\"-50%\" y=\"-50%\" width=\"200%\" height=\"200%\">\n",
									filters.len());
								defs += &format!(
									"\t\t\t<feDropShadow dx=\"{}\" dy=\"{}\" stdDeviation=\"{}\" flood-color=\"{}\" flood-opacity=\"{:.3}\"/>\n",
									shadow.offset.x, shadow.offset.y, shadow.blur / 2.0,
									hex(&shadow.color), f32::from(shadow.color.a) / 255.0);
								defs += "\t\t</filter>\n";
								filters.push(*shadow);
								filters.len() - 1
							}
						};
						format!(" filter=\"url(#f{})\"", id)
					}
				};
				body += &format!("\t{} {}{}/>\n", svg_shape(shape), fill, filter);
			}
			DrawCommand::Image { image, dest, clip } => {
				// Encode first so a skipped image leaves no clip def behind
				let href = match png_bytes(image) {
					Ok(bytes) => format!("data:image/png;base64,{}", STANDARD.encode(bytes)),
					Err(err) => {
						warn!(error = %err, "image could not be encoded, leaving it out of the svg");
						continue;
					}
				};
				let clip_attr = match clip {
					None => String::new(),
					Some(shape) => {
						defs += &format!("\t\t<clipPath id=\"c{}\">{}/></clipPath>\n", clips, svg_shape(shape));
						clips += 1;
						format!(" clip-path=\"url(#c{})\"", clips - 1)
					}
				};
				body += &format!(
					"\t<image href=\"{}\" x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" preserveAspectRatio=\"none\"{}/>\n",
					href, dest.x, dest.y, dest.width, dest.height, clip_attr);
			}
		}
	}

	let mut result = String::new();
	result += "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";
	result += &format!(
		"<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\" width=\"{0}\" height=\"{0}\" viewBox=\"0 0 {0} {0}\" stroke=\"none\">\n", size);
	if !defs.is_empty() {
		result += "\t<defs>\n";
		result += &defs;
		result += "\t</defs>\n";
	}
	result += &body;
	result += "</svg>\n";
	result
}

// Opening tag (without the closing "/>") for a shape.
fn svg_shape(shape: &Shape) -> String {
	match shape {
		Shape::Rect(r) => format!("<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\"", r.x, r.y, r.width, r.height),
		Shape::RoundRect { rect: r, .. } => {
			let radius = shape.effective_radius();
			format!("<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"{}\"", r.x, r.y, r.width, r.height, radius)
		}
		Shape::Circle { center, radius } => format!("<circle cx=\"{}\" cy=\"{}\" r=\"{}\"", center.x, center.y, radius),
	}
}

fn hex(color: &crate::color::Color) -> String {
	format!("#{:02x}{:02x}{:02x}", color.r, color.g, color.b)
}

fn opacity(alpha: u8) -> String {
	if alpha == 255 {
		String::new()
	} else {
		format!(" fill-opacity=\"{:.3}\"", f32::from(alpha) / 255.0)
	}
}

/// Renders the given matrix as text, two characters per module, with a light border.
pub fn to_terminal_string(matrix: &ModuleMatrix, border: usize) -> String {
	let size = matrix.size() + 2 * border;
	let mut result = String::new();
	for y in 0 .. size {
		for x in 0 .. size {
			let dark = x >= border && y >= border && matrix.get(x - border, y - border);
			let c: char = if dark { '█' } else { ' ' };
			result.push(c);
			result.push(c);
		}
		result.push('\n');
	}
	result
}

/// Prints the given matrix to the console.
pub fn print_qr(matrix: &ModuleMatrix) {
	println!("{}", to_terminal_string(matrix, 4));
}

/// Plain black-on-white image of a matrix, `scale` pixels per module, with `border` light
/// modules around it. This is the unstyled reference rendering.
///
/// # Example
///
/// ```
/// use uniqr::{encoder::encode, helper::to_luma_image};
///
/// let matrix = encode("HELLO").unwrap();
/// let img = to_luma_image(&matrix, 1, 4);
/// assert_eq!(img.dimensions(), (29, 29));
/// ```
pub fn to_luma_image(matrix: &ModuleMatrix, scale: u32, border: u32) -> GrayImage {
	let scale = scale.max(1);
	let size = (matrix.size() as u32 + 2 * border) * scale;
	let mut img = GrayImage::new(size, size);

	for (x, y, pixel) in img.enumerate_pixels_mut() {
		let qr_x = (x / scale) as i64 - border as i64;
		let qr_y = (y / scale) as i64 - border as i64;
		let dark = qr_x >= 0 && qr_y >= 0 && matrix.get(qr_x as usize, qr_y as usize);
		*pixel = if dark {
			Luma([0u8]) // Black
		} else {
			Luma([255u8]) // White
		};
	}

	img
}

/// Encodes a raster surface as PNG.
pub fn png_bytes(image: &RgbaImage) -> Result<Vec<u8>, image::ImageError> {
	let mut bytes = Vec::new();
	image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
	Ok(bytes)
}

/// Encodes a raster surface as a `data:image/png;base64,...` URL, ready for upload or preview.
pub fn to_data_url(image: &RgbaImage) -> Result<String, image::ImageError> {
	Ok(format!("data:image/png;base64,{}", STANDARD.encode(png_bytes(image)?)))
}

/// Saves a raster surface as PNG.
///
/// # Arguments
///
/// * `image` - The rendered surface.
/// * `directory_path` - Optional. The directory the image is saved in. Defaults to "generated"; created if missing.
/// * `filename` - Optional. The file name without extension. Defaults to a millisecond timestamp.
///
/// # Errors
///
/// Returns an [`Error`] if the directory cannot be created or the image cannot be written.
pub fn save_png(image: &RgbaImage, directory_path: Option<&str>, filename: Option<&str>) -> Result<PathBuf, Error> {
	let directory_path = directory_path.unwrap_or("generated");
	let filename = match filename {
		Some(name) => name.to_string(),
		None => SystemTime::now()
			.duration_since(UNIX_EPOCH)
			.map(|since_the_epoch| since_the_epoch.as_millis())
			.unwrap_or_default()
			.to_string(),
	};

	// Check if the directory exists, create it if it doesn't
	if !Path::new(directory_path).exists() {
		fs::create_dir_all(directory_path)?;
	}

	let file_path = Path::new(directory_path).join(format!("{}.png", filename));
	image.save(&file_path)?;
	debug!(path = %file_path.display(), "saved qr image");
	Ok(file_path)
}

/// Encodes `content` at level H and renders it with `style`.
///
/// # Errors
///
/// Returns [`Error::Encode`] if the content does not fit in a QR symbol. Use
/// [`crate::encoder::encode_or_empty`] with [`render`] to get a placeholder instead.
pub async fn generate_plan(content: &str, style: &StyleDescriptor) -> Result<RenderPlan, Error> {
	let matrix = encode(content)?;
	Ok(render(&matrix, style).await)
}

/// Generates a styled QR code raster surface from the provided content.
///
/// # Example
///
/// ```
/// use uniqr::{helper::generate_image_buffer, style::StyleDescriptor};
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let style = StyleDescriptor { canvas_size: 256, ..StyleDescriptor::default() };
/// let img = generate_image_buffer("Hello, World!", &style).await.unwrap();
/// assert_eq!(img.dimensions(), (256, 256));
/// # });
/// ```
pub async fn generate_image_buffer(content: &str, style: &StyleDescriptor) -> Result<RgbaImage, Error> {
	Ok(generate_plan(content, style).await?.rasterize())
}

/// Generates a styled QR code as an SVG document.
pub async fn generate_svg_string(content: &str, style: &StyleDescriptor) -> Result<String, Error> {
	Ok(to_svg_string(&generate_plan(content, style).await?))
}

/// Generates a styled QR code and saves it as PNG, returning the written path.
pub async fn generate_image(
	content: &str,
	style: &StyleDescriptor,
	directory: Option<&str>,
	filename: Option<&str>,
) -> Result<PathBuf, Error> {
	let img = generate_image_buffer(content, style).await?;
	save_png(&img, directory, filename)
}
