//! Logo assets.
//!
//! A logo arrives as a `data:` URL (what an upload form produces), a file path, or raw encoded
//! bytes. Loading reads the bytes and decodes them on the blocking pool, so the caller's task
//! is never held up by image decoding.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::RgbaImage;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

use crate::error::LogoError;

/// Where to load a logo image from.
#[derive(Clone, PartialEq, Eq)]
pub enum LogoSource {
    /// A `data:<mime>;base64,<payload>` URL.
    DataUrl(String),
    /// A path on the local filesystem.
    Path(PathBuf),
    /// Encoded image bytes (PNG, JPEG, ...).
    Bytes(Arc<[u8]>),
}

impl LogoSource {
    /// Interprets a stored logo string: `data:` URLs stay URLs, anything else is a path.
    /// Blank strings mean "no logo".
    pub fn parse(source: &str) -> Option<Self> {
        let source = source.trim();
        if source.is_empty() {
            None
        } else if source.starts_with("data:") {
            Some(Self::DataUrl(source.to_string()))
        } else {
            Some(Self::Path(PathBuf::from(source)))
        }
    }

    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self::Bytes(bytes.into())
    }

    /// Reads and decodes the logo into an RGBA image.
    ///
    /// # Errors
    ///
    /// Returns a [`LogoError`] if the source cannot be read, is not valid base64, or does not
    /// decode as an image.
    pub async fn load(&self) -> Result<RgbaImage, LogoError> {
        let bytes = match self {
            Self::DataUrl(url) => decode_data_url(url)?,
            Self::Path(path) => tokio::fs::read(path).await?,
            Self::Bytes(bytes) => bytes.to_vec(),
        };
        debug!(bytes = bytes.len(), "decoding logo");
        let image = tokio::task::spawn_blocking(move || {
            image::load_from_memory(&bytes).map(|decoded| decoded.to_rgba8())
        })
        .await??;
        Ok(image)
    }

    /// Returns the string form stored alongside a style descriptor.
    pub fn to_source_string(&self) -> String {
        match self {
            Self::DataUrl(url) => url.clone(),
            Self::Path(path) => path.display().to_string(),
            Self::Bytes(bytes) => format!(
                "data:application/octet-stream;base64,{}",
                STANDARD.encode(bytes)
            ),
        }
    }
}

fn decode_data_url(url: &str) -> Result<Vec<u8>, LogoError> {
    let (meta, payload) = url
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(','))
        .ok_or(LogoError::MalformedDataUrl)?;
    if !meta.ends_with(";base64") {
        return Err(LogoError::MalformedDataUrl);
    }
    Ok(STANDARD.decode(payload.trim())?)
}

impl fmt::Debug for LogoSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DataUrl(url) => write!(f, "DataUrl({} chars)", url.len()),
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
        }
    }
}

impl Serialize for LogoSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_source_string())
    }
}

impl<'de> Deserialize<'de> for LogoSource {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).ok_or_else(|| serde::de::Error::custom("empty logo source"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba};
    use std::io::Cursor;

    fn png_bytes() -> Vec<u8> {
        let img = RgbaImage::from_pixel(4, 3, Rgba([200, 30, 30, 255]));
        let mut out = Vec::new();
        img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn test_parse_classifies_sources() {
        assert_eq!(LogoSource::parse("   "), None);
        assert!(matches!(
            LogoSource::parse("data:image/png;base64,AAAA"),
            Some(LogoSource::DataUrl(_))
        ));
        assert!(matches!(
            LogoSource::parse("assets/logo.png"),
            Some(LogoSource::Path(_))
        ));
    }

    #[tokio::test]
    async fn test_load_from_bytes_and_data_url() {
        let bytes = png_bytes();
        let from_bytes = LogoSource::from_bytes(bytes.clone()).load().await.unwrap();
        assert_eq!(from_bytes.dimensions(), (4, 3));

        let url = format!("data:image/png;base64,{}", STANDARD.encode(&bytes));
        let from_url = LogoSource::DataUrl(url).load().await.unwrap();
        assert_eq!(from_url, from_bytes);
    }

    #[tokio::test]
    async fn test_load_failures_are_typed() {
        let not_base64 = LogoSource::DataUrl("data:image/png,plain".into());
        assert!(matches!(
            not_base64.load().await,
            Err(LogoError::MalformedDataUrl)
        ));

        let garbage = LogoSource::from_bytes(vec![1u8, 2, 3, 4]);
        assert!(matches!(garbage.load().await, Err(LogoError::Decode(_))));

        let missing = LogoSource::Path(PathBuf::from("/nonexistent/uniqr/logo.png"));
        assert!(matches!(missing.load().await, Err(LogoError::Io(_))));
    }

    #[test]
    fn test_bytes_serialize_as_data_url() {
        let source = LogoSource::from_bytes(png_bytes());
        let json = serde_json::to_string(&source).unwrap();
        let back: LogoSource = serde_json::from_str(&json).unwrap();
        assert!(matches!(back, LogoSource::DataUrl(_)));
    }
}
