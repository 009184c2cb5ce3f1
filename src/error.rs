//! Error types.
//!
//! Most faults in this crate are recovered where they happen (see [`crate::encoder::encode_or_empty`]
//! and [`crate::render::render`]); these types surface only from the fallible lower-level calls.

use thiserror::Error;

/// The encoder could not produce a symbol for the payload.
#[derive(Error, Debug)]
pub enum EncodeError {
    /// The payload does not fit in a version 40 symbol at the requested level.
    #[error("payload of {0} bytes does not fit in a QR symbol")]
    DataTooLong(usize),

    #[error("encoder fault: {0}")]
    Internal(String),
}

/// A module matrix was built from rows that do not describe a square grid.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum MatrixError {
    #[error("row {row} has {found} modules, expected {expected}")]
    NotSquare {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// The logo asset could not be loaded or decoded.
#[derive(Error, Debug)]
pub enum LogoError {
    #[error("malformed data url")]
    MalformedDataUrl,

    #[error("invalid base64 logo payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("failed to read logo file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to decode logo image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("logo decode task did not complete: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// A style descriptor could not be parsed from, or written to, JSON.
#[derive(Error, Debug)]
pub enum StyleError {
    #[error("invalid style descriptor: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors from the export helpers.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
