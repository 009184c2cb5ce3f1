//! QR symbol encoding.
//!
//! This module turns a payload string into an immutable [`ModuleMatrix`]. The error correction
//! codewords and mask selection come from the `qrcode` crate, which follows the QR Code Model 2
//! specification; this module only fixes the error correction level and exposes the grid in the
//! shape the renderer consumes.
//!
//! The default level is [`Ecc::High`]. The renderer removes modules under a logo and reshapes
//! every data module, and only level H keeps enough redundancy for the symbol to survive that.

use qrcode::types::QrError;
use qrcode::{Color as QrColor, EcLevel, QrCode};
use tracing::{debug, warn};

use crate::error::{EncodeError, MatrixError};

/// Side length of a finder pattern, in modules.
pub const FINDER_SIZE: usize = 7;

/// The error correction level.
///
/// Wraps the four standard tiers; the numbers give the approximate share of codewords that can be
/// restored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Ecc {
    /// About 7% of codewords can be restored.
    Low,
    /// About 15%.
    Medium,
    /// About 25%.
    Quartile,
    /// About 30%. Used for every styled symbol.
    #[default]
    High,
}

impl Ecc {
    fn level(self) -> EcLevel {
        match self {
            Ecc::Low => EcLevel::L,
            Ecc::Medium => EcLevel::M,
            Ecc::Quartile => EcLevel::Q,
            Ecc::High => EcLevel::H,
        }
    }
}

/// A square grid of dark and light modules.
///
/// Instances are immutable after creation. The renderer only reads them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModuleMatrix {
    size: usize,
    modules: Vec<bool>,
}

impl ModuleMatrix {
    /// The 0×0 matrix substituted when encoding fails.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a matrix from rows of module values (`true` = dark).
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::NotSquare`] if any row's length differs from the number of rows.
    pub fn from_rows(rows: Vec<Vec<bool>>) -> Result<Self, MatrixError> {
        let size = rows.len();
        let mut modules = Vec::with_capacity(size * size);
        for (row, cells) in rows.into_iter().enumerate() {
            if cells.len() != size {
                return Err(MatrixError::NotSquare {
                    row,
                    expected: size,
                    found: cells.len(),
                });
            }
            modules.extend(cells);
        }
        Ok(Self { size, modules })
    }

    /// Returns the width and height of the matrix, in modules.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns the QR version implied by the side length, if it is a standard one (1 to 40).
    pub fn version(&self) -> Option<u8> {
        if self.size < 21 || self.size > 177 || (self.size - 17) % 4 != 0 {
            return None;
        }
        u8::try_from((self.size - 17) / 4).ok()
    }

    /// Returns the color of the module at the given coordinates.
    ///
    /// Returns `true` for dark modules and `false` for light modules. Coordinates outside the
    /// matrix return `false`.
    ///
    /// # Arguments
    ///
    /// * `x` - X-coordinate (0 is left).
    /// * `y` - Y-coordinate (0 is top).
    pub fn get(&self, x: usize, y: usize) -> bool {
        x < self.size && y < self.size && self.modules[y * self.size + x]
    }

    /// Returns whether `(x, y)` lies inside one of the three 7×7 finder patterns
    /// (top-left, top-right, bottom-left).
    pub fn is_finder(&self, x: usize, y: usize) -> bool {
        let n = self.size;
        if n < FINDER_SIZE {
            return false;
        }
        (x < FINDER_SIZE && y < FINDER_SIZE)
            || (x >= n - FINDER_SIZE && y < FINDER_SIZE)
            || (x < FINDER_SIZE && y >= n - FINDER_SIZE)
    }

    /// Returns the number of dark modules.
    pub fn dark_count(&self) -> usize {
        self.modules.iter().filter(|&&dark| dark).count()
    }

    /// Iterates over the rows, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[bool]> {
        // chunks(0) panics, and an empty matrix has no rows anyway
        self.modules.chunks(self.size.max(1))
    }
}

/// Encodes a payload at error correction level H.
///
/// The payload is opaque: plain text, a structured WiFi/vCard/mailto string, or ciphertext all
/// go through the same path. Segment modes (numeric, alphanumeric, byte) are chosen
/// automatically and the smallest fitting version is used. An empty payload yields a version 1
/// symbol.
///
/// # Example
///
/// ```rust
/// use uniqr::encoder::encode;
///
/// let matrix = encode("Unique QR Code").unwrap();
/// assert_eq!(matrix.size(), 25);
/// ```
pub fn encode(payload: &str) -> Result<ModuleMatrix, EncodeError> {
    encode_with(payload, Ecc::High)
}

/// Encodes a payload at the given error correction level.
///
/// # Errors
///
/// Returns [`EncodeError::DataTooLong`] when the payload exceeds version 40 capacity, or
/// [`EncodeError::Internal`] for any other encoder fault.
pub fn encode_with(payload: &str, ecc: Ecc) -> Result<ModuleMatrix, EncodeError> {
    let code = QrCode::with_error_correction_level(payload.as_bytes(), ecc.level()).map_err(
        |err| match err {
            QrError::DataTooLong => EncodeError::DataTooLong(payload.len()),
            other => EncodeError::Internal(other.to_string()),
        },
    )?;

    let size = code.width();
    let modules = code
        .to_colors()
        .into_iter()
        .map(|color| color == QrColor::Dark)
        .collect();
    debug!(bytes = payload.len(), size, ?ecc, "encoded payload");
    Ok(ModuleMatrix { size, modules })
}

/// Encodes a payload at level H, substituting an empty matrix on failure.
///
/// Encoder faults are logged and never reach the caller.
pub fn encode_or_empty(payload: &str) -> ModuleMatrix {
    encode(payload).unwrap_or_else(|err| {
        warn!(error = %err, "encoding failed, using an empty matrix");
        ModuleMatrix::empty()
    })
}
