//! Raw and encoded frame types.
//!
//! [`RawImage`] is the in-memory representation produced by screen
//! capture and consumed by the renderer. [`EncodedFrame`] is the opaque
//! compressed payload that crosses the wire as a length-prefixed unit.

use image::RgbImage;
use image::imageops::{self, FilterType};

use crate::error::MiraError;

// ── RawImage ─────────────────────────────────────────────────────

/// An uncompressed RGB8 image, rows packed tightly (no stride padding).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `width * height * 3` bytes, row-major RGB.
    pub data: Vec<u8>,
}

impl RawImage {
    /// Bytes per pixel for the RGB8 layout.
    pub const BYTES_PER_PIXEL: usize = 3;

    /// Construct from a tightly packed RGB buffer.
    pub fn from_rgb(width: u32, height: u32, data: Vec<u8>) -> Result<Self, MiraError> {
        let expected = width as usize * height as usize * Self::BYTES_PER_PIXEL;
        if data.len() != expected {
            return Err(MiraError::Decode(format!(
                "pixel buffer size mismatch: {} bytes for {width}x{height}",
                data.len(),
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// A solid-color image, mainly useful for tests and stub captures.
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize * 3);
        for _ in 0..width as usize * height as usize {
            data.extend_from_slice(&rgb);
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Total byte size of the pixel buffer.
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    /// Resample to `new_width` x `new_height` (Lanczos3).
    ///
    /// Used by the client to fit a received frame into the viewer area.
    pub fn resize_to(&self, new_width: u32, new_height: u32) -> Result<RawImage, MiraError> {
        if new_width == 0 || new_height == 0 {
            return Err(MiraError::Decode("resize to zero dimensions".into()));
        }
        let img: RgbImage = RgbImage::from_raw(self.width, self.height, self.data.clone())
            .ok_or_else(|| MiraError::Decode("invalid source dimensions".into()))?;
        let resized = imageops::resize(&img, new_width, new_height, FilterType::Lanczos3);
        Ok(RawImage {
            width: new_width,
            height: new_height,
            data: resized.into_raw(),
        })
    }
}

// ── EncodedFrame ─────────────────────────────────────────────────

/// A compressed frame ready for transmission.
///
/// The wire length header always equals `data.len()`; the receiver
/// trusts the declared length and never scans for delimiters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFrame {
    /// Opaque compressed payload (JPEG).
    pub data: Vec<u8>,
}

impl EncodedFrame {
    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

// ── Tests ────────────────────────────────────────────────────────
