//! JPEG frame codec.
//!
//! The server encodes every captured frame at a fixed per-session
//! quality; the client decodes the byte stream back into [`RawImage`]s.
//! Both directions are lossy in pixel values but exact in dimensions.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, ImageReader, RgbImage};

use crate::error::MiraError;
use crate::frame::{EncodedFrame, RawImage};

/// Default compression quality used by the server.
pub const DEFAULT_QUALITY: u8 = 50;

/// Encode a raw image as JPEG at the given quality (clamped to 1..=100).
///
/// Fails with [`MiraError::Encode`] on zero-sized input; the caller
/// treats that as "no frame available this tick", not as fatal.
pub fn encode(image: &RawImage, quality: u8) -> Result<EncodedFrame, MiraError> {
    if image.width == 0 || image.height == 0 {
        return Err(MiraError::Encode("zero-sized capture".into()));
    }

    let img: RgbImage = RgbImage::from_raw(image.width, image.height, image.data.clone())
        .ok_or_else(|| MiraError::Encode("pixel buffer does not match dimensions".into()))?;

    let mut buf = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
    img.write_with_encoder(encoder)
        .map_err(|e| MiraError::Encode(e.to_string()))?;

    Ok(EncodedFrame {
        data: buf.into_inner(),
    })
}

/// Decode a JPEG payload back into an RGB image.
///
/// Fails with [`MiraError::Decode`] on truncated or corrupt input; the
/// receive loop drops the frame and waits for the next one.
pub fn decode(frame: &EncodedFrame) -> Result<RawImage, MiraError> {
    let mut reader = ImageReader::new(Cursor::new(&frame.data));
    reader.set_format(ImageFormat::Jpeg);
    let decoded = reader
        .decode()
        .map_err(|e| MiraError::Decode(e.to_string()))?;

    let rgb = decoded.into_rgb8();
    let (width, height) = rgb.dimensions();
    Ok(RawImage {
        width,
        height,
        data: rgb.into_raw(),
    })
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(w: u32, h: u32) -> RawImage {
        let mut data = Vec::with_capacity((w * h * 3) as usize);
        for y in 0..h {
            for x in 0..w {
                data.push((x % 256) as u8);
                data.push((y % 256) as u8);
                data.push(((x + y) % 256) as u8);
            }
        }
        RawImage { width: w, height: h, data }
    }

    #[test]
    fn roundtrip_preserves_dimensions() {
        for quality in [1, 50, 100] {
            let img = gradient(100, 80);
            let encoded = encode(&img, quality).unwrap();
            let decoded = decode(&encoded).unwrap();
            assert_eq!(decoded.width, 100);
            assert_eq!(decoded.height, 80);
            assert_eq!(decoded.byte_len(), 100 * 80 * 3);
        }
    }

    #[test]
    fn lower_quality_shrinks_payload() {
        let img = gradient(320, 240);
        let low = encode(&img, 5).unwrap();
        let high = encode(&img, 95).unwrap();
        assert!(low.len() < high.len());
    }

    #[test]
    fn zero_sized_capture_is_encode_error() {
        let img = RawImage { width: 0, height: 0, data: Vec::new() };
        assert!(matches!(encode(&img, 50), Err(MiraError::Encode(_))));
    }

    #[test]
    fn corrupt_payload_is_decode_error() {
        let frame = EncodedFrame { data: vec![0xDE, 0xAD, 0xBE, 0xEF] };
        assert!(matches!(decode(&frame), Err(MiraError::Decode(_))));
    }

    #[test]
    fn truncated_payload_is_decode_error() {
        let img = gradient(64, 64);
        let mut encoded = encode(&img, 50).unwrap();
        encoded.data.truncate(encoded.len() / 2);
        assert!(matches!(decode(&encoded), Err(MiraError::Decode(_))));
    }

    #[test]
    fn quality_out_of_range_is_clamped() {
        let img = gradient(16, 16);
        // 0 would be rejected by the jpeg encoder; we clamp to 1.
        assert!(encode(&img, 0).is_ok());
        assert!(encode(&img, 255).is_ok());
    }
}
