//! LSB steganography over the red channel.
//!
//! Layout, one bit per pixel in row-major order starting at pixel 0:
//!
//! ```text
//! pixels 0..32        message byte length, bit i in pixel i
//! pixels 32..32+8n    message bytes, bit 0 (LSB) of each byte first
//! ```
//!
//! Every bit lives in the least significant bit of the pixel's red channel.

use crate::config::{StegoConfig, StegoLimits};
use crate::error::{LabError, Result};
use image::{DynamicImage, ImageFormat, RgbaImage};
use std::io::Cursor;
use thiserror::Error;

const PREFIX_BITS: usize = StegoConfig::LENGTH_PREFIX_BITS;

/// Errors from hiding or extracting a message.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StegoError {
    #[error("image is too small ({width}x{height})")]
    ImageTooSmall { width: u32, height: u32 },

    #[error("message is empty")]
    EmptyMessage,

    #[error("message is too long, maximum length is {max_chars} characters")]
    MessageTooLong { max_chars: usize },

    #[error("no hidden message in the image or it is corrupted")]
    NoHiddenMessage,

    #[error("extracted message contains invalid characters")]
    InvalidCharacters,

    #[error("image is too small to hold the message (pixel {index} is out of range)")]
    PixelOutOfRange { index: usize },
}

/// Whether a character may appear in a hidden message.
pub fn is_printable(c: char) -> bool {
    c.is_whitespace() || !c.is_control()
}

/// Usable message bytes for an image of the given size.
pub fn max_chars(width: u32, height: u32) -> usize {
    let pixels = width as usize * height as usize;
    pixels.saturating_sub(PREFIX_BITS) / 8
}

/// Map a linear pixel index to `(x, y)`, failing past the last row.
fn pixel_coords(index: usize, width: u32, height: u32) -> std::result::Result<(u32, u32), StegoError> {
    let width = width as usize;
    if width == 0 {
        return Err(StegoError::PixelOutOfRange { index });
    }
    let (x, y) = (index % width, index / width);
    if y >= height as usize {
        return Err(StegoError::PixelOutOfRange { index });
    }
    Ok((x as u32, y as u32))
}

fn write_bit(image: &mut RgbaImage, index: usize, bit: bool) -> std::result::Result<(), StegoError> {
    let (x, y) = pixel_coords(index, image.width(), image.height())?;
    let pixel = image.get_pixel_mut(x, y);
    pixel.0[0] = (pixel.0[0] & 0xFE) | u8::from(bit);
    Ok(())
}

fn read_bit(image: &RgbaImage, index: usize) -> std::result::Result<bool, StegoError> {
    let (x, y) = pixel_coords(index, image.width(), image.height())?;
    Ok(image.get_pixel(x, y).0[0] & 1 == 1)
}

/// Red-channel LSB codec with a minimum image size.
#[derive(Debug, Clone, Copy, Default)]
pub struct LsbCodec {
    limits: StegoLimits,
}

impl LsbCodec {
    pub fn new(limits: StegoLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> StegoLimits {
        self.limits
    }

    fn check_size(&self, width: u32, height: u32) -> std::result::Result<(), StegoError> {
        if self.limits.admits(width, height) {
            Ok(())
        } else {
            Err(StegoError::ImageTooSmall { width, height })
        }
    }

    /// Embed `message` into a copy of `image`. The source is never modified.
    pub fn hide(&self, image: &DynamicImage, message: &str) -> std::result::Result<RgbaImage, StegoError> {
        let (width, height) = (image.width(), image.height());
        self.check_size(width, height)?;

        if message.is_empty() {
            return Err(StegoError::EmptyMessage);
        }
        let bytes = message.as_bytes();
        let capacity = max_chars(width, height);
        if bytes.len() > capacity {
            return Err(StegoError::MessageTooLong {
                max_chars: capacity,
            });
        }

        let mut carrier = image.to_rgba8();
        let length = bytes.len() as u32;
        for i in 0..PREFIX_BITS {
            write_bit(&mut carrier, i, (length >> i) & 1 == 1)?;
        }
        for (byte_index, byte) in bytes.iter().enumerate() {
            for bit in 0..8 {
                let index = PREFIX_BITS + byte_index * 8 + bit;
                write_bit(&mut carrier, index, (byte >> bit) & 1 == 1)?;
            }
        }

        Ok(carrier)
    }

    /// Recover a message previously embedded with [`hide`](Self::hide).
    pub fn extract(&self, image: &DynamicImage) -> std::result::Result<String, StegoError> {
        let (width, height) = (image.width(), image.height());
        self.check_size(width, height)?;

        let carrier = image.to_rgba8();
        let mut length = 0u32;
        for i in 0..PREFIX_BITS {
            if read_bit(&carrier, i)? {
                length |= 1 << i;
            }
        }

        let length = length as usize;
        if length == 0 || length > max_chars(width, height) {
            return Err(StegoError::NoHiddenMessage);
        }

        let mut bytes = vec![0u8; length];
        for (byte_index, byte) in bytes.iter_mut().enumerate() {
            for bit in 0..8 {
                if read_bit(&carrier, PREFIX_BITS + byte_index * 8 + bit)? {
                    *byte |= 1 << bit;
                }
            }
        }

        let message = String::from_utf8(bytes).map_err(|_| StegoError::InvalidCharacters)?;
        if !message.chars().all(is_printable) {
            return Err(StegoError::InvalidCharacters);
        }
        Ok(message)
    }
}

/// Decode an image from bytes, sniffing the format.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(bytes).map_err(|e| LabError::Image {
        message: format!("failed to load image: {}", e),
        source: Some(e),
    })
}

/// Encode an RGBA image as PNG bytes.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn gradient(width: u32, height: u32) -> DynamicImage {
        let img = RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x * 7 + y) as u8, (y * 3) as u8, (x ^ y) as u8, 255])
        });
        DynamicImage::ImageRgba8(img)
    }

    #[test]
    fn test_capacity() {
        assert_eq!(max_chars(10, 10), 8);
        assert_eq!(max_chars(4, 4), 0);
        assert_eq!(max_chars(100, 50), (5000 - 32) / 8);
    }

    #[test]
    fn test_roundtrip() {
        let codec = LsbCodec::default();
        let image = gradient(64, 48);
        for message in ["hello", "multi\nline\ttext", "ünïcødé ✓"] {
            let hidden = codec.hide(&image, message).unwrap();
            let extracted = codec
                .extract(&DynamicImage::ImageRgba8(hidden))
                .unwrap();
            assert_eq!(extracted, message);
        }
    }

    #[test]
    fn test_roundtrip_through_png() {
        let codec = LsbCodec::default();
        let hidden = codec.hide(&gradient(32, 32), "via png").unwrap();
        let png = encode_png(&hidden).unwrap();
        let decoded = decode_image(&png).unwrap();
        assert_eq!(codec.extract(&decoded).unwrap(), "via png");
    }

    #[test]
    fn test_ten_by_ten_holds_eight_chars() {
        let codec = LsbCodec::default();
        let image = gradient(10, 10);
        assert!(codec.hide(&image, "12345678").is_ok());
        assert_eq!(
            codec.hide(&image, "123456789"),
            Err(StegoError::MessageTooLong { max_chars: 8 })
        );
    }

    #[test]
    fn test_capacity_counts_utf8_bytes() {
        let codec = LsbCodec::default();
        // Four characters, eight bytes.
        assert!(codec.hide(&gradient(10, 10), "ёёёё").is_ok());
        assert!(codec.hide(&gradient(10, 10), "ёёёёё").is_err());
    }

    #[test]
    fn test_rejected_hide_leaves_source_untouched() {
        let codec = LsbCodec::default();
        let image = gradient(10, 10);
        let before = image.to_rgba8().into_raw();
        assert!(codec.hide(&image, "far too long for this").is_err());
        assert_eq!(image.to_rgba8().into_raw(), before);
    }

    #[test]
    fn test_only_red_lsb_changes() {
        let codec = LsbCodec::default();
        let image = gradient(16, 16);
        let hidden = codec.hide(&image, "abc").unwrap();
        for (a, b) in image.to_rgba8().pixels().zip(hidden.pixels()) {
            assert_eq!(a.0[0] & 0xFE, b.0[0] & 0xFE);
            assert_eq!(a.0[1..], b.0[1..]);
        }
    }

    #[test]
    fn test_small_image_rejected() {
        let codec = LsbCodec::default();
        assert_eq!(
            codec.hide(&gradient(9, 40), "a"),
            Err(StegoError::ImageTooSmall { width: 9, height: 40 })
        );
        assert_eq!(
            codec.extract(&gradient(40, 9)),
            Err(StegoError::ImageTooSmall { width: 40, height: 9 })
        );
    }

    #[test]
    fn test_clean_image_has_no_message() {
        let blank = DynamicImage::ImageRgba8(RgbaImage::from_pixel(20, 20, Rgba([0, 0, 0, 255])));
        assert_eq!(
            LsbCodec::default().extract(&blank),
            Err(StegoError::NoHiddenMessage)
        );
    }

    #[test]
    fn test_control_characters_rejected_on_extract() {
        let codec = LsbCodec::default();
        let hidden = codec.hide(&gradient(32, 32), "a\u{7}b").unwrap();
        assert_eq!(
            codec.extract(&DynamicImage::ImageRgba8(hidden)),
            Err(StegoError::InvalidCharacters)
        );
    }

    #[test]
    fn test_out_of_range_pixel_is_an_error() {
        // No floor at all, so the scan itself has to catch the short image.
        let codec = LsbCodec::new(StegoLimits::new(0, 0));
        assert_eq!(
            codec.extract(&gradient(4, 4)),
            Err(StegoError::PixelOutOfRange { index: 16 })
        );
    }

    #[test]
    fn test_empty_message_rejected() {
        assert_eq!(
            LsbCodec::default().hide(&gradient(10, 10), ""),
            Err(StegoError::EmptyMessage)
        );
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(decode_image(b"definitely not an image").is_err());
    }
}
