//! Fixed 18-byte TGA file header

use super::{PixelFormat, TgaError};

pub const HEADER_SIZE: usize = 18;

/// Image types this codec knows about
pub const IMAGE_TYPE_TRUE_COLOR: u8 = 2;
pub const IMAGE_TYPE_GRAYSCALE: u8 = 3;
pub const IMAGE_TYPE_RLE_TRUE_COLOR: u8 = 10;
pub const IMAGE_TYPE_RLE_GRAYSCALE: u8 = 11;

/// Descriptor bit: rows are stored in the codec's native order
pub const DESCRIPTOR_NATIVE_ROWS: u8 = 0x20;
/// Descriptor bit: columns are stored right to left
pub const DESCRIPTOR_RIGHT_TO_LEFT: u8 = 0x10;

/// Raw header fields, little-endian on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TgaHeader {
    pub id_len: u8,
    pub color_map_type: u8,
    pub image_type: u8,
    pub color_map_idx: u16,
    pub color_map_len: u16,
    pub color_map_bpp: u8,
    pub image_pos_x: u16,
    pub image_pos_y: u16,
    pub image_width: u16,
    pub image_height: u16,
    pub image_bpp: u8,
    pub image_descriptor: u8,
}

impl TgaHeader {
    /// Header for an uncompressed image of the given size, native row order
    pub fn uncompressed(width: u16, height: u16, format: PixelFormat) -> Self {
        Self {
            image_type: match format {
                PixelFormat::Grayscale => IMAGE_TYPE_GRAYSCALE,
                PixelFormat::Rgb | PixelFormat::Rgba => IMAGE_TYPE_TRUE_COLOR,
            },
            image_width: width,
            image_height: height,
            image_bpp: format.bits(),
            image_descriptor: DESCRIPTOR_NATIVE_ROWS,
            ..Self::default()
        }
    }

    pub fn parse(bytes: &[u8]) -> Result<Self, TgaError> {
        if bytes.len() < HEADER_SIZE {
            return Err(TgaError::Truncated {
                expected: HEADER_SIZE,
                actual: bytes.len(),
            });
        }
        let u16_at = |i: usize| u16::from_le_bytes([bytes[i], bytes[i + 1]]);
        Ok(Self {
            id_len: bytes[0],
            color_map_type: bytes[1],
            image_type: bytes[2],
            color_map_idx: u16_at(3),
            color_map_len: u16_at(5),
            color_map_bpp: bytes[7],
            image_pos_x: u16_at(8),
            image_pos_y: u16_at(10),
            image_width: u16_at(12),
            image_height: u16_at(14),
            image_bpp: bytes[16],
            image_descriptor: bytes[17],
        })
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[0] = self.id_len;
        out[1] = self.color_map_type;
        out[2] = self.image_type;
        out[3..5].copy_from_slice(&self.color_map_idx.to_le_bytes());
        out[5..7].copy_from_slice(&self.color_map_len.to_le_bytes());
        out[7] = self.color_map_bpp;
        out[8..10].copy_from_slice(&self.image_pos_x.to_le_bytes());
        out[10..12].copy_from_slice(&self.image_pos_y.to_le_bytes());
        out[12..14].copy_from_slice(&self.image_width.to_le_bytes());
        out[14..16].copy_from_slice(&self.image_height.to_le_bytes());
        out[16] = self.image_bpp;
        out[17] = self.image_descriptor;
        out
    }

    pub fn is_rle(&self) -> bool {
        matches!(
            self.image_type,
            IMAGE_TYPE_RLE_TRUE_COLOR | IMAGE_TYPE_RLE_GRAYSCALE
        )
    }

    /// Rows need flipping to reach the in-memory convention
    pub fn needs_vertical_flip(&self) -> bool {
        self.image_descriptor & DESCRIPTOR_NATIVE_ROWS == 0
    }

    pub fn needs_horizontal_flip(&self) -> bool {
        self.image_descriptor & DESCRIPTOR_RIGHT_TO_LEFT != 0
    }
}
