//! TGA image container
//!
//! In-memory pixel grid plus the Truevision TGA codec used for both the
//! texture input and the rendered output:
//! - Uncompressed true-color / grayscale (types 2 and 3)
//! - Run-length encoded variants on decode only (types 10 and 11)
//! - Vertical and horizontal flips for origin correction

mod codec;
mod header;

pub use codec::*;
pub use header::*;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rasterizer::Color;

/// Errors produced while creating, decoding or writing images
#[derive(Error, Debug)]
pub enum TgaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image dimensions must be non-zero (got {width}x{height})")]
    ZeroDimension { width: usize, height: usize },

    #[error("image {width}x{height} does not fit the 16-bit TGA size fields")]
    DimensionTooLarge { width: usize, height: usize },

    #[error("truncated image data: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("TGA files with a color map are unsupported")]
    ColorMapUnsupported,

    #[error("unknown TGA image type: {0}")]
    UnknownImageType(u8),

    #[error("unsupported bits per pixel: {0}")]
    UnsupportedBitsPerPixel(u8),

    #[error("RLE packet at byte {offset} needs {requested} bytes but only {remaining} remain in the image")]
    RlePacketOverrun {
        offset: usize,
        requested: usize,
        remaining: usize,
    },

    #[error("pixel ({x}, {y}) is outside the image")]
    PixelOutOfBounds { x: usize, y: usize },
}

/// Storage layout of one pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelFormat {
    Grayscale = 1,
    Rgb = 3,
    Rgba = 4,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        self as usize
    }

    /// Map a header bits-per-pixel value to a format
    pub fn from_bits(bits: u8) -> Result<Self, TgaError> {
        match bits {
            8 => Ok(PixelFormat::Grayscale),
            24 => Ok(PixelFormat::Rgb),
            32 => Ok(PixelFormat::Rgba),
            other => Err(TgaError::UnsupportedBitsPerPixel(other)),
        }
    }

    pub fn bits(self) -> u8 {
        (self.bytes_per_pixel() * 8) as u8
    }
}

/// Row-major pixel grid. `data.len()` is always `width * height * bpp`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    format: PixelFormat,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Zero-initialized buffer
    pub fn new(width: usize, height: usize, format: PixelFormat) -> Result<Self, TgaError> {
        if width == 0 || height == 0 {
            return Err(TgaError::ZeroDimension { width, height });
        }
        Ok(Self {
            width,
            height,
            format,
            data: vec![0; width * height * format.bytes_per_pixel()],
        })
    }

    /// Wrap existing pixel bytes; the length must match the dimensions exactly.
    pub fn from_raw(
        width: usize,
        height: usize,
        format: PixelFormat,
        data: Vec<u8>,
    ) -> Result<Self, TgaError> {
        if width == 0 || height == 0 {
            return Err(TgaError::ZeroDimension { width, height });
        }
        let expected = width * height * format.bytes_per_pixel();
        if data.len() != expected {
            return Err(TgaError::Truncated { expected, actual: data.len() });
        }
        Ok(Self { width, height, format, data })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn bytes_per_pixel(&self) -> usize {
        self.format.bytes_per_pixel()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    fn offset(&self, x: usize, y: usize) -> usize {
        (x + y * self.width) * self.bytes_per_pixel()
    }

    /// Read a pixel. Coordinates must be inside the image.
    pub fn get_pixel(&self, x: usize, y: usize) -> Color {
        assert!(
            x < self.width && y < self.height,
            "get_pixel({}, {}) outside {}x{} image",
            x,
            y,
            self.width,
            self.height
        );
        let i = self.offset(x, y);
        let px = &self.data[i..i + self.bytes_per_pixel()];
        match self.format {
            PixelFormat::Grayscale => Color::gray(px[0]),
            PixelFormat::Rgb => Color::new(px[0], px[1], px[2]),
            PixelFormat::Rgba => Color::with_alpha(px[0], px[1], px[2], px[3]),
        }
    }

    /// Write a pixel. Out-of-range coordinates leave the buffer untouched.
    pub fn set_pixel(&mut self, x: usize, y: usize, color: Color) -> Result<(), TgaError> {
        if x >= self.width || y >= self.height {
            return Err(TgaError::PixelOutOfBounds { x, y });
        }
        let i = self.offset(x, y);
        self.write_at(i, color);
        Ok(())
    }

    fn write_at(&mut self, i: usize, color: Color) {
        match self.format {
            PixelFormat::Grayscale => self.data[i] = color.r,
            PixelFormat::Rgb => self.data[i..i + 3].copy_from_slice(&[color.r, color.g, color.b]),
            PixelFormat::Rgba => {
                self.data[i..i + 4].copy_from_slice(&[color.r, color.g, color.b, color.a])
            }
        }
    }

    /// Fill every pixel with `color`
    pub fn clear(&mut self, color: Color) {
        let bpp = self.bytes_per_pixel();
        for i in (0..self.data.len()).step_by(bpp) {
            self.write_at(i, color);
        }
    }

    /// Swap row `i` with row `height - 1 - i`
    pub fn flip_vertically(&mut self) {
        let line = self.width * self.bytes_per_pixel();
        let half = self.height / 2;
        for j in 0..half {
            let l1 = j * line;
            let l2 = (self.height - 1 - j) * line;
            let (upper, lower) = self.data.split_at_mut(l2);
            upper[l1..l1 + line].swap_with_slice(&mut lower[..line]);
        }
    }

    /// Swap column `i` with column `width - 1 - i`, row by row
    pub fn flip_horizontally(&mut self) {
        let half = self.width / 2;
        for i in 0..half {
            let mirror = self.width - 1 - i;
            for j in 0..self.height {
                let c1 = self.get_pixel(i, j);
                let c2 = self.get_pixel(mirror, j);
                let (o1, o2) = (self.offset(i, j), self.offset(mirror, j));
                self.write_at(o1, c2);
                self.write_at(o2, c1);
            }
        }
    }
}
