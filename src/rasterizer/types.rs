//! Core types for the rasterizer

use serde::{Deserialize, Serialize};

/// RGBA color (0-255 per channel)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 255 };
    pub const RED: Color = Color { r: 255, g: 0, b: 0, a: 255 };
    pub const GREEN: Color = Color { r: 0, g: 255, b: 0, a: 255 };
    pub const BLUE: Color = Color { r: 0, g: 0, b: 255, a: 255 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn with_alpha(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Gray level replicated into all three color channels
    pub const fn gray(v: u8) -> Self {
        Self { r: v, g: v, b: v, a: 255 }
    }

    /// Multiply the color channels by `intensity`.
    ///
    /// Not clamped to [0, 1]: callers pass the face intensity as-is and the
    /// float-to-u8 cast truncates (and saturates) each channel.
    pub fn shade(self, intensity: f64) -> Self {
        Self {
            r: (self.r as f64 * intensity) as u8,
            g: (self.g as f64 * intensity) as u8,
            b: (self.b as f64 * intensity) as u8,
            a: self.a,
        }
    }

    /// Pack as 0xAARRGGBB
    pub fn to_packed(self) -> u32 {
        ((self.a as u32) << 24) | ((self.r as u32) << 16) | ((self.g as u32) << 8) | (self.b as u32)
    }

    /// Inverse of [`Color::to_packed`]
    pub fn from_packed(c: u32) -> Self {
        Self {
            r: (c >> 16) as u8,
            g: (c >> 8) as u8,
            b: c as u8,
            a: (c >> 24) as u8,
        }
    }
}

/// A vertex after projection: integer pixel position plus quantized depth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScreenPoint {
    pub x: i32,
    pub y: i32,
    /// Depth in the 0..=255 range for points inside the view volume
    pub z: i32,
}

impl ScreenPoint {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}
