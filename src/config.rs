//! Render settings
//!
//! Uses RON (Rusty Object Notation) so a scene setup can be tweaked without
//! recompiling. Every field has a default, so a config file only needs to
//! name what it changes.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rasterizer::{Color, Vec3};
use crate::tga::PixelFormat;

/// Error type for config loading
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("Serialize error: {0}")]
    Serialize(#[from] ron::Error),
}

/// Camera reference directions and perspective strength
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Screen-right direction in world space
    pub right: Vec3,
    /// Screen-up direction in world space
    pub up: Vec3,
    /// Look-at point, moved to the origin before rotation
    pub center: Vec3,
    /// Distance-from-camera coefficient for the perspective divide
    pub distance: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            right: Vec3::new(1.0, 0.0, 0.0),
            up: Vec3::new(0.0, 1.0, 0.0),
            center: Vec3::new(0.0, 0.5, 0.0),
            distance: 3.0,
        }
    }
}

/// Render settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: usize,
    pub height: usize,
    pub format: PixelFormat,
    pub camera: CameraConfig,
    /// Directional light; normalized before use
    pub light: Vec3,
    /// Color of pixels no triangle covers
    pub background: Color,
    /// Flip the finished image vertically before it is encoded
    pub flip_output: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 1000,
            format: PixelFormat::Rgb,
            camera: CameraConfig::default(),
            light: Vec3::new(0.0, 0.0, 100.0),
            background: Color::BLACK,
            flip_output: true,
        }
    }
}

/// Load a config from a RON file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<RenderConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    load_config_from_str(&contents)
}

/// Parse a config from a RON string
pub fn load_config_from_str(s: &str) -> Result<RenderConfig, ConfigError> {
    Ok(ron::from_str(s)?)
}

/// Save a config to a RON file
pub fn save_config<P: AsRef<Path>>(config: &RenderConfig, path: P) -> Result<(), ConfigError> {
    let pretty = ron::ser::PrettyConfig::new()
        .depth_limit(3)
        .indentor("  ".to_string());

    let contents = ron::ser::to_string_pretty(config, pretty)?;
    fs::write(path, contents)?;
    Ok(())
}
