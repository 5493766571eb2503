//! Software rasterizer
//!
//! Features:
//! - Translate / rotate / perspective-divide vertex pipeline
//! - Barycentric triangle fill with an integer z-buffer
//! - Flat shading from a single directional light
//! - Nearest-neighbor texture sampling (no perspective correction)
//! - Bresenham lines for wireframe debugging

mod camera;
mod math;
mod types;
mod render;

pub use camera::*;
pub use math::*;
pub use types::*;
pub use render::*;
