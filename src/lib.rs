//! tgarender: renders a textured triangle mesh to a TGA image
//!
//! - `rasterizer`: vector math, camera, triangle and line rasterization
//! - `tga`: pixel buffers and the TGA codec
//! - `model`: OBJ meshes and their texture maps
//! - `config`: RON render settings

pub mod config;
pub mod model;
pub mod rasterizer;
pub mod tga;

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
