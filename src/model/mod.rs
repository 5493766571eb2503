//! Mesh and texture maps
//!
//! A `Model` is what the loader hands the pipeline: positions, texture
//! coordinates, normals and triangular faces whose indices are already
//! validated and 0-based. Texture maps are attached afterwards.

mod obj;

pub use obj::*;

use std::path::Path;

use log::info;
use thiserror::Error;

use crate::rasterizer::{Color, Vec2, Vec3};
use crate::tga::{self, PixelBuffer, PixelFormat, TgaError};

/// Error type for mesh and texture loading
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("line {line}: {kind} index {index} out of range (have {count})")]
    IndexOutOfRange {
        line: usize,
        kind: &'static str,
        index: usize,
        count: usize,
    },

    #[error("texture error: {0}")]
    Texture(#[from] TgaError),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

/// One face corner: indices into the model's position, uv and normal arrays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceVertex {
    pub position: usize,
    pub uv: usize,
    pub normal: usize,
}

impl FaceVertex {
    pub const fn new(position: usize, uv: usize, normal: usize) -> Self {
        Self { position, uv, normal }
    }
}

/// A triangle face
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Face {
    pub corners: [FaceVertex; 3],
}

impl Face {
    pub const fn new(corners: [FaceVertex; 3]) -> Self {
        Self { corners }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Model {
    pub vertices: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub normals: Vec<Vec3>,
    pub faces: Vec<Face>,
    pub diffuse_map: Option<PixelBuffer>,
    pub normal_map: Option<PixelBuffer>,
    pub specular_map: Option<PixelBuffer>,
}

impl Model {
    pub fn vertex(&self, face: usize, corner: usize) -> Vec3 {
        self.vertices[self.faces[face].corners[corner].position]
    }

    pub fn uv(&self, face: usize, corner: usize) -> Vec2 {
        self.uvs[self.faces[face].corners[corner].uv]
    }

    pub fn normal(&self, face: usize, corner: usize) -> Vec3 {
        self.normals[self.faces[face].corners[corner].normal]
    }

    /// Diffuse texel at `uv`, white when no diffuse map is loaded
    pub fn diffuse_color(&self, uv: Vec2) -> Color {
        match &self.diffuse_map {
            Some(map) => sample_nearest(map, uv),
            None => Color::WHITE,
        }
    }

    /// Tangent-space normal from the normal map.
    ///
    /// Channels map to axes in reverse: red is z, green is y, blue is x.
    pub fn normal_from_map(&self, uv: Vec2) -> Option<Vec3> {
        let c = sample_nearest(self.normal_map.as_ref()?, uv);
        let unit = |v: u8| v as f64 / 255.0 * 2.0 - 1.0;
        Some(Vec3::new(unit(c.b), unit(c.g), unit(c.r)))
    }

    /// Specular exponent from the specular map's first channel
    pub fn specular_from_map(&self, uv: Vec2) -> Option<f64> {
        let c = sample_nearest(self.specular_map.as_ref()?, uv);
        Some(c.r as f64)
    }

    pub fn load_diffuse_map<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ModelError> {
        self.diffuse_map = Some(load_texture(path)?);
        Ok(())
    }

    pub fn load_normal_map<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ModelError> {
        self.normal_map = Some(load_texture(path)?);
        Ok(())
    }

    pub fn load_specular_map<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ModelError> {
        self.specular_map = Some(load_texture(path)?);
        Ok(())
    }
}

/// Nearest-neighbor lookup: texel (floor(u * w), floor(v * h)), clamped so
/// that u or v of exactly 1.0 hits the last texel.
pub fn sample_nearest(map: &PixelBuffer, uv: Vec2) -> Color {
    let clamp = |t: f64, size: usize| ((t * size as f64).floor().max(0.0) as usize).min(size - 1);
    map.get_pixel(clamp(uv.x, map.width()), clamp(uv.y, map.height()))
}

/// Load a texture map into the mesh's UV convention: row 0 is v = 0 (the
/// bottom of the picture) and column 0 is u = 0 (its left edge).
///
/// `.tga` goes through the crate's codec, anything else through `image`.
/// Both hand back top row first, left to right, so only the rows are flipped.
pub fn load_texture<P: AsRef<Path>>(path: P) -> Result<PixelBuffer, ModelError> {
    let path = path.as_ref();
    let is_tga = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("tga"))
        .unwrap_or(false);

    let mut map = if is_tga {
        tga::read_file(path)?
    } else {
        decode_with_image(path)?
    };

    map.flip_vertically();

    info!(
        "Loaded texture: {} ({}x{}, {:?})",
        path.display(),
        map.width(),
        map.height(),
        map.format()
    );
    Ok(map)
}

fn decode_with_image(path: &Path) -> Result<PixelBuffer, ModelError> {
    use image::GenericImageView;

    let img = image::open(path)?;
    let (width, height) = img.dimensions();
    let (width, height) = (width as usize, height as usize);

    let buffer = if img.color().has_alpha() {
        PixelBuffer::from_raw(width, height, PixelFormat::Rgba, img.to_rgba8().into_raw())?
    } else {
        PixelBuffer::from_raw(width, height, PixelFormat::Rgb, img.to_rgb8().into_raw())?
    };
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_map(width: usize, height: usize, color: Color) -> PixelBuffer {
        let mut map = PixelBuffer::new(width, height, PixelFormat::Rgb).unwrap();
        map.clear(color);
        map
    }

    #[test]
    fn test_sample_nearest_floors_and_clamps() {
        let mut map = PixelBuffer::new(2, 2, PixelFormat::Rgb).unwrap();
        map.set_pixel(0, 0, Color::RED).unwrap();
        map.set_pixel(1, 0, Color::GREEN).unwrap();
        map.set_pixel(0, 1, Color::BLUE).unwrap();
        map.set_pixel(1, 1, Color::WHITE).unwrap();

        assert_eq!(sample_nearest(&map, Vec2::new(0.0, 0.0)), Color::RED);
        assert_eq!(sample_nearest(&map, Vec2::new(0.49, 0.2)), Color::RED);
        assert_eq!(sample_nearest(&map, Vec2::new(0.5, 0.0)), Color::GREEN);
        assert_eq!(sample_nearest(&map, Vec2::new(0.0, 0.75)), Color::BLUE);
        assert_eq!(sample_nearest(&map, Vec2::new(1.0, 1.0)), Color::WHITE);
        assert_eq!(sample_nearest(&map, Vec2::new(-0.2, 1.7)), Color::BLUE);
    }

    #[test]
    fn test_diffuse_defaults_to_white() {
        let mut model = Model::default();
        assert_eq!(model.diffuse_color(Vec2::new(0.3, 0.3)), Color::WHITE);
        model.diffuse_map = Some(solid_map(2, 2, Color::new(10, 20, 30)));
        assert_eq!(model.diffuse_color(Vec2::new(0.3, 0.3)), Color::new(10, 20, 30));
    }

    #[test]
    fn test_normal_from_map_channel_order() {
        let mut model = Model::default();
        assert_eq!(model.normal_from_map(Vec2::new(0.0, 0.0)), None);
        model.normal_map = Some(solid_map(1, 1, Color::new(255, 0, 255)));
        let n = model.normal_from_map(Vec2::new(0.5, 0.5)).unwrap();
        assert_eq!(n, Vec3::new(1.0, -1.0, 1.0));
    }

    #[test]
    fn test_specular_from_map() {
        let mut model = Model::default();
        assert_eq!(model.specular_from_map(Vec2::new(0.0, 0.0)), None);
        model.specular_map = Some(solid_map(1, 1, Color::gray(12)));
        assert_eq!(model.specular_from_map(Vec2::new(0.0, 0.0)), Some(12.0));
    }

    fn temp_texture(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("tgarender-{}-{}.tga", std::process::id(), name))
    }

    #[test]
    fn test_load_texture_bottom_left_file() {
        // descriptor 0: rows stored bottom first, left to right
        let header = crate::tga::TgaHeader {
            image_type: crate::tga::IMAGE_TYPE_TRUE_COLOR,
            image_width: 2,
            image_height: 2,
            image_bpp: 24,
            image_descriptor: 0,
            ..Default::default()
        };
        let mut bytes = header.to_bytes().to_vec();
        bytes.extend_from_slice(&[255, 0, 0, 0, 255, 0]);
        bytes.extend_from_slice(&[0, 0, 255, 255, 255, 255]);
        let path = temp_texture("bottom-left");
        std::fs::write(&path, &bytes).unwrap();

        let mut model = Model::default();
        model.load_diffuse_map(&path).unwrap();
        let map = model.diffuse_map.as_ref().unwrap();
        assert_eq!(map.get_pixel(0, 0), Color::RED);
        assert_eq!(map.get_pixel(1, 0), Color::GREEN);
        assert_eq!(map.get_pixel(0, 1), Color::BLUE);
        assert_eq!(map.get_pixel(1, 1), Color::WHITE);
        assert_eq!(model.diffuse_color(Vec2::new(0.1, 0.1)), Color::RED);
        assert_eq!(model.diffuse_color(Vec2::new(0.9, 0.1)), Color::GREEN);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_texture_flips_rows_of_written_file() {
        let path = temp_texture("written");
        let mut src = PixelBuffer::new(2, 2, PixelFormat::Rgb).unwrap();
        src.set_pixel(0, 0, Color::RED).unwrap();
        tga::write_file(&src, &path).unwrap();

        let mut model = Model::default();
        model.load_diffuse_map(&path).unwrap();
        let map = model.diffuse_map.as_ref().unwrap();
        assert_eq!(map.get_pixel(0, 1), Color::RED);
        assert_eq!(map.get_pixel(0, 0), Color::BLACK);
        assert_eq!(map.get_pixel(1, 1), Color::BLACK);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_texture_missing_file() {
        let mut model = Model::default();
        let err = model
            .load_diffuse_map("/nonexistent/tgarender/texture.tga")
            .unwrap_err();
        assert!(matches!(err, ModelError::Texture(TgaError::Io(_))));
        assert!(model.diffuse_map.is_none());
    }
}
