//! Core rendering functions
//! Triangle rasterization with a z-buffer and flat shading

use indicatif::ProgressBar;
use log::{info, trace};

use super::camera::Camera;
use super::math::{Vec2, Vec3};
use super::types::{Color, ScreenPoint};
use crate::config::RenderConfig;
use crate::model::{sample_nearest, Model};
use crate::tga::{PixelBuffer, PixelFormat, TgaError};

/// Per-pixel depth record for one render pass. Larger values are nearer.
#[derive(Debug, Clone)]
pub struct DepthBuffer {
    width: usize,
    height: usize,
    depths: Vec<i32>,
}

impl DepthBuffer {
    /// Farther than any projected depth
    pub const FAR: i32 = i32::MIN;

    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            depths: vec![Self::FAR; width * height],
        }
    }

    pub fn clear(&mut self) {
        self.depths.fill(Self::FAR);
    }

    pub fn get(&self, x: usize, y: usize) -> i32 {
        assert!(
            x < self.width && y < self.height,
            "DepthBuffer::get({}, {}) outside {}x{} buffer",
            x,
            y,
            self.width,
            self.height
        );
        self.depths[x + y * self.width]
    }

    /// Store `z` if it is strictly nearer than what is recorded.
    /// Equal depth keeps the earlier writer.
    pub fn test_and_set(&mut self, x: usize, y: usize, z: i32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let slot = &mut self.depths[x + y * self.width];
        if z > *slot {
            *slot = z;
            true
        } else {
            false
        }
    }
}

/// Framebuffer for software rendering
pub struct Framebuffer {
    pub image: PixelBuffer,
    pub zbuffer: DepthBuffer,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize, format: PixelFormat) -> Result<Self, TgaError> {
        Ok(Self {
            image: PixelBuffer::new(width, height, format)?,
            zbuffer: DepthBuffer::new(width, height),
        })
    }

    pub fn width(&self) -> usize {
        self.image.width()
    }

    pub fn height(&self) -> usize {
        self.image.height()
    }

    pub fn clear(&mut self, color: Color) {
        self.image.clear(color);
        self.zbuffer.clear();
    }

    /// Drop the depth buffer and keep the pixels
    pub fn into_image(self) -> PixelBuffer {
        self.image
    }

    fn plot(&mut self, x: i64, y: i64, color: Color) {
        if x >= 0 && y >= 0 {
            // off-image points are clipped
            let _ = self.image.set_pixel(x as usize, y as usize, color);
        }
    }

    /// Draw a line from (x0, y0) to (x1, y1) using Bresenham's algorithm.
    ///
    /// Integer only. Steep lines are walked along y by swapping the axes.
    pub fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: Color) {
        // widened so endpoint differences cannot overflow
        let (mut x0, mut y0, mut x1, mut y1) = (x0 as i64, y0 as i64, x1 as i64, y1 as i64);

        let steep = (x1 - x0).abs() < (y1 - y0).abs();
        if steep {
            std::mem::swap(&mut x0, &mut y0);
            std::mem::swap(&mut x1, &mut y1);
        }
        if x0 > x1 {
            std::mem::swap(&mut x0, &mut x1);
            std::mem::swap(&mut y0, &mut y1);
        }

        let dx = x1 - x0;
        let de = 2 * (y1 - y0).abs();
        let sy = if y1 < y0 { -1 } else { 1 };
        let mut e = 0;
        let mut y = y0;

        for x in x0..=x1 {
            if dx > 0 && e >= dx {
                e -= 2 * dx;
                y += sy;
            }
            if steep {
                self.plot(y, x, color);
            } else {
                self.plot(x, y, color);
            }
            e += de;
        }
    }

    /// Rasterize one projected triangle.
    ///
    /// Every pixel of the (image-clamped) bounding box is classified with
    /// barycentric weights; inside pixels get a linearly interpolated depth
    /// and UV, and win the pixel only if strictly nearer than the z-buffer.
    /// Returns the number of pixels written.
    pub fn draw_triangle(
        &mut self,
        pts: [ScreenPoint; 3],
        uvs: [Vec2; 3],
        intensity: f64,
        texture: Option<&PixelBuffer>,
    ) -> usize {
        let [a, b, c] = pts;

        let min_x = a.x.min(b.x).min(c.x).max(0);
        let max_x = a.x.max(b.x).max(c.x).min(self.width() as i32 - 1);
        let min_y = a.y.min(b.y).min(c.y).max(0);
        let max_y = a.y.max(b.y).max(c.y).min(self.height() as i32 - 1);

        // W.x depends only on the corners, so a zero-area triangle is skipped whole
        if barycentric(a, b, c, a.x, a.y).is_none() {
            trace!("Degenerate triangle {:?}", pts);
            return 0;
        }

        let mut written = 0;
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let Some(bc) = barycentric(a, b, c, x, y) else {
                    continue;
                };
                if !is_inside(bc) {
                    continue;
                }

                let z = (bc.x * a.z as f64 + bc.y * b.z as f64 + bc.z * c.z as f64 + 0.5).floor()
                    as i32;
                let uv = uvs[0] * bc.x + uvs[1] * bc.y + uvs[2] * bc.z;

                let (px, py) = (x as usize, y as usize);
                if self.zbuffer.test_and_set(px, py, z) {
                    let texel = texture.map_or(Color::WHITE, |t| sample_nearest(t, uv));
                    if self.image.set_pixel(px, py, texel.shade(intensity)).is_ok() {
                        written += 1;
                    }
                }
            }
        }
        written
    }
}

/// Barycentric weights of pixel (px, py) in triangle (a, b, c).
///
/// Returns (1 - u - v, u, v) so that P = w*a + u*b + v*c, or None when the
/// triangle is degenerate in screen space. Differences are taken in f64:
/// a vertex on the camera plane projects to a saturated i32 coordinate.
pub fn barycentric(a: ScreenPoint, b: ScreenPoint, c: ScreenPoint, px: i32, py: i32) -> Option<Vec3> {
    let (ax, ay) = (a.x as f64, a.y as f64);
    let x = Vec3::new(ax - px as f64, b.x as f64 - ax, c.x as f64 - ax);
    let y = Vec3::new(ay - py as f64, b.y as f64 - ay, c.y as f64 - ay);
    let w = x.cross(y);
    if w.x == 0.0 {
        return None;
    }
    let u = w.y / w.x;
    let v = w.z / w.x;
    Some(Vec3::new(1.0 - u - v, u, v))
}

/// Edge-inclusive inside test on barycentric weights
pub fn is_inside(bc: Vec3) -> bool {
    bc.x >= 0.0 && bc.y >= 0.0 && bc.z >= 0.0
}

/// Flat shading term for a face: light . (-normalize((v1 - v0) x (v2 - v0))).
///
/// The sign depends on winding and is not clamped here; `render_model`
/// uses the absolute value, so back faces are lit like front faces.
pub fn face_intensity(v0: Vec3, v1: Vec3, v2: Vec3, light: Vec3) -> f64 {
    let normal = -(v1 - v0).cross(v2 - v0).normalize();
    light.dot(normal)
}

/// Render a model into a new image.
///
/// One pass: fresh framebuffer and z-buffer, every face projected through
/// the configured camera, flat shaded and textured from the diffuse map.
pub fn render_model(
    model: &Model,
    config: &RenderConfig,
    progress: &ProgressBar,
) -> Result<PixelBuffer, TgaError> {
    let mut fb = Framebuffer::new(config.width, config.height, config.format)?;
    fb.clear(config.background);

    let camera = Camera::from_config(&config.camera);
    let light = config.light.normalize();
    let texture = model.diffuse_map.as_ref();

    info!(
        "Rendering {} faces at {}x{}",
        model.faces.len(),
        config.width,
        config.height
    );
    progress.set_length(model.faces.len() as u64);

    let mut pixels = 0;
    for face in 0..model.faces.len() {
        let world = [model.vertex(face, 0), model.vertex(face, 1), model.vertex(face, 2)];
        let screen = world.map(|v| camera.project(v, config.width, config.height));
        let uvs = [model.uv(face, 0), model.uv(face, 1), model.uv(face, 2)];

        let intensity = face_intensity(world[0], world[1], world[2], light).abs();
        pixels += fb.draw_triangle(screen, uvs, intensity, texture);
        progress.inc(1);
    }

    info!("Wrote {} pixels", pixels);

    let mut image = fb.into_image();
    if config.flip_output {
        image.flip_vertically();
    }
    Ok(image)
}
