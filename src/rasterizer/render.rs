//! Core rendering: framebuffer and per-triangle rasterization

use std::path::Path;

use glam::{Vec2, Vec4};
use log::debug;

use super::math::{barycentric, signed_area};
use super::shader::{FragmentInput, FragmentShader, TriangleFragmentShader, VertexOutput};
use super::types::FrontFace;
use crate::resource::{Color, Image, Store};

/// Depth of an empty cell. Larger depth is nearer, so this is "infinitely far".
pub const FAR_DEPTH: f32 = f32::MIN;

/// Framebuffer for software rendering
pub struct Framebuffer {
    pub pixels: Vec<u8>, // RGBA, 4 bytes per pixel
    pub width: usize,
    pub height: usize,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            pixels: vec![0; width * height * 4],
            width,
            height,
        }
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        if self.width == width && self.height == height {
            return;
        }
        self.width = width;
        self.height = height;
        self.pixels = vec![0; width * height * 4];
    }

    pub fn clear(&mut self, color: Color) {
        let bytes = color.to_bytes();
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&bytes);
        }
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, color: Color) {
        if x < self.width && y < self.height {
            let idx = (y * self.width + x) * 4;
            self.pixels[idx..idx + 4].copy_from_slice(&color.to_bytes());
        }
    }

    pub fn get_pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x < self.width && y < self.height {
            let idx = (y * self.width + x) * 4;
            let mut px = [0; 4];
            px.copy_from_slice(&self.pixels[idx..idx + 4]);
            Some(px)
        } else {
            None
        }
    }

    /// Copy into an `image` buffer (row 0 at the top)
    pub fn to_image(&self) -> Option<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width as u32, self.height as u32, self.pixels.clone())
    }

    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<(), image::ImageError> {
        let img = self.to_image().ok_or_else(|| {
            image::ImageError::Parameter(image::error::ParameterError::from_kind(
                image::error::ParameterErrorKind::DimensionMismatch,
            ))
        })?;
        img.save(path)
    }
}

/// Turns vertex-stage output into pixels.
///
/// Owns the depth buffer (present only while the early depth test is on) and
/// the bound fragment shader.
pub struct Rasterizer {
    width: usize,
    height: usize,
    depth_buffer: Option<Vec<f32>>,
    back_face_culling: bool,
    front_face: FrontFace,
    fragment_shader: Box<dyn FragmentShader>,
}

impl Rasterizer {
    pub fn new(width: usize, height: usize, early_depth_test: bool) -> Self {
        Self {
            width,
            height,
            depth_buffer: early_depth_test.then(|| vec![FAR_DEPTH; width * height]),
            back_face_culling: true,
            front_face: FrontFace::default(),
            fragment_shader: Box::new(TriangleFragmentShader::default()),
        }
    }

    pub fn set_fragment_shader(&mut self, shader: Box<dyn FragmentShader>) {
        debug!("bound fragment shader `{}`", shader.name());
        self.fragment_shader = shader;
    }

    pub fn fragment_shader(&self) -> &dyn FragmentShader {
        self.fragment_shader.as_ref()
    }

    /// Rasterize one triangle into `fb`. Returns the number of pixels written.
    pub fn rasterize(&mut self, input: &VertexOutput<'_>, images: &Store<Image>, fb: &mut Framebuffer) -> usize {
        if input.discard || self.width == 0 || self.height == 0 {
            return 0;
        }
        let tri = &input.triangle;
        let [v0, v1, v2] = tri.positions.map(|p| Vec2::new(p.x, p.y));

        // Triangle-invariant: checked once instead of per pixel
        let area = signed_area(v0, v1, v2);
        if area == 0.0 || !area.is_finite() {
            return 0;
        }
        if self.back_face_culling && self.front_face.is_back_facing(area) {
            return 0;
        }

        let Some((min_x, min_y, max_x, max_y)) = self.bounding_box(&tri.positions) else {
            return 0;
        };

        let mut written = 0;
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let w = barycentric(p, v0, v1, v2, area);
                if w.x < 0.0 || w.y < 0.0 || w.z < 0.0 {
                    continue;
                }

                let z = w.x * tri.positions[0].z + w.y * tri.positions[1].z + w.z * tri.positions[2].z;
                if let Some(depth) = self.depth_buffer.as_mut() {
                    let cell = &mut depth[y * self.width + x];
                    if *cell >= z {
                        continue;
                    }
                    *cell = z;
                }

                let fragment = FragmentInput {
                    position: p,
                    tex_coord: tri.tex_coords[0] * w.x + tri.tex_coords[1] * w.y + tri.tex_coords[2] * w.z,
                    normal: (tri.normals[0] * w.x + tri.normals[1] * w.y + tri.normals[2] * w.z).normalized(),
                    color: tri.colors[0] * w.x + tri.colors[1] * w.y + tri.colors[2] * w.z,
                    material: tri.material,
                    images,
                };
                let color = self.fragment_shader.shade(&fragment);
                fb.set_pixel(x, y, color);
                written += 1;
            }
        }
        written
    }

    /// Integer bounding box clamped to the viewport, `None` if fully outside
    fn bounding_box(&self, positions: &[Vec4; 3]) -> Option<(usize, usize, usize, usize)> {
        let min_x = positions.iter().map(|p| p.x).fold(f32::INFINITY, f32::min).floor();
        let max_x = positions.iter().map(|p| p.x).fold(f32::NEG_INFINITY, f32::max).floor();
        let min_y = positions.iter().map(|p| p.y).fold(f32::INFINITY, f32::min).floor();
        let max_y = positions.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max).floor();

        let last_x = (self.width - 1) as f32;
        let last_y = (self.height - 1) as f32;
        if max_x < 0.0 || max_y < 0.0 || min_x > last_x || min_y > last_y {
            return None;
        }
        Some((
            min_x.max(0.0) as usize,
            min_y.max(0.0) as usize,
            max_x.min(last_x) as usize,
            max_y.min(last_y) as usize,
        ))
    }

    /// Change the viewport. The depth buffer, if any, is reallocated empty.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        if self.depth_buffer.is_some() {
            self.depth_buffer = Some(vec![FAR_DEPTH; width * height]);
        }
    }

    pub fn clear_depth_buffer(&mut self) {
        if let Some(depth) = self.depth_buffer.as_mut() {
            depth.fill(FAR_DEPTH);
        }
    }

    pub fn enable_early_z_buffer(&mut self, enable: bool) {
        if !enable {
            self.depth_buffer = None;
            return;
        }
        let len = self.width * self.height;
        if self.depth_buffer.as_ref().map(Vec::len) != Some(len) {
            self.depth_buffer = Some(vec![FAR_DEPTH; len]);
        }
    }

    pub fn is_early_z_buffer_enabled(&self) -> bool {
        self.depth_buffer.is_some()
    }

    pub fn enable_back_face_culling(&mut self, enable: bool) {
        self.back_face_culling = enable;
    }

    pub fn set_front_face(&mut self, front_face: FrontFace) {
        self.front_face = front_face;
    }

    pub fn viewport_size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Stored depth at a pixel, `None` without a depth buffer or out of range
    pub fn depth_at(&self, x: usize, y: usize) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.depth_buffer.as_ref().map(|d| d[y * self.width + x])
    }
}
