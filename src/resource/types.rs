//! Resource records: geometry, colours, materials and images

use std::ops::{Add, Mul, Sub};
use std::path::{Path, PathBuf};

use glam::{Vec2, Vec4};
use serde::{Deserialize, Serialize};

use super::handle::Handle;
use super::store::ResourceStore;
use crate::errors::{ArithmeticError, ResourceError};

/// Vertex position in homogeneous coordinates (w = 1)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Vec4,
}

impl Vertex {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: Vec4::new(x, y, z, 1.0),
        }
    }
}

impl Default for Vertex {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}

/// 2D texture coordinate. Not clamped when stored.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TextureCoord {
    pub uv: Vec2,
}

impl TextureCoord {
    pub fn new(u: f32, v: f32) -> Self {
        Self { uv: Vec2::new(u, v) }
    }

    pub fn u(self) -> f32 {
        self.uv.x
    }

    pub fn v(self) -> f32 {
        self.uv.y
    }

    pub fn checked_div(self, scalar: f32) -> Result<Self, ArithmeticError> {
        if scalar == 0.0 {
            return Err(ArithmeticError::DivisionByZero("TextureCoord"));
        }
        Ok(Self { uv: self.uv / scalar })
    }
}

impl Add for TextureCoord {
    type Output = TextureCoord;
    fn add(self, other: TextureCoord) -> TextureCoord {
        TextureCoord { uv: self.uv + other.uv }
    }
}

impl Sub for TextureCoord {
    type Output = TextureCoord;
    fn sub(self, other: TextureCoord) -> TextureCoord {
        TextureCoord { uv: self.uv - other.uv }
    }
}

impl Mul<f32> for TextureCoord {
    type Output = TextureCoord;
    fn mul(self, s: f32) -> TextureCoord {
        TextureCoord { uv: self.uv * s }
    }
}

/// Surface direction (w = 0)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Normal {
    pub normal: Vec4,
}

impl Normal {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            normal: Vec4::new(x, y, z, 0.0),
        }
    }

    /// Unit-length copy, or the zero vector when the length is zero
    pub fn normalized(self) -> Self {
        let len = self.normal.length();
        if len > 0.0 {
            Self { normal: self.normal / len }
        } else {
            Self::default()
        }
    }

    pub fn checked_div(self, scalar: f32) -> Result<Self, ArithmeticError> {
        if scalar == 0.0 {
            return Err(ArithmeticError::DivisionByZero("Normal"));
        }
        Ok(Self { normal: self.normal / scalar })
    }
}

impl Add for Normal {
    type Output = Normal;
    fn add(self, other: Normal) -> Normal {
        Normal { normal: self.normal + other.normal }
    }
}

impl Sub for Normal {
    type Output = Normal;
    fn sub(self, other: Normal) -> Normal {
        Normal { normal: self.normal - other.normal }
    }
}

impl Mul<f32> for Normal {
    type Output = Normal;
    fn mul(self, s: f32) -> Normal {
        Normal { normal: self.normal * s }
    }
}

/// RGBA colour, 0-255 per channel by convention (not enforced)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color { r: 255.0, g: 255.0, b: 255.0, a: 255.0 };
    pub const BLACK: Color = Color { r: 0.0, g: 0.0, b: 0.0, a: 255.0 };
    pub const TRANSPARENT: Color = Color { r: 0.0, g: 0.0, b: 0.0, a: 0.0 };

    pub fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 255.0 }
    }

    pub fn with_alpha(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn checked_div(self, scalar: f32) -> Result<Self, ArithmeticError> {
        if scalar == 0.0 {
            return Err(ArithmeticError::DivisionByZero("Color"));
        }
        Ok(self * (1.0 / scalar))
    }

    /// Round and clamp to [u8; 4] for the framebuffer
    pub fn to_bytes(self) -> [u8; 4] {
        [
            self.r.round().clamp(0.0, 255.0) as u8,
            self.g.round().clamp(0.0, 255.0) as u8,
            self.b.round().clamp(0.0, 255.0) as u8,
            self.a.round().clamp(0.0, 255.0) as u8,
        ]
    }

    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        Self::with_alpha(bytes[0] as f32, bytes[1] as f32, bytes[2] as f32, bytes[3] as f32)
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

impl Add for Color {
    type Output = Color;
    fn add(self, o: Color) -> Color {
        Color::with_alpha(self.r + o.r, self.g + o.g, self.b + o.b, self.a + o.a)
    }
}

impl Sub for Color {
    type Output = Color;
    fn sub(self, o: Color) -> Color {
        Color::with_alpha(self.r - o.r, self.g - o.g, self.b - o.b, self.a - o.a)
    }
}

/// Component-wise product
impl Mul for Color {
    type Output = Color;
    fn mul(self, o: Color) -> Color {
        Color::with_alpha(self.r * o.r, self.g * o.g, self.b * o.b, self.a * o.a)
    }
}

impl Mul<f32> for Color {
    type Output = Color;
    fn mul(self, s: f32) -> Color {
        Color::with_alpha(self.r * s, self.g * s, self.b * s, self.a * s)
    }
}

/// Material as read from a material library
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub ambient: [f32; 3],
    pub diffuse: [f32; 3],
    pub specular: [f32; 3],
    pub shininess: f32,
    /// Diffuse texture filename (`map_Kd`), relative to the model directory
    pub texture_name: String,
    /// Decoded diffuse texture, invalid if none was loaded
    pub image: Handle<Image>,
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn has_texture(&self) -> bool {
        !self.texture_name.is_empty()
    }

    /// Full path of the diffuse texture under `base`
    pub fn texture_path(&self, base: &Path) -> Option<PathBuf> {
        if !self.has_texture() {
            return None;
        }
        Some(base.join(&self.texture_name))
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            ambient: [0.2, 0.2, 0.2],
            diffuse: [0.8, 0.8, 0.8],
            specular: [0.0, 0.0, 0.0],
            shininess: 0.0,
            texture_name: String::new(),
            image: Handle::INVALID,
        }
    }
}

/// Texture filtering used by the fragment stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleMode {
    #[default]
    Nearest,
    Bilinear,
}

/// Decoded raster image. Row 0 is the bottom row (texture v = 0).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Image {
    pub name: String,
    pub width: usize,
    pub height: usize,
    /// 3 (RGB) or 4 (RGBA)
    pub channels: usize,
    pub data: Vec<u8>,
}

impl Image {
    pub fn new(name: impl Into<String>, width: usize, height: usize, channels: usize, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            channels,
            data,
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.data.is_empty()
    }

    pub fn sample(&self, uv: Vec2, mode: SampleMode) -> Color {
        match mode {
            SampleMode::Nearest => self.sample_nearest(uv.x, uv.y),
            SampleMode::Bilinear => self.sample_bilinear(uv.x, uv.y),
        }
    }

    /// Sample without filtering. `u`, `v` are clamped to [0, 1].
    pub fn sample_nearest(&self, u: f32, v: f32) -> Color {
        if !self.is_valid() {
            return Color::TRANSPARENT;
        }
        let u = u.clamp(0.0, 1.0);
        let v = v.clamp(0.0, 1.0);
        let x = (u * (self.width as f32 - 1.0)) as i64;
        let y = (v * (self.height as f32 - 1.0)) as i64;
        self.pixel(x, y)
    }

    /// Blend the four texels around (u, v). `u`, `v` are clamped to [0, 1].
    pub fn sample_bilinear(&self, u: f32, v: f32) -> Color {
        if !self.is_valid() {
            return Color::TRANSPARENT;
        }
        let x = u.clamp(0.0, 1.0) * (self.width as f32 - 1.0).max(0.0);
        let y = v.clamp(0.0, 1.0) * (self.height as f32 - 1.0).max(0.0);
        let x0 = x as i64;
        let y0 = y as i64;
        let x1 = (x0 + 1).min(self.width as i64 - 1);
        let y1 = (y0 + 1).min(self.height as i64 - 1);
        let fx = x - x0 as f32;
        let fy = y - y0 as f32;

        self.pixel(x0, y0) * ((1.0 - fx) * (1.0 - fy))
            + self.pixel(x1, y0) * (fx * (1.0 - fy))
            + self.pixel(x0, y1) * ((1.0 - fx) * fy)
            + self.pixel(x1, y1) * (fx * fy)
    }

    /// Texel at (x, y); transparent outside the image
    pub fn pixel(&self, x: i64, y: i64) -> Color {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return Color::TRANSPARENT;
        }
        let idx = (y as usize * self.width + x as usize) * self.channels;
        match self.data.get(idx..idx + self.channels) {
            Some(px) if self.channels >= 4 => {
                Color::with_alpha(px[0] as f32, px[1] as f32, px[2] as f32, px[3] as f32)
            }
            Some(px) if self.channels == 3 => Color::new(px[0] as f32, px[1] as f32, px[2] as f32),
            _ => Color::TRANSPARENT,
        }
    }
}

/// Triangle as stored: handles into the other tables
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Triangle {
    pub vertices: [Handle<Vertex>; 3],
    pub tex_coords: [Handle<TextureCoord>; 3],
    pub normals: [Handle<Normal>; 3],
    pub colors: [Handle<Color>; 3],
    pub has_tex_coords: bool,
    pub has_normals: bool,
    pub material_name: String,
    /// Resolved from `material_name` once all libraries are loaded
    pub material: Handle<Material>,
}

impl Triangle {
    pub fn has_material(&self) -> bool {
        self.material.is_valid()
    }

    /// Dereference every handle into a self-contained triangle.
    ///
    /// Invalid handles become the default value of their type; a valid handle
    /// without an entry is an error.
    pub fn to_raw<'a>(&'a self, store: &'a ResourceStore) -> Result<RawTriangle<'a>, ResourceError> {
        let mut raw = RawTriangle {
            material_name: &self.material_name,
            has_tex_coords: self.has_tex_coords,
            has_normals: self.has_normals,
            ..RawTriangle::default()
        };
        for i in 0..3 {
            if self.vertices[i].is_valid() {
                raw.positions[i] = store.vertices.get(self.vertices[i])?.position;
            }
            if self.tex_coords[i].is_valid() {
                raw.tex_coords[i] = *store.tex_coords.get(self.tex_coords[i])?;
            }
            if self.normals[i].is_valid() {
                raw.normals[i] = *store.normals.get(self.normals[i])?;
            }
            if self.colors[i].is_valid() {
                raw.colors[i] = *store.colors.get(self.colors[i])?;
            }
        }
        if self.material.is_valid() {
            raw.material = Some(store.materials.get(self.material)?);
        }
        Ok(raw)
    }
}

/// Triangle with all attributes resolved to values.
///
/// After the vertex stage `positions` hold screen-space x/y and NDC z.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTriangle<'a> {
    pub positions: [Vec4; 3],
    pub tex_coords: [TextureCoord; 3],
    pub normals: [Normal; 3],
    pub colors: [Color; 3],
    pub has_tex_coords: bool,
    pub has_normals: bool,
    pub material_name: &'a str,
    pub material: Option<&'a Material>,
}

impl Default for RawTriangle<'_> {
    fn default() -> Self {
        Self {
            positions: [Vertex::default().position; 3],
            tex_coords: [TextureCoord::default(); 3],
            normals: [Normal::default(); 3],
            colors: [Color::default(); 3],
            has_tex_coords: false,
            has_normals: false,
            material_name: "",
            material: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker_2x2() -> Image {
        // bottom row: red, green; top row: blue, white
        Image::new(
            "checker",
            2,
            2,
            3,
            vec![255, 0, 0, 0, 255, 0, 0, 0, 255, 255, 255, 255],
        )
    }

    #[test]
    fn test_normal_normalized() {
        let n = Normal::new(3.0, 0.0, 4.0).normalized();
        assert!((n.normal.length() - 1.0).abs() < 0.0001);
        assert!((n.normal.z - 0.8).abs() < 0.0001);
        assert_eq!(Normal::new(0.0, 0.0, 0.0).normalized(), Normal::default());
    }

    #[test]
    fn test_color_division_by_zero() {
        let c = Color::new(100.0, 50.0, 10.0);
        assert_eq!(
            c.checked_div(0.0),
            Err(ArithmeticError::DivisionByZero("Color"))
        );
        let half = c.checked_div(2.0).unwrap();
        assert!((half.r - 50.0).abs() < 0.001);
        assert!((half.a - 127.5).abs() < 0.001);
    }

    #[test]
    fn test_other_division_by_zero() {
        assert!(Normal::new(1.0, 0.0, 0.0).checked_div(0.0).is_err());
        assert!(TextureCoord::new(1.0, 1.0).checked_div(0.0).is_err());
        assert!(TextureCoord::new(1.0, 1.0).checked_div(4.0).is_ok());
    }

    #[test]
    fn test_color_ops() {
        let a = Color::with_alpha(10.0, 20.0, 30.0, 40.0);
        let b = Color::with_alpha(1.0, 2.0, 3.0, 4.0);
        assert_eq!(a + b, Color::with_alpha(11.0, 22.0, 33.0, 44.0));
        assert_eq!(a - b, Color::with_alpha(9.0, 18.0, 27.0, 36.0));
        assert_eq!(a * b, Color::with_alpha(10.0, 40.0, 90.0, 160.0));
        assert_eq!(Color::with_alpha(300.0, -5.0, 12.7, 255.0).to_bytes(), [255, 0, 13, 255]);
    }

    #[test]
    fn test_sample_nearest_origin_is_first_row() {
        let img = checker_2x2();
        assert_eq!(img.sample_nearest(0.0, 0.0), Color::new(255.0, 0.0, 0.0));
        assert_eq!(img.sample_nearest(1.0, 1.0), Color::new(255.0, 255.0, 255.0));
        assert_eq!(img.sample_nearest(0.0, 1.0), Color::new(0.0, 0.0, 255.0));
    }

    #[test]
    fn test_sample_clamps_outside_unit_range() {
        let img = checker_2x2();
        assert_eq!(img.sample_nearest(-3.0, -0.5), img.sample_nearest(0.0, 0.0));
        assert_eq!(img.sample_nearest(7.0, 1.5), img.sample_nearest(1.0, 1.0));
        assert_eq!(img.sample_bilinear(-1.0, 2.0), img.sample_bilinear(0.0, 1.0));
    }

    #[test]
    fn test_sample_bilinear_center() {
        let img = checker_2x2();
        let c = img.sample_bilinear(0.5, 0.5);
        assert!((c.r - 127.5).abs() < 0.01);
        assert!((c.g - 127.5).abs() < 0.01);
        assert!((c.b - 127.5).abs() < 0.01);
        assert!((c.a - 255.0).abs() < 0.01);
    }

    #[test]
    fn test_missing_alpha_reads_opaque_and_out_of_bounds_transparent() {
        let img = checker_2x2();
        assert!((img.pixel(1, 0).a - 255.0).abs() < 0.001);
        assert_eq!(img.pixel(2, 0), Color::TRANSPARENT);
        assert_eq!(img.pixel(-1, 0), Color::TRANSPARENT);
        assert_eq!(Image::default().sample_nearest(0.5, 0.5), Color::TRANSPARENT);
    }

    #[test]
    fn test_material_texture() {
        let mut m = Material::new("brick");
        assert!(!m.has_texture());
        assert_eq!(m.texture_path(Path::new("models")), None);
        m.texture_name = "brick.png".to_string();
        assert!(m.has_texture());
        assert_eq!(m.texture_path(Path::new("models")), Some(PathBuf::from("models/brick.png")));
    }

    #[test]
    fn test_to_raw_defaults_and_missing() {
        let mut store = ResourceStore::new();
        let v0 = store.vertices.insert(Vertex::new(1.0, 0.0, 0.0));
        let v1 = store.vertices.insert(Vertex::new(0.0, 1.0, 0.0));
        let v2 = store.vertices.insert(Vertex::new(0.0, 0.0, 1.0));
        let mat = store.materials.insert(Material::new("red"));

        let mut tri = Triangle {
            vertices: [v0, v1, v2],
            material_name: "red".to_string(),
            material: mat,
            ..Triangle::default()
        };
        let raw = tri.to_raw(&store).unwrap();
        assert_eq!(raw.positions[2], Vec4::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(raw.colors, [Color::WHITE; 3]);
        assert_eq!(raw.tex_coords[1], TextureCoord::default());
        assert_eq!(raw.material.map(|m| m.name.as_str()), Some("red"));

        tri.vertices[1] = Handle::from_index(9);
        assert!(matches!(
            tri.to_raw(&store),
            Err(ResourceError::NotFound { kind: "Vertex", index: Some(9), .. })
        ));
    }
}
