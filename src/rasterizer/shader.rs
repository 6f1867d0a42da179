//! Programmable stages: vertex shading and fragment shading
//!
//! The rasterizer only talks to the [`VertexShader`] and [`FragmentShader`]
//! traits. The triangle shaders below are the defaults: clip-space transform
//! plus viewport mapping, and texture-or-vertex-colour output. There is no
//! lighting model.

use glam::{Mat4, Vec2};

use super::math::{ndc_to_screen, signed_area};
use super::types::FrontFace;
use crate::resource::{Color, Image, Material, Normal, RawTriangle, SampleMode, Store, TextureCoord};

/// Smallest clip-space w we still divide by. Anything at or behind the eye is
/// rejected whole.
const MIN_CLIP_W: f32 = 1e-6;

pub struct VertexInput<'a> {
    pub triangle: RawTriangle<'a>,
    pub mvp: Mat4,
    /// Viewport size for the screen-space mapping
    pub width: usize,
    pub height: usize,
}

#[derive(Debug, Clone)]
pub struct VertexOutput<'a> {
    /// Positions hold screen x/y, NDC z and w = 1
    pub triangle: RawTriangle<'a>,
    pub discard: bool,
}

impl<'a> VertexOutput<'a> {
    pub fn discarded(triangle: RawTriangle<'a>) -> Self {
        Self { triangle, discard: true }
    }
}

pub struct FragmentInput<'a> {
    /// Pixel centre in screen space
    pub position: Vec2,
    pub tex_coord: TextureCoord,
    pub normal: Normal,
    pub color: Color,
    pub material: Option<&'a Material>,
    pub images: &'a Store<Image>,
}

pub trait VertexShader {
    fn name(&self) -> &str;
    fn shade<'a>(&self, input: VertexInput<'a>) -> VertexOutput<'a>;
}

pub trait FragmentShader {
    fn name(&self) -> &str;
    fn shade(&self, input: &FragmentInput<'_>) -> Color;
}

/// Default vertex stage
#[derive(Debug, Clone)]
pub struct TriangleVertexShader {
    face_culling: bool,
    front_face: FrontFace,
}

impl TriangleVertexShader {
    pub fn new() -> Self {
        Self {
            face_culling: true,
            front_face: FrontFace::default(),
        }
    }

    pub fn enable_face_culling(&mut self, enable: bool) {
        self.face_culling = enable;
    }

    pub fn set_front_face(&mut self, front_face: FrontFace) {
        self.front_face = front_face;
    }
}

impl Default for TriangleVertexShader {
    fn default() -> Self {
        Self::new()
    }
}

impl VertexShader for TriangleVertexShader {
    fn name(&self) -> &str {
        "triangle_vertex"
    }

    fn shade<'a>(&self, input: VertexInput<'a>) -> VertexOutput<'a> {
        let mut triangle = input.triangle;

        let clip = triangle.positions.map(|p| input.mvp * p);
        if clip.iter().any(|c| c.w <= MIN_CLIP_W) {
            return VertexOutput::discarded(triangle);
        }
        for (pos, c) in triangle.positions.iter_mut().zip(clip) {
            *pos = ndc_to_screen(c / c.w, input.width, input.height);
        }

        let [v0, v1, v2] = triangle.positions.map(|p| p.truncate().truncate());
        let area = signed_area(v0, v1, v2);
        if self.face_culling && self.front_face.is_back_facing(area) {
            return VertexOutput::discarded(triangle);
        }

        VertexOutput { triangle, discard: false }
    }
}

/// Default fragment stage: diffuse texture if the material has one, else the
/// interpolated vertex colour
#[derive(Debug, Clone, Default)]
pub struct TriangleFragmentShader {
    sample_mode: SampleMode,
}

impl TriangleFragmentShader {
    pub fn new(sample_mode: SampleMode) -> Self {
        Self { sample_mode }
    }

    pub fn sample_mode(&self) -> SampleMode {
        self.sample_mode
    }

    pub fn set_sample_mode(&mut self, sample_mode: SampleMode) {
        self.sample_mode = sample_mode;
    }
}

impl FragmentShader for TriangleFragmentShader {
    fn name(&self) -> &str {
        "triangle_fragment"
    }

    fn shade(&self, input: &FragmentInput<'_>) -> Color {
        let texture = input
            .material
            .and_then(|m| input.images.get(m.image).ok())
            .filter(|img| img.is_valid());

        match texture {
            Some(img) => img.sample(input.tex_coord.uv, self.sample_mode),
            None => input.color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::Handle;
    use glam::Vec4;

    fn raw<'a>(points: [(f32, f32); 3]) -> RawTriangle<'a> {
        RawTriangle {
            positions: points.map(|(x, y)| Vec4::new(x, y, 0.0, 1.0)),
            ..RawTriangle::default()
        }
    }

    fn run(shader: &TriangleVertexShader, tri: RawTriangle<'static>) -> VertexOutput<'static> {
        shader.shade(VertexInput {
            triangle: tri,
            mvp: Mat4::IDENTITY,
            width: 100,
            height: 100,
        })
    }

    #[test]
    fn test_viewport_mapping() {
        let mut shader = TriangleVertexShader::new();
        shader.enable_face_culling(false);
        let out = run(&shader, raw([(-1.0, 1.0), (1.0, 1.0), (1.0, -1.0)]));
        assert!(!out.discard);
        let p = out.triangle.positions;
        assert!(p[0].x.abs() < 0.001 && p[0].y.abs() < 0.001);
        assert!((p[1].x - 100.0).abs() < 0.001 && p[1].y.abs() < 0.001);
        assert!((p[2].x - 100.0).abs() < 0.001 && (p[2].y - 100.0).abs() < 0.001);
    }

    #[test]
    fn test_perspective_divide() {
        let mut shader = TriangleVertexShader::new();
        shader.enable_face_culling(false);
        let mut tri = raw([(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]);
        tri.positions[1] = Vec4::new(2.0, 0.0, 1.0, 2.0);
        let out = run(&shader, tri);
        // (2, 0, 1, 2) / 2 = (1, 0, 0.5) -> x = 100, y = 50
        let p = out.triangle.positions[1];
        assert!((p.x - 100.0).abs() < 0.001);
        assert!((p.y - 50.0).abs() < 0.001);
        assert!((p.z - 0.5).abs() < 0.001);
    }

    #[test]
    fn test_culling_counter_clockwise_front() {
        let shader = TriangleVertexShader::new();
        // counter-clockwise in NDC: kept
        let ccw = run(&shader, raw([(0.0, 0.0), (0.5, 0.0), (0.0, 0.5)]));
        assert!(!ccw.discard);
        // clockwise in NDC: culled
        let cw = run(&shader, raw([(0.0, 0.0), (0.0, 0.5), (0.5, 0.0)]));
        assert!(cw.discard);
    }

    #[test]
    fn test_culling_disabled_or_flipped() {
        let mut shader = TriangleVertexShader::new();
        shader.enable_face_culling(false);
        let cw = run(&shader, raw([(0.0, 0.0), (0.0, 0.5), (0.5, 0.0)]));
        assert!(!cw.discard);

        shader.enable_face_culling(true);
        shader.set_front_face(FrontFace::Clockwise);
        let cw = run(&shader, raw([(0.0, 0.0), (0.0, 0.5), (0.5, 0.0)]));
        assert!(!cw.discard);
        let ccw = run(&shader, raw([(0.0, 0.0), (0.5, 0.0), (0.0, 0.5)]));
        assert!(ccw.discard);
    }

    #[test]
    fn test_behind_eye_is_discarded() {
        let mut shader = TriangleVertexShader::new();
        shader.enable_face_culling(false);
        let mut tri = raw([(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]);
        tri.positions[2].w = -1.0;
        assert!(run(&shader, tri).discard);
    }

    #[test]
    fn test_attributes_pass_through() {
        let mut shader = TriangleVertexShader::new();
        shader.enable_face_culling(false);
        let material = Material::new("m");
        let mut tri = raw([(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]);
        tri.colors[1] = Color::new(1.0, 2.0, 3.0);
        tri.tex_coords[2] = TextureCoord::new(0.25, 0.75);
        tri.has_tex_coords = true;
        tri.material = Some(&material);
        let out = shader.shade(VertexInput { triangle: tri, mvp: Mat4::IDENTITY, width: 10, height: 10 });
        assert_eq!(out.triangle.colors[1], Color::new(1.0, 2.0, 3.0));
        assert_eq!(out.triangle.tex_coords[2], TextureCoord::new(0.25, 0.75));
        assert!(out.triangle.has_tex_coords);
        assert_eq!(out.triangle.material.map(|m| m.name.as_str()), Some("m"));
    }

    #[test]
    fn test_fragment_texture_or_color() {
        let mut images = Store::new();
        let red = images.insert(Image::new("red", 1, 1, 4, vec![255, 0, 0, 255]));
        let shader = TriangleFragmentShader::default();

        let textured = Material {
            image: red,
            texture_name: "red.png".to_string(),
            ..Material::new("textured")
        };
        let plain = Material::new("plain");
        let dangling = Material { image: Handle::from_index(4), ..Material::new("dangling") };

        let blue = Color::new(0.0, 0.0, 200.0);
        assert_eq!(shader.shade(&fragment(Some(&textured), &images)), Color::new(255.0, 0.0, 0.0));
        assert_eq!(shader.shade(&fragment(Some(&plain), &images)), blue);
        assert_eq!(shader.shade(&fragment(Some(&dangling), &images)), blue);
        assert_eq!(shader.shade(&fragment(None, &images)), blue);
    }

    fn fragment<'a>(material: Option<&'a Material>, images: &'a Store<Image>) -> FragmentInput<'a> {
        FragmentInput {
            position: Vec2::ZERO,
            tex_coord: TextureCoord::new(0.5, 0.5),
            normal: Normal::default(),
            color: Color::new(0.0, 0.0, 200.0),
            material,
            images,
        }
    }
}
