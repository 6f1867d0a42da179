//! Scene renderer
//!
//! Owns the loaded models, the bound shaders, the rasterizer and the
//! framebuffer they draw into. One instance per window or output image.

use std::path::Path;

use log::warn;

use crate::errors::{LoadError, ResourceError};
use crate::loader::ModelLoader;
use crate::rasterizer::{
    Camera, FragmentShader, Framebuffer, RasterSettings, Rasterizer, TriangleFragmentShader, TriangleVertexShader,
    VertexInput, VertexShader,
};
use crate::resource::{Color, Handle, Store};

pub struct Renderer {
    models: Store<ModelLoader>,
    vertex_shader: Box<dyn VertexShader>,
    rasterizer: Rasterizer,
    framebuffer: Framebuffer,
    settings: RasterSettings,
}

impl Renderer {
    pub fn new(width: usize, height: usize) -> Self {
        Self::with_settings(width, height, RasterSettings::default())
    }

    pub fn with_settings(width: usize, height: usize, settings: RasterSettings) -> Self {
        let mut renderer = Self {
            models: Store::new(),
            vertex_shader: Box::new(TriangleVertexShader::new()),
            rasterizer: Rasterizer::new(width, height, settings.early_depth_test),
            framebuffer: Framebuffer::new(width, height),
            settings,
        };
        renderer.apply_settings(settings);
        renderer
    }

    /// Load a mesh file and keep it for drawing
    pub fn add_model(&mut self, path: impl AsRef<Path>) -> Result<Handle<ModelLoader>, LoadError> {
        let mut loader = ModelLoader::new();
        loader.load_model(path)?;
        Ok(self.models.insert(loader))
    }

    /// Take ownership of an already loaded model
    pub fn add_loaded_model(&mut self, loader: ModelLoader) -> Handle<ModelLoader> {
        self.models.insert(loader)
    }

    pub fn model(&self, handle: Handle<ModelLoader>) -> Result<&ModelLoader, ResourceError> {
        self.models.get(handle)
    }

    pub fn model_mut(&mut self, handle: Handle<ModelLoader>) -> Result<&mut ModelLoader, ResourceError> {
        self.models.get_mut(handle)
    }

    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    /// Rebind the default shaders and rasterizer state from `settings`.
    /// Custom shaders bound earlier are replaced.
    pub fn apply_settings(&mut self, settings: RasterSettings) {
        let mut vertex_shader = TriangleVertexShader::new();
        vertex_shader.enable_face_culling(settings.back_face_culling);
        vertex_shader.set_front_face(settings.front_face);
        self.vertex_shader = Box::new(vertex_shader);

        self.rasterizer.enable_early_z_buffer(settings.early_depth_test);
        self.rasterizer.enable_back_face_culling(settings.back_face_culling);
        self.rasterizer.set_front_face(settings.front_face);
        self.rasterizer
            .set_fragment_shader(Box::new(TriangleFragmentShader::new(settings.sample_mode)));

        self.settings = settings;
    }

    pub fn settings(&self) -> RasterSettings {
        self.settings
    }

    pub fn set_vertex_shader(&mut self, shader: Box<dyn VertexShader>) {
        log::debug!("bound vertex shader `{}`", shader.name());
        self.vertex_shader = shader;
    }

    pub fn set_fragment_shader(&mut self, shader: Box<dyn FragmentShader>) {
        self.rasterizer.set_fragment_shader(shader);
    }

    /// Clear colour and depth for a new frame
    pub fn begin_frame(&mut self, clear_color: Color) {
        self.framebuffer.clear(clear_color);
        self.rasterizer.clear_depth_buffer();
    }

    pub fn clear_depth_buffer(&mut self) {
        self.rasterizer.clear_depth_buffer();
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        if (width, height) == self.viewport_size() {
            return;
        }
        log::debug!("viewport resized to {}x{}", width, height);
        self.rasterizer.resize(width, height);
        self.framebuffer.resize(width, height);
    }

    pub fn viewport_size(&self) -> (usize, usize) {
        self.rasterizer.viewport_size()
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    /// Draw every model in load order. Returns the number of pixels written.
    pub fn render_scene(&mut self, camera: &Camera) -> usize {
        let mut written = 0;
        for (_, model) in self.models.iter() {
            written += draw_model(
                model,
                camera,
                self.vertex_shader.as_ref(),
                &mut self.rasterizer,
                &mut self.framebuffer,
            );
        }
        written
    }

    pub fn render_model(&mut self, handle: Handle<ModelLoader>, camera: &Camera) -> Result<usize, ResourceError> {
        let model = self.models.get(handle)?;
        Ok(draw_model(
            model,
            camera,
            self.vertex_shader.as_ref(),
            &mut self.rasterizer,
            &mut self.framebuffer,
        ))
    }
}

fn draw_model(
    model: &ModelLoader,
    camera: &Camera,
    vertex_shader: &dyn VertexShader,
    rasterizer: &mut Rasterizer,
    framebuffer: &mut Framebuffer,
) -> usize {
    let mvp = camera.mvp(model.model_matrix());
    let (width, height) = rasterizer.viewport_size();
    let resources = model.resources();

    let mut written = 0;
    let mut skipped = 0;
    for (_, triangle) in resources.triangles.iter() {
        let raw = match triangle.to_raw(resources) {
            Ok(raw) => raw,
            Err(_) => {
                skipped += 1;
                continue;
            }
        };
        let output = vertex_shader.shade(VertexInput {
            triangle: raw,
            mvp,
            width,
            height,
        });
        written += rasterizer.rasterize(&output, &resources.images, framebuffer);
    }

    if skipped > 0 {
        warn!(
            "{}: skipped {} triangles referencing missing data",
            model.base_path().display(),
            skipped
        );
    }
    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::DecodeError;
    use crate::loader::ImageDecoder;
    use crate::rasterizer::FrontFace;
    use crate::resource::Image;
    use glam::Vec3;
    use std::fs;
    use std::io::Cursor;
    use std::path::PathBuf;

    const SIZE: usize = 64;
    const CENTER: usize = SIZE / 2;

    /// One pixel of a colour picked from the file name
    struct SolidDecoder;

    impl ImageDecoder for SolidDecoder {
        fn decode(&self, path: &Path) -> Result<Image, DecodeError> {
            let rgb = match path.file_stem().and_then(|s| s.to_str()) {
                Some("red") => [255, 0, 0],
                Some("green") => [0, 255, 0],
                _ => return Err(DecodeError::Empty { path: path.to_path_buf(), width: 0, height: 0 }),
            };
            Ok(Image::new(path.to_string_lossy(), 1, 1, 3, rgb.to_vec()))
        }
    }

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("raster_engine_renderer_{}_{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Square of side `2 * half` at depth `z`, counter-clockwise seen from +z
    fn quad_obj(half: f32, z: f32, material: &str) -> String {
        format!(
            "mtllib colors.mtl\nv {n} {n} {z}\nv {p} {n} {z}\nv {p} {p} {z}\nv {n} {p} {z}\n\
             vt 0 0\nvt 1 0\nvt 1 1\nvt 0 1\nusemtl {material}\nf 1/1 2/2 3/3 4/4\n",
            n = -half,
            p = half,
        )
    }

    fn load(dir: &Path, name: &str, text: String) -> ModelLoader {
        fs::write(dir.join("colors.mtl"), "newmtl red\nmap_Kd red.png\nnewmtl green\nmap_Kd green.png\n").unwrap();
        let path = dir.join(name);
        fs::write(&path, text).unwrap();
        let mut loader = ModelLoader::with_decoder(Box::new(SolidDecoder));
        loader.load_model(&path).unwrap();
        loader
    }

    fn camera() -> Camera {
        Camera::new(Vec3::new(0.0, 0.0, 3.0), Vec3::ZERO, Vec3::Y, 45.0, 1.0, 0.1, 100.0)
    }

    fn white_quad() -> ModelLoader {
        let mut loader = ModelLoader::new();
        let text = "v -0.5 -0.5 0\nv 0.5 -0.5 0\nv 0.5 0.5 0\nv -0.5 0.5 0\nf 1 2 3 4\n";
        loader.load_model_from_reader(Cursor::new(text), "").unwrap();
        loader
    }

    #[test]
    fn test_untextured_quad_is_white() {
        let mut renderer = Renderer::new(SIZE, SIZE);
        renderer.add_loaded_model(white_quad());
        renderer.begin_frame(Color::BLACK);

        let written = renderer.render_scene(&camera());
        assert!(written > 0);
        assert_eq!(renderer.framebuffer().get_pixel(CENTER, CENTER), Some([255, 255, 255, 255]));
        assert_eq!(renderer.framebuffer().get_pixel(0, 0), Some([0, 0, 0, 255]));
    }

    #[test]
    fn test_back_face_follows_settings() {
        let mut renderer = Renderer::new(SIZE, SIZE);
        renderer.add_loaded_model(white_quad());
        // seen from behind, the quad winds clockwise
        let behind = Camera::new(Vec3::new(0.0, 0.0, -3.0), Vec3::ZERO, Vec3::Y, 45.0, 1.0, 0.1, 100.0);

        renderer.begin_frame(Color::BLACK);
        assert_eq!(renderer.render_scene(&behind), 0);

        renderer.apply_settings(RasterSettings { back_face_culling: false, ..RasterSettings::default() });
        renderer.begin_frame(Color::BLACK);
        assert!(renderer.render_scene(&behind) > 0);

        renderer.apply_settings(RasterSettings { front_face: FrontFace::Clockwise, ..RasterSettings::default() });
        renderer.begin_frame(Color::BLACK);
        assert!(renderer.render_scene(&behind) > 0);
        renderer.begin_frame(Color::BLACK);
        assert_eq!(renderer.render_scene(&camera()), 0);
    }

    #[test]
    fn test_nearer_model_wins_in_any_order() {
        let dir = temp_dir("depth");
        let near = load(&dir, "near.obj", quad_obj(0.3, 0.5, "red"));
        let far = load(&dir, "far.obj", quad_obj(0.6, 0.0, "green"));

        let mut renderer = Renderer::new(SIZE, SIZE);
        let near = renderer.add_loaded_model(near);
        let far = renderer.add_loaded_model(far);
        let cam = camera();

        for order in [[near, far], [far, near]] {
            renderer.begin_frame(Color::BLACK);
            for handle in order {
                renderer.render_model(handle, &cam).unwrap();
            }
            assert_eq!(renderer.framebuffer().get_pixel(CENTER, CENTER), Some([255, 0, 0, 255]));
        }

        // the far quad still shows around the near one
        let (w, _) = renderer.viewport_size();
        let edge = CENTER + w / 6;
        assert_eq!(renderer.framebuffer().get_pixel(edge, CENTER), Some([0, 255, 0, 255]));
    }

    #[test]
    fn test_without_depth_test_last_draw_wins() {
        let dir = temp_dir("no_depth");
        let near = load(&dir, "near.obj", quad_obj(0.3, 0.5, "red"));
        let far = load(&dir, "far.obj", quad_obj(0.6, 0.0, "green"));

        let settings = RasterSettings { early_depth_test: false, ..RasterSettings::default() };
        let mut renderer = Renderer::with_settings(SIZE, SIZE, settings);
        renderer.add_loaded_model(near);
        renderer.add_loaded_model(far);

        renderer.begin_frame(Color::BLACK);
        renderer.render_scene(&camera());
        assert_eq!(renderer.framebuffer().get_pixel(CENTER, CENTER), Some([0, 255, 0, 255]));
    }

    #[test]
    fn test_dangling_triangle_is_skipped() {
        let mut loader = ModelLoader::new();
        let text = "v -0.5 -0.5 0\nv 0.5 -0.5 0\nv 0.5 0.5 0\nv -0.5 0.5 0\nf 1 2 3 4\nf 1 2 9\n";
        loader.load_model_from_reader(Cursor::new(text), "").unwrap();
        assert_eq!(loader.triangles().len(), 3);

        let mut renderer = Renderer::new(SIZE, SIZE);
        renderer.add_loaded_model(loader);
        renderer.begin_frame(Color::BLACK);
        assert!(renderer.render_scene(&camera()) > 0);
        assert_eq!(renderer.framebuffer().get_pixel(CENTER, CENTER), Some([255, 255, 255, 255]));
    }

    #[test]
    fn test_model_matrix_moves_model() {
        let mut renderer = Renderer::new(SIZE, SIZE);
        let handle = renderer.add_loaded_model(white_quad());
        renderer
            .model_mut(handle)
            .unwrap()
            .set_model_matrix(glam::Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0)));

        renderer.begin_frame(Color::BLACK);
        assert_eq!(renderer.render_model(handle, &camera()), Ok(0));
        assert_eq!(renderer.framebuffer().get_pixel(CENTER, CENTER), Some([0, 0, 0, 255]));
    }

    #[test]
    fn test_unknown_model_handle() {
        let mut renderer = Renderer::new(SIZE, SIZE);
        assert!(renderer.render_model(Handle::from_index(0), &camera()).is_err());
        assert!(renderer.model(Handle::INVALID).is_err());
        assert!(renderer.add_model("/no/such/model.obj").is_err());
        assert_eq!(renderer.model_count(), 0);
    }

    #[test]
    fn test_resize() {
        let mut renderer = Renderer::new(SIZE, SIZE);
        renderer.resize(32, 16);
        assert_eq!(renderer.viewport_size(), (32, 16));
        assert_eq!(renderer.framebuffer().width, 32);
        assert_eq!(renderer.framebuffer().height, 16);
        assert_eq!(renderer.framebuffer().pixels.len(), 32 * 16 * 4);
    }
}
