//! Wavefront mesh loading
//!
//! A [`ModelLoader`] owns the [`ResourceStore`] filled by its last load.
//! Loading is streaming and line-oriented: malformed lines are logged,
//! counted and skipped, and only a missing file or a file without geometry
//! fails the load.

mod image;
mod mtl;
mod obj;

pub use self::image::*;

use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use glam::Mat4;

use crate::errors::LoadError;
use crate::resource::{Handle, Image, Material, Normal, ResourceStore, Store, TextureCoord, Triangle, Vertex};

/// Entity counts of the current load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Statistics {
    pub vertices: usize,
    pub triangles: usize,
    pub tex_coords: usize,
    pub normals: usize,
    pub materials: usize,
}

pub struct ModelLoader {
    resources: ResourceStore,
    material_names: HashMap<String, Handle<Material>>,
    base_path: PathBuf,
    object_name: String,
    current_material: String,
    skipped_lines: usize,
    model_matrix: Mat4,
    decoder: Box<dyn ImageDecoder>,
}

impl ModelLoader {
    pub fn new() -> Self {
        Self::with_decoder(Box::new(FileImageDecoder))
    }

    pub fn with_decoder(decoder: Box<dyn ImageDecoder>) -> Self {
        Self {
            resources: ResourceStore::new(),
            material_names: HashMap::new(),
            base_path: PathBuf::new(),
            object_name: String::new(),
            current_material: String::new(),
            skipped_lines: 0,
            model_matrix: Mat4::IDENTITY,
            decoder,
        }
    }

    /// Load a mesh file, replacing everything from the previous load.
    /// Material libraries and textures resolve relative to the file's directory.
    pub fn load_model(&mut self, path: impl AsRef<Path>) -> Result<(), LoadError> {
        let path = path.as_ref();
        self.reset();

        let file = File::open(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let base = path.parent().map(Path::to_path_buf).unwrap_or_default();

        self.load(BufReader::new(file), base, path)
    }

    /// Same as [`ModelLoader::load_model`] but reads mesh lines from `reader`
    pub fn load_model_from_reader(&mut self, reader: impl BufRead, base_path: impl Into<PathBuf>) -> Result<(), LoadError> {
        self.reset();
        let base = base_path.into();
        let source = base.clone();
        self.load(reader, base, &source)
    }

    fn load(&mut self, reader: impl BufRead, base: PathBuf, source: &Path) -> Result<(), LoadError> {
        self.base_path = base;

        if let Err(source_err) = self.parse_mesh(reader, source) {
            self.reset();
            return Err(LoadError::Io {
                path: source.to_path_buf(),
                source: source_err,
            });
        }
        self.resolve_materials();

        let stats = self.statistics();
        if stats.vertices == 0 || stats.triangles == 0 {
            return Err(LoadError::NoGeometry {
                path: source.to_path_buf(),
                vertices: stats.vertices,
                triangles: stats.triangles,
            });
        }

        log::info!(
            "Loaded {}: {} vertices, {} triangles, {} materials, {} textures ({} lines skipped)",
            source.display(),
            stats.vertices,
            stats.triangles,
            stats.materials,
            self.resources.images.len(),
            self.skipped_lines,
        );
        Ok(())
    }

    fn reset(&mut self) {
        self.resources.clear();
        self.material_names.clear();
        self.base_path = PathBuf::new();
        self.object_name.clear();
        self.current_material.clear();
        self.skipped_lines = 0;
    }

    /// Point every triangle at the material its name refers to
    fn resolve_materials(&mut self) {
        let names = &self.material_names;
        let mut unknown = BTreeSet::new();

        for (_, triangle) in self.resources.triangles.iter_mut() {
            triangle.material = match names.get(&triangle.material_name) {
                Some(&handle) => handle,
                None => {
                    if !triangle.material_name.is_empty() {
                        unknown.insert(triangle.material_name.clone());
                    }
                    Handle::INVALID
                }
            };
        }

        for name in unknown {
            log::warn!("material `{}` is used but never defined", name);
        }
    }

    pub fn resources(&self) -> &ResourceStore {
        &self.resources
    }

    pub fn vertices(&self) -> &Store<Vertex> {
        &self.resources.vertices
    }

    pub fn tex_coords(&self) -> &Store<TextureCoord> {
        &self.resources.tex_coords
    }

    pub fn normals(&self) -> &Store<Normal> {
        &self.resources.normals
    }

    pub fn materials(&self) -> &Store<Material> {
        &self.resources.materials
    }

    pub fn images(&self) -> &Store<Image> {
        &self.resources.images
    }

    pub fn triangles(&self) -> &Store<Triangle> {
        &self.resources.triangles
    }

    /// Look up a material by its library name
    pub fn material(&self, name: &str) -> Option<&Material> {
        let handle = *self.material_names.get(name)?;
        self.resources.materials.get(handle).ok()
    }

    /// Last `o` name seen, empty if none
    pub fn object_name(&self) -> &str {
        &self.object_name
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Lines dropped as malformed during the last load, mesh and material libraries together
    pub fn skipped_lines(&self) -> usize {
        self.skipped_lines
    }

    pub fn statistics(&self) -> Statistics {
        Statistics {
            vertices: self.resources.vertices.len(),
            triangles: self.resources.triangles.len(),
            tex_coords: self.resources.tex_coords.len(),
            normals: self.resources.normals.len(),
            materials: self.resources.materials.len(),
        }
    }

    pub fn model_matrix(&self) -> Mat4 {
        self.model_matrix
    }

    pub fn set_model_matrix(&mut self, matrix: Mat4) {
        self.model_matrix = matrix;
    }
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Feed each line of `reader` to `f` with its 1-based number. Bytes that are
/// not UTF-8 are replaced, so only a failing read is an error.
fn for_each_line(mut reader: impl BufRead, mut f: impl FnMut(usize, &str)) -> io::Result<()> {
    let mut buf = Vec::new();
    let mut number = 0;
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(());
        }
        number += 1;
        let line = String::from_utf8_lossy(&buf);
        f(number, line.trim_end_matches(['\n', '\r']));
    }
}

/// Strip a `#` comment and split on whitespace
fn tokenize(line: &str) -> Vec<&str> {
    let line = match line.find('#') {
        Some(i) => &line[..i],
        None => line,
    };
    line.split_whitespace().collect()
}
