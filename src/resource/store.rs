//! Handle-indexed resource tables

use super::handle::Handle;
use super::types::{Color, Image, Material, Normal, TextureCoord, Triangle, Vertex};
use crate::errors::ResourceError;

fn kind_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

/// Owner of every `T` created during a load.
///
/// Handles are minted in insertion order starting at zero and are never
/// reused until [`Store::clear`].
#[derive(Debug, Clone)]
pub struct Store<T> {
    items: Vec<T>,
}

impl<T> Store<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Add a value and return its freshly minted handle
    pub fn insert(&mut self, value: T) -> Handle<T> {
        let handle = Handle::new(self.items.len());
        self.items.push(value);
        handle
    }

    pub fn get(&self, handle: Handle<T>) -> Result<&T, ResourceError> {
        let index = self.checked_index(handle)?;
        Ok(&self.items[index])
    }

    pub fn get_mut(&mut self, handle: Handle<T>) -> Result<&mut T, ResourceError> {
        let index = self.checked_index(handle)?;
        Ok(&mut self.items[index])
    }

    pub fn contains(&self, handle: Handle<T>) -> bool {
        self.checked_index(handle).is_ok()
    }

    /// Drop all entries and restart numbering at zero
    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Entries in handle order
    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> + '_ {
        self.items
            .iter()
            .enumerate()
            .map(|(i, item)| (Handle::new(i), item))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Handle<T>, &mut T)> + '_ {
        self.items
            .iter_mut()
            .enumerate()
            .map(|(i, item)| (Handle::new(i), item))
    }

    fn checked_index(&self, handle: Handle<T>) -> Result<usize, ResourceError> {
        let kind = kind_name::<T>();
        let len = self.items.len();
        match handle.index() {
            Some(index) if index < len => Ok(index),
            index => Err(ResourceError::NotFound { kind, index, len }),
        }
    }
}

impl<T> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Every table a loaded model owns
#[derive(Debug, Clone, Default)]
pub struct ResourceStore {
    pub vertices: Store<Vertex>,
    pub tex_coords: Store<TextureCoord>,
    pub normals: Store<Normal>,
    pub colors: Store<Color>,
    pub materials: Store<Material>,
    pub images: Store<Image>,
    pub triangles: Store<Triangle>,
}

impl ResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.tex_coords.clear();
        self.normals.clear();
        self.colors.clear();
        self.materials.clear();
        self.images.clear();
        self.triangles.clear();
    }
}
