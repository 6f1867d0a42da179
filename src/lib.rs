//! Raster Engine: CPU triangle rasterizer and Wavefront scene loader
//!
//! - `.obj`/`.mtl` parsing into handle-indexed resource tables
//! - Look-at camera with perspective projection
//! - Pluggable vertex and fragment stages
//! - Edge-function rasterization with a depth buffer into an RGBA framebuffer

pub mod config;
pub mod errors;
pub mod loader;
pub mod rasterizer;
pub mod renderer;
pub mod resource;

pub use loader::ModelLoader;
pub use renderer::Renderer;

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
