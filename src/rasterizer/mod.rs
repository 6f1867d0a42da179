//! Software rasterizer
//!
//! Pipeline stages:
//! - Camera: view-projection matrix, cached until the camera moves
//! - Vertex stage: clip-space transform, perspective divide, viewport mapping, face culling
//! - Rasterizer: bounding-box traversal, edge-function inside test, barycentric interpolation
//! - Depth test (larger depth is nearer) and fragment stage (texture or vertex colour)

mod camera;
mod math;
mod render;
mod shader;
mod types;

pub use camera::*;
pub use math::*;
pub use render::*;
pub use shader::*;
pub use types::*;

/// Default viewport size
pub const WIDTH: usize = 1024;
pub const HEIGHT: usize = 1024;
