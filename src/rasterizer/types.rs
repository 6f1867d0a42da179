//! Pipeline settings shared by the vertex stage and the rasterizer

use serde::{Deserialize, Serialize};

use crate::resource::SampleMode;

/// Which screen-space winding counts as front-facing.
///
/// Winding is judged in NDC (y up). After the viewport flip a
/// counter-clockwise triangle has a negative signed area, so the default
/// culls everything with `area >= 0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrontFace {
    #[default]
    CounterClockwise,
    Clockwise,
}

impl FrontFace {
    /// True if a triangle with this screen-space signed area faces away
    pub fn is_back_facing(self, area: f32) -> bool {
        match self {
            FrontFace::CounterClockwise => area >= 0.0,
            FrontFace::Clockwise => area <= 0.0,
        }
    }
}

/// Rasterizer settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterSettings {
    /// Depth-test fragments before shading them (allocates a depth buffer)
    pub early_depth_test: bool,
    /// Drop back-facing triangles in the vertex stage and the rasterizer
    pub back_face_culling: bool,
    pub front_face: FrontFace,
    /// Texture filtering used by the default fragment shader
    pub sample_mode: SampleMode,
}

impl Default for RasterSettings {
    fn default() -> Self {
        Self {
            early_depth_test: true,
            back_face_culling: true,
            front_face: FrontFace::CounterClockwise,
            sample_mode: SampleMode::Nearest,
        }
    }
}
