//! Viewer configuration, stored as RON
//!
//! Every field has a default, so a config file only needs the values it
//! changes:
//!
//! ```ron
//! (
//!   width: 800,
//!   camera: (position: (0.0, 1.0, 4.0)),
//!   raster: (sample_mode: Bilinear),
//! )
//! ```

use std::fs;
use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::rasterizer::{Camera, RasterSettings, HEIGHT, WIDTH};
use crate::resource::Color;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        let camera = Camera::default();
        Self {
            position: camera.position(),
            target: camera.target(),
            up: camera.up(),
            fov: camera.fov(),
            near: camera.near(),
            far: camera.far(),
        }
    }
}

impl CameraConfig {
    /// Build a camera with the aspect ratio of a `width` x `height` viewport
    pub fn to_camera(&self, width: usize, height: usize) -> Camera {
        let mut camera = Camera::new(
            self.position,
            self.target,
            self.up,
            self.fov,
            1.0,
            self.near,
            self.far,
        );
        camera.set_viewport(width, height);
        camera
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: usize,
    pub height: usize,
    pub camera: CameraConfig,
    pub raster: RasterSettings,
    pub clear_color: Color,
    /// Model rotation about Y in radians per second, 0 to disable
    pub spin_speed: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: WIDTH,
            height: HEIGHT,
            camera: CameraConfig::default(),
            raster: RasterSettings::default(),
            clear_color: Color::BLACK,
            spin_speed: 0.5,
        }
    }
}

impl RenderConfig {
    pub fn camera(&self) -> Camera {
        self.camera.to_camera(self.width, self.height)
    }
}

/// Load a config from a RON file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<RenderConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    load_config_from_str(&contents)
}

/// Parse a config from a RON string
pub fn load_config_from_str(s: &str) -> Result<RenderConfig, ConfigError> {
    Ok(ron::from_str(s)?)
}

/// Save a config to a RON file
pub fn save_config<P: AsRef<Path>>(config: &RenderConfig, path: P) -> Result<(), ConfigError> {
    let pretty = ron::ser::PrettyConfig::new()
        .depth_limit(3)
        .indentor("  ".to_string());

    let contents = ron::ser::to_string_pretty(config, pretty)?;
    fs::write(path, contents)?;
    Ok(())
}
