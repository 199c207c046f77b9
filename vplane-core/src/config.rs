/// Renderer configuration, loadable from TOML
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::assembler::{AssemblyOptions, ShadingStrategy};
use crate::camera::{CameraState, CameraTuning};
use crate::error::{Error, Result};
use crate::projection::Viewport;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    /// Field of view in degrees
    pub fov_degrees: f64,
    /// Simulation ticks per second
    pub tick_rate: u32,
    /// Camera rotation per tick, radians
    pub pan_speed: f64,
    /// Camera movement per tick, world units
    pub move_speed: f64,
    pub camera_position: [f64; 3],
    pub camera_look: [f64; 3],
    pub marker_radius: u32,
    pub shading: ShadingStrategy,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fov_degrees: 180.0,
            tick_rate: 60,
            pan_speed: 0.02,
            move_speed: 0.1,
            camera_position: [0.0, 0.0, 1.2],
            camera_look: [1.0, 1.0, 0.0],
            marker_radius: 4,
            shading: ShadingStrategy::IndexBased,
        }
    }
}

impl RenderConfig {
    /// Parse and validate a TOML document; missing keys keep their defaults.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config = Self::from_toml(&fs::read_to_string(path)?)?;
        log::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidConfig(format!(
                "screen size {}x{} must be non-zero",
                self.width, self.height
            )));
        }
        if self.tick_rate == 0 {
            return Err(Error::InvalidConfig("tick_rate must be non-zero".into()));
        }
        if !(self.fov_degrees > 0.0 && self.fov_degrees <= 360.0) {
            return Err(Error::InvalidConfig(format!(
                "fov_degrees {} must be in (0, 360]",
                self.fov_degrees
            )));
        }
        if !self.camera_position.iter().all(|c| c.is_finite()) {
            return Err(Error::InvalidConfig(format!(
                "camera_position {:?} must be finite",
                self.camera_position
            )));
        }
        if !self.camera_look.iter().all(|c| c.is_finite()) || self.camera_look.iter().all(|&c| c == 0.0) {
            return Err(Error::DegenerateOrientation);
        }
        Ok(())
    }

    pub fn fov_radians(&self) -> f64 {
        self.fov_degrees.to_radians()
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.width, self.height)
    }

    pub fn tuning(&self) -> CameraTuning {
        CameraTuning {
            pan_speed: self.pan_speed,
            move_speed: self.move_speed,
        }
    }

    pub fn assembly_options(&self) -> AssemblyOptions {
        AssemblyOptions {
            viewport: self.viewport(),
            marker_radius: self.marker_radius,
            shading: self.shading,
        }
    }

    /// The camera the simulation starts with
    pub fn initial_camera(&self) -> Result<CameraState> {
        CameraState::new(
            Point3::from(self.camera_position),
            Vector3::from(self.camera_look),
            self.fov_radians(),
        )
    }
}
