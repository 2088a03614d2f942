use glam::Vec4;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::renderer::error::RenderError;
use crate::renderer::lights::{LightSource, Lighting, LIGHT_COUNT};
use crate::scene::ColorPair;

pub const SETTINGS_FILE: &str = "render_settings.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderSettings {
    #[serde(default)]
    pub stack_depths: StackDepths,
    #[serde(default = "RenderSettings::default_primary_color")]
    pub default_color: [f32; 4],
    #[serde(default = "RenderSettings::default_complement_color")]
    pub default_complement: [f32; 4],
    #[serde(default = "RenderSettings::default_background")]
    pub background: [f32; 4],
    #[serde(default)]
    pub lighting: LightingSettings,
    #[serde(default)]
    pub drag_handle: DragHandleSettings,
    #[serde(default)]
    pub instancing: InstancingSetting,
    #[serde(default = "RenderSettings::default_instance_capacity")]
    pub initial_instance_capacity: u32,
    #[serde(default = "RenderSettings::default_geometry_capacity")]
    pub initial_geometry_capacity: u32,
    #[serde(default = "RenderSettings::default_sample_count")]
    pub sample_count: u32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            stack_depths: StackDepths::default(),
            default_color: Self::default_primary_color(),
            default_complement: Self::default_complement_color(),
            background: Self::default_background(),
            lighting: LightingSettings::default(),
            drag_handle: DragHandleSettings::default(),
            instancing: InstancingSetting::default(),
            initial_instance_capacity: Self::default_instance_capacity(),
            initial_geometry_capacity: Self::default_geometry_capacity(),
            sample_count: Self::default_sample_count(),
        }
    }
}

impl RenderSettings {
    pub fn load() -> Self {
        Self::load_from_path(SETTINGS_FILE)
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Self {
        use std::fs;

        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<RenderSettings>(&contents) {
                Ok(settings) => {
                    info!("Loaded render settings from {:?}", path);
                    settings.validate()
                }
                Err(err) => {
                    warn!(
                        "Failed to parse {:?} ({}). Falling back to default render settings.",
                        path, err
                    );
                    RenderSettings::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!(
                    "Render settings file {:?} not found. Using default settings.",
                    path
                );
                RenderSettings::default()
            }
            Err(err) => {
                warn!(
                    "Failed to read {:?} ({}). Falling back to default render settings.",
                    path, err
                );
                RenderSettings::default()
            }
        }
    }

    /// Strict variant of [`load_from_path`](Self::load_from_path): parse
    /// failures are reported instead of replaced by defaults.
    pub fn from_json_str(contents: &str) -> Result<Self, RenderError> {
        serde_json::from_str::<RenderSettings>(contents)
            .map(RenderSettings::validate)
            .map_err(|err| RenderError::Settings(err.to_string()))
    }

    pub fn default_colors(&self) -> ColorPair {
        ColorPair::from_arrays(self.default_color, self.default_complement)
    }

    pub fn background_color(&self) -> Vec4 {
        Vec4::from_array(self.background)
    }

    fn validate(mut self) -> Self {
        self.stack_depths = self.stack_depths.validate();

        if self.sample_count == 0 || !self.sample_count.is_power_of_two() {
            warn!(
                "Sample count {} is not a power of two. Using 1 instead.",
                self.sample_count
            );
            self.sample_count = 1;
        }

        if self.initial_instance_capacity == 0 {
            warn!("Initial instance capacity must be greater than zero. Using default value.");
            self.initial_instance_capacity = Self::default_instance_capacity();
        }

        if self.initial_geometry_capacity == 0 {
            warn!("Initial geometry capacity must be greater than zero. Using default value.");
            self.initial_geometry_capacity = Self::default_geometry_capacity();
        }

        self.drag_handle = self.drag_handle.validate();
        self
    }

    const fn default_primary_color() -> [f32; 4] {
        [0.5, 0.5, 0.5, 1.0]
    }

    const fn default_complement_color() -> [f32; 4] {
        [0.2, 0.2, 0.2, 1.0]
    }

    const fn default_background() -> [f32; 4] {
        [1.0, 1.0, 1.0, 1.0]
    }

    const fn default_instance_capacity() -> u32 {
        1024
    }

    const fn default_geometry_capacity() -> u32 {
        4096
    }

    const fn default_sample_count() -> u32 {
        4
    }
}

/// Maximum depth of each state stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackDepths {
    pub color: usize,
    pub texture: usize,
    pub transform: usize,
    pub display_list: usize,
}

impl Default for StackDepths {
    fn default() -> Self {
        Self {
            color: 64,
            texture: 128,
            transform: 64,
            display_list: 64,
        }
    }
}

impl StackDepths {
    fn validate(self) -> Self {
        let defaults = Self::default();
        let pick = |name: &str, value: usize, fallback: usize| {
            if value == 0 {
                warn!("{} stack depth must be greater than zero. Using {}.", name, fallback);
                fallback
            } else {
                value
            }
        };
        Self {
            color: pick("Color", self.color, defaults.color),
            texture: pick("Texture", self.texture, defaults.texture),
            transform: pick("Transform", self.transform, defaults.transform),
            display_list: pick("Display list", self.display_list, defaults.display_list),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightSettings {
    pub diffuse: [f32; 4],
    /// `w == 0` for a directional light.
    pub position: [f32; 4],
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingSettings {
    pub lights: [LightSettings; LIGHT_COUNT],
    pub ambient: [f32; 4],
    /// Lights are given in world space and follow the camera; otherwise they
    /// are fixed in eye space.
    pub world_space: bool,
}

impl Default for LightingSettings {
    fn default() -> Self {
        let lighting = Lighting::default();
        Self {
            lights: lighting.lights.map(|light| LightSettings {
                diffuse: light.diffuse.to_array(),
                position: light.position.to_array(),
            }),
            ambient: lighting.ambient.to_array(),
            world_space: false,
        }
    }
}

impl LightingSettings {
    pub fn lighting(&self) -> Lighting {
        Lighting {
            lights: self.lights.map(|light| LightSource {
                diffuse: Vec4::from_array(light.diffuse),
                position: Vec4::from_array(light.position),
            }),
            ambient: Vec4::from_array(self.ambient),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragHandleSettings {
    /// On-screen diameter in pixels.
    pub diameter: f32,
    pub color: [f32; 4],
    pub longitude: u32,
    pub latitude: u32,
}

impl Default for DragHandleSettings {
    fn default() -> Self {
        Self {
            diameter: 7.0,
            color: [0.50, 0.53, 1.0, 1.0],
            longitude: 16,
            latitude: 8,
        }
    }
}

impl DragHandleSettings {
    fn validate(mut self) -> Self {
        let defaults = Self::default();
        if !(self.diameter.is_finite() && self.diameter > 0.0) {
            warn!("Drag handle diameter must be positive. Using default value.");
            self.diameter = defaults.diameter;
        }
        if self.longitude < 3 || self.latitude < 2 {
            warn!(
                "Drag handle sphere needs at least 3x2 segments, got {}x{}. Using default tessellation.",
                self.longitude, self.latitude
            );
            self.longitude = defaults.longitude;
            self.latitude = defaults.latitude;
        }
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InstancingSetting {
    #[default]
    Auto,
    Disabled,
}

impl InstancingSetting {
    pub fn allows_instancing(self) -> bool {
        matches!(self, InstancingSetting::Auto)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invalid_settings() -> RenderSettings {
        RenderSettings {
            stack_depths: StackDepths {
                color: 0,
                texture: 3,
                transform: 0,
                display_list: 0,
            },
            sample_count: 3,
            initial_instance_capacity: 0,
            initial_geometry_capacity: 0,
            drag_handle: DragHandleSettings {
                diameter: -1.0,
                longitude: 1,
                ..DragHandleSettings::default()
            },
            ..RenderSettings::default()
        }
    }

    #[test]
    fn validate_replaces_invalid_values_with_defaults() {
        let validated = invalid_settings().validate();
        let defaults = RenderSettings::default();

        assert_eq!(validated.stack_depths.color, defaults.stack_depths.color);
        assert_eq!(validated.stack_depths.texture, 3);
        assert_eq!(validated.sample_count, 1);
        assert_eq!(
            validated.initial_instance_capacity,
            defaults.initial_instance_capacity
        );
        assert_eq!(validated.drag_handle, DragHandleSettings::default());
    }

    #[test]
    fn validate_preserves_valid_values() {
        let valid = RenderSettings {
            sample_count: 8,
            stack_depths: StackDepths {
                transform: 16,
                ..StackDepths::default()
            },
            instancing: InstancingSetting::Disabled,
            ..RenderSettings::default()
        };

        let validated = valid.clone().validate();

        assert_eq!(validated.sample_count, 8);
        assert_eq!(validated.stack_depths.transform, 16);
        assert_eq!(validated.instancing, InstancingSetting::Disabled);
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let settings = RenderSettings::from_json_str(
            r#"{ "stack_depths": { "transform": 8 }, "instancing": "disabled" }"#,
        )
        .unwrap();

        assert_eq!(settings.stack_depths.transform, 8);
        assert_eq!(settings.stack_depths.texture, 128);
        assert!(!settings.instancing.allows_instancing());
        assert_eq!(settings.drag_handle.diameter, 7.0);
    }

    #[test]
    fn malformed_json_is_a_settings_error() {
        let err = RenderSettings::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, RenderError::Settings(_)));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let settings = RenderSettings::load_from_path("definitely/not/here.json");
        assert_eq!(settings.stack_depths, StackDepths::default());
    }

    #[test]
    fn lighting_settings_round_trip_default_lighting() {
        assert_eq!(LightingSettings::default().lighting(), Lighting::default());
    }
}
