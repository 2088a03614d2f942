// renderer/lights.rs
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};

use crate::math::normal_matrix;

pub const LIGHT_COUNT: usize = 2;

/// A fixed-function light. `position.w == 0` makes it directional, with
/// `position.xyz` pointing towards the light.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightSource {
    pub diffuse: Vec4,
    pub position: Vec4,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lighting {
    pub lights: [LightSource; LIGHT_COUNT],
    pub ambient: Vec4,
}

impl Lighting {
    /// Carries world-space lights into eye space through the camera.
    pub fn to_eye_space(&self, camera: &Mat4) -> Self {
        let normals = normal_matrix(camera);
        let mut lights = self.lights;
        for light in &mut lights {
            light.position = if light.position.w == 0.0 {
                (normals * light.position.truncate())
                    .normalize_or_zero()
                    .extend(0.0)
            } else {
                *camera * light.position
            };
        }
        Self {
            lights,
            ambient: self.ambient,
        }
    }
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            lights: [
                LightSource {
                    diffuse: Vec4::new(0.8, 0.8, 0.8, 1.0),
                    position: Vec3::new(0.0, -0.15, -1.0).normalize().extend(0.0),
                },
                LightSource {
                    diffuse: Vec4::new(0.6, 0.6, 0.6, 1.0),
                    position: Vec3::new(0.0, 1.0, 1.0).normalize().extend(0.0),
                },
            ],
            ambient: Vec4::new(0.2, 0.2, 0.2, 1.0),
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct LightSourceRaw {
    pub diffuse: [f32; 4],
    pub position: [f32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct FragmentUniform {
    pub light_source: [LightSourceRaw; LIGHT_COUNT],
    pub ambient: [f32; 4],
}

impl FragmentUniform {
    pub fn from_lighting(lighting: &Lighting) -> Self {
        let mut uniform = Self::zeroed();
        for (dst, src) in uniform.light_source.iter_mut().zip(lighting.lights.iter()) {
            *dst = LightSourceRaw {
                diffuse: src.diffuse.to_array(),
                position: src.position.to_array(),
            };
        }
        uniform.ambient = lighting.ambient.to_array();
        uniform
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragment_uniform_is_80_bytes() {
        // 2 * (2 * vec4) + vec4
        assert_eq!(std::mem::size_of::<FragmentUniform>(), 80);
    }

    #[test]
    fn directional_lights_rotate_with_camera_and_points_translate() {
        let mut lighting = Lighting::default();
        lighting.lights[0].position = Vec4::new(1.0, 0.0, 0.0, 0.0);
        lighting.lights[1].position = Vec4::new(0.0, 0.0, 0.0, 1.0);

        let camera = Mat4::from_translation(Vec3::new(0.0, 0.0, -10.0))
            * Mat4::from_rotation_y(std::f32::consts::FRAC_PI_2);
        let eye = lighting.to_eye_space(&camera);

        assert!(eye.lights[0]
            .position
            .abs_diff_eq(Vec4::new(0.0, 0.0, -1.0, 0.0), 1e-5));
        assert!(eye.lights[1]
            .position
            .abs_diff_eq(Vec4::new(0.0, 0.0, -10.0, 1.0), 1e-5));
    }
}
