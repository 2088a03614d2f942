// renderer/uniforms.rs
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, UVec2, Vec4};

use super::lights::Lighting;

/// Maps OpenGL clip-space depth (`-w..w`) to the `0..w` range wgpu expects.
pub const GL_TO_WGPU_DEPTH: Mat4 = Mat4::from_cols_array(&[
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 0.5, 0.0, //
    0.0, 0.0, 0.5, 1.0,
]);

/// Per-frame values shared by every draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameUniforms {
    /// OpenGL-convention projection.
    pub projection: Mat4,
    /// Camera model-view installed as the root transform.
    pub model_view: Mat4,
    pub viewport: UVec2,
    /// Lights in eye space.
    pub lighting: Lighting,
    pub background: Vec4,
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct VertexUniform {
    pub projection: [[f32; 4]; 4],
    pub model_view: [[f32; 4]; 4],
}

impl VertexUniform {
    pub fn from_frame(frame: &FrameUniforms) -> Self {
        Self {
            projection: (GL_TO_WGPU_DEPTH * frame.projection).to_cols_array_2d(),
            model_view: frame.model_view.to_cols_array_2d(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::build_frustum_matrix;
    use glam::Vec3;

    #[test]
    fn vertex_uniform_is_128_bytes() {
        assert_eq!(std::mem::size_of::<VertexUniform>(), 128);
    }

    #[test]
    fn depth_correction_maps_near_and_far_to_zero_and_one() {
        let gl = build_frustum_matrix(-1.0, 1.0, -1.0, 1.0, 1.0, 10.0);
        let wgpu = GL_TO_WGPU_DEPTH * gl;

        let near = wgpu * Vec3::new(0.0, 0.0, -1.0).extend(1.0);
        let far = wgpu * Vec3::new(0.0, 0.0, -10.0).extend(1.0);
        assert!((near.z / near.w).abs() < 1e-6);
        assert!((far.z / far.w - 1.0).abs() < 1e-5);
    }
}
