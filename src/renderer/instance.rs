// renderer/instance.rs
use std::mem;

use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Vec4};

use crate::math::is_mirroring;
use crate::scene::ColorPair;

pub const INSTANCE_FLOATS: usize = 24;
pub const INSTANCE_STRIDE: usize = INSTANCE_FLOATS * mem::size_of::<f32>();

/// Per-instance payload: the eye-space transform as four rows, then the
/// primary and complement colors.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct InstanceRecord {
    pub transform_x: [f32; 4], // 16 bytes
    pub transform_y: [f32; 4], // 16 bytes
    pub transform_z: [f32; 4], // 16 bytes
    pub transform_w: [f32; 4], // 16 bytes
    pub color_current: [f32; 4],
    pub color_complement: [f32; 4],
}

impl InstanceRecord {
    pub const ATTRS: [wgpu::VertexAttribute; 6] = wgpu::vertex_attr_array![
        3 => Float32x4,
        4 => Float32x4,
        5 => Float32x4,
        6 => Float32x4,
        7 => Float32x4,
        8 => Float32x4
    ];

    pub fn new(transform: &Mat4, colors: &ColorPair) -> Self {
        Self {
            transform_x: transform.row(0).to_array(),
            transform_y: transform.row(1).to_array(),
            transform_z: transform.row(2).to_array(),
            transform_w: transform.row(3).to_array(),
            color_current: colors.primary.to_array(),
            color_complement: colors.complement.to_array(),
        }
    }

    pub fn layout<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<InstanceRecord>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRS,
        }
    }

    pub fn transform(&self) -> Mat4 {
        Mat4::from_cols(
            Vec4::from_array(self.transform_x),
            Vec4::from_array(self.transform_y),
            Vec4::from_array(self.transform_z),
            Vec4::from_array(self.transform_w),
        )
        .transpose()
    }

    pub fn colors(&self) -> ColorPair {
        ColorPair::from_arrays(self.color_current, self.color_complement)
    }

    pub fn is_mirrored(&self) -> bool {
        is_mirroring(&Mat3::from_mat4(self.transform()))
    }

    pub fn is_translucent(&self) -> bool {
        self.color_current[3] < 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn instance_record_is_96_bytes() {
        assert_eq!(mem::size_of::<InstanceRecord>(), 96);
        assert_eq!(INSTANCE_STRIDE, 96);
        assert_eq!(
            InstanceRecord::layout().array_stride,
            INSTANCE_STRIDE as wgpu::BufferAddress
        );
    }

    #[test]
    fn rows_hold_translation_in_last_column() {
        let m = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let record = InstanceRecord::new(&m, &ColorPair::rgb(1.0, 0.0, 0.0));
        assert_eq!(record.transform_x, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(record.transform_z, [0.0, 0.0, 1.0, 3.0]);
        assert_eq!(record.transform(), m);
    }

    #[test]
    fn mirrored_and_translucent_flags() {
        let mirror = Mat4::from_scale(Vec3::new(-1.0, 1.0, 1.0));
        let record = InstanceRecord::new(&mirror, &ColorPair::rgb(0.5, 0.5, 0.5).with_alpha(0.5));
        assert!(record.is_mirrored());
        assert!(record.is_translucent());

        let plain = InstanceRecord::new(&Mat4::IDENTITY, &ColorPair::rgb(0.5, 0.5, 0.5));
        assert!(!plain.is_mirrored());
        assert!(!plain.is_translucent());
    }
}
