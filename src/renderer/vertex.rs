use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};
use std::mem;

/// Floats per vertex: `X Y Z  NX NY NZ  R G B A`.
pub const VERTEX_FLOATS: usize = 10;
pub const VERTEX_STRIDE: usize = VERTEX_FLOATS * mem::size_of::<f32>();

/// Vertex colors with a negative alpha are placeholders resolved against the
/// drawing instance: `-1` takes its primary color, `-2` its complement.
pub const CURRENT_COLOR: [f32; 4] = [0.0, 0.0, 0.0, -1.0];
pub const COMPLEMENT_COLOR: [f32; 4] = [0.0, 0.0, 0.0, -2.0];

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
}

impl Vertex {
    pub const ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x4
    ];

    pub fn layout<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }

    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.pos)
    }
}

pub fn resolve_color(color: [f32; 4], current: Vec4, complement: Vec4) -> Vec4 {
    if color[3] == CURRENT_COLOR[3] {
        current
    } else if color[3] == COMPLEMENT_COLOR[3] {
        complement
    } else {
        Vec4::from_array(color)
    }
}

#[inline]
pub fn v(pos: Vec3, normal: Vec3, color: Vec4) -> Vertex {
    Vertex {
        pos: pos.to_array(),
        normal: normal.to_array(),
        color: color.to_array(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_is_ten_floats() {
        assert_eq!(mem::size_of::<Vertex>(), 40);
        assert_eq!(VERTEX_STRIDE, 40);
    }

    #[test]
    fn placeholder_colors_resolve_against_instance() {
        let current = Vec4::new(1.0, 0.0, 0.0, 1.0);
        let complement = Vec4::new(0.0, 0.0, 1.0, 1.0);
        assert_eq!(resolve_color(CURRENT_COLOR, current, complement), current);
        assert_eq!(resolve_color(COMPLEMENT_COLOR, current, complement), complement);
        assert_eq!(
            resolve_color([0.5, 0.5, 0.5, 0.25], current, complement),
            Vec4::new(0.5, 0.5, 0.5, 0.25)
        );
    }

    #[test]
    fn vertex_stride_matches_struct_size() {
        assert_eq!(
            Vertex::layout().array_stride,
            std::mem::size_of::<Vertex>() as wgpu::BufferAddress
        );
    }
}
