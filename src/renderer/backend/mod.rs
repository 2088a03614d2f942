// renderer/backend/mod.rs
//! The seam between compiled sessions and whatever draws them.

pub mod null;
pub mod wgpu_backend;

use std::ops::Range;

use crate::renderer::batch::{PipelineState, RenderPass};
use crate::renderer::error::RenderError;
use crate::renderer::instance::INSTANCE_STRIDE;
use crate::renderer::session::{CompiledSession, GeometrySource};
use crate::renderer::vertex::{Vertex, VERTEX_STRIDE};

pub use null::{NullBackend, NullProbe, RecordedFrame};
pub use wgpu_backend::{GpuContext, WgpuBackend};

/// Byte layout of one per-instance attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceAttribute {
    pub location: u32,
    pub offset: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceLayout {
    pub stride: usize,
    pub attributes: [InstanceAttribute; 6],
}

impl InstanceLayout {
    /// Four transform rows followed by the two colors, one vec4 each.
    pub const STANDARD: Self = Self {
        stride: INSTANCE_STRIDE,
        attributes: [
            InstanceAttribute { location: 3, offset: 0 },
            InstanceAttribute { location: 4, offset: 16 },
            InstanceAttribute { location: 5, offset: 32 },
            InstanceAttribute { location: 6, offset: 48 },
            InstanceAttribute { location: 7, offset: 64 },
            InstanceAttribute { location: 8, offset: 80 },
        ],
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendCapabilities {
    pub name: &'static str,
    pub instancing: bool,
    pub wireframe: bool,
    pub instance_layout: InstanceLayout,
    pub vertex_stride: usize,
}

impl BackendCapabilities {
    pub fn standard(name: &'static str, instancing: bool, wireframe: bool) -> Self {
        Self {
            name,
            instancing,
            wireframe,
            instance_layout: InstanceLayout::STANDARD,
            vertex_stride: VERTEX_STRIDE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    pub batches: u32,
    pub draw_calls: u32,
    pub instances: u32,
    pub triangles: u64,
    pub drag_handles: u32,
    pub culled_nodes: u32,
    pub abandoned_branches: u32,
}

/// The two operations the rest of the renderer relies on.
pub trait RenderBackend {
    fn capabilities(&self) -> BackendCapabilities;

    /// Draws and presents `session`. On error the previously presented
    /// frame stays in place.
    fn submit(&mut self, session: &CompiledSession) -> Result<FrameStats, RenderError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topology {
    Triangles,
    Lines,
}

/// One backend draw: an index range of one batch draw over a range of the
/// packed instance buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub batch: usize,
    pub draw: usize,
    pub pass: RenderPass,
    pub state: PipelineState,
    pub topology: Topology,
    pub indices: Range<u32>,
    pub base_vertex: i32,
    pub instances: Range<u32>,
}

/// Draw calls in submission order.
pub type DrawPlan = Vec<DrawCall>;

/// Expands a compiled session into draw calls: one per batch draw and
/// topology with instancing, one per instance without.
pub fn plan_draws(session: &CompiledSession, caps: &BackendCapabilities) -> DrawPlan {
    let mut calls = Vec::new();
    for (batch_index, batch) in session.batches().iter().enumerate() {
        for (draw_index, draw) in batch.draws.iter().enumerate() {
            for (topology, indices) in [
                (Topology::Triangles, &draw.triangles),
                (Topology::Lines, &draw.lines),
            ] {
                if indices.is_empty() {
                    continue;
                }
                let call = |instances: Range<u32>| DrawCall {
                    batch: batch_index,
                    draw: draw_index,
                    pass: batch.key.pass,
                    state: batch.key.state,
                    topology,
                    indices: indices.clone(),
                    base_vertex: draw.base_vertex,
                    instances,
                };
                if caps.instancing {
                    calls.push(call(draw.instances()));
                } else {
                    calls.extend(draw.instances().map(|i| call(i..i + 1)));
                }
            }
        }
    }
    calls
}

/// Vertices and indices a draw call reads, with `base_vertex` already
/// applied by the caller.
pub fn call_geometry<'s>(session: &'s CompiledSession, call: &DrawCall) -> (&'s [Vertex], Vec<u32>) {
    let draw = &session.batches()[call.batch].draws[call.draw];
    let range = call.indices.start as usize..call.indices.end as usize;
    match &draw.source {
        GeometrySource::Library(mesh) => {
            let tri_len = mesh.triangle_indices.len();
            let indices = range
                .filter_map(|i| {
                    if i < tri_len {
                        mesh.triangle_indices.get(i).copied()
                    } else {
                        mesh.line_indices.get(i - tri_len).copied()
                    }
                })
                .collect();
            (mesh.vertices.as_slice(), indices)
        }
        GeometrySource::Arena => (
            session.arena_vertices(),
            session
                .arena_indices()
                .get(range)
                .unwrap_or_default()
                .to_vec(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::instance::InstanceRecord;

    #[test]
    fn standard_layout_matches_instance_attributes() {
        for (ours, attr) in InstanceLayout::STANDARD
            .attributes
            .iter()
            .zip(InstanceRecord::ATTRS.iter())
        {
            assert_eq!(ours.location, attr.shader_location);
            assert_eq!(ours.offset, attr.offset);
        }
        assert_eq!(InstanceLayout::STANDARD.stride, 96);
    }
}
