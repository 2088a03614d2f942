// renderer/session.rs
use std::ops::Range;
use std::sync::Arc;

use crate::asset::{MeshData, MeshKey, MeshRef};
use crate::renderer::batch::{BatchKey, PipelineState, RenderPass};
use crate::renderer::display_list::{DisplayGeometry, DisplayList, TextureBinding};
use crate::renderer::instance::InstanceRecord;
use crate::renderer::uniforms::FrameUniforms;
use crate::renderer::vertex::Vertex;

/// Where a draw's vertices and indices live.
#[derive(Debug, Clone)]
pub enum GeometrySource {
    /// Prepared part geometry; indices are its triangle list followed by its
    /// line list.
    Library(Arc<MeshData>),
    /// The session's inline geometry arena.
    Arena,
}

impl GeometrySource {
    fn same_as(&self, other: &GeometrySource) -> bool {
        match (self, other) {
            (GeometrySource::Library(a), GeometrySource::Library(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// One mesh drawn over a contiguous run of the packed instance buffer.
#[derive(Debug, Clone)]
pub struct BatchDraw {
    pub mesh: MeshKey,
    pub source: GeometrySource,
    pub base_vertex: i32,
    pub triangles: Range<u32>,
    pub lines: Range<u32>,
    pub texture: Option<TextureBinding>,
    pub first_instance: u32,
    pub instance_count: u32,
}

impl BatchDraw {
    pub fn instances(&self) -> Range<u32> {
        self.first_instance..self.first_instance + self.instance_count
    }
}

#[derive(Debug, Clone)]
pub struct Batch {
    pub key: BatchKey,
    pub draws: Vec<BatchDraw>,
}

/// Per-frame collection of compiled display lists.
pub struct Session {
    uniforms: FrameUniforms,
    lists: Vec<DisplayList>,
    overlay: Option<(MeshRef, Vec<InstanceRecord>)>,
}

impl Session {
    pub fn new(uniforms: FrameUniforms) -> Self {
        Self {
            uniforms,
            lists: Vec::new(),
            overlay: None,
        }
    }

    pub fn uniforms(&self) -> &FrameUniforms {
        &self.uniforms
    }

    pub fn add(&mut self, list: DisplayList) {
        self.lists.push(list);
    }

    pub fn display_list_count(&self) -> usize {
        self.lists.len()
    }

    /// Instances of `mesh` drawn in the overlay pass after everything else.
    pub fn set_overlay(&mut self, mesh: MeshRef, instances: Vec<InstanceRecord>) {
        self.overlay = Some((mesh, instances));
    }

    /// Partitions instances by pipeline state and texture, orders the result
    /// deterministically and packs all instances into one buffer.
    pub fn finish(self) -> CompiledSession {
        let mut vertices: Vec<Vertex> = Vec::new();
        let mut indices: Vec<u32> = Vec::new();
        let mut pending: Vec<PendingDraw> = Vec::new();

        for list in &self.lists {
            if list.is_empty() {
                continue;
            }
            let (mesh, source) = match list.geometry() {
                DisplayGeometry::Library(mesh) => (mesh, GeometrySource::Library(mesh.clone())),
                DisplayGeometry::Inline(mesh) => (mesh, GeometrySource::Arena),
                DisplayGeometry::Empty => continue,
            };
            let geometry = match &source {
                GeometrySource::Library(_) => GeometryRanges::library(mesh),
                GeometrySource::Arena => GeometryRanges::arena(mesh, &mut vertices, &mut indices),
            };

            let mut list_state = PipelineState::empty();
            list_state.set(PipelineState::WIREFRAME, list.wireframe());
            list_state.set(PipelineState::TEXTURED, list.texture().is_some());

            for (state, instances) in partition_by_state(list.instances(), list_state) {
                pending.push(PendingDraw {
                    key: BatchKey::new(state, list.texture().map(|binding| binding.texture)),
                    mesh: list.mesh(),
                    source: source.clone(),
                    geometry: geometry.clone(),
                    texture: list.texture().copied(),
                    instances,
                });
            }
        }

        if let Some((mesh, instances)) = self.overlay {
            if let (Some(geometry), false) = (mesh.geometry, instances.is_empty()) {
                pending.push(PendingDraw {
                    key: BatchKey::overlay(),
                    mesh: mesh.key,
                    geometry: GeometryRanges::library(&geometry),
                    source: GeometrySource::Library(geometry),
                    texture: None,
                    instances,
                });
            }
        }

        // Stable: equal keys keep insertion order.
        pending.sort_by_key(|draw| draw.key);

        let mut packed: Vec<InstanceRecord> =
            Vec::with_capacity(pending.iter().map(|draw| draw.instances.len()).sum());
        let mut batches: Vec<Batch> = Vec::new();

        for draw in pending {
            let first_instance = packed.len() as u32;
            let count = draw.instances.len() as u32;
            packed.extend_from_slice(&draw.instances);

            if batches.last().map(|batch| batch.key) != Some(draw.key) {
                batches.push(Batch {
                    key: draw.key,
                    draws: Vec::new(),
                });
            }
            let Some(batch) = batches.last_mut() else {
                continue;
            };

            if let Some(last) = batch.draws.last_mut() {
                if last.mesh == draw.mesh
                    && last.source.same_as(&draw.source)
                    && last.texture == draw.texture
                {
                    last.instance_count += count;
                    continue;
                }
            }

            batch.draws.push(BatchDraw {
                mesh: draw.mesh,
                source: draw.source,
                base_vertex: draw.geometry.base_vertex,
                triangles: draw.geometry.triangles,
                lines: draw.geometry.lines,
                texture: draw.texture,
                first_instance,
                instance_count: count,
            });
        }

        let pass_ranges = RenderPass::ALL.map(|pass| pass_range(&batches, pass));

        CompiledSession {
            uniforms: self.uniforms,
            instances: packed,
            vertices,
            indices,
            batches,
            pass_ranges,
        }
    }
}

struct PendingDraw {
    key: BatchKey,
    mesh: MeshKey,
    source: GeometrySource,
    geometry: GeometryRanges,
    texture: Option<TextureBinding>,
    instances: Vec<InstanceRecord>,
}

#[derive(Debug, Clone)]
struct GeometryRanges {
    base_vertex: i32,
    triangles: Range<u32>,
    lines: Range<u32>,
}

impl GeometryRanges {
    fn library(mesh: &MeshData) -> Self {
        let tri_end = mesh.triangle_indices.len() as u32;
        let line_end = tri_end + mesh.line_indices.len() as u32;
        Self {
            base_vertex: 0,
            triangles: 0..tri_end,
            lines: tri_end..line_end,
        }
    }

    fn arena(mesh: &MeshData, vertices: &mut Vec<Vertex>, indices: &mut Vec<u32>) -> Self {
        let base_vertex = vertices.len() as i32;
        vertices.extend_from_slice(&mesh.vertices);

        let start = indices.len() as u32;
        indices.extend_from_slice(&mesh.triangle_indices);
        let tri_end = indices.len() as u32;
        indices.extend_from_slice(&mesh.line_indices);
        let line_end = indices.len() as u32;

        Self {
            base_vertex,
            triangles: start..tri_end,
            lines: tri_end..line_end,
        }
    }
}

/// Splits instances by their full pipeline state, keeping first-seen order
/// between groups and submission order within each.
fn partition_by_state(
    instances: &[InstanceRecord],
    list_state: PipelineState,
) -> Vec<(PipelineState, Vec<InstanceRecord>)> {
    let mut groups: Vec<(PipelineState, Vec<InstanceRecord>)> = Vec::new();
    for record in instances {
        let state = list_state | PipelineState::for_instance(record);
        match groups.iter_mut().find(|(s, _)| *s == state) {
            Some((_, group)) => group.push(*record),
            None => groups.push((state, vec![*record])),
        }
    }
    groups
}

fn pass_range(batches: &[Batch], pass: RenderPass) -> Range<usize> {
    let start = batches
        .iter()
        .position(|batch| batch.key.pass == pass)
        .unwrap_or(batches.len());
    let end = batches[start..]
        .iter()
        .position(|batch| batch.key.pass != pass)
        .map_or(batches.len(), |offset| start + offset);
    start..end
}

/// A finished frame: ordered batches over one packed instance buffer and
/// the inline geometry arena.
#[derive(Debug, Clone)]
pub struct CompiledSession {
    uniforms: FrameUniforms,
    instances: Vec<InstanceRecord>,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    batches: Vec<Batch>,
    pass_ranges: [Range<usize>; 3],
}

impl CompiledSession {
    pub fn uniforms(&self) -> &FrameUniforms {
        &self.uniforms
    }

    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    pub fn pass(&self, pass: RenderPass) -> &[Batch] {
        let index = RenderPass::ALL
            .iter()
            .position(|p| *p == pass)
            .unwrap_or_default();
        &self.batches[self.pass_ranges[index].clone()]
    }

    pub fn instances(&self) -> &[InstanceRecord] {
        &self.instances
    }

    pub fn instance_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.instances)
    }

    pub fn arena_vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn arena_indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn draw_count(&self) -> usize {
        self.batches.iter().map(|batch| batch.draws.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{Handle, INLINE_MESH};
    use crate::renderer::display_list::DisplayListBuilder;
    use crate::renderer::lights::Lighting;
    use crate::renderer::vertex::{v, CURRENT_COLOR};
    use crate::scene::ColorPair;
    use glam::{Mat4, UVec2, Vec3, Vec4};

    fn uniforms() -> FrameUniforms {
        FrameUniforms {
            projection: Mat4::IDENTITY,
            model_view: Mat4::IDENTITY,
            viewport: UVec2::new(640, 480),
            lighting: Lighting::default(),
            background: Vec4::ONE,
        }
    }

    fn triangle_mesh() -> Arc<MeshData> {
        let c = Vec4::from_array(CURRENT_COLOR);
        Arc::new(MeshData::new(
            vec![v(Vec3::ZERO, Vec3::Z, c), v(Vec3::X, Vec3::Z, c), v(Vec3::Y, Vec3::Z, c)],
            vec![0, 1, 2],
            vec![0, 1],
        ))
    }

    fn part_list(mesh: &Arc<MeshData>, key: usize, records: &[InstanceRecord]) -> DisplayList {
        let mut builder = DisplayListBuilder::new(
            MeshRef::library(Handle::new(key), mesh.clone()),
            Mat4::IDENTITY,
            None,
            false,
        );
        for record in records {
            builder.append(*record);
        }
        builder.finish()
    }

    fn record(x: f32, colors: ColorPair) -> InstanceRecord {
        InstanceRecord::new(&Mat4::from_translation(Vec3::new(x, 0.0, 0.0)), &colors)
    }

    #[test]
    fn adjacent_lists_of_same_mesh_coalesce() {
        let mesh = triangle_mesh();
        let red = ColorPair::rgb(1.0, 0.0, 0.0);
        let mut session = Session::new(uniforms());
        session.add(part_list(&mesh, 0, &[record(0.0, red)]));
        session.add(part_list(&mesh, 0, &[record(1.0, red), record(2.0, red)]));

        let compiled = session.finish();
        assert_eq!(compiled.batches().len(), 1);
        assert_eq!(compiled.draw_count(), 1);
        let draw = &compiled.batches()[0].draws[0];
        assert_eq!(draw.instances(), 0..3);
        assert_eq!(draw.triangles, 0..3);
        assert_eq!(draw.lines, 3..5);
    }

    #[test]
    fn translucent_instances_move_to_their_own_pass() {
        let mesh = triangle_mesh();
        let glass = ColorPair::rgb(0.0, 0.0, 1.0).with_alpha(0.5);
        let solid = ColorPair::rgb(1.0, 1.0, 1.0);
        let mut session = Session::new(uniforms());
        session.add(part_list(&mesh, 0, &[record(0.0, glass), record(1.0, solid)]));

        let compiled = session.finish();
        assert_eq!(compiled.pass(RenderPass::Opaque).len(), 1);
        assert_eq!(compiled.pass(RenderPass::Transparent).len(), 1);
        assert!(compiled.pass(RenderPass::Overlay).is_empty());
        // opaque instances are packed first
        assert_eq!(compiled.instances()[0].color_current[3], 1.0);
        assert_eq!(compiled.instances()[1].color_current[3], 0.5);
    }

    #[test]
    fn mirrored_instances_get_mirrored_state() {
        let mesh = triangle_mesh();
        let red = ColorPair::rgb(1.0, 0.0, 0.0);
        let mirrored = InstanceRecord::new(&Mat4::from_scale(Vec3::new(-1.0, 1.0, 1.0)), &red);
        let mut session = Session::new(uniforms());
        session.add(part_list(&mesh, 0, &[record(0.0, red), mirrored]));

        let compiled = session.finish();
        let states: Vec<_> = compiled.batches().iter().map(|b| b.key.state).collect();
        assert_eq!(states, vec![PipelineState::empty(), PipelineState::MIRRORED]);
    }

    #[test]
    fn empty_lists_produce_no_batches() {
        let mesh = triangle_mesh();
        let mut session = Session::new(uniforms());
        session.add(part_list(&mesh, 0, &[]));
        session.add(
            DisplayListBuilder::new(MeshRef::inline(INLINE_MESH), Mat4::IDENTITY, None, false)
                .finish(),
        );
        assert_eq!(session.display_list_count(), 2);
        let compiled = session.finish();
        assert!(compiled.is_empty());
        assert!(compiled.instances().is_empty());
    }

    #[test]
    fn overlay_is_drawn_last() {
        let mesh = triangle_mesh();
        let red = ColorPair::rgb(1.0, 0.0, 0.0);
        let mut session = Session::new(uniforms());
        session.set_overlay(
            MeshRef::library(Handle::new(9), mesh.clone()),
            vec![record(5.0, red)],
        );
        session.add(part_list(&mesh, 0, &[record(0.0, red)]));

        let compiled = session.finish();
        assert_eq!(compiled.batches().len(), 2);
        assert_eq!(compiled.batches()[1].key, BatchKey::overlay());
        assert_eq!(compiled.pass(RenderPass::Overlay)[0].draws[0].first_instance, 1);
    }

    #[test]
    fn compiling_twice_gives_identical_bytes() {
        let build = || {
            let mesh_a = triangle_mesh();
            let mut session = Session::new(uniforms());
            let colors = [
                ColorPair::rgb(1.0, 0.0, 0.0),
                ColorPair::rgb(0.0, 1.0, 0.0).with_alpha(0.3),
                ColorPair::rgb(0.0, 0.0, 1.0),
            ];
            for i in 0..12 {
                let colors = colors[i % 3];
                session.add(part_list(&mesh_a, i % 2, &[record(i as f32, colors)]));
            }
            session.finish()
        };

        let a = build();
        let b = build();
        assert_eq!(a.instance_bytes(), b.instance_bytes());
        let layout = |s: &CompiledSession| -> Vec<(BatchKey, MeshKey, u32, u32)> {
            s.batches()
                .iter()
                .flat_map(|batch| {
                    batch
                        .draws
                        .iter()
                        .map(move |d| (batch.key, d.mesh, d.first_instance, d.instance_count))
                })
                .collect()
        };
        assert_eq!(layout(&a), layout(&b));
    }
}
