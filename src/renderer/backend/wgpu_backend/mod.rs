// renderer/backend/wgpu_backend/mod.rs
//! GPU submission through wgpu into double-buffered offscreen targets.

mod buffers;
mod context;
mod pipeline;
mod targets;
mod textures;

use std::collections::HashMap;
use std::sync::Arc;

use bytemuck::Zeroable;
use glam::UVec2;

pub use context::GpuContext;

use buffers::{DynamicBuffer, FrameUniformBuffers, GpuMesh, PlaneBuffer, TexturePlaneData};
use pipeline::{PipelineCache, PipelineKey};
use targets::FrameTargets;
use textures::TextureRegistry;

use super::{plan_draws, BackendCapabilities, DrawCall, FrameStats, RenderBackend, Topology};
use crate::asset::{MeshKey, TextureKey};
use crate::renderer::error::RenderError;
use crate::renderer::lights::FragmentUniform;
use crate::renderer::session::{CompiledSession, GeometrySource};
use crate::renderer::uniforms::VertexUniform;
use crate::settings::RenderSettings;

pub struct WgpuBackend {
    context: Arc<GpuContext>,
    instancing: bool,
    targets: FrameTargets,
    frame_uniforms: FrameUniformBuffers,
    textures: TextureRegistry,
    planes: PlaneBuffer,
    pipelines: PipelineCache,
    instances: DynamicBuffer,
    vertices: DynamicBuffer,
    indices: DynamicBuffer,
    meshes: HashMap<MeshKey, GpuMesh>,
}

impl WgpuBackend {
    pub fn new(context: Arc<GpuContext>, viewport: UVec2, settings: &RenderSettings) -> Self {
        let device = &context.device;
        let sample_count = settings.sample_count;

        let targets = FrameTargets::new(device, viewport, sample_count);
        let frame_uniforms = FrameUniformBuffers::new(device);
        let textures = TextureRegistry::new(device, &context.queue);
        let planes = PlaneBuffer::new(device);
        let pipelines = PipelineCache::new(
            device,
            &[
                &frame_uniforms.bind_layout,
                &textures.bind_layout,
                &planes.bind_layout,
            ],
            sample_count,
            context.supports_wireframe(),
        );

        let instance_bytes = u64::from(settings.initial_instance_capacity)
            * crate::renderer::instance::INSTANCE_STRIDE as u64;
        let vertex_bytes = u64::from(settings.initial_geometry_capacity)
            * crate::renderer::vertex::VERTEX_STRIDE as u64;
        let instances = DynamicBuffer::new(device, "Instances", wgpu::BufferUsages::VERTEX, instance_bytes);
        let vertices = DynamicBuffer::new(device, "InlineVertices", wgpu::BufferUsages::VERTEX, vertex_bytes);
        let indices = DynamicBuffer::new(
            device,
            "InlineIndices",
            wgpu::BufferUsages::INDEX,
            u64::from(settings.initial_geometry_capacity) * 4,
        );

        log::info!(
            "wgpu backend ready: {}x{}, {} samples",
            targets.size.x,
            targets.size.y,
            sample_count
        );

        Self {
            instancing: settings.instancing.allows_instancing(),
            context,
            targets,
            frame_uniforms,
            textures,
            planes,
            pipelines,
            instances,
            vertices,
            indices,
            meshes: HashMap::new(),
        }
    }

    pub fn context(&self) -> &Arc<GpuContext> {
        &self.context
    }

    /// Binds a prepared texture to `key` for planar-textured draws.
    pub fn register_texture(&mut self, key: TextureKey, view: &wgpu::TextureView) {
        self.textures.register(&self.context.device, key, view);
    }

    /// The most recent frame that submitted successfully.
    pub fn presented_texture(&self) -> &wgpu::Texture {
        self.targets.front_texture()
    }

    fn resize(&mut self, viewport: UVec2) {
        log::info!("resizing offscreen targets to {}x{}", viewport.x, viewport.y);
        self.targets = FrameTargets::new(&self.context.device, viewport, self.targets.sample_count());
    }

    fn upload_meshes(&mut self, session: &CompiledSession) {
        for draw in session.batches().iter().flat_map(|batch| batch.draws.iter()) {
            let GeometrySource::Library(mesh) = &draw.source else {
                continue;
            };
            let stale = self
                .meshes
                .get(&draw.mesh)
                .map_or(true, |gpu| !gpu.is_current(mesh));
            if stale {
                self.meshes
                    .insert(draw.mesh, GpuMesh::new(&self.context.device, mesh));
            }
        }
    }

    /// Writes one plane entry per textured draw; returns offsets indexed
    /// like `session.batches()[b].draws[d]`.
    fn upload_planes(&mut self, session: &CompiledSession) -> Vec<Vec<u32>> {
        self.planes.begin_frame();
        let mut offsets = Vec::with_capacity(session.batches().len());
        for batch in session.batches() {
            let mut batch_offsets = Vec::with_capacity(batch.draws.len());
            for draw in &batch.draws {
                let offset = match &draw.texture {
                    Some(binding) if self.textures.is_registered(binding.texture) => {
                        self.planes.push(TexturePlaneData {
                            plane_s: binding.plane_s.to_array(),
                            plane_t: binding.plane_t.to_array(),
                            enabled: [1.0, 0.0, 0.0, 0.0],
                            ..TexturePlaneData::zeroed()
                        })
                    }
                    Some(binding) => {
                        self.textures.note_missing(binding.texture);
                        0
                    }
                    None => 0,
                };
                batch_offsets.push(offset);
            }
            offsets.push(batch_offsets);
        }
        self.planes.flush(&self.context.device, &self.context.queue);
        offsets
    }

    fn record(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        session: &CompiledSession,
        calls: &[DrawCall],
        plane_offsets: &[Vec<u32>],
    ) {
        let background = session.uniforms().background;
        let (view, resolve_target) = self.targets.back_attachment();

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("BrickPass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                depth_slice: None,
                resolve_target,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: f64::from(background.x),
                        g: f64::from(background.y),
                        b: f64::from(background.z),
                        a: f64::from(background.w),
                    }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: self.targets.depth_view(),
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Discard,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        rpass.set_bind_group(0, &self.frame_uniforms.bind_group, &[]);
        rpass.set_vertex_buffer(1, self.instances.buffer.slice(..));

        for call in calls {
            let key = PipelineKey {
                pass: call.pass,
                state: call.state,
                topology: call.topology,
            };
            let Some(pipeline) = self.pipelines.get(&key) else {
                log::warn!("Skipping draw with no pipeline for {:?}", key);
                continue;
            };
            let batch = &session.batches()[call.batch];
            let draw = &batch.draws[call.draw];

            match &draw.source {
                GeometrySource::Library(_) => {
                    let Some(mesh) = self.meshes.get(&draw.mesh) else {
                        log::warn!("Skipping draw of unuploaded mesh {:?}", draw.mesh);
                        continue;
                    };
                    rpass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                    rpass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                }
                GeometrySource::Arena => {
                    rpass.set_vertex_buffer(0, self.vertices.buffer.slice(..));
                    rpass.set_index_buffer(self.indices.buffer.slice(..), wgpu::IndexFormat::Uint32);
                }
            }

            let plane_offset = plane_offsets
                .get(call.batch)
                .and_then(|batch| batch.get(call.draw))
                .copied()
                .unwrap_or(0);

            rpass.set_pipeline(pipeline);
            rpass.set_bind_group(1, self.textures.bind_group(batch.key.texture), &[]);
            rpass.set_bind_group(2, &self.planes.bind_group, &[plane_offset]);
            rpass.draw_indexed(call.indices.clone(), call.base_vertex, call.instances.clone());
        }
    }
}

impl RenderBackend for WgpuBackend {
    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities::standard("wgpu", self.instancing, self.context.supports_wireframe())
    }

    fn submit(&mut self, session: &CompiledSession) -> Result<FrameStats, RenderError> {
        let context = Arc::clone(&self.context);
        let _frame = context.lock_frame();
        let device = &context.device;
        let queue = &context.queue;

        if session.uniforms().viewport.max(UVec2::ONE) != self.targets.size {
            self.resize(session.uniforms().viewport);
        }

        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let uniforms = session.uniforms();
        self.frame_uniforms.write(
            queue,
            &VertexUniform::from_frame(uniforms),
            &FragmentUniform::from_lighting(&uniforms.lighting),
        );
        self.instances.write(device, queue, session.instance_bytes());
        self.vertices
            .write(device, queue, bytemuck::cast_slice(session.arena_vertices()));
        self.indices
            .write(device, queue, bytemuck::cast_slice(session.arena_indices()));
        self.upload_meshes(session);
        let plane_offsets = self.upload_planes(session);

        let calls = plan_draws(session, &self.capabilities());
        for call in &calls {
            self.pipelines.prepare(
                device,
                PipelineKey {
                    pass: call.pass,
                    state: call.state,
                    topology: call.topology,
                },
            );
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("BrickFrame"),
        });
        self.record(&mut encoder, session, &calls, &plane_offsets);
        queue.submit(Some(encoder.finish()));

        let validation = pollster::block_on(device.pop_error_scope());
        let out_of_memory = pollster::block_on(device.pop_error_scope());
        if let Some(err) = validation.or(out_of_memory) {
            log::warn!("frame rejected by the device: {err}");
            return Err(RenderError::BackendSubmissionFailure(err.to_string()));
        }

        self.targets.present();

        let triangles = calls
            .iter()
            .filter(|call| call.topology == Topology::Triangles)
            .map(|call| u64::from(call.indices.len() as u32 / 3) * call.instances.len() as u64)
            .sum();

        Ok(FrameStats {
            batches: session.batches().len() as u32,
            draw_calls: calls.len() as u32,
            instances: session.instances().len() as u32,
            triangles,
            ..FrameStats::default()
        })
    }
}
