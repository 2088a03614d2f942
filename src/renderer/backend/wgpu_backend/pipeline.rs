// renderer/backend/wgpu_backend/pipeline.rs
use std::collections::HashMap;

use super::targets::{COLOR_FORMAT, DEPTH_FORMAT};
use crate::renderer::backend::Topology;
use crate::renderer::batch::{PipelineState, RenderPass};
use crate::renderer::instance::InstanceRecord;
use crate::renderer::vertex::Vertex;

/// Builder for render pipelines with the defaults every brick pipeline
/// shares.
pub(crate) struct PipelineBuilder<'a> {
    device: &'a wgpu::Device,
    label: Option<&'a str>,
    layout: &'a wgpu::PipelineLayout,
    shader: &'a wgpu::ShaderModule,
    vertex_buffers: Vec<wgpu::VertexBufferLayout<'a>>,
    color_targets: Vec<Option<wgpu::ColorTargetState>>,
    depth_stencil: Option<wgpu::DepthStencilState>,
    primitive: wgpu::PrimitiveState,
    multisample: wgpu::MultisampleState,
}

impl<'a> PipelineBuilder<'a> {
    pub(crate) fn new(
        device: &'a wgpu::Device,
        layout: &'a wgpu::PipelineLayout,
        shader: &'a wgpu::ShaderModule,
    ) -> Self {
        Self {
            device,
            label: None,
            layout,
            shader,
            vertex_buffers: Vec::new(),
            color_targets: Vec::new(),
            depth_stencil: None,
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                front_face: wgpu::FrontFace::Ccw,
                polygon_mode: wgpu::PolygonMode::Fill,
                ..Default::default()
            },
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
        }
    }

    pub(crate) fn with_label(mut self, label: &'a str) -> Self {
        self.label = Some(label);
        self
    }

    pub(crate) fn with_vertex_buffer(mut self, layout: wgpu::VertexBufferLayout<'a>) -> Self {
        self.vertex_buffers.push(layout);
        self
    }

    pub(crate) fn with_color_target(mut self, format: wgpu::TextureFormat, blend: Option<wgpu::BlendState>) -> Self {
        self.color_targets.push(Some(wgpu::ColorTargetState {
            format,
            blend,
            write_mask: wgpu::ColorWrites::ALL,
        }));
        self
    }

    pub(crate) fn with_depth_stencil(
        mut self,
        format: wgpu::TextureFormat,
        depth_write: bool,
        depth_compare: wgpu::CompareFunction,
    ) -> Self {
        self.depth_stencil = Some(wgpu::DepthStencilState {
            format,
            depth_write_enabled: depth_write,
            depth_compare,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        });
        self
    }

    pub(crate) fn with_multisample(mut self, sample_count: u32) -> Self {
        self.multisample.count = sample_count;
        self
    }

    pub(crate) fn with_no_culling(mut self) -> Self {
        self.primitive.cull_mode = None;
        self
    }

    pub(crate) fn with_topology(mut self, topology: wgpu::PrimitiveTopology) -> Self {
        self.primitive.topology = topology;
        self
    }

    pub(crate) fn with_front_face(mut self, front_face: wgpu::FrontFace) -> Self {
        self.primitive.front_face = front_face;
        self
    }

    pub(crate) fn with_polygon_mode(mut self, mode: wgpu::PolygonMode) -> Self {
        self.primitive.polygon_mode = mode;
        self
    }

    pub(crate) fn build(self) -> wgpu::RenderPipeline {
        self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: self.label,
            layout: Some(self.layout),
            vertex: wgpu::VertexState {
                module: self.shader,
                entry_point: Some("vs_main"),
                buffers: &self.vertex_buffers,
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: self.shader,
                entry_point: Some("fs_main"),
                targets: &self.color_targets,
                compilation_options: Default::default(),
            }),
            primitive: self.primitive,
            depth_stencil: self.depth_stencil,
            multisample: self.multisample,
            multiview: None,
            cache: None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct PipelineKey {
    pub(crate) pass: RenderPass,
    pub(crate) state: PipelineState,
    pub(crate) topology: Topology,
}

/// Pipelines built on first use, one per pass, state and topology.
pub(crate) struct PipelineCache {
    shader: wgpu::ShaderModule,
    layout: wgpu::PipelineLayout,
    sample_count: u32,
    wireframe_supported: bool,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
}

impl PipelineCache {
    pub(crate) fn new(
        device: &wgpu::Device,
        bind_layouts: &[&wgpu::BindGroupLayout],
        sample_count: u32,
        wireframe_supported: bool,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::include_wgsl!("shader.wgsl"));
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("BrickPipelineLayout"),
            bind_group_layouts: bind_layouts,
            push_constant_ranges: &[],
        });
        Self {
            shader,
            layout,
            sample_count,
            wireframe_supported,
            pipelines: HashMap::new(),
        }
    }

    pub(crate) fn prepare(&mut self, device: &wgpu::Device, key: PipelineKey) {
        if self.pipelines.contains_key(&key) {
            return;
        }
        log::debug!("building pipeline {:?}", key);
        let pipeline = self.build(device, key);
        self.pipelines.insert(key, pipeline);
    }

    pub(crate) fn get(&self, key: &PipelineKey) -> Option<&wgpu::RenderPipeline> {
        self.pipelines.get(key)
    }

    fn build(&self, device: &wgpu::Device, key: PipelineKey) -> wgpu::RenderPipeline {
        let blend = key
            .pass
            .uses_alpha_blending()
            .then_some(wgpu::BlendState::ALPHA_BLENDING);
        let compare = if key.pass.depth_tested() {
            wgpu::CompareFunction::LessEqual
        } else {
            wgpu::CompareFunction::Always
        };
        let front_face = if key.state.contains(PipelineState::MIRRORED) {
            wgpu::FrontFace::Cw
        } else {
            wgpu::FrontFace::Ccw
        };

        let mut builder = PipelineBuilder::new(device, &self.layout, &self.shader)
            .with_label("BrickPipeline")
            .with_vertex_buffer(Vertex::layout())
            .with_vertex_buffer(InstanceRecord::layout())
            .with_color_target(COLOR_FORMAT, blend)
            .with_depth_stencil(DEPTH_FORMAT, key.pass.writes_depth(), compare)
            .with_multisample(self.sample_count)
            .with_front_face(front_face);

        builder = match key.topology {
            Topology::Triangles => builder,
            Topology::Lines => builder
                .with_topology(wgpu::PrimitiveTopology::LineList)
                .with_no_culling(),
        };
        if key.state.contains(PipelineState::WIREFRAME) && key.topology == Topology::Triangles {
            builder = if self.wireframe_supported {
                builder.with_polygon_mode(wgpu::PolygonMode::Line).with_no_culling()
            } else {
                builder
            };
        }
        builder.build()
    }
}
