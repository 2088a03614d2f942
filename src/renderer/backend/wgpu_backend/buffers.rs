// renderer/backend/wgpu_backend/buffers.rs
use std::mem;
use std::num::NonZeroU64;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::asset::MeshData;
use crate::renderer::lights::FragmentUniform;
use crate::renderer::uniforms::VertexUniform;

/// GPU buffer rewritten every frame that doubles its capacity whenever a
/// frame needs more room.
pub(crate) struct DynamicBuffer {
    label: &'static str,
    usage: wgpu::BufferUsages,
    pub(crate) buffer: wgpu::Buffer,
    capacity: u64,
}

impl DynamicBuffer {
    pub(crate) fn new(
        device: &wgpu::Device,
        label: &'static str,
        usage: wgpu::BufferUsages,
        capacity: u64,
    ) -> Self {
        let capacity = align_copy(capacity.max(wgpu::COPY_BUFFER_ALIGNMENT));
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: capacity,
            usage: usage | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self {
            label,
            usage,
            buffer,
            capacity,
        }
    }

    pub(crate) fn write(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        let required = align_copy(bytes.len() as u64);
        if required > self.capacity {
            self.grow(device, required);
        }
        queue.write_buffer(&self.buffer, 0, bytes);
    }

    fn grow(&mut self, device: &wgpu::Device, required: u64) {
        let new_capacity = required.max(self.capacity * 2);
        log::info!(
            "Growing {} buffer: {} -> {} bytes",
            self.label,
            self.capacity,
            new_capacity
        );
        self.buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(self.label),
            size: new_capacity,
            usage: self.usage | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        self.capacity = new_capacity;
    }
}

fn align_copy(size: u64) -> u64 {
    let align = wgpu::COPY_BUFFER_ALIGNMENT;
    size.div_ceil(align) * align
}

/// Library geometry uploaded once and reused while the part library keeps
/// handing out the same mesh.
pub(crate) struct GpuMesh {
    pub(crate) source: Arc<MeshData>,
    pub(crate) vertex_buffer: wgpu::Buffer,
    pub(crate) index_buffer: wgpu::Buffer,
}

impl GpuMesh {
    pub(crate) fn new(device: &wgpu::Device, mesh: &Arc<MeshData>) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("PartVertices"),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let mut indices = Vec::with_capacity(mesh.triangle_indices.len() + mesh.line_indices.len());
        indices.extend_from_slice(&mesh.triangle_indices);
        indices.extend_from_slice(&mesh.line_indices);
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("PartIndices"),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            source: mesh.clone(),
            vertex_buffer,
            index_buffer,
        }
    }

    pub(crate) fn is_current(&self, mesh: &Arc<MeshData>) -> bool {
        Arc::ptr_eq(&self.source, mesh)
    }
}

/// Group 0: projection for the vertex stage, lights for the fragment stage.
pub(crate) struct FrameUniformBuffers {
    vertex: wgpu::Buffer,
    fragment: wgpu::Buffer,
    pub(crate) bind_layout: wgpu::BindGroupLayout,
    pub(crate) bind_group: wgpu::BindGroup,
}

impl FrameUniformBuffers {
    pub(crate) fn new(device: &wgpu::Device) -> Self {
        let uniform_entry = |binding, visibility| wgpu::BindGroupLayoutEntry {
            binding,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };
        let bind_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("FrameBindLayout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::VERTEX),
                uniform_entry(1, wgpu::ShaderStages::FRAGMENT),
            ],
        });

        let vertex = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("VertexUniform"),
            size: mem::size_of::<VertexUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let fragment = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("FragmentUniform"),
            size: mem::size_of::<FragmentUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("FrameBindGroup"),
            layout: &bind_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: vertex.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: fragment.as_entire_binding(),
                },
            ],
        });

        Self {
            vertex,
            fragment,
            bind_layout,
            bind_group,
        }
    }

    pub(crate) fn write(&self, queue: &wgpu::Queue, vertex: &VertexUniform, fragment: &FragmentUniform) {
        queue.write_buffer(&self.vertex, 0, bytemuck::bytes_of(vertex));
        queue.write_buffer(&self.fragment, 0, bytemuck::bytes_of(fragment));
    }
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub(crate) struct TexturePlaneData {
    pub(crate) plane_s: [f32; 4],
    pub(crate) plane_t: [f32; 4],
    /// `x > 0.5` turns texturing on.
    pub(crate) enabled: [f32; 4],
    pub(crate) _padding: [f32; 4],
}

/// Group 2: one `TexturePlaneData` per textured draw, selected with a
/// dynamic offset. Slot 0 is always the disabled entry.
pub(crate) struct PlaneBuffer {
    buffer: DynamicBuffer,
    stride: u64,
    scratch: Vec<u8>,
    pub(crate) bind_layout: wgpu::BindGroupLayout,
    pub(crate) bind_group: wgpu::BindGroup,
}

impl PlaneBuffer {
    pub(crate) fn new(device: &wgpu::Device) -> Self {
        let alignment = u64::from(device.limits().min_uniform_buffer_offset_alignment);
        let stride = (mem::size_of::<TexturePlaneData>() as u64).div_ceil(alignment) * alignment;

        let bind_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("PlanesBindLayout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(mem::size_of::<TexturePlaneData>() as u64),
                },
                count: None,
            }],
        });
        let buffer = DynamicBuffer::new(device, "TexturePlanes", wgpu::BufferUsages::UNIFORM, stride * 16);
        let bind_group = Self::create_bind_group(device, &bind_layout, &buffer.buffer);

        Self {
            buffer,
            stride,
            scratch: Vec::new(),
            bind_layout,
            bind_group,
        }
    }

    fn create_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        buffer: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("PlanesBindGroup"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer,
                    offset: 0,
                    size: NonZeroU64::new(mem::size_of::<TexturePlaneData>() as u64),
                }),
            }],
        })
    }

    pub(crate) fn begin_frame(&mut self) {
        self.scratch.clear();
        self.push(TexturePlaneData::zeroed());
    }

    /// Returns the dynamic offset of the new entry.
    pub(crate) fn push(&mut self, data: TexturePlaneData) -> u32 {
        let offset = self.scratch.len() as u64;
        self.scratch.extend_from_slice(bytemuck::bytes_of(&data));
        self.scratch.resize((offset + self.stride) as usize, 0);
        offset as u32
    }

    pub(crate) fn flush(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        let before = self.buffer.buffer.size();
        self.buffer.write(device, queue, &self.scratch);
        if self.buffer.buffer.size() != before {
            self.bind_group = Self::create_bind_group(device, &self.bind_layout, &self.buffer.buffer);
        }
    }
}
