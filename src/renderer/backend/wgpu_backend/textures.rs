// renderer/backend/wgpu_backend/textures.rs
use std::collections::{HashMap, HashSet};

use crate::asset::TextureKey;

/// Group 1 bind groups for registered textures, plus a white fallback for
/// untextured draws and keys that were never registered.
pub(crate) struct TextureRegistry {
    pub(crate) bind_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    fallback: wgpu::BindGroup,
    bind_groups: HashMap<TextureKey, wgpu::BindGroup>,
    reported_missing: HashSet<TextureKey>,
}

impl TextureRegistry {
    pub(crate) fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let bind_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("TextureBindLayout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("PlanarSampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let white = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("WhiteTexture"),
            size: wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &white,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &[255, 255, 255, 255],
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4),
                rows_per_image: Some(1),
            },
            wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
        );
        let white_view = white.create_view(&wgpu::TextureViewDescriptor::default());
        let fallback = create_bind_group(device, &bind_layout, &white_view, &sampler);

        Self {
            bind_layout,
            sampler,
            fallback,
            bind_groups: HashMap::new(),
            reported_missing: HashSet::new(),
        }
    }

    pub(crate) fn register(&mut self, device: &wgpu::Device, key: TextureKey, view: &wgpu::TextureView) {
        let bind_group = create_bind_group(device, &self.bind_layout, view, &self.sampler);
        self.bind_groups.insert(key, bind_group);
        self.reported_missing.remove(&key);
    }

    pub(crate) fn is_registered(&self, key: TextureKey) -> bool {
        self.bind_groups.contains_key(&key)
    }

    /// Logs an unregistered key once; callers then draw it untextured.
    pub(crate) fn note_missing(&mut self, key: TextureKey) {
        if self.reported_missing.insert(key) {
            log::warn!("texture {:?} is not registered; drawing untextured", key);
        }
    }

    pub(crate) fn bind_group(&self, key: Option<TextureKey>) -> &wgpu::BindGroup {
        key.and_then(|key| self.bind_groups.get(&key))
            .unwrap_or(&self.fallback)
    }
}

fn create_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    view: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("TextureBindGroup"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}
