// renderer/backend/wgpu_backend/targets.rs
use glam::UVec2;

pub(crate) const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
pub(crate) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;

/// Two offscreen color targets: one presented, one drawn into. A frame is
/// only swapped to the front once it has been submitted cleanly.
pub(crate) struct FrameTargets {
    pub(crate) size: UVec2,
    sample_count: u32,
    color: [wgpu::Texture; 2],
    color_views: [wgpu::TextureView; 2],
    msaa_view: Option<wgpu::TextureView>,
    depth_view: wgpu::TextureView,
    front: usize,
}

impl FrameTargets {
    pub(crate) fn new(device: &wgpu::Device, size: UVec2, sample_count: u32) -> Self {
        let size = size.max(UVec2::ONE);
        let color = [
            create_target(device, "FrontColor", size, 1, COLOR_FORMAT, true),
            create_target(device, "BackColor", size, 1, COLOR_FORMAT, true),
        ];
        let color_views = [
            color[0].create_view(&wgpu::TextureViewDescriptor::default()),
            color[1].create_view(&wgpu::TextureViewDescriptor::default()),
        ];
        let msaa_view = (sample_count > 1).then(|| {
            create_target(device, "MsaaColor", size, sample_count, COLOR_FORMAT, false)
                .create_view(&wgpu::TextureViewDescriptor::default())
        });
        let depth_view = create_target(device, "Depth", size, sample_count, DEPTH_FORMAT, false)
            .create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            size,
            sample_count,
            color,
            color_views,
            msaa_view,
            depth_view,
            front: 0,
        }
    }

    pub(crate) fn sample_count(&self) -> u32 {
        self.sample_count
    }

    /// `(render view, resolve target)` for the back buffer.
    pub(crate) fn back_attachment(&self) -> (&wgpu::TextureView, Option<&wgpu::TextureView>) {
        let back = &self.color_views[1 - self.front];
        match &self.msaa_view {
            Some(msaa) => (msaa, Some(back)),
            None => (back, None),
        }
    }

    pub(crate) fn depth_view(&self) -> &wgpu::TextureView {
        &self.depth_view
    }

    pub(crate) fn front_texture(&self) -> &wgpu::Texture {
        &self.color[self.front]
    }

    pub(crate) fn present(&mut self) {
        self.front = 1 - self.front;
    }
}

fn create_target(
    device: &wgpu::Device,
    label: &str,
    size: UVec2,
    sample_count: u32,
    format: wgpu::TextureFormat,
    readable: bool,
) -> wgpu::Texture {
    let mut usage = wgpu::TextureUsages::RENDER_ATTACHMENT;
    if readable {
        usage |= wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_SRC;
    }
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: size.x,
            height: size.y,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage,
        view_formats: &[],
    })
}
