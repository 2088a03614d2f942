// renderer/backend/wgpu_backend/context.rs
use parking_lot::{Mutex, MutexGuard};

use crate::renderer::error::RenderError;

/// Device and queue shared between the presentation layer and the wgpu
/// backend. Recording a frame and reading the presented target both hold
/// the frame lock.
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub adapter_info: wgpu::AdapterInfo,
    frame_lock: Mutex<()>,
}

impl GpuContext {
    /// Wraps a device the presentation layer already created.
    pub fn from_parts(device: wgpu::Device, queue: wgpu::Queue, adapter_info: wgpu::AdapterInfo) -> Self {
        Self {
            device,
            queue,
            adapter_info,
            frame_lock: Mutex::new(()),
        }
    }

    /// Creates a device without a surface, for offscreen rendering.
    pub async fn new_headless() -> Result<Self, RenderError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|err| RenderError::BackendSubmissionFailure(format!("no adapter: {err}")))?;

        let adapter_info = adapter.get_info();
        log::info!("Using adapter: {:?}", adapter_info);
        log::info!("Using backend: {:?}", adapter_info.backend);

        let mut required_features = wgpu::Features::empty();
        if adapter.features().contains(wgpu::Features::POLYGON_MODE_LINE) {
            required_features |= wgpu::Features::POLYGON_MODE_LINE;
        } else {
            log::warn!("POLYGON_MODE_LINE not supported; wireframe draws fall back to fill");
        }

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Device"),
                required_features,
                required_limits: wgpu::Limits::default(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|err| RenderError::BackendSubmissionFailure(format!("no device: {err}")))?;

        Ok(Self::from_parts(device, queue, adapter_info))
    }

    pub fn new_headless_blocking() -> Result<Self, RenderError> {
        pollster::block_on(Self::new_headless())
    }

    pub fn supports_wireframe(&self) -> bool {
        self.device.features().contains(wgpu::Features::POLYGON_MODE_LINE)
    }

    /// Held for the whole of a frame's recording and submission.
    pub fn lock_frame(&self) -> MutexGuard<'_, ()> {
        self.frame_lock.lock()
    }
}
