// renderer/renderer.rs
use std::sync::Arc;

use glam::{Mat4, UVec2, Vec3};
use parking_lot::Mutex;

use crate::asset::{MeshRef, BOUNDS_BOX_MESH, DRAG_HANDLE_MESH};
use crate::renderer::backend::{BackendCapabilities, FrameStats, RenderBackend};
use crate::renderer::drag_handle::DragHandleQueue;
use crate::renderer::error::{RenderError, Result};
use crate::renderer::primitives::{box_mesh, sphere_mesh};
use crate::renderer::session::Session;
use crate::renderer::state::RenderState;
use crate::renderer::traverse::{DrawMode, SceneTraverser};
use crate::renderer::uniforms::FrameUniforms;
use crate::scene::{ColorPair, Directive};
use crate::settings::RenderSettings;

/// Presentation-facing entry point: owns the backend and turns one directive
/// tree per call into one submitted frame.
pub struct Renderer {
    backend: Box<dyn RenderBackend + Send>,
    settings: RenderSettings,
    viewport: Option<UVec2>,
    handles: DragHandleQueue,
    bounds_proxy: MeshRef,
    handle_mesh: MeshRef,
    last_stats: Option<FrameStats>,
}

impl Renderer {
    pub fn new(backend: Box<dyn RenderBackend + Send>, settings: RenderSettings) -> Self {
        let caps = backend.capabilities();
        log::info!(
            "Renderer using {} backend (instancing: {}, wireframe: {})",
            caps.name,
            caps.instancing,
            caps.wireframe
        );

        let handle_mesh = MeshRef::library(
            DRAG_HANDLE_MESH,
            Arc::new(sphere_mesh(
                settings.drag_handle.longitude,
                settings.drag_handle.latitude,
            )),
        );
        Self {
            backend,
            viewport: None,
            handles: DragHandleQueue::new(settings.drag_handle.diameter),
            bounds_proxy: MeshRef::library(BOUNDS_BOX_MESH, Arc::new(box_mesh())),
            handle_mesh,
            last_stats: None,
            settings,
        }
    }

    /// Sets the viewport in pixels. Must be called before the first frame and
    /// again whenever the presentation surface changes size.
    pub fn initialize(&mut self, viewport: UVec2) {
        log::info!("Renderer viewport set to {}x{}", viewport.x, viewport.y);
        self.viewport = Some(viewport);
    }

    pub fn viewport(&self) -> Option<UVec2> {
        self.viewport
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn capabilities(&self) -> BackendCapabilities {
        self.backend.capabilities()
    }

    pub fn last_frame_stats(&self) -> Option<FrameStats> {
        self.last_stats
    }

    /// Queues a handle at a model-space position for the next frame.
    /// `size_hint` is the on-screen diameter in pixels; non-positive values
    /// use the configured diameter.
    pub fn draw_drag_handle(&mut self, position: Vec3, size_hint: f32) {
        self.handles.request(position, size_hint);
    }

    /// Draws `root` through `camera` and `projection` and submits the frame.
    /// Node-level failures abandon their branch and are reported in the
    /// returned stats; a failed submission leaves the previous frame
    /// presented and keeps queued drag handles for the next call.
    pub fn render(
        &mut self,
        root: &dyn Directive,
        camera: &Mat4,
        projection: &Mat4,
        mode: DrawMode,
    ) -> Result<FrameStats> {
        let viewport = self.viewport.ok_or(RenderError::NotInitialized)?;

        let lighting = self.settings.lighting.lighting();
        let lighting = if self.settings.lighting.world_space {
            lighting.to_eye_space(camera)
        } else {
            lighting
        };
        let mut session = Session::new(FrameUniforms {
            projection: *projection,
            model_view: *camera,
            viewport,
            lighting,
            background: self.settings.background_color(),
        });

        let mut state =
            RenderState::new(&self.settings.stack_depths, self.settings.default_colors())
                .with_base_transform(*camera);
        self.handles.place_requests(camera);

        let traversal = SceneTraverser::new(
            &mut state,
            &mut session,
            &mut self.handles,
            *projection,
            mode,
            &self.bounds_proxy,
        )
        .traverse(root);
        debug_assert!(state.is_balanced());

        let handle_count = self.handles.len() as u32;
        let handle_colors = ColorPair::from_arrays(
            self.settings.drag_handle.color,
            self.settings.drag_handle.color,
        );
        let overlay = self
            .handles
            .drain_instances(projection, viewport, &handle_colors);
        if !overlay.is_empty() {
            session.set_overlay(self.handle_mesh.clone(), overlay);
        }

        let compiled = session.finish();
        log::debug!(
            "Frame compiled: {} batches, {} instances, {} nodes visited",
            compiled.batches().len(),
            compiled.instances().len(),
            traversal.nodes_visited
        );

        match self.backend.submit(&compiled) {
            Ok(mut stats) => {
                self.handles.commit();
                stats.drag_handles = handle_count;
                stats.culled_nodes = traversal.nodes_culled;
                stats.abandoned_branches = traversal.branches_abandoned;
                self.last_stats = Some(stats);
                Ok(stats)
            }
            Err(err) => {
                log::warn!("Frame submission failed, keeping previous frame: {}", err);
                Err(err)
            }
        }
    }
}

/// A renderer shared between threads. Every access goes through
/// [`with`](Self::with), so the lock is released on every exit path.
#[derive(Clone)]
pub struct SharedRenderer(Arc<Mutex<Renderer>>);

impl SharedRenderer {
    pub fn new(renderer: Renderer) -> Self {
        Self(Arc::new(Mutex::new(renderer)))
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut Renderer) -> R) -> R {
        let mut guard = self.0.lock();
        f(&mut guard)
    }
}
