// renderer/backend/null.rs
use std::sync::Arc;

use glam::{Mat4, Vec3, Vec4};
use parking_lot::Mutex;

use super::{
    call_geometry, plan_draws, BackendCapabilities, DrawCall, FrameStats, RenderBackend, Topology,
};
use crate::math::clip_triangle;
use crate::renderer::error::RenderError;
use crate::renderer::session::CompiledSession;

/// Everything a `NullBackend` kept from one presented frame.
#[derive(Debug, Clone, Default)]
pub struct RecordedFrame {
    pub calls: Vec<DrawCall>,
    pub instance_bytes: Vec<u8>,
    pub stats: FrameStats,
    pub background: Vec4,
    /// Clip-space triangles that survived clipping, in draw order. Only
    /// filled when geometry capture is on.
    pub clipped: Vec<[Vec4; 3]>,
}

#[derive(Debug, Default)]
struct Presentation {
    fail_next: Option<String>,
    presented: Option<RecordedFrame>,
    frames_presented: u64,
}

/// Headless backend that executes the draw plan in software, as far as
/// clipping, and keeps the result for inspection.
pub struct NullBackend {
    instancing: bool,
    capture_geometry: bool,
    presentation: Arc<Mutex<Presentation>>,
}

/// Observer for a `NullBackend` that has been moved into a renderer.
#[derive(Clone)]
pub struct NullProbe {
    presentation: Arc<Mutex<Presentation>>,
}

impl NullProbe {
    /// Makes the next `submit` fail with `reason`.
    pub fn fail_next_submission(&self, reason: impl Into<String>) {
        self.presentation.lock().fail_next = Some(reason.into());
    }

    pub fn presented(&self) -> Option<RecordedFrame> {
        self.presentation.lock().presented.clone()
    }

    pub fn frames_presented(&self) -> u64 {
        self.presentation.lock().frames_presented
    }
}

impl NullBackend {
    pub fn new() -> Self {
        Self {
            instancing: true,
            capture_geometry: false,
            presentation: Arc::default(),
        }
    }

    /// Reports no instancing support, so every instance becomes its own draw.
    pub fn without_instancing(mut self) -> Self {
        self.instancing = false;
        self
    }

    pub fn with_geometry_capture(mut self) -> Self {
        self.capture_geometry = true;
        self
    }

    pub fn probe(&self) -> NullProbe {
        NullProbe {
            presentation: Arc::clone(&self.presentation),
        }
    }

    pub fn fail_next_submission(&mut self, reason: impl Into<String>) {
        self.probe().fail_next_submission(reason);
    }

    pub fn presented(&self) -> Option<RecordedFrame> {
        self.probe().presented()
    }

    pub fn frames_presented(&self) -> u64 {
        self.probe().frames_presented()
    }

    fn execute(&self, session: &CompiledSession, calls: &[DrawCall]) -> (u64, Vec<[Vec4; 3]>) {
        let projection = session.uniforms().projection;
        let instances = session.instances();
        let mut triangles = 0u64;
        let mut clipped = Vec::new();

        for call in calls.iter().filter(|call| call.topology == Topology::Triangles) {
            let (vertices, indices) = call_geometry(session, call);
            let positions: Vec<Vec3> = indices
                .iter()
                .filter_map(|&i| {
                    let index = usize::try_from(i64::from(i) + i64::from(call.base_vertex)).ok()?;
                    vertices.get(index).map(|vertex| vertex.position())
                })
                .collect();

            for instance in call.instances.clone() {
                let Some(record) = instances.get(instance as usize) else {
                    continue;
                };
                let mvp: Mat4 = projection * record.transform();
                for tri in positions.chunks_exact(3) {
                    let clip = [
                        mvp * tri[0].extend(1.0),
                        mvp * tri[1].extend(1.0),
                        mvp * tri[2].extend(1.0),
                    ];
                    let out = clip_triangle(&clip);
                    triangles += out.len() as u64;
                    if self.capture_geometry {
                        clipped.extend(out.iter().copied());
                    }
                }
            }
        }
        (triangles, clipped)
    }
}

impl Default for NullBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderBackend for NullBackend {
    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities::standard("null", self.instancing, true)
    }

    fn submit(&mut self, session: &CompiledSession) -> Result<FrameStats, RenderError> {
        if let Some(reason) = self.presentation.lock().fail_next.take() {
            return Err(RenderError::BackendSubmissionFailure(reason));
        }

        let calls = plan_draws(session, &self.capabilities());
        let (triangles, clipped) = self.execute(session, &calls);
        let stats = FrameStats {
            batches: session.batches().len() as u32,
            draw_calls: calls.len() as u32,
            instances: session.instances().len() as u32,
            triangles,
            ..FrameStats::default()
        };
        log::trace!(
            "null backend frame: {} calls, {} triangles",
            stats.draw_calls,
            stats.triangles
        );

        let mut presentation = self.presentation.lock();
        presentation.presented = Some(RecordedFrame {
            calls,
            instance_bytes: session.instance_bytes().to_vec(),
            stats,
            background: session.uniforms().background,
            clipped,
        });
        presentation.frames_presented += 1;
        Ok(stats)
    }
}
