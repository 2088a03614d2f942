// renderer/batch.rs
use bitflags::bitflags;

use crate::asset::TextureKey;
use crate::renderer::instance::InstanceRecord;

bitflags! {
    /// Everything about a draw that needs a different pipeline. Translucent
    /// is the highest bit, so sorting by bits draws it after everything
    /// opaque.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct PipelineState: u32 {
        const MIRRORED = 1 << 0;
        const WIREFRAME = 1 << 1;
        const TEXTURED = 1 << 2;
        const TRANSLUCENT = 1 << 3;
    }
}

impl PipelineState {
    /// Per-instance part of the state; wireframe and texturing come from the
    /// display list.
    pub fn for_instance(record: &InstanceRecord) -> Self {
        let mut state = PipelineState::empty();
        state.set(PipelineState::MIRRORED, record.is_mirrored());
        state.set(PipelineState::TRANSLUCENT, record.is_translucent());
        state
    }

    pub fn pass(self) -> RenderPass {
        if self.contains(PipelineState::TRANSLUCENT) {
            RenderPass::Transparent
        } else {
            RenderPass::Opaque
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RenderPass {
    Opaque,      // depth-tested, depth-written
    Transparent, // alpha blended, no depth writes
    Overlay,     // drag handles, drawn on top
}

impl RenderPass {
    pub const ALL: [RenderPass; 3] = [RenderPass::Opaque, RenderPass::Transparent, RenderPass::Overlay];

    pub fn uses_alpha_blending(self) -> bool {
        matches!(self, Self::Transparent | Self::Overlay)
    }

    pub fn writes_depth(self) -> bool {
        matches!(self, Self::Opaque)
    }

    pub fn depth_tested(self) -> bool {
        !matches!(self, Self::Overlay)
    }
}

/// Batching key: only what actually requires a pipeline or bind group
/// change. The derived order (pass, then state bits, then texture) is the
/// draw order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BatchKey {
    pub pass: RenderPass,
    pub state: PipelineState,
    pub texture: Option<TextureKey>,
}

impl BatchKey {
    pub fn new(state: PipelineState, texture: Option<TextureKey>) -> Self {
        Self {
            pass: state.pass(),
            state,
            texture,
        }
    }

    pub fn overlay() -> Self {
        Self {
            pass: RenderPass::Overlay,
            state: PipelineState::empty(),
            texture: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translucent_keys_sort_after_opaque() {
        let opaque = BatchKey::new(PipelineState::MIRRORED | PipelineState::TEXTURED, None);
        let translucent = BatchKey::new(PipelineState::TRANSLUCENT, None);
        assert!(opaque < translucent);
        assert!(translucent < BatchKey::overlay());
        assert_eq!(translucent.pass, RenderPass::Transparent);
    }

    #[test]
    fn untextured_sorts_before_textured_with_same_state() {
        let plain = BatchKey::new(PipelineState::TEXTURED, None);
        let textured = BatchKey::new(PipelineState::TEXTURED, Some(TextureKey::new(0)));
        assert!(plain < textured);
    }
}
