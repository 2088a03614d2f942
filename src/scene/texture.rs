// scene/texture.rs
use glam::Vec4;

use crate::asset::TextureKey;

/// Planar texture projection: `s = plane_s · p`, `t = plane_t · p` for a
/// point `p` in the coordinate space of the directive that pushed it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureSpec {
    pub texture: TextureKey,
    pub plane_s: Vec4,
    pub plane_t: Vec4,
}

/// One entry on the texture stack. `spec: None` switches texturing off for
/// the subtree below.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextureFrame {
    pub spec: Option<TextureSpec>,
}

impl TextureFrame {
    pub const NONE: Self = Self { spec: None };

    pub fn new(texture: TextureKey, plane_s: Vec4, plane_t: Vec4) -> Self {
        Self {
            spec: Some(TextureSpec {
                texture,
                plane_s,
                plane_t,
            }),
        }
    }

    pub fn texture(&self) -> Option<TextureKey> {
        self.spec.map(|spec| spec.texture)
    }
}
