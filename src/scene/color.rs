// scene/color.rs
use glam::Vec4;

/// A primary color and the complement used for edge lines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorPair {
    pub primary: Vec4,
    pub complement: Vec4,
}

impl ColorPair {
    pub const fn new(primary: Vec4, complement: Vec4) -> Self {
        Self {
            primary,
            complement,
        }
    }

    pub fn from_arrays(primary: [f32; 4], complement: [f32; 4]) -> Self {
        Self::new(Vec4::from_array(primary), Vec4::from_array(complement))
    }

    /// Opaque color with a black complement.
    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(Vec4::new(r, g, b, 1.0), Vec4::new(0.0, 0.0, 0.0, 1.0))
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.primary.w = alpha;
        self
    }

    pub fn is_translucent(&self) -> bool {
        self.primary.w < 1.0
    }
}
