// renderer/state.rs
use glam::{Mat3, Mat4};

use crate::asset::MeshRef;
use crate::math::{apply_matrix_transpose, is_mirroring};
use crate::renderer::display_list::{DisplayList, DisplayListBuilder};
use crate::renderer::error::{RenderError, Result, StackKind};
use crate::renderer::instance::InstanceRecord;
use crate::renderer::stack::BoundedStack;
use crate::scene::{ColorPair, GeometrySink, Primitive, TextureFrame, TextureSpec, TransformMode};
use crate::settings::StackDepths;

/// One entry on the transform stack: the accumulated transform and the
/// facts derived from its linear part.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformFrame {
    pub matrix: Mat4,
    pub cull: Mat3,
    pub mirrored: bool,
}

impl TransformFrame {
    pub fn new(matrix: Mat4) -> Self {
        let cull = Mat3::from_mat4(matrix);
        Self {
            matrix,
            cull,
            mirrored: is_mirroring(&cull),
        }
    }

    pub const IDENTITY: Self = Self {
        matrix: Mat4::IDENTITY,
        cull: Mat3::IDENTITY,
        mirrored: false,
    };
}

/// Current values and stack depths, for comparing state before and after a
/// balanced sequence of pushes and pops.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateSnapshot {
    pub color: ColorPair,
    pub texture: TextureFrame,
    pub transform: TransformFrame,
    pub wireframe: bool,
    pub depths: [usize; 4],
}

/// The renderer's state machine: color, texture, transform and display-list
/// stacks plus the reference-counted wireframe flag.
///
/// Each stack holds the accumulated value for its frame, so the current value
/// is always the top (or the base value when the stack is empty).
pub struct RenderState {
    base_color: ColorPair,
    base_transform: TransformFrame,
    colors: BoundedStack<ColorPair>,
    textures: BoundedStack<TextureFrame>,
    transforms: BoundedStack<TransformFrame>,
    builders: BoundedStack<DisplayListBuilder>,
    wireframe: u32,
}

impl RenderState {
    pub fn new(depths: &StackDepths, base_color: ColorPair) -> Self {
        Self {
            base_color,
            base_transform: TransformFrame::IDENTITY,
            colors: BoundedStack::new(StackKind::Color, depths.color),
            textures: BoundedStack::new(StackKind::Texture, depths.texture),
            transforms: BoundedStack::new(StackKind::Transform, depths.transform),
            builders: BoundedStack::new(StackKind::DisplayList, depths.display_list),
            wireframe: 0,
        }
    }

    /// Sets the transform in effect below every pushed frame, usually the
    /// camera model-view. It does not occupy a transform stack slot.
    pub fn with_base_transform(mut self, matrix: Mat4) -> Self {
        self.base_transform = TransformFrame::new(matrix);
        self
    }

    pub fn color(&self) -> ColorPair {
        self.colors.top().copied().unwrap_or(self.base_color)
    }

    pub fn texture(&self) -> TextureFrame {
        self.textures.top().copied().unwrap_or(TextureFrame::NONE)
    }

    pub fn transform(&self) -> &TransformFrame {
        self.transforms.top().unwrap_or(&self.base_transform)
    }

    pub fn is_wireframe(&self) -> bool {
        self.wireframe > 0
    }

    pub fn push_color(&mut self, color: ColorPair) -> Result<()> {
        self.colors.push(color)
    }

    pub fn pop_color(&mut self) -> Result<ColorPair> {
        self.colors.pop()
    }

    /// Pushes a texture whose planes are given in the space of the current
    /// transform. They are stored in eye space so later transform pushes do
    /// not move the projection.
    pub fn push_texture(&mut self, frame: TextureFrame) -> Result<()> {
        let spec = frame.spec.map(|spec| {
            let current = self.transform().matrix;
            let inverse = if current.determinant() != 0.0 {
                current.inverse()
            } else {
                log::warn!("texture pushed under a singular transform; planes left untransformed");
                Mat4::IDENTITY
            };
            TextureSpec {
                texture: spec.texture,
                plane_s: apply_matrix_transpose(&inverse, spec.plane_s),
                plane_t: apply_matrix_transpose(&inverse, spec.plane_t),
            }
        });
        self.textures.push(TextureFrame { spec })
    }

    pub fn pop_texture(&mut self) -> Result<TextureFrame> {
        self.textures.pop()
    }

    pub fn push_transform(&mut self, matrix: Mat4, mode: TransformMode) -> Result<()> {
        let combined = match mode {
            TransformMode::Multiply => self.transform().matrix * matrix,
            TransformMode::Replace => matrix,
        };
        self.transforms.push(TransformFrame::new(combined))
    }

    pub fn pop_transform(&mut self) -> Result<TransformFrame> {
        self.transforms.pop()
    }

    pub fn push_wireframe(&mut self) {
        self.wireframe += 1;
    }

    pub fn pop_wireframe(&mut self) -> Result<()> {
        if self.wireframe == 0 {
            return Err(RenderError::StackUnderflow {
                stack: StackKind::Wireframe,
            });
        }
        self.wireframe -= 1;
        Ok(())
    }

    /// Opens a display list bound to `mesh` at the current transform.
    pub fn begin_build(&mut self, mesh: MeshRef) -> Result<()> {
        if self.builders.len() >= self.builders.max_depth() {
            return Err(RenderError::StackOverflow {
                stack: StackKind::DisplayList,
                depth: self.builders.max_depth(),
            });
        }
        let texture = self.texture();
        let builder = DisplayListBuilder::new(
            mesh,
            self.transform().matrix,
            texture.spec.as_ref(),
            self.is_wireframe(),
        );
        self.builders.push(builder)
    }

    pub fn append(&mut self, record: InstanceRecord) -> Result<()> {
        let builder = self
            .builders
            .top_mut()
            .ok_or(RenderError::UnbalancedBuilder)?;
        builder.append(record);
        Ok(())
    }

    pub fn append_primitive(&mut self, primitive: &Primitive) -> Result<()> {
        let current = self.transform().matrix;
        let colors = self.color();
        let builder = self
            .builders
            .top_mut()
            .ok_or(RenderError::UnbalancedBuilder)?;
        builder.append_primitive(primitive, &current, &colors);
        Ok(())
    }

    /// Instance record for the current transform and colors.
    pub fn current_instance(&self) -> InstanceRecord {
        InstanceRecord::new(&self.transform().matrix, &self.color())
    }

    /// Appends the active builder's own instance when it collected inline
    /// primitives.
    pub fn append_inline_instance(&mut self) -> Result<()> {
        let colors = self.color();
        let builder = self
            .builders
            .top_mut()
            .ok_or(RenderError::UnbalancedBuilder)?;
        if builder.has_inline_geometry() {
            let record = builder.origin_instance(&colors);
            builder.append(record);
        }
        Ok(())
    }

    pub fn end_build(&mut self) -> Result<DisplayList> {
        Ok(self.builders.pop()?.finish())
    }

    pub fn build_depth(&self) -> usize {
        self.builders.len()
    }

    /// True when every push has been matched by a pop.
    pub fn is_balanced(&self) -> bool {
        self.colors.is_empty()
            && self.textures.is_empty()
            && self.transforms.is_empty()
            && self.builders.is_empty()
            && self.wireframe == 0
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            color: self.color(),
            texture: self.texture(),
            transform: *self.transform(),
            wireframe: self.is_wireframe(),
            depths: [
                self.colors.len(),
                self.textures.len(),
                self.transforms.len(),
                self.builders.len(),
            ],
        }
    }
}

impl GeometrySink for RenderState {
    fn instance(&mut self) -> Result<()> {
        let record = self.current_instance();
        self.append(record)
    }

    fn primitive(&mut self, primitive: &Primitive) -> Result<()> {
        self.append_primitive(primitive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{TextureKey, INLINE_MESH};
    use glam::{Vec3, Vec4};

    fn state() -> RenderState {
        RenderState::new(&StackDepths::default(), ColorPair::rgb(0.5, 0.5, 0.5))
    }

    #[test]
    fn base_state_is_identity_with_default_color() {
        let state = state();
        assert_eq!(state.transform().matrix, Mat4::IDENTITY);
        assert_eq!(state.color(), ColorPair::rgb(0.5, 0.5, 0.5));
        assert_eq!(state.texture(), TextureFrame::NONE);
        assert!(!state.is_wireframe());
        assert!(state.is_balanced());
    }

    #[test]
    fn push_then_pop_restores_state_exactly() {
        let mut state = state();
        state
            .push_transform(Mat4::from_translation(Vec3::X), TransformMode::Multiply)
            .unwrap();
        let before = state.snapshot();

        state.push_color(ColorPair::rgb(1.0, 0.0, 0.0)).unwrap();
        state
            .push_texture(TextureFrame::new(TextureKey::new(3), Vec4::X, Vec4::Y))
            .unwrap();
        state
            .push_transform(Mat4::from_scale(Vec3::splat(2.0)), TransformMode::Multiply)
            .unwrap();
        state.push_wireframe();
        state.begin_build(MeshRef::inline(INLINE_MESH)).unwrap();

        state.end_build().unwrap();
        state.pop_wireframe().unwrap();
        state.pop_transform().unwrap();
        state.pop_texture().unwrap();
        state.pop_color().unwrap();

        assert_eq!(state.snapshot(), before);
    }

    #[test]
    fn nested_pushes_compose_associatively() {
        let a = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let b = Mat4::from_rotation_y(0.7);
        let c = Mat4::from_scale(Vec3::new(2.0, 1.0, 0.5));

        let mut state = state();
        for m in [a, b, c] {
            state.push_transform(m, TransformMode::Multiply).unwrap();
        }
        let nested = state.transform().matrix;

        let mut flat = self::state();
        flat.push_transform(a * (b * c), TransformMode::Multiply).unwrap();

        assert!(nested.abs_diff_eq(flat.transform().matrix, 1e-5));
    }

    #[test]
    fn replace_mode_ignores_parent() {
        let mut state = state();
        state
            .push_transform(Mat4::from_translation(Vec3::X), TransformMode::Multiply)
            .unwrap();
        let camera = Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0));
        state.push_transform(camera, TransformMode::Replace).unwrap();
        assert_eq!(state.transform().matrix, camera);
        state.pop_transform().unwrap();
        assert_eq!(state.transform().matrix, Mat4::from_translation(Vec3::X));
    }

    #[test]
    fn base_transform_does_not_use_a_stack_slot() {
        let camera = Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0));
        let mut state = state().with_base_transform(camera);
        assert_eq!(state.transform().matrix, camera);
        assert!(state.is_balanced());

        for _ in 0..64 {
            state
                .push_transform(Mat4::from_translation(Vec3::X), TransformMode::Multiply)
                .unwrap();
        }
        let expected = camera * Mat4::from_translation(Vec3::new(64.0, 0.0, 0.0));
        assert!(state.transform().matrix.abs_diff_eq(expected, 1e-4));

        for _ in 0..64 {
            state.pop_transform().unwrap();
        }
        assert_eq!(state.transform().matrix, camera);
        assert!(state.pop_transform().is_err());
    }

    #[test]
    fn mirrored_flag_follows_determinant_sign() {
        let mut state = state();
        let flip = Mat4::from_scale(Vec3::new(1.0, -1.0, 1.0));
        state.push_transform(flip, TransformMode::Multiply).unwrap();
        assert!(state.transform().mirrored);
        state.push_transform(flip, TransformMode::Multiply).unwrap();
        assert!(!state.transform().mirrored);
    }

    #[test]
    fn sixty_fifth_transform_push_overflows_and_leaves_state_intact() {
        let mut state = state();
        for _ in 0..64 {
            state
                .push_transform(Mat4::from_translation(Vec3::X), TransformMode::Multiply)
                .unwrap();
        }
        let before = state.snapshot();

        let err = state
            .push_transform(Mat4::from_translation(Vec3::X), TransformMode::Multiply)
            .unwrap_err();
        assert_eq!(
            err,
            RenderError::StackOverflow {
                stack: StackKind::Transform,
                depth: 64
            }
        );
        assert_eq!(state.snapshot(), before);
    }

    #[test]
    fn unmatched_pops_are_underflows() {
        let mut state = state();
        assert!(matches!(
            state.pop_color(),
            Err(RenderError::StackUnderflow {
                stack: StackKind::Color
            })
        ));
        assert!(matches!(
            state.pop_wireframe(),
            Err(RenderError::StackUnderflow {
                stack: StackKind::Wireframe
            })
        ));
        assert!(matches!(
            state.end_build(),
            Err(RenderError::StackUnderflow {
                stack: StackKind::DisplayList
            })
        ));
        assert!(state.is_balanced());
    }

    #[test]
    fn appending_without_builder_is_unbalanced() {
        let mut state = state();
        let record = state.current_instance();
        assert_eq!(state.append(record), Err(RenderError::UnbalancedBuilder));
        assert_eq!(
            state.append_primitive(&Primitive::line(Vec3::ZERO, Vec3::X)),
            Err(RenderError::UnbalancedBuilder)
        );
    }

    #[test]
    fn wireframe_is_reference_counted() {
        let mut state = state();
        state.push_wireframe();
        state.push_wireframe();
        state.pop_wireframe().unwrap();
        assert!(state.is_wireframe());
        state.pop_wireframe().unwrap();
        assert!(!state.is_wireframe());
    }

    #[test]
    fn texture_planes_are_held_in_eye_space() {
        let mut state = state();
        state
            .push_transform(
                Mat4::from_translation(Vec3::new(2.0, 0.0, 0.0)),
                TransformMode::Multiply,
            )
            .unwrap();
        // s = x in the pushing node's space
        state
            .push_texture(TextureFrame::new(TextureKey::new(0), Vec4::X, Vec4::Y))
            .unwrap();
        let spec = state.texture().spec.unwrap();
        // eye x = 2 is node x = 0
        assert_eq!(spec.plane_s.dot(Vec4::new(2.0, 0.0, 0.0, 1.0)), 0.0);
    }
}
