// scene/directive.rs
use glam::{Mat4, Vec3};

use crate::asset::MeshRef;
use crate::math::Aabb;
use crate::renderer::error::Result;

use super::{ColorPair, Primitive, TextureFrame};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    Group,
    Step,
    Part,
    Primitive,
    Texture,
    DragHandle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransformMode {
    /// `current = parent * local`
    #[default]
    Multiply,
    /// `current = local`
    Replace,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformPush {
    pub matrix: Mat4,
    pub mode: TransformMode,
}

impl TransformPush {
    pub fn multiply(matrix: Mat4) -> Self {
        Self {
            matrix,
            mode: TransformMode::Multiply,
        }
    }

    pub fn replace(matrix: Mat4) -> Self {
        Self {
            matrix,
            mode: TransformMode::Replace,
        }
    }
}

/// A drag handle at `position` (directive-local), `size` pixels across.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragHandleSpec {
    pub position: Vec3,
    pub size: f32,
}

/// Receives the geometry a directive produces while it is being drawn.
pub trait GeometrySink {
    /// Appends one instance of the active display list at the current
    /// transform and colors.
    fn instance(&mut self) -> Result<()>;

    /// Appends raw vertex data to the active display list.
    fn primitive(&mut self, primitive: &Primitive) -> Result<()>;
}

/// What the renderer needs from one node of a model document.
///
/// Everything is borrowed for the duration of a single traversal. State
/// accessors return `None` when the node leaves that part of the state
/// alone.
pub trait Directive {
    fn kind(&self) -> DirectiveKind;

    fn local_transform(&self) -> Option<TransformPush> {
        None
    }

    fn color(&self) -> Option<ColorPair> {
        None
    }

    fn texture(&self) -> Option<TextureFrame> {
        None
    }

    /// Mesh for the display list this node opens, if any.
    fn display_list(&self) -> Option<MeshRef> {
        None
    }

    fn children(&self) -> &[Box<dyn Directive>] {
        &[]
    }

    fn emit_geometry(&self, _sink: &mut dyn GeometrySink) -> Result<()> {
        Ok(())
    }

    /// Bounds in the node's own space, i.e. after its transform is pushed.
    fn bounds(&self) -> Option<Aabb> {
        None
    }

    fn is_hidden(&self) -> bool {
        false
    }

    fn wireframe(&self) -> bool {
        false
    }

    fn drag_handle(&self) -> Option<DragHandleSpec> {
        None
    }
}
