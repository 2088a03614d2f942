// scene/mod.rs
//! The document side of the renderer: the capability trait every drawable
//! directive exposes, the state values it pushes, and a concrete owned tree.

pub mod color;
pub mod directive;
pub mod node;
pub mod primitive;
pub mod texture;

pub use color::ColorPair;
pub use directive::{
    Directive, DirectiveKind, DragHandleSpec, GeometrySink, TransformMode, TransformPush,
};
pub use node::Node;
pub use primitive::{Primitive, PrimitiveColor, PrimitiveKind};
pub use texture::{TextureFrame, TextureSpec};
