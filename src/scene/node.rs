// scene/node.rs
use glam::{Mat4, Vec3};

use crate::asset::{MeshRef, INLINE_MESH};
use crate::math::Aabb;
use crate::renderer::error::Result;

use super::{
    ColorPair, Directive, DirectiveKind, DragHandleSpec, GeometrySink, Primitive, TextureFrame,
    TransformMode, TransformPush,
};

/// Owned directive tree with a fluent builder.
///
/// Bounds of groups are accumulated from children as they are added, so
/// querying them during a traversal is constant time.
pub struct Node {
    kind: DirectiveKind,
    transform: Option<TransformPush>,
    color: Option<ColorPair>,
    texture: Option<TextureFrame>,
    mesh: Option<MeshRef>,
    primitives: Vec<Primitive>,
    drag_handle: Option<DragHandleSpec>,
    hidden: bool,
    wireframe: bool,
    explicit_bounds: Option<Aabb>,
    content_bounds: Aabb,
    unbounded_content: bool,
    children: Vec<Box<dyn Directive>>,
}

impl Node {
    fn with_kind(kind: DirectiveKind) -> Self {
        Self {
            kind,
            transform: None,
            color: None,
            texture: None,
            mesh: None,
            primitives: Vec::new(),
            drag_handle: None,
            hidden: false,
            wireframe: false,
            explicit_bounds: None,
            content_bounds: Aabb::EMPTY,
            unbounded_content: false,
            children: Vec::new(),
        }
    }

    pub fn group() -> Self {
        Self::with_kind(DirectiveKind::Group)
    }

    pub fn step() -> Self {
        Self::with_kind(DirectiveKind::Step)
    }

    /// A part drawing one instance of `mesh`.
    pub fn part(mesh: MeshRef) -> Self {
        let mut node = Self::with_kind(DirectiveKind::Part);
        match mesh.geometry.as_ref().and_then(|geometry| geometry.bounds) {
            Some(bounds) => node.content_bounds = bounds,
            None => node.unbounded_content = true,
        }
        node.mesh = Some(mesh);
        node
    }

    pub fn primitive(primitive: Primitive) -> Self {
        Self::primitives(vec![primitive])
    }

    pub fn primitives(primitives: Vec<Primitive>) -> Self {
        let mut node = Self::with_kind(DirectiveKind::Primitive);
        node.content_bounds = Aabb::from_points(
            primitives
                .iter()
                .flat_map(|primitive| primitive.points().iter().copied()),
        );
        node.primitives = primitives;
        node
    }

    /// A group that only changes the texture for its children.
    pub fn texture(frame: TextureFrame) -> Self {
        let mut node = Self::with_kind(DirectiveKind::Texture);
        node.texture = Some(frame);
        node
    }

    pub fn drag_handle(position: Vec3, size: f32) -> Self {
        let mut node = Self::with_kind(DirectiveKind::DragHandle);
        node.drag_handle = Some(DragHandleSpec { position, size });
        node
    }

    pub fn with_transform(mut self, matrix: Mat4) -> Self {
        self.transform = Some(TransformPush::multiply(matrix));
        self
    }

    pub fn with_replace_transform(mut self, matrix: Mat4) -> Self {
        self.transform = Some(TransformPush::replace(matrix));
        self
    }

    pub fn with_color(mut self, color: ColorPair) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_texture(mut self, frame: TextureFrame) -> Self {
        self.texture = Some(frame);
        self
    }

    /// Opens a display list that collects the primitives emitted below this
    /// node and draws them as one instance.
    pub fn collecting(mut self) -> Self {
        if self.mesh.is_none() {
            self.mesh = Some(MeshRef::inline(INLINE_MESH));
        }
        self
    }

    pub fn with_bounds(mut self, bounds: Aabb) -> Self {
        self.explicit_bounds = Some(bounds);
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn wireframe(mut self, wireframe: bool) -> Self {
        self.wireframe = wireframe;
        self
    }

    pub fn with_child(mut self, child: impl Directive + 'static) -> Self {
        self.push_child(Box::new(child));
        self
    }

    pub fn with_children<I, D>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: Directive + 'static,
    {
        for child in children {
            self.push_child(Box::new(child));
        }
        self
    }

    pub fn push_child(&mut self, child: Box<dyn Directive>) {
        self.include_child_bounds(child.as_ref());
        self.children.push(child);
    }

    fn include_child_bounds(&mut self, child: &dyn Directive) {
        if child.kind() == DirectiveKind::DragHandle {
            return;
        }
        let transform = child.local_transform();
        match (child.bounds(), transform) {
            (Some(bounds), None) => self.content_bounds = self.content_bounds.union(&bounds),
            (Some(bounds), Some(push)) if push.mode == TransformMode::Multiply => {
                self.content_bounds = self.content_bounds.union(&bounds.transformed(&push.matrix));
            }
            _ => self.unbounded_content = true,
        }
    }
}

impl Directive for Node {
    fn kind(&self) -> DirectiveKind {
        self.kind
    }

    fn local_transform(&self) -> Option<TransformPush> {
        self.transform
    }

    fn color(&self) -> Option<ColorPair> {
        self.color
    }

    fn texture(&self) -> Option<TextureFrame> {
        self.texture
    }

    fn display_list(&self) -> Option<MeshRef> {
        self.mesh.clone()
    }

    fn children(&self) -> &[Box<dyn Directive>] {
        &self.children
    }

    fn emit_geometry(&self, sink: &mut dyn GeometrySink) -> Result<()> {
        if self.kind == DirectiveKind::Part {
            sink.instance()?;
        }
        for primitive in &self.primitives {
            sink.primitive(primitive)?;
        }
        Ok(())
    }

    fn bounds(&self) -> Option<Aabb> {
        if self.explicit_bounds.is_some() {
            return self.explicit_bounds;
        }
        if self.unbounded_content || self.content_bounds.is_empty() {
            return None;
        }
        Some(self.content_bounds)
    }

    fn is_hidden(&self) -> bool {
        self.hidden
    }

    fn wireframe(&self) -> bool {
        self.wireframe
    }

    fn drag_handle(&self) -> Option<DragHandleSpec> {
        self.drag_handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::asset::{Handle, MeshData};
    use crate::renderer::vertex::{v, CURRENT_COLOR};
    use glam::Vec4;

    fn unit_part() -> MeshRef {
        let color = Vec4::from_array(CURRENT_COLOR);
        let mesh = MeshData::new(
            vec![
                v(Vec3::ZERO, Vec3::Z, color),
                v(Vec3::X, Vec3::Z, color),
                v(Vec3::Y, Vec3::Z, color),
            ],
            vec![0, 1, 2],
            Vec::new(),
        );
        MeshRef::library(Handle::new(0), Arc::new(mesh))
    }

    #[test]
    fn group_bounds_include_child_transforms() {
        let group = Node::group()
            .with_child(Node::part(unit_part()))
            .with_child(Node::part(unit_part()).with_transform(Mat4::from_translation(Vec3::new(
                10.0, 0.0, 0.0,
            ))));

        let bounds = group.bounds().unwrap();
        assert_eq!(bounds.min, Vec3::ZERO);
        assert_eq!(bounds.max, Vec3::new(11.0, 1.0, 0.0));
    }

    #[test]
    fn replace_transform_child_makes_group_unbounded() {
        let group = Node::group()
            .with_child(Node::part(unit_part()).with_replace_transform(Mat4::IDENTITY));
        assert!(group.bounds().is_none());
    }

    #[test]
    fn drag_handles_do_not_contribute_bounds() {
        let group = Node::group().with_child(Node::drag_handle(Vec3::splat(100.0), 7.0));
        assert!(group.bounds().is_none());
    }

    #[test]
    fn collecting_group_gets_inline_mesh() {
        let group = Node::group().collecting();
        let mesh = group.display_list().unwrap();
        assert_eq!(mesh.key, INLINE_MESH);
        assert!(mesh.geometry.is_none());
    }
}
