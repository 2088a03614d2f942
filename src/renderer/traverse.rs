// renderer/traverse.rs
use glam::Mat4;

use crate::asset::MeshRef;
use crate::math::aabb_to_clipbox;
use crate::renderer::drag_handle::DragHandleQueue;
use crate::renderer::error::Result;
use crate::renderer::instance::InstanceRecord;
use crate::renderer::primitives::box_fit;
use crate::renderer::session::Session;
use crate::renderer::state::RenderState;
use crate::scene::{Directive, DirectiveKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawMode {
    #[default]
    Normal,
    /// Parts are drawn as their bounding boxes and anything outside the view
    /// volume is skipped.
    BoundsOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TraversalStats {
    pub nodes_visited: u32,
    pub nodes_culled: u32,
    pub branches_abandoned: u32,
    pub drag_handles: u32,
}

/// What a node pushed, so exactly that can be popped again.
#[derive(Default)]
struct Pushed {
    color: bool,
    texture: bool,
    transform: bool,
    wireframe: bool,
    display_list: bool,
}

/// Depth-first walk of a directive tree that feeds the state machine and
/// collects the resulting display lists.
pub struct SceneTraverser<'a> {
    state: &'a mut RenderState,
    session: &'a mut Session,
    handles: &'a mut DragHandleQueue,
    projection: Mat4,
    mode: DrawMode,
    bounds_proxy: &'a MeshRef,
    stats: TraversalStats,
}

impl<'a> SceneTraverser<'a> {
    pub fn new(
        state: &'a mut RenderState,
        session: &'a mut Session,
        handles: &'a mut DragHandleQueue,
        projection: Mat4,
        mode: DrawMode,
        bounds_proxy: &'a MeshRef,
    ) -> Self {
        Self {
            state,
            session,
            handles,
            projection,
            mode,
            bounds_proxy,
            stats: TraversalStats::default(),
        }
    }

    pub fn traverse(mut self, root: &dyn Directive) -> TraversalStats {
        self.visit(root);
        self.stats
    }

    fn visit(&mut self, node: &dyn Directive) {
        if node.is_hidden() {
            return;
        }
        self.stats.nodes_visited += 1;

        if let Some(handle) = node.drag_handle() {
            let eye = self.state.transform().matrix.transform_point3(handle.position);
            self.handles.push(eye, handle.size);
            self.stats.drag_handles += 1;
            return;
        }

        let mut pushed = Pushed::default();
        let result = self.draw(node, &mut pushed);
        if let Err(err) = &result {
            self.stats.branches_abandoned += 1;
            log::warn!("abandoning {:?} directive: {}", node.kind(), err);
        }
        if let Err(err) = self.unwind(&pushed, result.is_ok()) {
            log::warn!("unbalanced state while unwinding {:?}: {}", node.kind(), err);
        }
    }

    fn draw(&mut self, node: &dyn Directive, pushed: &mut Pushed) -> Result<()> {
        if let Some(color) = node.color() {
            self.state.push_color(color)?;
            pushed.color = true;
        }
        if let Some(texture) = node.texture() {
            self.state.push_texture(texture)?;
            pushed.texture = true;
        }
        if let Some(transform) = node.local_transform() {
            self.state.push_transform(transform.matrix, transform.mode)?;
            pushed.transform = true;
        }
        if node.wireframe() {
            self.state.push_wireframe();
            pushed.wireframe = true;
        }

        if self.mode == DrawMode::BoundsOnly {
            if let Some(bounds) = node.bounds() {
                let mvp = self.projection * self.state.transform().matrix;
                if !aabb_to_clipbox(&bounds, &mvp).intersects_ndc() {
                    self.stats.nodes_culled += 1;
                    return Ok(());
                }
            }
            if node.kind() == DirectiveKind::Part {
                return self.draw_bounds_proxy(node, pushed);
            }
        }

        if let Some(mesh) = node.display_list() {
            self.state.begin_build(mesh)?;
            pushed.display_list = true;
        }

        node.emit_geometry(&mut *self.state)?;

        for child in node.children() {
            self.visit(child.as_ref());
        }

        if pushed.display_list {
            self.state.append_inline_instance()?;
        }
        Ok(())
    }

    fn draw_bounds_proxy(&mut self, node: &dyn Directive, pushed: &mut Pushed) -> Result<()> {
        let Some(bounds) = node.bounds() else {
            return Ok(());
        };
        self.state.begin_build(self.bounds_proxy.clone())?;
        pushed.display_list = true;

        let transform = self.state.transform().matrix * box_fit(&bounds);
        let record = InstanceRecord::new(&transform, &self.state.color());
        self.state.append(record)
    }

    /// Pops in reverse push order. A finished display list goes to the
    /// session only when the node completed.
    fn unwind(&mut self, pushed: &Pushed, completed: bool) -> Result<()> {
        if pushed.display_list {
            let list = self.state.end_build()?;
            if completed {
                self.session.add(list);
            }
        }
        if pushed.wireframe {
            self.state.pop_wireframe()?;
        }
        if pushed.transform {
            self.state.pop_transform()?;
        }
        if pushed.texture {
            self.state.pop_texture()?;
        }
        if pushed.color {
            self.state.pop_color()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::asset::{Handle, MeshData, BOUNDS_BOX_MESH};
    use crate::renderer::lights::Lighting;
    use crate::renderer::primitives::box_mesh;
    use crate::renderer::uniforms::FrameUniforms;
    use crate::renderer::vertex::{v, CURRENT_COLOR};
    use crate::scene::{ColorPair, Node, Primitive};
    use crate::settings::StackDepths;
    use glam::{UVec2, Vec3, Vec4};

    struct Harness {
        state: RenderState,
        session: Session,
        handles: DragHandleQueue,
        proxy: MeshRef,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                state: RenderState::new(&StackDepths::default(), ColorPair::rgb(0.5, 0.5, 0.5)),
                session: Session::new(FrameUniforms {
                    projection: Mat4::IDENTITY,
                    model_view: Mat4::IDENTITY,
                    viewport: UVec2::new(100, 100),
                    lighting: Lighting::default(),
                    background: Vec4::ZERO,
                }),
                handles: DragHandleQueue::new(7.0),
                proxy: MeshRef::library(BOUNDS_BOX_MESH, Arc::new(box_mesh())),
            }
        }

        fn run(&mut self, root: &dyn Directive, mode: DrawMode) -> TraversalStats {
            SceneTraverser::new(
                &mut self.state,
                &mut self.session,
                &mut self.handles,
                Mat4::orthographic_rh_gl(-10.0, 10.0, -10.0, 10.0, -10.0, 10.0),
                mode,
                &self.proxy,
            )
            .traverse(root)
        }
    }

    fn part() -> Node {
        let c = Vec4::from_array(CURRENT_COLOR);
        let mesh = MeshData::new(
            vec![v(Vec3::ZERO, Vec3::Z, c), v(Vec3::X, Vec3::Z, c), v(Vec3::Y, Vec3::Z, c)],
            vec![0, 1, 2],
            Vec::new(),
        );
        Node::part(MeshRef::library(Handle::new(0), Arc::new(mesh)))
    }

    #[test]
    fn balanced_after_traversal() {
        let mut h = Harness::new();
        let root = Node::group()
            .with_color(ColorPair::rgb(1.0, 0.0, 0.0))
            .with_transform(Mat4::from_translation(Vec3::X))
            .wireframe(true)
            .with_child(part())
            .with_child(part().with_transform(Mat4::from_translation(Vec3::Y)));

        let stats = h.run(&root, DrawMode::Normal);
        assert!(h.state.is_balanced());
        assert_eq!(stats.nodes_visited, 3);
        assert_eq!(h.session.display_list_count(), 2);
    }

    #[test]
    fn primitives_without_open_builder_abandon_only_that_branch() {
        let mut h = Harness::new();
        let root = Node::group()
            .with_child(Node::primitive(Primitive::line(Vec3::ZERO, Vec3::X)))
            .with_child(part());

        let stats = h.run(&root, DrawMode::Normal);
        assert_eq!(stats.branches_abandoned, 1);
        assert_eq!(h.session.display_list_count(), 1);
        assert!(h.state.is_balanced());
    }

    #[test]
    fn collecting_group_draws_its_primitives_as_one_instance() {
        let mut h = Harness::new();
        let root = Node::group().collecting().with_child(
            Node::group()
                .with_transform(Mat4::from_translation(Vec3::Z))
                .with_child(Node::primitive(Primitive::triangle(Vec3::ZERO, Vec3::X, Vec3::Y))),
        );
        h.run(&root, DrawMode::Normal);
        let compiled = std::mem::replace(&mut h.session, Harness::new().session).finish();
        assert_eq!(compiled.instances().len(), 1);
        assert_eq!(compiled.arena_vertices()[0].pos, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn bounds_only_culls_offscreen_and_proxies_parts() {
        let mut h = Harness::new();
        let root = Node::group()
            .with_child(part())
            .with_child(part().with_transform(Mat4::from_translation(Vec3::new(100.0, 0.0, 0.0))));

        let stats = h.run(&root, DrawMode::BoundsOnly);
        assert_eq!(stats.nodes_culled, 1);
        let compiled = std::mem::replace(&mut h.session, Harness::new().session).finish();
        assert_eq!(compiled.batches()[0].draws[0].mesh, BOUNDS_BOX_MESH);
        assert_eq!(compiled.instances().len(), 1);
    }

    #[test]
    fn hidden_subtrees_are_skipped() {
        let mut h = Harness::new();
        let root = Node::group().with_child(Node::group().hidden(true).with_child(part()));
        let stats = h.run(&root, DrawMode::Normal);
        assert_eq!(stats.nodes_visited, 1);
        assert_eq!(h.session.display_list_count(), 0);
    }

    #[test]
    fn drag_handles_are_queued_in_eye_space() {
        let mut h = Harness::new();
        let root = Node::group()
            .with_transform(Mat4::from_translation(Vec3::new(0.0, 0.0, -3.0)))
            .with_child(Node::drag_handle(Vec3::X, 7.0));
        let stats = h.run(&root, DrawMode::Normal);
        assert_eq!(stats.drag_handles, 1);
        assert_eq!(h.handles.len(), 1);
        assert_eq!(h.session.display_list_count(), 0);
    }
}
