// renderer/display_list.rs
use std::sync::Arc;

use glam::{Mat3, Mat4, Vec3, Vec4};

use crate::asset::{MeshData, MeshKey, MeshRef, TextureKey};
use crate::math::{apply_matrix_transpose, is_mirroring};
use crate::renderer::instance::InstanceRecord;
use crate::renderer::vertex::{v, Vertex};
use crate::scene::{ColorPair, Primitive, PrimitiveColor, PrimitiveKind, TextureSpec};

/// Texture and generation planes expressed in the display list's own
/// coordinate space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureBinding {
    pub texture: TextureKey,
    pub plane_s: Vec4,
    pub plane_t: Vec4,
}

#[derive(Debug, Clone)]
pub enum DisplayGeometry {
    Empty,
    Library(Arc<MeshData>),
    Inline(Arc<MeshData>),
}

impl DisplayGeometry {
    pub fn mesh(&self) -> Option<&Arc<MeshData>> {
        match self {
            DisplayGeometry::Empty => None,
            DisplayGeometry::Library(mesh) | DisplayGeometry::Inline(mesh) => Some(mesh),
        }
    }
}

/// An open display list on the builder stack.
///
/// Inline primitives are stored relative to the builder's origin, the
/// transform that was current when it opened, so that the whole list can be
/// drawn as one instance at that origin.
#[derive(Debug)]
pub struct DisplayListBuilder {
    mesh: MeshRef,
    origin: Mat4,
    origin_inverse: Mat4,
    texture: Option<TextureBinding>,
    wireframe: bool,
    instances: Vec<InstanceRecord>,
    vertices: Vec<Vertex>,
    triangle_indices: Vec<u32>,
    line_indices: Vec<u32>,
}

impl DisplayListBuilder {
    /// `texture` planes are in eye space.
    pub fn new(mesh: MeshRef, origin: Mat4, texture: Option<&TextureSpec>, wireframe: bool) -> Self {
        // A flattened origin has no inverse; fall back to collecting in eye
        // space and drawing from the identity.
        let origin = if origin.determinant() != 0.0 && origin.is_finite() {
            origin
        } else {
            Mat4::IDENTITY
        };
        let texture = texture.map(|spec| TextureBinding {
            texture: spec.texture,
            plane_s: apply_matrix_transpose(&origin, spec.plane_s),
            plane_t: apply_matrix_transpose(&origin, spec.plane_t),
        });

        Self {
            mesh,
            origin,
            origin_inverse: origin.inverse(),
            texture,
            wireframe,
            instances: Vec::new(),
            vertices: Vec::new(),
            triangle_indices: Vec::new(),
            line_indices: Vec::new(),
        }
    }

    pub fn mesh_key(&self) -> MeshKey {
        self.mesh.key
    }

    pub fn append(&mut self, record: InstanceRecord) {
        self.instances.push(record);
    }

    /// Instance that draws the collected inline geometry where it was
    /// emitted.
    pub fn origin_instance(&self, colors: &ColorPair) -> InstanceRecord {
        InstanceRecord::new(&self.origin, colors)
    }

    /// Bakes `primitive`, given in the space of `current`, into builder-local
    /// vertices.
    pub fn append_primitive(&mut self, primitive: &Primitive, current: &Mat4, colors: &ColorPair) {
        let relative = self.origin_inverse * *current;
        let color = match primitive.color {
            PrimitiveColor::Current => colors.primary,
            PrimitiveColor::Complement => colors.complement,
            PrimitiveColor::Rgba(rgba) => rgba,
        };

        let mut points = [Vec3::ZERO; 4];
        let src = primitive.points();
        for (dst, p) in points.iter_mut().zip(src) {
            *dst = relative.transform_point3(*p);
        }
        let points = &mut points[..src.len()];

        // Baking a mirroring transform into the vertices reverses their
        // winding; restore it so front faces stay front faces.
        if primitive.kind != PrimitiveKind::Line && is_mirroring(&Mat3::from_mat4(relative)) {
            points.reverse();
        }

        let base = self.vertices.len() as u32;
        match primitive.kind {
            PrimitiveKind::Line => {
                self.vertices
                    .extend(points.iter().map(|p| v(*p, Vec3::ZERO, color)));
                self.line_indices.extend_from_slice(&[base, base + 1]);
            }
            PrimitiveKind::Triangle | PrimitiveKind::Quad => {
                let normal = face_normal(points[0], points[1], points[2]);
                self.vertices
                    .extend(points.iter().map(|p| v(*p, normal, color)));
                self.triangle_indices
                    .extend_from_slice(&[base, base + 1, base + 2]);
                if primitive.kind == PrimitiveKind::Quad {
                    self.triangle_indices
                        .extend_from_slice(&[base, base + 2, base + 3]);
                }
            }
        }
    }

    pub fn has_inline_geometry(&self) -> bool {
        !self.triangle_indices.is_empty() || !self.line_indices.is_empty()
    }

    pub fn finish(self) -> DisplayList {
        let has_inline = self.has_inline_geometry();
        let geometry = match self.mesh.geometry {
            Some(mesh) => DisplayGeometry::Library(mesh),
            None if has_inline => DisplayGeometry::Inline(Arc::new(MeshData::new(
                self.vertices,
                self.triangle_indices,
                self.line_indices,
            ))),
            None => DisplayGeometry::Empty,
        };

        DisplayList {
            mesh: self.mesh.key,
            geometry,
            instances: self.instances,
            texture: self.texture,
            wireframe: self.wireframe,
        }
    }
}

fn face_normal(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    (b - a).cross(c - a).normalize_or_zero()
}

/// A compiled display list. Nothing about it changes after the builder that
/// produced it has finished.
#[derive(Debug, Clone)]
pub struct DisplayList {
    mesh: MeshKey,
    geometry: DisplayGeometry,
    instances: Vec<InstanceRecord>,
    texture: Option<TextureBinding>,
    wireframe: bool,
}

impl DisplayList {
    pub fn mesh(&self) -> MeshKey {
        self.mesh
    }

    pub fn geometry(&self) -> &DisplayGeometry {
        &self.geometry
    }

    pub fn instances(&self) -> &[InstanceRecord] {
        &self.instances
    }

    pub fn texture(&self) -> Option<&TextureBinding> {
        self.texture.as_ref()
    }

    pub fn wireframe(&self) -> bool {
        self.wireframe
    }

    /// True when drawing this list would put nothing on screen.
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty() || self.geometry.mesh().map_or(true, |mesh| mesh.is_empty())
    }
}
