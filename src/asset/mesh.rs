use std::sync::Arc;

use crate::math::Aabb;
use crate::renderer::Vertex;

use super::MeshKey;

/// CPU-side geometry ready for upload: one vertex array shared by a
/// triangle list and a line list.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub triangle_indices: Vec<u32>,
    pub line_indices: Vec<u32>,
    pub bounds: Option<Aabb>,
}

impl MeshData {
    pub fn new(vertices: Vec<Vertex>, triangle_indices: Vec<u32>, line_indices: Vec<u32>) -> Self {
        let bounds = Aabb::from_points(vertices.iter().map(Vertex::position));
        Self {
            bounds: (!bounds.is_empty()).then_some(bounds),
            vertices,
            triangle_indices,
            line_indices,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.triangle_indices.is_empty() && self.line_indices.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangle_indices.len() / 3
    }
}

/// What a display-list builder is bound to: a mesh key, plus the library
/// geometry when the key names a prepared part. Builders for group nodes
/// carry no geometry and collect it inline instead.
#[derive(Debug, Clone)]
pub struct MeshRef {
    pub key: MeshKey,
    pub geometry: Option<Arc<MeshData>>,
}

impl MeshRef {
    pub fn inline(key: MeshKey) -> Self {
        Self {
            key,
            geometry: None,
        }
    }

    pub fn library(key: MeshKey, geometry: Arc<MeshData>) -> Self {
        Self {
            key,
            geometry: Some(geometry),
        }
    }
}
