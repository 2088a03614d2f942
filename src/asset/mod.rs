pub mod cache;
pub mod handle;
pub mod mesh;

pub use cache::AssetCache;
pub use handle::Handle;
pub use mesh::{MeshData, MeshRef};

/// Marker for texture handles; image data lives with the material system.
#[derive(Debug)]
pub struct Texture;

pub type MeshKey = Handle<MeshData>;
pub type TextureKey = Handle<Texture>;

/// Key shared by builders that collect primitives inline rather than
/// drawing library geometry.
pub const INLINE_MESH: MeshKey = Handle::reserved(0);
/// Unit cube drawn in place of parts in bounds-only mode.
pub const BOUNDS_BOX_MESH: MeshKey = Handle::reserved(1);
/// Unit sphere used for drag handles.
pub const DRAG_HANDLE_MESH: MeshKey = Handle::reserved(2);

/// Library of prepared part geometry, as handed over by the part library.
pub type PartLibrary = AssetCache<MeshData>;

impl PartLibrary {
    pub fn mesh_ref(&self, key: MeshKey) -> MeshRef {
        MeshRef {
            key,
            geometry: self.get(key).cloned(),
        }
    }
}
