//! Matrix and vector helpers that reproduce the classic fixed-function
//! transform pipeline on top of `glam`.
//!
//! All matrices are column-major, the OpenGL layout. Clip space follows the
//! OpenGL convention (`-w <= z <= w`); the wgpu backend converts depth to its
//! `[0, w]` range when it uploads the projection.

pub mod bounds;
pub mod clip;
pub mod matrix;

pub use bounds::{aabb_to_clipbox, mesh_to_clipbox, Aabb};
pub use clip::{clip_triangle, ClippedTriangles, MAX_CLIPPED_TRIANGLES};
pub use matrix::{
    apply_matrix, apply_matrix_transpose, apply_rotation_matrix, build_frustum_matrix,
    build_identity, build_ortho_matrix, build_rotation_matrix, build_translation_matrix,
    is_mirroring, mult_matrices, normal_matrix, perspective_divide, perspective_divide_in_place,
};
