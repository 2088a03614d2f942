// renderer/drag_handle.rs
use glam::{Mat4, UVec2, Vec3};

use crate::renderer::instance::InstanceRecord;
use crate::scene::ColorPair;

/// A handle waiting to be drawn: eye-space center and on-screen diameter in
/// pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragHandleInstance {
    pub eye_position: Vec3,
    pub size: f32,
}

/// Handles collected while a frame is traversed and drawn after it, so they
/// sit on top of the model at a constant screen size.
///
/// Requests made between frames stay queued until [`commit`](Self::commit),
/// so a frame that fails to submit draws them again on the next attempt.
#[derive(Debug)]
pub struct DragHandleQueue {
    default_size: f32,
    requests: Vec<(Vec3, f32)>,
    handles: Vec<DragHandleInstance>,
}

impl DragHandleQueue {
    /// `default_size` replaces any non-positive size given to
    /// [`request`](Self::request) or [`push`](Self::push).
    pub fn new(default_size: f32) -> Self {
        Self {
            default_size,
            requests: Vec::new(),
            handles: Vec::new(),
        }
    }

    fn resolve(&self, size: f32) -> f32 {
        if size > 0.0 {
            size
        } else {
            self.default_size
        }
    }

    /// Queues a handle at a model-space position, placed through the camera
    /// of the next frame.
    pub fn request(&mut self, model_position: Vec3, size: f32) {
        let size = self.resolve(size);
        self.requests.push((model_position, size));
    }

    /// Adds pending requests to the frame through `camera`.
    pub fn place_requests(&mut self, camera: &Mat4) {
        for &(position, size) in &self.requests {
            self.handles.push(DragHandleInstance {
                eye_position: camera.transform_point3(position),
                size,
            });
        }
    }

    /// Forgets requests once the frame that drew them has been submitted.
    pub fn commit(&mut self) {
        self.requests.clear();
    }

    pub fn pending_requests(&self) -> usize {
        self.requests.len()
    }

    pub fn push(&mut self, eye_position: Vec3, size: f32) {
        let size = self.resolve(size);
        self.handles.push(DragHandleInstance { eye_position, size });
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Empties the queue into sphere instances scaled so each unit sphere
    /// covers `size` pixels. Handles at or behind the eye are dropped.
    pub fn drain_instances(
        &mut self,
        projection: &Mat4,
        viewport: UVec2,
        colors: &ColorPair,
    ) -> Vec<InstanceRecord> {
        self.handles
            .drain(..)
            .filter_map(|handle| {
                let per_pixel = eye_units_per_pixel(projection, handle.eye_position, viewport)?;
                let radius = 0.5 * handle.size * per_pixel;
                let transform = Mat4::from_translation(handle.eye_position)
                    * Mat4::from_scale(Vec3::splat(radius));
                Some(InstanceRecord::new(&transform, colors))
            })
            .collect()
    }
}

/// Eye-space distance covered by one horizontal pixel at `eye_position`.
pub fn eye_units_per_pixel(projection: &Mat4, eye_position: Vec3, viewport: UVec2) -> Option<f32> {
    let clip_w = (*projection * eye_position.extend(1.0)).w;
    let x_scale = projection.x_axis.x;
    if clip_w <= 0.0 || x_scale == 0.0 || viewport.x == 0 {
        return None;
    }
    Some((2.0 * clip_w / (x_scale * viewport.x as f32)).abs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::build_frustum_matrix;

    #[test]
    fn handles_behind_the_eye_are_dropped() {
        let proj = build_frustum_matrix(-1.0, 1.0, -1.0, 1.0, 1.0, 100.0);
        let mut queue = DragHandleQueue::new(7.0);
        queue.push(Vec3::new(0.0, 0.0, 5.0), 7.0);
        let colors = ColorPair::rgb(0.0, 0.0, 1.0);
        let out = queue.drain_instances(&proj, UVec2::new(100, 100), &colors);
        assert!(out.is_empty());
        assert!(queue.is_empty());
    }

    #[test]
    fn requests_are_placed_through_camera() {
        let mut queue = DragHandleQueue::new(7.0);
        queue.request(Vec3::X, 7.0);
        assert!(queue.is_empty());
        queue.place_requests(&Mat4::from_translation(Vec3::new(0.0, 0.0, -10.0)));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.handles[0].eye_position, Vec3::new(1.0, 0.0, -10.0));
        assert_eq!(queue.pending_requests(), 1);
        queue.commit();
        assert_eq!(queue.pending_requests(), 0);
    }

    #[test]
    fn non_positive_sizes_use_the_default_diameter() {
        let mut queue = DragHandleQueue::new(7.0);
        queue.push(Vec3::new(0.0, 0.0, -10.0), 0.0);
        queue.push(Vec3::new(0.0, 0.0, -10.0), -3.0);
        queue.request(Vec3::ZERO, 0.0);
        queue.place_requests(&Mat4::IDENTITY);
        assert!(queue.handles.iter().all(|handle| handle.size == 7.0));
    }
}
