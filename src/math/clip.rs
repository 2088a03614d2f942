use glam::Vec4;

/// A triangle clipped by six planes gains at most one vertex per plane, so
/// the polygon never exceeds nine vertices and fans into at most seven
/// triangles.
const MAX_POLYGON_VERTICES: usize = 9;
pub const MAX_CLIPPED_TRIANGLES: usize = MAX_POLYGON_VERTICES - 2;

#[derive(Debug, Clone, Copy)]
struct Polygon {
    verts: [Vec4; MAX_POLYGON_VERTICES],
    len: usize,
}

impl Polygon {
    fn from_triangle(tri: &[Vec4; 3]) -> Self {
        let mut verts = [Vec4::ZERO; MAX_POLYGON_VERTICES];
        verts[..3].copy_from_slice(tri);
        Self { verts, len: 3 }
    }

    fn empty() -> Self {
        Self {
            verts: [Vec4::ZERO; MAX_POLYGON_VERTICES],
            len: 0,
        }
    }

    fn push(&mut self, v: Vec4) {
        debug_assert!(self.len < MAX_POLYGON_VERTICES);
        self.verts[self.len] = v;
        self.len += 1;
    }

    fn as_slice(&self) -> &[Vec4] {
        &self.verts[..self.len]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClipPlane {
    Left,
    Right,
    Bottom,
    Top,
    Near,
    Far,
}

impl ClipPlane {
    const ALL: [ClipPlane; 6] = [
        ClipPlane::Left,
        ClipPlane::Right,
        ClipPlane::Bottom,
        ClipPlane::Top,
        ClipPlane::Near,
        ClipPlane::Far,
    ];

    /// Signed distance; non-negative means inside.
    #[inline]
    fn distance(self, v: Vec4) -> f32 {
        match self {
            ClipPlane::Left => v.w + v.x,
            ClipPlane::Right => v.w - v.x,
            ClipPlane::Bottom => v.w + v.y,
            ClipPlane::Top => v.w - v.y,
            ClipPlane::Near => v.w + v.z,
            ClipPlane::Far => v.w - v.z,
        }
    }
}

/// Output of [`clip_triangle`]: zero or more clip-space triangles.
#[derive(Debug, Clone, Copy)]
pub struct ClippedTriangles {
    tris: [[Vec4; 3]; MAX_CLIPPED_TRIANGLES],
    len: usize,
}

impl ClippedTriangles {
    fn empty() -> Self {
        Self {
            tris: [[Vec4::ZERO; 3]; MAX_CLIPPED_TRIANGLES],
            len: 0,
        }
    }

    fn push(&mut self, tri: [Vec4; 3]) {
        self.tris[self.len] = tri;
        self.len += 1;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[[Vec4; 3]] {
        &self.tris[..self.len]
    }

    pub fn iter(&self) -> impl Iterator<Item = &[Vec4; 3]> {
        self.as_slice().iter()
    }
}

/// Clips a clip-space triangle against `-w <= x, y, z <= w`.
///
/// The planes are applied one after another to the running polygon and the
/// survivor is fanned from its first vertex, so winding is preserved. A
/// triangle entirely inside comes back bit-for-bit unchanged; one entirely
/// outside comes back empty.
pub fn clip_triangle(tri: &[Vec4; 3]) -> ClippedTriangles {
    let mut out = ClippedTriangles::empty();

    let fully_inside = ClipPlane::ALL
        .iter()
        .all(|plane| tri.iter().all(|v| plane.distance(*v) >= 0.0));
    if fully_inside {
        out.push(*tri);
        return out;
    }

    let mut poly = Polygon::from_triangle(tri);
    for plane in ClipPlane::ALL {
        poly = clip_against(&poly, plane);
        if poly.len < 3 {
            return out;
        }
    }

    let verts = poly.as_slice();
    for i in 1..verts.len() - 1 {
        out.push([verts[0], verts[i], verts[i + 1]]);
    }
    out
}

fn clip_against(input: &Polygon, plane: ClipPlane) -> Polygon {
    let mut output = Polygon::empty();
    let verts = input.as_slice();
    let n = verts.len();

    for i in 0..n {
        let cur = verts[i];
        let prev = verts[(i + n - 1) % n];
        let d_cur = plane.distance(cur);
        let d_prev = plane.distance(prev);

        if d_cur >= 0.0 {
            if d_prev < 0.0 {
                output.push(intersect(prev, cur, d_prev, d_cur));
            }
            output.push(cur);
        } else if d_prev >= 0.0 {
            output.push(intersect(prev, cur, d_prev, d_cur));
        }
    }
    output
}

#[inline]
fn intersect(a: Vec4, b: Vec4, d_a: f32, d_b: f32) -> Vec4 {
    let t = d_a / (d_a - d_b);
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f32, y: f32, z: f32) -> Vec4 {
        Vec4::new(x, y, z, 1.0)
    }

    fn area_xy(tri: &[Vec4; 3]) -> f32 {
        let a = tri[0].truncate() / tri[0].w;
        let b = tri[1].truncate() / tri[1].w;
        let c = tri[2].truncate() / tri[2].w;
        0.5 * ((b.x - a.x) * (c.y - a.y) - (c.x - a.x) * (b.y - a.y))
    }

    fn inside(v: Vec4) -> bool {
        ClipPlane::ALL.iter().all(|plane| plane.distance(v) >= -1e-5)
    }

    #[test]
    fn inside_triangle_is_returned_unchanged() {
        let tri = [p(-0.5, -0.5, 0.0), p(0.5, -0.5, 0.1), p(0.0, 0.5, -0.2)];
        let out = clip_triangle(&tri);
        assert_eq!(out.len(), 1);
        assert_eq!(out.as_slice()[0], tri);
    }

    #[test]
    fn outside_triangle_is_dropped() {
        let tri = [p(2.0, 0.0, 0.0), p(3.0, 0.0, 0.0), p(2.5, 1.0, 0.0)];
        assert!(clip_triangle(&tri).is_empty());
    }

    #[test]
    fn triangle_behind_near_plane_is_dropped() {
        let tri = [p(0.0, 0.0, -2.0), p(0.5, 0.0, -3.0), p(0.0, 0.5, -2.5)];
        assert!(clip_triangle(&tri).is_empty());
    }

    #[test]
    fn corner_cuts_yield_one_or_two_triangles() {
        let tri = [p(0.0, 0.0, 0.0), p(3.0, 0.0, 0.0), p(0.0, 0.5, 0.0)];
        let out = clip_triangle(&tri);
        assert_eq!(out.len(), 2, "a triangle cut across one corner leaves a quad");

        let tip = [p(0.5, 0.0, 0.0), p(3.0, -0.5, 0.0), p(3.0, 0.5, 0.0)];
        let out = clip_triangle(&tip);
        assert_eq!(out.len(), 1);
        assert!(out.iter().flatten().all(|v| inside(*v)));
    }

    #[test]
    fn straddling_triangle_covers_exactly_the_inside_region() {
        // Right triangle with legs of 2; inside the unit square it covers the
        // whole [0,1]^2 quadrant since x + y <= 2 holds there.
        let tri = [p(0.0, 0.0, 0.0), p(2.0, 0.0, 0.0), p(0.0, 2.0, 0.0)];
        let out = clip_triangle(&tri);

        assert!(!out.is_empty());
        assert!(out.iter().flatten().all(|v| inside(*v)));
        let area: f32 = out.iter().map(area_xy).sum();
        assert!((area - 1.0).abs() < 1e-5, "clipped area {area}");
    }

    #[test]
    fn clipping_preserves_winding() {
        let tri = [p(-0.5, -0.5, 0.0), p(1.5, -0.5, 0.0), p(-0.5, 0.5, 0.0)];
        let out = clip_triangle(&tri);
        assert!(out.iter().all(|clipped| area_xy(clipped) >= 0.0));
        assert!(out.iter().map(area_xy).sum::<f32>() > 0.0);
    }

    #[test]
    fn homogeneous_vertices_clip_in_clip_space() {
        // Same triangle scaled by w = 2 must clip the same way after divide.
        let tri = [
            Vec4::new(0.0, 0.0, 0.0, 2.0),
            Vec4::new(4.0, 0.0, 0.0, 2.0),
            Vec4::new(0.0, 4.0, 0.0, 2.0),
        ];
        let area: f32 = clip_triangle(&tri).iter().map(area_xy).sum();
        assert!((area - 1.0).abs() < 1e-5);
    }
}
