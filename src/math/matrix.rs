use glam::{Mat3, Mat4, Vec3, Vec4};

/// `m * v`.
#[inline]
pub fn apply_matrix(m: &Mat4, v: Vec4) -> Vec4 {
    *m * v
}

/// `transpose(m) * v`.
///
/// Equivalent to treating `v` as a row vector multiplied from the left, which
/// is how plane equations are carried through a point transform.
#[inline]
pub fn apply_matrix_transpose(m: &Mat4, v: Vec4) -> Vec4 {
    Vec4::new(
        m.x_axis.dot(v),
        m.y_axis.dot(v),
        m.z_axis.dot(v),
        m.w_axis.dot(v),
    )
}

/// Homogeneous divide. A zero `w` produces non-finite components rather than
/// panicking; callers that care test `w` first.
#[inline]
pub fn perspective_divide(p: Vec4) -> Vec3 {
    p.truncate() / p.w
}

pub fn perspective_divide_in_place(p: &mut Vec4) {
    let w = p.w;
    p.x /= w;
    p.y /= w;
    p.z /= w;
    p.w = 1.0;
}

#[inline]
pub fn mult_matrices(a: &Mat4, b: &Mat4) -> Mat4 {
    *a * *b
}

#[inline]
pub fn build_identity() -> Mat4 {
    Mat4::IDENTITY
}

pub fn build_translation_matrix(x: f32, y: f32, z: f32) -> Mat4 {
    Mat4::from_cols_array(&[
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        x, y, z, 1.0,
    ])
}

/// glRotate: `angle` in degrees around the axis `(x, y, z)`, which is
/// normalised first. A zero-length axis yields the identity.
pub fn build_rotation_matrix(angle: f32, x: f32, y: f32, z: f32) -> Mat4 {
    let len = (x * x + y * y + z * z).sqrt();
    if len == 0.0 {
        return Mat4::IDENTITY;
    }
    let (x, y, z) = (x / len, y / len, z / len);
    let (s, c) = angle.to_radians().sin_cos();
    let t = 1.0 - c;

    Mat4::from_cols_array(&[
        x * x * t + c,
        y * x * t + z * s,
        x * z * t - y * s,
        0.0,
        x * y * t - z * s,
        y * y * t + c,
        y * z * t + x * s,
        0.0,
        x * z * t + y * s,
        y * z * t - x * s,
        z * z * t + c,
        0.0,
        0.0,
        0.0,
        0.0,
        1.0,
    ])
}

/// Post-multiplies `m` by a glRotate matrix, like calling glRotate with `m`
/// on top of the matrix stack.
pub fn apply_rotation_matrix(m: &mut Mat4, angle: f32, x: f32, y: f32, z: f32) {
    *m = *m * build_rotation_matrix(angle, x, y, z);
}

/// glOrtho. Degenerate extents divide by zero exactly like the classical
/// formula does.
pub fn build_ortho_matrix(
    left: f32,
    right: f32,
    bottom: f32,
    top: f32,
    z_near: f32,
    z_far: f32,
) -> Mat4 {
    let rl = right - left;
    let tb = top - bottom;
    let fnr = z_far - z_near;

    Mat4::from_cols_array(&[
        2.0 / rl,
        0.0,
        0.0,
        0.0,
        0.0,
        2.0 / tb,
        0.0,
        0.0,
        0.0,
        0.0,
        -2.0 / fnr,
        0.0,
        -(right + left) / rl,
        -(top + bottom) / tb,
        -(z_far + z_near) / fnr,
        1.0,
    ])
}

/// glFrustum.
pub fn build_frustum_matrix(
    left: f32,
    right: f32,
    bottom: f32,
    top: f32,
    z_near: f32,
    z_far: f32,
) -> Mat4 {
    let rl = right - left;
    let tb = top - bottom;
    let fnr = z_far - z_near;

    Mat4::from_cols_array(&[
        2.0 * z_near / rl,
        0.0,
        0.0,
        0.0,
        0.0,
        2.0 * z_near / tb,
        0.0,
        0.0,
        (right + left) / rl,
        (top + bottom) / tb,
        -(z_far + z_near) / fnr,
        -1.0,
        0.0,
        0.0,
        -2.0 * z_far * z_near / fnr,
        0.0,
    ])
}

/// Inverse-transpose of the upper-left 3x3 of `m`, used to carry normals
/// through non-uniform scale. A singular 3x3 has no inverse; the plain
/// upper-left block is returned instead so lighting degrades rather than
/// turning into NaN.
pub fn normal_matrix(m: &Mat4) -> Mat3 {
    let linear = Mat3::from_mat4(*m);
    let det = linear.determinant();
    if det == 0.0 || !det.is_finite() {
        return linear;
    }
    linear.inverse().transpose()
}

/// True when the linear part flips handedness, which reverses the screen
/// winding of every triangle drawn through it.
#[inline]
pub fn is_mirroring(linear: &Mat3) -> bool {
    linear.determinant() < 0.0
}
