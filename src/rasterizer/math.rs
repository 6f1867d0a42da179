//! Vector math for the pipeline: edge functions and the MVP matrices

use glam::{Mat4, Vec2, Vec3, Vec4};

/// 2D cross product (z of the 3D cross product of two xy vectors)
pub fn cross2(a: Vec2, b: Vec2) -> f32 {
    a.x * b.y - a.y * b.x
}

/// Signed area (times two) of the screen-space triangle v0, v1, v2.
///
/// Screen space grows downward, so a triangle that winds counter-clockwise in
/// NDC comes out negative here.
pub fn signed_area(v0: Vec2, v1: Vec2, v2: Vec2) -> f32 {
    cross2(v1 - v0, v2 - v0)
}

/// Barycentric weights of `p` with respect to (v0, v1, v2), given the
/// triangle's signed area. Sign of the area does not matter; inside points get
/// three non-negative weights either way.
pub fn barycentric(p: Vec2, v0: Vec2, v1: Vec2, v2: Vec2, area: f32) -> Vec3 {
    Vec3::new(
        cross2(v1 - p, v2 - p) / area,
        cross2(v2 - p, v0 - p) / area,
        cross2(v0 - p, v1 - p) / area,
    )
}

/// View matrix looking from `eye` at `target`.
///
/// The camera looks down its local -z; `forward` points from the target back
/// to the eye.
pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
    let forward = (eye - target).normalize_or_zero();
    let right = up.cross(forward).normalize_or_zero();
    let true_up = forward.cross(right);

    Mat4::from_cols(
        Vec4::new(right.x, true_up.x, forward.x, 0.0),
        Vec4::new(right.y, true_up.y, forward.y, 0.0),
        Vec4::new(right.z, true_up.z, forward.z, 0.0),
        Vec4::new(-right.dot(eye), -true_up.dot(eye), -forward.dot(eye), 1.0),
    )
}

/// Symmetric perspective projection, vertical field of view in degrees.
///
/// After the perspective divide a point on the near plane lands at z = +1 and
/// one on the far plane at z = -1: larger depth is nearer.
pub fn perspective(fov_y_degrees: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    let tan_half = (fov_y_degrees.to_radians() / 2.0).tan();
    let depth = far - near;

    Mat4::from_cols(
        Vec4::new(1.0 / (aspect * tan_half), 0.0, 0.0, 0.0),
        Vec4::new(0.0, 1.0 / tan_half, 0.0, 0.0),
        Vec4::new(0.0, 0.0, (far + near) / depth, -1.0),
        Vec4::new(0.0, 0.0, 2.0 * far * near / depth, 0.0),
    )
}

/// Model matrix `T * Rz * Ry * Rx * S`, rotation angles in radians
pub fn model_matrix(translation: Vec3, rotation: Vec3, scale: Vec3) -> Mat4 {
    Mat4::from_translation(translation)
        * Mat4::from_rotation_z(rotation.z)
        * Mat4::from_rotation_y(rotation.y)
        * Mat4::from_rotation_x(rotation.x)
        * Mat4::from_scale(scale)
}

/// Map NDC x/y to pixel coordinates (y flipped: screen rows grow downward)
pub fn ndc_to_screen(ndc: Vec4, width: usize, height: usize) -> Vec4 {
    Vec4::new(
        (ndc.x + 1.0) * 0.5 * width as f32,
        (1.0 - ndc.y) * 0.5 * height as f32,
        ndc.z,
        ndc.w,
    )
}
