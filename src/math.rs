//! Fixed-size vector and matrix helpers for transform and accessor work.

use glam::{Mat4, Quat, Vec3};

/// Composes a column-major transform as `T * R * S`.
pub fn compose(translation: Vec3, rotation: Quat, scale: Vec3) -> Mat4 {
    Mat4::from_scale_rotation_translation(scale, rotation, translation)
}

/// Decomposes a column-major transform into `(translation, rotation, scale)`.
pub fn decompose(matrix: Mat4) -> (Vec3, Quat, Vec3) {
    let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
    (translation, rotation, scale)
}

/// Reads a column-major `[f32; 16]` as stored on the wire.
pub fn matrix_from_wire(values: [f32; 16]) -> Mat4 {
    Mat4::from_cols_array(&values)
}

/// Writes a column-major `[f32; 16]` for the wire.
pub fn matrix_to_wire(matrix: Mat4) -> [f32; 16] {
    matrix.to_cols_array()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn compose_decompose_round_trip() {
        let t = Vec3::new(1.0, 2.0, 3.0);
        let r = Quat::from_rotation_y(0.5);
        let s = Vec3::new(2.0, 2.0, 2.0);
        let (t2, r2, s2) = decompose(compose(t, r, s));
        assert_relative_eq!(t.x, t2.x);
        assert_relative_eq!(t.y, t2.y);
        assert_relative_eq!(t.z, t2.z);
        assert_relative_eq!(r.dot(r2).abs(), 1.0, epsilon = 1e-6);
        assert_relative_eq!(s.x, s2.x, epsilon = 1e-6);
    }
}
