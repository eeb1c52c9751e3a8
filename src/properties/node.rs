use glam::{Mat4, Quat, Vec3};

/// A transform in the node hierarchy.
///
/// The transform is always stored decomposed; assigning a matrix through
/// [`set_matrix`](NodeData::set_matrix) decomposes it immediately, so TRS is
/// the single source of truth.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeData {
    /// Translation along X, Y, Z.
    pub translation: Vec3,

    /// Unit quaternion rotation.
    pub rotation: Quat,

    /// Non-uniform scale.
    pub scale: Vec3,

    /// Instantiated morph target weights.
    pub weights: Vec<f32>,
}

impl Default for NodeData {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            weights: Vec::new(),
        }
    }
}

impl NodeData {
    /// The local transform composed as `T * R * S`.
    pub fn matrix(&self) -> Mat4 {
        crate::math::compose(self.translation, self.rotation, self.scale)
    }

    /// Replaces the TRS by decomposing `matrix`.
    pub fn set_matrix(&mut self, matrix: Mat4) {
        let (translation, rotation, scale) = crate::math::decompose(matrix);
        self.translation = translation;
        self.rotation = rotation;
        self.scale = scale;
    }
}
