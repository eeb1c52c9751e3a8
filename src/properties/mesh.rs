pub use gltf_forge_json::mesh::Mode;

/// A collection of primitives.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    /// Default weights applied to the morph targets of every primitive.
    pub weights: Vec<f32>,
}

/// One drawable geometry batch.
///
/// Indices, attribute accessors, the material, and morph targets are edge
/// fields; only the rendering mode is a value attribute.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PrimitiveData {
    /// The type of primitives to render.
    pub mode: Mode,
}

/// An additive displacement layer over a primitive's attribute accessors.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PrimitiveTargetData;
