use crate::{camera, mesh, skin, Extras, Index, RawExtensions};
use serde_derive::{Deserialize, Serialize};

/// One transform in the scene hierarchy.
///
/// A node carries either a `matrix` or any combination of TRS fields; the
/// matrix composes as `T * R * S`, and the transform is the identity when
/// everything is omitted.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Node {
    /// The camera instantiated at this node.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera: Option<Index<camera::Camera>>,

    /// Child nodes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Index<Node>>>,

    /// Column-major 4x4 local transform; exclusive with the TRS fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matrix: Option<[f32; 16]>,

    /// The mesh instantiated at this node.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mesh: Option<Index<mesh::Mesh>>,

    /// Optional user-defined name for this object.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Unit quaternion rotation as `(x, y, z, w)`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<[f32; 4]>,

    /// Non-uniform scale.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<[f32; 3]>,

    /// Translation along X, Y, Z.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation: Option<[f32; 3]>,

    /// The skin deforming this node's mesh.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skin: Option<Index<skin::Skin>>,

    /// Morph target weights overriding the mesh defaults.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weights: Option<Vec<f32>>,

    /// Extension specific data.
    #[serde(skip_serializing_if = "RawExtensions::is_empty")]
    pub extensions: RawExtensions,

    /// Optional application specific data.
    #[serde(skip_serializing_if = "crate::extras_is_null")]
    pub extras: Extras,
}

/// A renderable set of root nodes.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Scene {
    /// Optional user-defined name for this object.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// The hierarchy roots of this scene.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<Index<Node>>,

    /// Extension specific data.
    #[serde(skip_serializing_if = "RawExtensions::is_empty")]
    pub extensions: RawExtensions,

    /// Optional application specific data.
    #[serde(skip_serializing_if = "crate::extras_is_null")]
    pub extras: Extras,
}
