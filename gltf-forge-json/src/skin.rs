use crate::{accessor, scene, Extras, Index, RawExtensions};
use serde_derive::{Deserialize, Serialize};

/// Joint nodes plus the matrices binding them to a mesh.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Skin {
    /// Accessor of 4x4 inverse-bind matrices, one per joint.
    ///
    /// Identity matrices are assumed when omitted.
    #[serde(
        default,
        rename = "inverseBindMatrices",
        skip_serializing_if = "Option::is_none"
    )]
    pub inverse_bind_matrices: Option<Index<accessor::Accessor>>,

    /// Nodes acting as joints, in matrix order.
    pub joints: Vec<Index<scene::Node>>,

    /// Optional user-defined name for this object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// The common ancestor of the joints; joint transforms resolve against
    /// the scene root when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skeleton: Option<Index<scene::Node>>,

    /// Extension specific data.
    #[serde(default, skip_serializing_if = "RawExtensions::is_empty")]
    pub extensions: RawExtensions,

    /// Optional application specific data.
    #[serde(default, skip_serializing_if = "crate::extras_is_null")]
    pub extras: Extras,
}
