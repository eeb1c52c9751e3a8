use crate::validation::Checked;
use crate::{accessor, material, Extras, Index, RawExtensions};
use serde_derive::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How a primitive's vertices assemble into geometry, keyed on the wire by
/// the GL draw-mode code.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Mode {
    /// Isolated points (code 0).
    Points = 1,
    /// Independent line segments (code 1).
    Lines,
    /// A closed line loop (code 2).
    LineLoop,
    /// A connected line strip (code 3).
    LineStrip,
    /// Independent triangles (code 4); the wire default.
    #[default]
    Triangles,
    /// A triangle strip (code 5).
    TriangleStrip,
    /// A triangle fan (code 6).
    TriangleFan,
}

wire_code_enum!(Mode, "a GL draw mode code", {
    0 => Points,
    1 => Lines,
    2 => LineLoop,
    3 => LineStrip,
    4 => Triangles,
    5 => TriangleStrip,
    6 => TriangleFan,
});

/// A set of primitives sharing morph target weights.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Mesh {
    /// Optional user-defined name for this object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// The geometry batches of this mesh.
    pub primitives: Vec<Primitive>,

    /// Default weights applied to the morph targets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weights: Option<Vec<f32>>,

    /// Extension specific data.
    #[serde(default, skip_serializing_if = "RawExtensions::is_empty")]
    pub extensions: RawExtensions,

    /// Optional application specific data.
    #[serde(default, skip_serializing_if = "crate::extras_is_null")]
    pub extras: Extras,
}

/// One drawable geometry batch.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Primitive {
    /// Attribute accessors keyed by semantic name, e.g. `POSITION` or
    /// `TEXCOORD_0`.
    pub attributes: BTreeMap<String, Index<accessor::Accessor>>,

    /// The index accessor; vertices draw in attribute order when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indices: Option<Index<accessor::Accessor>>,

    /// The material to render with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<Index<material::Material>>,

    /// The draw mode.
    #[serde(default, skip_serializing_if = "is_primitive_mode_default")]
    pub mode: Checked<Mode>,

    /// Morph targets, each mapping semantics to displacement accessors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub targets: Option<Vec<MorphTarget>>,

    /// Extension specific data.
    #[serde(default, skip_serializing_if = "RawExtensions::is_empty")]
    pub extensions: RawExtensions,

    /// Optional application specific data.
    #[serde(default, skip_serializing_if = "crate::extras_is_null")]
    pub extras: Extras,
}

fn is_primitive_mode_default(mode: &Checked<Mode>) -> bool {
    *mode == Checked::Valid(Mode::Triangles)
}

/// A dictionary mapping semantics to their displacement accessors.
pub type MorphTarget = BTreeMap<String, Index<accessor::Accessor>>;
