use crate::validation::Checked;
use crate::{accessor, scene, Extras, Index, RawExtensions};
use serde_derive::{Deserialize, Serialize};

/// How keyframe values blend between samples.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Interpolation {
    /// Straight-line blending; slerp when the target is a rotation. The
    /// wire default.
    #[default]
    Linear = 1,

    /// Hold each keyframe's value until the next one.
    Step,

    /// Cubic splines: each keyframe stores an in-tangent, the vertex, and
    /// an out-tangent, so the output is three times the input length.
    CubicSpline,
}

wire_str_enum!(Interpolation, "an interpolation name", {
    "LINEAR" => Linear,
    "STEP" => Step,
    "CUBICSPLINE" => CubicSpline,
});

/// Which node property a channel animates.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Property {
    /// The node's translation.
    Translation = 1,
    /// The node's rotation quaternion.
    Rotation,
    /// The node's scale.
    Scale,
    /// The morph target weights of the node's mesh.
    MorphTargetWeights,
}

wire_str_enum!(Property, "an animated property name", {
    "translation" => Translation,
    "rotation" => Rotation,
    "scale" => Scale,
    "weights" => MorphTargetWeights,
});

/// A keyframe animation.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Animation {
    /// The channels, each pointing one of this animation's samplers at a
    /// node property. Two channels must not share a target.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub channels: Vec<Channel>,

    /// Optional user-defined name for this object.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// The keyframe graphs the channels draw from.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub samplers: Vec<Sampler>,

    /// Extension specific data.
    #[serde(skip_serializing_if = "RawExtensions::is_empty")]
    pub extensions: RawExtensions,

    /// Optional application specific data.
    #[serde(skip_serializing_if = "crate::extras_is_null")]
    pub extras: Extras,
}

/// Points a sampler at a node property.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Channel {
    /// Index into the owning animation's sampler list.
    pub sampler: Index<Sampler>,

    /// What the sampled values drive.
    pub target: Target,

    /// Extension specific data.
    #[serde(default, skip_serializing_if = "RawExtensions::is_empty")]
    pub extensions: RawExtensions,

    /// Optional application specific data.
    #[serde(default, skip_serializing_if = "crate::extras_is_null")]
    pub extras: Extras,
}

/// A node property addressed by a channel.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Target {
    /// The node being animated.
    pub node: Index<scene::Node>,

    /// The property of that node.
    pub path: Checked<Property>,

    /// Extension specific data.
    #[serde(default, skip_serializing_if = "RawExtensions::is_empty")]
    pub extensions: RawExtensions,

    /// Optional application specific data.
    #[serde(default, skip_serializing_if = "crate::extras_is_null")]
    pub extras: Extras,
}

/// A keyframe graph without a target: input times, output values, and the
/// blending rule between them.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Sampler {
    /// Keyframe times in seconds; a scalar float accessor.
    pub input: Index<accessor::Accessor>,

    /// The blending rule.
    #[serde(default, skip_serializing_if = "is_interpolation_default")]
    pub interpolation: Checked<Interpolation>,

    /// Keyframe values.
    pub output: Index<accessor::Accessor>,

    /// Extension specific data.
    #[serde(default, skip_serializing_if = "RawExtensions::is_empty")]
    pub extensions: RawExtensions,

    /// Optional application specific data.
    #[serde(default, skip_serializing_if = "crate::extras_is_null")]
    pub extras: Extras,
}

fn is_interpolation_default(interpolation: &Checked<Interpolation>) -> bool {
    *interpolation == Checked::Valid(Interpolation::Linear)
}
