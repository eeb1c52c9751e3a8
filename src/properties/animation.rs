pub use gltf_forge_json::animation::{Interpolation, Property as TargetPath};

/// A keyframe animation; owns its channels and samplers through edge fields.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnimationData;

/// Targets a sampler at a node property.
///
/// The sampler edge must point into the owning animation's sampler list; the
/// codec checks membership on write.
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationChannelData {
    /// The node property the channel animates.
    pub target_path: TargetPath,
}

impl Default for AnimationChannelData {
    fn default() -> Self {
        Self {
            target_path: TargetPath::Translation,
        }
    }
}

/// A keyframe graph without a target.
///
/// The input accessor must be `SCALAR` `F32`; the relation between output
/// and input counts follows the interpolation rule.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnimationSamplerData {
    /// The interpolation algorithm.
    pub interpolation: Interpolation,
}
