use crate::validation::Checked;
use crate::{texture, Extras, RawExtensions};
use serde_derive::{Deserialize, Serialize};

/// How a material's alpha value affects rendering.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum AlphaMode {
    /// Alpha is ignored; output is fully opaque. The wire default.
    #[default]
    Opaque = 1,

    /// Output is fully opaque or fully transparent, decided by comparing
    /// alpha against the cutoff.
    Mask,

    /// Alpha composites the output over the background; the cutoff is
    /// ignored.
    Blend,
}

wire_str_enum!(AlphaMode, "an alpha mode name", {
    "OPAQUE" => Opaque,
    "MASK" => Mask,
    "BLEND" => Blend,
});

/// Surface appearance applied by primitives.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Material {
    /// Threshold compared against alpha in `Mask` mode; meaningless
    /// otherwise.
    #[serde(rename = "alphaCutoff", skip_serializing_if = "Option::is_none")]
    pub alpha_cutoff: Option<f32>,

    /// How alpha affects rendering.
    #[serde(rename = "alphaMode", skip_serializing_if = "is_alpha_mode_default")]
    pub alpha_mode: Checked<AlphaMode>,

    /// Disables back-face culling when set.
    #[serde(rename = "doubleSided", skip_serializing_if = "is_false")]
    pub double_sided: bool,

    /// Optional user-defined name for this object.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Parameter values defining the metallic-roughness material model.
    #[serde(
        rename = "pbrMetallicRoughness",
        skip_serializing_if = "PbrMetallicRoughness::is_default"
    )]
    pub pbr_metallic_roughness: PbrMetallicRoughness,

    /// Tangent-space normal map.
    #[serde(rename = "normalTexture", skip_serializing_if = "Option::is_none")]
    pub normal_texture: Option<NormalTexture>,

    /// Ambient occlusion map, sampled from the R channel.
    #[serde(rename = "occlusionTexture", skip_serializing_if = "Option::is_none")]
    pub occlusion_texture: Option<OcclusionTexture>,

    /// Map of self-illumination color and intensity.
    #[serde(rename = "emissiveTexture", skip_serializing_if = "Option::is_none")]
    pub emissive_texture: Option<texture::Info>,

    /// Uniform self-illumination color.
    #[serde(rename = "emissiveFactor", skip_serializing_if = "is_zero3")]
    pub emissive_factor: [f32; 3],

    /// Extension specific data.
    #[serde(skip_serializing_if = "RawExtensions::is_empty")]
    pub extensions: RawExtensions,

    /// Optional application specific data.
    #[serde(skip_serializing_if = "crate::extras_is_null")]
    pub extras: Extras,
}

fn is_alpha_mode_default(mode: &Checked<AlphaMode>) -> bool {
    *mode == Checked::Valid(AlphaMode::Opaque)
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_zero3(value: &[f32; 3]) -> bool {
    *value == [0.0; 3]
}

fn is_one(value: &f32) -> bool {
    *value == 1.0
}

fn is_one4(value: &[f32; 4]) -> bool {
    *value == [1.0; 4]
}

/// The metallic-roughness parameter block of the PBR model.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct PbrMetallicRoughness {
    /// Uniform base color multiplier.
    #[serde(rename = "baseColorFactor", skip_serializing_if = "is_one4")]
    pub base_color_factor: [f32; 4],

    /// Base color map.
    #[serde(rename = "baseColorTexture", skip_serializing_if = "Option::is_none")]
    pub base_color_texture: Option<texture::Info>,

    /// Uniform metalness multiplier.
    #[serde(rename = "metallicFactor", skip_serializing_if = "is_one")]
    pub metallic_factor: f32,

    /// Uniform roughness multiplier.
    #[serde(rename = "roughnessFactor", skip_serializing_if = "is_one")]
    pub roughness_factor: f32,

    /// Combined map with metalness in B and roughness in G.
    #[serde(
        rename = "metallicRoughnessTexture",
        skip_serializing_if = "Option::is_none"
    )]
    pub metallic_roughness_texture: Option<texture::Info>,

    /// Extension specific data.
    #[serde(skip_serializing_if = "RawExtensions::is_empty")]
    pub extensions: RawExtensions,

    /// Optional application specific data.
    #[serde(skip_serializing_if = "crate::extras_is_null")]
    pub extras: Extras,
}

impl Default for PbrMetallicRoughness {
    fn default() -> Self {
        Self {
            base_color_factor: [1.0; 4],
            base_color_texture: None,
            metallic_factor: 1.0,
            roughness_factor: 1.0,
            metallic_roughness_texture: None,
            extensions: Default::default(),
            extras: Default::default(),
        }
    }
}

impl PbrMetallicRoughness {
    /// Returns true when every field holds its glTF default.
    pub fn is_default(&self) -> bool {
        self.base_color_factor == [1.0; 4]
            && self.base_color_texture.is_none()
            && self.metallic_factor == 1.0
            && self.roughness_factor == 1.0
            && self.metallic_roughness_texture.is_none()
            && self.extensions.is_empty()
            && self.extras.is_null()
    }
}

/// A texture reference scaled for normal mapping.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct NormalTexture {
    /// The referenced texture.
    pub index: crate::Index<texture::Texture>,

    /// Multiplier applied to the sampled normal vectors.
    #[serde(default = "one", skip_serializing_if = "is_one")]
    pub scale: f32,

    /// Which `TEXCOORD_n` attribute supplies the co-ordinates.
    #[serde(default, rename = "texCoord", skip_serializing_if = "is_zero")]
    pub tex_coord: u32,

    /// Extension specific data.
    #[serde(default, skip_serializing_if = "RawExtensions::is_empty")]
    pub extensions: RawExtensions,

    /// Optional application specific data.
    #[serde(default, skip_serializing_if = "crate::extras_is_null")]
    pub extras: Extras,
}

/// A texture reference weighted for occlusion.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct OcclusionTexture {
    /// The referenced texture.
    pub index: crate::Index<texture::Texture>,

    /// How strongly the sampled occlusion applies.
    #[serde(default = "one", skip_serializing_if = "is_one")]
    pub strength: f32,

    /// Which `TEXCOORD_n` attribute supplies the co-ordinates.
    #[serde(default, rename = "texCoord", skip_serializing_if = "is_zero")]
    pub tex_coord: u32,

    /// Extension specific data.
    #[serde(default, skip_serializing_if = "RawExtensions::is_empty")]
    pub extensions: RawExtensions,

    /// Optional application specific data.
    #[serde(default, skip_serializing_if = "crate::extras_is_null")]
    pub extras: Extras,
}

fn one() -> f32 {
    1.0
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}
