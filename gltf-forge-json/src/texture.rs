use crate::validation::Checked;
use crate::{image, Extras, Index, RawExtensions};
use serde_derive::{Deserialize, Serialize};

/// Magnification filter, keyed on the wire by its GL enumeration code.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MagFilter {
    /// Nearest-texel sampling (code 9728).
    Nearest = 1,
    /// Bilinear sampling (code 9729).
    Linear,
}

wire_code_enum!(MagFilter, "a GL magnification filter code", {
    9728 => Nearest,
    9729 => Linear,
});

/// Minification filter, keyed on the wire by its GL enumeration code.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MinFilter {
    /// Nearest-texel sampling (code 9728).
    Nearest = 1,
    /// Bilinear sampling (code 9729).
    Linear,
    /// Nearest texel of the nearest mip level (code 9984).
    NearestMipmapNearest,
    /// Bilinear on the nearest mip level (code 9985).
    LinearMipmapNearest,
    /// Nearest texel, blended between mip levels (code 9986).
    NearestMipmapLinear,
    /// Trilinear sampling (code 9987).
    LinearMipmapLinear,
}

wire_code_enum!(MinFilter, "a GL minification filter code", {
    9728 => Nearest,
    9729 => Linear,
    9984 => NearestMipmapNearest,
    9985 => LinearMipmapNearest,
    9986 => NearestMipmapLinear,
    9987 => LinearMipmapLinear,
});

/// Texture co-ordinate wrapping mode, keyed by its GL enumeration code.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum WrappingMode {
    /// Clamp to the edge texel (code 33071).
    ClampToEdge = 1,
    /// Mirror on every repeat (code 33648).
    MirroredRepeat,
    /// Tile (code 10497); the wire default.
    #[default]
    Repeat,
}

wire_code_enum!(WrappingMode, "a GL wrapping mode code", {
    33071 => ClampToEdge,
    33648 => MirroredRepeat,
    10497 => Repeat,
});

/// Filtering and wrapping parameters shared by textures.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Sampler {
    /// Magnification filter.
    #[serde(rename = "magFilter", skip_serializing_if = "Option::is_none")]
    pub mag_filter: Option<Checked<MagFilter>>,

    /// Minification filter.
    #[serde(rename = "minFilter", skip_serializing_if = "Option::is_none")]
    pub min_filter: Option<Checked<MinFilter>>,

    /// Optional user-defined name for this object.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Wrapping along `s`.
    #[serde(rename = "wrapS", skip_serializing_if = "is_wrap_default")]
    pub wrap_s: Checked<WrappingMode>,

    /// Wrapping along `t`.
    #[serde(rename = "wrapT", skip_serializing_if = "is_wrap_default")]
    pub wrap_t: Checked<WrappingMode>,

    /// Extension specific data.
    #[serde(skip_serializing_if = "RawExtensions::is_empty")]
    pub extensions: RawExtensions,

    /// Optional application specific data.
    #[serde(skip_serializing_if = "crate::extras_is_null")]
    pub extras: Extras,
}

fn is_wrap_default(wrap: &Checked<WrappingMode>) -> bool {
    *wrap == Checked::Valid(WrappingMode::Repeat)
}

/// Pairs an image with a sampler.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Texture {
    /// Optional user-defined name for this object.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// The sampler to apply; a repeat-wrapping auto-filtering default when
    /// omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sampler: Option<Index<Sampler>>,

    /// The image sampled by this texture.
    ///
    /// Omitted when an extension supplies the image instead, e.g.
    /// `KHR_texture_basisu`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<Index<image::Image>>,

    /// Extension specific data.
    #[serde(skip_serializing_if = "RawExtensions::is_empty")]
    pub extensions: RawExtensions,

    /// Optional application specific data.
    #[serde(skip_serializing_if = "crate::extras_is_null")]
    pub extras: Extras,
}

/// Reference to a `Texture` plus the texture co-ordinate set to sample
/// with.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Info {
    /// The referenced texture.
    pub index: Index<Texture>,

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

fn is_zero(value: &u32) -> bool {
    *value == 0
}
