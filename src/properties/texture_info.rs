pub use gltf_forge_json::texture::{MagFilter, MinFilter, WrappingMode};

/// Sampling parameters owned by a texture slot edge.
///
/// Not a first-class property: the record lives in the edge's attribute bag
/// and its lifetime is tied to the edge. Setting a slot to a different
/// texture preserves it; clearing the slot removes both atomically.
#[derive(Clone, Debug, PartialEq)]
pub struct TextureInfo {
    /// The set index of the `TEXCOORD_n` attribute used for sampling.
    pub tex_coord: u32,

    /// Magnification filter.
    pub mag_filter: Option<MagFilter>,

    /// Minification filter.
    pub min_filter: Option<MinFilter>,

    /// `s` wrapping mode.
    pub wrap_s: WrappingMode,

    /// `t` wrapping mode.
    pub wrap_t: WrappingMode,
}

impl Default for TextureInfo {
    fn default() -> Self {
        Self {
            tex_coord: 0,
            mag_filter: None,
            min_filter: None,
            wrap_s: WrappingMode::Repeat,
            wrap_t: WrappingMode::Repeat,
        }
    }
}
