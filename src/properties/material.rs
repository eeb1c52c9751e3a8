pub use gltf_forge_json::material::AlphaMode;

/// The texture slots of a material.
///
/// Each slot is a single-child edge field carrying a
/// [`TextureInfo`](crate::properties::TextureInfo) attribute bag.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TextureSlot {
    /// `pbrMetallicRoughness.baseColorTexture`.
    BaseColor,
    /// `pbrMetallicRoughness.metallicRoughnessTexture`.
    MetallicRoughness,
    /// `normalTexture`.
    Normal,
    /// `occlusionTexture`.
    Occlusion,
    /// `emissiveTexture`.
    Emissive,
}

impl TextureSlot {
    /// All slots in wire emission order.
    pub const ALL: [TextureSlot; 5] = [
        TextureSlot::BaseColor,
        TextureSlot::MetallicRoughness,
        TextureSlot::Normal,
        TextureSlot::Occlusion,
        TextureSlot::Emissive,
    ];

    /// The edge field name of this slot.
    pub fn field(self) -> &'static str {
        match self {
            TextureSlot::BaseColor => "baseColorTexture",
            TextureSlot::MetallicRoughness => "metallicRoughnessTexture",
            TextureSlot::Normal => "normalTexture",
            TextureSlot::Occlusion => "occlusionTexture",
            TextureSlot::Emissive => "emissiveTexture",
        }
    }
}

/// Surface appearance of a primitive.
#[derive(Clone, Debug, PartialEq)]
pub struct MaterialData {
    /// Alpha rendering mode.
    pub alpha_mode: AlphaMode,

    /// Alpha cutoff; meaningful only in `Mask` mode.
    pub alpha_cutoff: f32,

    /// Whether back-face culling is disabled.
    pub double_sided: bool,

    /// RGBA base color multiplier.
    pub base_color_factor: [f32; 4],

    /// Metalness multiplier.
    pub metallic_factor: f32,

    /// Roughness multiplier.
    pub roughness_factor: f32,

    /// RGB emissive color.
    pub emissive_factor: [f32; 3],

    /// Scalar applied to normal-map vectors.
    pub normal_scale: f32,

    /// Strength of the occlusion map.
    pub occlusion_strength: f32,
}

impl Default for MaterialData {
    fn default() -> Self {
        Self {
            alpha_mode: AlphaMode::Opaque,
            alpha_cutoff: 0.5,
            double_sided: false,
            base_color_factor: [1.0; 4],
            metallic_factor: 1.0,
            roughness_factor: 1.0,
            emissive_factor: [0.0; 3],
            normal_scale: 1.0,
            occlusion_strength: 1.0,
        }
    }
}
