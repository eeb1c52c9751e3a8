//! Built-in extensions.
//!
//! Each is a complete, registry-driven implementation of its Khronos
//! specification and doubles as the reference for writing new extensions
//! against [`Extension`](crate::extension::Extension) and
//! [`ExtensionPropertyData`](crate::extension::ExtensionPropertyData).

mod khr_lights_punctual;
mod khr_materials_clearcoat;
mod khr_texture_basisu;

pub use khr_lights_punctual::{LightData, LightKind, LightsPunctual, KHR_LIGHTS_PUNCTUAL};
pub use khr_materials_clearcoat::{
    ClearcoatData, MaterialsClearcoat, KHR_MATERIALS_CLEARCOAT,
};
pub use khr_texture_basisu::{TextureBasisu, KHR_TEXTURE_BASISU};
