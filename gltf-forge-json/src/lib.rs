//! (De)serializable data structures matching the glTF 2.0 JSON text.
//!
//! These types describe the wire format only. The `gltf-forge` crate builds
//! its mutable property graph from a deserialized [`Root`] and lowers the
//! graph back into one when writing.

#[macro_use]
mod macros;

/// Contains `Accessor` and other related data structures.
pub mod accessor;

/// Contains `Animation` and other related data structures.
pub mod animation;

/// Contains `Asset` metadata.
pub mod asset;

/// Contains `Buffer`, `View`, and other related data structures.
pub mod buffer;

/// Contains `Camera` and other related data structures.
pub mod camera;

/// Contains `Image` and other related data structures.
pub mod image;

/// Contains `Material` and other related data structures.
pub mod material;

/// Contains `Mesh` and other related data structures.
pub mod mesh;

/// Contains `Root`.
pub mod root;

/// Contains `Scene`, `Node`, and other related data structures.
pub mod scene;

/// Contains `Skin` and other related data structures.
pub mod skin;

/// Contains `Texture`, `Sampler`, and other related data structures.
pub mod texture;

/// Contains `Checked`, the tolerant enum decoding wrapper.
pub mod validation;

pub use accessor::Accessor;
pub use animation::Animation;
pub use asset::Asset;
pub use buffer::Buffer;
pub use camera::Camera;
pub use image::Image;
pub use material::Material;
pub use mesh::Mesh;
pub use root::{Index, Root};
pub use scene::{Node, Scene};
pub use skin::Skin;
pub use texture::Texture;
pub use validation::Checked;

pub use serde_json::Error;
pub use serde_json::{from_reader, from_slice, from_str, from_value};

/// Opaque application specific data, preserved on round-trip.
pub type Extras = serde_json::Value;

/// Raw extension fragments keyed by extension name.
///
/// Interpretation belongs to the extension registry of the consuming crate;
/// fragments for unregistered extensions survive round-trip untouched.
pub type RawExtensions = serde_json::Map<String, serde_json::Value>;

pub(crate) fn extras_is_null(extras: &Extras) -> bool {
    extras.is_null()
}
