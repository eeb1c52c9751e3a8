use crate::{
    accessor, animation, buffer, camera, image, material, mesh, scene, skin, texture, Asset,
    Extras, RawExtensions,
};
use serde::{de, ser};
use serde_derive::{Deserialize, Serialize};
use std::io;
use std::{fmt, marker};

/// Represents an offset into an array of type `T` owned by the root glTF
/// object.
pub struct Index<T>(u32, marker::PhantomData<fn() -> T>);

/// The top-level wire record tying the index spaces together.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Root {
    /// Every accessor in the asset.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub accessors: Vec<accessor::Accessor>,

    /// Every keyframe animation in the asset.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub animations: Vec<animation::Animation>,

    /// Provenance and version metadata.
    pub asset: Asset,

    /// Every buffer in the asset.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub buffers: Vec<buffer::Buffer>,

    /// Every buffer view in the asset.
    #[serde(rename = "bufferViews", skip_serializing_if = "Vec::is_empty")]
    pub buffer_views: Vec<buffer::View>,

    /// Every camera in the asset.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cameras: Vec<camera::Camera>,

    /// Extensions appearing anywhere in the asset.
    #[serde(rename = "extensionsUsed", skip_serializing_if = "Vec::is_empty")]
    pub extensions_used: Vec<String>,

    /// The subset of extensions a loader cannot do without.
    #[serde(rename = "extensionsRequired", skip_serializing_if = "Vec::is_empty")]
    pub extensions_required: Vec<String>,

    /// Every image in the asset.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<image::Image>,

    /// Every material in the asset.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub materials: Vec<material::Material>,

    /// Every mesh in the asset.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub meshes: Vec<mesh::Mesh>,

    /// Every node in the asset.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<scene::Node>,

    /// Every texture sampler in the asset.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub samplers: Vec<texture::Sampler>,

    /// The scene to present first.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scene: Option<Index<scene::Scene>>,

    /// Every scene in the asset.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub scenes: Vec<scene::Scene>,

    /// Every skin in the asset.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skins: Vec<skin::Skin>,

    /// Every texture in the asset.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub textures: Vec<texture::Texture>,

    /// Extension specific data.
    #[serde(skip_serializing_if = "RawExtensions::is_empty")]
    pub extensions: RawExtensions,

    /// Optional application specific data.
    #[serde(skip_serializing_if = "crate::extras_is_null")]
    pub extras: Extras,
}

impl Root {
    /// Deserialize from a JSON string slice.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(str_: &str) -> Result<Self, crate::Error> {
        serde_json::from_str(str_)
    }

    /// Deserialize from a JSON byte slice.
    pub fn from_slice(slice: &[u8]) -> Result<Self, crate::Error> {
        serde_json::from_slice(slice)
    }

    /// Deserialize from a stream of JSON.
    pub fn from_reader<R>(reader: R) -> Result<Self, crate::Error>
    where
        R: io::Read,
    {
        serde_json::from_reader(reader)
    }

    /// Serialize as a `String` of JSON.
    #[allow(clippy::inherent_to_string)]
    pub fn to_string(&self) -> Result<String, crate::Error> {
        serde_json::to_string(self)
    }

    /// Serialize as a JSON byte vector.
    pub fn to_vec(&self) -> Result<Vec<u8>, crate::Error> {
        serde_json::to_vec(self)
    }

    /// Serialize as a pretty-printed JSON byte vector.
    pub fn to_vec_pretty(&self) -> Result<Vec<u8>, crate::Error> {
        serde_json::to_vec_pretty(self)
    }
}

impl<T> Index<T> {
    /// Creates a new `Index` representing an offset into an array containing
    /// `T`.
    pub fn new(value: u32) -> Self {
        Index(value, marker::PhantomData)
    }

    /// Returns the internal offset value.
    pub fn value(&self) -> usize {
        self.0 as usize
    }
}

impl<T> Clone for Index<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Index<T> {}

impl<T> PartialEq for Index<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T> Eq for Index<T> {}

impl<T> ser::Serialize for Index<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: ser::Serializer,
    {
        serializer.serialize_u64(u64::from(self.0))
    }
}

impl<'de, T> de::Deserialize<'de> for Index<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        struct Visitor<T>(marker::PhantomData<T>);
        impl<'de, T> de::Visitor<'de> for Visitor<T> {
            type Value = Index<T>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("index into child of root")
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Index::new(value as u32))
            }
        }
        deserializer.deserialize_u64(Visitor::<T>(marker::PhantomData))
    }
}

impl<T> fmt::Debug for Index<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<T> fmt::Display for Index<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
