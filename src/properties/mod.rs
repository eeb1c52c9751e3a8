//! Concrete property payloads, one module per category.

mod accessor;
mod animation;
mod buffer;
mod camera;
mod material;
mod mesh;
mod node;
mod root;
mod scene;
mod skin;
mod texture;
mod texture_info;

pub use accessor::AccessorData;
pub use animation::{AnimationChannelData, AnimationData, AnimationSamplerData};
pub use buffer::BufferData;
pub use camera::{CameraData, Projection};
pub use material::{MaterialData, TextureSlot};
pub use mesh::{MeshData, PrimitiveData, PrimitiveTargetData};
pub use node::NodeData;
pub use root::{AssetInfo, RootData};
pub use scene::SceneData;
pub use skin::SkinData;
pub use texture::TextureData;
pub use texture_info::TextureInfo;

use crate::property::Ref;

/// Handle of an accessor property.
pub type AccessorRef = Ref<AccessorData>;
/// Handle of an animation property.
pub type AnimationRef = Ref<AnimationData>;
/// Handle of an animation channel property.
pub type AnimationChannelRef = Ref<AnimationChannelData>;
/// Handle of an animation sampler property.
pub type AnimationSamplerRef = Ref<AnimationSamplerData>;
/// Handle of a buffer property.
pub type BufferRef = Ref<BufferData>;
/// Handle of a camera property.
pub type CameraRef = Ref<CameraData>;
/// Handle of a material property.
pub type MaterialRef = Ref<MaterialData>;
/// Handle of a mesh property.
pub type MeshRef = Ref<MeshData>;
/// Handle of a node property.
pub type NodeRef = Ref<NodeData>;
/// Handle of a primitive property.
pub type PrimitiveRef = Ref<PrimitiveData>;
/// Handle of a morph target property.
pub type PrimitiveTargetRef = Ref<PrimitiveTargetData>;
/// Handle of the root property.
pub type RootRef = Ref<RootData>;
/// Handle of a scene property.
pub type SceneRef = Ref<SceneData>;
/// Handle of a skin property.
pub type SkinRef = Ref<SkinData>;
/// Handle of a texture property.
pub type TextureRef = Ref<TextureData>;
