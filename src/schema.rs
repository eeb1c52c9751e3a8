//! The edge-field schema consulted by the graph.
//!
//! Every property type declares its outbound edge fields here: the field
//! name, whether the field holds a single child, an ordered list, or a keyed
//! map, and which property types the child may have. Extension properties
//! declare their fields through
//! [`ExtensionPropertyData::edge_fields`](crate::extension::ExtensionPropertyData::edge_fields)
//! instead, since their shape is only known at runtime.

/// Discriminant tag identifying a property's concrete type.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum PropertyType {
    /// The root aggregate.
    Root,
    /// Binary data container.
    Buffer,
    /// Typed array over buffered bytes.
    Accessor,
    /// Image data usable by material texture slots.
    Texture,
    /// Surface appearance of a primitive.
    Material,
    /// A collection of primitives.
    Mesh,
    /// One drawable geometry batch.
    Primitive,
    /// A morph target layered over a primitive.
    PrimitiveTarget,
    /// Joints and inverse-bind matrices.
    Skin,
    /// A transform in the node hierarchy.
    Node,
    /// A set of root nodes.
    Scene,
    /// A projection.
    Camera,
    /// A keyframe animation.
    Animation,
    /// Targets a sampler at a node property.
    AnimationChannel,
    /// A keyframe graph without a target.
    AnimationSampler,
    /// A property owned by a registered extension.
    Extension,
}

/// The multiplicity of an edge field.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EdgeKind {
    /// At most one child edge.
    Single,
    /// An ordered list of child edges.
    List,
    /// Child edges keyed by a string carried in the edge attributes.
    Map,
}

/// Declares one outbound edge field of a property type.
#[derive(Clone, Copy, Debug)]
pub struct EdgeFieldDef {
    /// Field name; doubles as the edge name in the graph.
    pub name: &'static str,
    /// Single, list, or map.
    pub kind: EdgeKind,
    /// Property types the child may have.
    pub child: &'static [PropertyType],
}

const fn field(
    name: &'static str,
    kind: EdgeKind,
    child: &'static [PropertyType],
) -> EdgeFieldDef {
    EdgeFieldDef { name, kind, child }
}

/// Every property may own extension properties keyed by extension name.
pub const EXTENSIONS: EdgeFieldDef =
    field("extensions", EdgeKind::Map, &[PropertyType::Extension]);

const ROOT: &[EdgeFieldDef] = &[
    field("scene", EdgeKind::Single, &[PropertyType::Scene]),
    field("scenes", EdgeKind::List, &[PropertyType::Scene]),
    field("nodes", EdgeKind::List, &[PropertyType::Node]),
    field("meshes", EdgeKind::List, &[PropertyType::Mesh]),
    field("materials", EdgeKind::List, &[PropertyType::Material]),
    field("textures", EdgeKind::List, &[PropertyType::Texture]),
    field("accessors", EdgeKind::List, &[PropertyType::Accessor]),
    field("buffers", EdgeKind::List, &[PropertyType::Buffer]),
    field("skins", EdgeKind::List, &[PropertyType::Skin]),
    field("cameras", EdgeKind::List, &[PropertyType::Camera]),
    field("animations", EdgeKind::List, &[PropertyType::Animation]),
    EXTENSIONS,
];

const ACCESSOR: &[EdgeFieldDef] = &[
    field("buffer", EdgeKind::Single, &[PropertyType::Buffer]),
    EXTENSIONS,
];

const TEXTURE: &[EdgeFieldDef] = &[
    field("buffer", EdgeKind::Single, &[PropertyType::Buffer]),
    EXTENSIONS,
];

const MATERIAL: &[EdgeFieldDef] = &[
    field("baseColorTexture", EdgeKind::Single, &[PropertyType::Texture]),
    field(
        "metallicRoughnessTexture",
        EdgeKind::Single,
        &[PropertyType::Texture],
    ),
    field("normalTexture", EdgeKind::Single, &[PropertyType::Texture]),
    field("occlusionTexture", EdgeKind::Single, &[PropertyType::Texture]),
    field("emissiveTexture", EdgeKind::Single, &[PropertyType::Texture]),
    EXTENSIONS,
];

const MESH: &[EdgeFieldDef] = &[
    field("primitives", EdgeKind::List, &[PropertyType::Primitive]),
    EXTENSIONS,
];

const PRIMITIVE: &[EdgeFieldDef] = &[
    field("indices", EdgeKind::Single, &[PropertyType::Accessor]),
    field("attributes", EdgeKind::Map, &[PropertyType::Accessor]),
    field("material", EdgeKind::Single, &[PropertyType::Material]),
    field("targets", EdgeKind::List, &[PropertyType::PrimitiveTarget]),
    EXTENSIONS,
];

const PRIMITIVE_TARGET: &[EdgeFieldDef] = &[
    field("attributes", EdgeKind::Map, &[PropertyType::Accessor]),
    EXTENSIONS,
];

const SKIN: &[EdgeFieldDef] = &[
    field("joints", EdgeKind::List, &[PropertyType::Node]),
    field("skeleton", EdgeKind::Single, &[PropertyType::Node]),
    field(
        "inverseBindMatrices",
        EdgeKind::Single,
        &[PropertyType::Accessor],
    ),
    EXTENSIONS,
];

const NODE: &[EdgeFieldDef] = &[
    field("mesh", EdgeKind::Single, &[PropertyType::Mesh]),
    field("skin", EdgeKind::Single, &[PropertyType::Skin]),
    field("camera", EdgeKind::Single, &[PropertyType::Camera]),
    field("children", EdgeKind::List, &[PropertyType::Node]),
    EXTENSIONS,
];

const SCENE: &[EdgeFieldDef] = &[
    field("nodes", EdgeKind::List, &[PropertyType::Node]),
    EXTENSIONS,
];

const ANIMATION: &[EdgeFieldDef] = &[
    field("channels", EdgeKind::List, &[PropertyType::AnimationChannel]),
    field("samplers", EdgeKind::List, &[PropertyType::AnimationSampler]),
    EXTENSIONS,
];

const ANIMATION_CHANNEL: &[EdgeFieldDef] = &[
    field("sampler", EdgeKind::Single, &[PropertyType::AnimationSampler]),
    field("target", EdgeKind::Single, &[PropertyType::Node]),
    EXTENSIONS,
];

const ANIMATION_SAMPLER: &[EdgeFieldDef] = &[
    field("input", EdgeKind::Single, &[PropertyType::Accessor]),
    field("output", EdgeKind::Single, &[PropertyType::Accessor]),
    EXTENSIONS,
];

const LEAF: &[EdgeFieldDef] = &[EXTENSIONS];

/// Returns the edge fields declared by `ty`.
///
/// For [`PropertyType::Extension`] only the common `extensions` field is
/// returned; concrete extension properties extend this set per instance.
pub fn edge_fields(ty: PropertyType) -> &'static [EdgeFieldDef] {
    match ty {
        PropertyType::Root => ROOT,
        PropertyType::Accessor => ACCESSOR,
        PropertyType::Texture => TEXTURE,
        PropertyType::Material => MATERIAL,
        PropertyType::Mesh => MESH,
        PropertyType::Primitive => PRIMITIVE,
        PropertyType::PrimitiveTarget => PRIMITIVE_TARGET,
        PropertyType::Skin => SKIN,
        PropertyType::Node => NODE,
        PropertyType::Scene => SCENE,
        PropertyType::Animation => ANIMATION,
        PropertyType::AnimationChannel => ANIMATION_CHANNEL,
        PropertyType::AnimationSampler => ANIMATION_SAMPLER,
        PropertyType::Buffer | PropertyType::Camera | PropertyType::Extension => LEAF,
    }
}
