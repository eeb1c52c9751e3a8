//! The property payload union and the generic capability set.
//!
//! Properties are discriminated-union records; the capabilities shared by
//! every type (structural equality, 32-bit hashing, deep copy, disposal)
//! dispatch on the discriminant rather than on virtual method tables. The
//! graph consults [`schema`](crate::schema) for edge-field metadata, except
//! for extension properties which carry their own.

use crate::error::Result;
use crate::extension::ExtensionPropertyData;
use crate::graph::{EdgeAttributes, Graph, PropertyKey};
use crate::properties::*;
use crate::schema::{self, EdgeFieldDef, EdgeKind, PropertyType};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::marker::PhantomData;

/// Typed handle to a property of payload type `T`.
///
/// A thin phantom-typed wrapper over [`PropertyKey`]; it stays `Copy` and
/// survives any graph mutation, but dereferencing it after the property is
/// disposed fails with [`Error::Disposed`](crate::Error::Disposed).
pub struct Ref<T> {
    key: PropertyKey,
    marker: PhantomData<fn() -> T>,
}

impl<T> Ref<T> {
    pub(crate) fn new(key: PropertyKey) -> Self {
        Self {
            key,
            marker: PhantomData,
        }
    }

    /// The untyped graph key.
    pub fn key(self) -> PropertyKey {
        self.key
    }
}

impl<T> Clone for Ref<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Ref<T> {}

impl<T> PartialEq for Ref<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<T> Eq for Ref<T> {}

impl<T> std::hash::Hash for Ref<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl<T> fmt::Debug for Ref<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ref({:?})", self.key)
    }
}

/// Phantom tag for handles to extension properties.
pub enum ExtensionProperty {}

/// Handle of an extension property.
pub type ExtensionPropertyRef = Ref<ExtensionProperty>;

/// The typed payload of a property.
pub enum PropertyData {
    /// The root aggregate.
    Root(RootData),
    /// Binary data container.
    Buffer(BufferData),
    /// Typed array over buffered bytes.
    Accessor(AccessorData),
    /// Image data.
    Texture(TextureData),
    /// Surface appearance.
    Material(MaterialData),
    /// A collection of primitives.
    Mesh(MeshData),
    /// One drawable geometry batch.
    Primitive(PrimitiveData),
    /// A morph target.
    PrimitiveTarget(PrimitiveTargetData),
    /// Joints and inverse-bind matrices.
    Skin(SkinData),
    /// A transform in the hierarchy.
    Node(NodeData),
    /// A set of root nodes.
    Scene(SceneData),
    /// A projection.
    Camera(CameraData),
    /// A keyframe animation.
    Animation(AnimationData),
    /// Targets a sampler at a node property.
    AnimationChannel(AnimationChannelData),
    /// A keyframe graph without a target.
    AnimationSampler(AnimationSamplerData),
    /// A property owned by a registered extension.
    Extension(Box<dyn ExtensionPropertyData>),
}

impl PropertyData {
    /// The discriminant of the payload.
    pub fn property_type(&self) -> PropertyType {
        match self {
            PropertyData::Root(_) => PropertyType::Root,
            PropertyData::Buffer(_) => PropertyType::Buffer,
            PropertyData::Accessor(_) => PropertyType::Accessor,
            PropertyData::Texture(_) => PropertyType::Texture,
            PropertyData::Material(_) => PropertyType::Material,
            PropertyData::Mesh(_) => PropertyType::Mesh,
            PropertyData::Primitive(_) => PropertyType::Primitive,
            PropertyData::PrimitiveTarget(_) => PropertyType::PrimitiveTarget,
            PropertyData::Skin(_) => PropertyType::Skin,
            PropertyData::Node(_) => PropertyType::Node,
            PropertyData::Scene(_) => PropertyType::Scene,
            PropertyData::Camera(_) => PropertyType::Camera,
            PropertyData::Animation(_) => PropertyType::Animation,
            PropertyData::AnimationChannel(_) => PropertyType::AnimationChannel,
            PropertyData::AnimationSampler(_) => PropertyType::AnimationSampler,
            PropertyData::Extension(_) => PropertyType::Extension,
        }
    }

    /// Edge fields of this payload, instance-supplied for extensions.
    pub fn edge_fields(&self) -> Vec<EdgeFieldDef> {
        match self {
            PropertyData::Extension(ext) => {
                let mut fields = ext.edge_fields().to_vec();
                fields.push(schema::EXTENSIONS);
                fields
            }
            other => schema::edge_fields(other.property_type()).to_vec(),
        }
    }

    pub(crate) fn hash_attributes(&self, h: &mut Hasher32) {
        h.write_u8(self.property_type() as u8);
        match self {
            PropertyData::Root(d) => {
                h.write_str(&d.asset.version);
                h.write_opt_str(d.asset.generator.as_deref());
                h.write_opt_str(d.asset.min_version.as_deref());
                h.write_opt_str(d.asset.copyright.as_deref());
            }
            PropertyData::Buffer(d) => h.write_opt_str(d.uri.as_deref()),
            PropertyData::Accessor(d) => d.hash_attributes(h),
            PropertyData::Texture(d) => {
                h.write_opt_str(d.uri.as_deref());
                h.write_opt_str(d.mime_type.as_deref());
                match &d.image {
                    Some(bytes) => {
                        h.write_u8(1);
                        h.write(bytes);
                    }
                    None => h.write_u8(0),
                }
            }
            PropertyData::Material(d) => {
                h.write_u8(d.alpha_mode as u8);
                h.write_f32(d.alpha_cutoff);
                h.write_u8(u8::from(d.double_sided));
                d.base_color_factor.iter().for_each(|f| h.write_f32(*f));
                h.write_f32(d.metallic_factor);
                h.write_f32(d.roughness_factor);
                d.emissive_factor.iter().for_each(|f| h.write_f32(*f));
                h.write_f32(d.normal_scale);
                h.write_f32(d.occlusion_strength);
            }
            PropertyData::Mesh(d) => {
                h.write_u32(d.weights.len() as u32);
                d.weights.iter().for_each(|w| h.write_f32(*w));
            }
            PropertyData::Primitive(d) => h.write_u8(d.mode as u8),
            PropertyData::PrimitiveTarget(_)
            | PropertyData::Skin(_)
            | PropertyData::Scene(_)
            | PropertyData::Animation(_) => {}
            PropertyData::Node(d) => {
                d.translation.to_array().iter().for_each(|f| h.write_f32(*f));
                d.rotation.to_array().iter().for_each(|f| h.write_f32(*f));
                d.scale.to_array().iter().for_each(|f| h.write_f32(*f));
                h.write_u32(d.weights.len() as u32);
                d.weights.iter().for_each(|w| h.write_f32(*w));
            }
            PropertyData::Camera(d) => match &d.projection {
                Projection::Perspective {
                    aspect_ratio,
                    yfov,
                    zfar,
                    znear,
                } => {
                    h.write_u8(0);
                    h.write_opt_f32(*aspect_ratio);
                    h.write_f32(*yfov);
                    h.write_opt_f32(*zfar);
                    h.write_f32(*znear);
                }
                Projection::Orthographic {
                    xmag,
                    ymag,
                    zfar,
                    znear,
                } => {
                    h.write_u8(1);
                    h.write_f32(*xmag);
                    h.write_f32(*ymag);
                    h.write_f32(*zfar);
                    h.write_f32(*znear);
                }
            },
            PropertyData::AnimationChannel(d) => h.write_u8(d.target_path as u8),
            PropertyData::AnimationSampler(d) => h.write_u8(d.interpolation as u8),
            PropertyData::Extension(ext) => {
                h.write_str(ext.extension_name());
                h.write_str(ext.kind());
                ext.hash_attributes(h);
            }
        }
    }
}

impl Clone for PropertyData {
    fn clone(&self) -> Self {
        match self {
            PropertyData::Root(d) => PropertyData::Root(d.clone()),
            PropertyData::Buffer(d) => PropertyData::Buffer(d.clone()),
            PropertyData::Accessor(d) => PropertyData::Accessor(d.clone()),
            PropertyData::Texture(d) => PropertyData::Texture(d.clone()),
            PropertyData::Material(d) => PropertyData::Material(d.clone()),
            PropertyData::Mesh(d) => PropertyData::Mesh(d.clone()),
            PropertyData::Primitive(d) => PropertyData::Primitive(d.clone()),
            PropertyData::PrimitiveTarget(d) => PropertyData::PrimitiveTarget(d.clone()),
            PropertyData::Skin(d) => PropertyData::Skin(d.clone()),
            PropertyData::Node(d) => PropertyData::Node(d.clone()),
            PropertyData::Scene(d) => PropertyData::Scene(d.clone()),
            PropertyData::Camera(d) => PropertyData::Camera(d.clone()),
            PropertyData::Animation(d) => PropertyData::Animation(d.clone()),
            PropertyData::AnimationChannel(d) => PropertyData::AnimationChannel(d.clone()),
            PropertyData::AnimationSampler(d) => PropertyData::AnimationSampler(d.clone()),
            PropertyData::Extension(ext) => PropertyData::Extension(ext.clone_box()),
        }
    }
}

impl PartialEq for PropertyData {
    fn eq(&self, other: &Self) -> bool {
        use PropertyData::*;
        match (self, other) {
            (Root(a), Root(b)) => a == b,
            (Buffer(a), Buffer(b)) => a == b,
            (Accessor(a), Accessor(b)) => a == b,
            (Texture(a), Texture(b)) => a == b,
            (Material(a), Material(b)) => a == b,
            (Mesh(a), Mesh(b)) => a == b,
            (Primitive(a), Primitive(b)) => a == b,
            (PrimitiveTarget(a), PrimitiveTarget(b)) => a == b,
            (Skin(a), Skin(b)) => a == b,
            (Node(a), Node(b)) => a == b,
            (Scene(a), Scene(b)) => a == b,
            (Camera(a), Camera(b)) => a == b,
            (Animation(a), Animation(b)) => a == b,
            (AnimationChannel(a), AnimationChannel(b)) => a == b,
            (AnimationSampler(a), AnimationSampler(b)) => a == b,
            (Extension(a), Extension(b)) => a.attributes_equal(b.as_ref()),
            _ => false,
        }
    }
}

impl fmt::Debug for PropertyData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyData::Extension(ext) => write!(
                f,
                "Extension({}/{})",
                ext.extension_name(),
                ext.kind()
            ),
            other => write!(f, "{:?}", other.property_type()),
        }
    }
}

/// Payload types addressable through a typed [`Ref`].
pub trait PropertyVariant: Sized + 'static {
    /// The discriminant this payload maps to.
    const TYPE: PropertyType;

    /// Projects the union onto this payload type.
    fn variant(data: &PropertyData) -> Option<&Self>;

    /// Projects the union onto this payload type, mutably.
    fn variant_mut(data: &mut PropertyData) -> Option<&mut Self>;

    /// Wraps the payload into the union.
    fn into_data(self) -> PropertyData;
}

macro_rules! impl_property_variant {
    ($ty:ty, $variant:ident) => {
        impl PropertyVariant for $ty {
            const TYPE: PropertyType = PropertyType::$variant;

            fn variant(data: &PropertyData) -> Option<&Self> {
                match data {
                    PropertyData::$variant(inner) => Some(inner),
                    _ => None,
                }
            }

            fn variant_mut(data: &mut PropertyData) -> Option<&mut Self> {
                match data {
                    PropertyData::$variant(inner) => Some(inner),
                    _ => None,
                }
            }

            fn into_data(self) -> PropertyData {
                PropertyData::$variant(self)
            }
        }
    };
}

impl_property_variant!(RootData, Root);
impl_property_variant!(BufferData, Buffer);
impl_property_variant!(AccessorData, Accessor);
impl_property_variant!(TextureData, Texture);
impl_property_variant!(MaterialData, Material);
impl_property_variant!(MeshData, Mesh);
impl_property_variant!(PrimitiveData, Primitive);
impl_property_variant!(PrimitiveTargetData, PrimitiveTarget);
impl_property_variant!(SkinData, Skin);
impl_property_variant!(NodeData, Node);
impl_property_variant!(SceneData, Scene);
impl_property_variant!(CameraData, Camera);
impl_property_variant!(AnimationData, Animation);
impl_property_variant!(AnimationChannelData, AnimationChannel);
impl_property_variant!(AnimationSamplerData, AnimationSampler);

/// A deterministic 32-bit FNV-1a hasher.
///
/// The standard library hashers are randomly seeded per process; property
/// hashes must instead be stable so that caches and deduplication behave the
/// same on every run.
#[derive(Clone, Debug)]
pub struct Hasher32 {
    state: u32,
}

impl Default for Hasher32 {
    fn default() -> Self {
        Self { state: 0x811c_9dc5 }
    }
}

impl Hasher32 {
    /// Creates a hasher with the FNV offset basis.
    pub fn new() -> Self {
        Self::default()
    }

    /// Absorbs raw bytes.
    pub fn write(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.state ^= u32::from(*byte);
            self.state = self.state.wrapping_mul(0x0100_0193);
        }
    }

    /// Absorbs one byte.
    pub fn write_u8(&mut self, value: u8) {
        self.write(&[value]);
    }

    /// Absorbs a `u32` in little-endian order.
    pub fn write_u32(&mut self, value: u32) {
        self.write(&value.to_le_bytes());
    }

    /// Absorbs an `f32` by bit pattern.
    pub fn write_f32(&mut self, value: f32) {
        self.write(&value.to_bits().to_le_bytes());
    }

    /// Absorbs a length-prefixed string.
    pub fn write_str(&mut self, value: &str) {
        self.write_u32(value.len() as u32);
        self.write(value.as_bytes());
    }

    /// Absorbs an optional string with a presence tag.
    pub fn write_opt_str(&mut self, value: Option<&str>) {
        match value {
            Some(s) => {
                self.write_u8(1);
                self.write_str(s);
            }
            None => self.write_u8(0),
        }
    }

    /// Absorbs an optional float with a presence tag.
    pub fn write_opt_f32(&mut self, value: Option<f32>) {
        match value {
            Some(f) => {
                self.write_u8(1);
                self.write_f32(f);
            }
            None => self.write_u8(0),
        }
    }

    /// The accumulated hash.
    pub fn finish(&self) -> u32 {
        self.state
    }
}

/// Memoized property hashes, keyed by handle.
///
/// The cache is only coherent while the hashed subgraph is unchanged; any
/// outbound change to a cached property invalidates it, so callers rebuild
/// the cache per pass.
#[derive(Debug, Default)]
pub struct HashCache {
    map: HashMap<PropertyKey, u32>,
}

impl HashCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Structural equality of two properties.
///
/// Value attributes are compared directly; outbound edges are followed
/// recursively with a visited set to terminate on shared or cyclic
/// structure. Ordered list fields compare order-sensitively, keyed maps by
/// key. Field names in `skip` (including `"name"` and `"extras"`) are
/// excluded.
pub fn properties_equal(
    graph: &Graph,
    a: PropertyKey,
    b: PropertyKey,
    skip: &[&str],
) -> Result<bool> {
    let mut visited = HashSet::new();
    equals_inner(graph, a, b, skip, &mut visited)
}

fn equals_inner(
    graph: &Graph,
    a: PropertyKey,
    b: PropertyKey,
    skip: &[&str],
    visited: &mut HashSet<(PropertyKey, PropertyKey)>,
) -> Result<bool> {
    if a == b {
        return Ok(true);
    }
    if !visited.insert((a, b)) {
        return Ok(true);
    }
    let ra = graph.record(a)?;
    let rb = graph.record(b)?;
    if ra.data() != rb.data() {
        return Ok(false);
    }
    if !skip.contains(&"name") && ra.name() != rb.name() {
        return Ok(false);
    }
    if !skip.contains(&"extras") && graph.extras(a)? != graph.extras(b)? {
        return Ok(false);
    }

    for def in ra.data().edge_fields() {
        if skip.contains(&def.name) {
            continue;
        }
        let edges_a = field_edges(graph, a, def.name)?;
        let edges_b = field_edges(graph, b, def.name)?;
        if edges_a.len() != edges_b.len() {
            return Ok(false);
        }
        match def.kind {
            EdgeKind::Single | EdgeKind::List => {
                for (ea, eb) in edges_a.iter().zip(&edges_b) {
                    let (child_a, attrs_a) = edge_parts(graph, *ea)?;
                    let (child_b, attrs_b) = edge_parts(graph, *eb)?;
                    if attrs_a != attrs_b {
                        return Ok(false);
                    }
                    if !equals_inner(graph, child_a, child_b, skip, visited)? {
                        return Ok(false);
                    }
                }
            }
            EdgeKind::Map => {
                for ea in &edges_a {
                    let (child_a, attrs_a) = edge_parts(graph, *ea)?;
                    let key = attrs_a.semantic().unwrap_or_default().to_string();
                    let Some(eb) = edges_b.iter().copied().find(|eb| {
                        graph
                            .edge(*eb)
                            .ok()
                            .and_then(|e| e.attributes.semantic())
                            .is_some_and(|k| k == key)
                    }) else {
                        return Ok(false);
                    };
                    let (child_b, attrs_b) = edge_parts(graph, eb)?;
                    if attrs_a != attrs_b {
                        return Ok(false);
                    }
                    if !equals_inner(graph, child_a, child_b, skip, visited)? {
                        return Ok(false);
                    }
                }
            }
        }
    }
    Ok(true)
}

/// A 32-bit structural hash consistent with [`properties_equal`].
pub fn property_hash(
    graph: &Graph,
    property: PropertyKey,
    skip: &[&str],
    cache: Option<&mut HashCache>,
) -> Result<u32> {
    let mut local = HashCache::new();
    let cache = cache.unwrap_or(&mut local);
    let mut visiting = HashSet::new();
    hash_inner(graph, property, skip, &mut visiting, cache)
}

fn hash_inner(
    graph: &Graph,
    property: PropertyKey,
    skip: &[&str],
    visiting: &mut HashSet<PropertyKey>,
    cache: &mut HashCache,
) -> Result<u32> {
    if let Some(hash) = cache.map.get(&property) {
        return Ok(*hash);
    }
    if !visiting.insert(property) {
        // Cycle marker; any constant keeps the hash consistent with equality.
        return Ok(0x9e37_79b9);
    }
    let record = graph.record(property)?;
    let mut h = Hasher32::new();
    record.data().hash_attributes(&mut h);
    if !skip.contains(&"name") {
        h.write_str(record.name());
    }
    if !skip.contains(&"extras") {
        let extras = graph.extras(property)?;
        if extras.is_null() {
            h.write_u8(0);
        } else {
            h.write_u8(1);
            h.write_str(&extras.to_string());
        }
    }
    for def in record.data().edge_fields() {
        if skip.contains(&def.name) {
            continue;
        }
        let mut edges = field_edges(graph, property, def.name)?;
        if def.kind == EdgeKind::Map {
            // Key order must not influence the hash.
            edges.sort_by_key(|e| {
                graph
                    .edge(*e)
                    .ok()
                    .and_then(|edge| edge.attributes.semantic().map(str::to_string))
                    .unwrap_or_default()
            });
        }
        h.write_str(def.name);
        for key in edges {
            let (child, attrs) = edge_parts(graph, key)?;
            hash_edge_attributes(&attrs, &mut h);
            let child_hash = hash_inner(graph, child, skip, visiting, cache)?;
            h.write_u32(child_hash);
        }
    }
    visiting.remove(&property);
    let hash = h.finish();
    cache.map.insert(property, hash);
    Ok(hash)
}

fn hash_edge_attributes(attrs: &EdgeAttributes, h: &mut Hasher32) {
    match attrs {
        EdgeAttributes::None => h.write_u8(0),
        EdgeAttributes::Semantic(key) => {
            h.write_u8(1);
            h.write_str(key);
        }
        EdgeAttributes::TextureInfo(info) => {
            h.write_u8(2);
            h.write_u32(info.tex_coord);
            h.write_u8(info.mag_filter.map_or(0, |f| f as u8));
            h.write_u8(info.min_filter.map_or(0, |f| f as u8));
            h.write_u8(info.wrap_s as u8);
            h.write_u8(info.wrap_t as u8);
        }
    }
}

/// Edges of `parent` belonging to the field `name`, in insertion order.
pub fn field_edges(
    graph: &Graph,
    parent: PropertyKey,
    name: &str,
) -> Result<Vec<crate::graph::EdgeKey>> {
    let mut out = Vec::new();
    for key in graph.child_edges(parent)? {
        if graph.edge(key)?.name == name {
            out.push(key);
        }
    }
    Ok(out)
}

fn edge_parts(
    graph: &Graph,
    key: crate::graph::EdgeKey,
) -> Result<(PropertyKey, EdgeAttributes)> {
    let edge = graph.edge(key)?;
    Ok((edge.child, edge.attributes.clone()))
}
