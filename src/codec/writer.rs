//! Property graph to JSON/GLB.

use crate::codec::glb::Glb;
use crate::document::Document;
use crate::element::{ComponentType, ScalarArray};
use crate::error::{Error, Result};
use crate::extension::ExtensionRegistry;
use crate::graph::PropertyKey;
use crate::io::{IoPlatform, NativeIo};
use crate::properties::*;
use crate::schema::PropertyType;
use gltf_forge_json as json;
use json::texture::{MagFilter, MinFilter, WrappingMode};
use json::validation::Checked;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

/// Output container variant.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Format {
    /// JSON document referencing external or data-URI resources.
    #[default]
    Standard,
    /// Single-file container with an embedded BIN chunk.
    Binary,
}

/// Write behavior knobs.
#[derive(Clone, Copy, Debug, Default)]
pub struct WriteOptions {
    /// Output container variant for [`Writer::write_path`].
    pub format: Format,
    /// Pretty-print the JSON document.
    pub pretty: bool,
}

/// A lowered document: the JSON text plus external resources keyed by URI.
#[derive(Debug, Default)]
pub struct Artifacts {
    /// UTF-8 JSON bytes.
    pub json: Vec<u8>,
    /// Sibling resource payloads keyed by their URI.
    pub resources: HashMap<String, Vec<u8>>,
}

/// Writes documents to the wire formats.
pub struct Writer {
    registry: ExtensionRegistry,
    options: WriteOptions,
    io: Box<dyn IoPlatform>,
}

impl Default for Writer {
    fn default() -> Self {
        Self::new()
    }
}

impl Writer {
    /// A writer with no extensions, default options, and native file I/O.
    pub fn new() -> Self {
        Self {
            registry: ExtensionRegistry::new(),
            options: WriteOptions::default(),
            io: Box::new(NativeIo),
        }
    }

    /// Replaces the extension registry.
    pub fn with_registry(mut self, registry: ExtensionRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Replaces the write options.
    pub fn with_options(mut self, options: WriteOptions) -> Self {
        self.options = options;
        self
    }

    /// Replaces the I/O platform.
    pub fn with_io(mut self, io: Box<dyn IoPlatform>) -> Self {
        self.io = io;
        self
    }

    /// Writes the document to disk. A `.glb` extension selects the binary
    /// container; anything else writes JSON plus sibling resources.
    pub fn write_path(&self, doc: &Document, path: &Path) -> Result<()> {
        let binary = path
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("glb"))
            || self.options.format == Format::Binary;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        if binary {
            let (bytes, resources) = self.to_binary_with_resources(doc)?;
            self.io.write_file(path, &bytes)?;
            for (uri, data) in resources {
                self.io.write_file(&self.io.resolve(base, &uri), &data)?;
            }
        } else {
            let artifacts = self.to_standard(doc)?;
            self.io.write_file(path, &artifacts.json)?;
            for (uri, data) in artifacts.resources {
                self.io.write_file(&self.io.resolve(base, &uri), &data)?;
            }
        }
        Ok(())
    }

    /// Lowers the document into the single-file binary container.
    pub fn to_binary(&self, doc: &Document) -> Result<Vec<u8>> {
        let (bytes, resources) = self.to_binary_with_resources(doc)?;
        if !resources.is_empty() {
            return Err(Error::InvariantViolation(
                "document references external resources; use write_path".into(),
            ));
        }
        Ok(bytes)
    }

    fn to_binary_with_resources(
        &self,
        doc: &Document,
    ) -> Result<(Vec<u8>, HashMap<String, Vec<u8>>)> {
        let mut ctx = WriteContext::new(doc, &self.registry)?;
        let mut blobs = ctx.lower(Format::Binary)?;
        let mut resources = std::mem::take(&mut ctx.resources);
        let bin = self.finish_buffers(doc, &mut ctx, &mut blobs, Format::Binary, &mut resources)?;
        let json_bytes = self.serialize(&ctx.json)?;
        let glb = Glb {
            header: crate::codec::glb::Header {
                magic: crate::codec::glb::MAGIC,
                version: 2,
                length: 0,
            },
            json: json_bytes.into(),
            bin: bin.map(Into::into),
        };
        Ok((glb.to_vec()?, resources))
    }

    /// Lowers the document into JSON plus external resources.
    pub fn to_standard(&self, doc: &Document) -> Result<Artifacts> {
        let mut ctx = WriteContext::new(doc, &self.registry)?;
        let mut blobs = ctx.lower(Format::Standard)?;
        let mut resources = std::mem::take(&mut ctx.resources);
        self.finish_buffers(doc, &mut ctx, &mut blobs, Format::Standard, &mut resources)?;
        Ok(Artifacts {
            json: self.serialize(&ctx.json)?,
            resources,
        })
    }

    fn serialize(&self, root: &json::Root) -> Result<Vec<u8>> {
        if self.options.pretty {
            Ok(root.to_vec_pretty()?)
        } else {
            Ok(root.to_vec()?)
        }
    }

    /// Assigns buffer payloads to URIs, data URIs, or the BIN chunk.
    fn finish_buffers(
        &self,
        doc: &Document,
        ctx: &mut WriteContext<'_>,
        blobs: &mut [Vec<u8>],
        format: Format,
        resources: &mut HashMap<String, Vec<u8>>,
    ) -> Result<Option<Vec<u8>>> {
        let buffers = doc.buffers();
        let mut bin = None;
        let mut seen_uris = HashSet::new();
        for (index, buffer) in buffers.iter().enumerate() {
            let blob = std::mem::take(&mut blobs[index]);
            let uri = doc.get(*buffer)?.uri.clone();
            if let Some(uri) = &uri {
                if !seen_uris.insert(uri.clone()) {
                    return Err(Error::InvariantViolation(format!(
                        "buffer uri {uri:?} is not distinct"
                    )));
                }
            }
            let entry = &mut ctx.json.buffers[index];
            entry.byte_length = blob.len() as u64;
            match (format, uri, index) {
                // The unnamed buffer whose bytes become the BIN chunk.
                (Format::Binary, None, 0) => {
                    if !blob.is_empty() {
                        bin = Some(blob);
                    }
                }
                (Format::Binary, None, _) => {
                    if !blob.is_empty() {
                        return Err(Error::InvariantViolation(format!(
                            "buffer {index} holds data but only the first buffer can become \
                             the BIN chunk; give it a uri"
                        )));
                    }
                }
                (Format::Standard, None, _) => {
                    if !blob.is_empty() {
                        entry.uri = Some(format!(
                            "data:application/octet-stream;base64,{}",
                            base64::encode(&blob)
                        ));
                    }
                }
                (_, Some(uri), _) => {
                    entry.uri = Some(uri.clone());
                    resources.insert(uri, blob);
                }
            }
        }
        Ok(bin)
    }
}

/// How the accessors referencing a buffer use it.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
enum Usage {
    Index,
    Vertex,
    Other,
}

impl Usage {
    const ORDER: [Usage; 3] = [Usage::Index, Usage::Vertex, Usage::Other];

    fn target(self) -> Option<json::buffer::Target> {
        match self {
            Usage::Index => Some(json::buffer::Target::ElementArrayBuffer),
            Usage::Vertex => Some(json::buffer::Target::ArrayBuffer),
            Usage::Other => None,
        }
    }
}

struct SparsePayload {
    count: usize,
    index_component: ComponentType,
    index_bytes: Vec<u8>,
    value_bytes: Vec<u8>,
}

struct AccessorPlan {
    buffer: usize,
    usage: Usage,
    dense_bytes: Vec<u8>,
    sparse: Option<SparsePayload>,
}

type SamplerKey = (
    Option<MagFilter>,
    Option<MinFilter>,
    WrappingMode,
    WrappingMode,
);

/// The in-progress output handed to extension writers.
///
/// Extensions append fragments to [`json_mut`](Self::json_mut), resolve
/// property indices through the lookup methods, and report themselves via
/// [`mark_used`](Self::mark_used).
pub struct WriteContext<'a> {
    doc: &'a Document,
    registry: &'a ExtensionRegistry,
    json: json::Root,
    indices: HashMap<PropertyKey, usize>,
    sampler_table: HashMap<SamplerKey, usize>,
    texture_table: HashMap<(usize, Option<usize>), usize>,
    used: BTreeMap<String, bool>,
    accessor_plans: HashMap<PropertyKey, AccessorPlan>,
    image_views: HashMap<PropertyKey, usize>,
    /// External image payloads keyed by URI.
    resources: HashMap<String, Vec<u8>>,
}

impl<'a> WriteContext<'a> {
    fn new(doc: &'a Document, registry: &'a ExtensionRegistry) -> Result<Self> {
        let mut indices = HashMap::new();
        for (i, r) in doc.buffers().iter().enumerate() {
            indices.insert(r.key(), i);
        }
        for (i, r) in doc.accessors().iter().enumerate() {
            indices.insert(r.key(), i);
        }
        for (i, r) in doc.textures().iter().enumerate() {
            indices.insert(r.key(), i);
        }
        for (i, r) in doc.materials().iter().enumerate() {
            indices.insert(r.key(), i);
        }
        for (i, r) in doc.meshes().iter().enumerate() {
            indices.insert(r.key(), i);
        }
        for (i, r) in doc.cameras().iter().enumerate() {
            indices.insert(r.key(), i);
        }
        for (i, r) in doc.nodes().iter().enumerate() {
            indices.insert(r.key(), i);
        }
        for (i, r) in doc.skins().iter().enumerate() {
            indices.insert(r.key(), i);
        }
        for (i, r) in doc.scenes().iter().enumerate() {
            indices.insert(r.key(), i);
        }
        for (i, r) in doc.animations().iter().enumerate() {
            indices.insert(r.key(), i);
        }
        Ok(Self {
            doc,
            registry,
            json: json::Root::default(),
            indices,
            sampler_table: HashMap::new(),
            texture_table: HashMap::new(),
            used: BTreeMap::new(),
            accessor_plans: HashMap::new(),
            image_views: HashMap::new(),
            resources: HashMap::new(),
        })
    }

    /// The document being written.
    pub fn doc(&self) -> &Document {
        self.doc
    }

    /// The wire document under construction.
    pub fn json(&self) -> &json::Root {
        &self.json
    }

    /// The wire document under construction, mutably.
    pub fn json_mut(&mut self) -> &mut json::Root {
        &mut self.json
    }

    /// The wire index assigned to a root-listed property.
    pub fn index_of(&self, key: PropertyKey) -> Option<usize> {
        self.indices.get(&key).copied()
    }

    /// The wire index of a node.
    pub fn node_index(&self, node: NodeRef) -> Option<usize> {
        self.index_of(node.key())
    }

    /// The wire index of a material.
    pub fn material_index(&self, material: MaterialRef) -> Option<usize> {
        self.index_of(material.key())
    }

    /// The wire *image* index of a texture property.
    pub fn image_index(&self, texture: TextureRef) -> Option<usize> {
        self.index_of(texture.key())
    }

    /// Records an extension under `extensionsUsed`, and under
    /// `extensionsRequired` when `required`.
    pub fn mark_used(&mut self, name: &str, required: bool) {
        let entry = self.used.entry(name.to_string()).or_insert(false);
        *entry |= required;
    }

    /// Lowers a texture slot into a wire `textureInfo`, deduplicating
    /// sampler and texture entries and offering each registered extension
    /// its rewrite hook.
    pub fn texture_info_to_json(
        &mut self,
        texture: TextureRef,
        info: &TextureInfo,
    ) -> Result<json::texture::Info> {
        let image = self.index_of(texture.key()).ok_or_else(|| {
            Error::InvariantViolation("texture is not listed under the root".into())
        })?;

        let sampler = if info.mag_filter.is_none()
            && info.min_filter.is_none()
            && info.wrap_s == WrappingMode::Repeat
            && info.wrap_t == WrappingMode::Repeat
        {
            None
        } else {
            let key: SamplerKey = (info.mag_filter, info.min_filter, info.wrap_s, info.wrap_t);
            let next = self.json.samplers.len();
            let index = *self.sampler_table.entry(key).or_insert_with(|| {
                self.json.samplers.push(json::texture::Sampler {
                    mag_filter: info.mag_filter.map(Checked::Valid),
                    min_filter: info.min_filter.map(Checked::Valid),
                    wrap_s: Checked::Valid(info.wrap_s),
                    wrap_t: Checked::Valid(info.wrap_t),
                    ..Default::default()
                });
                next
            });
            Some(index)
        };

        let table_key = (image, sampler);
        let index = match self.texture_table.get(&table_key) {
            Some(index) => *index,
            None => {
                let mut entry = json::texture::Texture {
                    sampler: sampler.map(|s| json::Index::new(s as u32)),
                    source: Some(json::Index::new(image as u32)),
                    ..Default::default()
                };
                let mime = self.doc.get(texture)?.mime_type.clone();
                let mut claimed = Vec::new();
                for extension in self.registry.iter() {
                    if extension.rewrite_texture(mime.as_deref(), &mut entry) {
                        claimed.push((extension.name(), extension.required()));
                    }
                }
                for (name, required) in claimed {
                    self.mark_used(name, required);
                }
                let index = self.json.textures.len();
                self.json.textures.push(entry);
                self.texture_table.insert(table_key, index);
                index
            }
        };
        Ok(json::texture::Info {
            index: json::Index::new(index as u32),
            tex_coord: info.tex_coord,
            extensions: Default::default(),
            extras: Default::default(),
        })
    }

    fn opaque_extensions(&mut self, key: PropertyKey) -> Result<json::RawExtensions> {
        let fragments = self.doc.graph().unrecognized_extensions(key)?.clone();
        for name in fragments.keys() {
            self.mark_used(name, false);
        }
        Ok(fragments)
    }

    fn name_of(&self, key: PropertyKey) -> Result<Option<String>> {
        let name = self.doc.name(key)?;
        Ok(if name.is_empty() {
            None
        } else {
            Some(name.to_string())
        })
    }

    fn accessor_index(&self, accessor: AccessorRef, what: &str) -> Result<json::Index<json::Accessor>> {
        self.index_of(accessor.key())
            .map(|i| json::Index::new(i as u32))
            .ok_or_else(|| {
                Error::InvariantViolation(format!("{what} accessor is not listed under the root"))
            })
    }

    // ------------------------------------------------------------------

    fn lower(&mut self, format: Format) -> Result<Vec<Vec<u8>>> {
        self.validate_primitives()?;
        self.validate_skins()?;
        self.plan_accessors()?;
        let blobs = self.pack_buffers(format)?;
        self.lower_images(format)?;
        self.lower_materials()?;
        self.lower_meshes()?;
        self.lower_cameras()?;
        self.lower_nodes()?;
        self.lower_skins()?;
        self.lower_scenes()?;
        self.lower_animations()?;
        self.lower_root()?;
        let registry = self.registry;
        for extension in registry.iter() {
            extension.write(self)?;
        }
        self.json.extensions_used = self.used.keys().cloned().collect();
        self.json.extensions_required = self
            .used
            .iter()
            .filter(|(_, required)| **required)
            .map(|(name, _)| name.clone())
            .collect();
        Ok(blobs)
    }

    fn validate_primitives(&self) -> Result<()> {
        let doc = self.doc;
        for mesh in doc.meshes() {
            for primitive in doc.mesh_primitives(mesh) {
                let mut count = None;
                for semantic in doc.primitive_semantics(primitive) {
                    let accessor = doc
                        .primitive_attribute(primitive, &semantic)
                        .ok_or(Error::Disposed)?;
                    let this = doc.get(accessor)?.count();
                    match count {
                        None => count = Some(this),
                        Some(expected) if expected != this => {
                            return Err(Error::InvariantViolation(format!(
                                "attribute {semantic:?} has {this} elements, expected {expected}"
                            )));
                        }
                        Some(_) => {}
                    }
                }
                let position = doc.primitive_attribute(primitive, "POSITION");
                if let (Some(indices), Some(position)) =
                    (doc.primitive_indices(primitive), position)
                {
                    let vertex_count = doc.get(position)?.count();
                    let data = doc.get(indices)?;
                    for i in 0..data.count() {
                        let value = data.array().get(i) as usize;
                        if value >= vertex_count {
                            return Err(Error::OutOfRange(format!(
                                "index value {value} exceeds vertex count {vertex_count}"
                            )));
                        }
                    }
                }
                if let Some(position) = position {
                    let vertex_count = doc.get(position)?.count();
                    for target in doc.primitive_targets(primitive) {
                        for semantic in doc.target_semantics(target) {
                            let accessor = doc
                                .target_attribute(target, &semantic)
                                .ok_or(Error::Disposed)?;
                            let this = doc.get(accessor)?.count();
                            if this != vertex_count {
                                return Err(Error::InvariantViolation(format!(
                                    "morph target {semantic:?} has {this} elements, POSITION has {vertex_count}"
                                )));
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn validate_skins(&self) -> Result<()> {
        let doc = self.doc;
        for skin in doc.skins() {
            if let Some(matrices) = doc.skin_inverse_bind_matrices(skin) {
                let joints = doc.skin_joints(skin).len();
                let count = doc.get(matrices)?.count();
                if count != joints {
                    return Err(Error::InvariantViolation(format!(
                        "skin has {joints} joints but {count} inverse-bind matrices"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Categorizes every accessor by how its parents reference it and
    /// prepares its payload.
    fn plan_accessors(&mut self) -> Result<()> {
        let doc = self.doc;
        let root_key = doc.root().key();
        for accessor in doc.accessors() {
            let mut usage: Option<Usage> = None;
            for edge_key in doc.graph().parent_edges(accessor.key())? {
                let edge = doc.graph().edge(edge_key)?;
                if edge.parent == root_key {
                    continue;
                }
                let parent_type = doc.property_type(edge.parent)?;
                let this = match (parent_type, edge.name.as_str()) {
                    (PropertyType::Primitive, "indices") => Usage::Index,
                    (PropertyType::Primitive, "attributes")
                    | (PropertyType::PrimitiveTarget, "attributes") => Usage::Vertex,
                    _ => Usage::Other,
                };
                match usage {
                    None => usage = Some(this),
                    Some(previous) if previous != this => {
                        return Err(Error::InvariantViolation(format!(
                            "accessor {:?} is referenced as both {previous:?} and {this:?}",
                            doc.name(accessor.key())?
                        )));
                    }
                    Some(_) => {}
                }
            }
            let usage = usage.unwrap_or(Usage::Other);

            let buffer = doc.accessor_buffer(accessor).ok_or_else(|| {
                Error::InvariantViolation(format!(
                    "accessor {:?} has no buffer to be packed into",
                    doc.name(accessor.key()).unwrap_or_default()
                ))
            })?;
            let buffer = self.indices.get(&buffer.key()).copied().ok_or_else(|| {
                Error::InvariantViolation("accessor buffer is not listed under the root".into())
            })?;

            let data = doc.get(accessor)?;
            let sparse = if data.sparse() {
                plan_sparse(data)
            } else {
                None
            };
            let dense_bytes = if sparse.is_some() {
                Vec::new()
            } else {
                data.array().to_le_bytes()
            };
            self.accessor_plans.insert(
                accessor.key(),
                AccessorPlan {
                    buffer,
                    usage,
                    dense_bytes,
                    sparse,
                },
            );
        }
        Ok(())
    }

    /// Packs accessor payloads and embedded images into one buffer view per
    /// (buffer, usage) pair, then appends sparse and image views.
    fn pack_buffers(&mut self, format: Format) -> Result<Vec<Vec<u8>>> {
        let doc = self.doc;
        let buffers = doc.buffers();
        let accessors = doc.accessors();
        let mut blobs: Vec<Vec<u8>> = vec![Vec::new(); buffers.len()];
        self.json.accessors = Vec::with_capacity(accessors.len());

        // Wire entries come first so view indices can be patched in as the
        // views are laid out.
        for accessor in &accessors {
            let min_max = self.position_min_max(*accessor)?;
            let name = self.name_of(accessor.key())?;
            let extensions = self.opaque_extensions(accessor.key())?;
            let data = doc.get(*accessor)?;
            let plan = &self.accessor_plans[&accessor.key()];
            let sparse_json = plan.sparse.as_ref().map(|sparse| {
                json::accessor::sparse::Sparse {
                    count: sparse.count as u64,
                    indices: json::accessor::sparse::Indices {
                        // Patched during view layout.
                        buffer_view: json::Index::new(0),
                        byte_offset: 0,
                        component_type: Checked::Valid(sparse.index_component),
                    },
                    values: json::accessor::sparse::Values {
                        buffer_view: json::Index::new(0),
                        byte_offset: 0,
                    },
                }
            });
            let entry = json::Accessor {
                buffer_view: None,
                byte_offset: None,
                count: data.count() as u64,
                component_type: Checked::Valid(data.component_type()),
                type_: Checked::Valid(data.element_type()),
                min: min_max.clone().map(|(min, _)| min),
                max: min_max.map(|(_, max)| max),
                name,
                normalized: data.normalized(),
                sparse: sparse_json,
                extensions,
                extras: doc.extras(accessor.key())?.clone(),
            };
            self.json.accessors.push(entry);
        }

        for (buffer_index, _) in buffers.iter().enumerate() {
            for usage in Usage::ORDER {
                let group: Vec<AccessorRef> = accessors
                    .iter()
                    .copied()
                    .filter(|a| {
                        let plan = &self.accessor_plans[&a.key()];
                        plan.buffer == buffer_index
                            && plan.usage == usage
                            && plan.sparse.is_none()
                    })
                    .collect();
                if group.is_empty() {
                    continue;
                }

                let mut element_sizes = HashSet::new();
                let mut view_bytes: Vec<u8> = Vec::new();
                let mut offsets = Vec::with_capacity(group.len());
                for accessor in &group {
                    let plan = &self.accessor_plans[&accessor.key()];
                    align(&mut view_bytes, 4);
                    offsets.push(view_bytes.len() as u64);
                    view_bytes.extend_from_slice(&plan.dense_bytes);
                    element_sizes.insert(doc.get(*accessor)?.element_size());
                }

                let byte_stride = match (usage, element_sizes.len(), group.len()) {
                    (Usage::Vertex, 1, n) if n > 1 => {
                        let size = *element_sizes.iter().next().unwrap_or(&0);
                        (size % 4 == 0).then_some(size as u64)
                    }
                    _ => None,
                };

                let view_index = self.push_view(
                    buffer_index,
                    &mut blobs[buffer_index],
                    view_bytes,
                    byte_stride,
                    usage.target(),
                );
                for (accessor, offset) in group.iter().zip(offsets) {
                    let slot = self.indices[&accessor.key()];
                    let wire = &mut self.json.accessors[slot];
                    wire.buffer_view = Some(json::Index::new(view_index as u32));
                    if offset > 0 {
                        wire.byte_offset = Some(offset);
                    }
                }
            }
        }

        // Sparse payloads go into dedicated views.
        for accessor in &accessors {
            let Some(sparse) = ({
                let plan = &self.accessor_plans[&accessor.key()];
                plan.sparse.as_ref().map(|s| {
                    (
                        plan.buffer,
                        s.index_bytes.clone(),
                        s.value_bytes.clone(),
                    )
                })
            }) else {
                continue;
            };
            let (buffer_index, index_bytes, value_bytes) = sparse;
            let indices_view =
                self.push_view(buffer_index, &mut blobs[buffer_index], index_bytes, None, None);
            let values_view =
                self.push_view(buffer_index, &mut blobs[buffer_index], value_bytes, None, None);
            let slot = self.indices[&accessor.key()];
            let wire = &mut self.json.accessors[slot];
            if let Some(sparse_json) = wire.sparse.as_mut() {
                sparse_json.indices.buffer_view = json::Index::new(indices_view as u32);
                sparse_json.values.buffer_view = json::Index::new(values_view as u32);
            }
        }

        // Embedded images claim their own views.
        for texture in doc.textures() {
            let data = doc.get(texture)?;
            let embed_buffer = doc
                .child(texture.key(), "buffer")
                .and_then(|key| self.indices.get(&key).copied())
                .or_else(|| {
                    (format == Format::Binary && data.uri.is_none() && !buffers.is_empty())
                        .then_some(0)
                });
            let (Some(buffer_index), Some(bytes)) = (embed_buffer, data.image.clone()) else {
                continue;
            };
            let view_index =
                self.push_view(buffer_index, &mut blobs[buffer_index], bytes, None, None);
            self.image_views.insert(texture.key(), view_index);
        }

        self.json.buffers = buffers
            .iter()
            .map(|buffer| {
                Ok(json::buffer::Buffer {
                    byte_length: 0,
                    name: self.name_of(buffer.key())?,
                    uri: None,
                    extensions: self.doc.graph().unrecognized_extensions(buffer.key())?.clone(),
                    extras: doc.extras(buffer.key())?.clone(),
                })
            })
            .collect::<Result<_>>()?;
        Ok(blobs)
    }

    fn push_view(
        &mut self,
        buffer_index: usize,
        blob: &mut Vec<u8>,
        bytes: Vec<u8>,
        byte_stride: Option<u64>,
        target: Option<json::buffer::Target>,
    ) -> usize {
        align(blob, 4);
        let offset = blob.len();
        let length = bytes.len();
        blob.extend_from_slice(&bytes);
        let index = self.json.buffer_views.len();
        self.json.buffer_views.push(json::buffer::View {
            buffer: json::Index::new(buffer_index as u32),
            byte_length: length as u64,
            byte_offset: (offset > 0).then_some(offset as u64),
            byte_stride,
            name: None,
            target,
            extensions: Default::default(),
            extras: Default::default(),
        });
        index
    }

    /// Min/max are emitted for accessors referenced as `POSITION`.
    fn position_min_max(
        &self,
        accessor: AccessorRef,
    ) -> Result<Option<(serde_json::Value, serde_json::Value)>> {
        let doc = self.doc;
        let mut is_position = false;
        for edge_key in doc.graph().parent_edges(accessor.key())? {
            let edge = doc.graph().edge(edge_key)?;
            if edge.name == "attributes" && edge.attributes.semantic() == Some("POSITION") {
                is_position = true;
                break;
            }
        }
        if !is_position {
            return Ok(None);
        }
        let data = doc.get(accessor)?;
        let float = data.component_type() == ComponentType::F32;
        let lower = bounds_value(data.min_raw(), float);
        let upper = bounds_value(data.max_raw(), float);
        Ok(Some((lower, upper)))
    }

    fn lower_images(&mut self, format: Format) -> Result<()> {
        let doc = self.doc;
        for texture in doc.textures() {
            let data = doc.get(texture)?;
            let mut entry = json::image::Image {
                name: self.name_of(texture.key())?,
                extensions: self.opaque_extensions(texture.key())?,
                extras: doc.extras(texture.key())?.clone(),
                ..Default::default()
            };
            if let Some(view) = self.image_views.get(&texture.key()) {
                let mime = data.mime_type.clone().ok_or_else(|| {
                    Error::InvariantViolation(
                        "an embedded image needs a mimeType".into(),
                    )
                })?;
                entry.buffer_view = Some(json::Index::new(*view as u32));
                entry.mime_type = Some(mime);
            } else if let Some(uri) = &data.uri {
                entry.uri = Some(uri.clone());
                if let Some(bytes) = &data.image {
                    self.resources.insert(uri.clone(), bytes.clone());
                }
            } else if let Some(bytes) = &data.image {
                match format {
                    Format::Standard => {
                        let mime = data.mime_type.clone().ok_or_else(|| {
                            Error::InvariantViolation(
                                "an embedded image needs a mimeType".into(),
                            )
                        })?;
                        entry.uri =
                            Some(format!("data:{mime};base64,{}", base64::encode(bytes)));
                    }
                    Format::Binary => {
                        return Err(Error::InvariantViolation(
                            "binary output needs a buffer to embed images into".into(),
                        ));
                    }
                }
            } else {
                return Err(Error::InvariantViolation(format!(
                    "texture {:?} provides neither a uri nor image bytes",
                    doc.name(texture.key())?
                )));
            }
            self.json.images.push(entry);
        }
        Ok(())
    }

    fn lower_materials(&mut self) -> Result<()> {
        let doc = self.doc;
        for material in doc.materials() {
            let data = doc.get(material)?.clone();
            let mut entry = json::material::Material {
                name: self.name_of(material.key())?,
                alpha_mode: Checked::Valid(data.alpha_mode),
                double_sided: data.double_sided,
                emissive_factor: data.emissive_factor,
                extensions: self.opaque_extensions(material.key())?,
                extras: doc.extras(material.key())?.clone(),
                ..Default::default()
            };
            if data.alpha_mode == json::material::AlphaMode::Mask
                && data.alpha_cutoff != 0.5
            {
                entry.alpha_cutoff = Some(data.alpha_cutoff);
            }
            entry.pbr_metallic_roughness.base_color_factor = data.base_color_factor;
            entry.pbr_metallic_roughness.metallic_factor = data.metallic_factor;
            entry.pbr_metallic_roughness.roughness_factor = data.roughness_factor;

            if let Some(texture) = doc.material_texture(material, TextureSlot::BaseColor) {
                let info = self
                    .slot_info(material, TextureSlot::BaseColor)?;
                entry.pbr_metallic_roughness.base_color_texture =
                    Some(self.texture_info_to_json(texture, &info)?);
            }
            if let Some(texture) = doc.material_texture(material, TextureSlot::MetallicRoughness) {
                let info = self.slot_info(material, TextureSlot::MetallicRoughness)?;
                entry.pbr_metallic_roughness.metallic_roughness_texture =
                    Some(self.texture_info_to_json(texture, &info)?);
            }
            if let Some(texture) = doc.material_texture(material, TextureSlot::Normal) {
                let info = self.slot_info(material, TextureSlot::Normal)?;
                let wire = self.texture_info_to_json(texture, &info)?;
                entry.normal_texture = Some(json::material::NormalTexture {
                    index: wire.index,
                    scale: data.normal_scale,
                    tex_coord: wire.tex_coord,
                    extensions: Default::default(),
                    extras: Default::default(),
                });
            }
            if let Some(texture) = doc.material_texture(material, TextureSlot::Occlusion) {
                let info = self.slot_info(material, TextureSlot::Occlusion)?;
                let wire = self.texture_info_to_json(texture, &info)?;
                entry.occlusion_texture = Some(json::material::OcclusionTexture {
                    index: wire.index,
                    strength: data.occlusion_strength,
                    tex_coord: wire.tex_coord,
                    extensions: Default::default(),
                    extras: Default::default(),
                });
            }
            if let Some(texture) = doc.material_texture(material, TextureSlot::Emissive) {
                let info = self.slot_info(material, TextureSlot::Emissive)?;
                entry.emissive_texture = Some(self.texture_info_to_json(texture, &info)?);
            }
            self.json.materials.push(entry);
        }
        Ok(())
    }

    fn slot_info(&self, material: MaterialRef, slot: TextureSlot) -> Result<TextureInfo> {
        Ok(self
            .doc
            .material_texture_info(material, slot)
            .cloned()
            .unwrap_or_default())
    }

    fn lower_meshes(&mut self) -> Result<()> {
        let doc = self.doc;
        for mesh in doc.meshes() {
            let mut primitives = Vec::new();
            for primitive in doc.mesh_primitives(mesh) {
                let data = doc.get(primitive)?;
                let mut attributes = BTreeMap::new();
                for semantic in doc.primitive_semantics(primitive) {
                    let accessor = doc
                        .primitive_attribute(primitive, &semantic)
                        .ok_or(Error::Disposed)?;
                    attributes
                        .insert(semantic.clone(), self.accessor_index(accessor, "attribute")?);
                }
                let mut targets = Vec::new();
                for target in doc.primitive_targets(primitive) {
                    let mut wire_target = BTreeMap::new();
                    for semantic in doc.target_semantics(target) {
                        let accessor = doc
                            .target_attribute(target, &semantic)
                            .ok_or(Error::Disposed)?;
                        wire_target
                            .insert(semantic.clone(), self.accessor_index(accessor, "target")?);
                    }
                    targets.push(wire_target);
                }
                primitives.push(json::mesh::Primitive {
                    attributes,
                    indices: doc
                        .primitive_indices(primitive)
                        .map(|a| self.accessor_index(a, "index"))
                        .transpose()?,
                    material: doc.primitive_material(primitive).and_then(|m| {
                        self.index_of(m.key()).map(|i| json::Index::new(i as u32))
                    }),
                    mode: Checked::Valid(data.mode),
                    targets: (!targets.is_empty()).then_some(targets),
                    extensions: self.opaque_extensions(primitive.key())?,
                    extras: doc.extras(primitive.key())?.clone(),
                });
            }
            let weights = doc.get(mesh)?.weights.clone();
            let entry = json::mesh::Mesh {
                name: self.name_of(mesh.key())?,
                primitives,
                weights: (!weights.is_empty()).then_some(weights),
                extensions: self.opaque_extensions(mesh.key())?,
                extras: doc.extras(mesh.key())?.clone(),
            };
            self.json.meshes.push(entry);
        }
        Ok(())
    }

    fn lower_cameras(&mut self) -> Result<()> {
        let doc = self.doc;
        for camera in doc.cameras() {
            let data = doc.get(camera)?.clone();
            let mut entry = json::camera::Camera {
                name: self.name_of(camera.key())?,
                orthographic: None,
                perspective: None,
                type_: Checked::Valid(json::camera::Type::Perspective),
                extensions: self.opaque_extensions(camera.key())?,
                extras: doc.extras(camera.key())?.clone(),
            };
            match data.projection {
                Projection::Perspective {
                    aspect_ratio,
                    yfov,
                    zfar,
                    znear,
                } => {
                    entry.perspective = Some(json::camera::Perspective {
                        aspect_ratio,
                        yfov,
                        zfar,
                        znear,
                        extensions: Default::default(),
                        extras: Default::default(),
                    });
                }
                Projection::Orthographic {
                    xmag,
                    ymag,
                    zfar,
                    znear,
                } => {
                    entry.type_ = Checked::Valid(json::camera::Type::Orthographic);
                    entry.orthographic = Some(json::camera::Orthographic {
                        xmag,
                        ymag,
                        zfar,
                        znear,
                        extensions: Default::default(),
                        extras: Default::default(),
                    });
                }
            }
            self.json.cameras.push(entry);
        }
        Ok(())
    }

    fn lower_nodes(&mut self) -> Result<()> {
        let doc = self.doc;
        for node in doc.nodes() {
            let data = doc.get(node)?.clone();
            let children: Vec<_> = doc
                .node_children(node)
                .iter()
                .filter_map(|c| self.index_of(c.key()))
                .map(|i| json::Index::new(i as u32))
                .collect();
            let entry = json::scene::Node {
                camera: doc
                    .node_camera(node)
                    .and_then(|c| self.index_of(c.key()))
                    .map(|i| json::Index::new(i as u32)),
                children: (!children.is_empty()).then_some(children),
                matrix: None,
                mesh: doc
                    .node_mesh(node)
                    .and_then(|m| self.index_of(m.key()))
                    .map(|i| json::Index::new(i as u32)),
                name: self.name_of(node.key())?,
                rotation: (data.rotation != glam::Quat::IDENTITY)
                    .then(|| data.rotation.to_array()),
                scale: (data.scale != glam::Vec3::ONE).then(|| data.scale.to_array()),
                translation: (data.translation != glam::Vec3::ZERO)
                    .then(|| data.translation.to_array()),
                skin: doc
                    .node_skin(node)
                    .and_then(|s| self.index_of(s.key()))
                    .map(|i| json::Index::new(i as u32)),
                weights: (!data.weights.is_empty()).then(|| data.weights.clone()),
                extensions: self.opaque_extensions(node.key())?,
                extras: doc.extras(node.key())?.clone(),
            };
            self.json.nodes.push(entry);
        }
        Ok(())
    }

    fn lower_skins(&mut self) -> Result<()> {
        let doc = self.doc;
        for skin in doc.skins() {
            let entry = json::skin::Skin {
                inverse_bind_matrices: doc
                    .skin_inverse_bind_matrices(skin)
                    .map(|a| self.accessor_index(a, "inverse-bind"))
                    .transpose()?,
                joints: doc
                    .skin_joints(skin)
                    .iter()
                    .filter_map(|j| self.index_of(j.key()))
                    .map(|i| json::Index::new(i as u32))
                    .collect(),
                name: self.name_of(skin.key())?,
                skeleton: doc
                    .skin_skeleton(skin)
                    .and_then(|n| self.index_of(n.key()))
                    .map(|i| json::Index::new(i as u32)),
                extensions: self.opaque_extensions(skin.key())?,
                extras: doc.extras(skin.key())?.clone(),
            };
            self.json.skins.push(entry);
        }
        Ok(())
    }

    fn lower_scenes(&mut self) -> Result<()> {
        let doc = self.doc;
        for scene in doc.scenes() {
            let entry = json::scene::Scene {
                name: self.name_of(scene.key())?,
                nodes: doc
                    .scene_nodes(scene)
                    .iter()
                    .filter_map(|n| self.index_of(n.key()))
                    .map(|i| json::Index::new(i as u32))
                    .collect(),
                extensions: self.opaque_extensions(scene.key())?,
                extras: doc.extras(scene.key())?.clone(),
            };
            self.json.scenes.push(entry);
        }
        if let Some(scene) = doc.default_scene() {
            self.json.scene = self
                .index_of(scene.key())
                .map(|i| json::Index::new(i as u32));
        }
        Ok(())
    }

    fn lower_animations(&mut self) -> Result<()> {
        let doc = self.doc;
        for animation in doc.animations() {
            let samplers = doc.animation_samplers(animation);
            let mut wire_samplers = Vec::with_capacity(samplers.len());
            for sampler in &samplers {
                let data = doc.get(*sampler)?;
                let input = doc.sampler_input(*sampler).ok_or_else(|| {
                    Error::InvariantViolation("animation sampler has no input".into())
                })?;
                let output = doc.sampler_output(*sampler).ok_or_else(|| {
                    Error::InvariantViolation("animation sampler has no output".into())
                })?;
                let input_count = doc.get(input)?.count();
                let output_count = doc.get(output)?.count();
                if input_count > 0 {
                    let per_key = output_count / input_count;
                    let valid = output_count % input_count == 0
                        && if data.interpolation == json::animation::Interpolation::CubicSpline {
                            per_key % 3 == 0
                        } else {
                            per_key >= 1
                        };
                    if !valid {
                        return Err(Error::InvariantViolation(format!(
                            "sampler output count {output_count} does not follow from \
                             {input_count} keyframes with {:?} interpolation",
                            data.interpolation
                        )));
                    }
                }
                wire_samplers.push(json::animation::Sampler {
                    input: self.accessor_index(input, "sampler input")?,
                    interpolation: Checked::Valid(data.interpolation),
                    output: self.accessor_index(output, "sampler output")?,
                    extensions: Default::default(),
                    extras: Default::default(),
                });
            }

            let mut wire_channels = Vec::new();
            for channel in doc.animation_channels(animation) {
                let data = doc.get(channel)?;
                let sampler = doc.channel_sampler(channel).ok_or_else(|| {
                    Error::InvariantViolation("animation channel has no sampler".into())
                })?;
                let local = samplers
                    .iter()
                    .position(|s| *s == sampler)
                    .ok_or_else(|| {
                        Error::InvariantViolation(
                            "channel sampler is not in its animation's sampler list".into(),
                        )
                    })?;
                let target = doc.channel_target_node(channel).ok_or_else(|| {
                    Error::InvariantViolation("animation channel has no target node".into())
                })?;
                let node = self.index_of(target.key()).ok_or_else(|| {
                    Error::InvariantViolation("channel target is not listed under the root".into())
                })?;
                wire_channels.push(json::animation::Channel {
                    sampler: json::Index::new(local as u32),
                    target: json::animation::Target {
                        node: json::Index::new(node as u32),
                        path: Checked::Valid(data.target_path),
                        extensions: Default::default(),
                        extras: Default::default(),
                    },
                    extensions: self.opaque_extensions(channel.key())?,
                    extras: doc.extras(channel.key())?.clone(),
                });
            }

            let entry = json::animation::Animation {
                channels: wire_channels,
                name: self.name_of(animation.key())?,
                samplers: wire_samplers,
                extensions: self.opaque_extensions(animation.key())?,
                extras: doc.extras(animation.key())?.clone(),
            };
            self.json.animations.push(entry);
        }
        Ok(())
    }

    fn lower_root(&mut self) -> Result<()> {
        let doc = self.doc;
        let root = doc.root();
        let asset = &doc.get(root)?.asset;
        self.json.asset = json::Asset {
            copyright: asset.copyright.clone(),
            generator: asset.generator.clone(),
            min_version: asset.min_version.clone(),
            version: asset.version.clone(),
            extensions: Default::default(),
            extras: Default::default(),
        };
        self.json.extras = doc.extras(root.key())?.clone();
        self.json.extensions = self.opaque_extensions(root.key())?;
        Ok(())
    }
}

fn align(bytes: &mut Vec<u8>, to: usize) {
    while bytes.len() % to != 0 {
        bytes.push(0);
    }
}

fn bounds_value(values: Vec<f64>, float: bool) -> serde_json::Value {
    if float {
        serde_json::Value::from(
            values
                .into_iter()
                .map(|v| serde_json::Value::from(v as f32))
                .collect::<Vec<_>>(),
        )
    } else {
        serde_json::Value::from(
            values
                .into_iter()
                .map(|v| serde_json::Value::from(v as i64))
                .collect::<Vec<_>>(),
        )
    }
}

/// Compacts a sparse-flagged accessor when at most a third of its elements
/// deviate from zero; denser accessors are quietly written dense.
fn plan_sparse(data: &AccessorData) -> Option<SparsePayload> {
    let count = data.count();
    let multiplicity = data.multiplicity();
    if count == 0 {
        return None;
    }
    let array = data.array();
    let mut displaced = Vec::new();
    for element in 0..count {
        let nonzero = (0..multiplicity).any(|c| array.get(element * multiplicity + c) != 0.0);
        if nonzero {
            displaced.push(element);
        }
    }
    if displaced.len() * 3 > count {
        return None;
    }

    let index_component = if count <= usize::from(u8::MAX) + 1 {
        ComponentType::U8
    } else if count <= usize::from(u16::MAX) + 1 {
        ComponentType::U16
    } else {
        ComponentType::U32
    };
    let mut indices = ScalarArray::zeros(index_component, displaced.len());
    let mut values = ScalarArray::zeros(array.component_type(), displaced.len() * multiplicity);
    for (k, element) in displaced.iter().enumerate() {
        indices.set(k, *element as f64);
        for c in 0..multiplicity {
            values.set(k * multiplicity + c, array.get(element * multiplicity + c));
        }
    }
    Some(SparsePayload {
        count: displaced.len(),
        index_component,
        index_bytes: indices.to_le_bytes(),
        value_bytes: values.to_le_bytes(),
    })
}
