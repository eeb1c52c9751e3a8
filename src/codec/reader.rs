//! JSON/GLB to property graph.

use crate::codec::glb::Glb;
use crate::document::Document;
use crate::element::{ElementType, ScalarArray};
use crate::error::{Error, Result};
use crate::extension::ExtensionRegistry;
use crate::io::{IoPlatform, NativeIo};
use crate::properties::*;
use gltf_forge_json as json;
use json::validation::Checked;
use std::path::Path;

/// Read behavior knobs.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReadOptions {
    /// Continue past required extensions that have no registered handler,
    /// keeping their fragments opaque, instead of failing.
    pub tolerant: bool,
}

/// Reads documents from the wire formats.
pub struct Reader {
    registry: ExtensionRegistry,
    options: ReadOptions,
    io: Box<dyn IoPlatform>,
}

impl Default for Reader {
    fn default() -> Self {
        Self::new()
    }
}

impl Reader {
    /// A reader with no extensions, default options, and native file I/O.
    pub fn new() -> Self {
        Self {
            registry: ExtensionRegistry::new(),
            options: ReadOptions::default(),
            io: Box::new(NativeIo),
        }
    }

    /// Replaces the extension registry.
    pub fn with_registry(mut self, registry: ExtensionRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Replaces the read options.
    pub fn with_options(mut self, options: ReadOptions) -> Self {
        self.options = options;
        self
    }

    /// Replaces the I/O platform.
    pub fn with_io(mut self, io: Box<dyn IoPlatform>) -> Self {
        self.io = io;
        self
    }

    /// Reads a `.gltf` or `.glb` file, resolving relative resources against
    /// its directory.
    pub fn read_path(&self, path: &Path) -> Result<Document> {
        let data = self.io.read_file(path)?;
        self.read_slice(&data, path.parent())
    }

    /// Reads either container variant from memory. `base` anchors relative
    /// resource URIs.
    pub fn read_slice(&self, data: &[u8], base: Option<&Path>) -> Result<Document> {
        if Glb::sniff(data) {
            let glb = Glb::from_slice(data)?;
            let root = json::Root::from_slice(&glb.json)?;
            self.build(root, glb.bin.map(|b| b.into_owned()), base)
        } else {
            let root = json::Root::from_slice(data)?;
            self.build(root, None, base)
        }
    }

    fn build(
        &self,
        root: json::Root,
        bin: Option<Vec<u8>>,
        base: Option<&Path>,
    ) -> Result<Document> {
        let mut doc = Document::new();

        for name in &root.extensions_required {
            if !self.registry.contains(name) {
                if self.options.tolerant {
                    doc.logger().warn(&format!(
                        "required extension {name:?} has no handler; fragments kept opaque"
                    ));
                } else {
                    return Err(Error::UnsupportedExtension(name.clone()));
                }
            }
        }
        for name in &root.extensions_used {
            if !self.registry.contains(name) && !root.extensions_required.contains(name) {
                doc.logger()
                    .info(&format!("optional extension {name:?} passes through opaquely"));
            }
        }

        {
            let root_ref = doc.root();
            let data = doc.get_mut(root_ref)?;
            data.asset = AssetInfo {
                version: root.asset.version.clone(),
                generator: root.asset.generator.clone(),
                min_version: root.asset.min_version.clone(),
                copyright: root.asset.copyright.clone(),
            };
        }
        let root_key = doc.root().key();
        doc.set_extras(root_key, root.extras.clone())?;
        self.keep_opaque(&mut doc, root_key, &root.extensions)?;

        // Buffers.
        let mut buffer_bytes: Vec<Vec<u8>> = Vec::with_capacity(root.buffers.len());
        let mut buffer_refs: Vec<BufferRef> = Vec::with_capacity(root.buffers.len());
        for (index, buffer) in root.buffers.iter().enumerate() {
            let bytes = match &buffer.uri {
                None => match (&bin, index) {
                    (Some(bin), 0) => bin.clone(),
                    _ if buffer.byte_length == 0 => Vec::new(),
                    _ => {
                        return Err(Error::UnresolvedResource(format!(
                            "buffer {index} has no uri and no BIN chunk"
                        )))
                    }
                },
                Some(uri) if uri.starts_with("data:") => decode_data_uri(uri)?.1,
                Some(uri) => self.read_external(uri, base)?,
            };
            if bytes.len() < buffer.byte_length as usize {
                return Err(Error::OutOfRange(format!(
                    "buffer {index} holds {} bytes, {} declared",
                    bytes.len(),
                    buffer.byte_length
                )));
            }
            let reference = doc.create_buffer(buffer.name.as_deref().unwrap_or(""));
            doc.get_mut(reference)?.uri = buffer
                .uri
                .clone()
                .filter(|uri| !uri.starts_with("data:"));
            doc.set_extras(reference.key(), buffer.extras.clone())?;
            self.keep_opaque(&mut doc, reference.key(), &buffer.extensions)?;
            buffer_bytes.push(bytes);
            buffer_refs.push(reference);
        }

        // Accessors.
        let mut accessor_refs: Vec<AccessorRef> = Vec::with_capacity(root.accessors.len());
        for (index, accessor) in root.accessors.iter().enumerate() {
            let component = require(accessor.component_type, "accessor componentType")?;
            let element_type = require(accessor.type_, "accessor type")?;
            let count = accessor.count as usize;
            let element_size = element_type.multiplicity() * component.size();

            let mut packed;
            let mut backing_buffer = None;
            if let Some(view_index) = accessor.buffer_view {
                let (view, stride, buffer_index) =
                    view_slice(&root, &buffer_bytes, view_index.value())?;
                let stride = stride.unwrap_or(element_size);
                let offset = accessor.byte_offset.unwrap_or(0) as usize;
                if count > 0 {
                    let needed = offset + stride * (count - 1) + element_size;
                    if needed > view.len() {
                        return Err(Error::OutOfRange(format!(
                            "accessor {index} needs {needed} bytes, view holds {}",
                            view.len()
                        )));
                    }
                }
                if stride == element_size {
                    packed = view[offset..offset + count * element_size].to_vec();
                } else {
                    // De-interleave.
                    packed = Vec::with_capacity(count * element_size);
                    for element in 0..count {
                        let at = offset + element * stride;
                        packed.extend_from_slice(&view[at..at + element_size]);
                    }
                }
                backing_buffer = Some(buffer_index);
            } else {
                packed = vec![0; count * element_size];
            }

            let mut array = ScalarArray::from_le_bytes(component, &packed)?;
            if let Some(sparse) = &accessor.sparse {
                backing_buffer =
                    apply_sparse(&root, &buffer_bytes, sparse, element_type, &mut array)?
                        .or(backing_buffer);
            }

            let reference = doc.create_accessor(accessor.name.as_deref().unwrap_or(""));
            {
                let data = doc.get_mut(reference)?;
                data.set_element_type(element_type)?;
                data.set_array(array)?;
                data.set_normalized(accessor.normalized)?;
                data.set_sparse(accessor.sparse.is_some());
            }
            if let Some(buffer_index) = backing_buffer {
                doc.set_accessor_buffer(reference, Some(buffer_refs[buffer_index]))?;
            }
            doc.set_extras(reference.key(), accessor.extras.clone())?;
            self.keep_opaque(&mut doc, reference.key(), &accessor.extensions)?;
            accessor_refs.push(reference);
        }

        // Images fold into texture properties.
        let mut image_refs: Vec<TextureRef> = Vec::with_capacity(root.images.len());
        for (index, image) in root.images.iter().enumerate() {
            let reference = doc.create_texture(image.name.as_deref().unwrap_or(""));
            match (&image.uri, image.buffer_view) {
                (Some(uri), _) if uri.starts_with("data:") => {
                    let (mime, bytes) = decode_data_uri(uri)?;
                    let data = doc.get_mut(reference)?;
                    data.image = Some(bytes);
                    data.mime_type = image.mime_type.clone().or(mime);
                }
                (Some(uri), _) => {
                    let bytes = match self.read_external(uri, base) {
                        Ok(bytes) => Some(bytes),
                        Err(error) => {
                            doc.logger().warn(&format!(
                                "image {index}: {error}; keeping the uri unresolved"
                            ));
                            None
                        }
                    };
                    let data = doc.get_mut(reference)?;
                    data.uri = Some(uri.clone());
                    data.image = bytes;
                    data.mime_type = image.mime_type.clone().or_else(|| guess_mime_type(uri));
                }
                (None, Some(view_index)) => {
                    let (view, _, buffer_index) =
                        view_slice(&root, &buffer_bytes, view_index.value())?;
                    let bytes = view.to_vec();
                    let data = doc.get_mut(reference)?;
                    data.image = Some(bytes);
                    data.mime_type = image.mime_type.clone();
                    let buffer = buffer_refs[buffer_index];
                    doc.set_child(reference.key(), "buffer", Some(buffer.key()))?;
                }
                (None, None) => {
                    doc.logger()
                        .warn(&format!("image {index} declares no uri and no bufferView"));
                }
            }
            doc.set_extras(reference.key(), image.extras.clone())?;
            self.keep_opaque(&mut doc, reference.key(), &image.extensions)?;
            image_refs.push(reference);
        }

        // Wire textures map onto image properties, possibly through an
        // extension that relocates the source.
        let mut texture_images: Vec<Option<TextureRef>> = Vec::with_capacity(root.textures.len());
        for (index, texture) in root.textures.iter().enumerate() {
            let source = texture.source.map(|s| s.value()).or_else(|| {
                self.registry
                    .iter()
                    .find_map(|extension| extension.image_source(texture))
            });
            let image = match source {
                Some(source) => Some(*lookup(&image_refs, source, "texture source")?),
                None => {
                    doc.logger()
                        .warn(&format!("texture {index} has no resolvable source image"));
                    None
                }
            };
            texture_images.push(image);
        }

        // Materials.
        let mut material_refs: Vec<MaterialRef> = Vec::with_capacity(root.materials.len());
        for material in &root.materials {
            let reference = doc.create_material(material.name.as_deref().unwrap_or(""));
            {
                let data = doc.get_mut(reference)?;
                data.alpha_mode = require(material.alpha_mode, "material alphaMode")?;
                data.alpha_cutoff = material.alpha_cutoff.unwrap_or(0.5);
                data.double_sided = material.double_sided;
                data.base_color_factor = material.pbr_metallic_roughness.base_color_factor;
                data.metallic_factor = material.pbr_metallic_roughness.metallic_factor;
                data.roughness_factor = material.pbr_metallic_roughness.roughness_factor;
                data.emissive_factor = material.emissive_factor;
                if let Some(normal) = &material.normal_texture {
                    data.normal_scale = normal.scale;
                }
                if let Some(occlusion) = &material.occlusion_texture {
                    data.occlusion_strength = occlusion.strength;
                }
            }

            let bind = |doc: &mut Document,
                        slot: TextureSlot,
                        index: usize,
                        tex_coord: u32|
             -> Result<()> {
                let Some(texture) = *lookup(&texture_images, index, "material texture")? else {
                    return Ok(());
                };
                doc.set_material_texture(reference, slot, Some(texture))?;
                doc.set_material_texture_info(
                    reference,
                    slot,
                    slot_info(&root, index, tex_coord),
                )?;
                Ok(())
            };

            if let Some(info) = &material.pbr_metallic_roughness.base_color_texture {
                bind(&mut doc, TextureSlot::BaseColor, info.index.value(), info.tex_coord)?;
            }
            if let Some(info) = &material.pbr_metallic_roughness.metallic_roughness_texture {
                bind(
                    &mut doc,
                    TextureSlot::MetallicRoughness,
                    info.index.value(),
                    info.tex_coord,
                )?;
            }
            if let Some(info) = &material.normal_texture {
                bind(&mut doc, TextureSlot::Normal, info.index.value(), info.tex_coord)?;
            }
            if let Some(info) = &material.occlusion_texture {
                bind(&mut doc, TextureSlot::Occlusion, info.index.value(), info.tex_coord)?;
            }
            if let Some(info) = &material.emissive_texture {
                bind(&mut doc, TextureSlot::Emissive, info.index.value(), info.tex_coord)?;
            }

            doc.set_extras(reference.key(), material.extras.clone())?;
            self.keep_opaque(&mut doc, reference.key(), &material.extensions)?;
            material_refs.push(reference);
        }

        // Meshes.
        let mut mesh_refs: Vec<MeshRef> = Vec::with_capacity(root.meshes.len());
        for mesh in &root.meshes {
            let reference = doc.create_mesh(mesh.name.as_deref().unwrap_or(""));
            doc.get_mut(reference)?.weights = mesh.weights.clone().unwrap_or_default();
            for primitive in &mesh.primitives {
                let prim = doc.create_primitive();
                doc.get_mut(prim)?.mode = require(primitive.mode, "primitive mode")?;
                doc.add_mesh_primitive(reference, prim)?;
                for (semantic, accessor) in &primitive.attributes {
                    let accessor =
                        *lookup(&accessor_refs, accessor.value(), "primitive attribute")?;
                    doc.set_primitive_attribute(prim, semantic, Some(accessor))?;
                }
                if let Some(indices) = primitive.indices {
                    let accessor =
                        *lookup(&accessor_refs, indices.value(), "primitive indices")?;
                    doc.set_primitive_indices(prim, Some(accessor))?;
                }
                if let Some(material) = primitive.material {
                    let material =
                        *lookup(&material_refs, material.value(), "primitive material")?;
                    doc.set_primitive_material(prim, Some(material))?;
                }
                for target in primitive.targets.as_deref().unwrap_or(&[]) {
                    let target_ref = doc.create_primitive_target("");
                    doc.add_primitive_target(prim, target_ref)?;
                    for (semantic, accessor) in target {
                        let accessor =
                            *lookup(&accessor_refs, accessor.value(), "target attribute")?;
                        doc.set_target_attribute(target_ref, semantic, Some(accessor))?;
                    }
                }
                doc.set_extras(prim.key(), primitive.extras.clone())?;
                self.keep_opaque(&mut doc, prim.key(), &primitive.extensions)?;
            }
            doc.set_extras(reference.key(), mesh.extras.clone())?;
            self.keep_opaque(&mut doc, reference.key(), &mesh.extensions)?;
            mesh_refs.push(reference);
        }

        // Cameras.
        let mut camera_refs: Vec<CameraRef> = Vec::with_capacity(root.cameras.len());
        for (index, camera) in root.cameras.iter().enumerate() {
            let reference = doc.create_camera(camera.name.as_deref().unwrap_or(""));
            let projection = match require(camera.type_, "camera type")? {
                json::camera::Type::Perspective => {
                    let p = camera.perspective.as_ref().ok_or_else(|| {
                        Error::InvalidContainer(format!(
                            "camera {index} is perspective but has no projection record"
                        ))
                    })?;
                    Projection::Perspective {
                        aspect_ratio: p.aspect_ratio,
                        yfov: p.yfov,
                        zfar: p.zfar,
                        znear: p.znear,
                    }
                }
                json::camera::Type::Orthographic => {
                    let o = camera.orthographic.as_ref().ok_or_else(|| {
                        Error::InvalidContainer(format!(
                            "camera {index} is orthographic but has no projection record"
                        ))
                    })?;
                    Projection::Orthographic {
                        xmag: o.xmag,
                        ymag: o.ymag,
                        zfar: o.zfar,
                        znear: o.znear,
                    }
                }
            };
            doc.get_mut(reference)?.projection = projection;
            doc.set_extras(reference.key(), camera.extras.clone())?;
            self.keep_opaque(&mut doc, reference.key(), &camera.extensions)?;
            camera_refs.push(reference);
        }

        // Nodes, then skins, then the node links that need both.
        let mut node_refs: Vec<NodeRef> = Vec::with_capacity(root.nodes.len());
        for node in &root.nodes {
            let reference = doc.create_node(node.name.as_deref().unwrap_or(""));
            {
                let data = doc.get_mut(reference)?;
                if let Some(matrix) = node.matrix {
                    data.set_matrix(crate::math::matrix_from_wire(matrix));
                } else {
                    if let Some(translation) = node.translation {
                        data.translation = translation.into();
                    }
                    if let Some(rotation) = node.rotation {
                        data.rotation = glam::Quat::from_array(rotation);
                    }
                    if let Some(scale) = node.scale {
                        data.scale = scale.into();
                    }
                }
                data.weights = node.weights.clone().unwrap_or_default();
            }
            if let Some(mesh) = node.mesh {
                let mesh = *lookup(&mesh_refs, mesh.value(), "node mesh")?;
                doc.set_node_mesh(reference, Some(mesh))?;
            }
            if let Some(camera) = node.camera {
                let camera = *lookup(&camera_refs, camera.value(), "node camera")?;
                doc.set_node_camera(reference, Some(camera))?;
            }
            doc.set_extras(reference.key(), node.extras.clone())?;
            self.keep_opaque(&mut doc, reference.key(), &node.extensions)?;
            node_refs.push(reference);
        }

        let mut skin_refs: Vec<SkinRef> = Vec::with_capacity(root.skins.len());
        for skin in &root.skins {
            let reference = doc.create_skin(skin.name.as_deref().unwrap_or(""));
            for joint in &skin.joints {
                let joint = *lookup(&node_refs, joint.value(), "skin joint")?;
                doc.add_skin_joint(reference, joint)?;
            }
            if let Some(skeleton) = skin.skeleton {
                let skeleton = *lookup(&node_refs, skeleton.value(), "skin skeleton")?;
                doc.set_skin_skeleton(reference, Some(skeleton))?;
            }
            if let Some(matrices) = skin.inverse_bind_matrices {
                let accessor =
                    *lookup(&accessor_refs, matrices.value(), "inverse bind matrices")?;
                doc.set_skin_inverse_bind_matrices(reference, Some(accessor))?;
            }
            doc.set_extras(reference.key(), skin.extras.clone())?;
            self.keep_opaque(&mut doc, reference.key(), &skin.extensions)?;
            skin_refs.push(reference);
        }

        for (index, node) in root.nodes.iter().enumerate() {
            let reference = node_refs[index];
            for child in node.children.as_deref().unwrap_or(&[]) {
                let child = *lookup(&node_refs, child.value(), "node child")?;
                doc.add_node_child(reference, child)?;
            }
            if let Some(skin) = node.skin {
                let skin = *lookup(&skin_refs, skin.value(), "node skin")?;
                doc.set_node_skin(reference, Some(skin))?;
            }
        }

        // Scenes.
        let mut scene_refs: Vec<SceneRef> = Vec::with_capacity(root.scenes.len());
        for scene in &root.scenes {
            let reference = doc.create_scene(scene.name.as_deref().unwrap_or(""));
            for node in &scene.nodes {
                let node = *lookup(&node_refs, node.value(), "scene node")?;
                doc.add_scene_node(reference, node)?;
            }
            doc.set_extras(reference.key(), scene.extras.clone())?;
            self.keep_opaque(&mut doc, reference.key(), &scene.extensions)?;
            scene_refs.push(reference);
        }
        if let Some(scene) = root.scene {
            let scene = *lookup(&scene_refs, scene.value(), "default scene")?;
            doc.set_default_scene(Some(scene))?;
        }

        // Animations.
        let mut animation_refs: Vec<AnimationRef> = Vec::with_capacity(root.animations.len());
        for animation in &root.animations {
            let reference = doc.create_animation(animation.name.as_deref().unwrap_or(""));
            let mut sampler_refs = Vec::with_capacity(animation.samplers.len());
            for sampler in &animation.samplers {
                let sampler_ref = doc.create_animation_sampler();
                doc.get_mut(sampler_ref)?.interpolation =
                    require(sampler.interpolation, "sampler interpolation")?;
                doc.add_animation_sampler(reference, sampler_ref)?;
                let input = *lookup(&accessor_refs, sampler.input.value(), "sampler input")?;
                doc.set_sampler_input(sampler_ref, Some(input))?;
                let output =
                    *lookup(&accessor_refs, sampler.output.value(), "sampler output")?;
                doc.set_sampler_output(sampler_ref, Some(output))?;
                sampler_refs.push(sampler_ref);
            }
            for channel in &animation.channels {
                let channel_ref = doc.create_animation_channel();
                doc.get_mut(channel_ref)?.target_path =
                    require(channel.target.path, "channel target path")?;
                doc.add_animation_channel(reference, channel_ref)?;
                let sampler =
                    *lookup(&sampler_refs, channel.sampler.value(), "channel sampler")?;
                doc.set_channel_sampler(channel_ref, Some(sampler))?;
                let target =
                    *lookup(&node_refs, channel.target.node.value(), "channel target")?;
                doc.set_channel_target_node(channel_ref, Some(target))?;
            }
            doc.set_extras(reference.key(), animation.extras.clone())?;
            self.keep_opaque(&mut doc, reference.key(), &animation.extensions)?;
            animation_refs.push(reference);
        }

        // Registered extensions consume their fragments last, once every
        // host property exists.
        let mut context = ReadContext {
            json: &root,
            doc: &mut doc,
            buffers: buffer_refs,
            accessors: accessor_refs,
            images: image_refs,
            texture_images,
            materials: material_refs,
            meshes: mesh_refs,
            cameras: camera_refs,
            nodes: node_refs,
            skins: skin_refs,
            scenes: scene_refs,
            animations: animation_refs,
        };
        for extension in self.registry.iter() {
            extension.read(&mut context)?;
        }

        Ok(doc)
    }

    fn read_external(&self, uri: &str, base: Option<&Path>) -> Result<Vec<u8>> {
        if uri.contains("://") {
            return self.io.fetch(uri);
        }
        let decoded = urlencoding::decode(uri)
            .map_err(|_| Error::UnresolvedResource(format!("uri {uri:?} is not valid UTF-8")))?;
        let base = base.ok_or_else(|| {
            Error::UnresolvedResource(format!("no base path to resolve {uri:?} against"))
        })?;
        let path = self.io.resolve(base, &decoded);
        self.io.read_file(&path)
    }

    /// Stores fragments of unregistered extensions opaquely on the property.
    fn keep_opaque(
        &self,
        doc: &mut Document,
        key: crate::graph::PropertyKey,
        extensions: &json::RawExtensions,
    ) -> Result<()> {
        if extensions.is_empty() {
            return Ok(());
        }
        let opaque: json::RawExtensions = extensions
            .iter()
            .filter(|(name, _)| !self.registry.contains(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        doc.graph_mut().set_unrecognized_extensions(key, opaque)
    }
}

/// The partially built graph handed to extension readers.
pub struct ReadContext<'a> {
    json: &'a json::Root,
    doc: &'a mut Document,
    buffers: Vec<BufferRef>,
    accessors: Vec<AccessorRef>,
    /// One texture property per wire *image*.
    images: Vec<TextureRef>,
    /// Wire texture index to image property.
    texture_images: Vec<Option<TextureRef>>,
    materials: Vec<MaterialRef>,
    meshes: Vec<MeshRef>,
    cameras: Vec<CameraRef>,
    nodes: Vec<NodeRef>,
    skins: Vec<SkinRef>,
    scenes: Vec<SceneRef>,
    animations: Vec<AnimationRef>,
}

impl ReadContext<'_> {
    /// The raw wire document.
    pub fn json(&self) -> &json::Root {
        self.json
    }

    /// The document under construction.
    pub fn doc(&mut self) -> &mut Document {
        self.doc
    }

    /// Buffer properties by wire index.
    pub fn buffers(&self) -> &[BufferRef] {
        &self.buffers
    }

    /// Accessor properties by wire index.
    pub fn accessors(&self) -> &[AccessorRef] {
        &self.accessors
    }

    /// Texture properties by wire *image* index.
    pub fn images(&self) -> &[TextureRef] {
        &self.images
    }

    /// Material properties by wire index.
    pub fn materials(&self) -> &[MaterialRef] {
        &self.materials
    }

    /// Mesh properties by wire index.
    pub fn meshes(&self) -> &[MeshRef] {
        &self.meshes
    }

    /// Camera properties by wire index.
    pub fn cameras(&self) -> &[CameraRef] {
        &self.cameras
    }

    /// Node properties by wire index.
    pub fn nodes(&self) -> &[NodeRef] {
        &self.nodes
    }

    /// Skin properties by wire index.
    pub fn skins(&self) -> &[SkinRef] {
        &self.skins
    }

    /// Scene properties by wire index.
    pub fn scenes(&self) -> &[SceneRef] {
        &self.scenes
    }

    /// Animation properties by wire index.
    pub fn animations(&self) -> &[AnimationRef] {
        &self.animations
    }

    /// Resolves a wire `textureInfo` fragment to the image property and the
    /// edge-resident sampling parameters.
    pub fn texture_slot(
        &self,
        info: &json::texture::Info,
    ) -> Result<(TextureRef, TextureInfo)> {
        let index = info.index.value();
        let image = lookup(&self.texture_images, index, "texture")?
            .ok_or_else(|| {
                Error::UnresolvedResource(format!("texture {index} has no source image"))
            })?;
        Ok((image, slot_info(self.json, index, info.tex_coord)))
    }
}

fn require<T>(value: Checked<T>, what: &str) -> Result<T> {
    match value {
        Checked::Valid(value) => Ok(value),
        Checked::Invalid => Err(Error::InvalidContainer(format!("invalid {what}"))),
    }
}

fn lookup<'a, T>(values: &'a [T], index: usize, what: &str) -> Result<&'a T> {
    values.get(index).ok_or_else(|| {
        Error::UnresolvedResource(format!("{what} index {index} is out of range"))
    })
}

fn view_slice<'a>(
    root: &json::Root,
    buffers: &'a [Vec<u8>],
    index: usize,
) -> Result<(&'a [u8], Option<usize>, usize)> {
    let view = lookup(&root.buffer_views, index, "bufferView")?;
    let buffer_index = view.buffer.value();
    let buffer = lookup(buffers, buffer_index, "buffer")?;
    let offset = view.byte_offset.unwrap_or(0) as usize;
    let length = view.byte_length as usize;
    if offset + length > buffer.len() {
        return Err(Error::OutOfRange(format!(
            "bufferView {index} spans {offset}..{} but the buffer holds {} bytes",
            offset + length,
            buffer.len()
        )));
    }
    Ok((
        &buffer[offset..offset + length],
        view.byte_stride.map(|s| s as usize),
        buffer_index,
    ))
}

fn apply_sparse(
    root: &json::Root,
    buffers: &[Vec<u8>],
    sparse: &json::accessor::sparse::Sparse,
    element_type: ElementType,
    array: &mut ScalarArray,
) -> Result<Option<usize>> {
    let multiplicity = element_type.multiplicity();
    let index_component = require(sparse.indices.component_type, "sparse index componentType")?;
    if !index_component.is_index_type() {
        return Err(Error::InvalidContainer(
            "sparse indices must be u8/u16/u32".into(),
        ));
    }

    let (index_view, _, _) = view_slice(root, buffers, sparse.indices.buffer_view.value())?;
    let index_offset = sparse.indices.byte_offset as usize;
    let count = sparse.count as usize;
    let index_bytes = count * index_component.size();
    if index_offset + index_bytes > index_view.len() {
        return Err(Error::OutOfRange("sparse indices exceed their view".into()));
    }
    let indices = ScalarArray::from_le_bytes(
        index_component,
        &index_view[index_offset..index_offset + index_bytes],
    )?;

    let (value_view, _, value_buffer) =
        view_slice(root, buffers, sparse.values.buffer_view.value())?;
    let value_offset = sparse.values.byte_offset as usize;
    let value_bytes = count * multiplicity * array.component_type().size();
    if value_offset + value_bytes > value_view.len() {
        return Err(Error::OutOfRange("sparse values exceed their view".into()));
    }
    let values = ScalarArray::from_le_bytes(
        array.component_type(),
        &value_view[value_offset..value_offset + value_bytes],
    )?;

    let element_count = array.len() / multiplicity.max(1);
    for k in 0..count {
        let target = indices.get(k) as usize;
        if target >= element_count {
            return Err(Error::OutOfRange(format!(
                "sparse index {target} exceeds element count {element_count}"
            )));
        }
        for component in 0..multiplicity {
            array.set(
                target * multiplicity + component,
                values.get(k * multiplicity + component),
            );
        }
    }
    Ok(Some(value_buffer))
}

fn slot_info(root: &json::Root, texture_index: usize, tex_coord: u32) -> TextureInfo {
    let mut info = TextureInfo {
        tex_coord,
        ..Default::default()
    };
    let Some(texture) = root.textures.get(texture_index) else {
        return info;
    };
    let Some(sampler) = texture.sampler.and_then(|s| root.samplers.get(s.value())) else {
        return info;
    };
    info.mag_filter = sampler.mag_filter.and_then(Checked::ok);
    info.min_filter = sampler.min_filter.and_then(Checked::ok);
    info.wrap_s = sampler.wrap_s.ok().unwrap_or_default();
    info.wrap_t = sampler.wrap_t.ok().unwrap_or_default();
    info
}

fn decode_data_uri(uri: &str) -> Result<(Option<String>, Vec<u8>)> {
    let rest = uri.strip_prefix("data:").ok_or_else(|| {
        Error::UnresolvedResource(format!("{uri:?} is not a data uri"))
    })?;
    let (header, payload) = rest.split_once(',').ok_or_else(|| {
        Error::UnresolvedResource("data uri has no payload separator".into())
    })?;
    let mime = header
        .split(';')
        .next()
        .filter(|m| !m.is_empty())
        .map(str::to_string);
    if header.ends_with(";base64") {
        Ok((mime, base64::decode(payload)?))
    } else {
        Ok((mime, payload.as_bytes().to_vec()))
    }
}

fn guess_mime_type(uri: &str) -> Option<String> {
    let lower = uri.to_ascii_lowercase();
    if lower.ends_with(".png") {
        Some("image/png".to_string())
    } else if lower.ends_with(".jpg") || lower.ends_with(".jpeg") {
        Some("image/jpeg".to_string())
    } else if lower.ends_with(".ktx2") {
        Some("image/ktx2".to_string())
    } else if lower.ends_with(".webp") {
        Some("image/webp".to_string())
    } else {
        None
    }
}
