//! The root aggregate and facade over the property graph.

use crate::error::{Error, Result};
use crate::extension::ExtensionPropertyData;
use crate::graph::{EdgeAttributes, Graph, PropertyKey};
use crate::io::{Logger, TracingLogger};
use crate::properties::*;
use crate::property::{
    field_edges, properties_equal, property_hash, ExtensionPropertyRef, HashCache, PropertyData,
    PropertyVariant, Ref,
};
use crate::schema::{EdgeKind, PropertyType};
use glam::Mat4;
use std::fmt;

/// An editable glTF asset: one graph, one root, one logger.
///
/// All factories register the new property under the root's corresponding
/// list, so everything created through the document starts out reachable.
/// Properties detached from every scene stay alive until disposed or
/// pruned.
pub struct Document {
    graph: Graph,
    root: PropertyKey,
    logger: Box<dyn Logger>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("graph", &self.graph)
            .finish()
    }
}

impl Document {
    /// Creates an empty document holding only the root property.
    pub fn new() -> Self {
        let mut graph = Graph::new();
        let root = graph.add_property(PropertyData::Root(RootData::default()), "");
        Self {
            graph,
            root,
            logger: Box::new(TracingLogger),
        }
    }

    /// The underlying graph, for listeners and low-level traversal.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// The underlying graph, mutably.
    pub fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    /// The root property.
    pub fn root(&self) -> RootRef {
        Ref::new(self.root)
    }

    /// The injected diagnostic sink.
    pub fn logger(&self) -> &dyn Logger {
        self.logger.as_ref()
    }

    /// Replaces the diagnostic sink.
    pub fn set_logger(&mut self, logger: Box<dyn Logger>) {
        self.logger = logger;
    }

    // ------------------------------------------------------------------
    // Typed access

    /// The payload of a property.
    pub fn get<T: PropertyVariant>(&self, reference: Ref<T>) -> Result<&T> {
        T::variant(self.graph.data(reference.key())?).ok_or_else(|| {
            Error::InvariantViolation("handle does not match the property's type".into())
        })
    }

    /// The payload of a property, mutably.
    ///
    /// Value attributes carry no change events; edge mutations go through
    /// the document or graph instead.
    pub fn get_mut<T: PropertyVariant>(&mut self, reference: Ref<T>) -> Result<&mut T> {
        T::variant_mut(self.graph.data_mut(reference.key())?).ok_or_else(|| {
            Error::InvariantViolation("handle does not match the property's type".into())
        })
    }

    /// Wraps an untyped key after checking its payload type.
    pub fn as_ref<T: PropertyVariant>(&self, key: PropertyKey) -> Result<Ref<T>> {
        if self.graph.data(key)?.property_type() == T::TYPE {
            Ok(Ref::new(key))
        } else {
            Err(Error::InvariantViolation(
                "key does not refer to the expected property type".into(),
            ))
        }
    }

    /// The discriminant of a property.
    pub fn property_type(&self, key: PropertyKey) -> Result<PropertyType> {
        Ok(self.graph.data(key)?.property_type())
    }

    /// The property's name.
    pub fn name(&self, key: PropertyKey) -> Result<&str> {
        self.graph.name(key)
    }

    /// Renames a property.
    pub fn set_name(&mut self, key: PropertyKey, name: impl Into<String>) -> Result<()> {
        self.graph.set_name(key, name)
    }

    /// The property's extras.
    pub fn extras(&self, key: PropertyKey) -> Result<&serde_json::Value> {
        self.graph.extras(key)
    }

    /// Replaces the property's extras.
    pub fn set_extras(&mut self, key: PropertyKey, extras: serde_json::Value) -> Result<()> {
        self.graph.set_extras(key, extras)
    }

    /// Disposes a property: severs every incident edge, then invalidates
    /// the handle.
    pub fn dispose(&mut self, key: PropertyKey) -> Result<()> {
        if key == self.root {
            return Err(Error::InvariantViolation(
                "the root property cannot be disposed".into(),
            ));
        }
        self.graph.dispose(key)
    }

    /// Structural equality of two properties. See
    /// [`properties_equal`](crate::property::properties_equal).
    pub fn equals(&self, a: PropertyKey, b: PropertyKey, skip: &[&str]) -> Result<bool> {
        properties_equal(&self.graph, a, b, skip)
    }

    /// Structural hash of a property, consistent with [`Self::equals`].
    pub fn to_hash(
        &self,
        key: PropertyKey,
        skip: &[&str],
        cache: Option<&mut HashCache>,
    ) -> Result<u32> {
        property_hash(&self.graph, key, skip, cache)
    }

    /// Distinct parents of a property.
    pub fn list_parents(&self, key: PropertyKey) -> Result<Vec<PropertyKey>> {
        self.graph.list_parents(key)
    }

    // ------------------------------------------------------------------
    // Factories

    fn create_property<T: PropertyVariant + Default>(
        &mut self,
        name: &str,
        list: Option<&'static str>,
    ) -> Ref<T> {
        let key = self.graph.add_property(T::default().into_data(), name);
        if let Some(field) = list {
            self.graph
                .connect(self.root, key, field, EdgeAttributes::None)
                .expect("schema accepts every root list entry");
        }
        Ref::new(key)
    }

    /// Creates a scene, listed under the root.
    pub fn create_scene(&mut self, name: &str) -> SceneRef {
        self.create_property(name, Some("scenes"))
    }

    /// Creates a node, listed under the root.
    pub fn create_node(&mut self, name: &str) -> NodeRef {
        self.create_property(name, Some("nodes"))
    }

    /// Creates a mesh, listed under the root.
    pub fn create_mesh(&mut self, name: &str) -> MeshRef {
        self.create_property(name, Some("meshes"))
    }

    /// Creates a material, listed under the root.
    pub fn create_material(&mut self, name: &str) -> MaterialRef {
        self.create_property(name, Some("materials"))
    }

    /// Creates a texture, listed under the root.
    pub fn create_texture(&mut self, name: &str) -> TextureRef {
        self.create_property(name, Some("textures"))
    }

    /// Creates an empty `SCALAR`/`F32` accessor, listed under the root.
    pub fn create_accessor(&mut self, name: &str) -> AccessorRef {
        self.create_property(name, Some("accessors"))
    }

    /// Creates a buffer, listed under the root.
    pub fn create_buffer(&mut self, name: &str) -> BufferRef {
        self.create_property(name, Some("buffers"))
    }

    /// Creates a skin, listed under the root.
    pub fn create_skin(&mut self, name: &str) -> SkinRef {
        self.create_property(name, Some("skins"))
    }

    /// Creates a camera, listed under the root.
    pub fn create_camera(&mut self, name: &str) -> CameraRef {
        self.create_property(name, Some("cameras"))
    }

    /// Creates an animation, listed under the root.
    pub fn create_animation(&mut self, name: &str) -> AnimationRef {
        self.create_property(name, Some("animations"))
    }

    /// Creates an unattached primitive; attach it with
    /// [`add_mesh_primitive`](Self::add_mesh_primitive).
    pub fn create_primitive(&mut self) -> PrimitiveRef {
        self.create_property("", None)
    }

    /// Creates an unattached morph target.
    pub fn create_primitive_target(&mut self, name: &str) -> PrimitiveTargetRef {
        self.create_property(name, None)
    }

    /// Creates an unattached animation channel.
    pub fn create_animation_channel(&mut self) -> AnimationChannelRef {
        self.create_property("", None)
    }

    /// Creates an unattached animation sampler.
    pub fn create_animation_sampler(&mut self) -> AnimationSamplerRef {
        self.create_property("", None)
    }

    /// Creates an extension property from its payload.
    pub fn create_extension_property(
        &mut self,
        data: Box<dyn ExtensionPropertyData>,
        name: &str,
    ) -> ExtensionPropertyRef {
        let key = self.graph.add_property(PropertyData::Extension(data), name);
        Ref::new(key)
    }

    // ------------------------------------------------------------------
    // Generic edge fields

    /// The child of a single-kind edge field.
    pub fn child(&self, parent: PropertyKey, field: &str) -> Option<PropertyKey> {
        let edges = field_edges(&self.graph, parent, field).ok()?;
        let key = edges.first()?;
        Some(self.graph.edge(*key).ok()?.child)
    }

    /// Replaces the child of a single-kind edge field.
    ///
    /// Listeners observe `EdgeRemoved` for the old edge and `EdgeAdded` for
    /// the new one, in that order, before this returns. Nothing is mutated
    /// when validation fails.
    pub fn set_child(
        &mut self,
        parent: PropertyKey,
        field: &str,
        child: Option<PropertyKey>,
    ) -> Result<()> {
        self.replace_single(parent, field, child, None)
    }

    /// Replaces the child of a texture slot field, preserving the slot's
    /// `TextureInfo` when re-targeting and dropping it atomically when
    /// clearing.
    pub fn set_texture_child(
        &mut self,
        parent: PropertyKey,
        field: &str,
        child: Option<PropertyKey>,
    ) -> Result<()> {
        let info = self
            .texture_info(parent, field)
            .cloned()
            .unwrap_or_default();
        self.replace_single(parent, field, child, Some(info))
    }

    fn replace_single(
        &mut self,
        parent: PropertyKey,
        field: &str,
        child: Option<PropertyKey>,
        info: Option<TextureInfo>,
    ) -> Result<()> {
        let def = self.graph.edge_field(parent, field)?;
        if def.kind != EdgeKind::Single {
            return Err(Error::InvariantViolation(format!(
                "field {field:?} is not a single-child field"
            )));
        }
        let attributes = match info {
            Some(info) => EdgeAttributes::TextureInfo(Box::new(info)),
            None => EdgeAttributes::None,
        };
        if let Some(child) = child {
            self.graph
                .validate_connect(parent, child, field, &attributes)?;
        }
        self.graph.begin_batch();
        for key in field_edges(&self.graph, parent, field)? {
            self.graph.disconnect(key)?;
        }
        if let Some(child) = child {
            self.graph.connect(parent, child, field, attributes)?;
        }
        self.graph.end_batch();
        Ok(())
    }

    /// The children of a list-kind edge field, in order.
    pub fn children(&self, parent: PropertyKey, field: &str) -> Result<Vec<PropertyKey>> {
        field_edges(&self.graph, parent, field)?
            .into_iter()
            .map(|key| Ok(self.graph.edge(key)?.child))
            .collect()
    }

    /// Appends a child to a list-kind edge field.
    pub fn push_child(
        &mut self,
        parent: PropertyKey,
        field: &str,
        child: PropertyKey,
    ) -> Result<()> {
        let def = self.graph.edge_field(parent, field)?;
        if def.kind != EdgeKind::List {
            return Err(Error::InvariantViolation(format!(
                "field {field:?} is not a list field"
            )));
        }
        self.graph
            .connect(parent, child, field, EdgeAttributes::None)?;
        Ok(())
    }

    /// Removes the first occurrence of a child from a list-kind edge field.
    pub fn remove_child(
        &mut self,
        parent: PropertyKey,
        field: &str,
        child: PropertyKey,
    ) -> Result<()> {
        for key in field_edges(&self.graph, parent, field)? {
            if self.graph.edge(key)?.child == child {
                return self.graph.disconnect(key);
            }
        }
        Ok(())
    }

    /// The keys of a map-kind edge field.
    pub fn map_keys(&self, parent: PropertyKey, field: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        for edge in field_edges(&self.graph, parent, field)? {
            if let Some(key) = self.graph.edge(edge)?.attributes.semantic() {
                keys.push(key.to_string());
            }
        }
        Ok(keys)
    }

    /// The child stored under `key` in a map-kind edge field.
    pub fn map_child(&self, parent: PropertyKey, field: &str, key: &str) -> Option<PropertyKey> {
        for edge in field_edges(&self.graph, parent, field).ok()? {
            let edge = self.graph.edge(edge).ok()?;
            if edge.attributes.semantic() == Some(key) {
                return Some(edge.child);
            }
        }
        None
    }

    /// Inserts, replaces, or removes the child under `key` in a map-kind
    /// edge field.
    pub fn set_map_child(
        &mut self,
        parent: PropertyKey,
        field: &str,
        key: &str,
        child: Option<PropertyKey>,
    ) -> Result<()> {
        let def = self.graph.edge_field(parent, field)?;
        if def.kind != EdgeKind::Map {
            return Err(Error::InvariantViolation(format!(
                "field {field:?} is not a map field"
            )));
        }
        let attributes = EdgeAttributes::Semantic(key.to_string());
        if let Some(child) = child {
            self.graph
                .validate_connect(parent, child, field, &attributes)?;
        }
        self.graph.begin_batch();
        for edge in field_edges(&self.graph, parent, field)? {
            if self.graph.edge(edge)?.attributes.semantic() == Some(key) {
                self.graph.disconnect(edge)?;
            }
        }
        if let Some(child) = child {
            self.graph.connect(parent, child, field, attributes)?;
        }
        self.graph.end_batch();
        Ok(())
    }

    /// The `TextureInfo` riding on a texture slot edge.
    pub fn texture_info(&self, parent: PropertyKey, field: &str) -> Option<&TextureInfo> {
        let edges = field_edges(&self.graph, parent, field).ok()?;
        self.graph
            .edge(*edges.first()?)
            .ok()?
            .attributes
            .texture_info()
    }

    /// Replaces the `TextureInfo` on an occupied texture slot.
    pub fn set_texture_info(
        &mut self,
        parent: PropertyKey,
        field: &str,
        info: TextureInfo,
    ) -> Result<()> {
        let edges = field_edges(&self.graph, parent, field)?;
        let Some(edge) = edges.first() else {
            return Err(Error::InvariantViolation(format!(
                "texture slot {field:?} is empty"
            )));
        };
        self.graph
            .set_edge_attributes(*edge, EdgeAttributes::TextureInfo(Box::new(info)))
    }

    fn ref_child<T: PropertyVariant>(&self, parent: PropertyKey, field: &str) -> Option<Ref<T>> {
        self.child(parent, field).map(Ref::new)
    }

    fn ref_children<T: PropertyVariant>(&self, parent: PropertyKey, field: &str) -> Vec<Ref<T>> {
        self.children(parent, field)
            .unwrap_or_default()
            .into_iter()
            .map(Ref::new)
            .collect()
    }

    // ------------------------------------------------------------------
    // Root lists

    /// Scenes listed under the root.
    pub fn scenes(&self) -> Vec<SceneRef> {
        self.ref_children(self.root, "scenes")
    }

    /// Nodes listed under the root.
    pub fn nodes(&self) -> Vec<NodeRef> {
        self.ref_children(self.root, "nodes")
    }

    /// Meshes listed under the root.
    pub fn meshes(&self) -> Vec<MeshRef> {
        self.ref_children(self.root, "meshes")
    }

    /// Materials listed under the root.
    pub fn materials(&self) -> Vec<MaterialRef> {
        self.ref_children(self.root, "materials")
    }

    /// Textures listed under the root.
    pub fn textures(&self) -> Vec<TextureRef> {
        self.ref_children(self.root, "textures")
    }

    /// Accessors listed under the root.
    pub fn accessors(&self) -> Vec<AccessorRef> {
        self.ref_children(self.root, "accessors")
    }

    /// Buffers listed under the root.
    pub fn buffers(&self) -> Vec<BufferRef> {
        self.ref_children(self.root, "buffers")
    }

    /// Skins listed under the root.
    pub fn skins(&self) -> Vec<SkinRef> {
        self.ref_children(self.root, "skins")
    }

    /// Cameras listed under the root.
    pub fn cameras(&self) -> Vec<CameraRef> {
        self.ref_children(self.root, "cameras")
    }

    /// Animations listed under the root.
    pub fn animations(&self) -> Vec<AnimationRef> {
        self.ref_children(self.root, "animations")
    }

    /// The default scene.
    pub fn default_scene(&self) -> Option<SceneRef> {
        self.ref_child(self.root, "scene")
    }

    /// Sets or clears the default scene.
    pub fn set_default_scene(&mut self, scene: Option<SceneRef>) -> Result<()> {
        self.set_child(self.root, "scene", scene.map(Ref::key))
    }

    // ------------------------------------------------------------------
    // Scene and node hierarchy

    /// Detaches a node from its current scene or node parent, if any.
    ///
    /// A node has at most one parent node or scene; attachment operations
    /// call this first.
    fn detach_node(&mut self, node: NodeRef) -> Result<()> {
        for key in self.graph.parent_edges(node.key())? {
            let edge = self.graph.edge(key)?;
            let parent_ty = self.graph.data(edge.parent)?.property_type();
            let hierarchy = (edge.name == "children" && parent_ty == PropertyType::Node)
                || (edge.name == "nodes" && parent_ty == PropertyType::Scene);
            if hierarchy {
                self.graph.disconnect(key)?;
            }
        }
        Ok(())
    }

    /// Adds a node to a scene's roots, detaching it from any previous
    /// scene or node parent.
    pub fn add_scene_node(&mut self, scene: SceneRef, node: NodeRef) -> Result<()> {
        self.graph
            .validate_connect(scene.key(), node.key(), "nodes", &EdgeAttributes::None)?;
        self.graph.begin_batch();
        self.detach_node(node)?;
        self.graph
            .connect(scene.key(), node.key(), "nodes", EdgeAttributes::None)?;
        self.graph.end_batch();
        Ok(())
    }

    /// Removes a node from a scene's roots.
    pub fn remove_scene_node(&mut self, scene: SceneRef, node: NodeRef) -> Result<()> {
        self.remove_child(scene.key(), "nodes", node.key())
    }

    /// The root nodes of a scene.
    pub fn scene_nodes(&self, scene: SceneRef) -> Vec<NodeRef> {
        self.ref_children(scene.key(), "nodes")
    }

    /// Adds a child node, detaching it from any previous scene or node
    /// parent. Rejected with [`Error::Cycle`] if `child` is an ancestor of
    /// `parent`.
    pub fn add_node_child(&mut self, parent: NodeRef, child: NodeRef) -> Result<()> {
        self.graph
            .validate_connect(parent.key(), child.key(), "children", &EdgeAttributes::None)?;
        self.graph.begin_batch();
        self.detach_node(child)?;
        self.graph
            .connect(parent.key(), child.key(), "children", EdgeAttributes::None)?;
        self.graph.end_batch();
        Ok(())
    }

    /// Removes a child node.
    pub fn remove_node_child(&mut self, parent: NodeRef, child: NodeRef) -> Result<()> {
        self.remove_child(parent.key(), "children", child.key())
    }

    /// The children of a node.
    pub fn node_children(&self, node: NodeRef) -> Vec<NodeRef> {
        self.ref_children(node.key(), "children")
    }

    /// Sets or clears the node's mesh.
    pub fn set_node_mesh(&mut self, node: NodeRef, mesh: Option<MeshRef>) -> Result<()> {
        self.set_child(node.key(), "mesh", mesh.map(Ref::key))
    }

    /// The node's mesh.
    pub fn node_mesh(&self, node: NodeRef) -> Option<MeshRef> {
        self.ref_child(node.key(), "mesh")
    }

    /// Sets or clears the node's skin.
    pub fn set_node_skin(&mut self, node: NodeRef, skin: Option<SkinRef>) -> Result<()> {
        self.set_child(node.key(), "skin", skin.map(Ref::key))
    }

    /// The node's skin.
    pub fn node_skin(&self, node: NodeRef) -> Option<SkinRef> {
        self.ref_child(node.key(), "skin")
    }

    /// Sets or clears the node's camera.
    pub fn set_node_camera(&mut self, node: NodeRef, camera: Option<CameraRef>) -> Result<()> {
        self.set_child(node.key(), "camera", camera.map(Ref::key))
    }

    /// The node's camera.
    pub fn node_camera(&self, node: NodeRef) -> Option<CameraRef> {
        self.ref_child(node.key(), "camera")
    }

    /// The node's world transform: the product of its ancestors' local
    /// transforms and its own.
    pub fn node_world_matrix(&self, node: NodeRef) -> Result<Mat4> {
        let mut matrix = self.get(node)?.matrix();
        let mut current = node.key();
        loop {
            let mut parent_node = None;
            for key in self.graph.parent_edges(current)? {
                let edge = self.graph.edge(key)?;
                if edge.name == "children"
                    && self.graph.data(edge.parent)?.property_type() == PropertyType::Node
                {
                    parent_node = Some(edge.parent);
                    break;
                }
            }
            let Some(parent) = parent_node else {
                return Ok(matrix);
            };
            let parent_ref: NodeRef = Ref::new(parent);
            matrix = self.get(parent_ref)?.matrix() * matrix;
            current = parent;
        }
    }

    // ------------------------------------------------------------------
    // Meshes and primitives

    /// Appends a primitive to a mesh.
    pub fn add_mesh_primitive(&mut self, mesh: MeshRef, primitive: PrimitiveRef) -> Result<()> {
        self.push_child(mesh.key(), "primitives", primitive.key())
    }

    /// The primitives of a mesh, in order.
    pub fn mesh_primitives(&self, mesh: MeshRef) -> Vec<PrimitiveRef> {
        self.ref_children(mesh.key(), "primitives")
    }

    /// Sets or clears the index accessor of a primitive.
    ///
    /// Indices must be `SCALAR` with an unsigned integer component type.
    pub fn set_primitive_indices(
        &mut self,
        primitive: PrimitiveRef,
        indices: Option<AccessorRef>,
    ) -> Result<()> {
        if let Some(accessor) = indices {
            let data = self.get(accessor)?;
            if data.element_type() != crate::element::ElementType::Scalar
                || !data.component_type().is_index_type()
            {
                return Err(Error::InvariantViolation(
                    "index accessors must be SCALAR u8/u16/u32".into(),
                ));
            }
        }
        self.set_child(primitive.key(), "indices", indices.map(Ref::key))
    }

    /// The index accessor of a primitive.
    pub fn primitive_indices(&self, primitive: PrimitiveRef) -> Option<AccessorRef> {
        self.ref_child(primitive.key(), "indices")
    }

    /// Sets, replaces, or removes an attribute accessor of a primitive.
    ///
    /// Every attribute of one primitive must have the same element count.
    pub fn set_primitive_attribute(
        &mut self,
        primitive: PrimitiveRef,
        semantic: &str,
        accessor: Option<AccessorRef>,
    ) -> Result<()> {
        if let Some(accessor) = accessor {
            let count = self.get(accessor)?.count();
            for other in self.primitive_semantics(primitive) {
                if other == semantic {
                    continue;
                }
                if let Some(existing) = self.primitive_attribute(primitive, &other) {
                    let existing_count = self.get(existing)?.count();
                    if existing_count != count {
                        return Err(Error::InvariantViolation(format!(
                            "attribute {semantic:?} has {count} elements but {other:?} has {existing_count}"
                        )));
                    }
                }
            }
        }
        self.set_map_child(
            primitive.key(),
            "attributes",
            semantic,
            accessor.map(Ref::key),
        )
    }

    /// The attribute accessor stored under `semantic`.
    pub fn primitive_attribute(
        &self,
        primitive: PrimitiveRef,
        semantic: &str,
    ) -> Option<AccessorRef> {
        self.map_child(primitive.key(), "attributes", semantic)
            .map(Ref::new)
    }

    /// The attribute semantics of a primitive.
    pub fn primitive_semantics(&self, primitive: PrimitiveRef) -> Vec<String> {
        self.map_keys(primitive.key(), "attributes")
            .unwrap_or_default()
    }

    /// Sets or clears the material of a primitive.
    pub fn set_primitive_material(
        &mut self,
        primitive: PrimitiveRef,
        material: Option<MaterialRef>,
    ) -> Result<()> {
        self.set_child(primitive.key(), "material", material.map(Ref::key))
    }

    /// The material of a primitive.
    pub fn primitive_material(&self, primitive: PrimitiveRef) -> Option<MaterialRef> {
        self.ref_child(primitive.key(), "material")
    }

    /// Appends a morph target to a primitive.
    pub fn add_primitive_target(
        &mut self,
        primitive: PrimitiveRef,
        target: PrimitiveTargetRef,
    ) -> Result<()> {
        self.push_child(primitive.key(), "targets", target.key())
    }

    /// The morph targets of a primitive, in order.
    pub fn primitive_targets(&self, primitive: PrimitiveRef) -> Vec<PrimitiveTargetRef> {
        self.ref_children(primitive.key(), "targets")
    }

    /// Sets, replaces, or removes a displacement accessor of a morph target.
    ///
    /// When the target is attached to a primitive with a `POSITION`
    /// attribute, the displacement count must match it.
    pub fn set_target_attribute(
        &mut self,
        target: PrimitiveTargetRef,
        semantic: &str,
        accessor: Option<AccessorRef>,
    ) -> Result<()> {
        if let Some(accessor) = accessor {
            let count = self.get(accessor)?.count();
            for parent in self.graph.list_parents(target.key())? {
                if self.graph.data(parent)?.property_type() != PropertyType::Primitive {
                    continue;
                }
                if let Some(position) = self.map_child(parent, "attributes", "POSITION") {
                    let expected = self.get::<AccessorData>(Ref::new(position))?.count();
                    if expected != count {
                        return Err(Error::InvariantViolation(format!(
                            "target attribute {semantic:?} has {count} elements, POSITION has {expected}"
                        )));
                    }
                }
            }
        }
        self.set_map_child(target.key(), "attributes", semantic, accessor.map(Ref::key))
    }

    /// The displacement accessor stored under `semantic`.
    pub fn target_attribute(
        &self,
        target: PrimitiveTargetRef,
        semantic: &str,
    ) -> Option<AccessorRef> {
        self.map_child(target.key(), "attributes", semantic)
            .map(Ref::new)
    }

    /// The displacement semantics of a morph target.
    pub fn target_semantics(&self, target: PrimitiveTargetRef) -> Vec<String> {
        self.map_keys(target.key(), "attributes").unwrap_or_default()
    }

    // ------------------------------------------------------------------
    // Materials

    /// Sets or clears a texture slot. The slot's `TextureInfo` is preserved
    /// when re-targeting and removed atomically with the edge when
    /// clearing.
    pub fn set_material_texture(
        &mut self,
        material: MaterialRef,
        slot: TextureSlot,
        texture: Option<TextureRef>,
    ) -> Result<()> {
        self.set_texture_child(material.key(), slot.field(), texture.map(Ref::key))
    }

    /// The texture bound to a slot.
    pub fn material_texture(&self, material: MaterialRef, slot: TextureSlot) -> Option<TextureRef> {
        self.ref_child(material.key(), slot.field())
    }

    /// The `TextureInfo` of an occupied slot.
    pub fn material_texture_info(
        &self,
        material: MaterialRef,
        slot: TextureSlot,
    ) -> Option<&TextureInfo> {
        self.texture_info(material.key(), slot.field())
    }

    /// Replaces the `TextureInfo` of an occupied slot.
    pub fn set_material_texture_info(
        &mut self,
        material: MaterialRef,
        slot: TextureSlot,
        info: TextureInfo,
    ) -> Result<()> {
        self.set_texture_info(material.key(), slot.field(), info)
    }

    // ------------------------------------------------------------------
    // Accessors and buffers

    /// Sets or clears the buffer an accessor is packed into on write.
    pub fn set_accessor_buffer(
        &mut self,
        accessor: AccessorRef,
        buffer: Option<BufferRef>,
    ) -> Result<()> {
        self.set_child(accessor.key(), "buffer", buffer.map(Ref::key))
    }

    /// The buffer an accessor is packed into.
    pub fn accessor_buffer(&self, accessor: AccessorRef) -> Option<BufferRef> {
        self.ref_child(accessor.key(), "buffer")
    }

    // ------------------------------------------------------------------
    // Skins

    /// Appends a joint node to a skin.
    pub fn add_skin_joint(&mut self, skin: SkinRef, joint: NodeRef) -> Result<()> {
        self.push_child(skin.key(), "joints", joint.key())
    }

    /// The joints of a skin, in order.
    pub fn skin_joints(&self, skin: SkinRef) -> Vec<NodeRef> {
        self.ref_children(skin.key(), "joints")
    }

    /// Sets or clears the skeleton root of a skin.
    pub fn set_skin_skeleton(&mut self, skin: SkinRef, skeleton: Option<NodeRef>) -> Result<()> {
        self.set_child(skin.key(), "skeleton", skeleton.map(Ref::key))
    }

    /// The skeleton root of a skin.
    pub fn skin_skeleton(&self, skin: SkinRef) -> Option<NodeRef> {
        self.ref_child(skin.key(), "skeleton")
    }

    /// Sets or clears the inverse-bind-matrix accessor; must be `MAT4`
    /// `F32` storage.
    pub fn set_skin_inverse_bind_matrices(
        &mut self,
        skin: SkinRef,
        accessor: Option<AccessorRef>,
    ) -> Result<()> {
        if let Some(accessor) = accessor {
            let data = self.get(accessor)?;
            if data.element_type() != crate::element::ElementType::Mat4
                || data.component_type() != crate::element::ComponentType::F32
            {
                return Err(Error::InvariantViolation(
                    "inverse-bind matrices must be MAT4 f32".into(),
                ));
            }
        }
        self.set_child(skin.key(), "inverseBindMatrices", accessor.map(Ref::key))
    }

    /// The inverse-bind-matrix accessor of a skin.
    pub fn skin_inverse_bind_matrices(&self, skin: SkinRef) -> Option<AccessorRef> {
        self.ref_child(skin.key(), "inverseBindMatrices")
    }

    // ------------------------------------------------------------------
    // Animations

    /// Appends a channel to an animation.
    pub fn add_animation_channel(
        &mut self,
        animation: AnimationRef,
        channel: AnimationChannelRef,
    ) -> Result<()> {
        self.push_child(animation.key(), "channels", channel.key())
    }

    /// Appends a sampler to an animation.
    pub fn add_animation_sampler(
        &mut self,
        animation: AnimationRef,
        sampler: AnimationSamplerRef,
    ) -> Result<()> {
        self.push_child(animation.key(), "samplers", sampler.key())
    }

    /// The channels of an animation, in order.
    pub fn animation_channels(&self, animation: AnimationRef) -> Vec<AnimationChannelRef> {
        self.ref_children(animation.key(), "channels")
    }

    /// The samplers of an animation, in order.
    pub fn animation_samplers(&self, animation: AnimationRef) -> Vec<AnimationSamplerRef> {
        self.ref_children(animation.key(), "samplers")
    }

    /// Sets or clears the sampler a channel reads from.
    pub fn set_channel_sampler(
        &mut self,
        channel: AnimationChannelRef,
        sampler: Option<AnimationSamplerRef>,
    ) -> Result<()> {
        self.set_child(channel.key(), "sampler", sampler.map(Ref::key))
    }

    /// The sampler a channel reads from.
    pub fn channel_sampler(&self, channel: AnimationChannelRef) -> Option<AnimationSamplerRef> {
        self.ref_child(channel.key(), "sampler")
    }

    /// Sets or clears the node a channel animates.
    pub fn set_channel_target_node(
        &mut self,
        channel: AnimationChannelRef,
        node: Option<NodeRef>,
    ) -> Result<()> {
        self.set_child(channel.key(), "target", node.map(Ref::key))
    }

    /// The node a channel animates.
    pub fn channel_target_node(&self, channel: AnimationChannelRef) -> Option<NodeRef> {
        self.ref_child(channel.key(), "target")
    }

    /// Sets or clears the keyframe input accessor; must be `SCALAR` `F32`.
    pub fn set_sampler_input(
        &mut self,
        sampler: AnimationSamplerRef,
        input: Option<AccessorRef>,
    ) -> Result<()> {
        if let Some(accessor) = input {
            let data = self.get(accessor)?;
            if data.element_type() != crate::element::ElementType::Scalar
                || data.component_type() != crate::element::ComponentType::F32
            {
                return Err(Error::InvariantViolation(
                    "sampler input must be SCALAR f32".into(),
                ));
            }
        }
        self.set_child(sampler.key(), "input", input.map(Ref::key))
    }

    /// The keyframe input accessor.
    pub fn sampler_input(&self, sampler: AnimationSamplerRef) -> Option<AccessorRef> {
        self.ref_child(sampler.key(), "input")
    }

    /// Sets or clears the keyframe output accessor.
    pub fn set_sampler_output(
        &mut self,
        sampler: AnimationSamplerRef,
        output: Option<AccessorRef>,
    ) -> Result<()> {
        self.set_child(sampler.key(), "output", output.map(Ref::key))
    }

    /// The keyframe output accessor.
    pub fn sampler_output(&self, sampler: AnimationSamplerRef) -> Option<AccessorRef> {
        self.ref_child(sampler.key(), "output")
    }

    // ------------------------------------------------------------------
    // Extensions

    /// Attaches an extension property under its extension's name.
    pub fn set_extension(
        &mut self,
        parent: PropertyKey,
        extension: ExtensionPropertyRef,
    ) -> Result<()> {
        let name = match self.graph.data(extension.key())? {
            PropertyData::Extension(data) => data.extension_name().to_string(),
            _ => {
                return Err(Error::InvariantViolation(
                    "handle is not an extension property".into(),
                ))
            }
        };
        self.set_map_child(parent, "extensions", &name, Some(extension.key()))
    }

    /// Detaches the extension property stored under `name`, leaving the
    /// property alive for other hosts.
    pub fn clear_extension(&mut self, parent: PropertyKey, name: &str) -> Result<()> {
        self.set_map_child(parent, "extensions", name, None)
    }

    /// The extension property stored under `name`.
    pub fn get_extension(&self, parent: PropertyKey, name: &str) -> Option<ExtensionPropertyRef> {
        self.map_child(parent, "extensions", name).map(Ref::new)
    }

    /// Downcasts an extension property to its concrete payload.
    pub fn extension_data<T: ExtensionPropertyData>(
        &self,
        reference: ExtensionPropertyRef,
    ) -> Result<&T> {
        match self.graph.data(reference.key())? {
            PropertyData::Extension(data) => data.as_any().downcast_ref::<T>().ok_or_else(|| {
                Error::InvariantViolation("extension payload has a different kind".into())
            }),
            _ => Err(Error::InvariantViolation(
                "handle is not an extension property".into(),
            )),
        }
    }

    /// Downcasts an extension property to its concrete payload, mutably.
    pub fn extension_data_mut<T: ExtensionPropertyData>(
        &mut self,
        reference: ExtensionPropertyRef,
    ) -> Result<&mut T> {
        match self.graph.data_mut(reference.key())? {
            PropertyData::Extension(data) => {
                data.as_any_mut().downcast_mut::<T>().ok_or_else(|| {
                    Error::InvariantViolation("extension payload has a different kind".into())
                })
            }
            _ => Err(Error::InvariantViolation(
                "handle is not an extension property".into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ElementType, ScalarArray};
    use crate::graph::GraphEvent;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn factories_register_under_root_lists() {
        let mut doc = Document::new();
        let scene = doc.create_scene("main");
        let node = doc.create_node("a");
        assert_eq!(doc.scenes(), vec![scene]);
        assert_eq!(doc.nodes(), vec![node]);
    }

    #[test]
    fn node_has_one_hierarchy_parent() {
        let mut doc = Document::new();
        let scene = doc.create_scene("s");
        let a = doc.create_node("a");
        let b = doc.create_node("b");
        doc.add_scene_node(scene, a).unwrap();
        doc.add_node_child(a, b).unwrap();
        // Re-homing b under the scene detaches it from a.
        doc.add_scene_node(scene, b).unwrap();
        assert!(doc.node_children(a).is_empty());
        assert_eq!(doc.scene_nodes(scene), vec![a, b]);
    }

    #[test]
    fn node_cycles_are_rejected() {
        let mut doc = Document::new();
        let a = doc.create_node("a");
        let b = doc.create_node("b");
        let c = doc.create_node("c");
        doc.add_node_child(a, b).unwrap();
        doc.add_node_child(b, c).unwrap();
        assert!(matches!(doc.add_node_child(c, a), Err(Error::Cycle)));
        assert!(matches!(doc.add_node_child(a, a), Err(Error::Cycle)));
    }

    #[test]
    fn disposed_handles_fail() {
        let mut doc = Document::new();
        let mesh = doc.create_mesh("m");
        doc.dispose(mesh.key()).unwrap();
        assert!(matches!(doc.get(mesh), Err(Error::Disposed)));
    }

    #[test]
    fn dispose_severs_all_edges() {
        let mut doc = Document::new();
        let mesh = doc.create_mesh("m");
        let prim = doc.create_primitive();
        let accessor = doc.create_accessor("pos");
        doc.add_mesh_primitive(mesh, prim).unwrap();
        doc.set_primitive_attribute(prim, "POSITION", Some(accessor))
            .unwrap();
        doc.dispose(prim.key()).unwrap();
        for key in doc.graph().list_edges() {
            let edge = doc.graph().edge(key).unwrap();
            assert_ne!(edge.parent, prim.key());
            assert_ne!(edge.child, prim.key());
        }
        // The accessor survives; only the edges died.
        assert!(doc.get(accessor).is_ok());
    }

    #[test]
    fn indices_must_be_scalar_integers() {
        let mut doc = Document::new();
        let prim = doc.create_primitive();
        let bad = doc.create_accessor("f32");
        doc.get_mut(bad)
            .unwrap()
            .set_array(ScalarArray::F32(vec![0.0]))
            .unwrap();
        assert!(doc.set_primitive_indices(prim, Some(bad)).is_err());

        let good = doc.create_accessor("u16");
        doc.get_mut(good)
            .unwrap()
            .set_array(ScalarArray::U16(vec![0, 1, 2]))
            .unwrap();
        doc.set_primitive_indices(prim, Some(good)).unwrap();
    }

    #[test]
    fn attribute_counts_must_agree() {
        let mut doc = Document::new();
        let prim = doc.create_primitive();
        let pos = doc.create_accessor("pos");
        doc.get_mut(pos)
            .unwrap()
            .set_element_type(ElementType::Vec3)
            .unwrap();
        doc.get_mut(pos)
            .unwrap()
            .set_array(ScalarArray::F32(vec![0.0; 9]))
            .unwrap();
        doc.set_primitive_attribute(prim, "POSITION", Some(pos))
            .unwrap();

        let short = doc.create_accessor("nrm");
        doc.get_mut(short)
            .unwrap()
            .set_element_type(ElementType::Vec3)
            .unwrap();
        doc.get_mut(short)
            .unwrap()
            .set_array(ScalarArray::F32(vec![0.0; 6]))
            .unwrap();
        assert!(doc
            .set_primitive_attribute(prim, "NORMAL", Some(short))
            .is_err());
    }

    #[test]
    fn texture_slot_clears_info_atomically() {
        let mut doc = Document::new();
        let material = doc.create_material("m");
        let texture = doc.create_texture("t");
        doc.set_material_texture(material, TextureSlot::BaseColor, Some(texture))
            .unwrap();
        doc.set_material_texture_info(
            material,
            TextureSlot::BaseColor,
            TextureInfo {
                tex_coord: 1,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(
            doc.material_texture_info(material, TextureSlot::BaseColor)
                .unwrap()
                .tex_coord,
            1
        );
        doc.set_material_texture(material, TextureSlot::BaseColor, None)
            .unwrap();
        assert!(doc
            .material_texture_info(material, TextureSlot::BaseColor)
            .is_none());
        assert!(doc.material_texture(material, TextureSlot::BaseColor).is_none());
    }

    #[test]
    fn setter_events_arrive_in_mutation_order() {
        let mut doc = Document::new();
        let prim = doc.create_primitive();
        let a = doc.create_accessor("a");
        let b = doc.create_accessor("b");
        doc.get_mut(a)
            .unwrap()
            .set_array(ScalarArray::U16(vec![0]))
            .unwrap();
        doc.get_mut(b)
            .unwrap()
            .set_array(ScalarArray::U16(vec![0]))
            .unwrap();
        doc.set_primitive_indices(prim, Some(a)).unwrap();

        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        doc.graph_mut().subscribe(Some(prim.key()), move |event| {
            sink.borrow_mut().push(match event {
                GraphEvent::EdgeAdded { .. } => "added",
                GraphEvent::EdgeRemoved { .. } => "removed",
                GraphEvent::EdgeAttributeChanged { .. } => "attr",
                GraphEvent::Disposed { .. } => "disposed",
            });
        });
        doc.set_primitive_indices(prim, Some(b)).unwrap();
        assert_eq!(*log.borrow(), vec!["removed", "added"]);
    }

    #[test]
    fn clone_equals_original() {
        let mut doc = Document::new();
        let mesh = doc.create_mesh("m");
        let prim = doc.create_primitive();
        let pos = doc.create_accessor("pos");
        doc.get_mut(pos)
            .unwrap()
            .set_element_type(ElementType::Vec3)
            .unwrap();
        doc.get_mut(pos)
            .unwrap()
            .set_array(ScalarArray::F32(vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0]))
            .unwrap();
        doc.add_mesh_primitive(mesh, prim).unwrap();
        doc.set_primitive_attribute(prim, "POSITION", Some(pos))
            .unwrap();

        let copy = doc.clone_document();
        let mesh_copy = copy.meshes()[0];
        assert!(crate::graph_util::cross_equals(
            doc.graph(),
            mesh.key(),
            copy.graph(),
            mesh_copy.key(),
        )
        .unwrap());
    }
}
