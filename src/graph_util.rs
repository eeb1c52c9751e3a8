//! Cross-document copy, merge, and bulk-rewrite helpers.

use crate::document::Document;
use crate::error::{Error, Result};
use crate::graph::{Graph, PropertyKey};
use crate::properties::{AccessorRef, PrimitiveRef};
use crate::property::{field_edges, Ref};
use crate::schema::{EdgeKind, PropertyType};
use std::collections::{HashMap, HashSet};

/// Maps a source property to a pre-existing target property during merge,
/// letting callers deduplicate instead of copying.
pub type Resolve<'a> = dyn FnMut(PropertyKey) -> Option<PropertyKey> + 'a;

/// Replaces every reference to `old` with `new` across all parents.
///
/// Edge names and attributes are preserved. Returns the number of rewritten
/// edges.
pub fn swap_all(graph: &mut Graph, old: PropertyKey, new: PropertyKey) -> Result<usize> {
    let mut count = 0;
    for parent in graph.list_parents(old)? {
        count += graph.swap(parent, old, new)?;
    }
    Ok(count)
}

/// Copies every property of `src` into `dst`, returning the key mapping.
///
/// The source root maps onto the destination root; root-list edges append.
/// When `resolve` maps a source property to an existing destination
/// property, the source subtree is not copied and inbound edges retarget
/// the resolved property.
pub fn merge_documents(
    dst: &mut Document,
    src: &Document,
    mut resolve: Option<&mut Resolve<'_>>,
) -> Result<HashMap<PropertyKey, PropertyKey>> {
    let src_root = src.root().key();
    let dst_root = dst.root().key();
    let mut map: HashMap<PropertyKey, PropertyKey> = HashMap::new();
    let mut resolved: HashSet<PropertyKey> = HashSet::new();
    map.insert(src_root, dst_root);

    for key in src.graph().properties().collect::<Vec<_>>() {
        if key == src_root {
            continue;
        }
        if let Some(resolve) = resolve.as_deref_mut() {
            if let Some(existing) = resolve(key) {
                dst.graph().property(existing)?;
                map.insert(key, existing);
                resolved.insert(key);
                continue;
            }
        }
        let record = src.graph().property(key)?;
        let copy = dst
            .graph_mut()
            .add_property(record.data().clone(), record.name());
        dst.graph_mut()
            .set_extras(copy, src.graph().extras(key)?.clone())?;
        copy_unrecognized_extensions(src.graph(), key, dst.graph_mut(), copy)?;
        map.insert(key, copy);
    }

    let dst_has_default_scene = dst.default_scene().is_some();
    for (src_key, dst_key) in map.clone() {
        if resolved.contains(&src_key) {
            continue;
        }
        for edge_key in src.graph().child_edges(src_key)? {
            let edge = src.graph().edge(edge_key)?.clone();
            if src_key == src_root && edge.name == "scene" && dst_has_default_scene {
                continue;
            }
            // A resolved property keeps its existing root listing.
            if src_key == src_root && resolved.contains(&edge.child) {
                continue;
            }
            let child = *map.get(&edge.child).ok_or(Error::Disposed)?;
            dst.graph_mut()
                .connect(dst_key, child, &edge.name, edge.attributes)?;
        }
    }
    Ok(map)
}

pub(crate) fn copy_unrecognized_extensions(
    src: &Graph,
    src_key: PropertyKey,
    dst: &mut Graph,
    dst_key: PropertyKey,
) -> Result<()> {
    let fragments = src.record(src_key)?.unrecognized_extensions.clone();
    dst.record_mut(dst_key)?.unrecognized_extensions = fragments;
    Ok(())
}

impl Document {
    /// Copies every property of `other` into this document.
    pub fn merge(&mut self, other: &Document) -> Result<HashMap<PropertyKey, PropertyKey>> {
        merge_documents(self, other, None)
    }

    /// A deep copy of the document: equal structure, fresh handles.
    pub fn clone_document(&self) -> Document {
        let mut copy = Document::new();
        {
            let root = copy.root();
            let data = self
                .get(self.root())
                .expect("the source root is always live");
            *copy.get_mut(root).expect("the fresh root is always live") = data.clone();
        }
        merge_documents(&mut copy, self, None)
            .expect("merging into an empty document cannot conflict");
        copy
    }
}

/// Structural equality across two documents' graphs.
///
/// The same recursion as
/// [`properties_equal`](crate::property::properties_equal), generalized to
/// distinct source and target graphs.
pub fn cross_equals(
    graph_a: &Graph,
    a: PropertyKey,
    graph_b: &Graph,
    b: PropertyKey,
) -> Result<bool> {
    let mut visited = HashSet::new();
    cross_equals_inner(graph_a, a, graph_b, b, &mut visited)
}

fn cross_equals_inner(
    graph_a: &Graph,
    a: PropertyKey,
    graph_b: &Graph,
    b: PropertyKey,
    visited: &mut HashSet<(PropertyKey, PropertyKey)>,
) -> Result<bool> {
    if !visited.insert((a, b)) {
        return Ok(true);
    }
    let ra = graph_a.property(a)?;
    let rb = graph_b.property(b)?;
    if ra.data() != rb.data() || ra.name() != rb.name() {
        return Ok(false);
    }
    if graph_a.extras(a)? != graph_b.extras(b)? {
        return Ok(false);
    }
    for def in ra.data().edge_fields() {
        let edges_a = field_edges(graph_a, a, def.name)?;
        let edges_b = field_edges(graph_b, b, def.name)?;
        if edges_a.len() != edges_b.len() {
            return Ok(false);
        }
        match def.kind {
            EdgeKind::Single | EdgeKind::List => {
                for (ka, kb) in edges_a.iter().zip(&edges_b) {
                    let ea = graph_a.edge(*ka)?;
                    let eb = graph_b.edge(*kb)?;
                    if ea.attributes != eb.attributes {
                        return Ok(false);
                    }
                    if !cross_equals_inner(graph_a, ea.child, graph_b, eb.child, visited)? {
                        return Ok(false);
                    }
                }
            }
            EdgeKind::Map => {
                for ka in &edges_a {
                    let ea = graph_a.edge(*ka)?;
                    let key = ea.attributes.semantic().unwrap_or_default();
                    let Some(eb) = edges_b
                        .iter()
                        .filter_map(|kb| graph_b.edge(*kb).ok())
                        .find(|eb| eb.attributes.semantic() == Some(key))
                    else {
                        return Ok(false);
                    };
                    if ea.attributes != eb.attributes {
                        return Ok(false);
                    }
                    if !cross_equals_inner(graph_a, ea.child, graph_b, eb.child, visited)? {
                        return Ok(false);
                    }
                }
            }
        }
    }
    Ok(true)
}

/// Clones an accessor's payload into a new root-listed accessor sharing the
/// same buffer. The isolation helper for clone-then-swap transforms.
pub fn shallow_clone_accessor(doc: &mut Document, accessor: AccessorRef) -> Result<AccessorRef> {
    let name = doc.name(accessor.key())?.to_string();
    let data = doc.get(accessor)?.clone();
    let buffer = doc.accessor_buffer(accessor);
    let copy = doc.create_accessor(&name);
    *doc.get_mut(copy)? = data;
    doc.set_accessor_buffer(copy, buffer)?;
    Ok(copy)
}

/// Disposes a primitive together with children that no other property
/// still references.
pub fn deep_dispose_primitive(doc: &mut Document, primitive: PrimitiveRef) -> Result<()> {
    let mut children: Vec<PropertyKey> = Vec::new();
    for key in doc.graph().child_edges(primitive.key())? {
        let child = doc.graph().edge(key)?.child;
        if !children.contains(&child) {
            children.push(child);
        }
    }
    // Morph targets own accessors of their own.
    for child in children.clone() {
        if doc.property_type(child)? == PropertyType::PrimitiveTarget {
            for key in doc.graph().child_edges(child)? {
                let grandchild = doc.graph().edge(key)?.child;
                if !children.contains(&grandchild) {
                    children.push(grandchild);
                }
            }
        }
    }
    doc.dispose(primitive.key())?;
    for child in children {
        let orphaned = doc
            .list_parents(child)?
            .into_iter()
            .all(|p| matches!(doc.property_type(p), Ok(PropertyType::Root)));
        if orphaned {
            doc.dispose(child)?;
        }
    }
    Ok(())
}

impl<T> Ref<T> {
    /// Re-keys a handle into another document after a merge, using the map
    /// returned by [`merge_documents`].
    pub fn mapped(self, map: &HashMap<PropertyKey, PropertyKey>) -> Option<Self> {
        map.get(&self.key()).copied().map(Ref::new)
    }
}
