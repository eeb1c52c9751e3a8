//! The low-level typed multigraph underlying every document.
//!
//! Vertices are property records; edges are typed references carrying a
//! field name and an attribute bag. Storage is a pair of generational
//! arenas, so handles are stable integers that become invalid when their
//! slot is reclaimed: any later access through a stale handle fails with
//! [`Error::Disposed`] rather than touching reused memory.

mod edge;
mod event;

pub use edge::{Edge, EdgeAttributes};
pub use event::{GraphEvent, ListenerId};

use event::ListenerRecord;

use crate::error::{Error, Result};
use crate::property::PropertyData;
use crate::schema::{self, EdgeFieldDef, EdgeKind, PropertyType};
use slotmap::SlotMap;
use std::fmt;

slotmap::new_key_type! {
    /// Stable handle of a property slot.
    pub struct PropertyKey;

    /// Stable handle of an edge slot.
    pub struct EdgeKey;
}

/// A property slot: typed data plus bookkeeping shared by every type.
pub struct PropertyRecord {
    pub(crate) data: PropertyData,
    pub(crate) name: String,
    pub(crate) extras: serde_json::Value,
    /// Extension fragments read from the wire for which no handler was
    /// registered; preserved opaquely and written back verbatim.
    pub(crate) unrecognized_extensions: serde_json::Map<String, serde_json::Value>,
    pub(crate) child_edges: Vec<EdgeKey>,
    pub(crate) parent_edges: Vec<EdgeKey>,
}

impl PropertyRecord {
    /// The typed payload.
    pub fn data(&self) -> &PropertyData {
        &self.data
    }

    /// The property name. Not identity; defaults to empty.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The discriminant of the payload.
    pub fn property_type(&self) -> PropertyType {
        self.data.property_type()
    }
}

/// A mutable directed multigraph of properties.
#[derive(Default)]
pub struct Graph {
    properties: SlotMap<PropertyKey, PropertyRecord>,
    edges: SlotMap<EdgeKey, Edge>,
    listeners: Vec<Option<ListenerRecord>>,
    pending: Vec<GraphEvent>,
    depth: usize,
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("properties", &self.properties.len())
            .field("edges", &self.edges.len())
            .finish()
    }
}

impl Graph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a property slot and returns its handle.
    pub fn add_property(&mut self, data: PropertyData, name: impl Into<String>) -> PropertyKey {
        self.properties.insert(PropertyRecord {
            data,
            name: name.into(),
            extras: serde_json::Value::Null,
            unrecognized_extensions: Default::default(),
            child_edges: Vec::new(),
            parent_edges: Vec::new(),
        })
    }

    /// Whether `key` refers to a live property.
    pub fn contains(&self, key: PropertyKey) -> bool {
        self.properties.contains_key(key)
    }

    /// Number of live properties.
    pub fn property_count(&self) -> usize {
        self.properties.len()
    }

    /// Iterates over every live property handle.
    pub fn properties(&self) -> impl Iterator<Item = PropertyKey> + '_ {
        self.properties.keys()
    }

    pub(crate) fn record(&self, key: PropertyKey) -> Result<&PropertyRecord> {
        self.properties.get(key).ok_or(Error::Disposed)
    }

    pub(crate) fn record_mut(&mut self, key: PropertyKey) -> Result<&mut PropertyRecord> {
        self.properties.get_mut(key).ok_or(Error::Disposed)
    }

    /// Returns a view of the property slot.
    pub fn property(&self, key: PropertyKey) -> Result<&PropertyRecord> {
        self.record(key)
    }

    /// Returns the typed payload of a property.
    pub fn data(&self, key: PropertyKey) -> Result<&PropertyData> {
        Ok(&self.record(key)?.data)
    }

    /// Returns the typed payload of a property, mutably.
    ///
    /// Value attributes carry no change events; only edge mutations notify
    /// listeners.
    pub fn data_mut(&mut self, key: PropertyKey) -> Result<&mut PropertyData> {
        Ok(&mut self.record_mut(key)?.data)
    }

    /// The property's name.
    pub fn name(&self, key: PropertyKey) -> Result<&str> {
        Ok(&self.record(key)?.name)
    }

    /// Renames a property. Names are labels, not identity.
    pub fn set_name(&mut self, key: PropertyKey, name: impl Into<String>) -> Result<()> {
        self.record_mut(key)?.name = name.into();
        Ok(())
    }

    /// Opaque application specific data preserved on round-trip.
    pub fn extras(&self, key: PropertyKey) -> Result<&serde_json::Value> {
        Ok(&self.record(key)?.extras)
    }

    /// Fragments of unregistered extensions, preserved verbatim.
    pub fn unrecognized_extensions(
        &self,
        key: PropertyKey,
    ) -> Result<&serde_json::Map<String, serde_json::Value>> {
        Ok(&self.record(key)?.unrecognized_extensions)
    }

    /// Replaces the preserved opaque extension fragments.
    pub fn set_unrecognized_extensions(
        &mut self,
        key: PropertyKey,
        fragments: serde_json::Map<String, serde_json::Value>,
    ) -> Result<()> {
        self.record_mut(key)?.unrecognized_extensions = fragments;
        Ok(())
    }

    /// Replaces the property's extras.
    pub fn set_extras(&mut self, key: PropertyKey, extras: serde_json::Value) -> Result<()> {
        self.record_mut(key)?.extras = extras;
        Ok(())
    }

    /// Looks up the schema entry for an edge field of `parent`.
    pub fn edge_field(&self, parent: PropertyKey, name: &str) -> Result<EdgeFieldDef> {
        let record = self.record(parent)?;
        let ty = record.property_type();
        if let PropertyData::Extension(ext) = &record.data {
            if let Some(def) = ext.edge_fields().iter().find(|def| def.name == name) {
                return Ok(*def);
            }
            if schema::EXTENSIONS.name == name {
                return Ok(schema::EXTENSIONS);
            }
        } else if let Some(def) = schema::edge_fields(ty).iter().find(|def| def.name == name) {
            return Ok(*def);
        }
        Err(Error::InvariantViolation(format!(
            "{ty:?} has no edge field named {name:?}"
        )))
    }

    /// Validates a prospective edge without mutating anything.
    ///
    /// Checks that both endpoints are live, the field exists on the parent,
    /// the child type is accepted, keyed-map edges carry a semantic, and no
    /// node-hierarchy cycle would form.
    pub fn validate_connect(
        &self,
        parent: PropertyKey,
        child: PropertyKey,
        name: &str,
        attributes: &EdgeAttributes,
    ) -> Result<EdgeFieldDef> {
        let def = self.edge_field(parent, name)?;
        let child_ty = self.record(child)?.property_type();
        if !def.child.contains(&child_ty) {
            return Err(Error::InvariantViolation(format!(
                "field {name:?} does not accept a {child_ty:?} child"
            )));
        }
        if def.kind == EdgeKind::Map && attributes.semantic().is_none() {
            return Err(Error::InvariantViolation(format!(
                "map field {name:?} requires a semantic edge attribute"
            )));
        }
        let parent_ty = self.record(parent)?.property_type();
        if parent_ty == PropertyType::Node
            && name == "children"
            && (parent == child || self.reachable_via(child, "children", parent))
        {
            return Err(Error::Cycle);
        }
        Ok(def)
    }

    /// Creates an edge from `parent` to `child` under the field `name`.
    ///
    /// The edge is validated against the schema before any state changes:
    /// unknown fields, a child of the wrong type, a keyed-map edge without a
    /// semantic, and node-hierarchy cycles are all rejected with nothing
    /// mutated and no events emitted.
    pub fn connect(
        &mut self,
        parent: PropertyKey,
        child: PropertyKey,
        name: &str,
        attributes: EdgeAttributes,
    ) -> Result<EdgeKey> {
        self.validate_connect(parent, child, name, &attributes)?;

        let key = self.edges.insert(Edge {
            parent,
            child,
            name: name.to_string(),
            attributes,
        });
        self.properties[parent].child_edges.push(key);
        self.properties[child].parent_edges.push(key);
        self.pending.push(GraphEvent::EdgeAdded {
            edge: key,
            parent,
            child,
            name: name.to_string(),
        });
        self.flush_if_idle();
        Ok(key)
    }

    /// Removes an edge and notifies both endpoints.
    pub fn disconnect(&mut self, key: EdgeKey) -> Result<()> {
        let edge = self.edges.remove(key).ok_or(Error::Disposed)?;
        if let Some(record) = self.properties.get_mut(edge.parent) {
            record.child_edges.retain(|e| *e != key);
        }
        if let Some(record) = self.properties.get_mut(edge.child) {
            record.parent_edges.retain(|e| *e != key);
        }
        self.pending.push(GraphEvent::EdgeRemoved {
            edge: key,
            parent: edge.parent,
            child: edge.child,
            name: edge.name,
        });
        self.flush_if_idle();
        Ok(())
    }

    /// Returns an edge by handle.
    pub fn edge(&self, key: EdgeKey) -> Result<&Edge> {
        self.edges.get(key).ok_or(Error::Disposed)
    }

    /// Replaces the attribute bag of an edge.
    pub fn set_edge_attributes(&mut self, key: EdgeKey, attributes: EdgeAttributes) -> Result<()> {
        let edge = self.edges.get_mut(key).ok_or(Error::Disposed)?;
        edge.attributes = attributes;
        let (parent, child, name) = (edge.parent, edge.child, edge.name.clone());
        self.pending.push(GraphEvent::EdgeAttributeChanged {
            edge: key,
            parent,
            child,
            name,
        });
        self.flush_if_idle();
        Ok(())
    }

    /// Snapshot of every live edge handle.
    pub fn list_edges(&self) -> Vec<EdgeKey> {
        self.edges.keys().collect()
    }

    /// Snapshot of the outbound edges of `parent`, in insertion order.
    pub fn child_edges(&self, parent: PropertyKey) -> Result<Vec<EdgeKey>> {
        Ok(self.record(parent)?.child_edges.clone())
    }

    /// Snapshot of the inbound edges of `child`, in insertion order.
    pub fn parent_edges(&self, child: PropertyKey) -> Result<Vec<EdgeKey>> {
        Ok(self.record(child)?.parent_edges.clone())
    }

    /// Distinct parents of `child`, in first-reference order.
    pub fn list_parents(&self, child: PropertyKey) -> Result<Vec<PropertyKey>> {
        let mut parents = Vec::new();
        for key in &self.record(child)?.parent_edges {
            let parent = self.edges[*key].parent;
            if !parents.contains(&parent) {
                parents.push(parent);
            }
        }
        Ok(parents)
    }

    /// Replaces every edge from `parent` ending at `old_child` with an
    /// equivalent edge ending at `new_child`, preserving name and attributes.
    ///
    /// Listeners observe one `EdgeRemoved`/`EdgeAdded` pair per affected edge
    /// and only see the consistent post-swap graph.
    pub fn swap(
        &mut self,
        parent: PropertyKey,
        old_child: PropertyKey,
        new_child: PropertyKey,
    ) -> Result<usize> {
        self.record(old_child)?;
        let new_ty = self.record(new_child)?.property_type();
        let candidates: Vec<EdgeKey> = self
            .record(parent)?
            .child_edges
            .iter()
            .copied()
            .filter(|key| self.edges[*key].child == old_child)
            .collect();
        for key in &candidates {
            let def = self.edge_field(parent, &self.edges[*key].name.clone())?;
            if !def.child.contains(&new_ty) {
                return Err(Error::InvariantViolation(format!(
                    "field {:?} does not accept a {new_ty:?} child",
                    self.edges[*key].name
                )));
            }
        }

        self.begin_batch();
        for key in &candidates {
            let edge = &mut self.edges[*key];
            edge.child = new_child;
            let name = edge.name.clone();
            self.properties[old_child].parent_edges.retain(|e| e != key);
            self.properties[new_child].parent_edges.push(*key);
            self.pending.push(GraphEvent::EdgeRemoved {
                edge: *key,
                parent,
                child: old_child,
                name: name.clone(),
            });
            self.pending.push(GraphEvent::EdgeAdded {
                edge: *key,
                parent,
                child: new_child,
                name,
            });
        }
        self.end_batch();
        Ok(candidates.len())
    }

    /// Severs every edge incident to `property`, removes the slot, then
    /// emits one `Disposed` event.
    pub fn dispose(&mut self, property: PropertyKey) -> Result<()> {
        let record = self.record(property)?;
        let mut incident: Vec<EdgeKey> = record.child_edges.clone();
        for key in &record.parent_edges {
            if !incident.contains(key) {
                incident.push(*key);
            }
        }
        self.begin_batch();
        for key in incident {
            // Self-edges may already be gone.
            if self.edges.contains_key(key) {
                let _ = self.disconnect(key);
            }
        }
        self.properties.remove(property);
        self.pending.push(GraphEvent::Disposed { property });
        self.end_batch();
        Ok(())
    }

    /// Registers a listener. With `filter` set, only events involving that
    /// property are delivered; otherwise every event is.
    pub fn subscribe(
        &mut self,
        filter: Option<PropertyKey>,
        callback: impl FnMut(&GraphEvent) + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.listeners.len());
        self.listeners.push(Some(ListenerRecord {
            filter,
            callback: Box::new(callback),
        }));
        id
    }

    /// Removes a listener. Returns whether it was still registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        match self.listeners.get_mut(id.0) {
            Some(slot @ Some(_)) => {
                *slot = None;
                true
            }
            _ => false,
        }
    }

    /// Whether `target` is reachable from `from` through edges named `name`.
    fn reachable_via(&self, from: PropertyKey, name: &str, target: PropertyKey) -> bool {
        if from == target {
            return true;
        }
        let mut stack = vec![from];
        let mut seen = vec![from];
        while let Some(current) = stack.pop() {
            let Ok(record) = self.record(current) else {
                continue;
            };
            for key in &record.child_edges {
                let edge = &self.edges[*key];
                if edge.name != name {
                    continue;
                }
                if edge.child == target {
                    return true;
                }
                if !seen.contains(&edge.child) {
                    seen.push(edge.child);
                    stack.push(edge.child);
                }
            }
        }
        false
    }

    pub(crate) fn begin_batch(&mut self) {
        self.depth += 1;
    }

    pub(crate) fn end_batch(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        if self.depth == 0 {
            self.flush();
        }
    }

    fn flush_if_idle(&mut self) {
        if self.depth == 0 {
            self.flush();
        }
    }

    fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let events = std::mem::take(&mut self.pending);
        let mut listeners = std::mem::take(&mut self.listeners);
        for event in &events {
            for entry in listeners.iter_mut().flatten() {
                if entry.filter.map_or(true, |p| event.involves(p)) {
                    (entry.callback)(event);
                }
            }
        }
        // Listeners registered while the originals were detached land after
        // them.
        let late = std::mem::replace(&mut self.listeners, listeners);
        self.listeners.extend(late);
    }
}
