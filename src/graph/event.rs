use crate::graph::{EdgeKey, PropertyKey};

/// A change notification emitted by the graph.
///
/// Events carry copies of the endpoint keys and edge name so that listeners
/// never need to dereference a handle that the mutation may already have
/// invalidated.
#[derive(Clone, Debug)]
pub enum GraphEvent {
    /// An edge was created.
    EdgeAdded {
        /// Handle of the new edge.
        edge: EdgeKey,
        /// Parent endpoint.
        parent: PropertyKey,
        /// Child endpoint.
        child: PropertyKey,
        /// Edge name.
        name: String,
    },

    /// An edge was removed.
    EdgeRemoved {
        /// Handle of the removed edge; stale by the time the event fires.
        edge: EdgeKey,
        /// Parent endpoint.
        parent: PropertyKey,
        /// Child endpoint.
        child: PropertyKey,
        /// Edge name.
        name: String,
    },

    /// An edge's attribute bag was replaced.
    EdgeAttributeChanged {
        /// Handle of the edge.
        edge: EdgeKey,
        /// Parent endpoint.
        parent: PropertyKey,
        /// Child endpoint.
        child: PropertyKey,
        /// Edge name.
        name: String,
    },

    /// A property was disposed; every incident edge has already been removed.
    Disposed {
        /// The disposed property.
        property: PropertyKey,
    },
}

impl GraphEvent {
    /// Whether the event involves `property` as an endpoint or subject.
    pub fn involves(&self, property: PropertyKey) -> bool {
        match *self {
            GraphEvent::EdgeAdded { parent, child, .. }
            | GraphEvent::EdgeRemoved { parent, child, .. }
            | GraphEvent::EdgeAttributeChanged { parent, child, .. } => {
                parent == property || child == property
            }
            GraphEvent::Disposed { property: p } => p == property,
        }
    }
}

/// Token returned by [`Graph::subscribe`](crate::graph::Graph::subscribe),
/// used to unsubscribe.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ListenerId(pub(crate) usize);

pub(crate) struct ListenerRecord {
    /// When set, only events involving this property are delivered.
    pub filter: Option<PropertyKey>,
    pub callback: Box<dyn FnMut(&GraphEvent)>,
}
