use crate::graph::PropertyKey;
use crate::properties::TextureInfo;

/// Typed metadata riding on an edge.
///
/// Keyed-map fields carry their key in [`EdgeAttributes::Semantic`]; material
/// and extension texture slots own their sampling parameters through
/// [`EdgeAttributes::TextureInfo`]. The attributes travel with the edge
/// through [`swap`](crate::graph::Graph::swap) and disappear with it on
/// disconnect.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum EdgeAttributes {
    /// No metadata.
    #[default]
    None,

    /// Key of a keyed-map field, e.g. `"POSITION"` or an extension name.
    Semantic(String),

    /// Sampling parameters owned by a texture slot edge.
    TextureInfo(Box<TextureInfo>),
}

impl EdgeAttributes {
    /// Returns the map key when present.
    pub fn semantic(&self) -> Option<&str> {
        match self {
            EdgeAttributes::Semantic(key) => Some(key),
            _ => None,
        }
    }

    /// Returns the texture info when present.
    pub fn texture_info(&self) -> Option<&TextureInfo> {
        match self {
            EdgeAttributes::TextureInfo(info) => Some(info),
            _ => None,
        }
    }
}

/// One typed reference between two properties.
#[derive(Clone, Debug)]
pub struct Edge {
    /// The referencing property.
    pub parent: PropertyKey,
    /// The referenced property.
    pub child: PropertyKey,
    /// The field this edge belongs to, e.g. `"indices"`.
    pub name: String,
    /// Typed metadata riding on the edge.
    pub attributes: EdgeAttributes,
}
