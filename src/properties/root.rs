/// Asset metadata carried by the root property.
#[derive(Clone, Debug, PartialEq)]
pub struct AssetInfo {
    /// The glTF version of the asset.
    pub version: String,

    /// Tool that generated the asset.
    pub generator: Option<String>,

    /// The minimum glTF version required to load the asset.
    pub min_version: Option<String>,

    /// Copyright message crediting the content creator.
    pub copyright: Option<String>,
}

impl Default for AssetInfo {
    fn default() -> Self {
        Self {
            version: "2.0".to_string(),
            generator: None,
            min_version: None,
            copyright: None,
        }
    }
}

/// The root aggregate.
///
/// The only property the document owns by design; every other property is
/// reachable from it or orphaned. Its edge fields are the per-type lists
/// plus the default scene.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RootData {
    /// Asset metadata.
    pub asset: AssetInfo,
}
