use crate::{Extras, RawExtensions};
use serde_derive::{Deserialize, Serialize};

/// Provenance and version metadata; the one mandatory top-level record.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Asset {
    /// Credit shown for the content creator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,

    /// The tool that produced the asset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator: Option<String>,

    /// Oldest format version a loader needs to support this asset.
    #[serde(default, rename = "minVersion", skip_serializing_if = "Option::is_none")]
    pub min_version: Option<String>,

    /// Format version this asset targets.
    pub version: String,

    /// Extension specific data.
    #[serde(default, skip_serializing_if = "RawExtensions::is_empty")]
    pub extensions: RawExtensions,

    /// Optional application specific data.
    #[serde(default, skip_serializing_if = "crate::extras_is_null")]
    pub extras: Extras,
}

impl Default for Asset {
    fn default() -> Self {
        Self {
            copyright: None,
            generator: None,
            min_version: None,
            version: "2.0".to_string(),
            extensions: Default::default(),
            extras: Default::default(),
        }
    }
}
