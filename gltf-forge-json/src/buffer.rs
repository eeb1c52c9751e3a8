use crate::{Extras, Index, RawExtensions};
use serde::{de, ser};
use serde_derive::{Deserialize, Serialize};
use std::fmt;

/// GPU binding hint of a buffer view, keyed on the wire by its GL
/// enumeration code.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Target {
    /// Vertex attribute data (code 34962).
    ArrayBuffer = 1,

    /// Vertex index data (code 34963).
    ElementArrayBuffer,
}

impl ser::Serialize for Target {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: ser::Serializer,
    {
        match *self {
            Target::ArrayBuffer => serializer.serialize_u32(34_962),
            Target::ElementArrayBuffer => serializer.serialize_u32(34_963),
        }
    }
}

impl<'de> de::Deserialize<'de> for Target {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        struct Visitor;
        impl<'de> de::Visitor<'de> for Visitor {
            type Value = Target;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a GL buffer target code")
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                match value as u32 {
                    34_962 => Ok(Target::ArrayBuffer),
                    34_963 => Ok(Target::ElementArrayBuffer),
                    _ => Err(de::Error::custom("invalid buffer target")),
                }
            }
        }
        deserializer.deserialize_u64(Visitor)
    }
}

/// A container of raw bytes backing geometry, animation, skinning, or
/// packed image data.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Buffer {
    /// Payload size in bytes.
    #[serde(default, rename = "byteLength")]
    pub byte_length: u64,

    /// Optional user-defined name for this object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Where the bytes live: a sibling file path, a data URI, or — for the
    /// unnamed buffer of the binary container — omitted entirely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,

    /// Extension specific data.
    #[serde(default, skip_serializing_if = "RawExtensions::is_empty")]
    pub extensions: RawExtensions,

    /// Optional application specific data.
    #[serde(default, skip_serializing_if = "crate::extras_is_null")]
    pub extras: Extras,
}

/// A contiguous slice of a buffer, shared by the accessors laid out in it.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct View {
    /// The sliced buffer.
    pub buffer: Index<Buffer>,

    /// Slice length in bytes.
    #[serde(rename = "byteLength")]
    pub byte_length: u64,

    /// Slice start within the buffer.
    #[serde(
        default,
        rename = "byteOffset",
        skip_serializing_if = "Option::is_none"
    )]
    pub byte_offset: Option<u64>,

    /// Distance in bytes between consecutive elements; tightly packed when
    /// omitted.
    #[serde(rename = "byteStride", skip_serializing_if = "Option::is_none")]
    pub byte_stride: Option<u64>,

    /// Optional user-defined name for this object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// GPU binding hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Target>,

    /// Extension specific data.
    #[serde(default, skip_serializing_if = "RawExtensions::is_empty")]
    pub extensions: RawExtensions,

    /// Optional application specific data.
    #[serde(default, skip_serializing_if = "crate::extras_is_null")]
    pub extras: Extras,
}
