use crate::validation::Checked;
use crate::{buffer, Extras, Index, RawExtensions};
use serde_derive::{Deserialize, Serialize};
use serde_json::Value;

/// The storage type of a single component, keyed on the wire by its GL
/// enumeration code.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ComponentType {
    /// Signed byte (code 5120).
    I8 = 1,
    /// Unsigned byte (code 5121).
    U8,
    /// Signed 16-bit integer (code 5122).
    I16,
    /// Unsigned 16-bit integer (code 5123).
    U16,
    /// Unsigned 32-bit integer (code 5125).
    U32,
    /// 32-bit float (code 5126).
    F32,
}

wire_code_enum!(ComponentType, "a GL component type code", {
    5120 => I8,
    5121 => U8,
    5122 => I16,
    5123 => U16,
    5125 => U32,
    5126 => F32,
});

impl ComponentType {
    /// Bytes occupied by one component.
    pub fn size(self) -> usize {
        match self {
            ComponentType::I8 | ComponentType::U8 => 1,
            ComponentType::I16 | ComponentType::U16 => 2,
            ComponentType::U32 | ComponentType::F32 => 4,
        }
    }

    /// Whether this is an integer type, and so eligible for normalized
    /// interpretation.
    pub fn is_integer(self) -> bool {
        !matches!(self, ComponentType::F32)
    }

    /// Whether this type may store vertex indices.
    pub fn is_index_type(self) -> bool {
        matches!(
            self,
            ComponentType::U8 | ComponentType::U16 | ComponentType::U32
        )
    }
}

/// The element shape: scalar, vector, or matrix.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Type {
    /// One scalar.
    Scalar = 1,
    /// Two components.
    Vec2,
    /// Three components.
    Vec3,
    /// Four components.
    Vec4,
    /// A 2x2 matrix.
    Mat2,
    /// A 3x3 matrix.
    Mat3,
    /// A 4x4 matrix.
    Mat4,
}

wire_str_enum!(Type, "an accessor type name such as VEC3", {
    "SCALAR" => Scalar,
    "VEC2" => Vec2,
    "VEC3" => Vec3,
    "VEC4" => Vec4,
    "MAT2" => Mat2,
    "MAT3" => Mat3,
    "MAT4" => Mat4,
});

impl Type {
    /// Scalars per element of this shape.
    pub fn multiplicity(self) -> usize {
        match self {
            Type::Scalar => 1,
            Type::Vec2 => 2,
            Type::Vec3 => 3,
            Type::Vec4 | Type::Mat2 => 4,
            Type::Mat3 => 9,
            Type::Mat4 => 16,
        }
    }

    /// The wire name, e.g. `"VEC3"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Type::Scalar => "SCALAR",
            Type::Vec2 => "VEC2",
            Type::Vec3 => "VEC3",
            Type::Vec4 => "VEC4",
            Type::Mat2 => "MAT2",
            Type::Mat3 => "MAT3",
            Type::Mat4 => "MAT4",
        }
    }
}

/// Contains data structures for sparse storage.
pub mod sparse {
    use super::*;

    /// Positions of the elements that deviate from the initialization
    /// value. Indices must strictly increase.
    #[derive(Clone, Debug, Deserialize, Serialize)]
    pub struct Indices {
        /// The buffer view holding the index array.
        #[serde(rename = "bufferView")]
        pub buffer_view: Index<buffer::View>,

        /// Byte offset into that view.
        #[serde(default, rename = "byteOffset")]
        pub byte_offset: u64,

        /// Storage type of each index; an unsigned integer type.
        #[serde(rename = "componentType")]
        pub component_type: Checked<ComponentType>,
    }

    /// Compact storage for elements deviating from the initialization
    /// value.
    #[derive(Clone, Debug, Deserialize, Serialize)]
    pub struct Sparse {
        /// How many elements deviate.
        pub count: u64,

        /// Where they are.
        pub indices: Indices,

        /// What they hold.
        pub values: Values,
    }

    /// The replacement elements, `count * multiplicity` components wide,
    /// matching the parent accessor's component type.
    #[derive(Clone, Debug, Deserialize, Serialize)]
    pub struct Values {
        /// The buffer view holding the replacement elements.
        #[serde(rename = "bufferView")]
        pub buffer_view: Index<buffer::View>,

        /// Byte offset into that view.
        #[serde(default, rename = "byteOffset")]
        pub byte_offset: u64,
    }
}

/// A typed view into a buffer view.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Accessor {
    /// The buffer view backing this accessor; omitted by sparse accessors
    /// whose baseline is all zeroes.
    #[serde(rename = "bufferView")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffer_view: Option<Index<buffer::View>>,

    /// Byte offset of the first element inside the buffer view.
    #[serde(default, rename = "byteOffset")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub byte_offset: Option<u64>,

    /// Number of elements, not bytes.
    pub count: u64,

    /// Storage type of each component.
    #[serde(rename = "componentType")]
    pub component_type: Checked<ComponentType>,

    /// Element shape.
    #[serde(rename = "type")]
    pub type_: Checked<Type>,

    /// Component-wise minimum of all elements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<Value>,

    /// Component-wise maximum of all elements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Value>,

    /// Optional user-defined name for this object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Whether integer components encode normalized reals.
    #[serde(default, skip_serializing_if = "is_normalized_default")]
    pub normalized: bool,

    /// Sparse overlay over the baseline elements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sparse: Option<sparse::Sparse>,

    /// Extension specific data.
    #[serde(default, skip_serializing_if = "RawExtensions::is_empty")]
    pub extensions: RawExtensions,

    /// Optional application specific data.
    #[serde(default, skip_serializing_if = "crate::extras_is_null")]
    pub extras: Extras,
}

// Help serde avoid serializing the glTF 2.0 default value.
fn is_normalized_default(b: &bool) -> bool {
    !*b
}
