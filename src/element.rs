//! Typed scalar storage and the normalized integer conversions.

use crate::error::{Error, Result};

pub use gltf_forge_json::accessor::{ComponentType, Type as ElementType};

/// The backing store of an accessor: one vector per component type.
///
/// The active variant *is* the component type, which keeps storage and
/// declared type consistent by construction.
#[derive(Clone, Debug, PartialEq)]
pub enum ScalarArray {
    /// `GL_BYTE` storage.
    I8(Vec<i8>),
    /// `GL_UNSIGNED_BYTE` storage.
    U8(Vec<u8>),
    /// `GL_SHORT` storage.
    I16(Vec<i16>),
    /// `GL_UNSIGNED_SHORT` storage.
    U16(Vec<u16>),
    /// `GL_UNSIGNED_INT` storage.
    U32(Vec<u32>),
    /// `GL_FLOAT` storage.
    F32(Vec<f32>),
}

impl ScalarArray {
    /// The component type of this storage.
    pub fn component_type(&self) -> ComponentType {
        match self {
            ScalarArray::I8(_) => ComponentType::I8,
            ScalarArray::U8(_) => ComponentType::U8,
            ScalarArray::I16(_) => ComponentType::I16,
            ScalarArray::U16(_) => ComponentType::U16,
            ScalarArray::U32(_) => ComponentType::U32,
            ScalarArray::F32(_) => ComponentType::F32,
        }
    }

    /// Number of scalars.
    pub fn len(&self) -> usize {
        match self {
            ScalarArray::I8(v) => v.len(),
            ScalarArray::U8(v) => v.len(),
            ScalarArray::I16(v) => v.len(),
            ScalarArray::U16(v) => v.len(),
            ScalarArray::U32(v) => v.len(),
            ScalarArray::F32(v) => v.len(),
        }
    }

    /// Whether the storage holds no scalars.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Zero-filled storage of the given component type and length.
    pub fn zeros(component_type: ComponentType, len: usize) -> Self {
        match component_type {
            ComponentType::I8 => ScalarArray::I8(vec![0; len]),
            ComponentType::U8 => ScalarArray::U8(vec![0; len]),
            ComponentType::I16 => ScalarArray::I16(vec![0; len]),
            ComponentType::U16 => ScalarArray::U16(vec![0; len]),
            ComponentType::U32 => ScalarArray::U32(vec![0; len]),
            ComponentType::F32 => ScalarArray::F32(vec![0.0; len]),
        }
    }

    /// Reads the scalar at `index` as `f64` without normalization.
    ///
    /// # Panics
    ///
    /// Panics when `index` is out of bounds.
    pub fn get(&self, index: usize) -> f64 {
        match self {
            ScalarArray::I8(v) => f64::from(v[index]),
            ScalarArray::U8(v) => f64::from(v[index]),
            ScalarArray::I16(v) => f64::from(v[index]),
            ScalarArray::U16(v) => f64::from(v[index]),
            ScalarArray::U32(v) => f64::from(v[index]),
            ScalarArray::F32(v) => f64::from(v[index]),
        }
    }

    /// Writes the scalar at `index`, rounding and clamping to the integer
    /// range of the storage.
    ///
    /// # Panics
    ///
    /// Panics when `index` is out of bounds.
    pub fn set(&mut self, index: usize, value: f64) {
        match self {
            ScalarArray::I8(v) => {
                v[index] = value.round().clamp(f64::from(i8::MIN), f64::from(i8::MAX)) as i8
            }
            ScalarArray::U8(v) => {
                v[index] = value.round().clamp(0.0, f64::from(u8::MAX)) as u8
            }
            ScalarArray::I16(v) => {
                v[index] = value.round().clamp(f64::from(i16::MIN), f64::from(i16::MAX)) as i16
            }
            ScalarArray::U16(v) => {
                v[index] = value.round().clamp(0.0, f64::from(u16::MAX)) as u16
            }
            ScalarArray::U32(v) => {
                v[index] = value.round().clamp(0.0, f64::from(u32::MAX)) as u32
            }
            ScalarArray::F32(v) => v[index] = value as f32,
        }
    }

    /// The storage viewed as native-endian bytes.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            ScalarArray::I8(v) => bytemuck::cast_slice(v),
            ScalarArray::U8(v) => v,
            ScalarArray::I16(v) => bytemuck::cast_slice(v),
            ScalarArray::U16(v) => bytemuck::cast_slice(v),
            ScalarArray::U32(v) => bytemuck::cast_slice(v),
            ScalarArray::F32(v) => bytemuck::cast_slice(v),
        }
    }

    /// Decodes tightly packed little-endian bytes into typed storage.
    pub fn from_le_bytes(component_type: ComponentType, bytes: &[u8]) -> Result<Self> {
        let size = component_type.size();
        if bytes.len() % size != 0 {
            return Err(Error::OutOfRange(format!(
                "{} bytes do not divide into {size}-byte components",
                bytes.len()
            )));
        }
        let chunks = bytes.chunks_exact(size);
        Ok(match component_type {
            ComponentType::I8 => {
                ScalarArray::I8(bytes.iter().map(|b| *b as i8).collect())
            }
            ComponentType::U8 => ScalarArray::U8(bytes.to_vec()),
            ComponentType::I16 => ScalarArray::I16(
                chunks.map(|c| i16::from_le_bytes([c[0], c[1]])).collect(),
            ),
            ComponentType::U16 => ScalarArray::U16(
                chunks.map(|c| u16::from_le_bytes([c[0], c[1]])).collect(),
            ),
            ComponentType::U32 => ScalarArray::U32(
                chunks
                    .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                    .collect(),
            ),
            ComponentType::F32 => ScalarArray::F32(
                chunks
                    .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                    .collect(),
            ),
        })
    }

    /// Encodes the storage as little-endian bytes.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len() * self.component_type().size());
        match self {
            ScalarArray::I8(v) => out.extend(v.iter().map(|s| *s as u8)),
            ScalarArray::U8(v) => out.extend_from_slice(v),
            ScalarArray::I16(v) => {
                for s in v {
                    out.extend_from_slice(&s.to_le_bytes());
                }
            }
            ScalarArray::U16(v) => {
                for s in v {
                    out.extend_from_slice(&s.to_le_bytes());
                }
            }
            ScalarArray::U32(v) => {
                for s in v {
                    out.extend_from_slice(&s.to_le_bytes());
                }
            }
            ScalarArray::F32(v) => {
                for s in v {
                    out.extend_from_slice(&s.to_le_bytes());
                }
            }
        }
        out
    }
}

/// Converts a raw integer component to normalized float space.
///
/// Unsigned types map onto `[0, 1]`; signed types onto `[-1, 1]` with the
/// most negative value clamped. `U32` and `F32` pass through.
pub fn normalize(value: f64, component_type: ComponentType) -> f32 {
    match component_type {
        ComponentType::U8 => (value / 255.0) as f32,
        ComponentType::I8 => ((value / 127.0) as f32).max(-1.0),
        ComponentType::U16 => (value / 65535.0) as f32,
        ComponentType::I16 => ((value / 32767.0) as f32).max(-1.0),
        ComponentType::U32 | ComponentType::F32 => value as f32,
    }
}

/// Converts a normalized float back to raw integer space.
///
/// The result is rounded by the caller's storage write; out-of-range input
/// clamps there as well.
pub fn denormalize(value: f32, component_type: ComponentType) -> f64 {
    let value = f64::from(value);
    match component_type {
        ComponentType::U8 => value * 255.0,
        ComponentType::I8 => value * 127.0,
        ComponentType::U16 => value * 65535.0,
        ComponentType::I16 => value * 32767.0,
        ComponentType::U32 | ComponentType::F32 => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn le_byte_round_trip() {
        let array = ScalarArray::U16(vec![1, 2, 515]);
        let bytes = array.to_le_bytes();
        assert_eq!(bytes, vec![1, 0, 2, 0, 3, 2]);
        assert_eq!(
            ScalarArray::from_le_bytes(ComponentType::U16, &bytes).unwrap(),
            array
        );
    }

    #[test]
    fn signed_normalization_clamps_most_negative() {
        assert_eq!(normalize(-128.0, ComponentType::I8), -1.0);
        assert_eq!(normalize(127.0, ComponentType::I8), 1.0);
        assert_eq!(normalize(255.0, ComponentType::U8), 1.0);
    }

    #[test]
    fn set_rounds_and_clamps() {
        let mut array = ScalarArray::U8(vec![0]);
        array.set(0, 254.6);
        assert_eq!(array.get(0), 255.0);
        array.set(0, -4.0);
        assert_eq!(array.get(0), 0.0);
    }
}
