use crate::element::ScalarArray;
use crate::error::{Error, Result};
use crate::property::Hasher32;

pub use gltf_forge_json::accessor::{ComponentType, Type as ElementType};

/// A typed array of elements, each `multiplicity` scalars wide.
///
/// The component type is structural: it is the variant of the backing
/// [`ScalarArray`], so an accessor can never disagree with its storage.
#[derive(Clone, Debug, PartialEq)]
pub struct AccessorData {
    element_type: ElementType,
    array: ScalarArray,
    normalized: bool,
    sparse: bool,
}

impl Default for AccessorData {
    fn default() -> Self {
        Self {
            element_type: ElementType::Scalar,
            array: ScalarArray::F32(Vec::new()),
            normalized: false,
            sparse: false,
        }
    }
}

impl AccessorData {
    /// Creates an accessor over `array` with the given element type.
    pub fn new(element_type: ElementType, array: ScalarArray) -> Result<Self> {
        let mut data = Self::default();
        data.element_type = element_type;
        data.set_array(array)?;
        Ok(data)
    }

    /// The element type, e.g. `VEC3`.
    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    /// The component type, derived from the backing array.
    pub fn component_type(&self) -> ComponentType {
        self.array.component_type()
    }

    /// Scalars per element.
    pub fn multiplicity(&self) -> usize {
        self.element_type.multiplicity()
    }

    /// Number of elements.
    pub fn count(&self) -> usize {
        self.array.len() / self.multiplicity()
    }

    /// Size of one element in bytes.
    pub fn element_size(&self) -> usize {
        self.multiplicity() * self.component_type().size()
    }

    /// Total payload size in bytes.
    pub fn byte_length(&self) -> usize {
        self.array.len() * self.component_type().size()
    }

    /// The backing scalar array.
    pub fn array(&self) -> &ScalarArray {
        &self.array
    }

    /// Replaces the backing array.
    ///
    /// The scalar count must divide evenly into elements, and a normalized
    /// accessor cannot take float storage.
    pub fn set_array(&mut self, array: ScalarArray) -> Result<()> {
        self.check_shape(self.element_type, &array, self.normalized)?;
        self.array = array;
        Ok(())
    }

    /// Changes the element type, re-checking the array shape.
    pub fn set_element_type(&mut self, element_type: ElementType) -> Result<()> {
        self.check_shape(element_type, &self.array, self.normalized)?;
        self.element_type = element_type;
        Ok(())
    }

    /// Whether integer values are interpreted as normalized reals.
    pub fn normalized(&self) -> bool {
        self.normalized
    }

    /// Toggles normalized interpretation; valid only for integer storage.
    pub fn set_normalized(&mut self, normalized: bool) -> Result<()> {
        self.check_shape(self.element_type, &self.array, normalized)?;
        self.normalized = normalized;
        Ok(())
    }

    /// Whether the accessor is flagged for sparse serialization.
    pub fn sparse(&self) -> bool {
        self.sparse
    }

    /// Flags the accessor for sparse serialization. The writer quietly
    /// promotes it back to dense when too many elements are non-zero.
    pub fn set_sparse(&mut self, sparse: bool) {
        self.sparse = sparse;
    }

    fn check_shape(
        &self,
        element_type: ElementType,
        array: &ScalarArray,
        normalized: bool,
    ) -> Result<()> {
        if array.len() % element_type.multiplicity() != 0 {
            return Err(Error::InvariantViolation(format!(
                "array of {} scalars does not divide into {} elements",
                array.len(),
                element_type.as_str(),
            )));
        }
        if normalized && !array.component_type().is_integer() {
            return Err(Error::InvariantViolation(
                "normalized accessors require integer storage".into(),
            ));
        }
        Ok(())
    }

    /// Reads the element at `index` into `out`, applying normalization when
    /// the accessor is normalized.
    ///
    /// `out` must hold exactly `multiplicity` scalars.
    pub fn get_element(&self, index: usize, out: &mut [f32]) -> Result<()> {
        let size = self.multiplicity();
        if out.len() != size {
            return Err(Error::InvariantViolation(format!(
                "element buffer holds {} scalars, expected {size}",
                out.len()
            )));
        }
        if index >= self.count() {
            return Err(Error::OutOfRange(format!(
                "element index {index} exceeds count {}",
                self.count()
            )));
        }
        let component = self.component_type();
        for (i, slot) in out.iter_mut().enumerate() {
            let raw = self.array.get(index * size + i);
            *slot = if self.normalized {
                crate::element::normalize(raw, component)
            } else {
                raw as f32
            };
        }
        Ok(())
    }

    /// Writes `value` into the element at `index`.
    ///
    /// For normalized accessors, values are denormalized, rounded, and
    /// clamped to the integer range of the storage.
    pub fn set_element(&mut self, index: usize, value: &[f32]) -> Result<()> {
        let size = self.multiplicity();
        if value.len() != size {
            return Err(Error::InvariantViolation(format!(
                "element holds {} scalars, expected {size}",
                value.len()
            )));
        }
        if index >= self.count() {
            return Err(Error::OutOfRange(format!(
                "element index {index} exceeds count {}",
                self.count()
            )));
        }
        let component = self.component_type();
        for (i, v) in value.iter().enumerate() {
            let raw = if self.normalized {
                crate::element::denormalize(*v, component)
            } else {
                f64::from(*v)
            };
            self.array.set(index * size + i, raw);
        }
        Ok(())
    }

    /// Component-wise minimum over all elements, in raw (storage) space.
    ///
    /// NaN components are skipped; the first non-NaN value wins ties.
    pub fn min_raw(&self) -> Vec<f64> {
        self.fold(f64::INFINITY, |best, v| if v < best { v } else { best })
    }

    /// Component-wise maximum over all elements, in raw (storage) space.
    pub fn max_raw(&self) -> Vec<f64> {
        self.fold(f64::NEG_INFINITY, |best, v| if v > best { v } else { best })
    }

    /// Component-wise minimum in normalized space.
    pub fn min_normalized(&self) -> Vec<f32> {
        self.normalize_bounds(self.min_raw())
    }

    /// Component-wise maximum in normalized space.
    pub fn max_normalized(&self) -> Vec<f32> {
        self.normalize_bounds(self.max_raw())
    }

    fn fold(&self, init: f64, pick: impl Fn(f64, f64) -> f64) -> Vec<f64> {
        let size = self.multiplicity();
        let mut out = vec![init; size];
        let mut seen = vec![false; size];
        for element in 0..self.count() {
            for i in 0..size {
                let v = self.array.get(element * size + i);
                if v.is_nan() {
                    continue;
                }
                out[i] = if seen[i] { pick(out[i], v) } else { v };
                seen[i] = true;
            }
        }
        for (i, seen) in seen.iter().enumerate() {
            if !seen {
                out[i] = 0.0;
            }
        }
        out
    }

    fn normalize_bounds(&self, raw: Vec<f64>) -> Vec<f32> {
        let component = self.component_type();
        raw.into_iter()
            .map(|v| {
                if self.normalized {
                    crate::element::normalize(v, component)
                } else {
                    v as f32
                }
            })
            .collect()
    }

    pub(crate) fn hash_attributes(&self, hasher: &mut Hasher32) {
        hasher.write_u8(self.element_type as u8);
        hasher.write_u8(self.component_type() as u8);
        hasher.write_u8(u8::from(self.normalized));
        hasher.write_u8(u8::from(self.sparse));
        hasher.write(self.array.as_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_derives_from_array_shape() {
        let data = AccessorData::new(
            ElementType::Vec3,
            ScalarArray::F32(vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]),
        )
        .unwrap();
        assert_eq!(data.count(), 3);
        assert_eq!(data.element_size(), 12);
        assert_eq!(data.byte_length(), 36);
    }

    #[test]
    fn rejects_ragged_array() {
        let result = AccessorData::new(ElementType::Vec3, ScalarArray::F32(vec![0.0; 7]));
        assert!(matches!(result, Err(Error::InvariantViolation(_))));
    }

    #[test]
    fn rejects_normalized_float_storage() {
        let mut data =
            AccessorData::new(ElementType::Scalar, ScalarArray::F32(vec![0.5])).unwrap();
        assert!(data.set_normalized(true).is_err());

        let mut data = AccessorData::new(ElementType::Scalar, ScalarArray::U8(vec![5])).unwrap();
        assert!(data.set_normalized(true).is_ok());
    }

    #[test]
    fn normalized_round_trip_clamps() {
        let mut data =
            AccessorData::new(ElementType::Scalar, ScalarArray::U8(vec![0, 0])).unwrap();
        data.set_normalized(true).unwrap();
        data.set_element(0, &[0.5]).unwrap();
        data.set_element(1, &[2.0]).unwrap();
        let mut out = [0.0f32];
        data.get_element(0, &mut out).unwrap();
        assert!((out[0] - 128.0 / 255.0).abs() < 1e-6);
        data.get_element(1, &mut out).unwrap();
        assert_eq!(out[0], 1.0);
    }

    #[test]
    fn min_max_skip_nan() {
        let data = AccessorData::new(
            ElementType::Scalar,
            ScalarArray::F32(vec![f32::NAN, 3.0, -1.0]),
        )
        .unwrap();
        assert_eq!(data.min_raw(), vec![-1.0]);
        assert_eq!(data.max_raw(), vec![3.0]);
    }

    #[test]
    fn zero_count_is_valid() {
        let data = AccessorData::new(ElementType::Vec2, ScalarArray::U16(Vec::new())).unwrap();
        assert_eq!(data.count(), 0);
        assert_eq!(data.min_raw(), vec![0.0, 0.0]);
    }
}
