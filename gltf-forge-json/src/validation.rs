use serde::{ser, Serialize, Serializer};

/// A wire value that has been range-checked during deserialization.
///
/// glTF encodes many enumerations as bare integers or magic strings. Decoding
/// maps any unrecognized value to [`Checked::Invalid`] instead of failing the
/// whole parse, so the consumer can report the offending path with context.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Checked<T> {
    /// The item is valid.
    Valid(T),

    /// The item is invalid.
    Invalid,
}

impl<T> Checked<T> {
    /// Borrows the checked value.
    pub fn as_ref(&self) -> Checked<&T> {
        match *self {
            Checked::Valid(ref item) => Checked::Valid(item),
            Checked::Invalid => Checked::Invalid,
        }
    }

    /// Returns the contained item if it is `Valid`.
    pub fn ok(self) -> Option<T> {
        match self {
            Checked::Valid(item) => Some(item),
            Checked::Invalid => None,
        }
    }

    /// Extracts the valid value.
    ///
    /// # Panics
    ///
    /// Panics if called on an `Invalid` item.
    pub fn unwrap(self) -> T {
        match self {
            Checked::Valid(item) => item,
            Checked::Invalid => panic!("attempted to unwrap an invalid item"),
        }
    }
}

impl<T: Serialize> Serialize for Checked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match *self {
            Checked::Valid(ref item) => item.serialize(serializer),
            Checked::Invalid => Err(ser::Error::custom("invalid item")),
        }
    }
}

impl<T: Default> Default for Checked<T> {
    fn default() -> Self {
        Checked::Valid(T::default())
    }
}
