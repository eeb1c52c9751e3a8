/// Implements tolerant (de)serialization for a wire enumeration encoded as
/// an integer code.
///
/// Decoding produces `Checked<T>`: recognized codes map to
/// `Checked::Valid`, anything else to `Checked::Invalid` so that one bad
/// value does not fail the whole parse. Encoding writes the code back.
macro_rules! wire_code_enum {
    ($ty:ident, $expecting:literal, { $($code:literal => $variant:ident),+ $(,)? }) => {
        impl<'de> serde::de::Deserialize<'de> for crate::validation::Checked<$ty> {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::de::Deserializer<'de>,
            {
                struct Visitor;
                impl<'de> serde::de::Visitor<'de> for Visitor {
                    type Value = crate::validation::Checked<$ty>;

                    fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                        f.write_str($expecting)
                    }

                    fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
                    where
                        E: serde::de::Error,
                    {
                        Ok(match value as u32 {
                            $($code => crate::validation::Checked::Valid($ty::$variant),)+
                            _ => crate::validation::Checked::Invalid,
                        })
                    }
                }
                deserializer.deserialize_u64(Visitor)
            }
        }

        impl serde::ser::Serialize for $ty {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::ser::Serializer,
            {
                serializer.serialize_u32(match self {
                    $($ty::$variant => $code,)+
                })
            }
        }
    };
}

/// Implements tolerant (de)serialization for a wire enumeration encoded as
/// a magic string, with the same `Checked<T>` contract as
/// [`wire_code_enum`].
macro_rules! wire_str_enum {
    ($ty:ident, $expecting:literal, { $($name:literal => $variant:ident),+ $(,)? }) => {
        impl<'de> serde::de::Deserialize<'de> for crate::validation::Checked<$ty> {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::de::Deserializer<'de>,
            {
                struct Visitor;
                impl<'de> serde::de::Visitor<'de> for Visitor {
                    type Value = crate::validation::Checked<$ty>;

                    fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                        f.write_str($expecting)
                    }

                    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
                    where
                        E: serde::de::Error,
                    {
                        Ok(match value {
                            $($name => crate::validation::Checked::Valid($ty::$variant),)+
                            _ => crate::validation::Checked::Invalid,
                        })
                    }
                }
                deserializer.deserialize_str(Visitor)
            }
        }

        impl serde::ser::Serialize for $ty {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::ser::Serializer,
            {
                serializer.serialize_str(match self {
                    $($ty::$variant => $name,)+
                })
            }
        }
    };
}
