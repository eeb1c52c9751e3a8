/// Binary data container.
///
/// A buffer groups the payloads of the accessors and packed textures that
/// reference it; its byte length is derived at write time. With a `uri` the
/// payload is written as a sibling resource, without one it is embedded (a
/// data URI, or the BIN chunk in the single-file container).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BufferData {
    /// Target URI, when the payload lives in an external resource.
    pub uri: Option<String>,
}
