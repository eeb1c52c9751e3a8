/// Image data usable by material texture slots.
///
/// Exactly one of `uri` or the inline `image` bytes must provide the pixels
/// by the time the document is written; the codec enforces this. Sampling
/// parameters live on the referencing edges as
/// [`TextureInfo`](crate::properties::TextureInfo), not here.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TextureData {
    /// Source URI, kept for external resources and used to name the image on
    /// write.
    pub uri: Option<String>,

    /// The image's MIME type. Required when the image is embedded.
    pub mime_type: Option<String>,

    /// In-memory encoded image bytes.
    pub image: Option<Vec<u8>>,
}

impl TextureData {
    /// Whether either source of pixel data is present.
    pub fn has_content(&self) -> bool {
        self.image.is_some() || self.uri.is_some()
    }
}
