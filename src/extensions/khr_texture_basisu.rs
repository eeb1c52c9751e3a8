//! `KHR_texture_basisu`: KTX2/Basis Universal texture sources.
//!
//! KTX2 images are not part of core glTF, so a texture backed by one moves
//! its `source` into the extension fragment and the core field is omitted.
//! Readers without the extension then fall back to nothing instead of
//! choking on an unreadable image.

use crate::codec::{ReadContext, WriteContext};
use crate::error::Result;
use crate::extension::Extension;
use gltf_forge_json as json;
use serde_json::json as json_value;

/// The extension name.
pub const KHR_TEXTURE_BASISU: &str = "KHR_texture_basisu";

/// Registry entry for `KHR_texture_basisu`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TextureBasisu;

impl Extension for TextureBasisu {
    fn name(&self) -> &'static str {
        KHR_TEXTURE_BASISU
    }

    fn required(&self) -> bool {
        true
    }

    fn read(&self, _ctx: &mut ReadContext<'_>) -> Result<()> {
        // The relocated source is resolved through `image_source` while the
        // core reader binds textures; nothing else to do.
        Ok(())
    }

    fn write(&self, _ctx: &mut WriteContext<'_>) -> Result<()> {
        // Emission happens per texture through `rewrite_texture`.
        Ok(())
    }

    fn image_source(&self, texture: &json::texture::Texture) -> Option<usize> {
        texture
            .extensions
            .get(KHR_TEXTURE_BASISU)?
            .get("source")?
            .as_u64()
            .map(|source| source as usize)
    }

    fn rewrite_texture(
        &self,
        mime_type: Option<&str>,
        texture: &mut json::texture::Texture,
    ) -> bool {
        if mime_type != Some("image/ktx2") {
            return false;
        }
        let Some(source) = texture.source.take() else {
            return false;
        };
        texture.extensions.insert(
            KHR_TEXTURE_BASISU.to_string(),
            json_value!({ "source": source.value() }),
        );
        true
    }
}
