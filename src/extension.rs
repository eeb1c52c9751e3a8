//! Runtime-registered extensions and their graph-resident properties.
//!
//! An extension bundles a stable name, optional graph property types, and
//! the read/write hooks that translate its JSON fragments. Unknown optional
//! fragments pass through the codec untouched; unknown *required* extensions
//! fail the read unless the caller opts into tolerance.

use crate::codec::{ReadContext, WriteContext};
use crate::error::Result;
use crate::property::Hasher32;
use crate::schema::EdgeFieldDef;
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// The payload of a property owned by an extension.
///
/// Extension properties participate in the graph like built-in ones; since
/// their shape is only known at runtime they supply their own edge-field
/// declarations and capability hooks instead of entries in the static
/// schema.
pub trait ExtensionPropertyData: Any {
    /// Name of the owning extension, e.g. `"KHR_lights_punctual"`.
    fn extension_name(&self) -> &'static str;

    /// Discriminates property kinds within one extension, e.g. `"Light"`.
    fn kind(&self) -> &'static str;

    /// Edge fields of this property kind.
    fn edge_fields(&self) -> &'static [EdgeFieldDef] {
        &[]
    }

    /// Clones the payload.
    fn clone_box(&self) -> Box<dyn ExtensionPropertyData>;

    /// Compares value attributes with another extension payload.
    fn attributes_equal(&self, other: &dyn ExtensionPropertyData) -> bool;

    /// Feeds value attributes into the structural hash.
    fn hash_attributes(&self, hasher: &mut Hasher32);

    /// Upcast for downcasting to the concrete payload.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for downcasting to the concrete payload.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl fmt::Debug for dyn ExtensionPropertyData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.extension_name(), self.kind())
    }
}

/// A registered extension: a name plus codec hooks.
pub trait Extension {
    /// The unique extension name, stable across versions.
    fn name(&self) -> &'static str;

    /// Whether assets using this extension must list it under
    /// `extensionsRequired`.
    fn required(&self) -> bool {
        false
    }

    /// Consumes the extension's JSON fragments after the host properties
    /// exist, attaching extension properties and edge attributes.
    fn read(&self, ctx: &mut ReadContext<'_>) -> Result<()>;

    /// Emits the extension's JSON fragments into the output document.
    ///
    /// Runs after the core arrays are lowered; implementations report
    /// themselves through [`WriteContext::mark_used`].
    fn write(&self, ctx: &mut WriteContext<'_>) -> Result<()>;

    /// Supplies the image index for a wire texture whose core `source` is
    /// omitted, e.g. `KHR_texture_basisu`.
    fn image_source(&self, _texture: &gltf_forge_json::texture::Texture) -> Option<usize> {
        None
    }

    /// Offers the extension a freshly lowered texture entry.
    ///
    /// Returning `true` claims the texture: the extension has moved or
    /// augmented the entry (typically relocating `source` into its own
    /// fragment) and is recorded as used.
    fn rewrite_texture(
        &self,
        _mime_type: Option<&str>,
        _texture: &mut gltf_forge_json::texture::Texture,
    ) -> bool {
        false
    }
}

/// The set of registered extensions, dispatched in stable name order.
#[derive(Clone, Default)]
pub struct ExtensionRegistry {
    entries: BTreeMap<&'static str, Arc<dyn Extension>>,
}

impl ExtensionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every built-in extension registered.
    pub fn with_builtin_extensions() -> Self {
        let mut registry = Self::new();
        registry.register(crate::extensions::LightsPunctual);
        registry.register(crate::extensions::MaterialsClearcoat);
        registry.register(crate::extensions::TextureBasisu);
        registry
    }

    /// Registers an extension, replacing any previous handler of that name.
    pub fn register(&mut self, extension: impl Extension + 'static) {
        self.entries.insert(extension.name(), Arc::new(extension));
    }

    /// Whether a handler is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Returns the handler registered under `name`.
    pub fn get(&self, name: &str) -> Option<&dyn Extension> {
        self.entries.get(name).map(|e| e.as_ref())
    }

    /// Iterates handlers in stable name order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Extension> {
        self.entries.values().map(|e| e.as_ref())
    }
}

impl fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.keys())
            .finish()
    }
}
