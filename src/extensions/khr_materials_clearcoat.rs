//! `KHR_materials_clearcoat`: a secondary specular layer over the base
//! material.

use crate::codec::{ReadContext, WriteContext};
use crate::error::{Error, Result};
use crate::extension::{Extension, ExtensionPropertyData};
use crate::properties::{TextureInfo, TextureRef};
use crate::property::Hasher32;
use crate::schema::{EdgeFieldDef, EdgeKind, PropertyType};
use gltf_forge_json as json;
use serde_json::{json as json_value, Value};
use std::any::Any;

/// The extension name.
pub const KHR_MATERIALS_CLEARCOAT: &str = "KHR_materials_clearcoat";

const CLEARCOAT_TEXTURE: &str = "clearcoatTexture";
const CLEARCOAT_ROUGHNESS_TEXTURE: &str = "clearcoatRoughnessTexture";
const CLEARCOAT_NORMAL_TEXTURE: &str = "clearcoatNormalTexture";

const EDGE_FIELDS: &[EdgeFieldDef] = &[
    EdgeFieldDef {
        name: CLEARCOAT_TEXTURE,
        kind: EdgeKind::Single,
        child: &[PropertyType::Texture],
    },
    EdgeFieldDef {
        name: CLEARCOAT_ROUGHNESS_TEXTURE,
        kind: EdgeKind::Single,
        child: &[PropertyType::Texture],
    },
    EdgeFieldDef {
        name: CLEARCOAT_NORMAL_TEXTURE,
        kind: EdgeKind::Single,
        child: &[PropertyType::Texture],
    },
];

/// Clearcoat layer parameters attached to a material's extensions.
///
/// The three texture slots are edge fields carrying `TextureInfo`, exactly
/// like the core material slots.
#[derive(Clone, Debug, PartialEq)]
pub struct ClearcoatData {
    /// Strength of the clearcoat layer.
    pub factor: f32,
    /// Roughness of the clearcoat layer.
    pub roughness_factor: f32,
    /// Scalar applied to the clearcoat normal map.
    pub normal_scale: f32,
}

impl Default for ClearcoatData {
    fn default() -> Self {
        Self {
            factor: 0.0,
            roughness_factor: 0.0,
            normal_scale: 1.0,
        }
    }
}

impl ExtensionPropertyData for ClearcoatData {
    fn extension_name(&self) -> &'static str {
        KHR_MATERIALS_CLEARCOAT
    }

    fn kind(&self) -> &'static str {
        "Clearcoat"
    }

    fn edge_fields(&self) -> &'static [EdgeFieldDef] {
        EDGE_FIELDS
    }

    fn clone_box(&self) -> Box<dyn ExtensionPropertyData> {
        Box::new(self.clone())
    }

    fn attributes_equal(&self, other: &dyn ExtensionPropertyData) -> bool {
        other
            .as_any()
            .downcast_ref::<ClearcoatData>()
            .is_some_and(|other| self == other)
    }

    fn hash_attributes(&self, hasher: &mut Hasher32) {
        hasher.write_f32(self.factor);
        hasher.write_f32(self.roughness_factor);
        hasher.write_f32(self.normal_scale);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Registry entry for `KHR_materials_clearcoat`.
#[derive(Clone, Copy, Debug, Default)]
pub struct MaterialsClearcoat;

impl Extension for MaterialsClearcoat {
    fn name(&self) -> &'static str {
        KHR_MATERIALS_CLEARCOAT
    }

    fn read(&self, ctx: &mut ReadContext<'_>) -> Result<()> {
        struct Parsed {
            material: usize,
            data: ClearcoatData,
            slots: Vec<(&'static str, json::texture::Info)>,
        }

        let mut parsed = Vec::new();
        for (index, material) in ctx.json().materials.iter().enumerate() {
            let Some(fragment) = material.extensions.get(KHR_MATERIALS_CLEARCOAT) else {
                continue;
            };
            let mut data = ClearcoatData {
                factor: fragment
                    .get("clearcoatFactor")
                    .and_then(Value::as_f64)
                    .unwrap_or(0.0) as f32,
                roughness_factor: fragment
                    .get("clearcoatRoughnessFactor")
                    .and_then(Value::as_f64)
                    .unwrap_or(0.0) as f32,
                normal_scale: 1.0,
            };
            let mut slots = Vec::new();
            for field in [CLEARCOAT_TEXTURE, CLEARCOAT_ROUGHNESS_TEXTURE] {
                if let Some(value) = fragment.get(field) {
                    let info: json::texture::Info =
                        serde_json::from_value(value.clone()).map_err(|_| {
                            Error::InvalidContainer(format!(
                                "material {index}: malformed {field}"
                            ))
                        })?;
                    slots.push((field, info));
                }
            }
            if let Some(value) = fragment.get(CLEARCOAT_NORMAL_TEXTURE) {
                data.normal_scale = value
                    .get("scale")
                    .and_then(Value::as_f64)
                    .unwrap_or(1.0) as f32;
                let info: json::texture::Info =
                    serde_json::from_value(value.clone()).map_err(|_| {
                        Error::InvalidContainer(format!(
                            "material {index}: malformed {CLEARCOAT_NORMAL_TEXTURE}"
                        ))
                    })?;
                slots.push((CLEARCOAT_NORMAL_TEXTURE, info));
            }
            parsed.push(Parsed {
                material: index,
                data,
                slots,
            });
        }

        let materials = ctx.materials().to_vec();
        for item in parsed {
            let mut resolved = Vec::with_capacity(item.slots.len());
            for (field, wire) in &item.slots {
                resolved.push((*field, ctx.texture_slot(wire)?));
            }
            let material = materials[item.material];
            let doc = ctx.doc();
            let reference = doc.create_extension_property(Box::new(item.data), "");
            doc.set_extension(material.key(), reference)?;
            for (field, (texture, info)) in resolved {
                doc.set_texture_child(reference.key(), field, Some(texture.key()))?;
                doc.set_texture_info(reference.key(), field, info)?;
            }
        }
        Ok(())
    }

    fn write(&self, ctx: &mut WriteContext<'_>) -> Result<()> {
        struct Pending {
            material: usize,
            data: ClearcoatData,
            slots: Vec<(&'static str, TextureRef, TextureInfo)>,
        }

        let doc = ctx.doc();
        let mut pending = Vec::new();
        for material in doc.materials() {
            let Some(reference) = doc.get_extension(material.key(), KHR_MATERIALS_CLEARCOAT)
            else {
                continue;
            };
            let Some(index) = ctx.material_index(material) else {
                continue;
            };
            let data = doc.extension_data::<ClearcoatData>(reference)?.clone();
            let mut slots = Vec::new();
            for field in [
                CLEARCOAT_TEXTURE,
                CLEARCOAT_ROUGHNESS_TEXTURE,
                CLEARCOAT_NORMAL_TEXTURE,
            ] {
                if let Some(texture) = doc.child(reference.key(), field) {
                    let info = doc
                        .texture_info(reference.key(), field)
                        .cloned()
                        .unwrap_or_default();
                    slots.push((field, doc.as_ref::<crate::properties::TextureData>(texture)?, info));
                }
            }
            pending.push(Pending {
                material: index,
                data,
                slots,
            });
        }
        if pending.is_empty() {
            return Ok(());
        }

        ctx.mark_used(KHR_MATERIALS_CLEARCOAT, self.required());
        for item in pending {
            let mut fragment = serde_json::Map::new();
            if item.data.factor != 0.0 {
                fragment.insert("clearcoatFactor".to_string(), json_value!(item.data.factor));
            }
            if item.data.roughness_factor != 0.0 {
                fragment.insert(
                    "clearcoatRoughnessFactor".to_string(),
                    json_value!(item.data.roughness_factor),
                );
            }
            for (field, texture, info) in item.slots {
                let wire = ctx.texture_info_to_json(texture, &info)?;
                let mut value = serde_json::to_value(&wire)?;
                if field == CLEARCOAT_NORMAL_TEXTURE && item.data.normal_scale != 1.0 {
                    if let Some(object) = value.as_object_mut() {
                        object.insert("scale".to_string(), json_value!(item.data.normal_scale));
                    }
                }
                fragment.insert(field.to_string(), value);
            }
            ctx.json_mut().materials[item.material]
                .extensions
                .insert(KHR_MATERIALS_CLEARCOAT.to_string(), Value::Object(fragment));
        }
        Ok(())
    }
}
