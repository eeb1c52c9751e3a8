//! `KHR_lights_punctual`: directional, point, and spot lights on nodes.

use crate::codec::{ReadContext, WriteContext};
use crate::error::{Error, Result};
use crate::extension::{Extension, ExtensionPropertyData};
use crate::property::Hasher32;
use serde_json::{json, Value};
use std::any::Any;

/// The extension name.
pub const KHR_LIGHTS_PUNCTUAL: &str = "KHR_lights_punctual";

/// The light's emission shape.
#[derive(Clone, Debug, PartialEq)]
pub enum LightKind {
    /// Parallel rays along the node's -Z axis; intensity in lux.
    Directional,
    /// Emits in all directions; intensity in candela.
    Point,
    /// A cone along the node's -Z axis; intensity in candela.
    Spot {
        /// Angle where falloff begins, in radians.
        inner_cone_angle: f32,
        /// Angle where emission ends, in radians.
        outer_cone_angle: f32,
    },
}

/// A punctual light attached to a node's extensions.
#[derive(Clone, Debug, PartialEq)]
pub struct LightData {
    /// The emission shape.
    pub kind: LightKind,
    /// Linear RGB emission color.
    pub color: [f32; 3],
    /// Brightness in the unit of the light kind.
    pub intensity: f32,
    /// Attenuation cutoff distance; unlimited when absent.
    pub range: Option<f32>,
}

impl Default for LightData {
    fn default() -> Self {
        Self {
            kind: LightKind::Point,
            color: [1.0; 3],
            intensity: 1.0,
            range: None,
        }
    }
}

impl ExtensionPropertyData for LightData {
    fn extension_name(&self) -> &'static str {
        KHR_LIGHTS_PUNCTUAL
    }

    fn kind(&self) -> &'static str {
        "Light"
    }

    fn clone_box(&self) -> Box<dyn ExtensionPropertyData> {
        Box::new(self.clone())
    }

    fn attributes_equal(&self, other: &dyn ExtensionPropertyData) -> bool {
        other
            .as_any()
            .downcast_ref::<LightData>()
            .is_some_and(|other| self == other)
    }

    fn hash_attributes(&self, hasher: &mut Hasher32) {
        match &self.kind {
            LightKind::Directional => hasher.write_u8(0),
            LightKind::Point => hasher.write_u8(1),
            LightKind::Spot {
                inner_cone_angle,
                outer_cone_angle,
            } => {
                hasher.write_u8(2);
                hasher.write_f32(*inner_cone_angle);
                hasher.write_f32(*outer_cone_angle);
            }
        }
        self.color.iter().for_each(|c| hasher.write_f32(*c));
        hasher.write_f32(self.intensity);
        hasher.write_opt_f32(self.range);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Registry entry for `KHR_lights_punctual`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LightsPunctual;

impl Extension for LightsPunctual {
    fn name(&self) -> &'static str {
        KHR_LIGHTS_PUNCTUAL
    }

    fn read(&self, ctx: &mut ReadContext<'_>) -> Result<()> {
        let lights_json: Vec<Value> = ctx
            .json()
            .extensions
            .get(KHR_LIGHTS_PUNCTUAL)
            .and_then(|fragment| fragment.get("lights"))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        if lights_json.is_empty() {
            return Ok(());
        }

        let mut assignments = Vec::new();
        for (node_index, node) in ctx.json().nodes.iter().enumerate() {
            if let Some(light) = node
                .extensions
                .get(KHR_LIGHTS_PUNCTUAL)
                .and_then(|fragment| fragment.get("light"))
                .and_then(Value::as_u64)
            {
                assignments.push((node_index, light as usize));
            }
        }
        let nodes = ctx.nodes().to_vec();

        let mut lights = Vec::with_capacity(lights_json.len());
        for (index, value) in lights_json.iter().enumerate() {
            let (name, data) = parse_light(value)
                .ok_or_else(|| Error::InvalidContainer(format!("light {index} is malformed")))?;
            let reference = ctx.doc().create_extension_property(Box::new(data), &name);
            lights.push(reference);
        }

        for (node_index, light_index) in assignments {
            let light = *lights.get(light_index).ok_or_else(|| {
                Error::UnresolvedResource(format!("light index {light_index} is out of range"))
            })?;
            let node = nodes[node_index];
            ctx.doc().set_extension(node.key(), light)?;
        }
        Ok(())
    }

    fn write(&self, ctx: &mut WriteContext<'_>) -> Result<()> {
        // Lights are ordered by first appearance on the node list and
        // shared instances keep one entry.
        let doc = ctx.doc();
        let mut lights: Vec<(crate::graph::PropertyKey, Value)> = Vec::new();
        let mut assignments: Vec<(usize, usize)> = Vec::new();
        for node in doc.nodes() {
            let Some(reference) = doc.get_extension(node.key(), KHR_LIGHTS_PUNCTUAL) else {
                continue;
            };
            let index = match lights.iter().position(|(key, _)| *key == reference.key()) {
                Some(index) => index,
                None => {
                    let data = doc.extension_data::<LightData>(reference)?;
                    let name = doc.name(reference.key())?;
                    lights.push((reference.key(), light_to_json(name, data)));
                    lights.len() - 1
                }
            };
            let Some(node_index) = ctx.node_index(node) else {
                continue;
            };
            assignments.push((node_index, index));
        }
        if lights.is_empty() {
            return Ok(());
        }

        ctx.mark_used(KHR_LIGHTS_PUNCTUAL, self.required());
        let entries: Vec<Value> = lights.into_iter().map(|(_, value)| value).collect();
        ctx.json_mut()
            .extensions
            .insert(KHR_LIGHTS_PUNCTUAL.to_string(), json!({ "lights": entries }));
        for (node_index, light_index) in assignments {
            ctx.json_mut().nodes[node_index]
                .extensions
                .insert(KHR_LIGHTS_PUNCTUAL.to_string(), json!({ "light": light_index }));
        }
        Ok(())
    }
}

fn parse_light(value: &Value) -> Option<(String, LightData)> {
    let name = value
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let kind = match value.get("type")?.as_str()? {
        "directional" => LightKind::Directional,
        "point" => LightKind::Point,
        "spot" => {
            let spot = value.get("spot");
            LightKind::Spot {
                inner_cone_angle: spot
                    .and_then(|s| s.get("innerConeAngle"))
                    .and_then(Value::as_f64)
                    .unwrap_or(0.0) as f32,
                outer_cone_angle: spot
                    .and_then(|s| s.get("outerConeAngle"))
                    .and_then(Value::as_f64)
                    .unwrap_or(std::f64::consts::FRAC_PI_4) as f32,
            }
        }
        _ => return None,
    };
    let color = value
        .get("color")
        .and_then(Value::as_array)
        .and_then(|c| {
            let c: Vec<f32> = c.iter().filter_map(|v| v.as_f64().map(|v| v as f32)).collect();
            <[f32; 3]>::try_from(c).ok()
        })
        .unwrap_or([1.0; 3]);
    let intensity = value
        .get("intensity")
        .and_then(Value::as_f64)
        .unwrap_or(1.0) as f32;
    let range = value.get("range").and_then(Value::as_f64).map(|r| r as f32);
    Some((
        name,
        LightData {
            kind,
            color,
            intensity,
            range,
        },
    ))
}

fn light_to_json(name: &str, data: &LightData) -> Value {
    let mut value = serde_json::Map::new();
    if !name.is_empty() {
        value.insert("name".to_string(), json!(name));
    }
    let kind = match &data.kind {
        LightKind::Directional => "directional",
        LightKind::Point => "point",
        LightKind::Spot {
            inner_cone_angle,
            outer_cone_angle,
        } => {
            value.insert(
                "spot".to_string(),
                json!({
                    "innerConeAngle": inner_cone_angle,
                    "outerConeAngle": outer_cone_angle,
                }),
            );
            "spot"
        }
    };
    value.insert("type".to_string(), json!(kind));
    if data.color != [1.0; 3] {
        value.insert("color".to_string(), json!(data.color));
    }
    if data.intensity != 1.0 {
        value.insert("intensity".to_string(), json!(data.intensity));
    }
    if let Some(range) = data.range {
        value.insert("range".to_string(), json!(range));
    }
    Value::Object(value)
}
