//! Extension registry behavior and the built-in extensions.

use gltf_forge::codec::{Reader, Writer};
use gltf_forge::extensions::{
    ClearcoatData, LightData, LightKind, LightsPunctual, MaterialsClearcoat, TextureBasisu,
    KHR_LIGHTS_PUNCTUAL, KHR_MATERIALS_CLEARCOAT, KHR_TEXTURE_BASISU,
};
use gltf_forge::transforms::{prune, PruneOptions};
use gltf_forge::{Document, Error, ExtensionRegistry, TextureSlot};

fn registry() -> ExtensionRegistry {
    ExtensionRegistry::with_builtin_extensions()
}

#[test]
fn basisu_relocates_ktx2_sources() {
    let mut doc = Document::new();
    let ktx2 = doc.create_texture("compressed");
    doc.get_mut(ktx2).unwrap().mime_type = Some("image/ktx2".to_string());
    doc.get_mut(ktx2).unwrap().image = Some(vec![0xAB; 16]);
    let png = doc.create_texture("plain");
    doc.get_mut(png).unwrap().mime_type = Some("image/png".to_string());
    doc.get_mut(png).unwrap().image = Some(vec![0xCD; 16]);

    let m1 = doc.create_material("m1");
    doc.set_material_texture(m1, TextureSlot::BaseColor, Some(ktx2))
        .unwrap();
    let m2 = doc.create_material("m2");
    doc.set_material_texture(m2, TextureSlot::BaseColor, Some(png))
        .unwrap();

    let writer = Writer::new().with_registry(registry());
    let artifacts = writer.to_standard(&doc).unwrap();
    let json: serde_json::Value = serde_json::from_slice(&artifacts.json).unwrap();

    assert_eq!(
        json["textures"][0]["extensions"][KHR_TEXTURE_BASISU]["source"],
        0
    );
    assert!(json["textures"][0].get("source").is_none());
    assert_eq!(json["textures"][1]["source"], 1);
    assert!(json["extensionsRequired"]
        .as_array()
        .unwrap()
        .contains(&serde_json::json!(KHR_TEXTURE_BASISU)));

    let decoded = Reader::new()
        .with_registry(registry())
        .read_slice(&artifacts.json, None)
        .unwrap();
    let mimes: Vec<_> = decoded
        .textures()
        .iter()
        .map(|t| decoded.get(*t).unwrap().mime_type.clone().unwrap())
        .collect();
    assert_eq!(mimes, vec!["image/ktx2", "image/png"]);
}

#[test]
fn unknown_required_extensions_fail_unless_tolerated() {
    let json = br#"{
        "asset": {"version": "2.0"},
        "extensionsRequired": ["EXT_meshopt_compression"],
        "extensionsUsed": ["EXT_meshopt_compression"]
    }"#;
    match Reader::new().read_slice(json, None) {
        Err(Error::UnsupportedExtension(name)) => {
            assert_eq!(name, "EXT_meshopt_compression");
        }
        other => panic!("expected UnsupportedExtension, got {other:?}"),
    }

    let options = gltf_forge::codec::ReadOptions { tolerant: true };
    assert!(Reader::new()
        .with_options(options)
        .read_slice(json, None)
        .is_ok());
}

#[test]
fn unknown_optional_extensions_pass_through() {
    let json = br#"{
        "asset": {"version": "2.0"},
        "extensionsUsed": ["EXT_fictional"],
        "materials": [
            {"name": "m", "extensions": {"EXT_fictional": {"strength": 3}}}
        ]
    }"#;
    let doc = Reader::new().read_slice(json, None).unwrap();
    let material = doc.materials()[0];
    let fragments = doc
        .graph()
        .unrecognized_extensions(material.key())
        .unwrap();
    assert_eq!(fragments["EXT_fictional"]["strength"], 3);

    let artifacts = Writer::new().to_standard(&doc).unwrap();
    let out: serde_json::Value = serde_json::from_slice(&artifacts.json).unwrap();
    assert_eq!(
        out["materials"][0]["extensions"]["EXT_fictional"]["strength"],
        3
    );
    assert!(out["extensionsUsed"]
        .as_array()
        .unwrap()
        .contains(&serde_json::json!("EXT_fictional")));
}

#[test]
fn lights_round_trip_and_share_instances() {
    let mut doc = Document::new();
    let scene = doc.create_scene("s");
    let a = doc.create_node("a");
    let b = doc.create_node("b");
    doc.add_scene_node(scene, a).unwrap();
    doc.add_scene_node(scene, b).unwrap();

    let light = doc.create_extension_property(
        Box::new(LightData {
            kind: LightKind::Spot {
                inner_cone_angle: 0.2,
                outer_cone_angle: 0.6,
            },
            color: [1.0, 0.5, 0.25],
            intensity: 40.0,
            range: Some(12.0),
        }),
        "key",
    );
    doc.set_extension(a.key(), light).unwrap();
    doc.set_extension(b.key(), light).unwrap();

    let writer = Writer::new().with_registry(registry());
    let artifacts = writer.to_standard(&doc).unwrap();
    let json: serde_json::Value = serde_json::from_slice(&artifacts.json).unwrap();
    let lights = json["extensions"][KHR_LIGHTS_PUNCTUAL]["lights"]
        .as_array()
        .unwrap();
    // Two nodes, one shared light entry.
    assert_eq!(lights.len(), 1);
    assert_eq!(lights[0]["type"], "spot");
    assert_eq!(json["nodes"][0]["extensions"][KHR_LIGHTS_PUNCTUAL]["light"], 0);
    assert_eq!(json["nodes"][1]["extensions"][KHR_LIGHTS_PUNCTUAL]["light"], 0);

    let decoded = Reader::new()
        .with_registry(registry())
        .read_slice(&artifacts.json, None)
        .unwrap();
    let node = decoded.nodes()[0];
    let reference = decoded
        .get_extension(node.key(), KHR_LIGHTS_PUNCTUAL)
        .unwrap();
    let data = decoded.extension_data::<LightData>(reference).unwrap();
    assert_eq!(data.intensity, 40.0);
    assert_eq!(data.range, Some(12.0));
    assert!(matches!(data.kind, LightKind::Spot { .. }));
}

#[test]
fn clearcoat_round_trips_with_texture_slots() {
    let mut doc = Document::new();
    let material = doc.create_material("coated");
    let normal = doc.create_texture("coat-normal");
    doc.get_mut(normal).unwrap().mime_type = Some("image/png".to_string());
    doc.get_mut(normal).unwrap().image = Some(vec![1, 2, 3, 4]);

    let clearcoat = doc.create_extension_property(
        Box::new(ClearcoatData {
            factor: 1.0,
            roughness_factor: 0.25,
            normal_scale: 0.5,
        }),
        "",
    );
    doc.set_extension(material.key(), clearcoat).unwrap();
    doc.set_texture_child(clearcoat.key(), "clearcoatNormalTexture", Some(normal.key()))
        .unwrap();

    let writer = Writer::new().with_registry(registry());
    let artifacts = writer.to_standard(&doc).unwrap();
    let json: serde_json::Value = serde_json::from_slice(&artifacts.json).unwrap();
    let fragment = &json["materials"][0]["extensions"][KHR_MATERIALS_CLEARCOAT];
    assert_eq!(fragment["clearcoatFactor"], 1.0);
    assert_eq!(fragment["clearcoatNormalTexture"]["scale"], 0.5);

    let decoded = Reader::new()
        .with_registry(registry())
        .read_slice(&artifacts.json, None)
        .unwrap();
    let material = decoded.materials()[0];
    let reference = decoded
        .get_extension(material.key(), KHR_MATERIALS_CLEARCOAT)
        .unwrap();
    let data = decoded.extension_data::<ClearcoatData>(reference).unwrap();
    assert_eq!(data.roughness_factor, 0.25);
    assert_eq!(data.normal_scale, 0.5);
    assert!(decoded
        .child(reference.key(), "clearcoatNormalTexture")
        .is_some());
}

#[test]
fn disposing_an_extension_detaches_it_and_prune_collects_the_texture() {
    let mut doc = Document::new();
    let scene = doc.create_scene("s");
    let node = doc.create_node("n");
    let mesh = doc.create_mesh("m");
    let prim = doc.create_primitive();
    let material = doc.create_material("coated");
    doc.set_primitive_material(prim, Some(material)).unwrap();
    doc.add_mesh_primitive(mesh, prim).unwrap();
    doc.set_node_mesh(node, Some(mesh)).unwrap();
    doc.add_scene_node(scene, node).unwrap();

    let texture = doc.create_texture("coat-normal");
    doc.get_mut(texture).unwrap().mime_type = Some("image/png".to_string());
    doc.get_mut(texture).unwrap().image = Some(vec![0; 4]);
    let clearcoat =
        doc.create_extension_property(Box::new(ClearcoatData::default()), "");
    doc.set_extension(material.key(), clearcoat).unwrap();
    doc.set_texture_child(clearcoat.key(), "clearcoatNormalTexture", Some(texture.key()))
        .unwrap();

    doc.dispose(clearcoat.key()).unwrap();
    assert!(doc
        .get_extension(material.key(), KHR_MATERIALS_CLEARCOAT)
        .is_none());
    // The texture survives the cascade; only the prune collects it.
    assert!(doc.get(texture).is_ok());

    doc.transform(vec![prune(PruneOptions::default())]).unwrap();
    assert!(doc.get(texture).is_err());
    assert!(doc.get(material).is_ok());
}

#[test]
fn registries_dispatch_in_stable_name_order() {
    let mut registry = ExtensionRegistry::new();
    registry.register(TextureBasisu);
    registry.register(LightsPunctual);
    registry.register(MaterialsClearcoat);
    let names: Vec<_> = registry.iter().map(|e| e.name()).collect();
    assert_eq!(
        names,
        vec![KHR_LIGHTS_PUNCTUAL, KHR_MATERIALS_CLEARCOAT, KHR_TEXTURE_BASISU]
    );
}
