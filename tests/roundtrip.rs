//! Round-trip tests over both container variants.

use gltf_forge::codec::{Glb, Reader, Writer};
use gltf_forge::element::{ElementType, ScalarArray};
use gltf_forge::io::MemoryIo;
use gltf_forge::Document;
use std::path::Path;

const TRIANGLE: [f32; 9] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];

fn triangle_document() -> Document {
    let mut doc = Document::new();
    let scene = doc.create_scene("scene");
    let node = doc.create_node("triangle");
    let mesh = doc.create_mesh("mesh");
    let prim = doc.create_primitive();
    let buffer = doc.create_buffer("");
    let position = doc.create_accessor("position");

    doc.get_mut(position)
        .unwrap()
        .set_element_type(ElementType::Vec3)
        .unwrap();
    doc.get_mut(position)
        .unwrap()
        .set_array(ScalarArray::F32(TRIANGLE.to_vec()))
        .unwrap();
    doc.set_accessor_buffer(position, Some(buffer)).unwrap();
    doc.set_primitive_attribute(prim, "POSITION", Some(position))
        .unwrap();
    doc.add_mesh_primitive(mesh, prim).unwrap();
    doc.set_node_mesh(node, Some(mesh)).unwrap();
    doc.add_scene_node(scene, node).unwrap();
    doc.set_default_scene(Some(scene)).unwrap();
    doc
}

#[test]
fn tiny_triangle_binary_round_trip() {
    let doc = triangle_document();
    let bytes = Writer::new().to_binary(&doc).unwrap();

    // 12-byte header, two chunk headers, padded JSON, 36 bytes of
    // positions (already aligned).
    let glb = Glb::from_slice(&bytes).unwrap();
    let json_padded = (glb.json.len() + 3) & !3;
    assert_eq!(bytes.len(), 12 + 8 + json_padded + 8 + 36);
    assert_eq!(glb.header.length as usize, bytes.len());
    assert_eq!(glb.bin.as_deref().map(<[u8]>::len), Some(36));

    let decoded = Reader::new().read_slice(&bytes, None).unwrap();
    let mesh = decoded.meshes()[0];
    let prim = decoded.mesh_primitives(mesh)[0];
    let position = decoded.primitive_attribute(prim, "POSITION").unwrap();
    let data = decoded.get(position).unwrap();
    assert_eq!(data.element_type(), ElementType::Vec3);
    assert_eq!(data.count(), 3);
    assert_eq!(data.array(), &ScalarArray::F32(TRIANGLE.to_vec()));
    assert_eq!(decoded.scenes().len(), 1);
    assert!(decoded.default_scene().is_some());
}

#[test]
fn encode_of_decode_is_byte_stable() {
    let doc = triangle_document();
    let first = Writer::new().to_binary(&doc).unwrap();
    let decoded = Reader::new().read_slice(&first, None).unwrap();
    let second = Writer::new().to_binary(&decoded).unwrap();
    assert_eq!(first, second);
}

#[test]
fn standard_form_embeds_data_uris() {
    let doc = triangle_document();
    let artifacts = Writer::new().to_standard(&doc).unwrap();
    assert!(artifacts.resources.is_empty());

    let json: serde_json::Value = serde_json::from_slice(&artifacts.json).unwrap();
    let uri = json["buffers"][0]["uri"].as_str().unwrap();
    assert!(uri.starts_with("data:application/octet-stream;base64,"));

    let decoded = Reader::new().read_slice(&artifacts.json, None).unwrap();
    let position = decoded.accessors()[0];
    assert_eq!(
        decoded.get(position).unwrap().array(),
        &ScalarArray::F32(TRIANGLE.to_vec())
    );
}

#[test]
fn external_buffers_write_and_resolve_through_the_platform() {
    let mut doc = triangle_document();
    let buffer = doc.buffers()[0];
    doc.get_mut(buffer).unwrap().uri = Some("geometry.bin".to_string());

    let writer = Writer::new().with_io(Box::new(MemoryIo::new()));
    let artifacts = writer.to_standard(&doc).unwrap();
    assert_eq!(artifacts.resources.len(), 1);
    let payload = &artifacts.resources["geometry.bin"];
    assert_eq!(payload.len(), 36);

    let io = MemoryIo::new();
    io.insert("assets/geometry.bin", payload.clone());
    let reader = Reader::new().with_io(Box::new(io));
    let decoded = reader
        .read_slice(&artifacts.json, Some(Path::new("assets")))
        .unwrap();
    assert_eq!(
        decoded.get(decoded.accessors()[0]).unwrap().array(),
        &ScalarArray::F32(TRIANGLE.to_vec())
    );
    assert_eq!(
        decoded.get(decoded.buffers()[0]).unwrap().uri.as_deref(),
        Some("geometry.bin")
    );
}

#[test]
fn no_buffered_data_means_no_bin_chunk() {
    let mut doc = Document::new();
    doc.create_buffer("");
    doc.create_scene("empty");
    let bytes = Writer::new().to_binary(&doc).unwrap();
    let glb = Glb::from_slice(&bytes).unwrap();
    assert!(glb.bin.is_none());

    let decoded = Reader::new().read_slice(&bytes, None).unwrap();
    assert_eq!(decoded.buffers().len(), 1);
    assert_eq!(decoded.scenes().len(), 1);
}

#[test]
fn zero_count_accessor_round_trips() {
    let mut doc = Document::new();
    let buffer = doc.create_buffer("");
    let accessor = doc.create_accessor("empty");
    doc.get_mut(accessor)
        .unwrap()
        .set_element_type(ElementType::Vec2)
        .unwrap();
    doc.get_mut(accessor)
        .unwrap()
        .set_array(ScalarArray::U16(Vec::new()))
        .unwrap();
    doc.set_accessor_buffer(accessor, Some(buffer)).unwrap();

    let bytes = Writer::new().to_binary(&doc).unwrap();
    let decoded = Reader::new().read_slice(&bytes, None).unwrap();
    let data = decoded.get(decoded.accessors()[0]).unwrap();
    assert_eq!(data.count(), 0);
    assert_eq!(data.element_type(), ElementType::Vec2);
}

#[test]
fn buffer_views_split_by_usage_category() {
    let mut doc = Document::new();
    let scene = doc.create_scene("s");
    let node = doc.create_node("n");
    let joint = doc.create_node("joint");
    let mesh = doc.create_mesh("m");
    let prim = doc.create_primitive();
    let skin = doc.create_skin("skin");
    let buffer = doc.create_buffer("");

    let position = doc.create_accessor("position");
    doc.get_mut(position)
        .unwrap()
        .set_element_type(ElementType::Vec3)
        .unwrap();
    doc.get_mut(position)
        .unwrap()
        .set_array(ScalarArray::F32(TRIANGLE.to_vec()))
        .unwrap();
    doc.set_accessor_buffer(position, Some(buffer)).unwrap();

    let indices = doc.create_accessor("indices");
    doc.get_mut(indices)
        .unwrap()
        .set_array(ScalarArray::U16(vec![0, 1, 2]))
        .unwrap();
    doc.set_accessor_buffer(indices, Some(buffer)).unwrap();

    let matrices = doc.create_accessor("ibm");
    doc.get_mut(matrices)
        .unwrap()
        .set_element_type(ElementType::Mat4)
        .unwrap();
    let mut identity = vec![0.0f32; 16];
    for i in 0..4 {
        identity[i * 5] = 1.0;
    }
    doc.get_mut(matrices)
        .unwrap()
        .set_array(ScalarArray::F32(identity))
        .unwrap();
    doc.set_accessor_buffer(matrices, Some(buffer)).unwrap();

    doc.set_primitive_attribute(prim, "POSITION", Some(position))
        .unwrap();
    doc.set_primitive_indices(prim, Some(indices)).unwrap();
    doc.add_mesh_primitive(mesh, prim).unwrap();
    doc.add_skin_joint(skin, joint).unwrap();
    doc.set_skin_inverse_bind_matrices(skin, Some(matrices))
        .unwrap();
    doc.set_node_mesh(node, Some(mesh)).unwrap();
    doc.set_node_skin(node, Some(skin)).unwrap();
    doc.add_scene_node(scene, node).unwrap();
    doc.add_node_child(node, joint).unwrap();

    let bytes = Writer::new().to_binary(&doc).unwrap();
    let glb = Glb::from_slice(&bytes).unwrap();
    let json: serde_json::Value = serde_json::from_slice(&glb.json).unwrap();

    let views = json["bufferViews"].as_array().unwrap();
    assert_eq!(views.len(), 3);
    // One view per usage category, ordered index, vertex-attribute, other.
    assert_eq!(views[0]["target"], 34963);
    assert_eq!(views[1]["target"], 34962);
    assert!(views[2].get("target").is_none());
    for view in views {
        let offset = view.get("byteOffset").and_then(|o| o.as_u64()).unwrap_or(0);
        assert_eq!(offset % 4, 0);
    }

    // POSITION carries min/max; the index accessor does not.
    let accessors = json["accessors"].as_array().unwrap();
    let position_wire = accessors
        .iter()
        .find(|a| a["name"] == "position")
        .unwrap();
    assert_eq!(position_wire["min"], serde_json::json!([0.0, 0.0, 0.0]));
    assert_eq!(position_wire["max"], serde_json::json!([1.0, 1.0, 0.0]));
    let index_wire = accessors.iter().find(|a| a["name"] == "indices").unwrap();
    assert!(index_wire.get("min").is_none());
}

#[test]
fn sparse_accessors_densify_and_compact() {
    let mut doc = Document::new();
    let buffer = doc.create_buffer("");
    let accessor = doc.create_accessor("displacement");
    doc.get_mut(accessor)
        .unwrap()
        .set_element_type(ElementType::Vec3)
        .unwrap();
    let mut values = vec![0.0f32; 300];
    values[30] = 1.5;
    values[31] = -2.0;
    doc.get_mut(accessor)
        .unwrap()
        .set_array(ScalarArray::F32(values.clone()))
        .unwrap();
    doc.get_mut(accessor).unwrap().set_sparse(true);
    doc.set_accessor_buffer(accessor, Some(buffer)).unwrap();

    let bytes = Writer::new().to_binary(&doc).unwrap();
    let glb = Glb::from_slice(&bytes).unwrap();
    let json: serde_json::Value = serde_json::from_slice(&glb.json).unwrap();
    let sparse = &json["accessors"][0]["sparse"];
    assert_eq!(sparse["count"], 1);

    let decoded = Reader::new().read_slice(&bytes, None).unwrap();
    let data = decoded.get(decoded.accessors()[0]).unwrap();
    assert!(data.sparse());
    assert_eq!(data.array(), &ScalarArray::F32(values));
}

#[test]
fn malformed_containers_are_rejected() {
    assert!(Reader::new().read_slice(b"glTF\xff\xff", None).is_err());

    let doc = triangle_document();
    let mut bytes = Writer::new().to_binary(&doc).unwrap();
    // Corrupt the declared JSON chunk length.
    bytes[12] = 0xff;
    bytes[13] = 0xff;
    assert!(Reader::new().read_slice(&bytes, None).is_err());
}
