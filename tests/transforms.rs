//! Reference transform behavior: dedup, prune, swap, merge.

use gltf_forge::element::ScalarArray;
use gltf_forge::graph_util;
use gltf_forge::transforms::{dedup, prune, DedupOptions, PruneOptions};
use gltf_forge::{Document, PropertyType};

fn scalar_u16(doc: &mut Document, name: &str, values: Vec<u16>) -> gltf_forge::AccessorRef {
    let accessor = doc.create_accessor(name);
    doc.get_mut(accessor)
        .unwrap()
        .set_array(ScalarArray::U16(values))
        .unwrap();
    accessor
}

#[test]
fn dedup_collapses_identical_accessors_and_is_idempotent() {
    let mut doc = Document::new();
    let a = scalar_u16(&mut doc, "a", vec![0, 1, 2]);
    let b = scalar_u16(&mut doc, "b", vec![0, 1, 2]);
    let p1 = doc.create_primitive();
    let p2 = doc.create_primitive();
    doc.set_primitive_indices(p1, Some(a)).unwrap();
    doc.set_primitive_indices(p2, Some(b)).unwrap();

    doc.transform(vec![dedup(DedupOptions {
        property_types: vec![PropertyType::Accessor],
    })])
    .unwrap();

    assert_eq!(doc.accessors().len(), 1);
    let survivor = doc.accessors()[0];
    assert_eq!(doc.primitive_indices(p1), Some(survivor));
    assert_eq!(doc.primitive_indices(p2), Some(survivor));

    let edges_before = doc.graph().list_edges().len();
    doc.transform(vec![dedup(DedupOptions {
        property_types: vec![PropertyType::Accessor],
    })])
    .unwrap();
    assert_eq!(doc.accessors().len(), 1);
    assert_eq!(doc.graph().list_edges().len(), edges_before);
}

#[test]
fn dedup_keeps_distinct_accessors_apart() {
    let mut doc = Document::new();
    let a = scalar_u16(&mut doc, "a", vec![0, 1, 2]);
    let b = scalar_u16(&mut doc, "b", vec![0, 1, 3]);
    let p = doc.create_primitive();
    doc.set_primitive_indices(p, Some(a)).unwrap();
    doc.set_primitive_attribute(p, "POSITION", Some(b)).ok();

    doc.transform(vec![dedup(DedupOptions::default())]).unwrap();
    assert_eq!(doc.accessors().len(), 2);
}

#[test]
fn swap_rewires_one_parent_and_preserves_the_rest() {
    let mut doc = Document::new();
    let a = scalar_u16(&mut doc, "a", vec![1, 2, 3]);
    let b = scalar_u16(&mut doc, "b", vec![1, 2, 3]);
    let p1 = doc.create_primitive();
    let p2 = doc.create_primitive();
    let target = doc.create_primitive_target("morph");
    doc.set_primitive_attribute(p1, "POSITION", Some(a)).unwrap();
    doc.add_primitive_target(p2, target).unwrap();
    doc.set_target_attribute(target, "POSITION", Some(a)).unwrap();

    let rewired = doc.graph_mut().swap(p1.key(), a.key(), b.key()).unwrap();
    assert_eq!(rewired, 1);

    assert_eq!(doc.primitive_attribute(p1, "POSITION"), Some(b));
    assert_eq!(doc.target_attribute(target, "POSITION"), Some(a));

    let parents = doc.list_parents(a.key()).unwrap();
    assert!(!parents.contains(&p1.key()));
    assert!(parents.contains(&target.key()));
}

#[test]
fn swap_preserves_edge_attributes() {
    let mut doc = Document::new();
    let material = doc.create_material("m");
    let t1 = doc.create_texture("t1");
    let t2 = doc.create_texture("t2");
    doc.set_material_texture(material, gltf_forge::TextureSlot::BaseColor, Some(t1))
        .unwrap();
    doc.set_material_texture_info(
        material,
        gltf_forge::TextureSlot::BaseColor,
        gltf_forge::TextureInfo {
            tex_coord: 3,
            ..Default::default()
        },
    )
    .unwrap();

    doc.graph_mut()
        .swap(material.key(), t1.key(), t2.key())
        .unwrap();
    assert_eq!(
        doc.material_texture(material, gltf_forge::TextureSlot::BaseColor),
        Some(t2)
    );
    assert_eq!(
        doc.material_texture_info(material, gltf_forge::TextureSlot::BaseColor)
            .unwrap()
            .tex_coord,
        3
    );
}

#[test]
fn prune_disposes_what_no_scene_reaches() {
    let mut doc = Document::new();
    let scene = doc.create_scene("s");
    let node = doc.create_node("n");
    let mesh = doc.create_mesh("m");
    let prim = doc.create_primitive();
    let used = scalar_u16(&mut doc, "used", vec![0, 1, 2]);
    let orphan = scalar_u16(&mut doc, "orphan", vec![7, 7]);
    let unused_texture = doc.create_texture("unused");

    doc.set_primitive_indices(prim, Some(used)).unwrap();
    doc.add_mesh_primitive(mesh, prim).unwrap();
    doc.set_node_mesh(node, Some(mesh)).unwrap();
    doc.add_scene_node(scene, node).unwrap();

    doc.transform(vec![prune(PruneOptions::default())]).unwrap();

    assert_eq!(doc.accessors(), vec![used]);
    assert!(doc.textures().is_empty());
    assert!(doc.get(orphan).is_err());
    assert!(doc.get(unused_texture).is_err());
    assert_eq!(doc.meshes().len(), 1);
}

#[test]
fn merge_appends_and_clone_preserves_structure() {
    let mut first = Document::new();
    let scene = first.create_scene("left");
    let node = first.create_node("a");
    first.add_scene_node(scene, node).unwrap();

    let mut second = Document::new();
    let scene2 = second.create_scene("right");
    let node2 = second.create_node("b");
    second.add_scene_node(scene2, node2).unwrap();

    let map = first.merge(&second).unwrap();
    assert_eq!(first.scenes().len(), 2);
    assert_eq!(first.nodes().len(), 2);
    let merged_scene = scene2.mapped(&map).unwrap();
    assert_eq!(first.scene_nodes(merged_scene).len(), 1);

    let copy = first.clone_document();
    assert_eq!(copy.scenes().len(), 2);
    assert!(graph_util::cross_equals(
        first.graph(),
        first.root().key(),
        copy.graph(),
        copy.root().key(),
    )
    .unwrap());
}

#[test]
fn merge_resolver_deduplicates_across_documents() {
    let mut target = Document::new();
    let existing = scalar_u16(&mut target, "shared", vec![5, 6]);

    let mut source = Document::new();
    let incoming = scalar_u16(&mut source, "shared", vec![5, 6]);
    let prim = source.create_primitive();
    source.set_primitive_indices(prim, Some(incoming)).unwrap();

    let mut resolve = |key: gltf_forge::graph::PropertyKey| {
        (key == incoming.key()).then_some(existing.key())
    };
    let map = graph_util::merge_documents(&mut target, &source, Some(&mut resolve)).unwrap();

    // No second accessor was created; the merged primitive shares the
    // existing one.
    assert_eq!(target.accessors(), vec![existing]);
    let merged_prim = prim.mapped(&map).unwrap();
    assert_eq!(target.primitive_indices(merged_prim), Some(existing));
}

#[test]
fn shallow_clone_and_deep_dispose_helpers() {
    let mut doc = Document::new();
    let buffer = doc.create_buffer("");
    let accessor = scalar_u16(&mut doc, "positions", vec![0, 1, 2]);
    doc.set_accessor_buffer(accessor, Some(buffer)).unwrap();

    let copy = graph_util::shallow_clone_accessor(&mut doc, accessor).unwrap();
    assert_ne!(copy, accessor);
    assert_eq!(doc.accessor_buffer(copy), Some(buffer));
    assert!(doc.equals(copy.key(), accessor.key(), &[]).unwrap());

    let shared = scalar_u16(&mut doc, "shared", vec![9]);
    let p1 = doc.create_primitive();
    let p2 = doc.create_primitive();
    doc.set_primitive_indices(p1, Some(shared)).unwrap();
    doc.set_primitive_indices(p2, Some(shared)).unwrap();
    doc.set_primitive_attribute(p1, "POSITION", Some(copy)).ok();

    graph_util::deep_dispose_primitive(&mut doc, p1).unwrap();
    assert!(doc.get(p1).is_err());
    // Shared children survive, exclusively owned ones go.
    assert!(doc.get(shared).is_ok());
    assert!(doc.get(copy).is_err());
}
