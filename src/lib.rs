#![warn(missing_docs)]

//! Property-graph editor and codec for glTF 2.0 assets.
//!
//! `gltf-forge` ingests an asset (JSON manifest plus binary buffers and
//! images), exposes it as a typed, mutable, multi-parent property graph,
//! and serializes the result back to the same wire format. Applications
//! edit through [`Document`]; transforms compose over it; the codec in
//! [`codec`] handles both the `.gltf` and single-file `.glb` containers.
//!
//! ## Example
//!
//! ```no_run
//! use gltf_forge::element::{ElementType, ScalarArray};
//! use gltf_forge::{codec, Document};
//!
//! # fn run() -> gltf_forge::Result<()> {
//! let mut doc = Document::new();
//! let scene = doc.create_scene("scene");
//! let node = doc.create_node("triangle");
//! let mesh = doc.create_mesh("mesh");
//! let prim = doc.create_primitive();
//! let buffer = doc.create_buffer("");
//! let position = doc.create_accessor("position");
//!
//! doc.get_mut(position)?.set_element_type(ElementType::Vec3)?;
//! doc.get_mut(position)?
//!     .set_array(ScalarArray::F32(vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]))?;
//! doc.set_accessor_buffer(position, Some(buffer))?;
//! doc.set_primitive_attribute(prim, "POSITION", Some(position))?;
//! doc.add_mesh_primitive(mesh, prim)?;
//! doc.set_node_mesh(node, Some(mesh))?;
//! doc.add_scene_node(scene, node)?;
//!
//! let glb = codec::Writer::new().to_binary(&doc)?;
//! # let _ = glb;
//! # Ok(())
//! # }
//! ```

/// The binary codec: readers and writers for both container variants.
pub mod codec;

/// The document facade.
mod document;

/// Typed scalar storage and normalized conversions.
pub mod element;

/// The error taxonomy.
mod error;

/// Runtime extension registration.
pub mod extension;

/// Built-in extensions.
pub mod extensions;

/// The low-level typed multigraph.
pub mod graph;

/// Cross-document copy, merge, and bulk-rewrite helpers.
pub mod graph_util;

/// MIME-dispatched image header probes.
pub mod image_probe;

/// Host platform seams: I/O and diagnostics.
pub mod io;

/// Vector and matrix helpers.
pub mod math;

/// Concrete property payloads.
pub mod properties;

/// The property payload union and generic capability set.
pub mod property;

/// The edge-field schema.
pub mod schema;

/// The named transform pipeline.
mod transform;

/// Reference transforms.
pub mod transforms;

#[doc(inline)]
pub use document::Document;

#[doc(inline)]
pub use error::{Error, Result};

#[doc(inline)]
pub use extension::{Extension, ExtensionPropertyData, ExtensionRegistry};

#[doc(inline)]
pub use graph::{Edge, EdgeAttributes, Graph, GraphEvent};

#[doc(inline)]
pub use properties::*;

#[doc(inline)]
pub use property::{ExtensionPropertyRef, PropertyData, Ref};

#[doc(inline)]
pub use schema::PropertyType;

#[doc(inline)]
pub use transform::{Transform, TransformContext};
