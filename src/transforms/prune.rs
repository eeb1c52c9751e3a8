use crate::schema::PropertyType;
use crate::transform::Transform;
use std::collections::HashSet;

/// Options for [`prune`].
#[derive(Clone, Debug)]
pub struct PruneOptions {
    /// Root-listed property types eligible for removal.
    ///
    /// Scenes anchor reachability and are never pruned. Animations are
    /// excluded by default: nothing in a scene references them, so listing
    /// them here removes every animation.
    pub property_types: Vec<PropertyType>,
}

impl Default for PruneOptions {
    fn default() -> Self {
        Self {
            property_types: vec![
                PropertyType::Node,
                PropertyType::Mesh,
                PropertyType::Material,
                PropertyType::Texture,
                PropertyType::Accessor,
                PropertyType::Buffer,
                PropertyType::Skin,
                PropertyType::Camera,
            ],
        }
    }
}

const ROOT_LISTS: [(PropertyType, &str); 9] = [
    (PropertyType::Node, "nodes"),
    (PropertyType::Mesh, "meshes"),
    (PropertyType::Material, "materials"),
    (PropertyType::Texture, "textures"),
    (PropertyType::Accessor, "accessors"),
    (PropertyType::Buffer, "buffers"),
    (PropertyType::Skin, "skins"),
    (PropertyType::Camera, "cameras"),
    (PropertyType::Animation, "animations"),
];

/// Disposes root-listed properties that nothing else references.
///
/// Reachability starts from the root-list entries of types *not* selected
/// for pruning (scenes, and by default animations) and follows every child
/// edge. Selected-type entries outside that closure are disposed, which
/// also covers chains: a texture held only by a pruned material goes with
/// it.
pub fn prune(options: PruneOptions) -> Transform {
    Transform::new("prune", move |doc, _ctx| {
        let root = doc.root().key();

        let mut live: Vec<crate::graph::PropertyKey> = Vec::new();
        for scene in doc.scenes() {
            live.push(scene.key());
        }
        for (ty, list) in ROOT_LISTS {
            if !options.property_types.contains(&ty) {
                for key in doc.children(root, list)? {
                    live.push(key);
                }
            }
        }

        let mut reachable: HashSet<crate::graph::PropertyKey> = live.iter().copied().collect();
        let mut stack = live;
        while let Some(current) = stack.pop() {
            for edge_key in doc.graph().child_edges(current)? {
                let child = doc.graph().edge(edge_key)?.child;
                if reachable.insert(child) {
                    stack.push(child);
                }
            }
        }

        let mut disposed = 0usize;
        for (ty, list) in ROOT_LISTS {
            if !options.property_types.contains(&ty) {
                continue;
            }
            for key in doc.children(root, list)? {
                if !reachable.contains(&key) {
                    doc.dispose(key)?;
                    disposed += 1;
                }
            }
        }
        if disposed > 0 {
            doc.logger()
                .info(&format!("prune: removed {disposed} unreferenced properties"));
        }
        Ok(())
    })
}
