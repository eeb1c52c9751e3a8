use crate::property::HashCache;
use crate::schema::PropertyType;
use crate::transform::Transform;

/// Options for [`dedup`].
#[derive(Clone, Debug)]
pub struct DedupOptions {
    /// Property types to deduplicate. Processed leaves-first so parents
    /// compare equal once their children are shared.
    pub property_types: Vec<PropertyType>,
}

impl Default for DedupOptions {
    fn default() -> Self {
        Self {
            property_types: vec![
                PropertyType::Accessor,
                PropertyType::Texture,
                PropertyType::Material,
                PropertyType::Mesh,
            ],
        }
    }
}

/// Collapses structurally identical properties onto one instance.
///
/// Duplicates are found by structural hash, confirmed with a full equality
/// check (names ignored), rewired onto the first instance via `swap`, and
/// disposed. Running the transform twice leaves the graph unchanged.
pub fn dedup(options: DedupOptions) -> Transform {
    Transform::new("dedup", move |doc, _ctx| {
        const ORDER: [(PropertyType, &str); 5] = [
            (PropertyType::Accessor, "accessors"),
            (PropertyType::Texture, "textures"),
            (PropertyType::Material, "materials"),
            (PropertyType::Mesh, "meshes"),
            (PropertyType::Skin, "skins"),
        ];
        let root = doc.root().key();
        let mut total = 0usize;
        for (ty, list) in ORDER {
            if !options.property_types.contains(&ty) {
                continue;
            }
            let candidates = doc.children(root, list)?;
            let mut cache = HashCache::new();
            let mut canonical: Vec<(u32, crate::graph::PropertyKey)> = Vec::new();
            for key in candidates {
                let hash = doc.to_hash(key, &["name"], Some(&mut cache))?;
                let mut replaced = false;
                for (other_hash, other) in &canonical {
                    if *other_hash != hash {
                        continue;
                    }
                    if doc.equals(key, *other, &["name"])? {
                        let other = *other;
                        for parent in doc.list_parents(key)? {
                            if parent == root {
                                continue;
                            }
                            doc.graph_mut().swap(parent, key, other)?;
                        }
                        doc.dispose(key)?;
                        total += 1;
                        replaced = true;
                        break;
                    }
                }
                if !replaced {
                    canonical.push((hash, key));
                }
            }
        }
        if total > 0 {
            doc.logger()
                .info(&format!("dedup: removed {total} duplicate properties"));
        }
        Ok(())
    })
}
