use super::*;
use tracing::debug;

/// Entry lifted out of its node during an update, with the subtree it has
/// to be re-inserted into.
struct Relocation {
    node: u32,
    level: u32,
    entry: SpatialEntry,
}

impl Quadtree {
    /// Refresh every dynamic entry from `world`; static geometry is skipped.
    /// Inactive or missing objects are dropped. Entries that left their node
    /// go back in from the root and straddlers that now fit a child are
    /// pushed down, both after the sweep so no entry is visited twice.
    pub fn update_all<W: SpatialWorld>(&mut self, world: &W) {
        let world_bounds = self.world;
        let levels = self.levels;
        let mut relocations = Vec::new();
        let mut removed = Vec::new();

        let mut stack: NodeStack = smallvec![(ROOT, levels)];
        while let Some((index, level)) = stack.pop() {
            let node = self.node_mut(index);
            let cell = node.cell;
            let children = node.children();
            if let Some(children) = children {
                for child in children {
                    stack.push((child, level - 1));
                }
            }

            let mut i = 0;
            while i < node.items.len() {
                let entry = &mut node.items[i];
                if entry.is_static() {
                    i += 1;
                    continue;
                }

                let object = match world.object(entry.id) {
                    Some(object) if object.active => object,
                    _ => {
                        removed.push(entry.id);
                        node.items.swap_remove(i);
                        continue;
                    }
                };
                entry.refresh(&object, &world_bounds);

                if !cell.fits(&entry.bounds) {
                    relocations.push(Relocation {
                        node: ROOT,
                        level: levels,
                        entry: node.items.swap_remove(i),
                    });
                    continue;
                }

                if entry.overlaps_quads {
                    match children {
                        None => entry.overlaps_quads = false,
                        Some(children) => {
                            if let Some(quadrant) = cell.pick_sub_quadrant(&entry.bounds) {
                                relocations.push(Relocation {
                                    node: children[quadrant],
                                    level: level - 1,
                                    entry: node.items.swap_remove(i),
                                });
                                continue;
                            }
                        }
                    }
                }
                i += 1;
            }
        }

        for id in &removed {
            self.ids.remove(id);
        }
        let relocated = relocations.len();
        for relocation in relocations {
            self.insert_at(relocation.node, relocation.level, relocation.entry);
        }
        self.prune_empty(ROOT);

        debug!(
            removed = removed.len(),
            relocated,
            count = self.ids.len(),
            nodes = self.node_count(),
            "updated quadtree"
        );
    }
}
