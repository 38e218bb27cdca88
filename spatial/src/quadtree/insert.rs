use super::*;
use crate::error::SpatialError;
use tracing::{trace, warn};

impl Quadtree {
    pub fn insert(&mut self, object: &ObjectSnapshot) -> SpatialResult<()> {
        if self.ids.contains(&object.id) {
            warn!(id = object.id, "object is already in the quadtree");
            return Err(SpatialError::DuplicateObject { id: object.id });
        }
        let entry = SpatialEntry::new(object, &self.world)?;
        self.ids.insert(object.id);
        self.insert_at(ROOT, self.levels, entry);
        Ok(())
    }

    /// Place `entry` in the subtree rooted at `node`, which sits at `level`
    /// (the root is at `levels`, smallest cells at 1).
    pub(crate) fn insert_at(&mut self, mut node: u32, mut level: u32, mut entry: SpatialEntry) {
        loop {
            let current = self.node(node);
            if level > 1 {
                if let Some(children) = current.children() {
                    match current.cell.pick_sub_quadrant(&entry.bounds) {
                        Some(quadrant) => {
                            node = children[quadrant];
                            level -= 1;
                            continue;
                        }
                        None => {
                            entry.overlaps_quads = true;
                            self.node_mut(node).items.push(entry);
                            return;
                        }
                    }
                }
            }

            entry.overlaps_quads = false;
            let capacity = self.config.node_capacity.max(1);
            let leaf = self.node_mut(node);
            leaf.items.push(entry);
            if level > 1 && leaf.items.len() >= capacity {
                self.split(node, level);
            }
            return;
        }
    }

    fn split(&mut self, node: u32, level: u32) {
        self.alloc_children(node);
        let items = std::mem::take(&mut self.node_mut(node).items);
        trace!(node, level, items = items.len(), "splitting quadtree node");
        for entry in items {
            self.insert_at(node, level, entry);
        }
    }

    /// Returns `false` if `id` was not tracked. Branches left without any
    /// entries collapse on the way back up.
    pub fn remove(&mut self, id: ObjectId) -> bool {
        if !self.ids.remove(&id) {
            return false;
        }
        let removed = self.remove_at(ROOT, id);
        assert!(removed, "object {id} is tracked but missing from the quadtree");
        true
    }

    fn remove_at(&mut self, node: u32, id: ObjectId) -> bool {
        let current = self.node_mut(node);
        let found = match current.items.iter().position(|entry| entry.id == id) {
            Some(index) => {
                current.items.swap_remove(index);
                true
            }
            None => {
                let Some(children) = current.children() else {
                    return false;
                };
                children.into_iter().any(|child| self.remove_at(child, id))
            }
        };
        if found {
            if let Some(children) = self.node(node).children() {
                self.collapse_if_empty(node, children);
            }
        }
        found
    }

    fn collapse_if_empty(&mut self, node: u32, children: [u32; 4]) {
        let empty = children.iter().all(|&child| {
            let child = self.node(child);
            child.is_leaf() && child.items.is_empty()
        });
        if empty {
            self.free_children(node);
        }
    }
}
