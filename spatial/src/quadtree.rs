use crate::backend::Spatial;
use crate::collision::HitEvent;
use crate::config::Config;
use crate::entry::SpatialEntry;
use crate::error::{validate_world, SpatialError, SpatialResult};
use crate::object::{ObjectId, ObjectSnapshot, SpatialWorld};
use crate::search::SearchOptions;
use common::shapes::Aabb;
use fxhash::FxHashSet;
use smallvec::{smallvec, SmallVec};
use tracing::info;

mod collide;
mod insert;
mod query;
mod update;

pub(crate) const ROOT: u32 = 0;

// Child order inside a block of four.
pub(crate) const NW: usize = 0;
pub(crate) const NE: usize = 1;
pub(crate) const SE: usize = 2;
pub(crate) const SW: usize = 3;

// Set when a cell touches the world's max-x / max-y edge. Clamped entries
// may end exactly on that edge, so containment there is inclusive.
pub(crate) const FLAG_RIGHT: u8 = 0b01;
pub(crate) const FLAG_BOTTOM: u8 = 0b10;

pub(crate) type NodeStack = SmallVec<[(u32, u32); 64]>;

/// Rectangle of a node plus its world-edge flags.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Cell {
    pub(crate) bounds: Aabb,
    pub(crate) position_flags: u8,
}

impl Cell {
    fn mid(&self) -> (f32, f32) {
        (
            (self.bounds.min_x + self.bounds.max_x) * 0.5,
            (self.bounds.min_y + self.bounds.max_y) * 0.5,
        )
    }

    /// Half-open containment, matching the quadrant rule of
    /// [`Cell::pick_sub_quadrant`].
    pub(crate) fn fits(&self, b: &Aabb) -> bool {
        b.min_x >= self.bounds.min_x
            && b.min_y >= self.bounds.min_y
            && (b.max_x < self.bounds.max_x || (self.position_flags & FLAG_RIGHT) != 0)
            && (b.max_y < self.bounds.max_y || (self.position_flags & FLAG_BOTTOM) != 0)
    }

    /// Quadrant that fully holds `b`, or `None` if it straddles a mid line.
    pub(crate) fn pick_sub_quadrant(&self, b: &Aabb) -> Option<usize> {
        let (mid_x, mid_y) = self.mid();
        let left = if b.max_x < mid_x {
            true
        } else if b.min_x >= mid_x {
            false
        } else {
            return None;
        };
        let top = if b.max_y < mid_y {
            true
        } else if b.min_y >= mid_y {
            false
        } else {
            return None;
        };
        Some(match (left, top) {
            (true, true) => NW,
            (false, true) => NE,
            (false, false) => SE,
            (true, false) => SW,
        })
    }

    fn child(&self, quadrant: usize) -> Cell {
        let (mid_x, mid_y) = self.mid();
        let b = &self.bounds;
        let (bounds, flags) = match quadrant {
            NW => (Aabb::new(b.min_x, b.min_y, mid_x, mid_y), 0),
            NE => (
                Aabb::new(mid_x, b.min_y, b.max_x, mid_y),
                self.position_flags & FLAG_RIGHT,
            ),
            SE => (
                Aabb::new(mid_x, mid_y, b.max_x, b.max_y),
                self.position_flags & (FLAG_RIGHT | FLAG_BOTTOM),
            ),
            _ => (
                Aabb::new(b.min_x, mid_y, mid_x, b.max_y),
                self.position_flags & FLAG_BOTTOM,
            ),
        };
        Cell {
            bounds,
            position_flags: flags,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct QuadNode {
    pub(crate) cell: Cell,
    pub(crate) items: Vec<SpatialEntry>,
    /// First of four consecutive children in the arena; 0 for a leaf.
    first_child: u32,
}

impl QuadNode {
    fn new(cell: Cell) -> Self {
        Self {
            cell,
            items: Vec::new(),
            first_child: 0,
        }
    }

    pub(crate) fn is_leaf(&self) -> bool {
        self.first_child == 0
    }

    pub(crate) fn children(&self) -> Option<[u32; 4]> {
        if self.is_leaf() {
            return None;
        }
        let first = self.first_child;
        Some([first, first + 1, first + 2, first + 3])
    }
}

/// Read-only view of one node, handed out by [`Quadtree::visit_nodes`].
#[derive(Debug, Clone, Copy)]
pub struct NodeView<'a> {
    pub bounds: Aabb,
    pub depth: u32,
    pub is_leaf: bool,
    pub entries: &'a [SpatialEntry],
}

/// Region quadtree over a square world centered on the origin. Entries that
/// straddle a split line stay in the smallest node that fully holds them.
///
/// Nodes live in an arena; children are allocated in blocks of four and
/// recycled through a free list when a branch collapses.
pub struct Quadtree {
    nodes: Vec<QuadNode>,
    free_blocks: Vec<u32>,
    ids: FxHashSet<ObjectId>,
    levels: u32,
    full_size: f32,
    world: Aabb,
    tick: u32,
    config: Config,
}

impl Quadtree {
    pub fn new(world_half_extent: f32, smallest_cell: f32) -> SpatialResult<Self> {
        let config = Config {
            smallest_cell,
            ..Config::default()
        };
        Self::new_with_config(world_half_extent, config)
    }

    pub fn new_with_config(world_half_extent: f32, config: Config) -> SpatialResult<Self> {
        validate_world(world_half_extent, config.smallest_cell)?;

        // Double the smallest cell until it covers the whole world.
        let universe_size = world_half_extent * 2.0;
        let mut levels = 1;
        let mut full_size = config.smallest_cell;
        while full_size < universe_size {
            levels += 1;
            full_size *= 2.0;
        }
        if !full_size.is_finite() {
            return Err(SpatialError::InvalidWorldExtent {
                half_extent: world_half_extent,
            });
        }

        let world = Aabb::centered(full_size * 0.5);
        info!(levels, full_size, "created quadtree");
        Ok(Quadtree {
            nodes: vec![Self::root_node(world)],
            free_blocks: Vec::new(),
            ids: FxHashSet::default(),
            levels,
            full_size,
            world,
            tick: 0,
            config,
        })
    }

    fn root_node(world: Aabb) -> QuadNode {
        QuadNode::new(Cell {
            bounds: world,
            position_flags: FLAG_RIGHT | FLAG_BOTTOM,
        })
    }

    pub fn levels(&self) -> u32 {
        self.levels
    }

    pub fn full_size(&self) -> f32 {
        self.full_size
    }

    pub fn world_bounds(&self) -> Aabb {
        self.world
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn count(&self) -> usize {
        self.ids.len()
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.ids.contains(&id)
    }

    /// Nodes currently reachable from the root.
    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free_blocks.len() * 4
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.nodes.push(Self::root_node(self.world));
        self.free_blocks.clear();
        self.ids.clear();
    }

    #[inline(always)]
    pub(crate) fn node(&self, index: u32) -> &QuadNode {
        &self.nodes[index as usize]
    }

    #[inline(always)]
    pub(crate) fn node_mut(&mut self, index: u32) -> &mut QuadNode {
        &mut self.nodes[index as usize]
    }

    /// Give `node` four fresh children, reusing a freed block when possible.
    pub(crate) fn alloc_children(&mut self, node: u32) {
        debug_assert!(self.node(node).is_leaf());
        let cell = self.node(node).cell;
        let first = match self.free_blocks.pop() {
            Some(first) => {
                for quadrant in 0..4 {
                    *self.node_mut(first + quadrant as u32) = QuadNode::new(cell.child(quadrant));
                }
                first
            }
            None => {
                let first = self.nodes.len() as u32;
                for quadrant in 0..4 {
                    self.nodes.push(QuadNode::new(cell.child(quadrant)));
                }
                first
            }
        };
        self.node_mut(node).first_child = first;
    }

    /// Turn `node` back into a leaf. Its children must be empty leaves.
    pub(crate) fn free_children(&mut self, node: u32) {
        let children = self
            .node(node)
            .children()
            .expect("free_children called on a leaf");
        for child in children {
            let child = self.node(child);
            assert!(
                child.is_leaf() && child.items.is_empty(),
                "collapsing a quadtree branch whose children are not empty leaves"
            );
        }
        self.free_blocks.push(children[0]);
        self.node_mut(node).first_child = 0;
    }

    /// Collapse every branch whose descendants are all empty. Returns the
    /// number of entries in the subtree.
    pub(crate) fn prune_empty(&mut self, node: u32) -> usize {
        let Some(children) = self.node(node).children() else {
            return self.node(node).items.len();
        };
        let mut sub_items = 0;
        for child in children {
            sub_items += self.prune_empty(child);
        }
        if sub_items == 0 {
            self.free_children(node);
        }
        self.node(node).items.len() + sub_items
    }

    /// Calls `f` for every node whose bounds overlap `visible`, parents first.
    /// Read-only; the borrow checker keeps it out of mutation passes.
    pub fn visit_nodes<F>(&self, visible: &Aabb, mut f: F)
    where
        F: FnMut(NodeView<'_>),
    {
        let mut stack: NodeStack = smallvec![(ROOT, 0)];
        while let Some((index, depth)) = stack.pop() {
            let node = self.node(index);
            if !node.cell.bounds.overlaps(visible) {
                continue;
            }
            f(NodeView {
                bounds: node.cell.bounds,
                depth,
                is_leaf: node.is_leaf(),
                entries: &node.items,
            });
            if let Some(children) = node.children() {
                for child in children.into_iter().rev() {
                    stack.push((child, depth + 1));
                }
            }
        }
    }

    // Retrieve all node bounding boxes from the Quadtree
    pub fn all_node_bounds(&self, bounds: &mut Vec<Aabb>) {
        self.visit_nodes(&self.world, |node| bounds.push(node.bounds));
    }

    // Retrieve all entries from the Quadtree
    pub fn all_entries(&self, entries: &mut Vec<SpatialEntry>) {
        self.visit_nodes(&self.world, |node| entries.extend_from_slice(node.entries));
    }
}

impl<W: SpatialWorld> Spatial<W> for Quadtree {
    fn name(&self) -> &'static str {
        "QuadTree"
    }

    fn count(&self) -> usize {
        Quadtree::count(self)
    }

    fn full_size(&self) -> f32 {
        self.full_size
    }

    fn world_bounds(&self) -> Aabb {
        self.world
    }

    fn clear(&mut self) {
        Quadtree::clear(self)
    }

    fn insert(&mut self, object: &ObjectSnapshot) -> SpatialResult<()> {
        Quadtree::insert(self, object)
    }

    fn remove(&mut self, id: ObjectId) -> bool {
        Quadtree::remove(self, id)
    }

    fn update_all(&mut self, world: &W) {
        Quadtree::update_all(self, world)
    }

    fn collide_all(
        &mut self,
        world: &W,
        time_step: f32,
        on_hit: &mut dyn FnMut(&HitEvent<W::Part>),
    ) -> usize {
        Quadtree::collide_all(self, world, time_step, |event| on_hit(event))
    }

    fn find_nearby(&self, options: &SearchOptions<'_>) -> SpatialResult<Vec<ObjectId>> {
        Quadtree::find_nearby(self, options)
    }
}
