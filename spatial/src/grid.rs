use crate::backend::Spatial;
use crate::collision::{beam_event, next_tick, projectile_event, CollisionPass, HitEvent, Strike};
use crate::config::Config;
use crate::entry::SpatialEntry;
use crate::error::{validate_world, SpatialError, SpatialResult};
use crate::object::{ObjectId, ObjectKind, ObjectSnapshot, SpatialWorld};
use crate::search::SearchOptions;
use common::shapes::Aabb;
use fxhash::FxHashMap;
use smallvec::SmallVec;
use tracing::{debug, info, trace, warn};

/// Upper bound on cells along one axis; finer grids are rejected at setup.
/// Every cell list is allocated up front.
pub const MAX_CELLS_PER_SIDE: usize = 512;

type CellList = SmallVec<[ObjectId; 8]>;

/// Fixed uniform grid over a square world centered on the origin. Each cell
/// lists the ids whose box overlaps it, so large objects sit in many cells.
pub struct UniformGrid {
    entries: Vec<SpatialEntry>,
    slots: FxHashMap<ObjectId, usize>,
    cells: Vec<CellList>,
    cells_per_side: usize,
    cell_size: f32,
    full_size: f32,
    world: Aabb,
    tick: u32,
    config: Config,
}

impl UniformGrid {
    pub fn new(world_half_extent: f32, cell_size: f32) -> SpatialResult<Self> {
        let config = Config {
            grid_cell_size: cell_size,
            ..Config::default()
        };
        Self::new_with_config(world_half_extent, config)
    }

    pub fn new_with_config(world_half_extent: f32, config: Config) -> SpatialResult<Self> {
        let cell_size = config.grid_cell_size;
        validate_world(world_half_extent, cell_size)?;

        let cells = ((world_half_extent * 2.0) / cell_size).ceil();
        if cells > MAX_CELLS_PER_SIDE as f32 {
            return Err(SpatialError::InvalidCellSize { cell_size });
        }
        let cells_per_side = (cells as usize).max(1);
        let full_size = cells_per_side as f32 * cell_size;
        if !full_size.is_finite() {
            return Err(SpatialError::InvalidWorldExtent {
                half_extent: world_half_extent,
            });
        }

        info!(cells_per_side, cell_size, full_size, "created uniform grid");
        Ok(UniformGrid {
            entries: Vec::new(),
            slots: FxHashMap::default(),
            cells: vec![CellList::new(); cells_per_side * cells_per_side],
            cells_per_side,
            cell_size,
            full_size,
            world: Aabb::centered(full_size * 0.5),
            tick: 0,
            config,
        })
    }

    pub fn cells_per_side(&self) -> usize {
        self.cells_per_side
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn full_size(&self) -> f32 {
        self.full_size
    }

    pub fn world_bounds(&self) -> Aabb {
        self.world
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.slots.contains_key(&id)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.slots.clear();
        for cell in &mut self.cells {
            cell.clear();
        }
    }

    fn cell_coord(&self, value: f32, min: f32) -> usize {
        let coord = ((value - min) / self.cell_size).floor();
        if coord <= 0.0 {
            0
        } else {
            (coord as usize).min(self.cells_per_side - 1)
        }
    }

    /// Inclusive cell index ranges `(x0, y0, x1, y1)` covered by `bounds`.
    fn cell_range(&self, bounds: &Aabb) -> (usize, usize, usize, usize) {
        (
            self.cell_coord(bounds.min_x, self.world.min_x),
            self.cell_coord(bounds.min_y, self.world.min_y),
            self.cell_coord(bounds.max_x, self.world.min_x),
            self.cell_coord(bounds.max_y, self.world.min_y),
        )
    }

    fn link(&mut self, id: ObjectId, bounds: &Aabb) {
        let (x0, y0, x1, y1) = self.cell_range(bounds);
        for y in y0..=y1 {
            for x in x0..=x1 {
                self.cells[y * self.cells_per_side + x].push(id);
            }
        }
    }

    fn unlink(&mut self, id: ObjectId, bounds: &Aabb) {
        let (x0, y0, x1, y1) = self.cell_range(bounds);
        for y in y0..=y1 {
            for x in x0..=x1 {
                self.cells[y * self.cells_per_side + x].retain(|other| *other != id);
            }
        }
    }

    fn rebuild_cells(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
        for index in 0..self.entries.len() {
            let entry = self.entries[index];
            self.link(entry.id, &entry.bounds);
        }
    }

    /// Slots of every entry linked to a cell overlapped by `bounds`, sorted
    /// and without duplicates.
    fn candidates(&self, bounds: &Aabb, out: &mut Vec<usize>) {
        out.clear();
        let (x0, y0, x1, y1) = self.cell_range(bounds);
        for y in y0..=y1 {
            for x in x0..=x1 {
                for id in &self.cells[y * self.cells_per_side + x] {
                    let slot = self
                        .slots
                        .get(id)
                        .expect("grid cell lists an object without a slot");
                    out.push(*slot);
                }
            }
        }
        out.sort_unstable();
        out.dedup();
    }

    pub fn insert(&mut self, object: &ObjectSnapshot) -> SpatialResult<()> {
        if self.slots.contains_key(&object.id) {
            warn!(id = object.id, "object is already in the grid");
            return Err(SpatialError::DuplicateObject { id: object.id });
        }
        let entry = SpatialEntry::new(object, &self.world)?;
        self.slots.insert(entry.id, self.entries.len());
        self.entries.push(entry);
        self.link(entry.id, &entry.bounds);
        Ok(())
    }

    pub fn remove(&mut self, id: ObjectId) -> bool {
        let Some(slot) = self.slots.get(&id).copied() else {
            return false;
        };
        let bounds = self.entries[slot].bounds;
        self.unlink(id, &bounds);
        self.drop_slot(slot);
        true
    }

    // Swap-remove the entry at `slot` and repoint the entry moved into it.
    fn drop_slot(&mut self, slot: usize) {
        let removed = self.entries.swap_remove(slot);
        self.slots.remove(&removed.id);
        if let Some(moved) = self.entries.get(slot) {
            self.slots.insert(moved.id, slot);
        }
    }

    pub fn update_all<W: SpatialWorld>(&mut self, world: &W) {
        let world_bounds = self.world;
        let mut removed = 0;
        let mut slot = 0;
        while slot < self.entries.len() {
            let entry = &mut self.entries[slot];
            if entry.is_static() {
                slot += 1;
                continue;
            }
            match world.object(entry.id) {
                Some(object) if object.active => {
                    entry.refresh(&object, &world_bounds);
                    slot += 1;
                }
                _ => {
                    self.drop_slot(slot);
                    removed += 1;
                }
            }
        }
        self.rebuild_cells();
        debug!(removed, count = self.entries.len(), "updated uniform grid");
    }

    pub fn collide_all<W, F>(&mut self, world: &W, time_step: f32, mut on_hit: F) -> usize
    where
        W: SpatialWorld,
        F: FnMut(&HitEvent<W::Part>),
    {
        self.tick = next_tick(self.tick);
        let pass = CollisionPass::new(world, self.tick, time_step, &self.config);
        let mut scratch = Vec::new();
        let mut collisions = 0;

        for slot in 0..self.entries.len() {
            let entry = self.entries[slot];
            if !pass.is_candidate_instigator(&entry) {
                continue;
            }
            self.candidates(&entry.bounds, &mut scratch);
            let event = if entry.is(ObjectKind::BEAM) {
                self.beam_target(&entry, &scratch, &pass).map(|(victim, strike)| {
                    let victim = self.stamp(victim, pass.tick);
                    beam_event(&entry, &victim, strike)
                })
            } else if entry.is(ObjectKind::PROJECTILE) {
                self.projectile_target(&entry, &scratch, &pass)
                    .map(|(victim, strike)| {
                        let victim = self.stamp(victim, pass.tick);
                        projectile_event(&entry, &victim, strike)
                    })
            } else if entry.is(ObjectKind::SHIP) || entry.is_static() {
                self.projectile_for_body(&entry, &scratch, &pass)
                    .map(|(projectile, strike)| {
                        let projectile = self.stamp(projectile, pass.tick);
                        projectile_event(&projectile, &entry, strike)
                    })
            } else {
                None
            };

            if let Some(event) = event {
                self.stamp(slot, pass.tick);
                trace!(
                    instigator = event.instigator,
                    victim = event.victim,
                    distance = event.distance,
                    "hit"
                );
                on_hit(&event);
                collisions += 1;
            }
        }
        debug!(tick = self.tick, collisions, "collided uniform grid");
        collisions
    }

    fn stamp(&mut self, slot: usize, tick: u32) -> SpatialEntry {
        let entry = &mut self.entries[slot];
        entry.last_collided = tick;
        *entry
    }

    fn beam_target<W: SpatialWorld>(
        &self,
        beam: &SpatialEntry,
        candidates: &[usize],
        pass: &CollisionPass<'_, W>,
    ) -> Option<(usize, Strike<W::Part>)> {
        let mut best: Option<(usize, Strike<W::Part>)> = None;
        for &slot in candidates {
            let target = &self.entries[slot];
            if !pass.can_collide(beam, target) {
                continue;
            }
            let Some(strike) = pass.beam_strike(beam, target) else {
                continue;
            };
            if best
                .as_ref()
                .map_or(true, |(_, best)| strike.distance < best.distance)
            {
                best = Some((slot, strike));
            }
        }
        best
    }

    fn projectile_target<W: SpatialWorld>(
        &self,
        projectile: &SpatialEntry,
        candidates: &[usize],
        pass: &CollisionPass<'_, W>,
    ) -> Option<(usize, Strike<W::Part>)> {
        candidates.iter().find_map(|&slot| {
            let target = &self.entries[slot];
            if !pass.can_collide(projectile, target) {
                return None;
            }
            pass.projectile_strike(projectile, target)
                .map(|strike| (slot, strike))
        })
    }

    fn projectile_for_body<W: SpatialWorld>(
        &self,
        body: &SpatialEntry,
        candidates: &[usize],
        pass: &CollisionPass<'_, W>,
    ) -> Option<(usize, Strike<W::Part>)> {
        candidates.iter().find_map(|&slot| {
            let projectile = &self.entries[slot];
            if !projectile.is(ObjectKind::PROJECTILE) || !pass.can_collide(body, projectile) {
                return None;
            }
            pass.projectile_strike(projectile, body)
                .map(|strike| (slot, strike))
        })
    }

    pub fn find_nearby(&self, options: &SearchOptions<'_>) -> SpatialResult<Vec<ObjectId>> {
        options.validate()?;
        let query_box = options.query_box(&self.world);
        let mut candidates = Vec::new();
        self.candidates(&query_box, &mut candidates);

        let mut found = Vec::new();
        for slot in candidates {
            if options.is_full(found.len()) {
                break;
            }
            let entry = &self.entries[slot];
            if options.accepts(
                &query_box,
                entry.id,
                entry.kind,
                entry.loyalty,
                &entry.bounds,
                entry.center,
                entry.radius,
            ) {
                found.push((entry.id, entry.center));
            }
        }
        Ok(options.finish(found))
    }
}

impl<W: SpatialWorld> Spatial<W> for UniformGrid {
    fn name(&self) -> &'static str {
        "UniformGrid"
    }

    fn count(&self) -> usize {
        UniformGrid::count(self)
    }

    fn full_size(&self) -> f32 {
        self.full_size
    }

    fn world_bounds(&self) -> Aabb {
        self.world
    }

    fn clear(&mut self) {
        UniformGrid::clear(self)
    }

    fn insert(&mut self, object: &ObjectSnapshot) -> SpatialResult<()> {
        UniformGrid::insert(self, object)
    }

    fn remove(&mut self, id: ObjectId) -> bool {
        UniformGrid::remove(self, id)
    }

    fn update_all(&mut self, world: &W) {
        UniformGrid::update_all(self, world)
    }

    fn collide_all(
        &mut self,
        world: &W,
        time_step: f32,
        on_hit: &mut dyn FnMut(&HitEvent<W::Part>),
    ) -> usize {
        UniformGrid::collide_all(self, world, time_step, |event| on_hit(event))
    }

    fn find_nearby(&self, options: &SearchOptions<'_>) -> SpatialResult<Vec<ObjectId>> {
        UniformGrid::find_nearby(self, options)
    }
}
