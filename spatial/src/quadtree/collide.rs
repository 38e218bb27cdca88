use super::*;
use crate::collision::{beam_event, next_tick, projectile_event, CollisionPass, Strike};
use crate::object::ObjectKind;
use tracing::{debug, trace};

/// Location of a candidate target inside the arena.
struct Target<P> {
    node: u32,
    index: usize,
    strike: Strike<P>,
}

impl Quadtree {
    /// Resolve this tick's collisions. Each object takes part in at most one
    /// hit; `on_hit` sees every resolved pair once. Returns the hit count.
    pub fn collide_all<W, F>(&mut self, world: &W, time_step: f32, mut on_hit: F) -> usize
    where
        W: SpatialWorld,
        F: FnMut(&HitEvent<W::Part>),
    {
        self.tick = next_tick(self.tick);
        let pass = CollisionPass::new(world, self.tick, time_step, &self.config);
        let collisions = self.collide_at(ROOT, &pass, &mut on_hit);
        debug!(tick = self.tick, collisions, "collided quadtree");
        collisions
    }

    fn collide_at<W, F>(&mut self, node: u32, pass: &CollisionPass<'_, W>, on_hit: &mut F) -> usize
    where
        W: SpatialWorld,
        F: FnMut(&HitEvent<W::Part>),
    {
        let mut collisions = 0;
        if let Some(children) = self.node(node).children() {
            for child in children {
                collisions += self.collide_at(child, pass, on_hit);
            }
        }

        for index in 0..self.node(node).items.len() {
            let entry = self.node(node).items[index];
            if !pass.is_candidate_instigator(&entry) {
                continue;
            }
            let event = if entry.is(ObjectKind::BEAM) {
                self.collide_beam(node, index, &entry, pass)
            } else if entry.is(ObjectKind::PROJECTILE) {
                self.collide_projectile(node, index, &entry, pass)
            } else if entry.is(ObjectKind::SHIP) || entry.is_static() {
                self.collide_body(node, index, &entry, pass)
            } else {
                None
            };
            if let Some(event) = event {
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
        collisions
    }

    /// Stamp an entry with the current tick and return a copy of it.
    fn stamp(&mut self, node: u32, index: usize, tick: u32) -> SpatialEntry {
        let entry = &mut self.node_mut(node).items[index];
        entry.last_collided = tick;
        *entry
    }

    fn collide_beam<W: SpatialWorld>(
        &mut self,
        node: u32,
        index: usize,
        beam: &SpatialEntry,
        pass: &CollisionPass<'_, W>,
    ) -> Option<HitEvent<W::Part>> {
        let mut best = None;
        self.find_beam_target(ROOT, beam, pass, &mut best);
        let target = best?;
        let victim = self.stamp(target.node, target.index, pass.tick);
        self.stamp(node, index, pass.tick);
        Some(beam_event(beam, &victim, target.strike))
    }

    // Beams can reach anywhere along their segment, so the search runs over
    // the whole tree and keeps the closest hit.
    fn find_beam_target<W: SpatialWorld>(
        &self,
        node: u32,
        beam: &SpatialEntry,
        pass: &CollisionPass<'_, W>,
        best: &mut Option<Target<W::Part>>,
    ) {
        let current = self.node(node);
        if !current.cell.bounds.overlaps(&beam.bounds) {
            return;
        }
        for (index, item) in current.items.iter().enumerate() {
            if !pass.can_collide(beam, item) {
                continue;
            }
            let Some(strike) = pass.beam_strike(beam, item) else {
                continue;
            };
            let closer = best
                .as_ref()
                .map_or(true, |best| strike.distance < best.strike.distance);
            if closer {
                *best = Some(Target {
                    node,
                    index,
                    strike,
                });
            }
        }
        if let Some(children) = current.children() {
            for child in children {
                self.find_beam_target(child, beam, pass, best);
            }
        }
    }

    fn collide_projectile<W: SpatialWorld>(
        &mut self,
        node: u32,
        index: usize,
        projectile: &SpatialEntry,
        pass: &CollisionPass<'_, W>,
    ) -> Option<HitEvent<W::Part>> {
        let target = self.find_projectile_target(node, projectile, pass)?;
        let victim = self.stamp(target.node, target.index, pass.tick);
        self.stamp(node, index, pass.tick);
        Some(projectile_event(projectile, &victim, target.strike))
    }

    fn find_projectile_target<W: SpatialWorld>(
        &self,
        node: u32,
        projectile: &SpatialEntry,
        pass: &CollisionPass<'_, W>,
    ) -> Option<Target<W::Part>> {
        let current = self.node(node);
        for (index, item) in current.items.iter().enumerate() {
            if !pass.can_collide(projectile, item) {
                continue;
            }
            if let Some(strike) = pass.projectile_strike(projectile, item) {
                return Some(Target {
                    node,
                    index,
                    strike,
                });
            }
        }
        for child in current.children()? {
            if !self.node(child).cell.bounds.overlaps(&projectile.bounds) {
                continue;
            }
            if let Some(target) = self.find_projectile_target(child, projectile, pass) {
                return Some(target);
            }
        }
        None
    }

    // Ships and static bodies look for projectiles in their own subtree, since
    // a projectile below them never searches upwards. The projectile is
    // reported as the instigator.
    fn collide_body<W: SpatialWorld>(
        &mut self,
        node: u32,
        index: usize,
        body: &SpatialEntry,
        pass: &CollisionPass<'_, W>,
    ) -> Option<HitEvent<W::Part>> {
        let target = self.find_projectile_below(node, body, pass)?;
        let projectile = self.stamp(target.node, target.index, pass.tick);
        let body = self.stamp(node, index, pass.tick);
        Some(projectile_event(&projectile, &body, target.strike))
    }

    fn find_projectile_below<W: SpatialWorld>(
        &self,
        node: u32,
        body: &SpatialEntry,
        pass: &CollisionPass<'_, W>,
    ) -> Option<Target<W::Part>> {
        let current = self.node(node);
        for (index, item) in current.items.iter().enumerate() {
            if !item.is(ObjectKind::PROJECTILE) || !pass.can_collide(body, item) {
                continue;
            }
            if let Some(strike) = pass.projectile_strike(item, body) {
                return Some(Target {
                    node,
                    index,
                    strike,
                });
            }
        }
        for child in current.children()? {
            if !self.node(child).cell.bounds.overlaps(&body.bounds) {
                continue;
            }
            if let Some(target) = self.find_projectile_below(child, body, pass) {
                return Some(target);
            }
        }
        None
    }
}
