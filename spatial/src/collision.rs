use crate::config::Config;
use crate::entry::SpatialEntry;
use crate::object::{ObjectId, ObjectKind, SpatialWorld};
use common::shapes::{Circle, Vec2};

/// One resolved collision, handed to the damage collaborator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitEvent<P> {
    pub instigator: ObjectId,
    pub victim: ObjectId,
    /// Struck ship part, when the victim is a ship.
    pub part: Option<P>,
    pub position: Vec2,
    /// Beams: distance along the beam. Projectiles: distance between centers.
    pub distance: f32,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Strike<P> {
    pub(crate) part: Option<P>,
    pub(crate) distance: f32,
}

/// Next collision tick. Zero is reserved for entries that never collided.
pub(crate) fn next_tick(tick: u32) -> u32 {
    match tick.wrapping_add(1) {
        0 => 1,
        tick => tick,
    }
}

/// Everything one CollideAll call needs besides the backend's own storage.
pub(crate) struct CollisionPass<'w, W: SpatialWorld> {
    pub(crate) world: &'w W,
    pub(crate) tick: u32,
    time_step: f32,
    fast_mover_distance: f32,
    beam_hit_width: f32,
}

impl<'w, W: SpatialWorld> CollisionPass<'w, W> {
    pub(crate) fn new(world: &'w W, tick: u32, time_step: f32, config: &Config) -> Self {
        Self {
            world,
            tick,
            time_step,
            fast_mover_distance: config.fast_mover_distance,
            beam_hit_width: config.beam_hit_width,
        }
    }

    pub(crate) fn is_candidate_instigator(&self, entry: &SpatialEntry) -> bool {
        entry.last_collided != self.tick && self.world.is_live(entry.id)
    }

    /// Validity of any instigator/target pair. Beam targets are never valid:
    /// beam-vs-object is resolved only from the beam's side.
    pub(crate) fn can_collide(&self, instigator: &SpatialEntry, target: &SpatialEntry) -> bool {
        instigator.id != target.id
            && instigator.last_collided != self.tick
            && target.last_collided != self.tick
            && (target.loyalty != instigator.loyalty || target.is_static())
            && !target.is(ObjectKind::BEAM)
            && self.world.is_live(target.id)
    }

    pub(crate) fn beam_strike(
        &self,
        beam: &SpatialEntry,
        target: &SpatialEntry,
    ) -> Option<Strike<W::Part>> {
        let segment = beam.beam?;
        if target.is(ObjectKind::SHIP) {
            let hit = self.world.ray_hit_part(
                target.id,
                segment.start,
                segment.end,
                self.beam_hit_width,
            )?;
            return Some(Strike {
                part: Some(hit.part),
                distance: hit.distance.max(0.0),
            });
        }
        let circle = Circle {
            center: target.center,
            radius: target.radius,
        };
        let distance = collisions::segment_circle_distance(&segment, &circle)?;
        Some(Strike {
            part: None,
            distance,
        })
    }

    /// `projectile` is the moving body; `target` may be anything, including a
    /// ship whose struck part has to be resolved.
    pub(crate) fn projectile_strike(
        &self,
        projectile: &SpatialEntry,
        target: &SpatialEntry,
    ) -> Option<Strike<W::Part>> {
        let body = Circle {
            center: projectile.center,
            radius: projectile.radius,
        };
        let other = Circle {
            center: target.center,
            radius: target.radius,
        };
        if !body.intersects(&other) {
            return None;
        }
        let distance = (projectile.center - target.center).norm();
        if !target.is(ObjectKind::SHIP) {
            return Some(Strike {
                part: None,
                distance,
            });
        }

        let delta = projectile.velocity * self.time_step;
        let part = if delta.norm() > self.fast_mover_distance {
            let path = collisions::swept_path(projectile.center, delta);
            self.world
                .ray_hit_part(target.id, path.start, path.end, projectile.radius)
                .map(|hit| hit.part)
        } else {
            self.world
                .point_hit_part(target.id, projectile.center, projectile.radius)
        }?;
        Some(Strike {
            part: Some(part),
            distance,
        })
    }
}

pub(crate) fn beam_event<P>(
    beam: &SpatialEntry,
    victim: &SpatialEntry,
    strike: Strike<P>,
) -> HitEvent<P> {
    let position = match beam.beam {
        Some(segment) => collisions::beam_hit_position(&segment, strike.distance, victim.center),
        None => victim.center,
    };
    HitEvent {
        instigator: beam.id,
        victim: victim.id,
        part: strike.part,
        position,
        distance: strike.distance,
    }
}

pub(crate) fn projectile_event<P>(
    projectile: &SpatialEntry,
    victim: &SpatialEntry,
    strike: Strike<P>,
) -> HitEvent<P> {
    HitEvent {
        instigator: projectile.id,
        victim: victim.id,
        part: strike.part,
        position: projectile.center,
        distance: strike.distance,
    }
}
