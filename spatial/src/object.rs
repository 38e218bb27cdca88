use bitflags::bitflags;
use common::shapes::{Aabb, Segment, Vec2};
use std::fmt::Debug;

/// Handle to a simulation object. The engine never owns the object itself.
pub type ObjectId = u32;

/// Faction id used for collision and query filtering.
pub type Loyalty = u16;

/// Loyalty of permanently static world geometry. Such entries are never
/// refreshed by the update pass and are valid collision targets for anyone.
pub const STATIC_LOYALTY: Loyalty = 0;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ObjectKind: u8 {
        const SHIP = 1;
        const SHIP_MODULE = 2;
        /// A discrete projectile, never a beam.
        const PROJECTILE = 4;
        /// A beam, never a projectile.
        const BEAM = 8;
        const ASTEROID = 16;
        const MOON = 32;
    }
}

/// What the simulation exposes about one object at the current tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectSnapshot {
    pub id: ObjectId,
    pub kind: ObjectKind,
    pub loyalty: Loyalty,
    pub active: bool,
    pub center: Vec2,
    pub radius: f32,
    pub velocity: Vec2,
    /// Source and destination, set for beams only.
    pub beam: Option<Segment>,
}

impl ObjectSnapshot {
    pub fn new(
        id: ObjectId,
        kind: ObjectKind,
        loyalty: Loyalty,
        center: Vec2,
        radius: f32,
    ) -> Self {
        Self {
            id,
            kind,
            loyalty,
            active: true,
            center,
            radius,
            velocity: Vec2::zeros(),
            beam: None,
        }
    }

    pub fn ship(id: ObjectId, loyalty: Loyalty, center: Vec2, radius: f32) -> Self {
        Self::new(id, ObjectKind::SHIP, loyalty, center, radius)
    }

    pub fn projectile(
        id: ObjectId,
        loyalty: Loyalty,
        center: Vec2,
        radius: f32,
        velocity: Vec2,
    ) -> Self {
        Self::new(id, ObjectKind::PROJECTILE, loyalty, center, radius).with_velocity(velocity)
    }

    pub fn beam(id: ObjectId, loyalty: Loyalty, source: Vec2, destination: Vec2) -> Self {
        let segment = Segment::new(source, destination);
        Self {
            beam: Some(segment),
            ..Self::new(
                id,
                ObjectKind::BEAM,
                loyalty,
                segment.midpoint(),
                segment.length() * 0.5,
            )
        }
    }

    /// Static world geometry such as asteroids and moons.
    pub fn static_body(id: ObjectId, kind: ObjectKind, center: Vec2, radius: f32) -> Self {
        Self::new(id, kind, STATIC_LOYALTY, center, radius)
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn is(&self, kind: ObjectKind) -> bool {
        self.kind.intersects(kind)
    }

    /// Unclamped bounding box: the swept box for beams, center ± radius
    /// otherwise.
    pub fn bounds(&self) -> Aabb {
        match (self.is(ObjectKind::BEAM), self.beam) {
            (true, Some(segment)) => segment.bounding_box(),
            _ => Aabb::from_point_radius(self.center, self.radius.max(0.0)),
        }
    }
}

/// A ship sub-component struck by a ray, and how far along the ray it was hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartHit<P> {
    pub part: P,
    pub distance: f32,
}

/// The simulation side of the engine: non-owning access to live objects and
/// to ship sub-component hit testing.
pub trait SpatialWorld {
    /// Opaque sub-component handle handed back to damage application.
    type Part: Copy + Debug;

    /// Current state of `id`, or `None` if the object no longer exists.
    fn object(&self, id: ObjectId) -> Option<ObjectSnapshot>;

    /// Ray test from `start` to `end` against the parts of `ship`.
    fn ray_hit_part(
        &self,
        ship: ObjectId,
        start: Vec2,
        end: Vec2,
        radius: f32,
    ) -> Option<PartHit<Self::Part>>;

    /// Point test of a circle against the parts of `ship`.
    fn point_hit_part(&self, ship: ObjectId, center: Vec2, radius: f32) -> Option<Self::Part>;

    fn is_live(&self, id: ObjectId) -> bool {
        self.object(id).map_or(false, |object| object.active)
    }
}
