use crate::error::{validate_position, SpatialError, SpatialResult};
use crate::object::{Loyalty, ObjectId, ObjectKind, ObjectSnapshot, STATIC_LOYALTY};
use common::shapes::{Aabb, Segment, Vec2};
use tracing::warn;

/// One tracked object: its current box plus the bookkeeping the collision
/// pass needs. Cheap to copy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialEntry {
    pub id: ObjectId,
    pub kind: ObjectKind,
    pub loyalty: Loyalty,
    /// Clamped to the world bounds.
    pub bounds: Aabb,
    pub center: Vec2,
    pub radius: f32,
    pub velocity: Vec2,
    pub beam: Option<Segment>,
    /// Tick in which this entry last took part in a collision.
    pub last_collided: u32,
    /// Set while the box straddles more than one child quadrant.
    pub overlaps_quads: bool,
}

impl SpatialEntry {
    pub fn new(object: &ObjectSnapshot, world: &Aabb) -> SpatialResult<Self> {
        let mut entry = SpatialEntry {
            id: object.id,
            kind: object.kind,
            loyalty: object.loyalty,
            bounds: Aabb::default(),
            center: Vec2::zeros(),
            radius: 0.0,
            velocity: Vec2::zeros(),
            beam: None,
            last_collided: 0,
            overlaps_quads: false,
        };
        entry.apply(object, world)?;
        Ok(entry)
    }

    pub fn is(&self, kind: ObjectKind) -> bool {
        self.kind.intersects(kind)
    }

    pub fn is_beam(&self) -> bool {
        self.beam.is_some()
    }

    pub fn is_static(&self) -> bool {
        self.loyalty == STATIC_LOYALTY
    }

    /// Refresh bounds from the latest snapshot. A snapshot with non-finite
    /// geometry keeps the previous bounds.
    pub(crate) fn refresh(&mut self, object: &ObjectSnapshot, world: &Aabb) {
        if let Err(err) = self.apply(object, world) {
            warn!(id = self.id, %err, "ignoring invalid spatial update");
        }
    }

    fn apply(&mut self, object: &ObjectSnapshot, world: &Aabb) -> SpatialResult<()> {
        validate_position(object.center.x, object.center.y)?;
        if object.radius.is_nan() {
            return Err(SpatialError::InvalidCircleRadius {
                radius: object.radius,
            });
        }

        let beam = if object.is(ObjectKind::BEAM) {
            let segment = object
                .beam
                .ok_or(SpatialError::MissingBeamSegment { id: object.id })?;
            if !segment.is_finite() {
                return Err(SpatialError::InvalidPosition {
                    x: segment.end.x,
                    y: segment.end.y,
                });
            }
            Some(segment)
        } else {
            None
        };

        match beam {
            Some(segment) => {
                self.center = segment.midpoint();
                self.radius = segment.length() * 0.5;
            }
            None => {
                self.center = object.center;
                self.radius = object.radius.max(0.0);
            }
        }
        self.beam = beam;
        self.kind = object.kind;
        self.loyalty = object.loyalty;
        self.velocity = if object.velocity.x.is_finite() && object.velocity.y.is_finite() {
            object.velocity
        } else {
            Vec2::zeros()
        };
        self.bounds = object.bounds().clamped_to(world);
        Ok(())
    }
}
