use crate::collision::HitEvent;
use crate::error::SpatialResult;
use crate::object::{ObjectId, ObjectSnapshot, SpatialWorld};
use crate::search::SearchOptions;
use common::shapes::Aabb;

/// Which backend a [`SpatialManager`](crate::manager::SpatialManager) builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SpatialKind {
    #[default]
    QuadTree,
    UniformGrid,
}

/// Common contract of the interchangeable spatial backends. Chosen once at
/// setup and then only used through this trait.
pub trait Spatial<W: SpatialWorld> {
    fn name(&self) -> &'static str;

    /// Number of tracked entries.
    fn count(&self) -> usize;

    /// Side length of the area covered by the backend.
    fn full_size(&self) -> f32;

    fn world_bounds(&self) -> Aabb;

    fn clear(&mut self);

    fn insert(&mut self, object: &ObjectSnapshot) -> SpatialResult<()>;

    /// Returns `false` if `id` was not tracked.
    fn remove(&mut self, id: ObjectId) -> bool;

    fn update_all(&mut self, world: &W);

    fn collide_all(
        &mut self,
        world: &W,
        time_step: f32,
        on_hit: &mut dyn FnMut(&HitEvent<W::Part>),
    ) -> usize;

    fn find_nearby(&self, options: &SearchOptions<'_>) -> SpatialResult<Vec<ObjectId>>;
}
