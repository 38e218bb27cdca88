use crate::error::SpatialResult;
use crate::object::{ObjectId, ObjectSnapshot};
use crate::search::SearchOptions;
use common::shapes::Aabb;

/// Brute-force FindNearby over a plain object list. Slow, but trivially
/// correct, which makes it the reference the partitioned backends are
/// checked against.
pub struct LinearSearch;

impl LinearSearch {
    pub fn find_nearby(
        options: &SearchOptions<'_>,
        objects: &[ObjectSnapshot],
    ) -> SpatialResult<Vec<ObjectId>> {
        options.validate()?;
        let query_box = Aabb::from_point_radius(options.origin, options.radius);

        let mut found = Vec::new();
        for object in objects {
            if !object.active {
                continue;
            }
            if options.is_full(found.len()) {
                break;
            }
            if options.accepts(
                &query_box,
                object.id,
                object.kind,
                object.loyalty,
                &object.bounds(),
                object.center,
                object.radius,
            ) {
                found.push((object.id, object.center));
            }
        }
        Ok(options.finish(found))
    }
}
