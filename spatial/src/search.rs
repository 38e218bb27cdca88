use crate::error::{validate_position, validate_query_radius, SpatialResult};
use crate::object::{Loyalty, ObjectId, ObjectKind};
use common::shapes::{Aabb, Vec2};
use std::cmp::Ordering;
use std::fmt;

/// Final per-object test of a query, run after every other filter passed.
pub type SearchFilter<'a> = &'a dyn Fn(ObjectId) -> bool;

/// Parameters of a FindNearby query.
#[derive(Clone, Copy)]
pub struct SearchOptions<'a> {
    pub origin: Vec2,
    /// Finite and non-negative, or `f32::INFINITY` for an unbounded search.
    pub radius: f32,
    /// `None` means unlimited. `Some(0)` is treated as `Some(1)`.
    pub max_results: Option<usize>,
    /// Empty matches every kind.
    pub kind: ObjectKind,
    pub exclude_object: Option<ObjectId>,
    pub exclude_loyalty: Option<Loyalty>,
    pub only_loyalty: Option<Loyalty>,
    pub sort_by_distance: bool,
    pub filter: Option<SearchFilter<'a>>,
}

impl fmt::Debug for SearchOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchOptions")
            .field("origin", &self.origin)
            .field("radius", &self.radius)
            .field("max_results", &self.max_results)
            .field("kind", &self.kind)
            .field("exclude_object", &self.exclude_object)
            .field("exclude_loyalty", &self.exclude_loyalty)
            .field("only_loyalty", &self.only_loyalty)
            .field("sort_by_distance", &self.sort_by_distance)
            .field("filter", &self.filter.is_some())
            .finish()
    }
}

impl<'a> SearchOptions<'a> {
    pub fn new(origin: Vec2, radius: f32) -> Self {
        Self {
            origin,
            radius,
            max_results: None,
            kind: ObjectKind::empty(),
            exclude_object: None,
            exclude_loyalty: None,
            only_loyalty: None,
            sort_by_distance: false,
            filter: None,
        }
    }

    pub fn with_kind(mut self, kind: ObjectKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = Some(max_results);
        self
    }

    pub fn excluding(mut self, id: ObjectId) -> Self {
        self.exclude_object = Some(id);
        self
    }

    pub fn excluding_loyalty(mut self, loyalty: Loyalty) -> Self {
        self.exclude_loyalty = Some(loyalty);
        self
    }

    pub fn only_loyalty(mut self, loyalty: Loyalty) -> Self {
        self.only_loyalty = Some(loyalty);
        self
    }

    pub fn sorted(mut self) -> Self {
        self.sort_by_distance = true;
        self
    }

    pub fn with_filter(mut self, filter: SearchFilter<'a>) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn validate(&self) -> SpatialResult<()> {
        validate_position(self.origin.x, self.origin.y)?;
        validate_query_radius(self.radius)
    }

    /// Box of the query circle, clamped to `world`.
    pub fn query_box(&self, world: &Aabb) -> Aabb {
        Aabb::from_point_radius(self.origin, self.radius).clamped_to(world)
    }

    pub(crate) fn limit(&self) -> usize {
        self.max_results.map_or(usize::MAX, |max| max.max(1))
    }

    /// Whether an unsorted gather can stop as soon as `found` results exist.
    pub(crate) fn is_full(&self, found: usize) -> bool {
        !self.sort_by_distance && found >= self.limit()
    }

    /// The FindNearby filter. Shared by every backend and by the linear
    /// oracle so their results stay comparable.
    #[allow(clippy::too_many_arguments)]
    pub fn accepts(
        &self,
        query_box: &Aabb,
        id: ObjectId,
        kind: ObjectKind,
        loyalty: Loyalty,
        bounds: &Aabb,
        center: Vec2,
        radius: f32,
    ) -> bool {
        if !self.kind.is_empty() && !kind.intersects(self.kind) {
            return false;
        }
        if self.exclude_object == Some(id) {
            return false;
        }
        if self.exclude_loyalty == Some(loyalty) {
            return false;
        }
        if self.only_loyalty.map_or(false, |only| only != loyalty) {
            return false;
        }
        if !query_box.overlaps(bounds) {
            return false;
        }
        let reach = self.radius + radius;
        if (center - self.origin).norm_squared() > reach * reach {
            return false;
        }
        self.filter.map_or(true, |filter| filter(id))
    }

    /// Apply distance sort and result cap to gathered `(id, center)` pairs.
    pub(crate) fn finish(&self, mut found: Vec<(ObjectId, Vec2)>) -> Vec<ObjectId> {
        if self.sort_by_distance {
            let origin = self.origin;
            found.sort_by(|a, b| {
                let da = (a.1 - origin).norm_squared();
                let db = (b.1 - origin).norm_squared();
                da.partial_cmp(&db).unwrap_or(Ordering::Equal)
            });
        }
        found.truncate(self.limit());
        found.into_iter().map(|(id, _)| id).collect()
    }
}
