use crate::backend::{Spatial, SpatialKind};
use crate::collision::HitEvent;
use crate::config::Config;
use crate::error::SpatialResult;
use crate::grid::UniformGrid;
use crate::object::{Loyalty, ObjectId, ObjectKind, ObjectSnapshot, SpatialWorld};
use crate::quadtree::Quadtree;
use crate::search::SearchOptions;
use tracing::{debug, info};

/// Kinds the manager keeps in its backend. Everything else is ignored by
/// [`SpatialManager::add`].
pub const TRACKED_KINDS: ObjectKind = ObjectKind::SHIP
    .union(ObjectKind::PROJECTILE)
    .union(ObjectKind::BEAM)
    .union(ObjectKind::ASTEROID)
    .union(ObjectKind::MOON);

// Small splash radii would miss neighbours in the tree's coarse cells.
pub const MIN_SPLASH_SEARCH_RADIUS: f32 = 512.0;
pub const SHIP_EXPLOSION_MARGIN: f32 = 64.0;
pub const MAX_EXPLOSION_VICTIMS: usize = 32;

/// Owns the active backend and is the single entry point the simulation
/// talks to.
pub struct SpatialManager<W: SpatialWorld> {
    kind: SpatialKind,
    config: Config,
    spatial: Option<Box<dyn Spatial<W>>>,
    collisions: usize,
}

impl<W: SpatialWorld> SpatialManager<W> {
    pub fn new(kind: SpatialKind, config: Config) -> Self {
        Self {
            kind,
            config,
            spatial: None,
            collisions: 0,
        }
    }

    pub fn kind(&self) -> SpatialKind {
        self.kind
    }

    /// (Re)build the backend for a universe spanning `[-radius, radius]`.
    pub fn setup(&mut self, universe_radius: f32) -> SpatialResult<()> {
        let spatial: Box<dyn Spatial<W>> = match self.kind {
            SpatialKind::QuadTree => {
                Box::new(Quadtree::new_with_config(universe_radius, self.config.clone())?)
            }
            SpatialKind::UniformGrid => {
                Box::new(UniformGrid::new_with_config(universe_radius, self.config.clone())?)
            }
        };
        info!(
            name = spatial.name(),
            universe_width = universe_radius * 2.0,
            full_size = spatial.full_size(),
            "spatial manager set up"
        );
        self.spatial = Some(spatial);
        self.collisions = 0;
        Ok(())
    }

    /// Drop the backend and everything it tracks.
    pub fn destroy(&mut self) {
        if let Some(spatial) = self.spatial.take() {
            debug!(name = spatial.name(), count = spatial.count(), "spatial manager destroyed");
        }
        self.collisions = 0;
    }

    pub fn name(&self) -> &'static str {
        self.spatial.as_ref().map_or("None", |spatial| spatial.name())
    }

    pub fn count(&self) -> usize {
        self.spatial.as_ref().map_or(0, |spatial| spatial.count())
    }

    pub fn full_size(&self) -> f32 {
        self.spatial.as_ref().map_or(0.0, |spatial| spatial.full_size())
    }

    /// Collisions resolved by the last [`SpatialManager::update`].
    pub fn collisions(&self) -> usize {
        self.collisions
    }

    /// Returns `Ok(false)` when the object is ignored: untracked kind, or no
    /// backend set up yet.
    pub fn add(&mut self, object: &ObjectSnapshot) -> SpatialResult<bool> {
        if !object.is(TRACKED_KINDS) {
            return Ok(false);
        }
        match self.spatial.as_mut() {
            Some(spatial) => spatial.insert(object).map(|()| true),
            None => Ok(false),
        }
    }

    pub fn remove(&mut self, id: ObjectId) -> bool {
        self.spatial
            .as_mut()
            .map_or(false, |spatial| spatial.remove(id))
    }

    /// One simulation tick: refresh every entry, then resolve collisions.
    pub fn update<F>(&mut self, world: &W, time_step: f32, mut on_hit: F) -> usize
    where
        F: FnMut(&HitEvent<W::Part>),
    {
        let Some(spatial) = self.spatial.as_mut() else {
            return 0;
        };
        spatial.update_all(world);
        self.collisions = spatial.collide_all(world, time_step, &mut on_hit);
        self.collisions
    }

    pub fn find_nearby(&self, options: &SearchOptions<'_>) -> SpatialResult<Vec<ObjectId>> {
        match self.spatial.as_ref() {
            Some(spatial) => spatial.find_nearby(options),
            None => {
                options.validate()?;
                Ok(Vec::new())
            }
        }
    }

    /// Search around `object`, never returning the object itself.
    pub fn find_nearby_around(
        &self,
        object: &ObjectSnapshot,
        kind: ObjectKind,
        radius: f32,
        max_results: usize,
        exclude_loyalty: Option<Loyalty>,
        only_loyalty: Option<Loyalty>,
    ) -> SpatialResult<Vec<ObjectId>> {
        let mut options = SearchOptions::new(object.center, radius)
            .with_kind(kind)
            .with_max_results(max_results)
            .excluding(object.id);
        options.exclude_loyalty = exclude_loyalty;
        options.only_loyalty = only_loyalty;
        self.find_nearby(&options)
    }

    /// Ships caught in a projectile's splash, closest first.
    pub fn projectile_explosion_victims(
        &self,
        source: &ObjectSnapshot,
        damage_radius: f32,
    ) -> SpatialResult<Vec<ObjectId>> {
        if damage_radius.is_nan() || damage_radius <= 0.0 {
            return Ok(Vec::new());
        }
        let options = SearchOptions::new(source.center, damage_radius.max(MIN_SPLASH_SEARCH_RADIUS))
            .with_kind(ObjectKind::SHIP)
            .with_max_results(MAX_EXPLOSION_VICTIMS)
            .excluding(source.id)
            .excluding_loyalty(source.loyalty)
            .sorted();
        self.find_nearby(&options)
    }

    /// Ships of any loyalty near an exploding ship.
    pub fn ship_explosion_victims(
        &self,
        ship: &ObjectSnapshot,
        damage_radius: f32,
    ) -> SpatialResult<Vec<ObjectId>> {
        if damage_radius.is_nan() || damage_radius <= 0.0 {
            return Ok(Vec::new());
        }
        self.find_nearby_around(
            ship,
            ObjectKind::SHIP,
            damage_radius + SHIP_EXPLOSION_MARGIN,
            MAX_EXPLOSION_VICTIMS,
            None,
            None,
        )
    }
}
