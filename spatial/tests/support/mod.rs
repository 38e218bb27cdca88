#![allow(dead_code)]

use collisions::segment_circle_distance;
use common::shapes::{Circle, Segment, Vec2};
use spatial::{ObjectId, ObjectSnapshot, PartHit, SpatialWorld};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

/// Minimal simulation: every ship is a single part identified by its own id.
#[derive(Default)]
pub struct TestWorld {
    objects: HashMap<ObjectId, ObjectSnapshot>,
    hollow: HashSet<ObjectId>,
    lookups: RefCell<HashMap<ObjectId, usize>>,
    pub ray_tests: Cell<usize>,
    pub point_tests: Cell<usize>,
}

impl TestWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, object: ObjectSnapshot) -> ObjectSnapshot {
        self.objects.insert(object.id, object);
        object
    }

    pub fn get(&self, id: ObjectId) -> ObjectSnapshot {
        self.objects[&id]
    }

    pub fn move_to(&mut self, id: ObjectId, x: f32, y: f32) {
        if let Some(object) = self.objects.get_mut(&id) {
            object.center = Vec2::new(x, y);
        }
    }

    pub fn deactivate(&mut self, id: ObjectId) {
        if let Some(object) = self.objects.get_mut(&id) {
            object.active = false;
        }
    }

    pub fn forget(&mut self, id: ObjectId) {
        self.objects.remove(&id);
    }

    /// Ships whose parts can never be struck.
    pub fn make_hollow(&mut self, id: ObjectId) {
        self.hollow.insert(id);
    }

    pub fn snapshots(&self) -> Vec<ObjectSnapshot> {
        let mut objects: Vec<_> = self.objects.values().copied().collect();
        objects.sort_by_key(|object| object.id);
        objects
    }

    pub fn reset_lookups(&self) {
        self.lookups.borrow_mut().clear();
    }

    pub fn lookups(&self, id: ObjectId) -> usize {
        self.lookups.borrow().get(&id).copied().unwrap_or(0)
    }
}

impl SpatialWorld for TestWorld {
    type Part = ObjectId;

    fn object(&self, id: ObjectId) -> Option<ObjectSnapshot> {
        *self.lookups.borrow_mut().entry(id).or_insert(0) += 1;
        self.objects.get(&id).copied()
    }

    fn ray_hit_part(
        &self,
        ship: ObjectId,
        start: Vec2,
        end: Vec2,
        radius: f32,
    ) -> Option<PartHit<ObjectId>> {
        self.ray_tests.set(self.ray_tests.get() + 1);
        if self.hollow.contains(&ship) {
            return None;
        }
        let object = self.objects.get(&ship)?;
        let circle = Circle {
            center: object.center,
            radius: object.radius + radius,
        };
        let distance = segment_circle_distance(&Segment::new(start, end), &circle)?;
        Some(PartHit {
            part: ship,
            distance,
        })
    }

    fn point_hit_part(&self, ship: ObjectId, center: Vec2, radius: f32) -> Option<ObjectId> {
        self.point_tests.set(self.point_tests.get() + 1);
        if self.hollow.contains(&ship) {
            return None;
        }
        let object = self.objects.get(&ship)?;
        let reach = object.radius + radius;
        ((object.center - center).norm_squared() < reach * reach).then_some(ship)
    }
}

pub fn v(x: f32, y: f32) -> Vec2 {
    Vec2::new(x, y)
}
