use nalgebra::Vector2;
use rand::Rng;

pub type Vec2 = Vector2<f32>;

/// Axis-aligned box stored as min/max corners.
///
/// Intervals are closed for overlap and containment tests; the quadtree layers
/// its own half-open quadrant rule on top of this.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Aabb {
    pub fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Square box centered on the origin, spanning `[-half, +half]` on both axes.
    pub fn centered(half: f32) -> Self {
        Self::new(-half, -half, half, half)
    }

    pub fn from_point_radius(center: Vec2, radius: f32) -> Self {
        Self::new(
            center.x - radius,
            center.y - radius,
            center.x + radius,
            center.y + radius,
        )
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.min_x + self.max_x) * 0.5,
            (self.min_y + self.max_y) * 0.5,
        )
    }

    pub fn is_finite(&self) -> bool {
        self.min_x.is_finite()
            && self.min_y.is_finite()
            && self.max_x.is_finite()
            && self.max_y.is_finite()
    }

    // Check that `inner` is fully contained in `self`
    pub fn contains(&self, inner: &Aabb) -> bool {
        self.min_x <= inner.min_x
            && self.max_x >= inner.max_x
            && self.min_y <= inner.min_y
            && self.max_y >= inner.max_y
    }

    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }

    /// Clamp every corner into `bounds`. Monotonic per axis, so two boxes that
    /// overlap before clamping still overlap afterwards.
    pub fn clamped_to(&self, bounds: &Aabb) -> Aabb {
        Aabb {
            min_x: self.min_x.clamp(bounds.min_x, bounds.max_x),
            min_y: self.min_y.clamp(bounds.min_y, bounds.max_y),
            max_x: self.max_x.clamp(bounds.min_x, bounds.max_x),
            max_y: self.max_y.clamp(bounds.min_y, bounds.max_y),
        }
    }

    pub fn distance_sq_to_point(&self, x: f32, y: f32) -> f32 {
        let dx = f32::max(f32::max(self.min_x - x, x - self.max_x), 0.0);
        let dy = f32::max(f32::max(self.min_y - y, y - self.max_y), 0.0);
        dx * dx + dy * dy
    }

    pub fn get_random_circle_coords_inside<R: Rng>(&self, radius: f32, rng: &mut R) -> Vec2 {
        // Increase radius by 1 in calculations to add a minimal margin.
        let radius = radius + 1.0;
        Vec2::new(
            safe_randf32(rng, self.min_x + radius, self.max_x - radius),
            safe_randf32(rng, self.min_y + radius, self.max_y - radius),
        )
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }
}

fn safe_randf32<R: Rng>(rng: &mut R, min: f32, max: f32) -> f32 {
    if min > max {
        return min;
    }
    rng.gen_range(min..=max)
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f32,
}

impl Circle {
    pub fn new(x: f32, y: f32, radius: f32) -> Self {
        Self {
            center: Vec2::new(x, y),
            radius,
        }
    }

    pub fn bounding_box(&self) -> Aabb {
        Aabb::from_point_radius(self.center, self.radius)
    }

    /// Strict overlap: squared center distance against the summed radii.
    pub fn intersects(&self, other: &Circle) -> bool {
        let reach = self.radius + other.radius;
        (self.center - other.center).norm_squared() < reach * reach
    }
}

impl Default for Circle {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}

/// Zero-width line segment, used for beams.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Segment {
    pub start: Vec2,
    pub end: Vec2,
}

impl Segment {
    pub fn new(start: Vec2, end: Vec2) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> f32 {
        (self.end - self.start).norm()
    }

    pub fn midpoint(&self) -> Vec2 {
        (self.start + self.end) * 0.5
    }

    /// Swept box covering both endpoints.
    pub fn bounding_box(&self) -> Aabb {
        Aabb::new(
            f32::min(self.start.x, self.end.x),
            f32::min(self.start.y, self.end.y),
            f32::max(self.start.x, self.end.x),
            f32::max(self.start.y, self.end.y),
        )
    }

    pub fn is_finite(&self) -> bool {
        self.start.x.is_finite()
            && self.start.y.is_finite()
            && self.end.x.is_finite()
            && self.end.y.is_finite()
    }
}
