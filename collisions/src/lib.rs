use common::shapes::{Circle, Segment, Vec2};
use nalgebra::{Isometry2, Point2};
use parry2d::query::{Ray, RayCast};
use parry2d::shape::Ball;

/// Distance from `segment.start` to the first point where the segment enters
/// `circle`, or `None` if the segment misses it.
///
/// A segment that starts inside the circle hits at distance `0.0`.
pub fn segment_circle_distance(segment: &Segment, circle: &Circle) -> Option<f32> {
    let dir = segment.end - segment.start;
    let length = dir.norm();
    if length <= f32::EPSILON {
        // Degenerate segment, treat it as a point.
        let inside =
            (segment.start - circle.center).norm_squared() <= circle.radius * circle.radius;
        return inside.then_some(0.0);
    }

    let ball = Ball::new(circle.radius.max(0.0));
    let position = Isometry2::translation(circle.center.x, circle.center.y);
    let ray = Ray::new(Point2::new(segment.start.x, segment.start.y), dir);

    // The ray direction is not normalized, so time of impact is a fraction of
    // the segment length.
    ball.cast_ray(&position, &ray, 1.0, true)
        .map(|toi| toi * length)
}

/// Closest point on `segment` to `point`.
pub fn closest_point_on_segment(segment: &Segment, point: Vec2) -> Vec2 {
    let dir = segment.end - segment.start;
    let length_sq = dir.norm_squared();
    if length_sq <= f32::EPSILON {
        return segment.start;
    }
    let t = ((point - segment.start).dot(&dir) / length_sq).clamp(0.0, 1.0);
    segment.start + dir * t
}

/// Where a beam struck its victim.
///
/// A positive `distance` is measured along the beam from its source. Zero
/// means the beam glanced the victim from the side or started inside it, so
/// the point on the beam closest to `victim_center` is used instead.
pub fn beam_hit_position(segment: &Segment, distance: f32, victim_center: Vec2) -> Vec2 {
    let dir = segment.end - segment.start;
    let length = dir.norm();
    if distance > 0.0 && length > f32::EPSILON {
        return segment.start + dir * (distance / length);
    }
    closest_point_on_segment(segment, victim_center)
}

/// Previous position of a body that moved by `delta` this tick; used to sweep
/// fast movers so they don't tunnel through thin targets.
pub fn swept_path(center: Vec2, delta: Vec2) -> Segment {
    Segment::new(center - delta, center)
}
