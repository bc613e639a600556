//! Collision detection and response for axis-aligned boxes
//!
//! Overlap is a plain AABB test. The response picks the axis of least
//! penetration as the collision normal and reflects velocity along that axis
//! only; the paddle adds spin based on where it was struck.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::Body;
use crate::consts::*;

/// Allowed speed range for movers (px/frame)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedBand {
    pub min: f32,
    pub max: f32,
}

impl SpeedBand {
    /// `max` wins when the limits cross: the floor is pulled down to it
    pub fn new(min: f32, max: f32) -> Self {
        let max = max.max(0.0);
        Self {
            min: min.clamp(0.0, max),
            max,
        }
    }

    /// Band with both limits multiplied by a global speed modifier
    pub fn scaled(&self, factor: f32) -> Self {
        Self::new(self.min * factor, self.max * factor)
    }

    pub fn contains(&self, speed: f32) -> bool {
        speed >= self.min - 1e-4 && speed <= self.max + 1e-4
    }

    /// Rescale a velocity so its magnitude lies inside the band
    ///
    /// Direction is preserved; a zero velocity is sent straight up.
    pub fn clamp(&self, vel: Vec2) -> Vec2 {
        let speed = vel.length();
        if speed < 1e-6 {
            return Vec2::new(0.0, -self.min);
        }
        if speed < self.min {
            vel * (self.min / speed)
        } else if speed > self.max {
            vel * (self.max / speed)
        } else {
            vel
        }
    }
}

/// Collision normal axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Normal along x: reflect the horizontal component
    Horizontal,
    /// Normal along y: reflect the vertical component
    Vertical,
}

/// Rectangle the simulation is confined to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayArea {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl PlayArea {
    pub fn arena() -> Self {
        Self {
            left: 0.0,
            right: ARENA_WIDTH,
            top: 0.0,
            bottom: ARENA_HEIGHT,
        }
    }

    pub fn road() -> Self {
        Self {
            left: ROAD_LEFT,
            right: ROAD_RIGHT,
            top: 0.0,
            bottom: ARENA_HEIGHT,
        }
    }
}

/// Which edges of the play area bounce movers back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Walls {
    pub left: bool,
    pub right: bool,
    pub top: bool,
    pub bottom: bool,
}

impl Walls {
    /// Brick game: everything but the bottom, which is the exit edge
    pub const OPEN_BOTTOM: Walls = Walls {
        left: true,
        right: true,
        top: true,
        bottom: false,
    };
    /// Racer: only the road sides
    pub const SIDES: Walls = Walls {
        left: true,
        right: true,
        top: false,
        bottom: false,
    };
}

/// AABB overlap test (touching edges count as overlap)
#[inline]
pub fn overlaps(a: &Body, b: &Body) -> bool {
    !(a.right() < b.left() || a.left() > b.right() || a.bottom() < b.top() || a.top() > b.bottom())
}

/// Penetration depth on each axis: half-size sum minus centre distance
#[inline]
pub fn penetration(a: &Body, b: &Body) -> Vec2 {
    let delta = (a.pos - b.pos).abs();
    a.half() + b.half() - delta
}

/// Axis of least penetration; ties resolve to vertical
pub fn collision_axis(a: &Body, b: &Body) -> Axis {
    let pen = penetration(a, b);
    if pen.x < pen.y {
        Axis::Horizontal
    } else {
        Axis::Vertical
    }
}

/// Reverse the velocity component along `axis`
#[inline]
pub fn reflect(vel: Vec2, axis: Axis) -> Vec2 {
    match axis {
        Axis::Horizontal => Vec2::new(-vel.x, vel.y),
        Axis::Vertical => Vec2::new(vel.x, -vel.y),
    }
}

/// Push `a` out of `b` along `axis`
pub fn separate(a: &mut Body, b: &Body, axis: Axis) {
    let pen = penetration(a, b);
    match axis {
        Axis::Horizontal if pen.x > 0.0 => {
            a.pos.x += if a.pos.x < b.pos.x { -pen.x } else { pen.x };
        }
        Axis::Vertical if pen.y > 0.0 => {
            a.pos.y += if a.pos.y < b.pos.y { -pen.y } else { pen.y };
        }
        _ => {}
    }
}

/// Bounce a mover off a static or drifting obstacle
///
/// Reflects only along the least-penetration axis and separates the pair so
/// the same contact is not resolved again next tick.
pub fn bounce_off(mover: &mut Body, obstacle: &Body) -> Axis {
    let axis = collision_axis(mover, obstacle);
    mover.vel = reflect(mover.vel, axis);
    separate(mover, obstacle, axis);
    axis
}

/// Bounce a mover off the paddle / player vehicle
///
/// The outgoing direction always points away from the paddle. Striking the
/// paddle off-centre adds horizontal spin proportional to the offset, then
/// the speed is re-clamped into `band`.
pub fn deflect_off_paddle(mover: &mut Body, paddle: &Body, spin: f32, band: SpeedBand) -> Axis {
    let axis = collision_axis(mover, paddle);
    match axis {
        Axis::Vertical => {
            let above = mover.pos.y < paddle.pos.y;
            let vy = mover.vel.y.abs();
            mover.vel.y = if above { -vy } else { vy };
            let half_width = (paddle.size.x / 2.0).max(1.0);
            let offset = ((mover.pos.x - paddle.pos.x) / half_width).clamp(-1.0, 1.0);
            mover.vel.x += offset * spin;
        }
        Axis::Horizontal => {
            let vx = mover.vel.x.abs();
            mover.vel.x = if mover.pos.x < paddle.pos.x { -vx } else { vx };
        }
    }
    separate(mover, paddle, axis);
    mover.vel = band.clamp(mover.vel);
    axis
}

/// Reflect a mover off the play-area walls it is crossing
///
/// The offending velocity component is reversed and the position clamped to
/// the boundary. Returns true if any wall was touched.
pub fn reflect_off_walls(body: &mut Body, area: &PlayArea, walls: Walls) -> bool {
    let half = body.half();
    let mut hit = false;
    if walls.left && body.left() < area.left {
        body.pos.x = area.left + half.x;
        body.vel.x = body.vel.x.abs();
        hit = true;
    }
    if walls.right && body.right() > area.right {
        body.pos.x = area.right - half.x;
        body.vel.x = -body.vel.x.abs();
        hit = true;
    }
    if walls.top && body.top() < area.top {
        body.pos.y = area.top + half.y;
        body.vel.y = body.vel.y.abs();
        hit = true;
    }
    if walls.bottom && body.bottom() > area.bottom {
        body.pos.y = area.bottom - half.y;
        body.vel.y = -body.vel.y.abs();
        hit = true;
    }
    hit
}

/// Whether a collectible centred at `point` is close enough to be picked up
#[inline]
pub fn within_pickup_range(point: Vec2, paddle: &Body, radius: f32) -> bool {
    paddle.distance_to(point) <= radius
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn body(x: f32, y: f32, w: f32, h: f32) -> Body {
        Body::new(Vec2::new(x, y), Vec2::new(w, h))
    }

    #[test]
    fn test_overlap() {
        let a = body(0.0, 0.0, 10.0, 10.0);
        assert!(overlaps(&a, &body(9.0, 0.0, 10.0, 10.0)));
        assert!(overlaps(&a, &body(10.0, 0.0, 10.0, 10.0))); // touching
        assert!(!overlaps(&a, &body(10.5, 0.0, 10.0, 10.0)));
        assert!(!overlaps(&a, &body(0.0, -11.0, 10.0, 10.0)));
    }

    #[test]
    fn test_wide_horizontal_overlap_flips_vertical() {
        // Ball dipping into the underside of a brick: lots of x overlap, little y
        let mut ball = body(50.0, 27.0, 12.0, 12.0).with_velocity(Vec2::new(3.0, -4.0));
        let brick = body(50.0, 10.0, 40.0, 24.0);
        let axis = bounce_off(&mut ball, &brick);
        assert_eq!(axis, Axis::Vertical);
        assert_eq!(ball.vel, Vec2::new(3.0, 4.0));
        assert!(ball.top() >= brick.bottom() - 1e-4);
    }

    #[test]
    fn test_wide_vertical_overlap_flips_horizontal() {
        // Ball clipping the side of a brick
        let mut ball = body(74.0, 10.0, 12.0, 12.0).with_velocity(Vec2::new(-3.0, 4.0));
        let brick = body(50.0, 10.0, 40.0, 24.0);
        let axis = bounce_off(&mut ball, &brick);
        assert_eq!(axis, Axis::Horizontal);
        assert_eq!(ball.vel, Vec2::new(3.0, 4.0));
        assert!(ball.left() >= brick.right() - 1e-4);
    }

    #[test]
    fn test_penetration_tie_resolves_vertical() {
        // Exact corner overlap: equal penetration on both axes
        let mut ball = body(26.0, 26.0, 12.0, 12.0).with_velocity(Vec2::new(-2.0, -2.0));
        let brick = body(10.0, 10.0, 24.0, 24.0);
        let pen = penetration(&ball, &brick);
        assert_eq!(pen.x, pen.y);
        assert_eq!(collision_axis(&ball, &brick), Axis::Vertical);
        bounce_off(&mut ball, &brick);
        assert_eq!(ball.vel, Vec2::new(-2.0, 2.0));
    }

    #[test]
    fn test_paddle_center_hit_goes_straight_up() {
        let band = SpeedBand::new(4.0, 8.0);
        let paddle = body(240.0, 600.0, 96.0, 14.0);
        let mut ball = body(240.0, 590.0, 12.0, 12.0).with_velocity(Vec2::new(0.0, 5.0));
        deflect_off_paddle(&mut ball, &paddle, 3.0, band);
        assert!(ball.vel.x.abs() < 1e-5);
        assert!(ball.vel.y < 0.0);
        assert!(ball.bottom() <= paddle.top() + 1e-4);
    }

    #[test]
    fn test_paddle_edge_hit_adds_spin() {
        let band = SpeedBand::new(4.0, 8.0);
        let paddle = body(240.0, 600.0, 96.0, 14.0);
        let mut right = body(284.0, 590.0, 12.0, 12.0).with_velocity(Vec2::new(0.0, 5.0));
        let mut left = body(196.0, 590.0, 12.0, 12.0).with_velocity(Vec2::new(0.0, 5.0));
        deflect_off_paddle(&mut right, &paddle, 3.0, band);
        deflect_off_paddle(&mut left, &paddle, 3.0, band);
        assert!(right.vel.x > 0.0);
        assert!(left.vel.x < 0.0);
        assert!(band.contains(right.speed()));
        assert!(band.contains(left.speed()));
    }

    #[test]
    fn test_paddle_renormalizes_fast_ball() {
        let band = SpeedBand::new(4.0, 8.0);
        let paddle = body(240.0, 600.0, 96.0, 14.0);
        let mut ball = body(250.0, 590.0, 12.0, 12.0).with_velocity(Vec2::new(10.0, 30.0));
        deflect_off_paddle(&mut ball, &paddle, 3.0, band);
        assert!((ball.speed() - 8.0).abs() < 1e-4);
    }

    #[test]
    fn test_wall_reflection_clamps_position() {
        let area = PlayArea::arena();
        let mut ball = body(-3.0, 100.0, 12.0, 12.0).with_velocity(Vec2::new(-5.0, 2.0));
        assert!(reflect_off_walls(&mut ball, &area, Walls::OPEN_BOTTOM));
        assert_eq!(ball.left(), 0.0);
        assert_eq!(ball.vel, Vec2::new(5.0, 2.0));

        let mut ball = body(100.0, 700.0, 12.0, 12.0).with_velocity(Vec2::new(0.0, 5.0));
        assert!(!reflect_off_walls(&mut ball, &area, Walls::OPEN_BOTTOM));
        assert_eq!(ball.vel, Vec2::new(0.0, 5.0));
    }

    #[test]
    fn test_pickup_range_uses_distance() {
        let paddle = body(240.0, 600.0, 96.0, 14.0);
        assert!(within_pickup_range(Vec2::new(240.0, 575.0), &paddle, 20.0));
        assert!(!within_pickup_range(Vec2::new(240.0, 570.0), &paddle, 20.0));
        assert!(within_pickup_range(Vec2::new(300.0, 600.0), &paddle, 20.0));
    }

    #[test]
    fn test_zero_velocity_clamps_upward() {
        let band = SpeedBand::new(4.0, 8.0);
        assert_eq!(band.clamp(Vec2::ZERO), Vec2::new(0.0, -4.0));
    }

    #[test]
    fn test_crossed_limits_keep_the_cap() {
        let band = SpeedBand::new(16.25, 14.0);
        assert_eq!(band, SpeedBand { min: 14.0, max: 14.0 });
        assert_eq!(band.clamp(Vec2::new(0.0, -30.0)), Vec2::new(0.0, -14.0));
    }

    proptest! {
        #[test]
        fn prop_clamp_lands_in_band(
            vx in -50.0f32..50.0,
            vy in -50.0f32..50.0,
            min in 1.0f32..10.0,
            extra in 0.0f32..10.0,
        ) {
            let band = SpeedBand::new(min, min + extra);
            let out = band.clamp(Vec2::new(vx, vy));
            prop_assert!(band.contains(out.length()));
        }

        #[test]
        fn prop_paddle_deflection_respects_band(
            x_offset in -50.0f32..50.0,
            vx in -30.0f32..30.0,
            vy in 0.1f32..30.0,
        ) {
            let band = SpeedBand::new(4.0, 8.0);
            let paddle = body(240.0, 600.0, 96.0, 14.0);
            let mut ball = body(240.0 + x_offset, 590.0, 12.0, 12.0)
                .with_velocity(Vec2::new(vx, vy));
            deflect_off_paddle(&mut ball, &paddle, 3.0, band);
            prop_assert!(band.contains(ball.speed()));
        }
    }
}
