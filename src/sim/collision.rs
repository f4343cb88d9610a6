//! Collision detection and response
//!
//! Three models cover every game: circles (asteroids, balls), axis-aligned
//! boxes (bricks, invaders, paddles) and grid cells (snake, maze actors).

use glam::Vec2;

/// Axis-aligned box, origin at the top-left corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Box of size `w`x`h` centred on `c`
    pub fn centered(c: Vec2, w: f32, h: f32) -> Self {
        Self::new(c.x - w / 2.0, c.y - h / 2.0, w, h)
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// Inclusive on every edge
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }
}

/// `distance(a, b) < ra + rb`
#[inline]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    a.distance_squared(b) < (ra + rb) * (ra + rb)
}

/// Standard four-inequality box overlap (touching edges do not overlap)
#[inline]
pub fn aabb_overlap(a: &Rect, b: &Rect) -> bool {
    a.x < b.right() && a.right() > b.x && a.y < b.bottom() && a.bottom() > b.y
}

/// Grid cell containing a continuous position (rounded to nearest)
#[inline]
pub fn cell_of(pos: Vec2) -> (i32, i32) {
    (pos.x.round() as i32, pos.y.round() as i32)
}

/// Whether two grid positions occupy the same cell
#[inline]
pub fn same_cell(a: Vec2, b: Vec2) -> bool {
    cell_of(a) == cell_of(b)
}

/// Reflect velocity off a surface: v - 2(v·n)n
#[inline]
pub fn reflect_velocity(vel: Vec2, normal: Vec2) -> Vec2 {
    vel - 2.0 * vel.dot(normal) * normal
}

/// Strike offset along a paddle, normalized to [-1, 1]
#[inline]
pub fn strike_offset(hit: f32, paddle_center: f32, half_extent: f32) -> f32 {
    if half_extent <= 0.0 {
        return 0.0;
    }
    ((hit - paddle_center) / half_extent).clamp(-1.0, 1.0)
}

/// Velocity across the paddle after a hit: continuous in the strike offset
/// and bounded by `max`
#[inline]
pub fn paddle_deflection(hit: f32, paddle_center: f32, half_extent: f32, max: f32) -> f32 {
    strike_offset(hit, paddle_center, half_extent) * max
}

/// Toroidal wrap: a shape fully past one edge (by `margin`) reappears on the other
pub fn wrap_position(pos: Vec2, width: f32, height: f32, margin: f32) -> Vec2 {
    let mut p = pos;
    if p.x < -margin {
        p.x = width + margin;
    } else if p.x > width + margin {
        p.x = -margin;
    }
    if p.y < -margin {
        p.y = height + margin;
    } else if p.y > height + margin {
        p.y = -margin;
    }
    p
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circles_overlap_strict() {
        assert!(circles_overlap(Vec2::ZERO, 5.0, Vec2::new(9.0, 0.0), 5.0));
        assert!(!circles_overlap(Vec2::ZERO, 5.0, Vec2::new(10.0, 0.0), 5.0));
    }

    #[test]
    fn test_aabb_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(aabb_overlap(&a, &Rect::new(5.0, 5.0, 10.0, 10.0)));
        assert!(!aabb_overlap(&a, &Rect::new(10.0, 0.0, 10.0, 10.0)));
        assert!(!aabb_overlap(&a, &Rect::new(0.0, 11.0, 10.0, 10.0)));
    }

    #[test]
    fn test_same_cell_rounds() {
        assert!(same_cell(Vec2::new(3.4, 2.0), Vec2::new(2.6, 2.2)));
        assert!(!same_cell(Vec2::new(3.6, 2.0), Vec2::new(3.4, 2.0)));
    }

    #[test]
    fn test_reflect_velocity() {
        // Ball moving right, hits vertical wall (normal pointing left)
        let reflected = reflect_velocity(Vec2::new(100.0, 0.0), Vec2::new(-1.0, 0.0));
        assert!((reflected.x + 100.0).abs() < 0.001);
        assert!(reflected.y.abs() < 0.001);
    }

    #[test]
    fn test_paddle_deflection_bounded() {
        assert_eq!(paddle_deflection(50.0, 50.0, 30.0, 5.0), 0.0);
        assert_eq!(paddle_deflection(80.0, 50.0, 30.0, 5.0), 5.0);
        assert_eq!(paddle_deflection(500.0, 50.0, 30.0, 5.0), 5.0);
        assert_eq!(paddle_deflection(-500.0, 50.0, 30.0, 5.0), -5.0);
        assert_eq!(paddle_deflection(1.0, 0.0, 0.0, 5.0), 0.0);
    }

    #[test]
    fn test_wrap_position() {
        let p = wrap_position(Vec2::new(-11.0, 50.0), 100.0, 100.0, 10.0);
        assert_eq!(p, Vec2::new(110.0, 50.0));
        let p = wrap_position(Vec2::new(50.0, 111.0), 100.0, 100.0, 10.0);
        assert_eq!(p, Vec2::new(50.0, -10.0));
        let p = wrap_position(Vec2::new(50.0, 50.0), 100.0, 100.0, 10.0);
        assert_eq!(p, Vec2::new(50.0, 50.0));
    }
}
