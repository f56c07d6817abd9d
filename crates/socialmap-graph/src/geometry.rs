use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length_sq(self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    pub fn length(self) -> f32 {
        self.length_sq().sqrt()
    }

    pub fn distance(self, other: Vec2) -> f32 {
        (other - self).length()
    }

    /// Direction angle in radians, `atan2(y, x)`. Zero for the zero vector.
    pub fn angle(self) -> f32 {
        self.y.atan2(self.x)
    }

    pub fn from_angle(angle: f32) -> Self {
        Self::new(angle.cos(), angle.sin())
    }

    pub fn lerp(self, other: Vec2, t: f32) -> Vec2 {
        self + (other - self) * t
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Vec2) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;
    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

/// A rectangle defined by min and max corners.
///
/// Rectangles built with a negative size keep `min > max`; callers that clamp
/// into them go through [`Rect::clamp_point`], which degrades to the centre.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn from_pos_size(pos: Vec2, size: Vec2) -> Self {
        Self {
            min: pos,
            max: Vec2::new(pos.x + size.x, pos.y + size.y),
        }
    }

    pub fn x(&self) -> f32 {
        self.min.x
    }

    pub fn y(&self) -> f32 {
        self.min.y
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(
            self.min.x + self.width() * 0.5,
            self.min.y + self.height() * 0.5,
        )
    }

    /// True when the rectangle has no positive interior.
    pub fn is_degenerate(&self) -> bool {
        !(self.width() > 0.0 && self.height() > 0.0)
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// Shrink by `amount` on every side. The result may be degenerate.
    pub fn shrink(&self, amount: f32) -> Rect {
        Rect {
            min: Vec2::new(self.min.x + amount, self.min.y + amount),
            max: Vec2::new(self.max.x - amount, self.max.y - amount),
        }
    }

    /// Smallest rectangle containing both.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            min: Vec2::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Vec2::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }

    /// Clamp `point` into the rectangle.
    ///
    /// A degenerate rectangle clamps every point to its centre, so the result
    /// is always finite for finite corners.
    pub fn clamp_point(&self, point: Vec2) -> Clamped {
        if self.is_degenerate() {
            let center = self.center();
            return Clamped {
                point: center,
                x: axis_side(point.x, center.x),
                y: axis_side(point.y, center.y),
            };
        }

        let (x, x_side) = clamp_axis(point.x, self.min.x, self.max.x);
        let (y, y_side) = clamp_axis(point.y, self.min.y, self.max.y);
        Clamped {
            point: Vec2::new(x, y),
            x: x_side,
            y: y_side,
        }
    }
}

/// Which bound, if any, an axis was clamped against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClampSide {
    Inside,
    Min,
    Max,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Clamped {
    pub point: Vec2,
    pub x: ClampSide,
    pub y: ClampSide,
}

impl Clamped {
    pub fn changed(&self) -> bool {
        self.x != ClampSide::Inside || self.y != ClampSide::Inside
    }
}

fn clamp_axis(value: f32, min: f32, max: f32) -> (f32, ClampSide) {
    if !value.is_finite() {
        return ((min + max) * 0.5, ClampSide::Min);
    }
    if value < min {
        (min, ClampSide::Min)
    } else if value > max {
        (max, ClampSide::Max)
    } else {
        (value, ClampSide::Inside)
    }
}

fn axis_side(value: f32, center: f32) -> ClampSide {
    if value < center || value.is_nan() {
        ClampSide::Min
    } else if value > center {
        ClampSide::Max
    } else {
        ClampSide::Inside
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_inside_is_identity() {
        let r = Rect::from_pos_size(Vec2::new(10.0, 10.0), Vec2::new(100.0, 50.0));
        let c = r.clamp_point(Vec2::new(20.0, 30.0));
        assert_eq!(c.point, Vec2::new(20.0, 30.0));
        assert!(!c.changed());
    }

    #[test]
    fn test_clamp_reports_sides() {
        let r = Rect::from_pos_size(Vec2::new(0.0, 0.0), Vec2::new(100.0, 50.0));
        let c = r.clamp_point(Vec2::new(-5.0, 80.0));
        assert_eq!(c.point, Vec2::new(0.0, 50.0));
        assert_eq!(c.x, ClampSide::Min);
        assert_eq!(c.y, ClampSide::Max);
    }

    #[test]
    fn test_degenerate_rect_clamps_to_center() {
        let inverted = Rect::from_pos_size(Vec2::new(100.0, 100.0), Vec2::new(-40.0, 20.0));
        assert!(inverted.is_degenerate());
        let c = inverted.clamp_point(Vec2::new(500.0, -500.0));
        assert_eq!(c.point, inverted.center());

        let padded = Rect::from_pos_size(Vec2::ZERO, Vec2::new(15.0, 15.0)).shrink(10.0);
        assert!(padded.is_degenerate());
        assert_eq!(padded.clamp_point(Vec2::new(3.0, 4.0)).point, Vec2::new(7.5, 7.5));
    }

    #[test]
    fn test_non_finite_points_are_pulled_into_the_rect() {
        let r = Rect::from_pos_size(Vec2::ZERO, Vec2::new(10.0, 10.0));
        let c = r.clamp_point(Vec2::new(f32::NAN, f32::INFINITY));
        assert!(c.point.is_finite());
        assert!(r.contains(c.point));
    }
}
