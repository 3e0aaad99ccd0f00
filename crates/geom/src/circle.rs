//! Circles, the outer tangent lines between two circles and arc flattening.

use crate::math::{vector, Angle, Box2D, Point};
use alloc::vec::Vec;
use core::f32::consts::PI;

#[cfg(not(feature = "std"))]
use num_traits::Float;

/// Arcs are never flattened with steps smaller than this angle, in radians.
const MIN_ARC_STEP: f32 = 1e-3;

/// A circle defined by its center and radius.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Circle {
    pub center: Point,
    pub radius: f32,
}

/// Where the two outer tangent lines of a pair of circles touch them.
///
/// Each angle is measured around the circles' centers from the positive x axis.
/// It is also the direction of the outward normal of the tangent line, which is why
/// a single angle describes the contact point on both circles.
///
/// `left` is the tangent on the left-hand side when traveling from the first circle
/// towards the second one, `right` the one on the right-hand side.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TangentAngles {
    pub left: Angle,
    pub right: Angle,
}

impl Circle {
    #[inline]
    pub fn new(center: Point, radius: f32) -> Self {
        debug_assert!(radius >= 0.0, "negative radius {}", radius);
        Circle { center, radius }
    }

    /// The point of the circle in the direction of `angle` from its center.
    #[inline]
    pub fn point_at(&self, angle: Angle) -> Point {
        let (sin, cos) = angle.sin_cos();
        self.center + vector(cos, sin) * self.radius
    }

    /// Returns true if `other` is entirely inside of this circle.
    #[inline]
    pub fn contains(&self, other: &Circle) -> bool {
        (other.center - self.center).length() + other.radius <= self.radius
    }

    /// Computes the contact angles of the two outer tangent lines going from this
    /// circle to `other`.
    ///
    /// Returns `None` if one of the circles contains the other, in which case the
    /// outer tangents don't exist.
    pub fn tangent_angles(&self, other: &Circle) -> Option<TangentAngles> {
        let d = other.center - self.center;
        let distance = d.length();
        let radius_difference = self.radius - other.radius;
        if distance <= radius_difference.abs() || !distance.is_finite() {
            return None;
        }

        let base = d.y.atan2(d.x);
        let offset = (radius_difference / distance).max(-1.0).min(1.0).acos();

        Some(TangentAngles {
            left: Angle::radians(base + offset),
            right: Angle::radians(base - offset),
        })
    }

    /// The largest angle an arc of this circle can span while the distance between the
    /// arc and its chord stays under `max_chord_height`.
    pub fn arc_angle_for_chord_height(&self, max_chord_height: f32) -> f32 {
        if max_chord_height >= self.radius {
            return PI;
        }

        2.0 * (1.0 - max_chord_height / self.radius).acos()
    }

    /// Appends the flattened arc that starts at `start` and sweeps by `sweep` to
    /// `polyline` (counter-clockwise for positive sweeps).
    ///
    /// The point at `start` is not appended, the last appended point is the end of
    /// the arc. Nothing is appended for zero-radius circles or empty sweeps.
    pub fn append_arc_to_polyline(
        &self,
        start: Angle,
        sweep: Angle,
        max_chord_height: f32,
        polyline: &mut Vec<Point>,
    ) {
        let sweep = sweep.radians;
        if self.radius <= 0.0 || sweep == 0.0 || !sweep.is_finite() {
            return;
        }

        let step = self
            .arc_angle_for_chord_height(max_chord_height)
            .max(MIN_ARC_STEP);
        let count = (sweep.abs() / step).ceil().max(1.0) as u32;
        let delta = sweep / count as f32;
        for i in 1..=count {
            polyline.push(self.point_at(Angle::radians(start.radians + delta * i as f32)));
        }
    }

    /// The smallest axis-aligned box containing the circle.
    #[inline]
    pub fn bounding_box(&self) -> Box2D {
        let r = vector(self.radius, self.radius);
        Box2D::new(self.center - r, self.center + r)
    }
}

#[cfg(test)]
fn assert_almost_eq(a: f32, b: f32) {
    if (a - b).abs() > 1e-4 {
        panic!("assert almost equal: {:?} != {:?}", a, b);
    }
}

#[test]
fn tangent_angles_equal_radii() {
    use crate::math::point;
    use crate::utils::positive_angle;

    let a = Circle::new(point(0.0, 0.0), 1.0);
    let b = Circle::new(point(5.0, 0.0), 1.0);
    let angles = a.tangent_angles(&b).unwrap();
    assert_almost_eq(positive_angle(angles.left.radians), PI * 0.5);
    assert_almost_eq(positive_angle(angles.right.radians), PI * 1.5);

    // Traveling the other way swaps the sides.
    let angles = b.tangent_angles(&a).unwrap();
    assert_almost_eq(positive_angle(angles.left.radians), PI * 1.5);
    assert_almost_eq(positive_angle(angles.right.radians), PI * 0.5);
}

#[test]
fn tangent_angles_touch_both_circles() {
    use crate::math::point;

    let a = Circle::new(point(0.0, 0.0), 2.0);
    let b = Circle::new(point(6.0, 1.0), 0.5);
    let angles = a.tangent_angles(&b).unwrap();
    for angle in [angles.left, angles.right] {
        let normal = vector(angle.radians.cos(), angle.radians.sin());
        let pa = a.point_at(angle);
        let pb = b.point_at(angle);
        // The segment between the contact points is perpendicular to the shared normal.
        assert_almost_eq((pb - pa).dot(normal), 0.0);
    }
}

#[test]
fn tangent_angles_contained() {
    use crate::math::point;

    let big = Circle::new(point(0.0, 0.0), 5.0);
    let small = Circle::new(point(1.0, 1.0), 1.0);
    assert!(big.contains(&small));
    assert!(big.tangent_angles(&small).is_none());
    assert!(small.tangent_angles(&big).is_none());
    assert!(big.tangent_angles(&big).is_none());
}

#[test]
fn arc_flattening_tolerance() {
    use crate::math::point;

    let circle = Circle::new(point(1.0, 2.0), 3.0);
    let mut polyline = Vec::new();
    let tolerance = 0.01;
    circle.append_arc_to_polyline(Angle::zero(), Angle::radians(-PI), tolerance, &mut polyline);

    assert!(polyline.len() > 2);
    let last = *polyline.last().unwrap();
    assert_almost_eq(last.x, -2.0);
    assert_almost_eq(last.y, 2.0);

    let mut prev = circle.point_at(Angle::zero());
    for p in &polyline {
        assert_almost_eq((*p - circle.center).length(), 3.0);
        let mid = prev.lerp(*p, 0.5);
        assert!(circle.radius - (mid - circle.center).length() <= tolerance + 1e-4);
        // Negative sweeps go clockwise, through the bottom half of the circle.
        assert!(p.y <= 2.0 + 1e-4);
        prev = *p;
    }

    let mut empty = Vec::new();
    Circle::new(point(0.0, 0.0), 0.0).append_arc_to_polyline(
        Angle::zero(),
        Angle::radians(1.0),
        tolerance,
        &mut empty,
    );
    assert!(empty.is_empty());
}
