use crate::math::{Box2D, Point, Vector};

#[cfg(not(feature = "std"))]
use num_traits::Float;

/// A linear segment.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct LineSegment {
    pub from: Point,
    pub to: Point,
}

impl LineSegment {
    #[inline]
    pub fn new(from: Point, to: Point) -> Self {
        LineSegment { from, to }
    }

    /// Sample the segment at t (expecting t between 0 and 1).
    #[inline]
    pub fn sample(&self, t: f32) -> Point {
        self.from.lerp(self.to, t)
    }

    /// Returns the vector between this segment's `from` and `to` points.
    #[inline]
    pub fn to_vector(&self) -> Vector {
        self.to - self.from
    }

    /// Computes the length of this segment.
    #[inline]
    pub fn length(&self) -> f32 {
        self.to_vector().length()
    }

    /// Return the smallest rectangle containing this segment.
    #[inline]
    pub fn bounding_box(&self) -> Box2D {
        Box2D {
            min: Point::min(self.from, self.to),
            max: Point::max(self.from, self.to),
        }
    }

    /// Computes the intersection (if any) between this segment and another one.
    ///
    /// The result is provided in the form of the `t` parameter of each
    /// segment. To get the intersection point, sample one of the segments
    /// at the corresponding value.
    ///
    /// Segments sharing an endpoint and parallel segments are not considered
    /// to intersect.
    #[allow(clippy::suspicious_operation_groupings)]
    pub fn intersection_t(&self, other: &Self) -> Option<(f32, f32)> {
        if self.to == other.to
            || self.from == other.from
            || self.from == other.to
            || self.to == other.from
        {
            return None;
        }

        let v1 = self.to_vector();
        let v2 = other.to_vector();

        let v1_cross_v2 = v1.cross(v2);

        if v1_cross_v2 == 0.0 {
            // The segments are parallel
            return None;
        }

        let sign_v1_cross_v2 = v1_cross_v2.signum();
        let abs_v1_cross_v2 = v1_cross_v2.abs();

        let v3 = other.from - self.from;

        // t and u should be divided by v1_cross_v2, but we postpone that to not lose precision.
        // We have to respect the sign of v1_cross_v2 (and therefore t and u) so we apply it now and
        // will use the absolute value of v1_cross_v2 afterwards.
        let t = v3.cross(v2) * sign_v1_cross_v2;
        let u = v3.cross(v1) * sign_v1_cross_v2;

        if t < 0.0 || t > abs_v1_cross_v2 || u < 0.0 || u > abs_v1_cross_v2 {
            return None;
        }

        Some((t / abs_v1_cross_v2, u / abs_v1_cross_v2))
    }

    #[inline]
    pub fn intersection(&self, other: &Self) -> Option<Point> {
        self.intersection_t(other).map(|(t, _)| self.sample(t))
    }

    /// Computes the closest point on this segment to `p`.
    #[inline]
    pub fn closest_point(&self, p: Point) -> Point {
        let v1 = self.to - self.from;
        let square_length = v1.dot(v1);
        if square_length == 0.0 {
            return self.from;
        }
        let v2 = p - self.from;
        let t = (v2.dot(v1) / square_length).max(0.0).min(1.0);

        self.from + v1 * t
    }

    /// Computes the distance between this segment and a point.
    #[inline]
    pub fn distance_to_point(&self, p: Point) -> f32 {
        (self.closest_point(p) - p).length()
    }
}

#[test]
fn intersection_rotated() {
    use crate::math::{point, Rotation, Angle};
    use core::f32::consts::PI;
    let epsilon = 0.0001;
    let count: u32 = 100;

    for i in 0..count {
        for j in 0..count {
            if i % (count / 2) == j % (count / 2) {
                // avoid the colinear case.
                continue;
            }

            let angle1 = Angle::radians(i as f32 / (count as f32) * 2.0 * PI);
            let angle2 = Angle::radians(j as f32 / (count as f32) * 2.0 * PI);

            let l1 = LineSegment {
                from: point(10.0, 0.0),
                to: point(-10.0, 0.0),
            };

            let r1 = Rotation::new(angle1);
            let r2 = Rotation::new(angle2);
            let l1 = LineSegment::new(r1.transform_point(l1.from), r1.transform_point(l1.to));
            let l2 = LineSegment::new(
                r2.transform_point(point(10.0, 0.0)),
                r2.transform_point(point(-10.0, 0.0)),
            );

            let intersection = l1.intersection(&l2).unwrap();

            assert!(intersection.x.abs() <= epsilon);
            assert!(intersection.y.abs() <= epsilon);
        }
    }
}

#[test]
fn intersection_touching() {
    use crate::math::point;

    let l1 = LineSegment::new(point(0.0, 0.0), point(10.0, 10.0));
    let l2 = LineSegment::new(point(10.0, 10.0), point(10.0, 0.0));

    assert!(l1.intersection(&l2).is_none());
    assert!(l2.intersection(&l1).is_none());

    let l3 = LineSegment::new(point(0.0, 5.0), point(10.0, 5.0));
    let (t, u) = l1.intersection_t(&l3).unwrap();
    assert!((t - 0.5).abs() < 1e-6);
    assert!((u - 0.5).abs() < 1e-6);
}

#[test]
fn closest_point_on_segment() {
    use crate::math::point;

    let segment = LineSegment::new(point(0.0, 0.0), point(4.0, 0.0));
    assert_eq!(segment.closest_point(point(2.0, 3.0)), point(2.0, 0.0));
    assert_eq!(segment.closest_point(point(-2.0, 1.0)), point(0.0, 0.0));
    assert_eq!(segment.distance_to_point(point(6.0, 0.0)), 2.0);
    let degenerate = LineSegment::new(point(1.0, 1.0), point(1.0, 1.0));
    assert_eq!(degenerate.closest_point(point(3.0, 3.0)), point(1.0, 1.0));
}
