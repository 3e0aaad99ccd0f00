//! Various math tools that are mostly useful for the extrusion code.

use crate::math::{vector, Point, Vector};
use arrayvec::ArrayVec;
use core::f32::consts::{PI, TAU};

#[cfg(not(feature = "std"))]
use num_traits::Float;

/// Maps an angle in radians to the equivalent angle in `[0, 2π)`.
#[inline]
pub fn positive_angle(radians: f32) -> f32 {
    let r = radians % TAU;
    let r = if r < 0.0 { r + TAU } else { r };
    // Adding 2π to a tiny negative value can round up to exactly 2π.
    if r >= TAU {
        0.0
    } else {
        r
    }
}

/// Twice the signed area of the triangle `a, b, c`.
///
/// Positive when the triangle winds counter-clockwise.
#[inline]
pub fn orientation(a: Point, b: Point, c: Point) -> f32 {
    (b - a).cross(c - a)
}

/// The vector rotated by a quarter turn counter-clockwise.
#[inline]
pub fn left_normal(v: Vector) -> Vector {
    vector(-v.y, v.x)
}

/// Normalizes `v`, or returns `fallback` if `v` is too short to have a direction.
#[inline]
pub fn normalized_or(v: Vector, fallback: Vector) -> Vector {
    let length = v.length();
    if length > 1e-12 && length.is_finite() {
        v / length
    } else {
        fallback
    }
}

/// Linear interpolation between `a` and `b`.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Inverse of [`lerp`](fn.lerp.html). Returns `None` if `a` and `b` are equal.
#[inline]
pub fn inverse_lerp(a: f32, b: f32, value: f32) -> Option<f32> {
    if a == b {
        return None;
    }

    Some((value - a) / (b - a))
}

/// The real roots of `a x³ + b x² + c x + d`, in no particular order.
///
/// Degenerates to the quadratic and linear equations when the leading
/// coefficients vanish.
pub fn cubic_polynomial_roots(a: f32, b: f32, c: f32, d: f32) -> ArrayVec<f32, 3> {
    let mut result = ArrayVec::new();

    if a.abs() < 1e-6 {
        if b.abs() < 1e-6 {
            if c.abs() >= 1e-6 {
                result.push(-d / c);
            }
            return result;
        }

        let delta = c * c - 4.0 * b * d;
        if delta > 0.0 {
            let sqrt_delta = delta.sqrt();
            result.push((-c - sqrt_delta) / (2.0 * b));
            result.push((-c + sqrt_delta) / (2.0 * b));
        } else if delta.abs() < 1e-6 {
            result.push(-c / (2.0 * b));
        }
        return result;
    }

    let frac_1_3 = 1.0 / 3.0;

    let bn = b / a;
    let cn = c / a;
    let dn = d / a;

    let delta0 = (3.0 * cn - bn * bn) / 9.0;
    let delta1 = (9.0 * bn * cn - 27.0 * dn - 2.0 * bn * bn * bn) / 54.0;
    let delta_01 = delta0 * delta0 * delta0 + delta1 * delta1;

    if delta_01 >= 0.0 {
        let delta_p_sqrt = delta1 + delta_01.sqrt();
        let delta_m_sqrt = delta1 - delta_01.sqrt();

        let s = delta_p_sqrt.signum() * delta_p_sqrt.abs().powf(frac_1_3);
        let t = delta_m_sqrt.signum() * delta_m_sqrt.abs().powf(frac_1_3);

        result.push(-bn * frac_1_3 + (s + t));

        if (s - t).abs() < 1e-5 {
            result.push(-bn * frac_1_3 - (s + t) / 2.0);
        }
    } else {
        let theta = (delta1 / (-delta0 * delta0 * delta0).sqrt()).acos();
        let two_sqrt_delta0 = 2.0 * (-delta0).sqrt();
        result.push(two_sqrt_delta0 * (theta * frac_1_3).cos() - bn * frac_1_3);
        result.push(two_sqrt_delta0 * ((theta + 2.0 * PI) * frac_1_3).cos() - bn * frac_1_3);
        result.push(two_sqrt_delta0 * ((theta + 4.0 * PI) * frac_1_3).cos() - bn * frac_1_3);
    }

    result
}

#[test]
fn positive_angle_range() {
    use core::f32::consts::PI;
    fn assert_almost_eq(a: f32, b: f32) {
        assert!((a - b).abs() < 1e-5, "{} != {}", a, b);
    }

    assert_almost_eq(positive_angle(0.0), 0.0);
    assert_almost_eq(positive_angle(-PI * 0.5), PI * 1.5);
    assert_almost_eq(positive_angle(TAU + 1.0), 1.0);
    assert_almost_eq(positive_angle(-3.0 * TAU - 1.0), TAU - 1.0);
    assert!(positive_angle(-1e-9) < TAU);
}

#[test]
fn orientation_sign() {
    use crate::math::point;
    assert!(orientation(point(0.0, 0.0), point(1.0, 0.0), point(0.0, 1.0)) > 0.0);
    assert!(orientation(point(0.0, 0.0), point(0.0, 1.0), point(1.0, 0.0)) < 0.0);
    assert_eq!(orientation(point(0.0, 0.0), point(1.0, 1.0), point(2.0, 2.0)), 0.0);
}

#[test]
fn cubic_polynomial() {
    fn assert_roots(mut roots: ArrayVec<f32, 3>, expected: &[f32], epsilon: f32) {
        roots.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(roots.len(), expected.len(), "{:?} != {:?}", roots, expected);
        for (root, expected) in roots.iter().zip(expected) {
            assert!((root - expected).abs() <= epsilon, "{:?} != {:?}", roots, expected);
        }
    }

    assert_roots(cubic_polynomial_roots(1.0, -3.0, 2.0, 0.0), &[0.0, 1.0, 2.0], 1e-5);
    assert_roots(cubic_polynomial_roots(-1.0, 1.0, -1.0, 1.0), &[1.0], 1e-5);
    assert_roots(cubic_polynomial_roots(-2.0, 2.0, -1.0, 10.0), &[2.0], 5e-5);
    assert_roots(cubic_polynomial_roots(0.0, 1.0, 0.0, -4.0), &[-2.0, 2.0], 1e-5);
    assert_roots(cubic_polynomial_roots(0.0, 0.0, 2.0, -1.0), &[0.5], 1e-6);
    assert!(cubic_polynomial_roots(0.0, 0.0, 0.0, 1.0).is_empty());
}
