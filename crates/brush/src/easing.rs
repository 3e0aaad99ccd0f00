//! Response curves mapping a behavior value in [0, 1] to another value.
//!
//! The curves follow the CSS easing functions.

use crate::geom::utils::cubic_polynomial_roots;
use crate::math::Point;
use alloc::vec::Vec;

#[cfg(not(feature = "std"))]
use num_traits::Float;

/// The named CSS easing functions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum PredefinedEasing {
    Linear,
    Ease,
    EaseIn,
    EaseOut,
    EaseInOut,
    StepStart,
    StepEnd,
}

/// Where the jumps of a `Steps` easing happen.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum StepPosition {
    JumpEnd,
    JumpStart,
    JumpNone,
    JumpBoth,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum EasingFunction {
    Predefined(PredefinedEasing),
    /// A cubic bézier curve from (0, 0) to (1, 1). `x1` and `x2` must be in [0, 1].
    CubicBezier { x1: f32, y1: f32, x2: f32, y2: f32 },
    /// A piecewise linear function through (0, 0), `points` and (1, 1).
    ///
    /// The x coordinates of the points must be in [0, 1] and non-decreasing.
    Linear { points: Vec<Point> },
    Steps {
        step_count: u32,
        step_position: StepPosition,
    },
}

impl Default for EasingFunction {
    fn default() -> Self {
        EasingFunction::Predefined(PredefinedEasing::Linear)
    }
}

impl EasingFunction {
    /// Checks that the parameters describe a valid curve.
    pub fn is_valid(&self) -> bool {
        match *self {
            EasingFunction::Predefined(_) => true,
            EasingFunction::CubicBezier { x1, y1, x2, y2 } => {
                x1.is_finite()
                    && y1.is_finite()
                    && x2.is_finite()
                    && y2.is_finite()
                    && (0.0..=1.0).contains(&x1)
                    && (0.0..=1.0).contains(&x2)
            }
            EasingFunction::Linear { ref points } => {
                let mut prev_x = 0.0;
                for p in points {
                    if !p.x.is_finite() || !p.y.is_finite() || p.x < prev_x || p.x > 1.0 {
                        return false;
                    }
                    prev_x = p.x;
                }
                true
            }
            EasingFunction::Steps {
                step_count,
                step_position,
            } => step_count > 1 || (step_count == 1 && step_position != StepPosition::JumpNone),
        }
    }

    pub fn evaluate(&self, x: f32) -> f32 {
        match *self {
            EasingFunction::Predefined(easing) => match easing {
                PredefinedEasing::Linear => x,
                PredefinedEasing::Ease => cubic_bezier(0.25, 0.1, 0.25, 1.0, x),
                PredefinedEasing::EaseIn => cubic_bezier(0.42, 0.0, 1.0, 1.0, x),
                PredefinedEasing::EaseOut => cubic_bezier(0.0, 0.0, 0.58, 1.0, x),
                PredefinedEasing::EaseInOut => cubic_bezier(0.42, 0.0, 0.58, 1.0, x),
                PredefinedEasing::StepStart => steps(1, StepPosition::JumpStart, x),
                PredefinedEasing::StepEnd => steps(1, StepPosition::JumpEnd, x),
            },
            EasingFunction::CubicBezier { x1, y1, x2, y2 } => cubic_bezier(x1, y1, x2, y2, x),
            EasingFunction::Linear { ref points } => piecewise_linear(points, x),
            EasingFunction::Steps {
                step_count,
                step_position,
            } => steps(step_count, step_position, x),
        }
    }
}

/// A cubic bézier curve from (0, 0) to (1, 1) with control points (x1, y1) and
/// (x2, y2), evaluated at the parameter whose x coordinate is `x`.
fn cubic_bezier(x1: f32, y1: f32, x2: f32, y2: f32, x: f32) -> f32 {
    // Outside of [0, 1] the curve is extended along its end tangents.
    if x <= 0.0 {
        let slope = if x1 > 0.0 {
            y1 / x1
        } else if x2 > 0.0 {
            y2 / x2
        } else {
            0.0
        };
        return slope * x;
    }
    if x >= 1.0 {
        let slope = if x2 < 1.0 {
            (y2 - 1.0) / (x2 - 1.0)
        } else if x1 < 1.0 {
            (y1 - 1.0) / (x1 - 1.0)
        } else {
            0.0
        };
        return 1.0 + slope * (x - 1.0);
    }

    let t = solve_t_for_x(x1, x2, x);
    let one_t = 1.0 - t;
    3.0 * one_t * one_t * t * y1 + 3.0 * one_t * t * t * y2 + t * t * t
}

/// The parameter of the curve at `x`.
///
/// The x coordinate is monotonic when both control points are in [0, 1], so a
/// single root lies in the unit interval.
fn solve_t_for_x(x1: f32, x2: f32, x: f32) -> f32 {
    let a = 3.0 * x1 - 3.0 * x2 + 1.0;
    let b = -6.0 * x1 + 3.0 * x2;
    let c = 3.0 * x1;
    let d = -x;

    let mut best = x;
    let mut best_error = f32::MAX;
    for root in cubic_polynomial_roots(a, b, c, d) {
        let error = (root - root.max(0.0).min(1.0)).abs();
        if error < best_error {
            best = root.max(0.0).min(1.0);
            best_error = error;
        }
    }

    best
}

fn piecewise_linear(points: &[Point], x: f32) -> f32 {
    let mut prev = Point::new(0.0, 0.0);
    for p in points.iter().chain(core::iter::once(&Point::new(1.0, 1.0))) {
        if x < p.x {
            if p.x == prev.x {
                return prev.y;
            }
            let t = (x - prev.x) / (p.x - prev.x);
            return prev.y + (p.y - prev.y) * t.max(0.0);
        }
        prev = *p;
    }

    1.0
}

fn steps(step_count: u32, step_position: StepPosition, x: f32) -> f32 {
    if step_count == 0 {
        return x;
    }

    let n = step_count as f32;
    let jumps = match step_position {
        StepPosition::JumpEnd | StepPosition::JumpStart => n,
        StepPosition::JumpNone => n - 1.0,
        StepPosition::JumpBoth => n + 1.0,
    };
    if jumps <= 0.0 {
        return x;
    }

    let x = x.max(0.0).min(1.0);
    let mut step = (x * n).floor();
    if step_position == StepPosition::JumpStart || step_position == StepPosition::JumpBoth {
        step += 1.0;
    }
    // The input reaches the last step exactly at 1.
    if x >= 1.0 {
        step = jumps;
    }

    (step / jumps).min(1.0)
}

#[cfg(test)]
fn assert_almost_eq(a: f32, b: f32) {
    if (a - b).abs() > 1e-3 {
        panic!("assert almost equal: {:?} != {:?}", a, b);
    }
}

#[test]
fn predefined_end_points() {
    for easing in &[
        PredefinedEasing::Linear,
        PredefinedEasing::Ease,
        PredefinedEasing::EaseIn,
        PredefinedEasing::EaseOut,
        PredefinedEasing::EaseInOut,
    ] {
        let f = EasingFunction::Predefined(*easing);
        assert_almost_eq(f.evaluate(0.0), 0.0);
        assert_almost_eq(f.evaluate(1.0), 1.0);
    }

    let ease_in_out = EasingFunction::Predefined(PredefinedEasing::EaseInOut);
    assert_almost_eq(ease_in_out.evaluate(0.5), 0.5);
    assert!(ease_in_out.evaluate(0.25) < 0.25);
    assert!(ease_in_out.evaluate(0.75) > 0.75);
}

#[test]
fn cubic_bezier_matches_linear() {
    let f = EasingFunction::CubicBezier {
        x1: 0.25,
        y1: 0.25,
        x2: 0.75,
        y2: 0.75,
    };
    for i in 0..=10 {
        let x = i as f32 / 10.0;
        assert_almost_eq(f.evaluate(x), x);
    }
}

#[test]
fn piecewise_linear_points() {
    let f = EasingFunction::Linear {
        points: alloc::vec![Point::new(0.5, 0.0)],
    };
    assert!(f.is_valid());
    assert_almost_eq(f.evaluate(0.25), 0.0);
    assert_almost_eq(f.evaluate(0.75), 0.5);
    assert_almost_eq(f.evaluate(1.0), 1.0);

    let invalid = EasingFunction::Linear {
        points: alloc::vec![Point::new(0.5, 0.0), Point::new(0.25, 0.0)],
    };
    assert!(!invalid.is_valid());
}

#[test]
fn step_functions() {
    let jump_end = EasingFunction::Steps {
        step_count: 4,
        step_position: StepPosition::JumpEnd,
    };
    assert_almost_eq(jump_end.evaluate(0.0), 0.0);
    assert_almost_eq(jump_end.evaluate(0.3), 0.25);
    assert_almost_eq(jump_end.evaluate(1.0), 1.0);

    let jump_start = EasingFunction::Steps {
        step_count: 4,
        step_position: StepPosition::JumpStart,
    };
    assert_almost_eq(jump_start.evaluate(0.0), 0.25);
    assert_almost_eq(jump_start.evaluate(0.3), 0.5);

    let jump_none = EasingFunction::Steps {
        step_count: 3,
        step_position: StepPosition::JumpNone,
    };
    assert_almost_eq(jump_none.evaluate(0.0), 0.0);
    assert_almost_eq(jump_none.evaluate(0.5), 0.5);
    assert_almost_eq(jump_none.evaluate(1.0), 1.0);

    assert_almost_eq(
        EasingFunction::Predefined(PredefinedEasing::StepStart).evaluate(0.1),
        1.0,
    );
    assert_almost_eq(
        EasingFunction::Predefined(PredefinedEasing::StepEnd).evaluate(0.9),
        0.0,
    );
}

#[test]
fn cubic_bezier_follows_the_curve() {
    // Points of the ease curve, from its parametric form.
    let (x1, y1, x2, y2) = (0.25, 0.1, 0.25, 1.0);
    let f = EasingFunction::CubicBezier { x1, y1, x2, y2 };
    for i in 1..10 {
        let t = i as f32 / 10.0;
        let one_t = 1.0 - t;
        let x = 3.0 * one_t * one_t * t * x1 + 3.0 * one_t * t * t * x2 + t * t * t;
        let y = 3.0 * one_t * one_t * t * y1 + 3.0 * one_t * t * t * y2 + t * t * t;
        assert_almost_eq(f.evaluate(x), y);
    }
}
