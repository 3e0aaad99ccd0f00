//! Brush tip footprints and the outer tangents between consecutive footprints.
//!
//! ## Overview
//!
//! A [`BrushTipShape`](struct.BrushTipShape.html) approximates a brush tip pose as
//! the convex hull of one to four circles of equal radius:
//!
//! - one circle for round tips (and for zero-size poses),
//! - two circles for stadiums,
//! - three circles for fully pinched tips,
//! - four circles for rounded rectangles and trapezoids.
//!
//! The circles are listed in clockwise order. Walking clockwise around the
//! outline, each circle contributes an arc and consecutive circles are connected
//! by straight edges. A point of the outline is described by the index of the
//! circle it lies on and by the angle of the outward normal at that point, which
//! is the parametrization used by the perimeter walks in this module.
//!
//! ## Extrusion points
//!
//! Extruding a stroke means connecting consecutive footprints with their outer
//! tangent lines. The `append_*_extrusion_points` functions produce, for one
//! footprint, the polylines followed by the left and right sides of the stroke
//! between the incoming and outgoing tangents, in the direction of travel.

use crate::brush::BrushTipState;
use crate::geom::arrayvec::ArrayVec;
use crate::geom::utils::{normalized_or, orientation, positive_angle};
use crate::geom::{Circle, LineSegment};
use crate::math::{vector, Angle, Box2D, Point, Rotation, Vector};
use alloc::vec::Vec;
use core::f32::consts::{FRAC_PI_2, PI, TAU};

#[cfg(not(feature = "std"))]
use num_traits::Float;

/// Angles closer than this are considered equal, in radians.
const ANGLE_EPSILON: f32 = 1e-4;

/// A pair of circle indices, one in each of two shapes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct IndexPair {
    pub first: usize,
    pub second: usize,
}

/// The circles touched by the left and right outer tangents between two shapes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TangentCircleIndices {
    pub left: IndexPair,
    pub right: IndexPair,
}

/// Circle indices and outward normal angles of the two outer tangents.
#[derive(Copy, Clone, Debug)]
struct Tangents {
    indices: TangentCircleIndices,
    left: f32,
    right: f32,
}

#[derive(Copy, Clone, Debug, PartialEq)]
enum Winding {
    Clockwise,
    CounterClockwise,
}

/// Left and right polylines produced for one footprint.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExtrusionPoints {
    pub left: Vec<Point>,
    pub right: Vec<Point>,
}

impl ExtrusionPoints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.left.clear();
        self.right.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty() && self.right.is_empty()
    }
}

/// The footprint of a brush tip pose.
#[derive(Clone, Debug, PartialEq)]
pub struct BrushTipShape {
    center: Point,
    circles: ArrayVec<Circle, 4>,
    /// Outward normal angle of the edge from each circle to the next one, in [0, 2π).
    exit_angles: ArrayVec<f32, 4>,
}

impl BrushTipShape {
    /// Builds the footprint of a pose.
    ///
    /// Corner radii and distances between circles smaller than
    /// `min_radius_and_separation` collapse to zero.
    pub fn new(state: &BrushTipState, min_radius_and_separation: f32) -> Self {
        let threshold = min_radius_and_separation.max(0.0);
        let half_width = (state.width * 0.5).max(0.0);
        let half_height = (state.height * 0.5).max(0.0);
        let mut radius = clamp01(state.percent_radius) * half_width.min(half_height);
        if radius < threshold {
            radius = 0.0;
        }

        let bottom_x = half_width - radius;
        let top_x = bottom_x * (1.0 - clamp01(state.pinch));
        let y = half_height - radius;

        // Clockwise, starting from the top right corner.
        let mut offsets: ArrayVec<Vector, 4> = ArrayVec::new();
        if y < threshold {
            if bottom_x < threshold {
                offsets.push(vector(0.0, 0.0));
            } else {
                offsets.push(vector(bottom_x, 0.0));
                offsets.push(vector(-bottom_x, 0.0));
            }
        } else {
            let top_collapsed = top_x < threshold;
            let bottom_collapsed = bottom_x < threshold;
            offsets.push(vector(if top_collapsed { 0.0 } else { top_x }, y));
            offsets.push(vector(if bottom_collapsed { 0.0 } else { bottom_x }, -y));
            if !bottom_collapsed {
                offsets.push(vector(-bottom_x, -y));
            }
            if !top_collapsed {
                offsets.push(vector(-top_x, y));
            }
        }

        // Slant, then rotation, then translation.
        let slant = state.slant.radians.max(-FRAC_PI_2).min(FRAC_PI_2);
        let (sin, cos) = slant.sin_cos();
        let rotation = Rotation::new(state.rotation);
        let mut circles = ArrayVec::new();
        for offset in offsets {
            let slanted = vector(offset.x - offset.y * sin, offset.y * cos);
            circles.push(Circle::new(
                state.position + rotation.transform_vector(slanted),
                radius,
            ));
        }
        remove_redundant_circles(&mut circles, threshold);

        let mut exit_angles = ArrayVec::new();
        let n = circles.len();
        if n > 1 {
            for i in 0..n {
                let d = circles[(i + 1) % n].center - circles[i].center;
                exit_angles.push(positive_angle(d.y.atan2(d.x) + FRAC_PI_2));
            }
        }

        BrushTipShape {
            center: state.position,
            circles,
            exit_angles,
        }
    }

    #[inline]
    pub fn center(&self) -> Point {
        self.center
    }

    /// The perimeter circles in clockwise order.
    #[inline]
    pub fn circles(&self) -> &[Circle] {
        &self.circles
    }

    /// The smallest rectangle containing the footprint.
    pub fn bounds(&self) -> Box2D {
        let mut bounds = self.circles[0].bounding_box();
        for circle in &self.circles[1..] {
            bounds = bounds.union(&circle.bounding_box());
        }

        bounds
    }

    /// The largest of the width and height of the bounds.
    pub fn max_dimension(&self) -> f32 {
        let size = self.bounds().size();
        size.width.max(size.height)
    }

    /// Returns true if `other` lies entirely inside of this footprint.
    pub fn contains(&self, other: &BrushTipShape) -> bool {
        let radius = self.circles[0].radius;
        let tolerance = 1e-5 * self.max_dimension().max(1.0);
        other.circles.iter().all(|circle| {
            self.signed_distance_to_centers(circle.center) + circle.radius <= radius + tolerance
        })
    }

    /// Signed distance from `p` to the polygon formed by the circle centers,
    /// negative inside of it.
    fn signed_distance_to_centers(&self, p: Point) -> f32 {
        let c = &self.circles;
        match c.len() {
            1 => (p - c[0].center).length(),
            2 => LineSegment::new(c[0].center, c[1].center).distance_to_point(p),
            n => {
                let mut inside = true;
                let mut distance = f32::MAX;
                for i in 0..n {
                    let edge = LineSegment::new(c[i].center, c[(i + 1) % n].center);
                    if orientation(edge.from, edge.to, p) > 0.0 {
                        inside = false;
                    }
                    distance = distance.min(edge.distance_to_point(p));
                }
                if inside {
                    -distance
                } else {
                    distance
                }
            }
        }
    }

    /// Finds the circles touched by the left and right outer tangents going from
    /// `first` to `second`.
    ///
    /// This is an exhaustive search over every pair of circles, in place of a
    /// gift-wrapping march around both outlines, and it selects the same pairs:
    /// the selected tangent is the one with every circle of both shapes behind it,
    /// or the one that comes closest to it. Ties go to the lowest indices.
    ///
    /// Returns `None` if no pair of circles has outer tangents, which only happens
    /// when one of the shapes contains the other.
    pub fn tangent_circle_indices(
        first: &BrushTipShape,
        second: &BrushTipShape,
    ) -> Option<TangentCircleIndices> {
        tangents(first, second).map(|t| t.indices)
    }

    /// Appends the points of the stroke outline around `middle`, between the
    /// tangents coming from `start` and the tangents going to `end`.
    ///
    /// On the outer side of a turn the outline follows the perimeter of `middle`.
    /// On the inner side it jumps from one tangent point to the other, leaving the
    /// overlap to the self-intersection handling of the extruder.
    ///
    /// Returns false and appends nothing if a pair of shapes has no tangents.
    pub fn append_turn_extrusion_points(
        start: &BrushTipShape,
        middle: &BrushTipShape,
        end: &BrushTipShape,
        max_chord_height: f32,
        points: &mut ExtrusionPoints,
    ) -> bool {
        let (incoming, outgoing) = match (tangents(start, middle), tangents(middle, end)) {
            (Some(incoming), Some(outgoing)) => (incoming, outgoing),
            _ => return false,
        };

        let (a_in, j_in) = (incoming.left, incoming.indices.left.second);
        let (a_out, j_out) = (outgoing.left, outgoing.indices.left.first);
        let sweep = snap_full_turn(positive_angle(a_in - a_out));
        if sweep <= PI {
            middle.append_perimeter(
                j_in,
                a_in,
                sweep,
                j_out,
                Winding::Clockwise,
                max_chord_height,
                &mut points.left,
            );
        } else {
            points.left.push(middle.point_at(j_in, a_in));
            points.left.push(middle.point_at(j_out, a_out));
        }

        let (a_in, j_in) = (incoming.right, incoming.indices.right.second);
        let (a_out, j_out) = (outgoing.right, outgoing.indices.right.first);
        let sweep = snap_full_turn(positive_angle(a_out - a_in));
        if sweep <= PI {
            middle.append_perimeter(
                j_in,
                a_in,
                sweep,
                j_out,
                Winding::CounterClockwise,
                max_chord_height,
                &mut points.right,
            );
        } else {
            points.right.push(middle.point_at(j_in, a_in));
            points.right.push(middle.point_at(j_out, a_out));
        }

        true
    }

    /// Appends the points of the rear half of `first`, between the right and left
    /// tangents going to `second`.
    ///
    /// Both sides start at the rearmost point.
    pub fn append_startcap_extrusion_points(
        first: &BrushTipShape,
        second: &BrushTipShape,
        max_chord_height: f32,
        points: &mut ExtrusionPoints,
    ) -> bool {
        let t = match tangents(first, second) {
            Some(t) => t,
            None => return false,
        };

        let mut polyline = Vec::new();
        first.append_perimeter(
            t.indices.right.first,
            t.right,
            positive_angle(t.right - t.left),
            t.indices.left.first,
            Winding::Clockwise,
            max_chord_height,
            &mut polyline,
        );

        let direction = normalized_or(second.center - first.center, vector(1.0, 0.0));
        let split = extreme_index(&polyline, first.center, direction, false);
        points.right.extend(polyline[..=split].iter().rev());
        points.left.extend_from_slice(&polyline[split..]);

        true
    }

    /// Appends the points of the front half of `second`, between the left and right
    /// tangents coming from `first`.
    ///
    /// Both sides end at the frontmost point.
    pub fn append_endcap_extrusion_points(
        first: &BrushTipShape,
        second: &BrushTipShape,
        max_chord_height: f32,
        points: &mut ExtrusionPoints,
    ) -> bool {
        let t = match tangents(first, second) {
            Some(t) => t,
            None => return false,
        };

        let mut polyline = Vec::new();
        second.append_perimeter(
            t.indices.left.second,
            t.left,
            positive_angle(t.left - t.right),
            t.indices.right.second,
            Winding::Clockwise,
            max_chord_height,
            &mut polyline,
        );

        let direction = normalized_or(second.center - first.center, vector(1.0, 0.0));
        let split = extreme_index(&polyline, second.center, direction, true);
        points.left.extend_from_slice(&polyline[..=split]);
        points.right.extend(polyline[split..].iter().rev());

        true
    }

    /// Appends the whole outline of a shape, split into left and right halves
    /// relative to `forward`.
    ///
    /// Both sides start at the rearmost point and end at the frontmost one.
    pub fn append_whole_shape_extrusion_points(
        shape: &BrushTipShape,
        forward: Vector,
        max_chord_height: f32,
        points: &mut ExtrusionPoints,
    ) {
        let forward = normalized_or(forward, vector(1.0, 0.0));
        let front = positive_angle(forward.y.atan2(forward.x));
        let rear = positive_angle(front + PI);
        let rear_circle = shape.support_circle(rear);
        let front_circle = shape.support_circle(front);

        shape.append_perimeter(
            rear_circle,
            rear,
            PI,
            front_circle,
            Winding::Clockwise,
            max_chord_height,
            &mut points.left,
        );
        shape.append_perimeter(
            rear_circle,
            rear,
            PI,
            front_circle,
            Winding::CounterClockwise,
            max_chord_height,
            &mut points.right,
        );
    }

    #[inline]
    fn point_at(&self, circle: usize, angle: f32) -> Point {
        self.circles[circle].point_at(Angle::radians(angle))
    }

    fn entry_angle(&self, circle: usize) -> f32 {
        let n = self.exit_angles.len();
        self.exit_angles[(circle + n - 1) % n]
    }

    /// The range of normal angles covered by the arc of a circle.
    fn span(&self, circle: usize) -> f32 {
        if self.circles.len() == 1 {
            return TAU;
        }
        positive_angle(self.entry_angle(circle) - self.exit_angles[circle])
    }

    /// The circle on which the outline's normal points toward `angle`.
    fn support_circle(&self, angle: f32) -> usize {
        if self.circles.len() == 1 {
            return 0;
        }
        (0..self.circles.len())
            .find(|&i| positive_angle(self.entry_angle(i) - angle) <= self.span(i) + ANGLE_EPSILON)
            .unwrap_or(0)
    }

    /// Moves `angle` to the closest angle covered by the arc of `circle`.
    fn clamp_to_span(&self, circle: usize, angle: f32) -> f32 {
        if self.circles.len() == 1 {
            return angle;
        }
        let entry = self.entry_angle(circle);
        let span = self.span(circle);
        let from_entry = positive_angle(entry - angle);
        if from_entry <= span {
            return angle;
        }
        if from_entry - span < TAU - from_entry {
            self.exit_angles[circle]
        } else {
            entry
        }
    }

    /// Walks the outline from the point of normal `start_angle` on `start_circle`
    /// by `sweep` radians, ending on `end_circle`.
    ///
    /// Every point of the walk is appended, including the first one.
    fn append_perimeter(
        &self,
        start_circle: usize,
        start_angle: f32,
        sweep: f32,
        end_circle: usize,
        winding: Winding,
        max_chord_height: f32,
        output: &mut Vec<Point>,
    ) {
        let n = self.circles.len();
        let sign = match winding {
            Winding::Clockwise => -1.0,
            Winding::CounterClockwise => 1.0,
        };
        let mut circle = start_circle;
        let mut angle = self.clamp_to_span(circle, start_angle);
        let mut remaining = sweep.max(0.0);
        output.push(self.point_at(circle, angle));

        for _ in 0..=n {
            let (room, next, edge_angle) = if n == 1 {
                (f32::INFINITY, circle, angle)
            } else {
                let (limit, next) = match winding {
                    Winding::Clockwise => (self.exit_angles[circle], (circle + 1) % n),
                    Winding::CounterClockwise => (self.entry_angle(circle), (circle + n - 1) % n),
                };
                let mut room = positive_angle(sign * (limit - angle));
                if room > self.span(circle) + ANGLE_EPSILON {
                    // Rounding put the angle a hair past the limit.
                    room = 0.0;
                }
                (room, next, limit)
            };

            let ends_here = remaining < room - ANGLE_EPSILON
                || (remaining <= room + ANGLE_EPSILON && circle == end_circle);
            if ends_here {
                self.circles[circle].append_arc_to_polyline(
                    Angle::radians(angle),
                    Angle::radians(sign * remaining),
                    max_chord_height,
                    output,
                );
                return;
            }

            self.circles[circle].append_arc_to_polyline(
                Angle::radians(angle),
                Angle::radians(sign * room),
                max_chord_height,
                output,
            );
            output.push(self.point_at(next, edge_angle));

            if remaining <= room + ANGLE_EPSILON {
                return;
            }

            remaining -= room;
            circle = next;
            angle = edge_angle;
        }
    }
}

fn clamp01(value: f32) -> f32 {
    value.max(0.0).min(1.0)
}

/// Sweeps a hair short of a full turn are straight continuations.
fn snap_full_turn(sweep: f32) -> f32 {
    if sweep > TAU - ANGLE_EPSILON {
        0.0
    } else {
        sweep
    }
}

/// Index of the point with the smallest (or largest) projection on `direction`.
/// Ties go to the first point.
fn extreme_index(points: &[Point], origin: Point, direction: Vector, largest: bool) -> usize {
    let mut best = 0;
    let mut best_projection = (points[0] - origin).dot(direction);
    for (i, p) in points.iter().enumerate().skip(1) {
        let projection = (*p - origin).dot(direction);
        let better = if largest {
            projection > best_projection
        } else {
            projection < best_projection
        };
        if better {
            best = i;
            best_projection = projection;
        }
    }

    best
}

/// Removes coincident circles and circles lying on the straight edge between
/// their neighbors.
fn remove_redundant_circles(circles: &mut ArrayVec<Circle, 4>, threshold: f32) {
    let mut i = 0;
    while circles.len() > 1 && i < circles.len() {
        let next = (i + 1) % circles.len();
        if (circles[next].center - circles[i].center).length() <= threshold {
            circles.remove(next);
        } else {
            i += 1;
        }
    }

    let mut i = 0;
    while circles.len() > 2 && i < circles.len() {
        let n = circles.len();
        let prev = circles[(i + n - 1) % n].center;
        let current = circles[i].center;
        let next = circles[(i + 1) % n].center;
        let scale = (current - prev).length() * (next - current).length();
        let collinear = orientation(prev, current, next).abs() <= 1e-4 * scale;
        if collinear && (current - prev).dot(next - current) >= 0.0 {
            circles.remove(i);
            i = 0;
        } else {
            i += 1;
        }
    }
}

/// How far the circles of both shapes reach past the tangent line of normal
/// `angle` touching `contact`. Zero when the line supports both shapes.
fn support_violation(
    angle: f32,
    contact: &Circle,
    first: &BrushTipShape,
    second: &BrushTipShape,
) -> f32 {
    let normal = vector(angle.cos(), angle.sin());
    let support = normal.dot(contact.center.to_vector()) + contact.radius;
    first
        .circles
        .iter()
        .chain(second.circles.iter())
        .map(|c| normal.dot(c.center.to_vector()) + c.radius - support)
        .fold(f32::MIN, f32::max)
}

#[derive(Copy, Clone)]
struct Candidate {
    pair: IndexPair,
    angle: f32,
    violation: f32,
}

fn consider(best: &mut Option<Candidate>, candidate: Candidate, tolerance: f32) {
    match best {
        Some(current) if candidate.violation >= current.violation - tolerance => {}
        _ => *best = Some(candidate),
    }
}

fn tangents(first: &BrushTipShape, second: &BrushTipShape) -> Option<Tangents> {
    let tolerance = 1e-5 * first.max_dimension().max(second.max_dimension()).max(1.0);
    let mut left = None;
    let mut right = None;
    for (i, a) in first.circles.iter().enumerate() {
        for (j, b) in second.circles.iter().enumerate() {
            let angles = match a.tangent_angles(b) {
                Some(angles) => angles,
                None => continue,
            };
            let pair = IndexPair {
                first: i,
                second: j,
            };
            let left_angle = positive_angle(angles.left.radians);
            consider(
                &mut left,
                Candidate {
                    pair,
                    angle: left_angle,
                    violation: support_violation(left_angle, a, first, second),
                },
                tolerance,
            );
            let right_angle = positive_angle(angles.right.radians);
            consider(
                &mut right,
                Candidate {
                    pair,
                    angle: right_angle,
                    violation: support_violation(right_angle, a, first, second),
                },
                tolerance,
            );
        }
    }

    match (left, right) {
        (Some(left), Some(right)) => Some(Tangents {
            indices: TangentCircleIndices {
                left: left.pair,
                right: right.pair,
            },
            left: left.angle,
            right: right.angle,
        }),
        _ => None,
    }
}

#[cfg(test)]
use crate::math::point;

#[cfg(test)]
fn assert_point_near(a: Point, b: Point) {
    if (a - b).length() > 1e-3 {
        panic!("assert point near: {:?} != {:?}", a, b);
    }
}

#[cfg(test)]
fn rounded_rect(x: f32, y: f32, width: f32, height: f32, percent_radius: f32) -> BrushTipState {
    BrushTipState {
        position: point(x, y),
        width,
        height,
        percent_radius,
        ..Default::default()
    }
}

#[test]
fn circle_shape() {
    let shape = BrushTipShape::new(&BrushTipState::circle(point(1.0, 2.0), 2.0), 0.01);
    assert_eq!(shape.circles(), &[Circle::new(point(1.0, 2.0), 1.0)]);
    assert_eq!(shape.center(), point(1.0, 2.0));
    assert_eq!(
        shape.bounds(),
        Box2D::new(point(0.0, 1.0), point(2.0, 3.0))
    );
    assert_eq!(shape.max_dimension(), 2.0);
}

#[test]
fn rectangle_circles_are_clockwise() {
    let shape = BrushTipShape::new(&rounded_rect(0.0, 0.0, 4.0, 2.0, 0.0), 0.01);
    let centers: Vec<Point> = shape.circles().iter().map(|c| c.center).collect();
    assert_eq!(
        centers,
        [
            point(2.0, 1.0),
            point(2.0, -1.0),
            point(-2.0, -1.0),
            point(-2.0, 1.0),
        ]
    );
    assert!(shape.circles().iter().all(|c| c.radius == 0.0));
}

#[test]
fn stadium_and_pinched_shapes() {
    let stadium = BrushTipShape::new(&rounded_rect(0.0, 0.0, 4.0, 2.0, 1.0), 0.01);
    assert_eq!(
        stadium.circles(),
        &[
            Circle::new(point(1.0, 0.0), 1.0),
            Circle::new(point(-1.0, 0.0), 1.0),
        ]
    );

    let pinched = BrushTipShape::new(
        &BrushTipState {
            pinch: 1.0,
            ..rounded_rect(0.0, 0.0, 4.0, 4.0, 0.5)
        },
        0.01,
    );
    let centers: Vec<Point> = pinched.circles().iter().map(|c| c.center).collect();
    assert_eq!(
        centers,
        [point(0.0, 1.0), point(1.0, -1.0), point(-1.0, -1.0)]
    );
}

#[test]
fn rotated_stadium() {
    let shape = BrushTipShape::new(
        &BrushTipState {
            rotation: Angle::radians(FRAC_PI_2),
            ..rounded_rect(5.0, 0.0, 4.0, 2.0, 1.0)
        },
        0.01,
    );
    assert_eq!(shape.circles().len(), 2);
    assert_point_near(shape.circles()[0].center, point(5.0, 1.0));
    assert_point_near(shape.circles()[1].center, point(5.0, -1.0));
}

#[test]
fn fully_slanted_rectangle_collapses_to_a_segment() {
    let shape = BrushTipShape::new(
        &BrushTipState {
            slant: Angle::radians(FRAC_PI_2),
            ..rounded_rect(0.0, 0.0, 4.0, 2.0, 0.0)
        },
        0.01,
    );
    assert_eq!(shape.circles().len(), 2);
    let mut xs: Vec<f32> = shape.circles().iter().map(|c| c.center.x).collect();
    xs.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert!((xs[0] + 3.0).abs() < 1e-3, "{:?}", xs);
    assert!((xs[1] - 3.0).abs() < 1e-3, "{:?}", xs);
}

#[test]
fn containment() {
    let big = BrushTipShape::new(&BrushTipState::circle(point(0.0, 0.0), 4.0), 0.01);
    let small = BrushTipShape::new(&BrushTipState::circle(point(0.5, 0.0), 1.0), 0.01);
    let far = BrushTipShape::new(&BrushTipState::circle(point(3.0, 0.0), 1.0), 0.01);
    let square = BrushTipShape::new(&rounded_rect(0.0, 0.0, 4.0, 4.0, 0.0), 0.01);

    assert!(big.contains(&small));
    assert!(big.contains(&big));
    assert!(!small.contains(&big));
    assert!(!big.contains(&far));
    assert!(square.contains(&small));
    assert!(!small.contains(&square));
    assert!(!big.contains(&square));
}

#[test]
fn tangent_indices_between_squares() {
    let a = BrushTipShape::new(&rounded_rect(0.0, 0.0, 4.0, 2.0, 0.0), 0.01);
    let b = BrushTipShape::new(&rounded_rect(10.0, 0.0, 4.0, 2.0, 0.0), 0.01);
    let indices = BrushTipShape::tangent_circle_indices(&a, &b).unwrap();
    assert_eq!(indices.left, IndexPair { first: 0, second: 0 });
    assert_eq!(indices.right, IndexPair { first: 1, second: 1 });

    let big = BrushTipShape::new(&BrushTipState::circle(point(0.0, 0.0), 8.0), 0.01);
    let inside = BrushTipShape::new(&BrushTipState::circle(point(1.0, 0.0), 1.0), 0.01);
    assert_eq!(BrushTipShape::tangent_circle_indices(&big, &inside), None);
}

#[test]
fn whole_circle_extrusion() {
    let shape = BrushTipShape::new(&BrushTipState::circle(point(0.0, 0.0), 2.0), 0.01);
    let mut points = ExtrusionPoints::new();
    BrushTipShape::append_whole_shape_extrusion_points(&shape, vector(1.0, 0.0), 0.01, &mut points);

    assert!(points.left.len() > 4);
    assert_eq!(points.left.len(), points.right.len());
    assert_point_near(points.left[0], point(-1.0, 0.0));
    assert_point_near(points.right[0], point(-1.0, 0.0));
    assert_point_near(*points.left.last().unwrap(), point(1.0, 0.0));
    assert_point_near(*points.right.last().unwrap(), point(1.0, 0.0));
    for p in &points.left {
        assert!(p.y >= -1e-4);
        assert!(((*p - point(0.0, 0.0)).length() - 1.0).abs() < 1e-4);
    }
    for p in &points.right {
        assert!(p.y <= 1e-4);
    }
}

#[test]
fn whole_rectangle_extrusion_visits_corners() {
    let shape = BrushTipShape::new(&rounded_rect(0.0, 0.0, 4.0, 2.0, 0.0), 0.01);
    let mut points = ExtrusionPoints::new();
    BrushTipShape::append_whole_shape_extrusion_points(&shape, vector(0.0, 1.0), 0.01, &mut points);

    // Moving up, both sides start on the bottom edge and end on the top edge.
    assert_point_near(points.left[0], point(2.0, -1.0));
    assert_point_near(points.right[0], point(2.0, -1.0));
    assert_point_near(*points.left.last().unwrap(), point(2.0, 1.0));
    assert_point_near(*points.right.last().unwrap(), point(2.0, 1.0));
    assert!(points.left.iter().any(|p| (*p - point(-2.0, -1.0)).length() < 1e-3));
    assert!(points.left.iter().any(|p| (*p - point(-2.0, 1.0)).length() < 1e-3));
    assert_eq!(points.right.len(), 2);
}

#[test]
fn caps_between_two_circles() {
    let a = BrushTipShape::new(&BrushTipState::circle(point(0.0, 0.0), 2.0), 0.01);
    let b = BrushTipShape::new(&BrushTipState::circle(point(5.0, 0.0), 2.0), 0.01);

    let mut start = ExtrusionPoints::new();
    assert!(BrushTipShape::append_startcap_extrusion_points(&a, &b, 0.01, &mut start));
    assert_point_near(start.left[0], point(-1.0, 0.0));
    assert_point_near(start.right[0], point(-1.0, 0.0));
    assert_point_near(*start.left.last().unwrap(), point(0.0, 1.0));
    assert_point_near(*start.right.last().unwrap(), point(0.0, -1.0));

    let mut end = ExtrusionPoints::new();
    assert!(BrushTipShape::append_endcap_extrusion_points(&a, &b, 0.01, &mut end));
    assert_point_near(end.left[0], point(5.0, 1.0));
    assert_point_near(end.right[0], point(5.0, -1.0));
    assert_point_near(*end.left.last().unwrap(), point(6.0, 0.0));
    assert_point_near(*end.right.last().unwrap(), point(6.0, 0.0));
}

#[test]
fn turns() {
    let a = BrushTipShape::new(&BrushTipState::circle(point(0.0, 0.0), 2.0), 0.01);
    let b = BrushTipShape::new(&BrushTipState::circle(point(5.0, 0.0), 2.0), 0.01);
    let straight = BrushTipShape::new(&BrushTipState::circle(point(10.0, 0.0), 2.0), 0.01);
    let up = BrushTipShape::new(&BrushTipState::circle(point(5.0, 5.0), 2.0), 0.01);

    let mut points = ExtrusionPoints::new();
    assert!(BrushTipShape::append_turn_extrusion_points(&a, &b, &straight, 0.01, &mut points));
    assert_eq!(points.left.len(), 1);
    assert_eq!(points.right.len(), 1);
    assert_point_near(points.left[0], point(5.0, 1.0));
    assert_point_near(points.right[0], point(5.0, -1.0));

    // Turning left: the right side goes around the circle, the left side jumps.
    points.clear();
    assert!(BrushTipShape::append_turn_extrusion_points(&a, &b, &up, 0.01, &mut points));
    assert_eq!(points.left.len(), 2);
    assert_point_near(points.left[0], point(5.0, 1.0));
    assert_point_near(points.left[1], point(4.0, 0.0));
    assert!(points.right.len() > 2);
    assert_point_near(points.right[0], point(5.0, -1.0));
    assert_point_near(*points.right.last().unwrap(), point(6.0, 0.0));
}

#[cfg(test)]
fn pose_sweep() -> Vec<BrushTipState> {
    let mut poses = Vec::new();
    for &(x, y) in &[(0.0, 0.0), (0.7, 0.3), (2.0, -1.0)] {
        for &(width, height) in &[(1.0, 1.0), (2.0, 0.5), (0.4, 1.5)] {
            for &percent_radius in &[1.0, 0.3, 0.0] {
                for &rotation in &[0.0, 0.6] {
                    for &slant in &[0.0, 0.5] {
                        for &pinch in &[0.0, 0.8] {
                            poses.push(BrushTipState {
                                rotation: Angle::radians(rotation),
                                slant: Angle::radians(slant),
                                pinch,
                                ..rounded_rect(x, y, width, height, percent_radius)
                            });
                        }
                    }
                }
            }
        }
    }

    poses
}

#[test]
fn tangents_exist_unless_one_shape_contains_the_other() {
    let shapes: Vec<BrushTipShape> = pose_sweep()
        .iter()
        .map(|pose| BrushTipShape::new(pose, 0.01))
        .collect();

    for first in &shapes {
        for second in &shapes {
            if first.contains(second) || second.contains(first) {
                continue;
            }
            assert!(
                BrushTipShape::tangent_circle_indices(first, second).is_some(),
                "no tangents from {:?} to {:?}",
                first,
                second
            );
        }
    }
}

#[test]
fn shapes_contain_their_scaled_down_copies() {
    for pose in pose_sweep() {
        let shape = BrushTipShape::new(&pose, 0.01);
        for &scale in &[1.0, 0.8, 0.5, 0.25] {
            let smaller = BrushTipShape::new(
                &BrushTipState {
                    width: pose.width * scale,
                    height: pose.height * scale,
                    ..pose
                },
                0.01,
            );
            assert!(shape.contains(&smaller), "{:?} at scale {}", pose, scale);
        }
    }
}
