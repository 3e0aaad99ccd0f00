//! The modeled input stream consumed by the brush modeler.
//!
//! Raw pointer events are smoothed, predicted and measured upstream. This module
//! only describes the result of that process.

use crate::math::{Point, Vector};
use quill_geom::utils::lerp;

/// The kind of device that produced a stroke.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum ToolType {
    Unknown,
    Mouse,
    Touch,
    Stylus,
}

impl Default for ToolType {
    fn default() -> Self {
        ToolType::Unknown
    }
}

/// One modeled input sample.
///
/// Distances are in stroke space units and times in seconds since the start of
/// the stroke. The optional properties are `None` when the device doesn't report
/// them.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct ModeledStrokeInput {
    pub position: Point,
    pub velocity: Vector,
    pub acceleration: Vector,
    pub traveled_distance: f32,
    pub elapsed_time: f32,
    /// In [0, 1].
    pub pressure: Option<f32>,
    /// In radians, 0 when the stylus is perpendicular to the surface.
    pub tilt: Option<f32>,
    /// In radians, in [0, 2π).
    pub orientation: Option<f32>,
}

impl Default for ModeledStrokeInput {
    fn default() -> Self {
        ModeledStrokeInput {
            position: Point::origin(),
            velocity: Vector::zero(),
            acceleration: Vector::zero(),
            traveled_distance: 0.0,
            elapsed_time: 0.0,
            pressure: None,
            tilt: None,
            orientation: None,
        }
    }
}

fn lerp_optional(a: Option<f32>, b: Option<f32>, t: f32) -> Option<f32> {
    match (a, b) {
        (Some(a), Some(b)) => Some(lerp(a, b, t)),
        (a, None) => a,
        (None, b) => b,
    }
}

impl ModeledStrokeInput {
    /// Linearly interpolates every property of two inputs.
    ///
    /// Orientation is interpolated along the shortest arc.
    pub fn lerp(&self, other: &Self, t: f32) -> Self {
        let orientation = match (self.orientation, other.orientation) {
            (Some(a), Some(b)) => {
                let mut delta = b - a;
                if delta > core::f32::consts::PI {
                    delta -= core::f32::consts::TAU;
                } else if delta < -core::f32::consts::PI {
                    delta += core::f32::consts::TAU;
                }
                Some(quill_geom::utils::positive_angle(a + delta * t))
            }
            (a, b) => a.or(b),
        };

        ModeledStrokeInput {
            position: self.position.lerp(other.position, t),
            velocity: self.velocity.lerp(other.velocity, t),
            acceleration: self.acceleration.lerp(other.acceleration, t),
            traveled_distance: lerp(self.traveled_distance, other.traveled_distance, t),
            elapsed_time: lerp(self.elapsed_time, other.elapsed_time, t),
            pressure: lerp_optional(self.pressure, other.pressure, t),
            tilt: lerp_optional(self.tilt, other.tilt, t),
            orientation,
        }
    }
}

/// Aggregate information about the whole input stream at the time of an update.
///
/// Inputs before `stable_input_count` will never change again. Inputs from
/// `real_input_count` on are predicted.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct InputModelerState {
    pub tool_type: ToolType,
    /// Elapsed time of the stroke including predicted inputs. Infinite once the
    /// stroke is finished.
    pub complete_elapsed_time: f32,
    /// Traveled distance of the stroke including predicted inputs.
    pub complete_traveled_distance: f32,
    pub total_real_elapsed_time: f32,
    pub total_real_distance: f32,
    pub stable_input_count: usize,
    pub real_input_count: usize,
}

#[test]
fn lerp_orientation_wraps() {
    use crate::math::point;

    let a = ModeledStrokeInput {
        position: point(0.0, 0.0),
        orientation: Some(6.0),
        pressure: Some(0.2),
        ..Default::default()
    };
    let b = ModeledStrokeInput {
        position: point(2.0, 4.0),
        elapsed_time: 1.0,
        orientation: Some(0.4),
        pressure: None,
        ..Default::default()
    };

    let mid = a.lerp(&b, 0.5);
    assert_eq!(mid.position, point(1.0, 2.0));
    assert_eq!(mid.elapsed_time, 0.5);
    assert_eq!(mid.pressure, Some(0.2));
    let orientation = mid.orientation.unwrap();
    let expected = quill_geom::utils::positive_angle(6.0 + (0.4 + core::f32::consts::TAU - 6.0) * 0.5);
    assert!((orientation - expected).abs() < 1e-4);
}
