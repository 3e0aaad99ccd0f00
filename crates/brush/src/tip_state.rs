use crate::math::{Angle, Point, Vector};

/// One sampled pose of a moving brush tip.
///
/// Produced by the [`BrushTipModeler`](struct.BrushTipModeler.html), consumed by the
/// extruder which turns it into a footprint shape.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct BrushTipState {
    pub position: Point,
    pub velocity: Vector,
    pub width: f32,
    pub height: f32,
    /// Corner rounding, in [0, 1].
    pub percent_radius: f32,
    pub rotation: Angle,
    /// In [-π/2, π/2].
    pub slant: Angle,
    /// In [0, 1].
    pub pinch: f32,
    /// In [0, 1).
    pub texture_animation_progress_offset: f32,
    /// In [0, 1).
    pub hue_offset_in_full_turns: f32,
    /// In [0, 2].
    pub saturation_multiplier: f32,
    /// In [-1, 1].
    pub luminosity_shift: f32,
    /// In [0, 2].
    pub opacity_multiplier: f32,
}

impl Default for BrushTipState {
    fn default() -> Self {
        BrushTipState {
            position: Point::origin(),
            velocity: Vector::zero(),
            width: 0.0,
            height: 0.0,
            percent_radius: 0.0,
            rotation: Angle::zero(),
            slant: Angle::zero(),
            pinch: 0.0,
            texture_animation_progress_offset: 0.0,
            hue_offset_in_full_turns: 0.0,
            saturation_multiplier: 1.0,
            luminosity_shift: 0.0,
            opacity_multiplier: 1.0,
        }
    }
}

impl BrushTipState {
    /// A fully rounded tip of the given diameter.
    pub fn circle(position: Point, diameter: f32) -> Self {
        BrushTipState {
            position,
            width: diameter,
            height: diameter,
            percent_radius: 1.0,
            ..Default::default()
        }
    }

    /// A zero-size pose. The extruder disconnects the geometry on each side of it.
    pub fn extrusion_break(position: Point) -> Self {
        BrushTipState {
            position,
            ..Default::default()
        }
    }
}
