use crate::behavior::BrushBehavior;
use crate::error::BrushError;
use crate::math::{Angle, Vector};
use alloc::vec::Vec;
use core::f32::consts::FRAC_PI_2;

/// The non-behavior shape parameters of a brush tip and its behaviors.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct BrushTip {
    /// Width and height of the tip in multiples of the brush size.
    pub scale: Vector,
    /// In [0, 1], 0 for square corners and 1 for fully rounded ones.
    pub corner_rounding: f32,
    /// In [-π/2, π/2].
    pub slant: Angle,
    /// In [0, 1].
    pub pinch: f32,
    pub rotation: Angle,
    /// In [0, 2].
    pub opacity_multiplier: f32,
    /// Minimum distance between particles in multiples of the brush size. Zero
    /// for continuous strokes.
    pub particle_gap_distance_scale: f32,
    /// Minimum time between particles in seconds. Zero for continuous strokes.
    pub particle_gap_duration: f32,
    pub behaviors: Vec<BrushBehavior>,
}

impl Default for BrushTip {
    fn default() -> Self {
        BrushTip {
            scale: Vector::new(1.0, 1.0),
            corner_rounding: 1.0,
            slant: Angle::zero(),
            pinch: 0.0,
            rotation: Angle::zero(),
            opacity_multiplier: 1.0,
            particle_gap_distance_scale: 0.0,
            particle_gap_duration: 0.0,
            behaviors: Vec::new(),
        }
    }
}

fn check_range(name: &'static str, value: f32, min: f32, max: f32) -> Result<(), BrushError> {
    if !value.is_finite() {
        return Err(BrushError::NonFiniteParameter { name });
    }
    if value < min || value > max {
        return Err(BrushError::ParameterOutOfRange {
            name,
            value,
            min,
            max,
        });
    }

    Ok(())
}

impl BrushTip {
    /// Whether the tip is stamped as disconnected particles instead of extruded.
    pub fn is_particle_brush(&self) -> bool {
        self.particle_gap_distance_scale > 0.0 || self.particle_gap_duration > 0.0
    }

    pub fn validate(&self) -> Result<(), BrushError> {
        check_range("scale.x", self.scale.x, 0.0, f32::MAX)?;
        check_range("scale.y", self.scale.y, 0.0, f32::MAX)?;
        check_range("corner_rounding", self.corner_rounding, 0.0, 1.0)?;
        check_range("slant", self.slant.radians, -FRAC_PI_2, FRAC_PI_2)?;
        check_range("pinch", self.pinch, 0.0, 1.0)?;
        check_range("rotation", self.rotation.radians, f32::MIN, f32::MAX)?;
        check_range("opacity_multiplier", self.opacity_multiplier, 0.0, 2.0)?;
        check_range(
            "particle_gap_distance_scale",
            self.particle_gap_distance_scale,
            0.0,
            f32::MAX,
        )?;
        check_range(
            "particle_gap_duration",
            self.particle_gap_duration,
            0.0,
            f32::MAX,
        )?;

        for behavior in &self.behaviors {
            behavior.validate()?;
        }

        Ok(())
    }
}

/// A layer of paint applied by a set of brush tips.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct BrushCoat {
    pub tips: Vec<BrushTip>,
}

impl BrushCoat {
    pub fn new(tip: BrushTip) -> Self {
        BrushCoat {
            tips: alloc::vec![tip],
        }
    }

    /// Validates every tip. Only coats with a single tip are supported.
    pub fn validate(&self) -> Result<(), BrushError> {
        if self.tips.len() != 1 {
            return Err(BrushError::UnsupportedTipCount {
                count: self.tips.len(),
            });
        }

        for tip in &self.tips {
            tip.validate()?;
        }

        Ok(())
    }
}

#[test]
fn tip_validation() {
    let tip = BrushTip::default();
    assert_eq!(tip.validate(), Ok(()));
    assert!(!tip.is_particle_brush());

    let particles = BrushTip {
        particle_gap_distance_scale: 0.5,
        ..BrushTip::default()
    };
    assert!(particles.is_particle_brush());

    let bad_pinch = BrushTip {
        pinch: 1.5,
        ..BrushTip::default()
    };
    assert_eq!(
        bad_pinch.validate(),
        Err(BrushError::ParameterOutOfRange {
            name: "pinch",
            value: 1.5,
            min: 0.0,
            max: 1.0,
        })
    );

    let nan_scale = BrushTip {
        scale: Vector::new(f32::NAN, 1.0),
        ..BrushTip::default()
    };
    assert_eq!(
        nan_scale.validate(),
        Err(BrushError::NonFiniteParameter { name: "scale.x" })
    );

    assert_eq!(
        BrushCoat::default().validate(),
        Err(BrushError::UnsupportedTipCount { count: 0 })
    );
    assert_eq!(BrushCoat::new(BrushTip::default()).validate(), Ok(()));
}
