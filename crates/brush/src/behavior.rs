//! Declarative brush behaviors.
//!
//! A behavior is a small expression graph stored in post-order: every node pops
//! its inputs from a value stack and pushes its output, except target nodes which
//! consume a value and apply it to a property of the brush tip. Values are
//! nullable, null meaning "no opinion".

use crate::easing::EasingFunction;
use crate::error::BrushError;
use crate::input::ToolType;
use alloc::vec::Vec;

/// A stroke input property, read and normalized by source nodes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum Source {
    NormalizedPressure,
    TiltInRadians,
    TiltXInRadians,
    TiltYInRadians,
    OrientationInRadians,
    OrientationAboutZeroInRadians,
    SpeedInMultiplesOfBrushSizePerSecond,
    VelocityXInMultiplesOfBrushSizePerSecond,
    VelocityYInMultiplesOfBrushSizePerSecond,
    DirectionInRadians,
    DirectionAboutZeroInRadians,
    NormalizedDirectionX,
    NormalizedDirectionY,
    DistanceTraveledInMultiplesOfBrushSize,
    TimeOfInputInSeconds,
    TimeOfInputInMillis,
    PredictedDistanceTraveledInMultiplesOfBrushSize,
    PredictedTimeElapsedInSeconds,
    PredictedTimeElapsedInMillis,
    DistanceRemainingInMultiplesOfBrushSize,
    TimeSinceInputInSeconds,
    TimeSinceInputInMillis,
    AccelerationInMultiplesOfBrushSizePerSecondSquared,
    AccelerationXInMultiplesOfBrushSizePerSecondSquared,
    AccelerationYInMultiplesOfBrushSizePerSecondSquared,
    AccelerationForwardInMultiplesOfBrushSizePerSecondSquared,
    AccelerationLateralInMultiplesOfBrushSizePerSecondSquared,
}

/// How values outside of a node's range are mapped back into [0, 1].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum OutOfRange {
    Clamp,
    Repeat,
    Mirror,
}

impl OutOfRange {
    /// Maps `value` into [0, 1].
    pub fn apply(self, value: f32) -> f32 {
        match self {
            OutOfRange::Clamp => value.max(0.0).min(1.0),
            OutOfRange::Repeat => value - floor(value),
            OutOfRange::Mirror => {
                let period = value - 2.0 * floor(value * 0.5);
                if period > 1.0 {
                    2.0 - period
                } else {
                    period
                }
            }
        }
    }
}

fn floor(value: f32) -> f32 {
    #[cfg(not(feature = "std"))]
    use num_traits::Float;
    value.floor()
}

/// The quantity a stateful node progresses over.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum ProgressDomain {
    TimeInSeconds,
    DistanceInMultiplesOfBrushSize,
}

/// An input property that some devices don't report.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum OptionalInputProperty {
    Pressure,
    Tilt,
    Orientation,
    TiltXAndY,
}

/// A set of tool types.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct EnabledToolTypes {
    pub unknown: bool,
    pub mouse: bool,
    pub touch: bool,
    pub stylus: bool,
}

impl EnabledToolTypes {
    pub const ALL: Self = EnabledToolTypes {
        unknown: true,
        mouse: true,
        touch: true,
        stylus: true,
    };

    pub fn contains(&self, tool_type: ToolType) -> bool {
        match tool_type {
            ToolType::Unknown => self.unknown,
            ToolType::Mouse => self.mouse,
            ToolType::Touch => self.touch,
            ToolType::Stylus => self.stylus,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.unknown || self.mouse || self.touch || self.stylus)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum BinaryOp {
    Product,
    Sum,
    Min,
    Max,
    /// Null if the first value is null, otherwise the second value.
    AndThen,
    /// The first value unless it is null, otherwise the second value.
    OrElse,
    /// The non-null value if exactly one of the two is non-null, otherwise null.
    XorElse,
}

/// Interpolation nodes pop the end, the start and the parameter, in that order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum Interpolation {
    Lerp,
    InverseLerp,
}

/// A brush tip property modified by target nodes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum Target {
    WidthMultiplier,
    HeightMultiplier,
    SizeMultiplier,
    SlantOffsetInRadians,
    PinchOffset,
    RotationOffsetInRadians,
    CornerRoundingOffset,
    PositionOffsetXInMultiplesOfBrushSize,
    PositionOffsetYInMultiplesOfBrushSize,
    PositionOffsetForwardInMultiplesOfBrushSize,
    PositionOffsetLateralInMultiplesOfBrushSize,
    HueOffsetInRadians,
    SaturationMultiplier,
    Luminosity,
    OpacityMultiplier,
    TextureAnimationProgressOffset,
}

impl Target {
    /// Multipliers are combined by multiplication, everything else by addition.
    pub fn is_multiplier(self) -> bool {
        matches!(
            self,
            Target::WidthMultiplier
                | Target::HeightMultiplier
                | Target::SizeMultiplier
                | Target::SaturationMultiplier
                | Target::OpacityMultiplier
        )
    }

    /// The value of the modifier before any behavior affects it.
    pub fn neutral_value(self) -> f32 {
        if self.is_multiplier() {
            1.0
        } else {
            0.0
        }
    }
}

/// A two-dimensional brush tip property modified by polar target nodes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum PolarTarget {
    /// Angle measured from the positive x axis.
    PositionOffsetAbsoluteInRadiansAndMultiplesOfBrushSize,
    /// Angle measured from the direction of travel.
    PositionOffsetRelativeInRadiansAndMultiplesOfBrushSize,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum Node {
    Source {
        source: Source,
        source_value_range: [f32; 2],
        source_out_of_range_behavior: OutOfRange,
    },
    Constant {
        value: f32,
    },
    /// Smooth random values in [0, 1].
    Noise {
        seed: u32,
        vary_over: ProgressDomain,
        base_period: f32,
    },
    /// Passes its input through only if the property is *not* reported.
    FallbackFilter {
        is_fallback_for: OptionalInputProperty,
    },
    ToolTypeFilter {
        enabled_tool_types: EnabledToolTypes,
    },
    Damping {
        damping_source: ProgressDomain,
        damping_gap: f32,
    },
    Response {
        response_curve: EasingFunction,
    },
    Integral {
        integrate_over: ProgressDomain,
        integral_out_of_range_behavior: OutOfRange,
        integral_value_range: [f32; 2],
    },
    BinaryOp {
        operation: BinaryOp,
    },
    Interpolation {
        interpolation: Interpolation,
    },
    Target {
        target: Target,
        target_modifier_range: [f32; 2],
    },
    /// Pops the magnitude, then the angle.
    PolarTarget {
        target: PolarTarget,
        angle_range: [f32; 2],
        magnitude_range: [f32; 2],
    },
}

/// The kind of a behavior node, without its parameters.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Source,
    Constant,
    Noise,
    FallbackFilter,
    ToolTypeFilter,
    Damping,
    Response,
    Integral,
    BinaryOp,
    Interpolation,
    Target,
    PolarTarget,
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Source { .. } => NodeKind::Source,
            Node::Constant { .. } => NodeKind::Constant,
            Node::Noise { .. } => NodeKind::Noise,
            Node::FallbackFilter { .. } => NodeKind::FallbackFilter,
            Node::ToolTypeFilter { .. } => NodeKind::ToolTypeFilter,
            Node::Damping { .. } => NodeKind::Damping,
            Node::Response { .. } => NodeKind::Response,
            Node::Integral { .. } => NodeKind::Integral,
            Node::BinaryOp { .. } => NodeKind::BinaryOp,
            Node::Interpolation { .. } => NodeKind::Interpolation,
            Node::Target { .. } => NodeKind::Target,
            Node::PolarTarget { .. } => NodeKind::PolarTarget,
        }
    }

    /// Number of values popped from the stack.
    pub fn input_count(&self) -> usize {
        match self.kind() {
            NodeKind::Source | NodeKind::Constant | NodeKind::Noise => 0,
            NodeKind::FallbackFilter
            | NodeKind::ToolTypeFilter
            | NodeKind::Damping
            | NodeKind::Response
            | NodeKind::Integral
            | NodeKind::Target => 1,
            NodeKind::BinaryOp | NodeKind::PolarTarget => 2,
            NodeKind::Interpolation => 3,
        }
    }

    /// Number of values pushed on the stack.
    pub fn output_count(&self) -> usize {
        match self.kind() {
            NodeKind::Target | NodeKind::PolarTarget => 0,
            _ => 1,
        }
    }

    fn check_parameters(&self) -> Result<(), &'static str> {
        fn finite_range(range: &[f32; 2]) -> bool {
            range[0].is_finite() && range[1].is_finite()
        }

        match self {
            Node::Source {
                source_value_range, ..
            } => {
                if !finite_range(source_value_range) {
                    return Err("non-finite source value range");
                }
                if source_value_range[0] == source_value_range[1] {
                    return Err("empty source value range");
                }
            }
            Node::Constant { value } => {
                if !value.is_finite() {
                    return Err("non-finite constant");
                }
            }
            Node::Noise { base_period, .. } => {
                if !base_period.is_finite() || *base_period <= 0.0 {
                    return Err("noise base period must be positive");
                }
            }
            Node::ToolTypeFilter { enabled_tool_types } => {
                if enabled_tool_types.is_empty() {
                    return Err("no tool type enabled");
                }
            }
            Node::Damping { damping_gap, .. } => {
                if !damping_gap.is_finite() || *damping_gap < 0.0 {
                    return Err("damping gap must be non-negative");
                }
            }
            Node::Response { response_curve } => {
                if !response_curve.is_valid() {
                    return Err("invalid response curve");
                }
            }
            Node::Integral {
                integral_value_range,
                ..
            } => {
                if !finite_range(integral_value_range) {
                    return Err("non-finite integral value range");
                }
                if integral_value_range[0] == integral_value_range[1] {
                    return Err("empty integral value range");
                }
            }
            Node::Target {
                target_modifier_range,
                ..
            } => {
                if !finite_range(target_modifier_range) {
                    return Err("non-finite target modifier range");
                }
            }
            Node::PolarTarget {
                angle_range,
                magnitude_range,
                ..
            } => {
                if !finite_range(angle_range) || !finite_range(magnitude_range) {
                    return Err("non-finite polar target range");
                }
            }
            Node::FallbackFilter { .. } | Node::BinaryOp { .. } | Node::Interpolation { .. } => {}
        }

        Ok(())
    }
}

/// A sequence of nodes in post-order, ending with every value consumed by a target.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct BrushBehavior {
    pub nodes: Vec<Node>,
}

impl BrushBehavior {
    pub fn new(nodes: Vec<Node>) -> Self {
        BrushBehavior { nodes }
    }

    /// Checks the parameters of each node and that the node sequence forms
    /// complete expressions.
    pub fn validate(&self) -> Result<(), BrushError> {
        if self.nodes.is_empty() {
            return Err(BrushError::EmptyBehavior);
        }

        let mut depth = 0;
        for (index, node) in self.nodes.iter().enumerate() {
            let needed = node.input_count();
            if depth < needed {
                return Err(BrushError::StackUnderflow {
                    index,
                    kind: node.kind(),
                    needed,
                    available: depth,
                });
            }
            node.check_parameters()
                .map_err(|reason| BrushError::InvalidNode {
                    index,
                    kind: node.kind(),
                    reason,
                })?;
            depth = depth - needed + node.output_count();
        }

        if depth != 0 {
            return Err(BrushError::DanglingValues { count: depth });
        }

        Ok(())
    }
}

#[test]
fn out_of_range_behaviors() {
    fn assert_almost_eq(a: f32, b: f32) {
        assert!((a - b).abs() < 1e-5, "{} != {}", a, b);
    }

    assert_almost_eq(OutOfRange::Clamp.apply(1.5), 1.0);
    assert_almost_eq(OutOfRange::Clamp.apply(-0.5), 0.0);
    assert_almost_eq(OutOfRange::Repeat.apply(1.25), 0.25);
    assert_almost_eq(OutOfRange::Repeat.apply(-0.25), 0.75);
    assert_almost_eq(OutOfRange::Mirror.apply(1.25), 0.75);
    assert_almost_eq(OutOfRange::Mirror.apply(2.25), 0.25);
    assert_almost_eq(OutOfRange::Mirror.apply(-0.25), 0.25);
}

#[test]
fn validate_stack_shape() {
    let source = Node::Source {
        source: Source::NormalizedPressure,
        source_value_range: [0.0, 1.0],
        source_out_of_range_behavior: OutOfRange::Clamp,
    };
    let target = Node::Target {
        target: Target::SizeMultiplier,
        target_modifier_range: [0.5, 1.5],
    };

    let valid = BrushBehavior::new(alloc::vec![source.clone(), target.clone()]);
    assert_eq!(valid.validate(), Ok(()));

    let dangling = BrushBehavior::new(alloc::vec![source.clone(), source.clone(), target.clone()]);
    assert_eq!(dangling.validate(), Err(BrushError::DanglingValues { count: 1 }));

    let underflow = BrushBehavior::new(alloc::vec![
        source.clone(),
        Node::BinaryOp {
            operation: BinaryOp::Sum
        },
        target.clone(),
    ]);
    assert_eq!(
        underflow.validate(),
        Err(BrushError::StackUnderflow {
            index: 1,
            kind: NodeKind::BinaryOp,
            needed: 2,
            available: 1,
        })
    );

    let bad_range = BrushBehavior::new(alloc::vec![
        Node::Source {
            source: Source::NormalizedPressure,
            source_value_range: [0.5, 0.5],
            source_out_of_range_behavior: OutOfRange::Clamp,
        },
        target,
    ]);
    assert!(matches!(
        bad_range.validate(),
        Err(BrushError::InvalidNode { index: 0, .. })
    ));

    assert_eq!(BrushBehavior::default().validate(), Err(BrushError::EmptyBehavior));
}
