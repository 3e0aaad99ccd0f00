//! Evaluation of brush behaviors over the modeled input stream.

use crate::behavior::{
    BinaryOp, Interpolation, Node, OptionalInputProperty, OutOfRange, PolarTarget,
    ProgressDomain, Source, Target,
};
use crate::input::{InputModelerState, ModeledStrokeInput};
use crate::math::{vector, Angle, Vector};
use crate::noise::NoiseGenerator;
use crate::tip::BrushTip;
use crate::tip_state::BrushTipState;
use alloc::vec::Vec;
use core::f32::consts::{FRAC_PI_2, PI, TAU};
use quill_geom::utils::{inverse_lerp, left_normal, lerp, normalized_or, positive_angle};

#[cfg(not(feature = "std"))]
use num_traits::Float;

/// Upper bound on the number of particles emitted between two consecutive inputs.
const MAX_PARTICLES_PER_INPUT: usize = 100;

/// The measurements of an input that stateful nodes progress over.
#[derive(Copy, Clone, Debug, PartialEq)]
struct InputMetrics {
    traveled_distance: f32,
    elapsed_time: f32,
}

impl InputMetrics {
    fn of(input: &ModeledStrokeInput) -> Self {
        InputMetrics {
            traveled_distance: input.traveled_distance,
            elapsed_time: input.elapsed_time,
        }
    }
}

/// A behavior node with the index of its persistent state in `RunningState`.
#[derive(Clone, Debug)]
struct CompiledNode {
    node: Node,
    slot: usize,
}

/// Everything the behavior graph accumulates from one input to the next.
///
/// The modeler keeps two copies: the state after the last fixed input, and the
/// state being advanced by the current update.
#[derive(Clone, Debug, Default)]
struct RunningState {
    noise_generators: Vec<NoiseGenerator>,
    damped_values: Vec<Option<f32>>,
    integrals: Vec<f32>,
    target_modifiers: Vec<f32>,
    /// Angle and magnitude.
    polar_modifiers: Vec<[f32; 2]>,
    previous_input: Option<InputMetrics>,
    last_particle: Option<InputMetrics>,
    processed_input_count: usize,
}

struct EvaluationContext<'l> {
    state: &'l InputModelerState,
    input: &'l ModeledStrokeInput,
    previous: Option<InputMetrics>,
    brush_size: f32,
}

impl<'l> EvaluationContext<'l> {
    fn progress(&self, domain: ProgressDomain) -> f32 {
        let previous = match self.previous {
            Some(previous) => previous,
            None => return 0.0,
        };

        let delta = match domain {
            ProgressDomain::TimeInSeconds => self.input.elapsed_time - previous.elapsed_time,
            ProgressDomain::DistanceInMultiplesOfBrushSize => {
                (self.input.traveled_distance - previous.traveled_distance) / self.brush_size
            }
        };

        delta.max(0.0)
    }
}

/// Turns modeled stroke inputs into brush tip poses by evaluating the tip's
/// behaviors.
///
/// Each update produces poses in two groups: the poses of inputs that will
/// never change again ("fixed"), and the poses of the remaining, possibly
/// predicted, inputs ("volatile"). Volatile poses are recomputed by every
/// update.
///
/// Behaviors reading the distance remaining or the time since an input can
/// change the pose of a stable input until the stroke moves far enough past it,
/// so such inputs stay volatile for a safety margin computed at the start of
/// the stroke.
#[derive(Clone, Debug, Default)]
pub struct BrushTipModeler {
    tip: BrushTip,
    brush_size: f32,
    noise_seed: u32,
    nodes: Vec<CompiledNode>,
    targets: Vec<Target>,
    polar_targets: Vec<PolarTarget>,
    distance_remaining_bound: f32,
    time_remaining_bound: f32,
    fixed: RunningState,
    current: RunningState,
    stack: Vec<Option<f32>>,
    tip_states: Vec<BrushTipState>,
    new_fixed_count: usize,
    started: bool,
}

impl BrushTipModeler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepares the modeler for a new stroke.
    ///
    /// Panics if `brush_size` is not a positive finite number or if the tip does
    /// not validate.
    pub fn start_stroke(&mut self, tip: &BrushTip, brush_size: f32, noise_seed: u32) {
        assert!(
            brush_size > 0.0 && brush_size.is_finite(),
            "brush size must be positive and finite, got {}",
            brush_size
        );
        if let Err(e) = tip.validate() {
            panic!("invalid brush tip: {}", e);
        }

        self.tip = BrushTip {
            behaviors: Vec::new(),
            ..tip.clone()
        };
        self.brush_size = brush_size;
        self.noise_seed = noise_seed;
        self.nodes.clear();
        self.targets.clear();
        self.polar_targets.clear();
        self.current = RunningState::default();
        self.distance_remaining_bound = 0.0;
        self.time_remaining_bound = 0.0;

        for behavior in &tip.behaviors {
            for node in &behavior.nodes {
                let slot = self.allocate_slot(node);
                self.include_in_bounds(node);
                self.nodes.push(CompiledNode {
                    node: node.clone(),
                    slot,
                });
            }
        }

        self.fixed = self.current.clone();
        self.tip_states.clear();
        self.new_fixed_count = 0;
        self.started = true;
    }

    fn allocate_slot(&mut self, node: &Node) -> usize {
        let state = &mut self.current;
        match *node {
            Node::Noise { seed, .. } => {
                let seed = ((self.noise_seed as u64) << 32) | seed as u64;
                state.noise_generators.push(NoiseGenerator::new(seed));
                state.noise_generators.len() - 1
            }
            Node::Damping { .. } => {
                state.damped_values.push(None);
                state.damped_values.len() - 1
            }
            Node::Integral { .. } => {
                state.integrals.push(0.0);
                state.integrals.len() - 1
            }
            Node::Target { target, .. } => {
                state.target_modifiers.push(target.neutral_value());
                self.targets.push(target);
                self.targets.len() - 1
            }
            Node::PolarTarget { target, .. } => {
                state.polar_modifiers.push([0.0, 0.0]);
                self.polar_targets.push(target);
                self.polar_targets.len() - 1
            }
            _ => 0,
        }
    }

    fn include_in_bounds(&mut self, node: &Node) {
        if let Node::Source {
            source,
            source_value_range,
            source_out_of_range_behavior,
        } = *node
        {
            let range_max = source_value_range[0].max(source_value_range[1]).max(0.0);
            let bound = if source_out_of_range_behavior == OutOfRange::Clamp {
                range_max
            } else {
                f32::INFINITY
            };
            match source {
                Source::DistanceRemainingInMultiplesOfBrushSize => {
                    self.distance_remaining_bound =
                        self.distance_remaining_bound.max(bound * self.brush_size);
                }
                Source::TimeSinceInputInSeconds => {
                    self.time_remaining_bound = self.time_remaining_bound.max(bound);
                }
                Source::TimeSinceInputInMillis => {
                    self.time_remaining_bound = self.time_remaining_bound.max(bound * 0.001);
                }
                _ => {}
            }
        }
    }

    /// Models the poses of the stroke given all of its inputs so far.
    ///
    /// Inputs up to `state.stable_input_count` must not have changed since the
    /// previous call.
    pub fn update_stroke(&mut self, state: &InputModelerState, inputs: &[ModeledStrokeInput]) {
        assert!(self.started, "update_stroke called before start_stroke");

        self.current = self.fixed.clone();
        self.tip_states.clear();

        let stable = state.stable_input_count.min(inputs.len());
        let start = self.current.processed_input_count.min(stable);
        let distance_bound = self.distance_remaining_bound;
        let time_bound = self.time_remaining_bound;
        let fixable_count = inputs[start..stable].partition_point(|input| {
            is_fixable(input, state, distance_bound, time_bound)
        });
        let fixed_end = start + fixable_count;

        for index in start..fixed_end {
            self.process_input(state, inputs, index);
        }
        self.current.processed_input_count = fixed_end;
        self.fixed = self.current.clone();
        self.new_fixed_count = self.tip_states.len();

        for index in fixed_end..inputs.len() {
            self.process_input(state, inputs, index);
        }

        log::trace!(
            "modeled {} fixed and {} volatile tip states",
            self.new_fixed_count,
            self.tip_states.len() - self.new_fixed_count
        );
    }

    /// The poses of inputs that became fixed during the last update.
    pub fn new_fixed_tip_states(&self) -> &[BrushTipState] {
        &self.tip_states[..self.new_fixed_count]
    }

    /// The poses that the next update may replace.
    pub fn volatile_tip_states(&self) -> &[BrushTipState] {
        &self.tip_states[self.new_fixed_count..]
    }

    /// Whether some behavior still depends on the passing of time although no new
    /// real input arrived.
    pub fn has_unfinished_time_behaviors(&self, state: &InputModelerState) -> bool {
        self.time_remaining_bound > 0.0
            && state.complete_elapsed_time - state.total_real_elapsed_time
                < self.time_remaining_bound
    }

    pub fn is_particle_brush(&self) -> bool {
        self.tip.is_particle_brush()
    }

    fn process_input(
        &mut self,
        state: &InputModelerState,
        inputs: &[ModeledStrokeInput],
        index: usize,
    ) {
        let input = &inputs[index];
        if !self.tip.is_particle_brush() {
            let tip_state = self.evaluate(state, input);
            self.tip_states.push(tip_state);
            return;
        }

        let (last_particle, previous_input) = match (self.current.last_particle, index.checked_sub(1)) {
            (Some(last), Some(previous_index)) => (last, &inputs[previous_index]),
            _ => {
                self.emit_particle(state, input);
                return;
            }
        };

        let distance_gap = self.tip.particle_gap_distance_scale * self.brush_size;
        let time_gap = self.tip.particle_gap_duration;
        let mut last_particle = last_particle;
        for _ in 0..MAX_PARTICLES_PER_INPUT {
            let t = match particle_crossing(
                last_particle,
                previous_input,
                input,
                distance_gap,
                time_gap,
            ) {
                Some(t) if t <= 1.0 => t,
                _ => return,
            };

            let particle_input = previous_input.lerp(input, t);
            self.emit_particle(state, &particle_input);
            last_particle = InputMetrics::of(&particle_input);
        }

        log::debug!(
            "stopped emitting particles after {} between two inputs",
            MAX_PARTICLES_PER_INPUT
        );
    }

    fn emit_particle(&mut self, state: &InputModelerState, input: &ModeledStrokeInput) {
        if self.current.last_particle.is_some() {
            self.tip_states
                .push(BrushTipState::extrusion_break(input.position));
        }
        let tip_state = self.evaluate(state, input);
        self.tip_states.push(tip_state);
        self.current.last_particle = Some(InputMetrics::of(input));
    }

    fn evaluate(&mut self, state: &InputModelerState, input: &ModeledStrokeInput) -> BrushTipState {
        let ctx = EvaluationContext {
            state,
            input,
            previous: self.current.previous_input,
            brush_size: self.brush_size,
        };
        evaluate_nodes(&self.nodes, &mut self.current, &mut self.stack, &ctx);
        self.current.previous_input = Some(InputMetrics::of(input));

        self.create_tip_state(input)
    }

    fn create_tip_state(&self, input: &ModeledStrokeInput) -> BrushTipState {
        let mut width_multiplier = 1.0;
        let mut height_multiplier = 1.0;
        let mut slant = self.tip.slant.radians;
        let mut pinch = self.tip.pinch;
        let mut rotation = self.tip.rotation.radians;
        let mut corner_rounding = self.tip.corner_rounding;
        let mut offset = Vector::zero();
        let mut forward_offset = 0.0;
        let mut lateral_offset = 0.0;
        let mut hue_offset = 0.0;
        let mut saturation_multiplier = 1.0;
        let mut luminosity_shift = 0.0;
        let mut opacity_multiplier = 1.0;
        let mut texture_offset = 0.0;

        for (target, &value) in self.targets.iter().zip(&self.current.target_modifiers) {
            match target {
                Target::WidthMultiplier => width_multiplier *= value,
                Target::HeightMultiplier => height_multiplier *= value,
                Target::SizeMultiplier => {
                    width_multiplier *= value;
                    height_multiplier *= value;
                }
                Target::SlantOffsetInRadians => slant += value,
                Target::PinchOffset => pinch += value,
                Target::RotationOffsetInRadians => rotation += value,
                Target::CornerRoundingOffset => corner_rounding += value,
                Target::PositionOffsetXInMultiplesOfBrushSize => offset.x += value,
                Target::PositionOffsetYInMultiplesOfBrushSize => offset.y += value,
                Target::PositionOffsetForwardInMultiplesOfBrushSize => forward_offset += value,
                Target::PositionOffsetLateralInMultiplesOfBrushSize => lateral_offset += value,
                Target::HueOffsetInRadians => hue_offset += value,
                Target::SaturationMultiplier => saturation_multiplier *= value,
                Target::Luminosity => luminosity_shift += value,
                Target::OpacityMultiplier => opacity_multiplier *= value,
                Target::TextureAnimationProgressOffset => texture_offset += value,
            }
        }

        let forward = normalized_or(input.velocity, Vector::zero());
        let direction = if forward == Vector::zero() {
            0.0
        } else {
            forward.y.atan2(forward.x)
        };
        offset += forward * forward_offset + left_normal(forward) * lateral_offset;

        for (target, &[angle, magnitude]) in self.polar_targets.iter().zip(&self.current.polar_modifiers) {
            let angle = match target {
                PolarTarget::PositionOffsetAbsoluteInRadiansAndMultiplesOfBrushSize => angle,
                PolarTarget::PositionOffsetRelativeInRadiansAndMultiplesOfBrushSize => {
                    angle + direction
                }
            };
            let (sin, cos) = angle.sin_cos();
            offset += vector(cos, sin) * magnitude;
        }

        let size = self.brush_size;
        BrushTipState {
            position: input.position + offset * size,
            velocity: input.velocity,
            width: size * self.tip.scale.x * clamp(width_multiplier, 0.0, 2.0),
            height: size * self.tip.scale.y * clamp(height_multiplier, 0.0, 2.0),
            percent_radius: clamp(corner_rounding, 0.0, 1.0),
            rotation: Angle::radians(rotation),
            slant: Angle::radians(clamp(slant, -FRAC_PI_2, FRAC_PI_2)),
            pinch: clamp(pinch, 0.0, 1.0),
            texture_animation_progress_offset: fract(texture_offset),
            hue_offset_in_full_turns: fract(hue_offset / TAU),
            saturation_multiplier: clamp(saturation_multiplier, 0.0, 2.0),
            luminosity_shift: clamp(luminosity_shift, -1.0, 1.0),
            opacity_multiplier: clamp(
                self.tip.opacity_multiplier * opacity_multiplier,
                0.0,
                2.0,
            ),
        }
    }
}

fn clamp(value: f32, min: f32, max: f32) -> f32 {
    value.max(min).min(max)
}

/// Positive fractional part.
fn fract(value: f32) -> f32 {
    if !value.is_finite() {
        return 0.0;
    }
    let f = value - value.floor();
    if f >= 1.0 {
        0.0
    } else {
        f
    }
}

fn is_fixable(
    input: &ModeledStrokeInput,
    state: &InputModelerState,
    distance_bound: f32,
    time_bound: f32,
) -> bool {
    let distance_ok = distance_bound <= 0.0
        || state.complete_traveled_distance - input.traveled_distance >= distance_bound;
    let time_ok =
        time_bound <= 0.0 || state.complete_elapsed_time - input.elapsed_time >= time_bound;

    distance_ok && time_ok
}

/// The interpolation parameter between `previous` and `current` at which both
/// particle gaps measured from `last` are satisfied.
///
/// Returns `None` if the gaps can't be satisfied along this pair of inputs.
fn particle_crossing(
    last: InputMetrics,
    previous: &ModeledStrokeInput,
    current: &ModeledStrokeInput,
    distance_gap: f32,
    time_gap: f32,
) -> Option<f32> {
    let mut t: f32 = 0.0;
    if distance_gap > 0.0 {
        let threshold = last.traveled_distance + distance_gap;
        if threshold > previous.traveled_distance {
            t = t.max(inverse_lerp(
                previous.traveled_distance,
                current.traveled_distance,
                threshold,
            )?);
        }
    }
    if time_gap > 0.0 {
        let threshold = last.elapsed_time + time_gap;
        if threshold > previous.elapsed_time {
            t = t.max(inverse_lerp(previous.elapsed_time, current.elapsed_time, threshold)?);
        }
    }

    if t.is_finite() {
        Some(t)
    } else {
        None
    }
}

fn is_reported(property: OptionalInputProperty, input: &ModeledStrokeInput) -> bool {
    match property {
        OptionalInputProperty::Pressure => input.pressure.is_some(),
        OptionalInputProperty::Tilt => input.tilt.is_some(),
        OptionalInputProperty::Orientation => input.orientation.is_some(),
        OptionalInputProperty::TiltXAndY => input.tilt.is_some() && input.orientation.is_some(),
    }
}

fn about_zero(angle: f32) -> f32 {
    let angle = positive_angle(angle);
    if angle > PI {
        angle - TAU
    } else {
        angle
    }
}

fn source_value(source: Source, ctx: &EvaluationContext) -> Option<f32> {
    let input = ctx.input;
    let size = ctx.brush_size;
    let direction = normalized_or(input.velocity, Vector::zero());
    let has_direction = direction != Vector::zero();

    let value = match source {
        Source::NormalizedPressure => return input.pressure,
        Source::TiltInRadians => return input.tilt,
        Source::TiltXInRadians => {
            let (tilt, orientation) = (input.tilt?, input.orientation?);
            (orientation.cos() * tilt.sin()).atan2(tilt.cos())
        }
        Source::TiltYInRadians => {
            let (tilt, orientation) = (input.tilt?, input.orientation?);
            (orientation.sin() * tilt.sin()).atan2(tilt.cos())
        }
        Source::OrientationInRadians => positive_angle(input.orientation?),
        Source::OrientationAboutZeroInRadians => about_zero(input.orientation?),
        Source::SpeedInMultiplesOfBrushSizePerSecond => input.velocity.length() / size,
        Source::VelocityXInMultiplesOfBrushSizePerSecond => input.velocity.x / size,
        Source::VelocityYInMultiplesOfBrushSizePerSecond => input.velocity.y / size,
        Source::DirectionInRadians if has_direction => positive_angle(direction.y.atan2(direction.x)),
        Source::DirectionAboutZeroInRadians if has_direction => about_zero(direction.y.atan2(direction.x)),
        Source::NormalizedDirectionX if has_direction => direction.x,
        Source::NormalizedDirectionY if has_direction => direction.y,
        Source::DirectionInRadians
        | Source::DirectionAboutZeroInRadians
        | Source::NormalizedDirectionX
        | Source::NormalizedDirectionY => return None,
        Source::DistanceTraveledInMultiplesOfBrushSize => input.traveled_distance / size,
        Source::TimeOfInputInSeconds => input.elapsed_time,
        Source::TimeOfInputInMillis => input.elapsed_time * 1000.0,
        Source::PredictedDistanceTraveledInMultiplesOfBrushSize => {
            (input.traveled_distance - ctx.state.total_real_distance).max(0.0) / size
        }
        Source::PredictedTimeElapsedInSeconds => {
            (input.elapsed_time - ctx.state.total_real_elapsed_time).max(0.0)
        }
        Source::PredictedTimeElapsedInMillis => {
            (input.elapsed_time - ctx.state.total_real_elapsed_time).max(0.0) * 1000.0
        }
        Source::DistanceRemainingInMultiplesOfBrushSize => {
            (ctx.state.complete_traveled_distance - input.traveled_distance) / size
        }
        Source::TimeSinceInputInSeconds => ctx.state.complete_elapsed_time - input.elapsed_time,
        Source::TimeSinceInputInMillis => {
            (ctx.state.complete_elapsed_time - input.elapsed_time) * 1000.0
        }
        Source::AccelerationInMultiplesOfBrushSizePerSecondSquared => {
            input.acceleration.length() / size
        }
        Source::AccelerationXInMultiplesOfBrushSizePerSecondSquared => input.acceleration.x / size,
        Source::AccelerationYInMultiplesOfBrushSizePerSecondSquared => input.acceleration.y / size,
        Source::AccelerationForwardInMultiplesOfBrushSizePerSecondSquared if has_direction => {
            input.acceleration.dot(direction) / size
        }
        Source::AccelerationLateralInMultiplesOfBrushSizePerSecondSquared if has_direction => {
            input.acceleration.dot(left_normal(direction)) / size
        }
        Source::AccelerationForwardInMultiplesOfBrushSizePerSecondSquared
        | Source::AccelerationLateralInMultiplesOfBrushSizePerSecondSquared => return None,
    };

    if value.is_nan() {
        None
    } else {
        Some(value)
    }
}

/// Maps a source value into [0, 1].
///
/// Infinite values, read once the stroke is finished, saturate at the end of
/// the range they run off to, whatever the out of range behavior.
fn normalize_source_value(value: f32, range: [f32; 2], out_of_range: OutOfRange) -> Option<f32> {
    if value.is_infinite() {
        if range[0] == range[1] {
            return None;
        }
        let runs_off_the_end = (value > 0.0) == (range[1] > range[0]);
        return Some(if runs_off_the_end { 1.0 } else { 0.0 });
    }

    inverse_lerp(range[0], range[1], value).map(|value| out_of_range.apply(value))
}

fn binary_op(operation: BinaryOp, a: Option<f32>, b: Option<f32>) -> Option<f32> {
    match operation {
        BinaryOp::Product => Some(a? * b?),
        BinaryOp::Sum => Some(a? + b?),
        BinaryOp::Min => Some(a?.min(b?)),
        BinaryOp::Max => Some(a?.max(b?)),
        BinaryOp::AndThen => a.and(b),
        BinaryOp::OrElse => a.or(b),
        BinaryOp::XorElse => a.xor(b),
    }
}

// Behaviors validate, so the stack never underflows. An empty pop reads as null.
fn pop(stack: &mut Vec<Option<f32>>) -> Option<f32> {
    stack.pop().flatten()
}

fn evaluate_nodes(
    nodes: &[CompiledNode],
    state: &mut RunningState,
    stack: &mut Vec<Option<f32>>,
    ctx: &EvaluationContext,
) {
    stack.clear();

    for compiled in nodes {
        let slot = compiled.slot;
        match compiled.node {
            Node::Source {
                source,
                source_value_range: range,
                source_out_of_range_behavior: out_of_range,
            } => {
                let value = source_value(source, ctx)
                    .and_then(|value| normalize_source_value(value, range, out_of_range));
                stack.push(value);
            }
            Node::Constant { value } => stack.push(Some(value)),
            Node::Noise {
                vary_over,
                base_period,
                ..
            } => {
                let generator = &mut state.noise_generators[slot];
                generator.advance_by(ctx.progress(vary_over) / base_period);
                stack.push(Some(generator.current_value()));
            }
            Node::FallbackFilter { is_fallback_for } => {
                let value = pop(stack);
                stack.push(if is_reported(is_fallback_for, ctx.input) {
                    None
                } else {
                    value
                });
            }
            Node::ToolTypeFilter { enabled_tool_types } => {
                let value = pop(stack);
                stack.push(if enabled_tool_types.contains(ctx.state.tool_type) {
                    value
                } else {
                    None
                });
            }
            Node::Damping {
                damping_source,
                damping_gap,
            } => {
                let value = pop(stack);
                let damped = &mut state.damped_values[slot];
                *damped = match (value, *damped) {
                    (None, previous) => previous,
                    (Some(value), None) => Some(value),
                    (Some(value), Some(previous)) => {
                        if damping_gap <= 0.0 {
                            Some(value)
                        } else {
                            let progress = ctx.progress(damping_source);
                            let t = 1.0 - (-progress / damping_gap).exp();
                            Some(lerp(previous, value, t))
                        }
                    }
                };
                stack.push(*damped);
            }
            Node::Response { ref response_curve } => {
                let value = pop(stack);
                stack.push(value.map(|value| response_curve.evaluate(value)));
            }
            Node::Integral {
                integrate_over,
                integral_out_of_range_behavior,
                integral_value_range: range,
            } => {
                let value = pop(stack);
                let integral = &mut state.integrals[slot];
                if let Some(value) = value {
                    *integral += value * ctx.progress(integrate_over);
                }
                stack.push(
                    inverse_lerp(range[0], range[1], *integral)
                        .map(|value| integral_out_of_range_behavior.apply(value)),
                );
            }
            Node::BinaryOp { operation } => {
                let b = pop(stack);
                let a = pop(stack);
                stack.push(binary_op(operation, a, b));
            }
            Node::Interpolation { interpolation } => {
                let end = pop(stack);
                let start = pop(stack);
                let param = pop(stack);
                let value = match (param, start, end) {
                    (Some(param), Some(start), Some(end)) => match interpolation {
                        Interpolation::Lerp => Some(lerp(start, end, param)),
                        Interpolation::InverseLerp => inverse_lerp(start, end, param),
                    },
                    _ => None,
                };
                stack.push(value);
            }
            Node::Target {
                target_modifier_range: range,
                ..
            } => {
                if let Some(value) = pop(stack) {
                    state.target_modifiers[slot] = lerp(range[0], range[1], value);
                }
            }
            Node::PolarTarget {
                angle_range,
                magnitude_range,
                ..
            } => {
                let magnitude = pop(stack);
                let angle = pop(stack);
                if let (Some(angle), Some(magnitude)) = (angle, magnitude) {
                    state.polar_modifiers[slot] = [
                        lerp(angle_range[0], angle_range[1], angle),
                        lerp(magnitude_range[0], magnitude_range[1], magnitude),
                    ];
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::{BrushBehavior, EnabledToolTypes};
    use crate::input::ToolType;
    use crate::math::point;
    use alloc::vec;

    fn assert_almost_eq(a: f32, b: f32) {
        if (a - b).abs() > 1e-4 {
            panic!("assert almost equal: {:?} != {:?}", a, b);
        }
    }

    /// Inputs moving right at one unit per second, one unit apart.
    fn inputs(count: usize) -> Vec<ModeledStrokeInput> {
        (0..count)
            .map(|i| ModeledStrokeInput {
                position: point(i as f32, 0.0),
                velocity: vector(1.0, 0.0),
                traveled_distance: i as f32,
                elapsed_time: i as f32,
                pressure: Some(0.5),
                ..Default::default()
            })
            .collect()
    }

    fn state(inputs: &[ModeledStrokeInput], stable: usize) -> InputModelerState {
        let last = inputs.last().copied().unwrap_or_default();
        InputModelerState {
            tool_type: ToolType::Stylus,
            complete_elapsed_time: last.elapsed_time,
            complete_traveled_distance: last.traveled_distance,
            total_real_elapsed_time: last.elapsed_time,
            total_real_distance: last.traveled_distance,
            stable_input_count: stable,
            real_input_count: inputs.len(),
        }
    }

    fn pressure_to_size() -> BrushBehavior {
        BrushBehavior::new(vec![
            Node::Source {
                source: Source::NormalizedPressure,
                source_value_range: [0.0, 1.0],
                source_out_of_range_behavior: OutOfRange::Clamp,
            },
            Node::Target {
                target: Target::SizeMultiplier,
                target_modifier_range: [0.5, 1.5],
            },
        ])
    }

    #[test]
    fn fixed_and_volatile_split() {
        let mut modeler = BrushTipModeler::new();
        modeler.start_stroke(&BrushTip::default(), 2.0, 0);

        let all = inputs(4);
        modeler.update_stroke(&state(&all, 2), &all);
        assert_eq!(modeler.new_fixed_tip_states().len(), 2);
        assert_eq!(modeler.volatile_tip_states().len(), 2);
        assert_almost_eq(modeler.new_fixed_tip_states()[0].width, 2.0);
        assert_almost_eq(modeler.new_fixed_tip_states()[0].percent_radius, 1.0);
        assert_eq!(modeler.volatile_tip_states()[1].position, point(3.0, 0.0));

        // Nothing new became stable: the volatile poses are recomputed.
        modeler.update_stroke(&state(&all, 2), &all);
        assert_eq!(modeler.new_fixed_tip_states().len(), 0);
        assert_eq!(modeler.volatile_tip_states().len(), 2);
        assert_eq!(modeler.volatile_tip_states()[0].position, point(2.0, 0.0));

        let all = inputs(5);
        modeler.update_stroke(&state(&all, 5), &all);
        assert_eq!(modeler.new_fixed_tip_states().len(), 3);
        assert_eq!(modeler.volatile_tip_states().len(), 0);
        assert_eq!(modeler.new_fixed_tip_states()[0].position, point(2.0, 0.0));
    }

    #[test]
    fn pressure_modulates_size() {
        let tip = BrushTip {
            scale: vector(1.0, 0.5),
            behaviors: vec![pressure_to_size()],
            ..BrushTip::default()
        };
        let mut modeler = BrushTipModeler::new();
        modeler.start_stroke(&tip, 4.0, 0);

        let mut all = inputs(2);
        all[1].pressure = Some(1.0);
        modeler.update_stroke(&state(&all, 2), &all);
        let states = modeler.new_fixed_tip_states();
        assert_almost_eq(states[0].width, 4.0);
        assert_almost_eq(states[0].height, 2.0);
        assert_almost_eq(states[1].width, 6.0);
        assert_almost_eq(states[1].height, 3.0);
    }

    #[test]
    fn missing_values_keep_the_previous_modifier() {
        let tip = BrushTip {
            behaviors: vec![pressure_to_size()],
            ..BrushTip::default()
        };
        let mut modeler = BrushTipModeler::new();
        modeler.start_stroke(&tip, 1.0, 0);

        let mut all = inputs(3);
        all[0].pressure = None;
        all[1].pressure = Some(0.0);
        all[2].pressure = None;
        modeler.update_stroke(&state(&all, 3), &all);
        let states = modeler.new_fixed_tip_states();
        assert_almost_eq(states[0].width, 1.0);
        assert_almost_eq(states[1].width, 0.5);
        assert_almost_eq(states[2].width, 0.5);
    }

    #[test]
    fn distance_remaining_delays_fixing() {
        let tip = BrushTip {
            behaviors: vec![BrushBehavior::new(vec![
                Node::Source {
                    source: Source::DistanceRemainingInMultiplesOfBrushSize,
                    source_value_range: [0.0, 2.0],
                    source_out_of_range_behavior: OutOfRange::Clamp,
                },
                Node::Target {
                    target: Target::WidthMultiplier,
                    target_modifier_range: [0.0, 1.0],
                },
            ])],
            ..BrushTip::default()
        };
        let mut modeler = BrushTipModeler::new();
        modeler.start_stroke(&tip, 1.0, 0);

        let all = inputs(6);
        modeler.update_stroke(&state(&all, 6), &all);
        // Inputs at distance 0..=3 are at least two brush sizes from the end.
        assert_eq!(modeler.new_fixed_tip_states().len(), 4);
        assert_eq!(modeler.volatile_tip_states().len(), 2);
        assert_almost_eq(modeler.new_fixed_tip_states()[3].width, 1.0);
        assert_almost_eq(modeler.volatile_tip_states()[0].width, 0.5);
        assert_almost_eq(modeler.volatile_tip_states()[1].width, 0.0);
    }

    #[test]
    fn time_behaviors_unfinished() {
        let tip = BrushTip {
            behaviors: vec![BrushBehavior::new(vec![
                Node::Source {
                    source: Source::TimeSinceInputInMillis,
                    source_value_range: [0.0, 500.0],
                    source_out_of_range_behavior: OutOfRange::Clamp,
                },
                Node::Target {
                    target: Target::OpacityMultiplier,
                    target_modifier_range: [1.0, 0.0],
                },
            ])],
            ..BrushTip::default()
        };
        let mut modeler = BrushTipModeler::new();
        modeler.start_stroke(&tip, 1.0, 0);

        let all = inputs(3);
        let mut input_state = state(&all, 3);
        assert!(modeler.has_unfinished_time_behaviors(&input_state));
        input_state.complete_elapsed_time += 0.25;
        assert!(modeler.has_unfinished_time_behaviors(&input_state));
        input_state.complete_elapsed_time += 0.25;
        assert!(!modeler.has_unfinished_time_behaviors(&input_state));

        let mut plain = BrushTipModeler::new();
        plain.start_stroke(&BrushTip::default(), 1.0, 0);
        assert!(!plain.has_unfinished_time_behaviors(&state(&all, 3)));
    }

    #[test]
    fn finished_strokes_saturate_time_behaviors() {
        let tip = BrushTip {
            behaviors: vec![
                BrushBehavior::new(vec![
                    Node::Source {
                        source: Source::TimeSinceInputInMillis,
                        source_value_range: [0.0, 500.0],
                        source_out_of_range_behavior: OutOfRange::Clamp,
                    },
                    Node::Target {
                        target: Target::OpacityMultiplier,
                        target_modifier_range: [1.0, 0.0],
                    },
                ]),
                BrushBehavior::new(vec![
                    Node::Source {
                        source: Source::TimeSinceInputInSeconds,
                        source_value_range: [0.0, 1.0],
                        source_out_of_range_behavior: OutOfRange::Repeat,
                    },
                    Node::Target {
                        target: Target::WidthMultiplier,
                        target_modifier_range: [1.0, 2.0],
                    },
                ]),
            ],
            ..BrushTip::default()
        };
        let mut modeler = BrushTipModeler::new();
        modeler.start_stroke(&tip, 1.0, 0);

        let all = inputs(3);
        let mut input_state = state(&all, 3);
        input_state.complete_elapsed_time = f32::INFINITY;
        assert!(!modeler.has_unfinished_time_behaviors(&input_state));

        modeler.update_stroke(&input_state, &all);
        let states = modeler.new_fixed_tip_states();
        assert_eq!(states.len(), 3);
        assert!(modeler.volatile_tip_states().is_empty());
        for tip_state in states {
            assert_almost_eq(tip_state.opacity_multiplier, 0.0);
            assert_almost_eq(tip_state.width, 2.0);
        }
    }

    #[test]
    fn infinite_source_values_saturate() {
        let range = [0.0, 2.0];
        assert_eq!(normalize_source_value(f32::INFINITY, range, OutOfRange::Mirror), Some(1.0));
        assert_eq!(normalize_source_value(f32::NEG_INFINITY, range, OutOfRange::Repeat), Some(0.0));
        assert_eq!(normalize_source_value(f32::INFINITY, [2.0, 0.0], OutOfRange::Clamp), Some(0.0));
        assert_eq!(normalize_source_value(f32::INFINITY, [1.0, 1.0], OutOfRange::Clamp), None);
        assert_eq!(normalize_source_value(3.0, range, OutOfRange::Clamp), Some(1.0));
        assert_eq!(normalize_source_value(1.0, range, OutOfRange::Clamp), Some(0.5));
    }

    #[test]
    fn particles_are_separated_by_breaks() {
        let tip = BrushTip {
            particle_gap_distance_scale: 1.0,
            ..BrushTip::default()
        };
        let mut modeler = BrushTipModeler::new();
        modeler.start_stroke(&tip, 1.0, 0);
        assert!(modeler.is_particle_brush());

        let mut all = inputs(2);
        all[1].position = point(3.5, 0.0);
        all[1].traveled_distance = 3.5;
        modeler.update_stroke(&state(&all, 2), &all);

        let states = modeler.new_fixed_tip_states();
        assert_eq!(states.len(), 7);
        for (i, tip_state) in states.iter().enumerate() {
            if i % 2 == 0 {
                assert_almost_eq(tip_state.position.x, (i / 2) as f32);
                assert_almost_eq(tip_state.width, 1.0);
            } else {
                assert_eq!(tip_state.width, 0.0);
                assert_eq!(tip_state.height, 0.0);
            }
        }
    }

    #[test]
    fn noise_is_reproducible() {
        let tip = BrushTip {
            behaviors: vec![BrushBehavior::new(vec![
                Node::Noise {
                    seed: 7,
                    vary_over: ProgressDomain::DistanceInMultiplesOfBrushSize,
                    base_period: 0.5,
                },
                Node::Target {
                    target: Target::RotationOffsetInRadians,
                    target_modifier_range: [0.0, 1.0],
                },
            ])],
            ..BrushTip::default()
        };

        let all = inputs(8);
        let mut a = BrushTipModeler::new();
        let mut b = BrushTipModeler::new();
        a.start_stroke(&tip, 1.0, 3);
        b.start_stroke(&tip, 1.0, 3);
        a.update_stroke(&state(&all, 4), &all);
        b.update_stroke(&state(&all, 8), &all);

        let a_states: Vec<_> = a
            .new_fixed_tip_states()
            .iter()
            .chain(a.volatile_tip_states())
            .copied()
            .collect();
        assert_eq!(a_states.as_slice(), b.new_fixed_tip_states());
        for tip_state in &a_states {
            assert!(tip_state.rotation.radians >= 0.0 && tip_state.rotation.radians <= 1.0);
        }
    }

    #[test]
    fn filters_and_binary_ops() {
        let tip = BrushTip {
            behaviors: vec![BrushBehavior::new(vec![
                Node::Constant { value: 0.25 },
                Node::FallbackFilter {
                    is_fallback_for: OptionalInputProperty::Pressure,
                },
                Node::Constant { value: 1.0 },
                Node::ToolTypeFilter {
                    enabled_tool_types: EnabledToolTypes {
                        mouse: false,
                        ..EnabledToolTypes::ALL
                    },
                },
                Node::BinaryOp {
                    operation: BinaryOp::OrElse,
                },
                Node::Target {
                    target: Target::WidthMultiplier,
                    target_modifier_range: [0.0, 2.0],
                },
            ])],
            ..BrushTip::default()
        };
        let mut modeler = BrushTipModeler::new();
        modeler.start_stroke(&tip, 1.0, 0);

        let mut all = inputs(2);
        all[1].pressure = None;
        modeler.update_stroke(&state(&all, 2), &all);
        let states = modeler.new_fixed_tip_states();
        // Pressure is reported for the first input, so the fallback is null.
        assert_almost_eq(states[0].width, 2.0);
        assert_almost_eq(states[1].width, 0.5);
    }

    #[test]
    #[should_panic]
    fn update_before_start() {
        let mut modeler = BrushTipModeler::new();
        let all = inputs(1);
        modeler.update_stroke(&state(&all, 1), &all);
    }

    #[test]
    #[should_panic]
    fn non_positive_brush_size() {
        BrushTipModeler::new().start_stroke(&BrushTip::default(), 0.0, 0);
    }
}
