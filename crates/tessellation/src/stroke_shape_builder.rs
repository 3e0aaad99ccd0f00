//! Modeling and extrusion of a whole stroke.

use crate::brush::input::{InputModelerState, ModeledStrokeInput};
use crate::brush::{BrushCoat, BrushTipModeler};
use crate::brush_tip_extruder::BrushTipExtruder;
use crate::geom::Envelope;
use crate::mesh::Mesh;
use crate::stroke_shape_update::StrokeShapeUpdate;
use alloc::vec::Vec;

/// Builds the mesh of a stroke painted with a brush coat.
///
/// Each update runs the brush tip modeler on the inputs, then extrudes the poses
/// it produced.
///
/// # Example
///
/// ```
/// use quill_tessellation::StrokeShapeBuilder;
/// use quill_tessellation::brush::{BrushCoat, BrushTip};
/// use quill_tessellation::brush::input::{InputModelerState, ModeledStrokeInput};
/// use quill_tessellation::math::point;
///
/// let mut builder = StrokeShapeBuilder::new();
/// builder.start_stroke(&BrushCoat::new(BrushTip::default()), 2.0, 0.01, 0);
///
/// let inputs = [
///     ModeledStrokeInput { position: point(0.0, 0.0), ..Default::default() },
///     ModeledStrokeInput { position: point(4.0, 0.0), traveled_distance: 4.0, ..Default::default() },
/// ];
/// let state = InputModelerState {
///     complete_traveled_distance: 4.0,
///     total_real_distance: 4.0,
///     stable_input_count: 2,
///     real_input_count: 2,
///     ..Default::default()
/// };
/// let update = builder.extend_stroke(&state, &inputs);
///
/// assert!(!update.is_empty());
/// assert_eq!(builder.outlines().len(), 1);
/// ```
#[derive(Clone, Debug, Default)]
pub struct StrokeShapeBuilder {
    modeler: BrushTipModeler,
    extruder: BrushTipExtruder,
    mesh: Mesh,
}

impl StrokeShapeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepares the builder for a new stroke and clears the mesh.
    ///
    /// Panics if the coat does not validate, if `brush_size` or `brush_epsilon`
    /// is not a positive finite number.
    pub fn start_stroke(
        &mut self,
        coat: &BrushCoat,
        brush_size: f32,
        brush_epsilon: f32,
        noise_seed: u32,
    ) {
        if let Err(e) = coat.validate() {
            panic!("invalid brush coat: {}", e);
        }

        let tip = &coat.tips[0];
        self.modeler.start_stroke(tip, brush_size, noise_seed);
        self.extruder
            .start_stroke(brush_epsilon, tip.is_particle_brush(), &mut self.mesh);
    }

    /// Updates the mesh given all inputs of the stroke so far.
    ///
    /// Returns the region of the mesh that changed.
    pub fn extend_stroke(
        &mut self,
        state: &InputModelerState,
        inputs: &[ModeledStrokeInput],
    ) -> StrokeShapeUpdate {
        self.modeler.update_stroke(state, inputs);
        self.extruder.extend_stroke(
            &mut self.mesh,
            self.modeler.new_fixed_tip_states(),
            self.modeler.volatile_tip_states(),
        )
    }

    #[inline]
    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    #[inline]
    pub fn bounds(&self) -> Envelope {
        self.extruder.bounds()
    }

    pub fn outlines(&self) -> Vec<Vec<u32>> {
        self.extruder.outlines()
    }

    #[inline]
    pub fn extruder(&self) -> &BrushTipExtruder {
        &self.extruder
    }

    /// Whether time-driven behaviors still need updates after the last real input.
    pub fn has_unfinished_time_behaviors(&self, state: &InputModelerState) -> bool {
        self.modeler.has_unfinished_time_behaviors(state)
    }
}

/// Reusable builders for regenerating stroke meshes.
///
/// Builders keep their allocations between strokes. Taking a builder from the pool
/// and recycling it after use avoids reallocating the mesh and scratch buffers
/// for every regenerated stroke.
#[derive(Clone, Debug, Default)]
pub struct StrokeShapeBuilderPool {
    builders: Vec<StrokeShapeBuilder>,
}

impl StrokeShapeBuilderPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of idle builders.
    pub fn len(&self) -> usize {
        self.builders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }

    /// Returns an idle builder, or a new one if the pool is empty.
    pub fn take(&mut self) -> StrokeShapeBuilder {
        self.builders.pop().unwrap_or_default()
    }

    /// Returns a builder to the pool.
    pub fn recycle(&mut self, builder: StrokeShapeBuilder) {
        self.builders.push(builder);
    }

    /// Builds the complete mesh of a stroke from all of its inputs, with a pooled
    /// builder.
    ///
    /// The builder is handed to `f` once the mesh is complete, then recycled.
    pub fn regenerate<R>(
        &mut self,
        coat: &BrushCoat,
        brush_size: f32,
        brush_epsilon: f32,
        noise_seed: u32,
        state: &InputModelerState,
        inputs: &[ModeledStrokeInput],
        f: impl FnOnce(&StrokeShapeBuilder) -> R,
    ) -> R {
        let mut builder = self.take();
        builder.start_stroke(coat, brush_size, brush_epsilon, noise_seed);
        builder.extend_stroke(state, inputs);
        let result = f(&builder);
        self.recycle(builder);

        result
    }
}

#[cfg(test)]
use crate::brush::BrushTip;
#[cfg(test)]
use crate::math::point;

#[cfg(test)]
fn line_inputs(count: usize) -> (InputModelerState, Vec<ModeledStrokeInput>) {
    let inputs: Vec<ModeledStrokeInput> = (0..count)
        .map(|i| ModeledStrokeInput {
            position: point(i as f32, 0.0),
            traveled_distance: i as f32,
            elapsed_time: i as f32 * 0.01,
            ..Default::default()
        })
        .collect();
    let last = inputs.last().copied().unwrap_or_default();
    let state = InputModelerState {
        complete_traveled_distance: last.traveled_distance,
        complete_elapsed_time: last.elapsed_time,
        total_real_distance: last.traveled_distance,
        total_real_elapsed_time: last.elapsed_time,
        stable_input_count: count,
        real_input_count: count,
        ..Default::default()
    };

    (state, inputs)
}

#[test]
fn builder_extends_a_line() {
    let mut builder = StrokeShapeBuilder::new();
    builder.start_stroke(&BrushCoat::new(BrushTip::default()), 1.0, 0.01, 0);

    let (state, inputs) = line_inputs(5);
    let update = builder.extend_stroke(&state, &inputs);
    assert!(!update.is_empty());
    assert_eq!(builder.bounds(), builder.mesh().bounds());

    let bounds = builder.bounds().as_box().unwrap();
    assert!((bounds.min.x + 0.5).abs() < 1e-3);
    assert!((bounds.max.x - 4.5).abs() < 1e-3);
    assert_eq!(builder.outlines().len(), 1);
    assert!(!builder.has_unfinished_time_behaviors(&state));
}

#[test]
#[should_panic]
fn coats_need_exactly_one_tip() {
    let mut builder = StrokeShapeBuilder::new();
    builder.start_stroke(&BrushCoat::default(), 1.0, 0.01, 0);
}

#[test]
fn pooled_builders_are_reused() {
    let mut pool = StrokeShapeBuilderPool::new();
    assert!(pool.is_empty());

    let coat = BrushCoat::new(BrushTip::default());
    let (state, inputs) = line_inputs(4);
    let triangles = pool.regenerate(&coat, 1.0, 0.01, 0, &state, &inputs, |builder| {
        builder.mesh().triangle_count()
    });
    assert!(triangles > 0);
    assert_eq!(pool.len(), 1);

    let again = pool.regenerate(&coat, 1.0, 0.01, 0, &state, &inputs, |builder| {
        builder.mesh().triangle_count()
    });
    assert_eq!(again, triangles);
    assert_eq!(pool.len(), 1);
}
