//! Extrusion of a sequence of brush tip poses into stroke geometry.
//!
//! ## Overview
//!
//! The [`BrushTipExtruder`](struct.BrushTipExtruder.html) turns each pose into a
//! [`BrushTipShape`](../brush_tip_shape/struct.BrushTipShape.html) and connects
//! consecutive shapes with their outer tangents:
//!
//! - the first two shapes of a partition produce the start cap, on the first shape,
//! - every following shape produces the turn around the shape before it,
//! - the end of a partition produces the end cap, on its last shape, or the whole
//!   outline of the shape if the partition only has one.
//!
//! Shapes contained in the previous one are skipped. A shape containing the
//! previous one is connected to the latest shape of the partition it does not
//! contain. If it contains every shape of the partition, the partition is ended
//! with its end cap and a new one starts from it.
//!
//! ## Fixed and volatile poses
//!
//! Poses derived from predicted or recent inputs may change at the next update.
//! Each call to `extend_stroke` first reverts the geometry of the volatile poses
//! of the previous call, then extrudes the new fixed poses, sets a save point, and
//! extrudes the volatile poses.

use crate::brush::BrushTipState;
use crate::brush_tip_shape::{BrushTipShape, ExtrusionPoints};
use crate::geom::utils::normalized_or;
use crate::geom::Envelope;
use crate::geometry::Geometry;
use crate::math::{vector, Vector};
use crate::mesh::{Mesh, StrokeVertex};
use crate::side::Side;
use crate::stroke_shape_update::StrokeShapeUpdate;
use alloc::vec::Vec;

#[derive(Clone, Debug)]
struct ExtrudedShape {
    tip_state: BrushTipState,
    shape: BrushTipShape,
}

/// The shapes the next extruded shape connects to, as offsets in
/// `BrushTipExtruder::shapes`.
#[derive(Copy, Clone, Debug, Default)]
struct ExtrusionState {
    partition_start: usize,
    second_to_last: Option<usize>,
    last: Option<usize>,
    partition_shape_count: usize,
    last_forward: Option<Vector>,
}

/// Builds the mesh of one brush tip of a stroke.
#[derive(Clone, Debug)]
pub struct BrushTipExtruder {
    brush_epsilon: f32,
    is_particle_brush: bool,
    started: bool,
    geometry: Geometry,
    /// Every shape accepted since the start of the stroke. Only truncated when
    /// reverting to the save point.
    shapes: Vec<ExtrudedShape>,
    state: ExtrusionState,
    saved_state: ExtrusionState,
    saved_shape_count: usize,
    points: ExtrusionPoints,
}

impl Default for BrushTipExtruder {
    fn default() -> Self {
        BrushTipExtruder::new()
    }
}

impl BrushTipExtruder {
    pub fn new() -> Self {
        BrushTipExtruder {
            brush_epsilon: 0.0,
            is_particle_brush: false,
            started: false,
            geometry: Geometry::new(),
            shapes: Vec::new(),
            state: ExtrusionState::default(),
            saved_state: ExtrusionState::default(),
            saved_shape_count: 0,
            points: ExtrusionPoints::new(),
        }
    }

    /// Clears `mesh` and prepares the extruder for a new stroke.
    ///
    /// `brush_epsilon` is the size below which details of the geometry can be
    /// dropped. Poses with a width and height under it are extrusion breaks.
    ///
    /// Panics if `brush_epsilon` is not a positive finite number.
    pub fn start_stroke(&mut self, brush_epsilon: f32, is_particle_brush: bool, mesh: &mut Mesh) {
        assert!(
            brush_epsilon > 0.0 && brush_epsilon.is_finite(),
            "brush epsilon must be positive and finite, got {}",
            brush_epsilon
        );

        self.brush_epsilon = brush_epsilon;
        self.is_particle_brush = is_particle_brush;
        self.geometry.reset(mesh, brush_epsilon);
        self.shapes.clear();
        self.state = ExtrusionState::default();
        self.saved_state = ExtrusionState::default();
        self.saved_shape_count = 0;
        self.points.clear();
        self.started = true;
    }

    /// Replaces the geometry of the previous volatile poses with the geometry of
    /// the new fixed and volatile poses.
    ///
    /// Returns the region of the mesh that changed.
    ///
    /// Panics if the stroke was not started.
    pub fn extend_stroke(
        &mut self,
        mesh: &mut Mesh,
        new_fixed_tip_states: &[BrushTipState],
        volatile_tip_states: &[BrushTipState],
    ) -> StrokeShapeUpdate {
        assert!(self.started, "extend_stroke called before start_stroke");

        let mut update = self.revert_to_save_point(mesh);

        for tip_state in new_fixed_tip_states {
            self.extrude(mesh, tip_state);
        }

        self.set_save_point(mesh);

        for tip_state in volatile_tip_states {
            self.extrude(mesh, tip_state);
        }
        self.finish_partition(mesh);

        log::trace!(
            "extruded {} fixed and {} volatile tip states",
            new_fixed_tip_states.len(),
            volatile_tip_states.len()
        );

        update += self.geometry.take_changes();

        update
    }

    /// Ends the current partition with its end cap. The next pose starts a new,
    /// disconnected partition.
    ///
    /// Does nothing if the stroke is already at an extrusion break. Panics if the
    /// stroke was not started.
    pub fn add_extrusion_break(&mut self, mesh: &mut Mesh) -> StrokeShapeUpdate {
        assert!(self.started, "add_extrusion_break called before start_stroke");
        self.finish_partition(mesh);

        self.geometry.take_changes()
    }

    /// Discards the geometry of the current partition. The next pose starts a new
    /// partition.
    ///
    /// Panics if the stroke was not started.
    pub fn clear_since_last_extrusion_break(&mut self, mesh: &mut Mesh) -> StrokeShapeUpdate {
        assert!(
            self.started,
            "clear_since_last_extrusion_break called before start_stroke"
        );
        self.geometry.clear_since_last_extrusion_break(mesh);
        self.points.clear();
        self.state = ExtrusionState {
            partition_start: self.shapes.len(),
            last_forward: self.state.last_forward,
            ..ExtrusionState::default()
        };

        self.geometry.take_changes()
    }

    /// Records the geometry and the extrusion state, for `revert_to_save_point`.
    ///
    /// Panics if the stroke was not started.
    pub fn set_save_point(&mut self, mesh: &Mesh) {
        assert!(self.started, "set_save_point called before start_stroke");
        self.geometry.set_save_point(mesh);
        self.saved_state = self.state;
        self.saved_shape_count = self.shapes.len();
    }

    /// Brings the geometry and the extrusion state back to the last save point.
    ///
    /// The save point is kept. Returns the region of the mesh that changed. Panics
    /// if the stroke was not started.
    pub fn revert_to_save_point(&mut self, mesh: &mut Mesh) -> StrokeShapeUpdate {
        assert!(self.started, "revert_to_save_point called before start_stroke");
        self.geometry.revert_to_save_point(mesh);
        self.state = self.saved_state;
        self.shapes.truncate(self.saved_shape_count);
        self.points.clear();

        self.geometry.take_changes()
    }

    /// The bounding rectangle of the mesh.
    #[inline]
    pub fn bounds(&self) -> Envelope {
        self.geometry.bounds()
    }

    /// The outline of each partition of the stroke.
    pub fn outlines(&self) -> Vec<Vec<u32>> {
        self.geometry.outlines()
    }

    #[inline]
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    #[inline]
    pub fn left_side(&self) -> &Side {
        self.geometry.left_side()
    }

    #[inline]
    pub fn right_side(&self) -> &Side {
        self.geometry.right_side()
    }

    #[inline]
    pub fn brush_epsilon(&self) -> f32 {
        self.brush_epsilon
    }

    #[inline]
    pub fn is_particle_brush(&self) -> bool {
        self.is_particle_brush
    }

    fn extrude(&mut self, mesh: &mut Mesh, tip_state: &BrushTipState) {
        if tip_state.width < self.brush_epsilon && tip_state.height < self.brush_epsilon {
            self.finish_partition(mesh);
            return;
        }

        if self.is_particle_brush {
            self.finish_partition(mesh);
        }

        let new = ExtrudedShape {
            tip_state: *tip_state,
            shape: BrushTipShape::new(tip_state, self.brush_epsilon),
        };

        let last = match self.state.last {
            Some(last) if self.state.partition_shape_count > 0 => last,
            _ => {
                self.start_partition(new);
                return;
            }
        };

        if self.shapes[last].shape.contains(&new.shape) {
            log::debug!("skipping a shape contained in the previous one at {:?}", new.shape.center());
            return;
        }

        if new.shape.contains(&self.shapes[last].shape) {
            self.extrude_containing_shape(mesh, new);
            return;
        }

        if BrushTipShape::tangent_circle_indices(&self.shapes[last].shape, &new.shape).is_none() {
            log::debug!("skipping a shape without tangents at {:?}", new.shape.center());
            return;
        }

        let turn_from = match self.state.second_to_last {
            Some(second_to_last) if self.state.partition_shape_count >= 2 => Some(second_to_last),
            _ => None,
        };
        let tolerance = self.brush_epsilon;
        let appended = match turn_from {
            Some(second_to_last) => BrushTipShape::append_turn_extrusion_points(
                &self.shapes[second_to_last].shape,
                &self.shapes[last].shape,
                &new.shape,
                tolerance,
                &mut self.points,
            ),
            None => BrushTipShape::append_startcap_extrusion_points(
                &self.shapes[last].shape,
                &new.shape,
                tolerance,
                &mut self.points,
            ),
        };
        if !appended {
            self.points.clear();
            log::debug!("skipping a shape without tangents at {:?}", new.shape.center());
            return;
        }

        let origin = self.shapes[turn_from.unwrap_or(last)].shape.center();
        let fallback = self.state.last_forward.unwrap_or_else(|| vector(1.0, 0.0));
        let forward = normalized_or(new.shape.center() - origin, fallback);
        self.emit_points(mesh, last, forward);

        let index = self.push_shape(new);
        self.state.second_to_last = Some(last);
        self.state.last = Some(index);
        self.state.partition_shape_count += 1;
        self.state.last_forward = Some(forward);
    }

    /// Handles a shape containing the last shape of the partition.
    fn extrude_containing_shape(&mut self, mesh: &mut Mesh, new: ExtrudedShape) {
        let start = self.state.partition_start;
        let outside = self.shapes[start..]
            .iter()
            .rposition(|accepted| !new.shape.contains(&accepted.shape))
            .map(|offset| start + offset);

        match outside {
            None => {
                log::debug!(
                    "restarting the partition at {:?}, the new shape contains all of it",
                    new.shape.center()
                );
                self.finish_partition(mesh);
                self.start_partition(new);
            }
            Some(outside) if self.shapes[outside].shape.contains(&new.shape) => {
                log::debug!(
                    "skipping a shape contained in an earlier one at {:?}",
                    new.shape.center()
                );
            }
            Some(outside) => {
                let index = self.push_shape(new);
                self.state.second_to_last = Some(outside);
                self.state.last = Some(index);
                self.state.partition_shape_count = self.state.partition_shape_count.max(2);
            }
        }
    }

    fn push_shape(&mut self, shape: ExtrudedShape) -> usize {
        self.shapes.push(shape);
        self.shapes.len() - 1
    }

    fn start_partition(&mut self, shape: ExtrudedShape) {
        let index = self.push_shape(shape);
        self.state.partition_start = index;
        self.state.second_to_last = None;
        self.state.last = Some(index);
        self.state.partition_shape_count = 1;
    }

    /// Adds the end cap of the current partition and an extrusion break.
    fn finish_partition(&mut self, mesh: &mut Mesh) {
        let tolerance = self.brush_epsilon;
        let fallback = self.state.last_forward.unwrap_or_else(|| vector(1.0, 0.0));
        match (self.state.partition_shape_count, self.state.last, self.state.second_to_last) {
            (0, _, _) | (_, None, _) => {}
            (1, Some(last), _) | (_, Some(last), None) => {
                BrushTipShape::append_whole_shape_extrusion_points(
                    &self.shapes[last].shape,
                    fallback,
                    tolerance,
                    &mut self.points,
                );
                self.emit_points(mesh, last, fallback);
            }
            (_, Some(last), Some(second_to_last)) => {
                let forward = normalized_or(
                    self.shapes[last].shape.center() - self.shapes[second_to_last].shape.center(),
                    fallback,
                );
                if BrushTipShape::append_endcap_extrusion_points(
                    &self.shapes[second_to_last].shape,
                    &self.shapes[last].shape,
                    tolerance,
                    &mut self.points,
                ) {
                    self.emit_points(mesh, last, forward);
                }
            }
        }

        self.geometry.add_extrusion_break(mesh);
        self.state = ExtrusionState {
            partition_start: self.shapes.len(),
            last_forward: self.state.last_forward,
            ..ExtrusionState::default()
        };
    }

    /// Moves the extrusion points to the geometry, with the attributes of the
    /// shape at `source`.
    fn emit_points(&mut self, mesh: &mut Mesh, source: usize, forward: Vector) {
        let tip_state = self.shapes[source].tip_state;
        for &p in &self.points.left {
            self.geometry
                .append_left_vertex(StrokeVertex::new(p, &tip_state));
        }
        for &p in &self.points.right {
            self.geometry
                .append_right_vertex(StrokeVertex::new(p, &tip_state));
        }
        self.points.clear();

        let search_budget = 2.0 * self.shapes[source].shape.max_dimension();
        self.geometry
            .process_new_vertices(mesh, forward, search_budget);
    }
}

#[cfg(test)]
use crate::math::{point, Box2D};

#[cfg(test)]
fn circle(x: f32, y: f32, radius: f32) -> BrushTipState {
    BrushTipState::circle(point(x, y), radius * 2.0)
}

#[cfg(test)]
fn assert_box_near(a: Box2D, b: Box2D, tolerance: f32) {
    let d = (a.min - b.min).abs().max((a.max - b.max).abs());
    if d.x > tolerance || d.y > tolerance {
        panic!("assert box near: {:?} != {:?}", a, b);
    }
}

#[test]
fn single_circle() {
    let mut mesh = Mesh::new();
    let mut extruder = BrushTipExtruder::new();
    extruder.start_stroke(0.01, false, &mut mesh);

    let update = extruder.extend_stroke(&mut mesh, &[circle(0.0, 0.0, 1.0)], &[]);

    assert!(mesh.triangle_count() > 0);
    let bounds = extruder.bounds().as_box().unwrap();
    assert_box_near(bounds, Box2D::new(point(-1.0, -1.0), point(1.0, 1.0)), 0.06);
    assert_eq!(update.region, extruder.bounds());
    assert_eq!(update.first_vertex_offset, Some(0));
    assert_eq!(update.first_index_offset, Some(0));

    let outlines = extruder.outlines();
    assert_eq!(outlines.len(), 1);
    assert!(outlines[0].len() >= 8);
}

#[test]
fn containing_shape_restarts_the_partition() {
    let mut mesh = Mesh::new();
    let mut extruder = BrushTipExtruder::new();
    extruder.start_stroke(0.01, false, &mut mesh);

    extruder.extend_stroke(&mut mesh, &[circle(0.0, 0.0, 1.0), circle(5.0, 0.0, 1.0)], &[]);
    let outlines = extruder.outlines();
    assert_eq!(outlines.len(), 1);

    // The new shape covers the whole partition.
    extruder.extend_stroke(&mut mesh, &[circle(3.0, 0.0, 8.0)], &[]);
    let restarted = extruder.outlines();
    assert_eq!(restarted.len(), 2);
    assert_eq!(restarted[0], outlines[0]);
    assert!(restarted[1].len() >= 8);
    assert_box_near(
        extruder.bounds().as_box().unwrap(),
        Box2D::new(point(-5.0, -8.0), point(11.0, 8.0)),
        0.06,
    );
    assert_eq!(extruder.bounds(), mesh.bounds());

    // Later shapes connect to the new partition.
    extruder.extend_stroke(&mut mesh, &[circle(15.0, 0.0, 1.0)], &[]);
    assert_eq!(extruder.outlines().len(), 2);
    assert!(extruder.bounds().as_box().unwrap().max.x > 15.9);
}

#[test]
fn partially_containing_shape_stays_connected() {
    let mut mesh = Mesh::new();
    let mut extruder = BrushTipExtruder::new();
    extruder.start_stroke(0.01, false, &mut mesh);

    let line = [
        circle(0.0, 0.0, 1.0),
        circle(5.0, 0.0, 1.0),
        circle(10.0, 0.0, 1.0),
        circle(15.0, 0.0, 1.0),
    ];
    extruder.extend_stroke(&mut mesh, &line, &[]);
    assert_eq!(extruder.outlines().len(), 1);

    // Contains the shapes at x = 10 and x = 15, not the ones before.
    extruder.extend_stroke(&mut mesh, &[circle(12.5, 0.0, 4.2)], &[]);
    assert_eq!(extruder.outlines().len(), 1);
    assert_box_near(
        extruder.bounds().as_box().unwrap(),
        Box2D::new(point(-1.0, -4.2), point(16.7, 4.2)),
        0.06,
    );
    assert_eq!(extruder.bounds(), mesh.bounds());

    // The stroke goes on from the large shape.
    extruder.extend_stroke(&mut mesh, &[circle(20.0, 0.0, 1.0)], &[]);
    assert_eq!(extruder.outlines().len(), 1);
    assert!(extruder.bounds().as_box().unwrap().max.x > 20.9);
}

#[test]
fn clear_then_revert_through_the_extruder() {
    let mut mesh = Mesh::new();
    let mut extruder = BrushTipExtruder::new();
    extruder.start_stroke(0.01, false, &mut mesh);

    let fixed = [circle(0.0, 0.0, 1.0), circle(3.0, 0.0, 1.0), circle(6.0, 1.0, 1.0)];
    extruder.extend_stroke(&mut mesh, &fixed, &[]);
    let stroke_vertices = mesh.vertices().to_vec();
    let stroke_triangles = mesh.triangles().to_vec();

    // Back to the fixed geometry, without the end cap.
    extruder.revert_to_save_point(&mut mesh);
    let saved_vertices = mesh.vertices().to_vec();
    assert!(saved_vertices.len() < stroke_vertices.len());

    let update = extruder.clear_since_last_extrusion_break(&mut mesh);
    assert_eq!(mesh.vertex_count(), 0);
    assert!(extruder.outlines().is_empty());
    assert_eq!(update.first_vertex_offset, Some(0));

    let update = extruder.revert_to_save_point(&mut mesh);
    assert_eq!(mesh.vertices(), &saved_vertices[..]);
    assert_eq!(update.first_vertex_offset, Some(0));
    assert_eq!(extruder.bounds(), mesh.bounds());

    // The extrusion state came back with the geometry.
    extruder.extend_stroke(&mut mesh, &[], &[]);
    assert_eq!(mesh.vertices(), &stroke_vertices[..]);
    assert_eq!(mesh.triangles(), &stroke_triangles[..]);
}

#[test]
fn explicit_extrusion_breaks() {
    let mut mesh = Mesh::new();
    let mut extruder = BrushTipExtruder::new();
    extruder.start_stroke(0.01, false, &mut mesh);

    extruder.extend_stroke(&mut mesh, &[circle(0.0, 0.0, 1.0), circle(3.0, 0.0, 1.0)], &[]);
    extruder.revert_to_save_point(&mut mesh);
    let vertex_count = mesh.vertex_count();

    let update = extruder.add_extrusion_break(&mut mesh);
    assert!(!update.is_empty());
    assert!(mesh.vertex_count() > vertex_count);
    assert!(extruder.add_extrusion_break(&mut mesh).is_empty());

    extruder.set_save_point(&mesh);
    extruder.extend_stroke(&mut mesh, &[circle(6.0, 0.0, 1.0), circle(9.0, 0.0, 1.0)], &[]);
    assert_eq!(extruder.outlines().len(), 2);
}

#[test]
fn contained_shapes_are_skipped() {
    let mut mesh = Mesh::new();
    let mut extruder = BrushTipExtruder::new();
    extruder.start_stroke(0.01, false, &mut mesh);

    extruder.extend_stroke(&mut mesh, &[circle(0.0, 0.0, 1.0), circle(5.0, 0.0, 1.0)], &[]);
    let vertex_count = mesh.vertex_count();
    let triangle_count = mesh.triangle_count();

    let update = extruder.extend_stroke(&mut mesh, &[circle(5.2, 0.0, 0.5)], &[]);
    assert_eq!(mesh.vertex_count(), vertex_count);
    assert_eq!(mesh.triangle_count(), triangle_count);
    assert_eq!(extruder.outlines().len(), 1);
    // The end cap was rebuilt identically.
    assert_eq!(update.first_vertex_offset.is_some(), update.first_index_offset.is_some());
}

#[test]
fn volatile_geometry_is_replaced() {
    let mut mesh = Mesh::new();
    let mut extruder = BrushTipExtruder::new();
    extruder.start_stroke(0.01, false, &mut mesh);

    let fixed = [circle(0.0, 0.0, 1.0), circle(3.0, 0.0, 1.0)];
    extruder.extend_stroke(&mut mesh, &fixed, &[circle(6.0, 0.0, 1.0), circle(9.0, 0.0, 1.0)]);
    assert!(extruder.bounds().as_box().unwrap().max.x > 9.9);

    let update = extruder.extend_stroke(&mut mesh, &[], &[circle(4.0, 0.0, 1.0)]);
    assert!(extruder.bounds().as_box().unwrap().max.x < 5.1);
    // The region covers the removed geometry.
    assert!(update.region.as_box().unwrap().max.x > 9.9);
    assert_eq!(extruder.bounds(), mesh.bounds());

    // Same as extruding everything at once.
    let mut expected_mesh = Mesh::new();
    let mut expected = BrushTipExtruder::new();
    expected.start_stroke(0.01, false, &mut expected_mesh);
    expected.extend_stroke(&mut expected_mesh, &fixed, &[circle(4.0, 0.0, 1.0)]);
    assert_eq!(mesh.triangles(), expected_mesh.triangles());
    assert_eq!(mesh.vertices(), expected_mesh.vertices());
}

#[test]
fn extrusion_breaks_and_particles() {
    let mut mesh = Mesh::new();
    let mut extruder = BrushTipExtruder::new();
    extruder.start_stroke(0.01, false, &mut mesh);
    extruder.extend_stroke(
        &mut mesh,
        &[
            circle(0.0, 0.0, 1.0),
            circle(3.0, 0.0, 1.0),
            BrushTipState::extrusion_break(point(4.5, 0.0)),
            circle(6.0, 0.0, 1.0),
            circle(9.0, 0.0, 1.0),
        ],
        &[],
    );
    assert_eq!(extruder.outlines().len(), 2);

    extruder.start_stroke(0.01, true, &mut mesh);
    assert_eq!(mesh.vertex_count(), 0);
    extruder.extend_stroke(
        &mut mesh,
        &[circle(0.0, 0.0, 1.0), circle(1.0, 0.0, 1.0), circle(2.0, 0.0, 1.0)],
        &[],
    );
    assert_eq!(extruder.outlines().len(), 3);
}

#[test]
fn vertex_attributes_follow_the_tip_state() {
    let mut mesh = Mesh::new();
    let mut extruder = BrushTipExtruder::new();
    extruder.start_stroke(0.01, false, &mut mesh);
    let tip_state = BrushTipState {
        opacity_multiplier: 0.5,
        ..circle(0.0, 0.0, 1.0)
    };
    extruder.extend_stroke(&mut mesh, &[tip_state], &[]);

    assert!(mesh.vertex_count() > 0);
    assert!(mesh.vertices().iter().all(|v| v.opacity_shift == -0.5));
}

#[test]
#[should_panic]
fn extend_before_start() {
    let mut mesh = Mesh::new();
    BrushTipExtruder::new().extend_stroke(&mut mesh, &[], &[]);
}

#[test]
#[should_panic]
fn non_positive_epsilon() {
    let mut mesh = Mesh::new();
    BrushTipExtruder::new().start_stroke(0.0, false, &mut mesh);
}
