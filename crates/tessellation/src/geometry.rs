//! Incremental triangulation of the two sides of a stroke.
//!
//! ## Overview
//!
//! The extruder produces, for each brush tip shape, a polyline for the left side
//! of the stroke and one for the right side. [`Geometry`](struct.Geometry.html)
//! buffers these points and merges them into the mesh in the direction of travel.
//! Each new vertex forms a triangle with the last vertex of each side, so the mesh
//! is a strip zig-zagging between the two sides.
//!
//! ## Self-intersections
//!
//! On the inner side of a turn, the outline folds back on itself. A new vertex that
//! would produce a clockwise triangle switches its side to a search mode (see
//! [`SelfIntersection`](struct.SelfIntersection.html)) in which vertices are held
//! back until the outline crosses itself. The vertices emitted after the crossing
//! are then collapsed onto the crossing point. A fold deep enough to cross the
//! outline of the other side collapses that side's vertices instead.
//!
//! ## Partitions
//!
//! Extrusion breaks split the geometry into disconnected partitions. Each partition
//! has its own outline.
//!
//! ## Save points
//!
//! The geometry derived from volatile inputs is rebuilt on every update. A save
//! point records what the geometry looked like before the volatile part was added,
//! and every later change to the mesh is logged so that reverting only touches the
//! data that changed since the save point.

use crate::geom::utils::orientation;
use crate::geom::{Envelope, LineSegment};
use crate::math::{vector, Point, Vector};
use crate::mesh::{Mesh, StrokeVertex};
use crate::side::{IndexRange, SelfIntersection, Side, SideId};
use crate::stroke_shape_update::StrokeShapeUpdate;
use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::mem;

/// Where a partition starts in the mesh and side buffers.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Partition {
    pub first_vertex: u32,
    pub first_triangle: u32,
    pub left_start: usize,
    pub right_start: usize,
    left_discontinuities_start: usize,
    right_discontinuities_start: usize,
}

#[derive(Copy, Clone, Debug, PartialEq)]
struct Tolerances {
    dedupe: f32,
    simplification: f32,
    area: f32,
}

impl Tolerances {
    fn new(brush_epsilon: f32) -> Self {
        Tolerances {
            dedupe: 0.1 * brush_epsilon,
            simplification: 0.1 * brush_epsilon,
            area: 0.01 * brush_epsilon * brush_epsilon,
        }
    }
}

/// The state of a vector at a save point.
///
/// The elements of the saved prefix that were truncated since then are kept so
/// that they can be put back.
#[derive(Clone, Debug)]
struct SavedVec<T> {
    len: usize,
    removed: Vec<T>,
}

impl<T: Clone> SavedVec<T> {
    fn new(items: &[T]) -> Self {
        SavedVec {
            len: items.len(),
            removed: Vec::new(),
        }
    }

    /// Length of the saved prefix that is still intact.
    fn intact_len(&self) -> usize {
        self.len - self.removed.len()
    }

    /// Must be called before truncating `items` to `new_len`.
    fn record_truncate(&mut self, items: &[T], new_len: usize) {
        let intact = self.intact_len();
        if new_len < intact {
            let mut removed = items[new_len..intact].to_vec();
            removed.append(&mut self.removed);
            self.removed = removed;
        }
    }

    fn restore(&mut self, items: &mut Vec<T>) {
        items.truncate(self.intact_len());
        items.append(&mut self.removed);
    }
}

#[derive(Clone, Debug)]
struct SavedSide {
    indices: SavedVec<u32>,
    discontinuities: SavedVec<IndexRange>,
    vertex_buffer: Vec<StrokeVertex>,
    first_simplifiable_index_offset: usize,
    first_mutable_index_offset: usize,
    intersection: Option<SelfIntersection>,
    partition_start: usize,
}

impl SavedSide {
    fn new(side: &Side) -> Self {
        SavedSide {
            indices: SavedVec::new(&side.indices),
            discontinuities: SavedVec::new(&side.intersection_discontinuities),
            vertex_buffer: side.vertex_buffer.clone(),
            first_simplifiable_index_offset: side.first_simplifiable_index_offset,
            first_mutable_index_offset: side.first_mutable_index_offset,
            intersection: side.intersection,
            partition_start: side.partition_start,
        }
    }

    fn restore(&mut self, side: &mut Side) {
        self.indices.restore(&mut side.indices);
        self.discontinuities
            .restore(&mut side.intersection_discontinuities);
        side.vertex_buffer.clear();
        side.vertex_buffer.extend_from_slice(&self.vertex_buffer);
        side.first_simplifiable_index_offset = self.first_simplifiable_index_offset;
        side.first_mutable_index_offset = self.first_mutable_index_offset;
        side.intersection = self.intersection;
        side.partition_start = self.partition_start;
    }
}

/// Everything needed to bring the geometry back to a previous state.
#[derive(Clone, Debug)]
struct SavePoint {
    vertices: SavedVec<StrokeVertex>,
    triangles: SavedVec<[u32; 3]>,
    /// Original value of the saved vertices modified since the save point.
    modified_vertices: BTreeMap<u32, StrokeVertex>,
    left: SavedSide,
    right: SavedSide,
    partitions: SavedVec<Partition>,
    partition_open: bool,
    last_forward: Vector,
    bounds: Envelope,
}

/// Mesh edits go through here so that they are reported in the pending update,
/// logged in the save point and accounted for in the bounds of the mesh.
#[derive(Clone, Debug, Default)]
struct Journal {
    changes: StrokeShapeUpdate,
    save_point: Option<SavePoint>,
    bounds: Envelope,
    /// Set when an edit may have shrunk the bounds.
    bounds_outdated: bool,
}

impl Journal {
    fn append_vertex(&mut self, mesh: &mut Mesh, vertex: StrokeVertex) -> u32 {
        let index = mesh.append_vertex(vertex);
        self.changes.add_vertex(index, vertex.position);
        self.bounds.add_point(vertex.position);
        index
    }

    fn append_triangle(&mut self, mesh: &mut Mesh, triangle: [u32; 3]) {
        let index = mesh.append_triangle(triangle);
        self.changes.add_triangle(index);
    }

    fn set_vertex(&mut self, mesh: &mut Mesh, index: u32, vertex: StrokeVertex) {
        let old = *mesh.vertex(index);
        if let Some(save_point) = &mut self.save_point {
            if (index as usize) < save_point.vertices.intact_len() {
                save_point.modified_vertices.entry(index).or_insert(old);
            }
        }
        self.changes.add_vertex(index, old.position);
        self.changes.add_vertex(index, vertex.position);
        self.move_in_bounds(old.position, vertex.position);
        mesh.set_vertex(index, vertex);
    }

    /// Grows the bounds to `to`, and flags them outdated if `from` was on an
    /// edge that `to` no longer reaches.
    fn move_in_bounds(&mut self, from: Point, to: Point) {
        self.bounds.add_point(to);
        if let Some(rect) = self.bounds.as_box() {
            if (from.x == rect.min.x && to.x > rect.min.x)
                || (from.x == rect.max.x && to.x < rect.max.x)
                || (from.y == rect.min.y && to.y > rect.min.y)
                || (from.y == rect.max.y && to.y < rect.max.y)
            {
                self.bounds_outdated = true;
            }
        }
    }

    /// Recomputes the bounds if an edit may have shrunk them.
    fn update_bounds(&mut self, mesh: &Mesh) {
        if self.bounds_outdated {
            self.bounds = mesh.bounds();
            self.bounds_outdated = false;
        }
    }

    fn set_position(&mut self, mesh: &mut Mesh, index: u32, position: Point) {
        let mut vertex = *mesh.vertex(index);
        vertex.position = position;
        self.set_vertex(mesh, index, vertex);
    }

    fn truncate_mesh(&mut self, mesh: &mut Mesh, vertex_count: u32, triangle_count: u32) {
        for index in vertex_count..mesh.vertex_count() {
            self.changes.add_vertex(index, mesh.position(index));
        }
        if triangle_count < mesh.triangle_count() {
            self.changes.add_triangle(triangle_count);
        }
        if let Some(save_point) = &mut self.save_point {
            save_point
                .vertices
                .record_truncate(mesh.vertices(), vertex_count as usize);
            save_point
                .triangles
                .record_truncate(mesh.triangles(), triangle_count as usize);
        }
        if vertex_count < mesh.vertex_count() {
            self.bounds_outdated = true;
        }
        mesh.truncate(vertex_count, triangle_count);
    }

    fn truncate_side(&mut self, id: SideId, side: &mut Side, len: usize, discontinuities: usize) {
        if let Some(save_point) = &mut self.save_point {
            let saved = match id {
                SideId::Left => &mut save_point.left,
                SideId::Right => &mut save_point.right,
            };
            saved.indices.record_truncate(&side.indices, len);
            saved
                .discontinuities
                .record_truncate(&side.intersection_discontinuities, discontinuities);
        }
        side.indices.truncate(len);
        side.intersection_discontinuities.truncate(discontinuities);
    }

    fn truncate_partitions(&mut self, partitions: &mut Vec<Partition>, len: usize) {
        if let Some(save_point) = &mut self.save_point {
            save_point.partitions.record_truncate(partitions, len);
        }
        partitions.truncate(len);
    }
}

/// Appends vertices to one side of the stroke.
struct SideEditor<'l> {
    mesh: &'l mut Mesh,
    journal: &'l mut Journal,
    side: &'l mut Side,
    opposite: &'l mut Side,
    id: SideId,
    tolerances: Tolerances,
}

impl<'l> SideEditor<'l> {
    fn append(&mut self, vertex: StrokeVertex, search_budget: f32) {
        if let Some(mut intersection) = self.side.intersection.take() {
            match self.continue_intersection(&mut intersection, vertex) {
                IntersectionStep::Pending => {
                    self.side.intersection = Some(intersection);
                    return;
                }
                IntersectionStep::Abandoned => {
                    self.push_vertex(vertex);
                    return;
                }
                IntersectionStep::Done => {}
            }
        }

        self.append_outline_vertex(vertex, search_budget);
    }

    fn append_outline_vertex(&mut self, vertex: StrokeVertex, search_budget: f32) {
        let p = vertex.position;
        let side_last = self.side.last_index();
        if let Some(last) = side_last {
            if (self.mesh.position(last) - p).length() <= self.tolerances.dedupe {
                return;
            }
        }

        let opposite_last = self.opposite.last_index();
        if let Some(shared) = opposite_last {
            if side_last != Some(shared)
                && (self.mesh.position(shared) - p).length() <= self.tolerances.dedupe
            {
                self.side.indices.push(shared);
                self.side.first_mutable_index_offset = self.side.indices.len();
                self.opposite.first_mutable_index_offset = self.opposite.indices.len();
                return;
            }
        }

        let (left, right) = match (side_last, opposite_last, self.id) {
            (Some(s), Some(o), SideId::Left) => (s, o),
            (Some(s), Some(o), SideId::Right) => (o, s),
            _ => {
                self.push_vertex(vertex);
                return;
            }
        };

        let area = orientation(self.mesh.position(left), self.mesh.position(right), p);
        if area > self.tolerances.area {
            if !self.try_simplify(vertex, left, right) {
                let index = self.push_vertex(vertex);
                self.journal
                    .append_triangle(self.mesh, [left, right, index]);
            }
        } else if area >= -self.tolerances.area {
            self.push_vertex(vertex);
        } else {
            self.side.intersection = Some(SelfIntersection {
                last_proposed: vertex,
                remaining_budget: search_budget,
                proposed_count: 1,
            });
        }
    }

    fn push_vertex(&mut self, vertex: StrokeVertex) -> u32 {
        let index = self.journal.append_vertex(self.mesh, vertex);
        self.side.indices.push(index);
        index
    }

    /// Moves the last vertex of the side to `vertex` instead of adding a new one,
    /// when the last vertex is almost on the segment from the one before it to
    /// `vertex`.
    fn try_simplify(&mut self, vertex: StrokeVertex, left: u32, right: u32) -> bool {
        let len = self.side.indices.len();
        if len < self.side.partition_start + 2 {
            return false;
        }
        let offset = len - 1;
        if offset
            < self
                .side
                .first_simplifiable_index_offset
                .max(self.side.first_mutable_index_offset)
        {
            return false;
        }

        let prev1 = self.side.indices[len - 1];
        let prev2 = self.side.indices[len - 2];
        let expected = match self.id {
            SideId::Left => [prev2, right, prev1],
            SideId::Right => [left, prev2, prev1],
        };
        let triangle_count = self.mesh.triangle_count();
        if triangle_count == 0 || self.mesh.triangle(triangle_count - 1) != expected {
            return false;
        }

        let p = vertex.position;
        let p1 = self.mesh.position(prev1);
        let p2 = self.mesh.position(prev2);
        if LineSegment::new(p2, p).distance_to_point(p1) > self.tolerances.simplification
            || (p - p1).dot(p1 - p2) <= 0.0
        {
            return false;
        }

        let area = match self.id {
            SideId::Left => orientation(p2, self.mesh.position(right), p),
            SideId::Right => orientation(self.mesh.position(left), p2, p),
        };
        if area <= self.tolerances.area {
            return false;
        }

        self.journal.set_vertex(self.mesh, prev1, vertex);

        true
    }

    fn is_in_front(&self, p: Point) -> bool {
        let (side_last, opposite_last) = match (self.side.last_index(), self.opposite.last_index()) {
            (Some(s), Some(o)) => (s, o),
            _ => return true,
        };
        let (left, right) = match self.id {
            SideId::Left => (side_last, opposite_last),
            SideId::Right => (opposite_last, side_last),
        };

        orientation(self.mesh.position(left), self.mesh.position(right), p) > self.tolerances.area
    }

    fn continue_intersection(
        &mut self,
        intersection: &mut SelfIntersection,
        vertex: StrokeVertex,
    ) -> IntersectionStep {
        let proposal = LineSegment::new(intersection.last_proposed.position, vertex.position);
        let budget = intersection.remaining_budget;
        if let Some((offset, crossing)) = find_crossing(self.mesh, self.side, &proposal, budget) {
            collapse_fold(self.mesh, self.journal, self.side, offset, crossing);
            log::debug!(
                "{:?} side self-intersection resolved at {:?} after {} proposals",
                self.id,
                crossing,
                intersection.proposed_count
            );
            return IntersectionStep::Done;
        }

        // The fold went through the whole stroke.
        if let Some((offset, crossing)) = find_crossing(self.mesh, self.opposite, &proposal, budget) {
            collapse_fold(self.mesh, self.journal, self.opposite, offset, crossing);
            log::debug!(
                "{:?} side crossed the {:?} side at {:?} after {} proposals",
                self.id,
                self.id.opposite(),
                crossing,
                intersection.proposed_count
            );
            return IntersectionStep::Done;
        }

        if self.is_in_front(vertex.position) {
            return IntersectionStep::Done;
        }

        intersection.remaining_budget -= proposal.length();
        intersection.last_proposed = vertex;
        intersection.proposed_count += 1;
        if intersection.remaining_budget <= 0.0 {
            log::debug!(
                "{:?} side self-intersection search gave up after {} proposals",
                self.id,
                intersection.proposed_count
            );
            return IntersectionStep::Abandoned;
        }

        IntersectionStep::Pending
    }

}

/// Searches the outline of the current partition of `side` backward for a
/// segment crossed by `proposal`.
///
/// Returns the offset of the end of the crossed segment and the crossing point.
fn find_crossing(
    mesh: &Mesh,
    side: &Side,
    proposal: &LineSegment,
    budget: f32,
) -> Option<(usize, Point)> {
    let indices = &side.indices;
    let lowest = (side.partition_start + 1).max(side.first_mutable_index_offset);
    let mut searched = 0.0;
    let mut offset = indices.len();
    while offset > lowest {
        offset -= 1;
        let segment = LineSegment::new(
            mesh.position(indices[offset - 1]),
            mesh.position(indices[offset]),
        );
        if let Some(crossing) = segment.intersection(proposal) {
            return Some((offset, crossing));
        }
        searched += segment.length();
        if searched > budget {
            break;
        }
    }

    None
}

/// Moves the vertices of `side` from `offset` to the end onto `crossing`.
fn collapse_fold(
    mesh: &mut Mesh,
    journal: &mut Journal,
    side: &mut Side,
    offset: usize,
    crossing: Point,
) {
    let len = side.indices.len();
    for i in offset..len {
        let index = side.indices[i];
        journal.set_position(mesh, index, crossing);
    }
    side.intersection_discontinuities.push(IndexRange {
        first: offset,
        last: len - 1,
    });
    side.first_simplifiable_index_offset = len;
}

#[derive(Copy, Clone, Debug, PartialEq)]
enum IntersectionStep {
    /// The proposal was held back.
    Pending,
    /// The fold was resolved or the outline moved back in front.
    Done,
    /// The search budget ran out.
    Abandoned,
}

/// The two sides of a stroke and the partitions they are split into.
#[derive(Clone, Debug)]
pub struct Geometry {
    left: Side,
    right: Side,
    partitions: Vec<Partition>,
    partition_open: bool,
    journal: Journal,
    tolerances: Tolerances,
    last_forward: Vector,
}

impl Default for Geometry {
    fn default() -> Self {
        Geometry::new()
    }
}

impl Geometry {
    pub fn new() -> Self {
        Geometry {
            left: Side::new(),
            right: Side::new(),
            partitions: Vec::new(),
            partition_open: false,
            journal: Journal::default(),
            tolerances: Tolerances::new(0.0),
            last_forward: vector(1.0, 0.0),
        }
    }

    /// Clears the mesh and all state, and derives the tolerances from
    /// `brush_epsilon`.
    pub fn reset(&mut self, mesh: &mut Mesh, brush_epsilon: f32) {
        mesh.clear();
        self.left.clear();
        self.right.clear();
        self.partitions.clear();
        self.partition_open = false;
        self.journal = Journal::default();
        self.tolerances = Tolerances::new(brush_epsilon);
        self.last_forward = vector(1.0, 0.0);
    }

    #[inline]
    pub fn left_side(&self) -> &Side {
        &self.left
    }

    #[inline]
    pub fn right_side(&self) -> &Side {
        &self.right
    }

    #[inline]
    pub fn side(&self, id: SideId) -> &Side {
        match id {
            SideId::Left => &self.left,
            SideId::Right => &self.right,
        }
    }

    /// The bounding rectangle of every vertex of the mesh.
    #[inline]
    pub fn bounds(&self) -> Envelope {
        self.journal.bounds
    }

    #[inline]
    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }

    #[inline]
    pub fn has_save_point(&self) -> bool {
        self.journal.save_point.is_some()
    }

    /// Returns and resets the changes made since the last call.
    pub fn take_changes(&mut self) -> StrokeShapeUpdate {
        mem::take(&mut self.journal.changes)
    }

    /// Buffers a point of the left side. It is added to the mesh by the next call
    /// to `process_new_vertices`.
    pub fn append_left_vertex(&mut self, vertex: StrokeVertex) {
        self.left.vertex_buffer.push(vertex);
    }

    /// Buffers a point of the right side.
    pub fn append_right_vertex(&mut self, vertex: StrokeVertex) {
        self.right.vertex_buffer.push(vertex);
    }

    /// Adds the buffered points of both sides to the mesh.
    ///
    /// The points are interleaved by their projection on `forward`, ties going to
    /// the left side. `search_budget` bounds the length of outline examined when
    /// looking for self-intersections.
    pub fn process_new_vertices(&mut self, mesh: &mut Mesh, forward: Vector, search_budget: f32) {
        self.last_forward = forward;
        let mut left = mem::take(&mut self.left.vertex_buffer);
        let mut right = mem::take(&mut self.right.vertex_buffer);
        if !left.is_empty() || !right.is_empty() {
            self.open_partition(mesh);
        }

        let projection = |v: &StrokeVertex| v.position.to_vector().dot(forward);
        let (mut i, mut j) = (0, 0);
        while i < left.len() || j < right.len() {
            let take_left =
                j >= right.len() || (i < left.len() && projection(&left[i]) <= projection(&right[j]));
            if take_left {
                self.append_vertex(mesh, SideId::Left, left[i], search_budget);
                i += 1;
            } else {
                self.append_vertex(mesh, SideId::Right, right[j], search_budget);
                j += 1;
            }
        }

        left.clear();
        right.clear();
        self.left.vertex_buffer = left;
        self.right.vertex_buffer = right;
        self.journal.update_bounds(mesh);
    }

    fn append_vertex(&mut self, mesh: &mut Mesh, id: SideId, vertex: StrokeVertex, search_budget: f32) {
        let (side, opposite) = match id {
            SideId::Left => (&mut self.left, &mut self.right),
            SideId::Right => (&mut self.right, &mut self.left),
        };
        let mut editor = SideEditor {
            mesh,
            journal: &mut self.journal,
            side,
            opposite,
            id,
            tolerances: self.tolerances,
        };
        editor.append(vertex, search_budget);
    }

    fn open_partition(&mut self, mesh: &Mesh) {
        if self.partition_open {
            return;
        }

        self.partitions.push(Partition {
            first_vertex: mesh.vertex_count(),
            first_triangle: mesh.triangle_count(),
            left_start: self.left.indices.len(),
            right_start: self.right.indices.len(),
            left_discontinuities_start: self.left.intersection_discontinuities.len(),
            right_discontinuities_start: self.right.intersection_discontinuities.len(),
        });
        self.left.start_partition();
        self.right.start_partition();
        self.partition_open = true;
    }

    /// Disconnects the geometry added after this call from the geometry before it.
    ///
    /// Flushes the buffered points and drops any pending self-intersection. Returns
    /// the changes made by this call, which are empty if the geometry was already
    /// at an extrusion break.
    pub fn add_extrusion_break(&mut self, mesh: &mut Mesh) -> StrokeShapeUpdate {
        let previous = mem::take(&mut self.journal.changes);
        if !self.left.vertex_buffer.is_empty() || !self.right.vertex_buffer.is_empty() {
            self.process_new_vertices(mesh, self.last_forward, 0.0);
        }
        self.left.intersection = None;
        self.right.intersection = None;
        self.partition_open = false;

        let update = self.journal.changes;
        self.journal.changes = previous + update;

        update
    }

    /// Removes everything added to the mesh and sides since the last extrusion break.
    pub fn clear_since_last_extrusion_break(&mut self, mesh: &mut Mesh) {
        self.left.vertex_buffer.clear();
        self.right.vertex_buffer.clear();
        if !self.partition_open {
            return;
        }

        let partition = match self.partitions.last() {
            Some(partition) => *partition,
            None => return,
        };
        self.journal
            .truncate_mesh(mesh, partition.first_vertex, partition.first_triangle);
        self.journal.truncate_side(
            SideId::Left,
            &mut self.left,
            partition.left_start,
            partition.left_discontinuities_start,
        );
        self.journal.truncate_side(
            SideId::Right,
            &mut self.right,
            partition.right_start,
            partition.right_discontinuities_start,
        );
        let len = self.partitions.len() - 1;
        self.journal.truncate_partitions(&mut self.partitions, len);
        self.left.start_partition();
        self.right.start_partition();
        self.partition_open = false;
        self.journal.update_bounds(mesh);
    }

    /// Records the current state so that `revert_to_save_point` can come back to it.
    ///
    /// Vertices added before the save point are no longer simplified.
    pub fn set_save_point(&mut self, mesh: &Mesh) {
        self.journal.update_bounds(mesh);
        self.left.first_simplifiable_index_offset = self.left.indices.len();
        self.right.first_simplifiable_index_offset = self.right.indices.len();
        self.journal.save_point = Some(SavePoint {
            vertices: SavedVec::new(mesh.vertices()),
            triangles: SavedVec::new(mesh.triangles()),
            modified_vertices: BTreeMap::new(),
            left: SavedSide::new(&self.left),
            right: SavedSide::new(&self.right),
            partitions: SavedVec::new(&self.partitions),
            partition_open: self.partition_open,
            last_forward: self.last_forward,
            bounds: self.journal.bounds,
        });
    }

    /// Brings the mesh and sides back to their state at the last save point.
    ///
    /// The save point is kept. Does nothing if no save point was set.
    pub fn revert_to_save_point(&mut self, mesh: &mut Mesh) {
        let mut save_point = match self.journal.save_point.take() {
            Some(save_point) => save_point,
            None => return,
        };
        let changes = &mut self.journal.changes;

        let first_vertex = save_point.vertices.intact_len() as u32;
        for index in first_vertex..mesh.vertex_count() {
            changes.add_vertex(index, mesh.position(index));
        }
        let first_triangle = save_point.triangles.intact_len() as u32;
        if first_triangle < mesh.triangle_count() || !save_point.triangles.removed.is_empty() {
            changes.add_triangle(first_triangle);
        }

        save_point.vertices.restore(mesh.vertices_mut());
        save_point.triangles.restore(mesh.triangles_mut());
        for index in first_vertex..mesh.vertex_count() {
            changes.add_vertex(index, mesh.position(index));
        }
        for (&index, vertex) in &save_point.modified_vertices {
            changes.add_vertex(index, mesh.position(index));
            changes.add_vertex(index, vertex.position);
            mesh.set_vertex(index, *vertex);
        }
        save_point.modified_vertices.clear();

        save_point.left.restore(&mut self.left);
        save_point.right.restore(&mut self.right);
        save_point.partitions.restore(&mut self.partitions);
        self.partition_open = save_point.partition_open;
        self.last_forward = save_point.last_forward;

        self.journal.bounds = save_point.bounds;
        self.journal.bounds_outdated = false;
        self.journal.save_point = Some(save_point);
    }

    /// The outline of each non-empty partition, as mesh vertex indices.
    ///
    /// An outline goes backward along the left side and forward along the right
    /// side. Vertices shared by both sides at the ends of the partition appear once.
    pub fn outlines(&self) -> Vec<Vec<u32>> {
        let mut outlines = Vec::with_capacity(self.partitions.len());
        for (i, partition) in self.partitions.iter().enumerate() {
            let (left_end, right_end) = match self.partitions.get(i + 1) {
                Some(next) => (next.left_start, next.right_start),
                None => (self.left.indices.len(), self.right.indices.len()),
            };
            let outline = partition_outline(
                &self.left.indices[partition.left_start..left_end],
                &self.right.indices[partition.right_start..right_end],
            );
            if !outline.is_empty() {
                outlines.push(outline);
            }
        }

        outlines
    }
}

fn partition_outline(left: &[u32], mut right: &[u32]) -> Vec<u32> {
    let mut outline: Vec<u32> = left.iter().rev().copied().collect();
    if left.first().is_some() && left.first() == right.first() {
        right = &right[1..];
    }
    if left.last().is_some() && left.last() == right.last() {
        right = &right[..right.len() - 1];
    }
    outline.extend_from_slice(right);

    outline
}

#[cfg(test)]
use crate::math::point;

#[cfg(test)]
fn strip(geometry: &mut Geometry, mesh: &mut Mesh, from: f32, to: f32) {
    let mut x = from;
    while x <= to {
        geometry.append_left_vertex(StrokeVertex::at(point(x, 1.0)));
        geometry.append_right_vertex(StrokeVertex::at(point(x, -1.0)));
        x += 1.0;
    }
    geometry.process_new_vertices(mesh, vector(1.0, 0.0), 10.0);
}

#[cfg(test)]
fn assert_counter_clockwise(mesh: &Mesh) {
    for &triangle in mesh.triangles() {
        assert!(
            mesh.signed_area(triangle) > 0.0,
            "clockwise triangle {:?}",
            triangle
        );
    }
}

#[test]
fn zig_zag_triangulation() {
    let mut mesh = Mesh::new();
    let mut geometry = Geometry::new();
    geometry.reset(&mut mesh, 0.01);

    geometry.append_left_vertex(StrokeVertex::at(point(0.0, 1.0)));
    geometry.append_left_vertex(StrokeVertex::at(point(2.0, 1.0)));
    geometry.append_right_vertex(StrokeVertex::at(point(0.0, -1.0)));
    geometry.append_right_vertex(StrokeVertex::at(point(2.0, -1.0)));
    geometry.process_new_vertices(&mut mesh, vector(1.0, 0.0), 10.0);

    assert_eq!(mesh.vertex_count(), 4);
    assert_eq!(mesh.triangles(), &[[0, 1, 2], [2, 1, 3]]);
    assert_counter_clockwise(&mesh);
    assert_eq!(geometry.left_side().indices(), &[0, 2]);
    assert_eq!(geometry.right_side().indices(), &[1, 3]);
    assert_eq!(geometry.outlines(), [[2, 0, 1, 3]]);
    assert_eq!(geometry.bounds(), mesh.bounds());

    let changes = geometry.take_changes();
    assert_eq!(changes.first_vertex_offset, Some(0));
    assert_eq!(changes.first_index_offset, Some(0));
    assert!(geometry.take_changes().is_empty());
}

#[test]
fn shared_end_vertices() {
    let mut mesh = Mesh::new();
    let mut geometry = Geometry::new();
    geometry.reset(&mut mesh, 0.01);

    geometry.append_left_vertex(StrokeVertex::at(point(-1.0, 0.0)));
    geometry.append_left_vertex(StrokeVertex::at(point(0.0, 1.0)));
    geometry.append_left_vertex(StrokeVertex::at(point(1.0, 0.0)));
    geometry.append_right_vertex(StrokeVertex::at(point(-1.0, 0.0)));
    geometry.append_right_vertex(StrokeVertex::at(point(0.0, -1.0)));
    geometry.append_right_vertex(StrokeVertex::at(point(1.0, 0.0)));
    geometry.process_new_vertices(&mut mesh, vector(1.0, 0.0), 10.0);

    assert_eq!(mesh.vertex_count(), 4);
    assert_eq!(mesh.triangle_count(), 2);
    assert_counter_clockwise(&mesh);
    assert_eq!(geometry.left_side().indices(), &[0, 1, 3]);
    assert_eq!(geometry.right_side().indices(), &[0, 2, 3]);
    assert_eq!(geometry.outlines(), [[3, 1, 0, 2]]);
}

#[test]
fn collinear_points_are_simplified() {
    let mut mesh = Mesh::new();
    let mut geometry = Geometry::new();
    geometry.reset(&mut mesh, 0.01);

    geometry.append_left_vertex(StrokeVertex::at(point(0.0, 1.0)));
    geometry.append_right_vertex(StrokeVertex::at(point(0.0, -1.0)));
    geometry.append_left_vertex(StrokeVertex::at(point(1.0, 1.0)));
    geometry.append_left_vertex(StrokeVertex::at(point(2.0, 1.0)));
    geometry.append_left_vertex(StrokeVertex::at(point(3.0, 1.0)));
    geometry.process_new_vertices(&mut mesh, vector(1.0, 0.0), 10.0);

    // The left vertex at x = 1 was moved to x = 2, then to x = 3.
    assert_eq!(mesh.vertex_count(), 3);
    assert_eq!(mesh.position(2), point(3.0, 1.0));
    assert_eq!(geometry.left_side().indices(), &[0, 2]);
    assert_counter_clockwise(&mesh);
}

#[test]
fn fold_is_collapsed_onto_the_crossing() {
    let mut mesh = Mesh::new();
    let mut geometry = Geometry::new();
    geometry.reset(&mut mesh, 0.01);

    geometry.append_left_vertex(StrokeVertex::at(point(0.0, 1.0)));
    geometry.append_left_vertex(StrokeVertex::at(point(2.0, 1.0)));
    geometry.append_right_vertex(StrokeVertex::at(point(0.0, -1.0)));
    geometry.append_right_vertex(StrokeVertex::at(point(2.0, -1.0)));
    geometry.process_new_vertices(&mut mesh, vector(1.0, 0.0), 10.0);

    // Behind the last triangle: held back.
    geometry.append_left_vertex(StrokeVertex::at(point(1.0, 0.5)));
    geometry.process_new_vertices(&mut mesh, vector(1.0, 0.0), 10.0);
    assert!(geometry.left_side().intersection().is_some());
    assert_eq!(mesh.vertex_count(), 4);

    // Crosses the outline at (7/6, 1).
    geometry.append_left_vertex(StrokeVertex::at(point(1.5, 2.0)));
    geometry.process_new_vertices(&mut mesh, vector(1.0, 0.0), 10.0);
    assert!(geometry.left_side().intersection().is_none());
    assert_eq!(
        geometry.left_side().intersection_discontinuities(),
        &[IndexRange { first: 1, last: 1 }]
    );
    assert!((mesh.position(2) - point(7.0 / 6.0, 1.0)).length() < 1e-4);
    assert_eq!(geometry.left_side().indices(), &[0, 2, 4]);
    assert_eq!(mesh.position(4), point(1.5, 2.0));
    assert_counter_clockwise(&mesh);
}

#[test]
fn extrusion_breaks_split_outlines() {
    let mut mesh = Mesh::new();
    let mut geometry = Geometry::new();
    geometry.reset(&mut mesh, 0.01);

    strip(&mut geometry, &mut mesh, 0.0, 2.0);
    let update = geometry.add_extrusion_break(&mut mesh);
    assert!(update.is_empty());
    assert!(geometry.add_extrusion_break(&mut mesh).is_empty());
    strip(&mut geometry, &mut mesh, 5.0, 6.0);

    let outlines = geometry.outlines();
    assert_eq!(outlines.len(), 2);
    assert_eq!(outlines[0].len(), 6);
    assert_eq!(outlines[1].len(), 4);
    assert_eq!(geometry.partitions().len(), 2);
    assert_eq!(geometry.partitions()[1].first_vertex, 6);
}

#[test]
fn revert_restores_the_save_point() {
    let mut mesh = Mesh::new();
    let mut geometry = Geometry::new();
    geometry.reset(&mut mesh, 0.01);

    strip(&mut geometry, &mut mesh, 0.0, 2.0);
    geometry.set_save_point(&mesh);
    geometry.take_changes();

    geometry.revert_to_save_point(&mut mesh);
    assert!(geometry.take_changes().is_empty());

    let vertex_count = mesh.vertex_count();
    let triangle_count = mesh.triangle_count();
    let outlines = geometry.outlines();

    strip(&mut geometry, &mut mesh, 3.0, 5.0);
    geometry.add_extrusion_break(&mut mesh);
    strip(&mut geometry, &mut mesh, 8.0, 9.0);
    assert!(mesh.vertex_count() > vertex_count);
    geometry.take_changes();

    geometry.revert_to_save_point(&mut mesh);
    assert_eq!(mesh.vertex_count(), vertex_count);
    assert_eq!(mesh.triangle_count(), triangle_count);
    assert_eq!(geometry.outlines(), outlines);
    assert_eq!(geometry.bounds(), mesh.bounds());
    let changes = geometry.take_changes();
    assert_eq!(changes.first_vertex_offset, Some(vertex_count));
    assert_eq!(changes.first_index_offset, Some(triangle_count));
    assert_eq!(changes.region.as_box().map(|b| b.max.x), Some(9.0));

    // The save point survives the revert.
    strip(&mut geometry, &mut mesh, 3.0, 4.0);
    geometry.revert_to_save_point(&mut mesh);
    assert_eq!(mesh.vertex_count(), vertex_count);
}

#[test]
fn clear_then_revert() {
    let mut mesh = Mesh::new();
    let mut geometry = Geometry::new();
    geometry.reset(&mut mesh, 0.01);

    strip(&mut geometry, &mut mesh, 0.0, 2.0);
    geometry.add_extrusion_break(&mut mesh);
    strip(&mut geometry, &mut mesh, 4.0, 6.0);
    geometry.set_save_point(&mesh);

    let vertices = mesh.vertices().to_vec();
    let triangles = mesh.triangles().to_vec();
    let outlines = geometry.outlines();

    geometry.clear_since_last_extrusion_break(&mut mesh);
    assert_eq!(mesh.vertex_count(), 6);
    assert_eq!(geometry.outlines().len(), 1);

    strip(&mut geometry, &mut mesh, 10.0, 11.0);
    geometry.revert_to_save_point(&mut mesh);
    assert_eq!(mesh.vertices(), &vertices[..]);
    assert_eq!(mesh.triangles(), &triangles[..]);
    assert_eq!(geometry.outlines(), outlines);
    assert_eq!(geometry.bounds(), mesh.bounds());
}

#[test]
fn fold_crossing_the_opposite_side() {
    let mut mesh = Mesh::new();
    let mut geometry = Geometry::new();
    geometry.reset(&mut mesh, 0.01);

    geometry.append_left_vertex(StrokeVertex::at(point(0.0, 1.0)));
    geometry.append_left_vertex(StrokeVertex::at(point(2.0, 1.0)));
    geometry.append_right_vertex(StrokeVertex::at(point(0.0, -1.0)));
    geometry.append_right_vertex(StrokeVertex::at(point(2.0, -1.0)));
    geometry.process_new_vertices(&mut mesh, vector(1.0, 0.0), 10.0);

    geometry.append_left_vertex(StrokeVertex::at(point(1.0, 0.5)));
    geometry.process_new_vertices(&mut mesh, vector(1.0, 0.0), 10.0);
    assert!(geometry.left_side().intersection().is_some());
    assert_eq!(mesh.vertex_count(), 4);

    // Goes through the whole stroke and crosses the right side at (1.3, -1).
    geometry.append_left_vertex(StrokeVertex::at(point(1.5, -2.0)));
    geometry.process_new_vertices(&mut mesh, vector(1.0, 0.0), 10.0);
    assert!(geometry.left_side().intersection().is_none());
    assert!(geometry.left_side().intersection_discontinuities().is_empty());
    assert_eq!(
        geometry.right_side().intersection_discontinuities(),
        &[IndexRange { first: 1, last: 1 }]
    );
    assert!((mesh.position(3) - point(1.3, -1.0)).length() < 1e-4);
    assert_eq!(geometry.left_side().indices(), &[0, 2, 4]);
    assert_eq!(mesh.vertex_count(), 5);
    assert_eq!(mesh.triangles(), &[[0, 1, 2], [2, 1, 3], [2, 3, 4]]);
    assert_counter_clockwise(&mesh);
    assert_eq!(geometry.bounds(), mesh.bounds());
}

#[test]
fn looping_stroke_only_grows() {
    use crate::geom::utils::{left_normal, normalized_or};
    use crate::math::Angle;

    let mut mesh = Mesh::new();
    let mut geometry = Geometry::new();
    geometry.reset(&mut mesh, 0.01);

    let mut vertex_count = 0;
    let mut triangle_count = 0;
    for step in 0..60 {
        if step > 0 && step % 20 == 0 {
            geometry.add_extrusion_break(&mut mesh);
        }

        // A trochoid: loops back over itself once per turn.
        let t = step as f32 * 0.25;
        let (sin, cos) = Angle::radians(t).sin_cos();
        let (sin3, _) = Angle::radians(3.0 * t).sin_cos();
        let center = point(2.0 * cos + t, 2.0 * sin);
        let forward = normalized_or(vector(1.0 - 2.0 * sin, 2.0 * cos), vector(1.0, 0.0));
        let offset = left_normal(forward) * (0.5 + 0.25 * sin3);
        geometry.append_left_vertex(StrokeVertex::at(center + offset));
        geometry.append_right_vertex(StrokeVertex::at(center - offset));
        geometry.process_new_vertices(&mut mesh, forward, 4.0);

        assert!(mesh.vertex_count() >= vertex_count);
        assert!(mesh.triangle_count() >= triangle_count);
        vertex_count = mesh.vertex_count();
        triangle_count = mesh.triangle_count();
        for triangle in mesh.triangles() {
            assert!(triangle.iter().all(|&index| index < vertex_count));
        }
        assert_eq!(geometry.bounds(), mesh.bounds());
    }

    assert!(vertex_count > 0);
    assert_eq!(geometry.partitions().len(), 3);
}
