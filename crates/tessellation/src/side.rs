//! Per-side outline state of the extruded geometry.

use crate::mesh::StrokeVertex;
use alloc::vec::Vec;

/// Identifies one of the two sides of a stroke, relative to the direction of travel.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum SideId {
    Left,
    Right,
}

impl SideId {
    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            SideId::Left => SideId::Right,
            SideId::Right => SideId::Left,
        }
    }
}

/// An inclusive range of offsets into [`Side::indices`](struct.Side.html#method.indices).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct IndexRange {
    pub first: usize,
    pub last: usize,
}

/// A side whose outline folded back on itself.
///
/// While a side is in this state its new vertices are not added to the mesh.
/// They are proposed one at a time until the segment joining two consecutive
/// proposals crosses the outline already emitted for the side.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SelfIntersection {
    pub last_proposed: StrokeVertex,
    /// Outline length that can still be proposed or searched before giving up.
    pub remaining_budget: f32,
    pub proposed_count: u32,
}

/// The vertices along one side of the stroke.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Side {
    pub(crate) indices: Vec<u32>,
    pub(crate) vertex_buffer: Vec<StrokeVertex>,
    pub(crate) first_simplifiable_index_offset: usize,
    pub(crate) first_mutable_index_offset: usize,
    pub(crate) intersection: Option<SelfIntersection>,
    pub(crate) intersection_discontinuities: Vec<IndexRange>,
    pub(crate) partition_start: usize,
}

impl Side {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mesh vertex indices along the side, in the direction of travel.
    #[inline]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Points waiting to be merged with the other side's points.
    #[inline]
    pub fn vertex_buffer(&self) -> &[StrokeVertex] {
        &self.vertex_buffer
    }

    /// Vertices before this offset are never moved by simplification.
    #[inline]
    pub fn first_simplifiable_index_offset(&self) -> usize {
        self.first_simplifiable_index_offset
    }

    /// Vertices before this offset are never moved, they may be shared with the
    /// other side.
    #[inline]
    pub fn first_mutable_index_offset(&self) -> usize {
        self.first_mutable_index_offset
    }

    #[inline]
    pub fn intersection(&self) -> Option<&SelfIntersection> {
        self.intersection.as_ref()
    }

    /// Ranges of vertices collapsed onto a self-intersection point.
    #[inline]
    pub fn intersection_discontinuities(&self) -> &[IndexRange] {
        &self.intersection_discontinuities
    }

    /// Offset of the first index of the current partition.
    #[inline]
    pub fn partition_start(&self) -> usize {
        self.partition_start
    }

    /// The last vertex of the current partition, if any.
    #[inline]
    pub fn last_index(&self) -> Option<u32> {
        self.indices[self.partition_start..].last().copied()
    }

    pub(crate) fn clear(&mut self) {
        self.indices.clear();
        self.vertex_buffer.clear();
        self.first_simplifiable_index_offset = 0;
        self.first_mutable_index_offset = 0;
        self.intersection = None;
        self.intersection_discontinuities.clear();
        self.partition_start = 0;
    }

    /// Makes the next vertex the start of a new partition.
    pub(crate) fn start_partition(&mut self) {
        let len = self.indices.len();
        self.partition_start = len;
        self.first_simplifiable_index_offset = len;
        self.first_mutable_index_offset = len;
        self.intersection = None;
    }
}
