use crate::geom::Envelope;
use crate::math::Point;
use core::ops::{Add, AddAssign};

/// The part of a stroke mesh modified by one update.
///
/// `region` covers every vertex position that was added, moved or removed.
/// `first_index_offset` is the index of the first triangle that was added or
/// removed, and `first_vertex_offset` the index of the first vertex that was
/// added, modified or removed. Everything past these offsets should be
/// considered stale.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct StrokeShapeUpdate {
    pub region: Envelope,
    pub first_index_offset: Option<u32>,
    pub first_vertex_offset: Option<u32>,
}

fn min_offset(a: Option<u32>, b: Option<u32>) -> Option<u32> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

impl StrokeShapeUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if nothing changed.
    pub fn is_empty(&self) -> bool {
        self.region.is_empty()
            && self.first_index_offset.is_none()
            && self.first_vertex_offset.is_none()
    }

    /// Records a vertex that was added, modified or removed at `position`.
    pub fn add_vertex(&mut self, index: u32, position: Point) {
        self.region.add_point(position);
        self.first_vertex_offset = min_offset(self.first_vertex_offset, Some(index));
    }

    /// Records a triangle that was added or removed.
    pub fn add_triangle(&mut self, index: u32) {
        self.first_index_offset = min_offset(self.first_index_offset, Some(index));
    }

    /// Merges the changes of another update into this one.
    pub fn combine(&mut self, other: &StrokeShapeUpdate) {
        self.region.add_envelope(&other.region);
        self.first_index_offset = min_offset(self.first_index_offset, other.first_index_offset);
        self.first_vertex_offset = min_offset(self.first_vertex_offset, other.first_vertex_offset);
    }
}

impl AddAssign for StrokeShapeUpdate {
    fn add_assign(&mut self, other: StrokeShapeUpdate) {
        self.combine(&other);
    }
}

impl Add for StrokeShapeUpdate {
    type Output = StrokeShapeUpdate;
    fn add(mut self, other: StrokeShapeUpdate) -> StrokeShapeUpdate {
        self += other;
        self
    }
}

#[test]
fn combine_updates() {
    use crate::math::{point, Box2D};

    let mut a = StrokeShapeUpdate::new();
    assert!(a.is_empty());
    a.add_vertex(4, point(1.0, 1.0));
    a.add_triangle(7);

    let mut b = StrokeShapeUpdate::new();
    b.add_vertex(2, point(-1.0, 3.0));
    b.add_vertex(9, point(0.0, 0.0));

    let c = a + b;
    assert_eq!(
        c.region.as_box(),
        Some(Box2D::new(point(-1.0, 0.0), point(1.0, 3.0)))
    );
    assert_eq!(c.first_vertex_offset, Some(2));
    assert_eq!(c.first_index_offset, Some(7));
    assert_eq!(c + StrokeShapeUpdate::new(), c);
}
