//! Optional bounding rectangles.

use crate::math::{Box2D, Point};

/// An axis-aligned bounding rectangle that starts out empty and grows as points
/// are added to it.
///
/// Unlike a `Box2D`, an empty envelope does not contain any point, not even the
/// origin.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Envelope {
    rect: Option<Box2D>,
}

impl Envelope {
    /// An empty envelope.
    #[inline]
    pub fn new() -> Self {
        Envelope { rect: None }
    }

    /// An envelope containing exactly the provided box.
    #[inline]
    pub fn from_box(rect: Box2D) -> Self {
        let mut envelope = Envelope::new();
        envelope.add_box(&rect);
        envelope
    }

    /// Computes the envelope of a set of points.
    pub fn from_points<Iter: IntoIterator<Item = Point>>(points: Iter) -> Self {
        let mut envelope = Envelope::new();
        envelope.extend(points);
        envelope
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rect.is_none()
    }

    /// The bounding rectangle, if any point was added.
    #[inline]
    pub fn as_box(&self) -> Option<Box2D> {
        self.rect
    }

    pub fn add_point(&mut self, p: Point) {
        match self.rect {
            Some(ref mut rect) => {
                rect.min = Point::min(rect.min, p);
                rect.max = Point::max(rect.max, p);
            }
            None => {
                self.rect = Some(Box2D { min: p, max: p });
            }
        }
    }

    #[inline]
    pub fn add_box(&mut self, rect: &Box2D) {
        self.add_point(rect.min);
        self.add_point(rect.max);
    }

    #[inline]
    pub fn add_envelope(&mut self, other: &Envelope) {
        if let Some(rect) = other.rect {
            self.add_box(&rect);
        }
    }

    /// Empties the envelope.
    #[inline]
    pub fn reset(&mut self) {
        self.rect = None;
    }
}

impl Extend<Point> for Envelope {
    fn extend<Iter: IntoIterator<Item = Point>>(&mut self, points: Iter) {
        for p in points {
            self.add_point(p);
        }
    }
}

#[test]
fn envelope_accumulation() {
    use crate::math::point;

    let mut envelope = Envelope::new();
    assert!(envelope.is_empty());
    assert_eq!(envelope.as_box(), None);

    envelope.add_point(point(1.0, 2.0));
    assert_eq!(envelope.as_box(), Some(Box2D::new(point(1.0, 2.0), point(1.0, 2.0))));

    envelope.add_point(point(-1.0, 5.0));
    let mut other = Envelope::new();
    other.add_point(point(3.0, 0.0));
    envelope.add_envelope(&other);
    envelope.add_envelope(&Envelope::new());
    assert_eq!(envelope.as_box(), Some(Box2D::new(point(-1.0, 0.0), point(3.0, 5.0))));

    envelope.reset();
    assert!(envelope.is_empty());

    let from_points = Envelope::from_points([point(0.0, 1.0), point(2.0, -1.0)]);
    assert_eq!(from_points.as_box(), Some(Box2D::new(point(0.0, -1.0), point(2.0, 1.0))));
}
