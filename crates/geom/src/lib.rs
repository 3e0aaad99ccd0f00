#![deny(bare_trait_objects)]
#![deny(unconditional_recursion)]
#![allow(clippy::float_cmp)]
#![allow(clippy::many_single_char_names)]
#![no_std]

//! Simple 2D geometric primitives for brush stroke extrusion, on top of euclid.
//!
//! This crate is reexported in [quill](../quill/index.html).
//!
//! # Overview.
//!
//! This crate implements the maths needed to turn brush tip footprints into
//! triangles:
//!
//! - circles, the outer tangent lines between two circles and arc flattening,
//! - line segments and their intersections,
//! - envelopes, optional bounding rectangles that grow as points are added.
//!
//! # Conventions
//!
//! All types use a y-up frame: positive angles turn counter-clockwise and the
//! "left" of a direction of travel is that direction rotated by a quarter turn
//! counter-clockwise.
//!
//! # Flattening
//!
//! Arcs are approximated with a succession of line segments. The tolerance
//! taken by the flattening functions is the maximum chord height, in other words
//! the maximum distance between the arc and a segment of its approximation.

#[cfg(any(test, feature = "std"))]
extern crate std;

extern crate alloc;

// Reexport dependencies.
pub use arrayvec;
pub use euclid;

#[cfg(feature = "serialization")]
#[macro_use]
pub extern crate serde;

mod circle;
mod envelope;
mod line;
pub mod utils;

#[doc(inline)]
pub use crate::circle::{Circle, TangentAngles};
#[doc(inline)]
pub use crate::envelope::Envelope;
#[doc(inline)]
pub use crate::line::LineSegment;

pub mod math {
    //! f32 aliases of the euclid types used everywhere. The other quill crates
    //! reexport them.

    use crate::euclid;

    /// Alias for ```euclid::default::Point2D<f32>```.
    pub type Point = euclid::default::Point2D<f32>;

    /// Alias for ```euclid::default::Vector2D<f32>```.
    pub type Vector = euclid::default::Vector2D<f32>;

    /// Alias for ```euclid::default::Size2D<f32>```.
    pub type Size = euclid::default::Size2D<f32>;

    /// Alias for ```euclid::default::Box2D<f32>```
    pub type Box2D = euclid::default::Box2D<f32>;

    /// Alias for ```euclid::default::Rotation2D<f32>```
    pub type Rotation = euclid::default::Rotation2D<f32>;

    /// An angle in radians (f32).
    pub type Angle = euclid::Angle<f32>;

    /// Shorthand for `Point::new(x, y)`.
    #[inline]
    pub fn point(x: f32, y: f32) -> Point {
        Point::new(x, y)
    }

    /// Shorthand for `Vector::new(x, y)`.
    #[inline]
    pub fn vector(x: f32, y: f32) -> Vector {
        Vector::new(x, y)
    }

    /// Shorthand for `Size::new(w, h)`.
    #[inline]
    pub fn size(w: f32, h: f32) -> Size {
        Size::new(w, h)
    }

    /// Shorthand for a box centered on `center` with the given dimensions.
    #[inline]
    pub fn box_from_center_and_dimensions(center: Point, width: f32, height: f32) -> Box2D {
        let half = vector(width * 0.5, height * 0.5);
        Box2D::new(center - half, center + half)
    }
}
