#![deny(bare_trait_objects)]
#![deny(unconditional_recursion)]
#![allow(clippy::float_cmp)]
#![allow(clippy::too_many_arguments)]
#![no_std]

//! Extrusion of brush tip poses into stroke meshes.
//!
//! This crate is reexported in [quill](../quill/index.html).
//!
//! ## Overview
//!
//! The most interesting types of this crate are:
//!
//! * [`StrokeShapeBuilder`](struct.StrokeShapeBuilder.html): runs the brush tip
//!   modeler and the extruder for each update of a stroke.
//! * [`BrushTipExtruder`](struct.BrushTipExtruder.html): connects consecutive
//!   brush tip shapes into a triangle mesh, and replaces the geometry of volatile
//!   poses at each update.
//! * [`BrushTipShape`](struct.BrushTipShape.html): the footprint of a single
//!   brush tip pose, as the convex hull of up to four circles.
//! * [`Geometry`](struct.Geometry.html): the two sides of the stroke, their
//!   self-intersections, partitions and save points.
//! * [`Mesh`](struct.Mesh.html): the vertex and triangle buffers.
//! * [`StrokeShapeUpdate`](struct.StrokeShapeUpdate.html): the part of the mesh
//!   modified by an update.
//!
//! ## Conventions
//!
//! The y axis points up and triangles wind counter-clockwise. The left side of a
//! stroke is on the left of its direction of travel.
//!
//! ## Tolerances
//!
//! The brush epsilon passed when starting a stroke is the size under which
//! details don't matter. It is used as the maximum chord height when flattening
//! arcs and as the minimum radius and separation of the circles of a shape.
//! Vertices closer than a tenth of it are merged.

extern crate alloc;

#[cfg(any(test, feature = "std"))]
extern crate std;

pub use quill_brush as brush;
pub use quill_geom as geom;

#[cfg(feature = "serialization")]
#[macro_use]
pub extern crate serde;

mod brush_tip_extruder;
mod brush_tip_shape;
mod geometry;
mod mesh;
mod side;
mod stroke_shape_builder;
mod stroke_shape_update;

pub use crate::geom::math;

#[doc(inline)]
pub use crate::brush_tip_extruder::BrushTipExtruder;

#[doc(inline)]
pub use crate::brush_tip_shape::{BrushTipShape, ExtrusionPoints, IndexPair, TangentCircleIndices};

#[doc(inline)]
pub use crate::geometry::{Geometry, Partition};

#[doc(inline)]
pub use crate::mesh::{Mesh, StrokeVertex};

#[doc(inline)]
pub use crate::side::{IndexRange, SelfIntersection, Side, SideId};

#[doc(inline)]
pub use crate::stroke_shape_builder::{StrokeShapeBuilder, StrokeShapeBuilderPool};

#[doc(inline)]
pub use crate::stroke_shape_update::StrokeShapeUpdate;
