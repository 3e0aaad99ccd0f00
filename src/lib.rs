#![deny(bare_trait_objects)]

//! Incremental stroke geometry for pressure and tilt sensitive brushes.
//!
//! # Crates
//!
//! This meta-crate (`quill`) reexports the following sub-crates for convenience:
//!
//! * **quill_geom** - Circles, line segments, envelopes and the f32 math aliases.
//! * **quill_brush** - Brush definitions, stroke input records and the brush tip
//!   modeler turning inputs into brush tip poses.
//! * **quill_tessellation** - Extrusion of brush tip poses into triangle meshes.
//!
//! Each `quill_<name>` crate is reexported as a `<name>` module in `quill`. For example:
//!
//! ```ignore
//! extern crate quill_tessellation;
//! use quill_tessellation::StrokeShapeBuilder;
//! ```
//!
//! Is equivalent to:
//!
//! ```ignore
//! extern crate quill;
//! use quill::tessellation::StrokeShapeBuilder;
//! ```
//!
//! # Feature flags
//!
//! serialization using serde can be enabled on each crate using the
//! `serialization` feature flag (disabled by default).
//!
//! # Examples
//!
//! ## Building the mesh of a stroke
//!
//! A stroke is built incrementally. Each update receives all inputs modeled so far
//! and reports which part of the mesh changed. Inputs past the stable count are
//! predictions: the geometry derived from them is replaced at the next update.
//!
//! ```
//! use quill::brush::{BrushCoat, BrushTip};
//! use quill::brush::input::{InputModelerState, ModeledStrokeInput};
//! use quill::math::point;
//! use quill::tessellation::StrokeShapeBuilder;
//!
//! fn main() {
//!     let coat = BrushCoat::new(BrushTip::default());
//!     let mut builder = StrokeShapeBuilder::new();
//!     builder.start_stroke(&coat, 3.0, 0.05, 0);
//!
//!     let mut inputs = Vec::new();
//!     for i in 0..10 {
//!         let x = i as f32 * 2.0;
//!         inputs.push(ModeledStrokeInput {
//!             position: point(x, (x * 0.2).sin() * 4.0),
//!             traveled_distance: x,
//!             elapsed_time: i as f32 * 0.016,
//!             ..Default::default()
//!         });
//!
//!         let state = InputModelerState {
//!             complete_traveled_distance: x,
//!             complete_elapsed_time: i as f32 * 0.016,
//!             total_real_distance: x,
//!             total_real_elapsed_time: i as f32 * 0.016,
//!             stable_input_count: inputs.len(),
//!             real_input_count: inputs.len(),
//!             ..Default::default()
//!         };
//!
//!         let update = builder.extend_stroke(&state, &inputs);
//!
//!         // Only the vertices and triangles past these offsets need to be uploaded
//!         // to the GPU again.
//!         println!(
//!             " -- first vertex {:?} first triangle {:?}",
//!             update.first_vertex_offset,
//!             update.first_index_offset,
//!         );
//!     }
//!
//!     let mesh = builder.mesh();
//!     println!(" -- {} vertices {} triangles", mesh.vertex_count(), mesh.triangle_count());
//! }
//! ```
//!
//! ## What is the brush epsilon in these examples?
//!
//! Curved parts of the stroke outline are approximated with sequences of line
//! segments. The brush epsilon is the maximum distance allowed between the curve
//! and its approximation, and more generally the size under which details of the
//! geometry are dropped.

pub extern crate quill_brush;
pub extern crate quill_geom;
pub extern crate quill_tessellation;

pub use quill_brush as brush;
pub use quill_geom as geom;
pub use quill_tessellation as tessellation;

pub use geom::math;
