#![deny(bare_trait_objects)]
#![deny(unconditional_recursion)]
#![allow(clippy::float_cmp)]
#![no_std]

//! Brush definitions and the modeling of brush tip poses.
//!
//! This crate is reexported in [quill](../quill/index.html).
//!
//! # Overview
//!
//! A [`BrushTip`](struct.BrushTip.html) describes the footprint of a brush and a
//! list of [behaviors](behavior/index.html): small expression graphs mapping
//! properties of the stroke input (pressure, speed, time...) to modifications of
//! the footprint (size, rotation, color shifts...).
//!
//! The [`BrushTipModeler`](struct.BrushTipModeler.html) evaluates these behaviors
//! over a stream of [modeled inputs](input/index.html) and produces a sequence of
//! [`BrushTipState`](struct.BrushTipState.html) poses, split between poses that
//! will never change and poses that depend on predicted or recent input.
//!
//! ```
//! use quill_brush::{BrushTip, BrushTipModeler, InputModelerState, ModeledStrokeInput};
//! use quill_brush::math::point;
//!
//! let mut modeler = BrushTipModeler::new();
//! modeler.start_stroke(&BrushTip::default(), 2.0, 0);
//!
//! let inputs = [
//!     ModeledStrokeInput { position: point(0.0, 0.0), ..Default::default() },
//!     ModeledStrokeInput { position: point(1.0, 0.0), traveled_distance: 1.0, ..Default::default() },
//! ];
//! let state = InputModelerState {
//!     complete_traveled_distance: 1.0,
//!     total_real_distance: 1.0,
//!     stable_input_count: 2,
//!     real_input_count: 2,
//!     ..Default::default()
//! };
//! modeler.update_stroke(&state, &inputs);
//!
//! assert_eq!(modeler.new_fixed_tip_states().len(), 2);
//! assert!(modeler.volatile_tip_states().is_empty());
//! ```

#[cfg(any(test, feature = "std"))]
extern crate std;

extern crate alloc;

pub use quill_geom as geom;

#[cfg(feature = "serialization")]
#[macro_use]
pub extern crate serde;

pub mod behavior;
mod easing;
mod error;
pub mod input;
mod modeler;
mod noise;
mod tip;
mod tip_state;

pub use crate::geom::math;

#[doc(inline)]
pub use crate::behavior::BrushBehavior;
#[doc(inline)]
pub use crate::easing::{EasingFunction, PredefinedEasing, StepPosition};
#[doc(inline)]
pub use crate::error::BrushError;
#[doc(inline)]
pub use crate::input::{InputModelerState, ModeledStrokeInput, ToolType};
#[doc(inline)]
pub use crate::modeler::BrushTipModeler;
#[doc(inline)]
pub use crate::noise::NoiseGenerator;
#[doc(inline)]
pub use crate::tip::{BrushCoat, BrushTip};
#[doc(inline)]
pub use crate::tip_state::BrushTipState;
