use crate::behavior::NodeKind;
use thiserror::Error;

/// Problems found while validating a brush definition.
#[derive(Error, Copy, Clone, Debug, PartialEq)]
pub enum BrushError {
    #[error("Brush tip parameter {name} is {value}, expected a value in [{min}, {max}].")]
    ParameterOutOfRange {
        name: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },
    #[error("Brush tip parameter {name} is not finite.")]
    NonFiniteParameter { name: &'static str },
    #[error("Behavior node {index} ({kind:?}) needs {needed} input(s) but only {available} are available.")]
    StackUnderflow {
        index: usize,
        kind: NodeKind,
        needed: usize,
        available: usize,
    },
    #[error("Behavior ends with {count} value(s) that don't reach a target.")]
    DanglingValues { count: usize },
    #[error("Behavior node {index} ({kind:?}) has an invalid parameter: {reason}.")]
    InvalidNode {
        index: usize,
        kind: NodeKind,
        reason: &'static str,
    },
    #[error("Behavior has no nodes.")]
    EmptyBehavior,
    #[error("Brush coat has {count} tips, expected exactly one.")]
    UnsupportedTipCount { count: usize },
}
