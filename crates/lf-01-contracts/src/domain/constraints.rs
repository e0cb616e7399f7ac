//! # Structural Constraints
//!
//! Named boolean predicates over `(inputs, outputs)` of one contract. The
//! rejection message names the violated predicate and nothing else.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructuralConstraint {
    /// No inputs may be consumed.
    ZeroInputs,
    /// Exactly one input must be consumed.
    ExactlyOneInput,
    /// Exactly one output must be created.
    ExactlyOneOutput,
}

impl StructuralConstraint {
    pub fn name(&self) -> &'static str {
        match self {
            StructuralConstraint::ZeroInputs => "zero-inputs",
            StructuralConstraint::ExactlyOneInput => "exactly-one-input",
            StructuralConstraint::ExactlyOneOutput => "exactly-one-output",
        }
    }

    pub fn holds(&self, inputs: usize, outputs: usize) -> bool {
        match self {
            StructuralConstraint::ZeroInputs => inputs == 0,
            StructuralConstraint::ExactlyOneInput => inputs == 1,
            StructuralConstraint::ExactlyOneOutput => outputs == 1,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            StructuralConstraint::ZeroInputs => "No inputs should be consumed.",
            StructuralConstraint::ExactlyOneInput => "Exactly one input state should be consumed.",
            StructuralConstraint::ExactlyOneOutput => "Only one output state should be created.",
        }
    }
}

impl fmt::Display for StructuralConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.name(), self.message())
    }
}
