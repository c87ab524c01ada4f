//! Render and structure error types.

use thiserror::Error;

use crate::term::{ChoiceId, SubroutineId};

/// Fatal errors raised while rendering one output unit.
///
/// A render error aborts serialization of the file it occurred in, not the
/// whole compile.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// A call term points at a subroutine the optimizer marked unused and
    /// no keep override exists. This is an invariant violation, never a
    /// normal runtime condition.
    #[error("dangling call to unused subroutine {0}")]
    DanglingCall(SubroutineId),

    /// The same choice id occurred with a different number of alternatives.
    #[error("choice {0:?} occurs with mismatched alternative counts")]
    ChoiceArity(ChoiceId),

    /// A choice set with no alternatives cannot produce a line.
    #[error("choice {0:?} has no alternatives")]
    EmptyChoice(ChoiceId),

    /// Choice sets may not nest inside another choice's alternatives.
    #[error("choice {0:?} nested inside an alternative")]
    NestedChoice(ChoiceId),
}

/// Fatal errors raised at construction time, before compilation proper.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructureError {
    /// A scope exit with no matching enter.
    #[error("scope exit with no matching enter")]
    ScopeUnderflow,

    /// Compilation finished with scopes still open.
    #[error("finished with {depth} unexited scope(s)")]
    UnclosedScope { depth: usize },

    /// A score literal outside the 32-bit signed range the target supports.
    #[error("score literal {0} outside the 32-bit signed range")]
    ScoreOutOfRange(i64),

    /// A score range whose minimum exceeds its maximum matches nothing.
    #[error("empty score range: {min} greater than {max}")]
    EmptyRange { min: i32, max: i32 },

    /// A score range with neither bound constrains nothing.
    #[error("score range has no bounds")]
    UnboundedRange,

    /// Two dispatch cases claim the same score value.
    #[error("duplicate dispatch value {0}")]
    DuplicateDispatchValue(i64),
}
