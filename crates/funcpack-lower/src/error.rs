//! Lowering error types.

use thiserror::Error;

use funcpack_cond::CondError;
use funcpack_ir::StructureError;

/// Errors raised while lowering control flow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LowerError {
    #[error(transparent)]
    Structure(#[from] StructureError),

    /// Emitting requires an open subroutine scope.
    #[error("instruction emitted outside any subroutine scope")]
    OutsideSubroutine,

    #[error(transparent)]
    Cond(#[from] CondError),

    /// An internal consistency check failed.
    #[error("internal lowering error: {0}")]
    Internal(String),
}

/// Lowering result type alias.
pub type LowerResult<T> = Result<T, LowerError>;
