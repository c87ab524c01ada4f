use thiserror::Error;

/// Unrecoverable optimizer misconfiguration. Per-subroutine failures are
/// reported as warnings and skipped, not raised here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptimizeError {
    /// At least one pass is required to settle liveness.
    #[error("optimizer invoked with a pass budget of zero")]
    NoPassBudget,
}
