//! Whole-program optimization for funcpack.
//!
//! Two passes alternate to a fixpoint:
//!
//! - liveness: reachability from external hook roots (and keep-marked
//!   subroutines) over the reference graph, settling every subroutine to
//!   live or dead;
//! - inlining: a subroutine with exactly one live call site folds into
//!   its caller when the call kind allows it.
//!
//! Each inline moves the callee's outgoing edges onto the caller, which
//! can change liveness and expose new single-use callees, so the driver
//! re-runs both until neither makes progress or the pass cap is hit.

mod driver;
mod error;
mod inline;
mod liveness;

pub use driver::{optimize, OptimizeReport, DEFAULT_MAX_PASSES};
pub use error::OptimizeError;
