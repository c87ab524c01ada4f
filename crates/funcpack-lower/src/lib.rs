//! Control-flow lowering for funcpack.
//!
//! The target format has no native branching or loops — only "call
//! subroutine" and a single conditional prefix per command. This crate
//! turns structured control flow into subroutines and guarded calls:
//!
//! - [`Session`] owns the program under construction, the namespace/path
//!   scope stack, and deterministic name allocation.
//! - [`control`] lowers if/else, while, do-while, with-prefix blocks, and
//!   the short-circuit flag protocol for compound disjunctions.
//! - [`score_tree`] compiles a balanced binary range-dispatch tree over a
//!   named integer register.
//! - [`schedule`] wraps a block for delayed invocation with time-unit
//!   normalization.

pub mod control;
mod error;
mod schedule;
mod score_tree;
mod session;

pub use control::{do_while, if_else, if_then, while_loop, with_prefix};
pub use error::{LowerError, LowerResult};
pub use schedule::{schedule, Ticks, TICKS_PER_DAY, TICKS_PER_SECOND};
pub use score_tree::{score_tree, Case};
pub use session::{Session, FLAG_OBJECTIVE};
