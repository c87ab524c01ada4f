//! Shared IR for the funcpack compiler.
//!
//! This crate defines the vocabulary every stage works over: [`Term`]s,
//! [`Instruction`]s, [`Subroutine`]s and the arena that owns them
//! ([`Program`]), the cross-subroutine [`ReferenceGraph`], structured
//! [`Diagnostics`], and the render/structure error types.

mod diag;
mod error;
mod graph;
mod instruction;
mod range;
mod subroutine;
mod term;

pub use diag::{Diagnostics, Warning, MAX_WARNINGS};
pub use error::{RenderError, StructureError};
pub use graph::{CallEdge, CallKind, Reference, ReferenceGraph};
pub use instruction::Instruction;
pub use range::{checked_score, ScoreRange};
pub use subroutine::{
    AllLive, HookId, Program, Slot, SubIdx, Subroutine, Usage, UsageLookup,
};
pub use term::{ChoiceId, ChoiceIds, ChoiceSet, SubroutineId, Term};
