//! Output serialization for funcpack.
//!
//! Turns an optimized [`funcpack_ir::Program`] into the flat file tree
//! the target loads: one text file of commands per live subroutine, plus
//! one JSON tag file per external hook listing its live targets. Output
//! is an in-memory path → content map so callers decide how to persist
//! it; iteration order is deterministic.

mod error;
mod layout;
mod render;

pub use error::{EmitError, EmitFailure};
pub use layout::{emit, function_path, tag_path, EmitOptions, EmitOutput, TagFile};
pub use render::render_subroutine;
