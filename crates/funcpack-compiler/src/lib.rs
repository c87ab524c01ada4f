//! The funcpack compiler pipeline.
//!
//! Ties the stages together: a [`Session`] built by the caller is
//! finished into a [`Program`], optionally optimized to a liveness and
//! inlining fixpoint, and serialized into the target's file tree. This
//! crate also re-exports the public surface of the stage crates so most
//! users depend on it alone.
//!
//! ```
//! use funcpack_compiler::{compile, CompileOptions, Cond, HookId, Session};
//! use funcpack_compiler::control::if_then;
//!
//! let mut s = Session::new("pack");
//! s.scoped("tick", |s| {
//!     s.hook(HookId::new("minecraft", "tick"))?;
//!     if_then(s, Cond::pred("entity @p"), &mut |s| {
//!         s.emit_line("say a player is here").map(|_| ())
//!     })
//! })
//! .unwrap();
//!
//! let output = compile(s, &CompileOptions::default()).unwrap();
//! assert!(output
//!     .files
//!     .contains_key("data/pack/function/tick.mcfunction"));
//! ```

use std::collections::BTreeMap;

use thiserror::Error;

pub use funcpack_cond::{Cond, CondError};
pub use funcpack_emit::{EmitFailure, EmitOptions, TagFile};
pub use funcpack_ir::{
    CallKind, Diagnostics, HookId, Instruction, Program, ScoreRange, SubroutineId, Term, Usage,
    Warning,
};
pub use funcpack_lower::{
    control, schedule, score_tree, Case, LowerError, LowerResult, Session, Ticks,
};
pub use funcpack_opt::{OptimizeReport, DEFAULT_MAX_PASSES};

use funcpack_ir::StructureError;
use funcpack_opt::OptimizeError;

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Run the liveness/inlining fixpoint before serializing. Off, every
    /// declared subroutine serializes as written.
    pub optimize: bool,
    /// Optimizer pass cap.
    pub max_passes: usize,
    /// Output tree layout.
    pub emit: EmitOptions,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            optimize: true,
            max_passes: DEFAULT_MAX_PASSES,
            emit: EmitOptions::default(),
        }
    }
}

/// Everything one compilation produced.
#[derive(Debug)]
pub struct CompileOutput {
    /// Relative path → file content, deterministically ordered.
    pub files: BTreeMap<String, String>,
    /// Output units skipped because serialization failed.
    pub failures: Vec<EmitFailure>,
    /// Warnings collected across all stages.
    pub diagnostics: Diagnostics,
    /// Optimizer summary; `None` when optimization was disabled.
    pub report: Option<OptimizeReport>,
}

/// Errors that abort the pipeline outright. Recoverable conditions land
/// in [`CompileOutput::diagnostics`] or [`CompileOutput::failures`]
/// instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error(transparent)]
    Structure(#[from] StructureError),

    #[error(transparent)]
    Optimize(#[from] OptimizeError),
}

/// Run the pipeline on a finished session.
pub fn compile(session: Session, options: &CompileOptions) -> Result<CompileOutput, CompileError> {
    let mut program = session.finish()?;
    let mut diagnostics = Diagnostics::new();

    let report = if options.optimize {
        Some(funcpack_opt::optimize(
            &mut program,
            options.max_passes,
            &mut diagnostics,
        )?)
    } else {
        None
    };

    let emitted = funcpack_emit::emit(&program, &options.emit);
    Ok(CompileOutput {
        files: emitted.files,
        failures: emitted.failures,
        diagnostics,
        report,
    })
}

/// Serialize a compilation's diagnostics as JSON, for build tooling that
/// records warnings alongside the output tree.
pub fn diagnostics_json(output: &CompileOutput) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&output.diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unclosed_scope_fails_compile() {
        let mut s = Session::new("pack");
        s.enter("main");
        assert_eq!(
            compile(s, &CompileOptions::default()).unwrap_err(),
            CompileError::Structure(StructureError::UnclosedScope { depth: 1 })
        );
    }

    #[test]
    fn test_zero_pass_budget_fails_compile() {
        let s = Session::new("pack");
        let options = CompileOptions {
            max_passes: 0,
            ..CompileOptions::default()
        };
        assert_eq!(
            compile(s, &options).unwrap_err(),
            CompileError::Optimize(OptimizeError::NoPassBudget)
        );
    }

    #[test]
    fn test_empty_session_compiles_to_nothing() {
        let s = Session::new("pack");
        let output = compile(s, &CompileOptions::default()).unwrap();
        assert!(output.files.is_empty());
        assert!(output.failures.is_empty());
        assert!(!output.diagnostics.has_warnings());
    }

    #[test]
    fn test_diagnostics_json_shape() {
        let s = Session::new("pack");
        let output = compile(s, &CompileOptions::default()).unwrap();
        let json = diagnostics_json(&output).unwrap();
        assert!(json.contains("\"warnings\""));
    }
}
