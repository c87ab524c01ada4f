//! The optimization driver.

use std::collections::BTreeSet;

use funcpack_ir::{Diagnostics, Program, Reference, SubroutineId, Usage, Warning};

use crate::error::OptimizeError;
use crate::{inline, liveness};

/// Default pass cap. Each pass can only shorten call chains, so real
/// programs converge well before this.
pub const DEFAULT_MAX_PASSES: usize = 8;

/// What one optimization run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizeReport {
    pub passes: usize,
    pub converged: bool,
    pub inlined: usize,
    pub live: usize,
    pub dead: usize,
}

/// Run liveness and inlining to a fixpoint (or the pass cap).
///
/// Every subroutine ends settled to live or dead. Per-subroutine inline
/// failures are downgraded to warnings and the subroutine is left intact
/// for the rest of the run; hitting the pass cap is also a warning, since
/// the program is still correct, just less folded.
pub fn optimize(
    program: &mut Program,
    max_passes: usize,
    diags: &mut Diagnostics,
) -> Result<OptimizeReport, OptimizeError> {
    if max_passes == 0 {
        return Err(OptimizeError::NoPassBudget);
    }
    validate_graph(program, diags);

    let mut skip: BTreeSet<SubroutineId> = BTreeSet::new();
    let mut passes = 0;
    let mut inlined = 0;
    let mut converged = false;
    while passes < max_passes {
        passes += 1;
        let liveness_changes = liveness::recompute(program);

        let candidates = inline::find_candidates(program, &skip);
        let mut applied = 0;
        for candidate in &candidates {
            match inline::apply(program, candidate) {
                Ok(true) => applied += 1,
                // Stale snapshot; re-planned next pass.
                Ok(false) => {}
                Err(reason) => {
                    skip.insert(candidate.callee.clone());
                    diags.push_warning(Warning::SubroutineSkipped {
                        id: candidate.callee.to_string(),
                        reason,
                    });
                }
            }
        }
        inlined += applied;

        if liveness_changes == 0 && applied == 0 {
            converged = true;
            break;
        }
    }
    if !converged {
        diags.push_warning(Warning::PassLimitReached { passes });
    }

    let mut live = 0;
    let mut dead = 0;
    for sub in program.iter() {
        match sub.usage {
            Usage::Dead if !sub.keep => dead += 1,
            _ => live += 1,
        }
    }
    Ok(OptimizeReport {
        passes,
        converged,
        inlined,
        live,
        dead,
    })
}

/// Warn about edges pointing at identities absent from the program.
fn validate_graph(program: &Program, diags: &mut Diagnostics) {
    for (caller, edges) in program.graph.iter() {
        for edge in edges {
            if program.by_id(&edge.callee).is_none() {
                let caller_name = match caller {
                    Reference::Sub(id) => id.to_string(),
                    Reference::External(name) => name.clone(),
                };
                diags.push_warning(Warning::UnknownCallee {
                    caller: caller_name,
                    callee: edge.callee.to_string(),
                });
            }
        }
    }
}
