//! Single-use inlining.

use std::collections::BTreeSet;

use funcpack_ir::{CallKind, Instruction, Program, Reference, SubroutineId, Term, Usage};

/// One planned inline, captured from a graph snapshot before any body is
/// mutated this pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Candidate {
    pub caller: SubroutineId,
    pub callee: SubroutineId,
    pub kind: CallKind,
    pub slot: usize,
}

/// Find every subroutine foldable into its sole caller.
///
/// Eligible: exactly one inbound edge, from another subroutine (not an
/// external root, not itself), live, not keep-marked, and a call kind
/// that permits substitution — plain calls take any body, execute calls
/// only a single-instruction one, scoped-prefix bodies never fold.
pub(crate) fn find_candidates(program: &Program, skip: &BTreeSet<SubroutineId>) -> Vec<Candidate> {
    let inbound = program.graph.inbound();
    let mut out = Vec::new();
    for (callee, callers) in &inbound {
        if callers.len() != 1 || skip.contains(callee) {
            continue;
        }
        let (caller_ref, kind, slot) = &callers[0];
        let Reference::Sub(caller) = caller_ref else {
            continue;
        };
        if caller == callee {
            continue;
        }
        let Some(slot) = slot else { continue };
        let Some(sub) = program.by_id(callee) else {
            // Unknown callees are warned about by graph validation.
            continue;
        };
        if sub.keep || sub.usage == Usage::Dead {
            continue;
        }
        match kind {
            CallKind::Plain => {}
            CallKind::Execute if sub.instruction_count() == 1 => {}
            _ => continue,
        }
        out.push(Candidate {
            caller: caller.clone(),
            callee: callee.clone(),
            kind: *kind,
            slot: *slot,
        });
    }
    out
}

/// Apply one planned inline.
///
/// Returns `Ok(false)` when the snapshot went stale (an earlier inline
/// this pass moved the edge); the candidate will be re-planned next pass.
/// `Err` means the program contradicts the graph; the caller records a
/// skip warning for the callee.
pub(crate) fn apply(program: &mut Program, c: &Candidate) -> Result<bool, String> {
    let caller_ref = Reference::Sub(c.caller.clone());
    if !program
        .graph
        .has_edge(&caller_ref, &c.callee, c.kind, Some(c.slot))
    {
        return Ok(false);
    }

    match c.kind {
        CallKind::Plain => {
            let body: Vec<Instruction> = program
                .by_id(&c.callee)
                .map(|sub| sub.instructions().cloned().collect())
                .ok_or_else(|| format!("callee {} not in program", c.callee))?;
            let slot = caller_slot(program, c)?;
            let pos = slot
                .instrs
                .iter()
                .position(|instr| instr.as_plain_call() == Some(&c.callee))
                .ok_or_else(|| format!("no plain call to {} in slot {}", c.callee, c.slot))?;
            slot.instrs.splice(pos..=pos, body);
        }
        CallKind::Execute => {
            let replacement: Vec<Term> = program
                .by_id(&c.callee)
                .and_then(|sub| sub.single_instruction())
                .map(|instr| instr.terms.clone())
                .ok_or_else(|| format!("{} is not a single instruction", c.callee))?;
            let slot = caller_slot(program, c)?;
            let instr = slot
                .instrs
                .iter_mut()
                .find(|instr| matches!(instr.terms.last(), Some(Term::Call(id)) if *id == c.callee))
                .ok_or_else(|| format!("no execute call to {} in slot {}", c.callee, c.slot))?;
            // Substitute the callee's command after the trailing `run`.
            instr.terms.pop();
            instr.terms.extend(replacement);
        }
        CallKind::With => {
            return Err("scoped-prefix body offered for inlining".to_string());
        }
    }

    program
        .graph
        .remove_edge(&caller_ref, &c.callee, c.kind, Some(c.slot));
    let mut moved = program.graph.take_edges(&Reference::Sub(c.callee.clone()));
    for edge in &mut moved {
        edge.slot = Some(c.slot);
        // An execute substitution puts the callee's command under the
        // caller's prefix; a plain call it carried is now an execute call.
        if c.kind == CallKind::Execute && edge.kind == CallKind::Plain {
            edge.kind = CallKind::Execute;
        }
    }
    program.graph.append_edges(caller_ref, moved);
    if let Some(sub) = program.by_id_mut(&c.callee) {
        sub.usage = Usage::Dead;
    }
    Ok(true)
}

fn caller_slot<'a>(
    program: &'a mut Program,
    c: &Candidate,
) -> Result<&'a mut funcpack_ir::Slot, String> {
    program
        .by_id_mut(&c.caller)
        .ok_or_else(|| format!("caller {} not in program", c.caller))?
        .body
        .get_mut(c.slot)
        .ok_or_else(|| format!("caller {} has no slot {}", c.caller, c.slot))
}
