//! Binary range dispatch over a scoreboard value.
//!
//! Dispatching one of N cases on a runtime integer would cost N guard
//! checks if emitted flat. Splitting the range in half at each level and
//! guarding each half with a range match gives ceil(log2 N) checks on any
//! path instead.

use funcpack_ir::{checked_score, Instruction, ScoreRange, StructureError, SubroutineId, Term};

use crate::error::LowerResult;
use crate::session::Session;

/// One dispatch case: the score value it matches and its body.
pub struct Case {
    pub value: i64,
    pub body: Vec<Instruction>,
}

impl Case {
    pub fn new(value: i64, body: Vec<Instruction>) -> Self {
        Self { value, body }
    }
}

/// Compile a balanced dispatch tree over `holder`'s score in `objective`.
///
/// Cases are sorted by value; duplicates and values outside the target's
/// score width are rejected. Returns the root subroutine, which callers
/// invoke after setting the score.
pub fn score_tree(
    s: &mut Session,
    holder: &str,
    objective: &str,
    mut cases: Vec<Case>,
) -> LowerResult<SubroutineId> {
    cases.sort_by_key(|c| c.value);
    for case in &cases {
        checked_score(case.value)?;
    }
    for pair in cases.windows(2) {
        if pair[0].value == pair[1].value {
            return Err(StructureError::DuplicateDispatchValue(pair[0].value).into());
        }
    }
    s.anonymous("case", |s| dispatch(s, holder, objective, &cases))
}

/// Emit the current level of the tree: split the cases at the midpoint
/// and guard each half by its value range.
fn dispatch(s: &mut Session, holder: &str, objective: &str, cases: &[Case]) -> LowerResult<()> {
    if cases.is_empty() {
        return Ok(());
    }
    let mid = cases.len() / 2;
    if mid == 0 {
        // Single case: its body runs here; the caller's guard already
        // narrowed the range to exactly this value.
        for instr in &cases[0].body {
            s.emit(instr.clone())?;
        }
        return Ok(());
    }
    emit_half(s, holder, objective, &cases[..mid])?;
    emit_half(s, holder, objective, &cases[mid..])
}

/// Wrap one half in a child subroutine and call it under a range guard.
fn emit_half(s: &mut Session, holder: &str, objective: &str, half: &[Case]) -> LowerResult<()> {
    let lo = checked_score(half[0].value)?;
    let hi = checked_score(half[half.len() - 1].value)?;
    let range = if lo == hi {
        ScoreRange::exact(lo)
    } else {
        ScoreRange::bounded(lo, hi)?
    };
    let target = s.anonymous("case", |s| dispatch(s, holder, objective, half))?;
    let guard = format!("score {holder} {objective} matches {range}");
    let terms = vec![
        Term::kw("execute"),
        Term::kw("if"),
        Term::lit(guard),
        Term::kw("run"),
        Term::call(target.clone()),
    ];
    let slot = s.emit(Instruction::new(terms))?;
    s.record_call(funcpack_ir::CallKind::Execute, target, Some(slot))
}
