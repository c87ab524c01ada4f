//! Structured control flow over guarded subroutine calls.
//!
//! Every lowering here follows the same pattern the target forces: fold
//! constants at compile time, guard a single instruction with a
//! conditional-execute prefix, and wrap anything larger in a fresh
//! anonymous subroutine invoked under the guard.

use funcpack_cond::Cond;
use funcpack_ir::{CallKind, Instruction, SubroutineId, Term, Usage};

use crate::error::{LowerError, LowerResult};
use crate::session::{Session, FLAG_OBJECTIVE};

/// A block of lowering code run inside a subroutine scope.
pub type Block<'a> = &'a mut dyn FnMut(&mut Session) -> LowerResult<()>;

// ══════════════════════════════════════════════════════════════════════════════
// If / Else
// ══════════════════════════════════════════════════════════════════════════════

/// Lower `if cond { then }`.
///
/// A constant condition discards the untaken branch with no emitted guard.
pub fn if_then(s: &mut Session, cond: Cond, then_block: Block) -> LowerResult<()> {
    match cond.const_value() {
        Some(true) => then_block(s),
        Some(false) => Ok(()),
        None => {
            if cond.needs_flag() {
                let flag = lower_flag_disjunction(s, &cond)?;
                branch(s, &flag.is_set(), then_block)
            } else {
                branch(s, &cond, then_block)
            }
        }
    }
}

/// Lower `if cond { then } else { other }`.
pub fn if_else(
    s: &mut Session,
    cond: Cond,
    then_block: Block,
    else_block: Block,
) -> LowerResult<()> {
    match cond.const_value() {
        Some(true) => then_block(s),
        Some(false) => else_block(s),
        None => {
            let negated = cond.clone().negate();
            if cond.needs_flag() || negated.needs_flag() {
                // One flag guards both branches; the negation is a plain
                // score check instead of a second protocol run.
                let flag = lower_flag_disjunction(s, &cond)?;
                branch(s, &flag.is_set(), then_block)?;
                branch(s, &flag.is_clear(), else_block)
            } else {
                branch(s, &cond, then_block)?;
                branch(s, &negated, else_block)
            }
        }
    }
}

/// Emit one guarded branch: wrap the block, then either fold a
/// single-instruction body into `execute <guard> run <cmd>` or call the
/// wrapper under the guard.
fn branch(s: &mut Session, cond: &Cond, block: Block) -> LowerResult<()> {
    let guard = cond.tokenize(s.choice_ids()).map_err(LowerError::from)?;
    let target = s.anonymous("branch", |s| block(s))?;
    attach_guarded(s, guard, target)
}

/// Attach a freshly wrapped block to the current subroutine under a guard.
fn attach_guarded(s: &mut Session, guard: Vec<Term>, target: SubroutineId) -> LowerResult<()> {
    let body = s
        .program()
        .by_id(&target)
        .map(|sub| (sub.instruction_count(), sub.single_instruction().cloned()));
    match body {
        // Empty block: nothing to guard, the wrapper is dropped.
        Some((0, _)) => {
            if let Some(sub) = s.program_mut().by_id_mut(&target) {
                sub.usage = Usage::Dead;
            }
            Ok(())
        }
        // Single-instruction block folds into one guarded command.
        Some((1, Some(instr))) => {
            let mut terms = Vec::with_capacity(guard.len() + instr.terms.len() + 2);
            terms.push(Term::kw("execute"));
            terms.extend(guard);
            terms.push(Term::kw("run"));
            terms.extend(instr.terms);
            let slot = s.emit(Instruction::new(terms))?;
            s.absorb_wrapper(&target, slot)
        }
        _ => {
            let mut terms = Vec::with_capacity(guard.len() + 3);
            terms.push(Term::kw("execute"));
            terms.extend(guard);
            terms.push(Term::kw("run"));
            terms.push(Term::call(target.clone()));
            let slot = s.emit(Instruction::new(terms))?;
            s.record_call(CallKind::Execute, target, Some(slot))
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Loops
// ══════════════════════════════════════════════════════════════════════════════

/// Lower `while cond { body }`: a fresh subroutine whose tail re-invokes
/// itself under the condition, entered by one initial guarded call.
///
/// Termination is the caller's responsibility; the compiler does not
/// verify that the condition eventually becomes false.
pub fn while_loop(s: &mut Session, cond: Cond, body: Block) -> LowerResult<()> {
    if cond.const_value() == Some(false) {
        return Ok(());
    }
    let loop_id = s.anonymous("loop", |s| {
        body(s)?;
        let self_id = s.current_id()?;
        guarded_call(s, &cond, self_id)
    })?;
    guarded_call(s, &cond, loop_id)
}

/// Lower `do { body } while cond`: the body runs once unconditionally,
/// then the trailing condition re-invokes the same subroutine.
pub fn do_while(s: &mut Session, body: Block, cond: Cond) -> LowerResult<()> {
    let loop_id = s.anonymous("loop", |s| {
        body(s)?;
        let self_id = s.current_id()?;
        guarded_call(s, &cond, self_id)
    })?;
    s.call(loop_id)?;
    Ok(())
}

/// Wrap a block under an arbitrary execute prefix (`as`, `at`, `in`, …).
/// The wrapper is called as the body of the scoped block and is never
/// folded back into a single instruction.
pub fn with_prefix(s: &mut Session, prefix: Vec<Term>, body: Block) -> LowerResult<()> {
    let target = s.anonymous("with", |s| body(s))?;
    let mut terms = Vec::with_capacity(prefix.len() + 3);
    terms.push(Term::kw("execute"));
    terms.extend(prefix);
    terms.push(Term::kw("run"));
    terms.push(Term::call(target.clone()));
    let slot = s.emit(Instruction::new(terms))?;
    s.record_call(CallKind::With, target, Some(slot))
}

/// Emit a call to `callee` guarded by `cond`, folding constants.
pub(crate) fn guarded_call(s: &mut Session, cond: &Cond, callee: SubroutineId) -> LowerResult<()> {
    match cond.const_value() {
        Some(false) => Ok(()),
        Some(true) => {
            s.call(callee)?;
            Ok(())
        }
        None => {
            let guard = if cond.needs_flag() {
                let flag = lower_flag_disjunction(s, cond)?;
                flag.is_set()
                    .tokenize(s.choice_ids())
                    .map_err(LowerError::from)?
            } else {
                cond.tokenize(s.choice_ids()).map_err(LowerError::from)?
            };
            let mut terms = Vec::with_capacity(guard.len() + 3);
            terms.push(Term::kw("execute"));
            terms.extend(guard);
            terms.push(Term::kw("run"));
            terms.push(Term::call(callee.clone()));
            let slot = s.emit(Instruction::new(terms))?;
            s.record_call(CallKind::Execute, callee, Some(slot))
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Short-circuit flag protocol
// ══════════════════════════════════════════════════════════════════════════════

/// A persistent boolean simulated on the scoreboard.
pub(crate) struct Flag {
    holder: String,
}

impl Flag {
    pub(crate) fn is_set(&self) -> Cond {
        Cond::pred(format!("score {} {FLAG_OBJECTIVE} matches 1", self.holder))
    }

    pub(crate) fn is_clear(&self) -> Cond {
        Cond::pred(format!("score {} {FLAG_OBJECTIVE} matches 0", self.holder))
    }

    fn assign(&self, value: u8) -> Vec<Term> {
        vec![Term::lit(format!(
            "scoreboard players set {} {FLAG_OBJECTIVE} {value}",
            self.holder
        ))]
    }
}

/// Lower a disjunction with compound operands via persistent state.
///
/// The target cannot nest conditionals within one instruction but can
/// check and set external state, so OR is evaluated into a flag: reset
/// the flag; the first disjunct sets it under its own guard; every later
/// disjunct is additionally guarded by "flag not yet set". Callers then
/// guard on the flag's value.
pub(crate) fn lower_flag_disjunction(s: &mut Session, cond: &Cond) -> LowerResult<Flag> {
    let operands = match cond {
        Cond::Any(ops) => ops.clone(),
        other => {
            return Err(LowerError::Internal(format!(
                "flag protocol applied to non-disjunction {other:?}"
            )))
        }
    };
    let flag = Flag {
        holder: s.flag_holder()?,
    };
    s.emit(Instruction::new(flag.assign(0)))?;
    for (i, operand) in operands.iter().enumerate() {
        let mut guard = Vec::new();
        if i > 0 {
            guard.extend(
                flag.is_clear()
                    .tokenize(s.choice_ids())
                    .map_err(LowerError::from)?,
            );
        }
        guard.extend(operand.tokenize(s.choice_ids()).map_err(LowerError::from)?);
        let mut terms = Vec::with_capacity(guard.len() + 3);
        terms.push(Term::kw("execute"));
        terms.extend(guard);
        terms.push(Term::kw("run"));
        terms.extend(flag.assign(1));
        s.emit(Instruction::new(terms))?;
    }
    Ok(flag)
}
