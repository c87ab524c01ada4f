//! Delayed invocation with time-unit normalization.

use std::fmt;

use funcpack_ir::{CallKind, Instruction, SubroutineId, Term};

use crate::error::LowerResult;
use crate::session::Session;

/// Game ticks per in-game day.
pub const TICKS_PER_DAY: u32 = 24_000;
/// Game ticks per real-time second.
pub const TICKS_PER_SECOND: u32 = 20;

/// A delay measured in game ticks.
///
/// Displays in the target's time syntax, normalized to the largest unit
/// that divides evenly: days, then seconds, then raw ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticks(pub u32);

impl Ticks {
    /// A delay of `n` in-game days, saturating at the tick ceiling.
    pub fn days(n: u32) -> Self {
        Ticks(n.saturating_mul(TICKS_PER_DAY))
    }

    /// A delay of `n` real-time seconds, saturating at the tick ceiling.
    pub fn seconds(n: u32) -> Self {
        Ticks(n.saturating_mul(TICKS_PER_SECOND))
    }
}

impl fmt::Display for Ticks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.0;
        if n > 0 && n % TICKS_PER_DAY == 0 {
            write!(f, "{}d", n / TICKS_PER_DAY)
        } else if n > 0 && n % TICKS_PER_SECOND == 0 {
            write!(f, "{}s", n / TICKS_PER_SECOND)
        } else {
            write!(f, "{n}t")
        }
    }
}

/// Wrap `body` in a fresh subroutine invoked after `delay`.
///
/// The scheduled subroutine runs detached from the scheduling call's
/// execution context, so the wrapper is never folded back into its
/// caller; the edge is recorded as context-changing for the optimizer.
/// Returns the scheduled subroutine's identity so callers can cancel or
/// re-schedule it.
pub fn schedule(
    s: &mut Session,
    delay: Ticks,
    body: &mut dyn FnMut(&mut Session) -> LowerResult<()>,
) -> LowerResult<SubroutineId> {
    let target = s.anonymous("sched", |s| body(s))?;
    let terms = vec![
        Term::kw("schedule"),
        Term::kw("function"),
        Term::lit(target.to_string()),
        Term::lit(delay.to_string()),
    ];
    let slot = s.emit(Instruction::new(terms))?;
    s.record_call(CallKind::With, target.clone(), Some(slot))?;
    Ok(target)
}
