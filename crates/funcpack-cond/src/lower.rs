//! Lowering conditions to guard terms.

use thiserror::Error;

use funcpack_ir::{ChoiceIds, ChoiceSet, Term};

use crate::algebra::Cond;

/// Why a condition could not be lowered to guard terms at this layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CondError {
    /// Constant conditions are folded by control flow, never guarded.
    #[error("constant {0} condition has no guard form")]
    Trivial(bool),

    /// A disjunction with compound operands cannot be expressed in one
    /// instruction; the control-flow layer must use the short-circuit
    /// flag protocol.
    #[error("compound disjunction needs the short-circuit flag protocol")]
    NeedsFlag,
}

impl Cond {
    /// Lower this condition into guard terms.
    ///
    /// - A predicate becomes `if <text>` or `unless <text>`.
    /// - A conjunction becomes the concatenation of its operands' guards
    ///   (sequential implicit AND).
    /// - A disjunction of simple predicates becomes a single choice term
    ///   over the operands' guards: the OR is implemented by combinatorial
    ///   instruction duplication, one emitted command per disjunct, each
    ///   independently sufficient.
    pub fn tokenize(&self, ids: &mut ChoiceIds) -> Result<Vec<Term>, CondError> {
        match self {
            Cond::Always(value) => Err(CondError::Trivial(*value)),
            Cond::Pred { text, inverted } => Ok(vec![
                Term::kw(if *inverted { "unless" } else { "if" }),
                Term::lit(text.clone()),
            ]),
            Cond::All(ops) => {
                let mut terms = Vec::new();
                for op in ops {
                    terms.extend(op.tokenize(ids)?);
                }
                Ok(terms)
            }
            Cond::Any(ops) => {
                if !ops.iter().all(Cond::is_simple) {
                    return Err(CondError::NeedsFlag);
                }
                let alternatives = ops
                    .iter()
                    .map(|op| op.tokenize(ids))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(vec![Term::Choice(ChoiceSet {
                    id: ids.fresh(),
                    alternatives,
                })])
            }
        }
    }
}
