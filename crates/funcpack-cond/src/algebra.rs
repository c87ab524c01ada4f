//! The condition type and its combinators.

/// A boolean expression over opaque, side-effect-free predicate atoms.
///
/// Invariant (maintained by the combinators, not by construction): the
/// operand list of an [`Cond::All`] contains no direct `All`, and likewise
/// for [`Cond::Any`]; negation exists only as the `inverted` bit on
/// predicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cond {
    /// A compile-time constant.
    Always(bool),
    /// An atomic guard clause, opaque to the compiler.
    Pred { text: String, inverted: bool },
    /// Conjunction of flattened operands.
    All(Vec<Cond>),
    /// Disjunction of flattened operands.
    Any(Vec<Cond>),
}

impl Cond {
    /// A compile-time constant condition.
    pub fn always(value: bool) -> Self {
        Cond::Always(value)
    }

    /// An atomic predicate.
    pub fn pred(text: impl Into<String>) -> Self {
        Cond::Pred {
            text: text.into(),
            inverted: false,
        }
    }

    /// Whether this is a single (possibly inverted) predicate.
    pub fn is_simple(&self) -> bool {
        matches!(self, Cond::Pred { .. })
    }

    /// The constant value, if this condition is one.
    pub fn const_value(&self) -> Option<bool> {
        match self {
            Cond::Always(b) => Some(*b),
            _ => None,
        }
    }

    /// Whether lowering this condition requires the short-circuit flag
    /// protocol: a disjunction with at least one compound operand.
    pub fn needs_flag(&self) -> bool {
        matches!(self, Cond::Any(ops) if !ops.iter().all(Cond::is_simple))
    }

    /// Conjunction.
    ///
    /// `Always(true)` is the identity and `Always(false)` absorbs, with no
    /// new node allocated in either case. A disjunction operand is
    /// distributed over (DNF), since the target only chains conjunctions.
    pub fn and(self, other: Cond) -> Cond {
        match (self, other) {
            (Cond::Always(false), _) | (_, Cond::Always(false)) => Cond::Always(false),
            (Cond::Always(true), c) | (c, Cond::Always(true)) => c,
            (Cond::Any(ops), rhs) => ops
                .into_iter()
                .fold(Cond::Always(false), |acc, op| acc.or(op.and(rhs.clone()))),
            (lhs, Cond::Any(ops)) => ops
                .into_iter()
                .fold(Cond::Always(false), |acc, op| acc.or(lhs.clone().and(op))),
            (Cond::All(mut lhs), Cond::All(rhs)) => {
                lhs.extend(rhs);
                Cond::All(lhs)
            }
            (Cond::All(mut ops), c) => {
                ops.push(c);
                Cond::All(ops)
            }
            (c, Cond::All(ops)) => {
                let mut flat = Vec::with_capacity(ops.len() + 1);
                flat.push(c);
                flat.extend(ops);
                Cond::All(flat)
            }
            (a, b) => Cond::All(vec![a, b]),
        }
    }

    /// Disjunction; symmetric to [`Cond::and`] with the constant roles
    /// swapped.
    pub fn or(self, other: Cond) -> Cond {
        match (self, other) {
            (Cond::Always(true), _) | (_, Cond::Always(true)) => Cond::Always(true),
            (Cond::Always(false), c) | (c, Cond::Always(false)) => c,
            (Cond::Any(mut lhs), Cond::Any(rhs)) => {
                lhs.extend(rhs);
                Cond::Any(lhs)
            }
            (Cond::Any(mut ops), c) => {
                ops.push(c);
                Cond::Any(ops)
            }
            (c, Cond::Any(ops)) => {
                let mut flat = Vec::with_capacity(ops.len() + 1);
                flat.push(c);
                flat.extend(ops);
                Cond::Any(flat)
            }
            (a, b) => Cond::Any(vec![a, b]),
        }
    }

    /// Negation, kept in negation normal form: constants flip, predicates
    /// toggle their inverted bit, and connectives De-Morgan through the
    /// combinators (which re-normalize as they fold).
    pub fn negate(self) -> Cond {
        match self {
            Cond::Always(b) => Cond::Always(!b),
            Cond::Pred { text, inverted } => Cond::Pred {
                text,
                inverted: !inverted,
            },
            Cond::All(ops) => ops
                .into_iter()
                .fold(Cond::Always(false), |acc, op| acc.or(op.negate())),
            Cond::Any(ops) => ops
                .into_iter()
                .fold(Cond::Always(true), |acc, op| acc.and(op.negate())),
        }
    }

    /// Evaluate under a truth assignment for the atoms. Used to check
    /// semantic equivalence of rewrites.
    pub fn evaluate(&self, truth: &dyn Fn(&str) -> bool) -> bool {
        match self {
            Cond::Always(b) => *b,
            Cond::Pred { text, inverted } => truth(text) != *inverted,
            Cond::All(ops) => ops.iter().all(|op| op.evaluate(truth)),
            Cond::Any(ops) => ops.iter().any(|op| op.evaluate(truth)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(name: &str) -> Cond {
        Cond::pred(name)
    }

    #[test]
    fn test_true_is_and_identity() {
        let a = p("a");
        assert_eq!(Cond::always(true).and(a.clone()), a.clone());
        assert_eq!(a.clone().and(Cond::always(true)), a);
    }

    #[test]
    fn test_false_absorbs_and() {
        assert_eq!(p("a").and(Cond::always(false)), Cond::always(false));
        assert_eq!(Cond::always(false).and(p("a")), Cond::always(false));
    }

    #[test]
    fn test_true_absorbs_or() {
        assert_eq!(p("a").or(Cond::always(true)), Cond::always(true));
        assert_eq!(Cond::always(true).or(p("a")), Cond::always(true));
    }

    #[test]
    fn test_false_is_or_identity() {
        let a = p("a");
        assert_eq!(Cond::always(false).or(a.clone()), a.clone());
        assert_eq!(a.clone().or(Cond::always(false)), a);
    }

    #[test]
    fn test_and_flattens() {
        let c = p("a").and(p("b")).and(p("c"));
        match c {
            Cond::All(ops) => {
                assert_eq!(ops.len(), 3);
                assert!(ops.iter().all(Cond::is_simple));
            }
            other => panic!("expected flat conjunction, got {other:?}"),
        }
    }

    #[test]
    fn test_or_flattens() {
        let c = p("a").or(p("b").or(p("c")));
        match c {
            Cond::Any(ops) => assert_eq!(ops.len(), 3),
            other => panic!("expected flat disjunction, got {other:?}"),
        }
    }

    #[test]
    fn test_and_over_or_distributes_to_dnf() {
        // a AND (b OR c)  =>  (a AND b) OR (a AND c)
        let c = p("a").and(p("b").or(p("c")));
        match &c {
            Cond::Any(ops) => {
                assert_eq!(ops.len(), 2);
                assert!(ops
                    .iter()
                    .all(|op| matches!(op, Cond::All(inner) if inner.len() == 2)));
            }
            other => panic!("expected DNF, got {other:?}"),
        }
    }

    #[test]
    fn test_double_negation_of_predicate() {
        let a = p("a");
        assert_eq!(a.clone().negate().negate(), a);
    }

    #[test]
    fn test_de_morgan_on_conjunction() {
        // NOT (a AND b)  =>  (NOT a) OR (NOT b)
        let c = p("a").and(p("b")).negate();
        match c {
            Cond::Any(ops) => {
                assert_eq!(ops.len(), 2);
                assert!(ops
                    .iter()
                    .all(|op| matches!(op, Cond::Pred { inverted: true, .. })));
            }
            other => panic!("expected negated disjunction, got {other:?}"),
        }
    }

    #[test]
    fn test_negate_constant() {
        assert_eq!(Cond::always(true).negate(), Cond::always(false));
        assert_eq!(Cond::always(false).negate(), Cond::always(true));
    }

    #[test]
    fn test_needs_flag() {
        assert!(!p("a").or(p("b")).needs_flag());
        let compound = p("a").and(p("b")).or(p("c").and(p("d")));
        assert!(compound.needs_flag());
        assert!(!p("a").and(p("b")).needs_flag());
    }

    #[test]
    fn test_evaluate() {
        let c = p("a").and(p("b").or(p("c")));
        let truth = |a: bool, b: bool, cc: bool| {
            move |name: &str| match name {
                "a" => a,
                "b" => b,
                _ => cc,
            }
        };
        assert!(c.evaluate(&truth(true, true, false)));
        assert!(c.evaluate(&truth(true, false, true)));
        assert!(!c.evaluate(&truth(false, true, true)));
        assert!(!c.evaluate(&truth(true, false, false)));
    }
}
