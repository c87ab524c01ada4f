//! Instructions and combinatorial rendering.

use std::collections::BTreeMap;

use crate::error::RenderError;
use crate::subroutine::{Usage, UsageLookup};
use crate::term::{escape, ChoiceId, Term};

/// One logical command: an ordered sequence of terms.
///
/// An instruction with choice terms expands to several output lines; see
/// [`Instruction::render`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub terms: Vec<Term>,
}

impl Instruction {
    pub fn new(terms: Vec<Term>) -> Self {
        Self { terms }
    }

    /// A single-literal instruction, for commands built as plain text.
    pub fn line(text: impl Into<String>) -> Self {
        Self::new(vec![Term::lit(text)])
    }

    /// Whether this instruction is exactly one plain subroutine call.
    pub fn as_plain_call(&self) -> Option<&crate::term::SubroutineId> {
        match self.terms.as_slice() {
            [Term::Call(id)] => Some(id),
            _ => None,
        }
    }

    /// Render this instruction to output lines.
    ///
    /// With no choice terms the result is exactly one line. With `n`
    /// distinct choice ids carrying `c_1..c_n` alternatives the result is
    /// exactly `c_1 * … * c_n` lines: the cartesian product enumerated with
    /// the last-introduced choice varying fastest. A choice id occurring
    /// more than once resolves to the same chosen alternative on every
    /// occurrence within a line.
    ///
    /// Fails if a call term points at a subroutine marked [`Usage::Dead`]
    /// with no keep override — a dangling reference must abort this output
    /// unit rather than be emitted silently.
    pub fn render(&self, usage: &dyn UsageLookup) -> Result<Vec<String>, RenderError> {
        let mut order: Vec<ChoiceId> = Vec::new();
        let mut counts: Vec<usize> = Vec::new();
        collect_choices(&self.terms, &mut order, &mut counts, false)?;

        if order.is_empty() {
            let line = render_terms(&self.terms, usage, &BTreeMap::new())?.join(" ");
            return Ok(vec![line]);
        }

        let total: usize = counts.iter().product();
        let mut lines = Vec::with_capacity(total);
        for n in 0..total {
            // Mixed-radix decode with the last choice as the fastest digit.
            let mut assignment = BTreeMap::new();
            let mut rem = n;
            for i in (0..order.len()).rev() {
                assignment.insert(order[i], rem % counts[i]);
                rem /= counts[i];
            }
            let line = render_terms(&self.terms, usage, &assignment)?.join(" ");
            lines.push(line);
        }
        Ok(lines)
    }
}

/// Walk the term list and record each distinct choice id in encounter
/// order, checking arity consistency and rejecting nesting.
fn collect_choices(
    terms: &[Term],
    order: &mut Vec<ChoiceId>,
    counts: &mut Vec<usize>,
    nested: bool,
) -> Result<(), RenderError> {
    for term in terms {
        if let Term::Choice(set) = term {
            if nested {
                return Err(RenderError::NestedChoice(set.id));
            }
            if set.alternatives.is_empty() {
                return Err(RenderError::EmptyChoice(set.id));
            }
            match order.iter().position(|id| *id == set.id) {
                Some(pos) => {
                    if counts[pos] != set.alternatives.len() {
                        return Err(RenderError::ChoiceArity(set.id));
                    }
                }
                None => {
                    order.push(set.id);
                    counts.push(set.alternatives.len());
                }
            }
            for alt in &set.alternatives {
                collect_choices(alt, order, counts, true)?;
            }
        }
    }
    Ok(())
}

/// Render a term sequence into space-joined tokens under one choice
/// assignment.
fn render_terms(
    terms: &[Term],
    usage: &dyn UsageLookup,
    assignment: &BTreeMap<ChoiceId, usize>,
) -> Result<Vec<String>, RenderError> {
    let mut tokens = Vec::with_capacity(terms.len());
    for term in terms {
        match term {
            Term::Literal(text) | Term::Keyword(text) => tokens.push(text.clone()),
            Term::Str(text) => tokens.push(format!("\"{}\"", escape(text))),
            Term::Call(id) => {
                if usage.usage(id) == Usage::Dead {
                    return Err(RenderError::DanglingCall(id.clone()));
                }
                tokens.push(format!("function {id}"));
            }
            Term::Choice(set) => {
                // Every id was assigned during collection.
                let chosen = assignment.get(&set.id).copied().unwrap_or(0);
                let alt = set
                    .alternatives
                    .get(chosen)
                    .ok_or(RenderError::ChoiceArity(set.id))?;
                tokens.extend(render_terms(alt, usage, assignment)?);
            }
        }
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subroutine::AllLive;
    use crate::term::{ChoiceSet, SubroutineId};

    fn choice(id: u32, alts: &[&str]) -> Term {
        Term::Choice(ChoiceSet {
            id: ChoiceId(id),
            alternatives: alts.iter().map(|a| vec![Term::lit(*a)]).collect(),
        })
    }

    #[test]
    fn test_plain_instruction_renders_one_line() {
        let instr = Instruction::new(vec![Term::lit("say"), Term::quoted("hi")]);
        assert_eq!(instr.render(&AllLive).unwrap(), vec![r#"say "hi""#]);
    }

    #[test]
    fn test_two_choices_render_cartesian_product() {
        let instr = Instruction::new(vec![
            Term::lit("give"),
            choice(0, &["alice", "bob"]),
            choice(1, &["apple", "bread", "carrot"]),
        ]);
        let lines = instr.render(&AllLive).unwrap();
        assert_eq!(lines.len(), 6);
        // Last-introduced choice varies fastest.
        assert_eq!(
            lines,
            vec![
                "give alice apple",
                "give alice bread",
                "give alice carrot",
                "give bob apple",
                "give bob bread",
                "give bob carrot",
            ]
        );
    }

    #[test]
    fn test_shared_choice_id_uses_one_assignment() {
        let instr = Instruction::new(vec![
            choice(7, &["left", "right"]),
            Term::lit("then"),
            choice(7, &["left", "right"]),
        ]);
        let lines = instr.render(&AllLive).unwrap();
        assert_eq!(lines, vec!["left then left", "right then right"]);
    }

    #[test]
    fn test_call_renders_qualified_name() {
        let id = SubroutineId::new("pack", ["util", "reset"]);
        let instr = Instruction::new(vec![Term::call(id)]);
        assert_eq!(
            instr.render(&AllLive).unwrap(),
            vec!["function pack:util/reset"]
        );
    }

    #[test]
    fn test_dangling_call_is_a_render_error() {
        struct AllDead;
        impl UsageLookup for AllDead {
            fn usage(&self, _: &SubroutineId) -> Usage {
                Usage::Dead
            }
        }
        let id = SubroutineId::new("pack", ["gone"]);
        let instr = Instruction::new(vec![Term::call(id.clone())]);
        assert_eq!(
            instr.render(&AllDead),
            Err(RenderError::DanglingCall(id))
        );
    }

    #[test]
    fn test_empty_choice_is_a_render_error() {
        let instr = Instruction::new(vec![Term::Choice(ChoiceSet {
            id: ChoiceId(0),
            alternatives: vec![],
        })]);
        assert_eq!(
            instr.render(&AllLive),
            Err(RenderError::EmptyChoice(ChoiceId(0)))
        );
    }

    #[test]
    fn test_mismatched_choice_arity_is_a_render_error() {
        let instr = Instruction::new(vec![
            choice(3, &["a", "b"]),
            choice(3, &["a", "b", "c"]),
        ]);
        assert_eq!(
            instr.render(&AllLive),
            Err(RenderError::ChoiceArity(ChoiceId(3)))
        );
    }

    #[test]
    fn test_nested_choice_is_a_render_error() {
        let inner = choice(1, &["x"]);
        let instr = Instruction::new(vec![Term::Choice(ChoiceSet {
            id: ChoiceId(0),
            alternatives: vec![vec![inner]],
        })]);
        assert_eq!(
            instr.render(&AllLive),
            Err(RenderError::NestedChoice(ChoiceId(1)))
        );
    }

    #[test]
    fn test_render_determinism_100_iterations() {
        let instr = Instruction::new(vec![
            choice(0, &["a", "b"]),
            choice(1, &["x", "y", "z"]),
        ]);
        let first = instr.render(&AllLive).unwrap();
        for i in 0..100 {
            assert_eq!(
                instr.render(&AllLive).unwrap(),
                first,
                "Determinism failure at iteration {i}"
            );
        }
    }
}
